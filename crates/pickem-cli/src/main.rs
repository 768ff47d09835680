// Pick'em league command line.
//
// Startup sequence:
// 1. Parse arguments
// 2. Load config (copying defaults on first run)
// 3. Initialize tracing (log to file, not terminal)
// 4. Open the database
// 5. Run the command, printing a table or JSON to stdout

mod cli;
mod report;

use std::fs::File;
use std::path::Path;

use anyhow::{bail, Context};
use clap::Parser;
use pickem_core::config::{self, Config};
use pickem_core::interchange;
use pickem_core::{League, LeagueSnapshot, Outcome, SqliteStore};
use pickem_stats::{
    compute_improvement_trends, compute_standings, player_history, rolling_averages,
    summarize_history, AccuracyBasis,
};
use serde::Serialize;
use tracing::info;

use cli::{Cli, Commands, SeasonArg};

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = config::load_config(&cli.config_dir).context("failed to load configuration")?;

    init_tracing(&config.logging.resolve_dir(&cli.config_dir), &config)?;
    info!(config_dir = %cli.config_dir.display(), "pickem starting");

    let db_path = config.database.resolve_path(&cli.config_dir);
    if let Some(parent) = db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    let store = SqliteStore::open(&db_path.to_string_lossy())
        .with_context(|| format!("failed to open database at {}", db_path.display()))?;
    info!(path = %db_path.display(), "database opened");

    let league = League::new(store);
    run(&cli, &config, &league)
}

fn run(cli: &Cli, config: &Config, league: &League<SqliteStore>) -> anyhow::Result<()> {
    match &cli.command {
        Commands::Standings { scope, week, by } => {
            let snap = league.snapshot()?;
            let season = resolve_season(scope, config, &snap)?;
            let basis = AccuracyBasis::from(*by);
            let table = compute_standings(&snap, season, *week).sorted_by(basis);
            emit(cli.json, &table, || report::standings(&table, basis))?;
        }
        Commands::History {
            player,
            scope,
            window,
        } => {
            let snap = league.snapshot()?;
            let season = resolve_season(scope, config, &snap)?;
            let Some(found) = snap.player_by_name(player) else {
                bail!("no player named `{}`", player.trim());
            };
            let rows = player_history(&snap, &found.name, season);
            let window = window.unwrap_or(config.analysis.rolling_window);
            let rolling = rolling_averages(&rows, window);
            let summary = summarize_history(&rows);

            let doc = serde_json::json!({
                "player_name": found.name,
                "season_year": season,
                "rolling_window": window,
                "history": rows,
                "rolling": rolling,
                "summary": summary,
            });
            emit(cli.json, &doc, || {
                report::history(&found.name, season, &rows, &rolling, &summary)
            })?;
        }
        Commands::Trends { scope, min_weeks } => {
            let snap = league.snapshot()?;
            let season = resolve_season(scope, config, &snap)?;
            let min_weeks = min_weeks.unwrap_or(config.analysis.min_weeks);
            let records = compute_improvement_trends(&snap, season, min_weeks);
            emit(cli.json, &records, || report::trends(season, min_weeks, &records))?;
        }
        Commands::Seasons => {
            let seasons = league.snapshot()?.seasons();
            emit(cli.json, &seasons, || report::seasons(&seasons))?;
        }
        Commands::AddPlayer { name } => {
            let player = league.add_player(name)?;
            emit(cli.json, &player, || {
                format!("Added player {} (id {})\n", player.name, player.id)
            })?;
        }
        Commands::RenamePlayer { id, name } => {
            let player = league.rename_player(*id, name)?;
            emit(cli.json, &player, || {
                format!("Player {} is now {}\n", player.id, player.name)
            })?;
        }
        Commands::DeletePlayer { id } => {
            let removed = league.delete_player(*id)?;
            println!("Deleted player {id} and {removed} result(s)");
        }
        Commands::AddWeek {
            season,
            week,
            games,
            date,
        } => {
            let added = league.add_week(*season, *week, *games, *date)?;
            emit(cli.json, &added, || {
                format!(
                    "Added season {} week {} ({} games, id {})\n",
                    added.season_year, added.week_number, added.total_games, added.id
                )
            })?;
        }
        Commands::DeleteWeek { id } => {
            let removed = league.delete_week(*id)?;
            println!("Deleted week {id} and {removed} result(s)");
        }
        Commands::Record {
            player,
            season,
            week,
            correct,
            omitted,
        } => {
            let outcome = match (correct, omitted) {
                (Some(correct_guesses), false) => Outcome::Participated {
                    correct_guesses: *correct_guesses,
                },
                (None, true) => Outcome::Omitted,
                _ => bail!("pass exactly one of --correct or --omitted"),
            };
            let result = league.record_result_by_name(player, *season, *week, outcome)?;
            emit(cli.json, &result, || {
                let what = match result.outcome {
                    Outcome::Participated { correct_guesses } => format!("{correct_guesses} correct"),
                    Outcome::Omitted => "omitted".to_string(),
                };
                format!(
                    "Recorded {} for {} in season {} week {}\n",
                    what,
                    player.trim(),
                    season,
                    week
                )
            })?;
        }
        Commands::Import { collection, file } => {
            let reader = File::open(file).with_context(|| format!("failed to open {}", file.display()))?;
            let summary = interchange::import_csv(league.store(), *collection, reader)
                .with_context(|| format!("failed to import {}", file.display()))?;
            println!(
                "Imported {} {} row(s) ({} assigned new ids)",
                summary.imported, collection, summary.assigned_ids
            );
        }
        Commands::Export { collection, file } => {
            let writer = File::create(file).with_context(|| format!("failed to create {}", file.display()))?;
            let written = interchange::export_csv(league.store(), *collection, writer)
                .with_context(|| format!("failed to export {}", file.display()))?;
            println!("Exported {written} {collection} row(s) to {}", file.display());
        }
    }
    Ok(())
}

/// Season named on the command line, else the configured default, else the
/// most recent season with scheduled weeks.
fn resolve_season(scope: &SeasonArg, config: &Config, snap: &LeagueSnapshot) -> anyhow::Result<i32> {
    if let Some(season) = scope.season.or(config.analysis.default_season) {
        return Ok(season);
    }
    match snap.seasons().first() {
        Some(&latest) => Ok(latest),
        None => bail!("no seasons recorded yet; add a week or pass --season"),
    }
}

fn emit<T: Serialize>(json: bool, value: &T, text: impl FnOnce() -> String) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(value)?);
    } else {
        print!("{}", text());
    }
    Ok(())
}

fn init_tracing(log_dir: &Path, config: &Config) -> anyhow::Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::EnvFilter;

    std::fs::create_dir_all(log_dir)
        .with_context(|| format!("failed to create log directory {}", log_dir.display()))?;

    let log_file = File::options()
        .create(true)
        .append(true)
        .open(log_dir.join("pickem.log"))?;

    let subscriber = fmt::Subscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.logging.filter)),
        )
        .with_writer(log_file)
        .with_ansi(false)
        .with_target(true)
        .with_thread_ids(true)
        .with_line_number(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("failed to set tracing subscriber")?;

    Ok(())
}
