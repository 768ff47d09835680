// Command-line surface.

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{ArgGroup, Args, Parser, Subcommand, ValueEnum};
use pickem_core::Collection;
use pickem_stats::AccuracyBasis;

#[derive(Parser)]
#[command(name = "pickem")]
#[command(about = "Track a weekly pick'em league: standings, history and trends", long_about = None)]
pub struct Cli {
    /// Directory holding `config/` and `defaults/`
    #[arg(long, global = true, env = "PICKEM_CONFIG_DIR", default_value = ".")]
    pub config_dir: PathBuf,

    /// Print JSON instead of tables
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Season (or single week) standings
    Standings {
        #[command(flatten)]
        scope: SeasonArg,

        /// Restrict to one week of the season
        #[arg(short, long)]
        week: Option<u32>,

        /// Accuracy column to rank by
        #[arg(long, value_enum, default_value_t = RankBy::Adjusted)]
        by: RankBy,
    },

    /// Week-by-week history of one player, with rolling averages
    History {
        /// Player name
        #[arg(short, long)]
        player: String,

        #[command(flatten)]
        scope: SeasonArg,

        /// Rolling-average window (defaults to analysis.rolling_window)
        #[arg(long)]
        window: Option<usize>,
    },

    /// Improvement trends for every qualifying player
    Trends {
        #[command(flatten)]
        scope: SeasonArg,

        /// Minimum participated weeks (defaults to analysis.min_weeks)
        #[arg(long)]
        min_weeks: Option<usize>,
    },

    /// List seasons with scheduled weeks
    Seasons,

    /// Add a player
    AddPlayer {
        name: String,
    },

    /// Rename a player
    RenamePlayer {
        id: i64,
        name: String,
    },

    /// Delete a player and all of their results
    DeletePlayer {
        id: i64,
    },

    /// Schedule a week
    AddWeek {
        #[arg(long)]
        season: i32,

        #[arg(long)]
        week: u32,

        /// Number of games (the maximum score)
        #[arg(long)]
        games: u32,

        /// Date of the week, YYYY-MM-DD
        #[arg(long)]
        date: NaiveDate,
    },

    /// Delete a week and all results recorded against it
    DeleteWeek {
        id: i64,
    },

    /// Record a player's result for a week
    #[command(group(ArgGroup::new("outcome").required(true).args(["correct", "omitted"])))]
    Record {
        #[arg(short, long)]
        player: String,

        #[arg(long)]
        season: i32,

        #[arg(short, long)]
        week: u32,

        /// Number of correct guesses
        #[arg(long)]
        correct: Option<u32>,

        /// The player sat the week out
        #[arg(long)]
        omitted: bool,
    },

    /// Import a collection from CSV
    Import {
        /// players, weeks or results
        collection: Collection,

        file: PathBuf,
    },

    /// Export a collection to CSV
    Export {
        /// players, weeks or results
        collection: Collection,

        file: PathBuf,
    },
}

#[derive(Args)]
pub struct SeasonArg {
    /// Season year (defaults to analysis.default_season, then the latest season)
    #[arg(short, long)]
    pub season: Option<i32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum RankBy {
    Absolute,
    Adjusted,
}

impl From<RankBy> for AccuracyBasis {
    fn from(by: RankBy) -> Self {
        match by {
            RankBy::Absolute => AccuracyBasis::Absolute,
            RankBy::Adjusted => AccuracyBasis::Adjusted,
        }
    }
}
