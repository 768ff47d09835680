// Plain-text rendering of analysis results for the terminal.

use std::collections::HashMap;
use std::fmt::Write;

use pickem_core::record::WeekId;
use pickem_stats::{
    AccuracyBasis, HistoryRow, HistorySummary, RollingRow, StandingsTable, TrendRecord,
};

fn pct(value: f64) -> String {
    format!("{value:.1}%")
}

fn opt_pct(value: Option<f64>) -> String {
    value.map(pct).unwrap_or_else(|| "-".into())
}

/// Ranked standings, with the ranking column marked.
pub fn standings(table: &StandingsTable, basis: AccuracyBasis) -> String {
    let mut out = String::new();
    let scope = match table.week_number {
        Some(week) => format!("Season {} week {week}", table.season_year),
        None => format!("Season {}", table.season_year),
    };
    let _ = writeln!(out, "{scope} standings (ranked by {})", basis_name(basis));
    if table.is_empty() {
        let _ = writeln!(out, "No data.");
        return out;
    }

    let _ = writeln!(
        out,
        "{:>3}  {:<20} {:>5} {:>11} {:>8}  {:>6} {:>11} {:>8}  {:>7}",
        "#", "Player", "Wks", "Abs", "Abs %", "Played", "Adj", "Adj %", "Omitted"
    );
    for (i, row) in table.rows.iter().enumerate() {
        let _ = writeln!(
            out,
            "{:>3}  {:<20} {:>5} {:>11} {:>8}  {:>6} {:>11} {:>8}  {:>7}",
            i + 1,
            row.player_name,
            row.weeks_absolute,
            format!("{}/{}", row.correct_absolute, row.possible_absolute),
            pct(row.accuracy_absolute),
            row.weeks_adjusted,
            format!("{}/{}", row.correct_adjusted, row.possible_adjusted),
            pct(row.accuracy_adjusted),
            row.omitted_weeks,
        );
    }
    out
}

fn basis_name(basis: AccuracyBasis) -> &'static str {
    match basis {
        AccuracyBasis::Absolute => "absolute accuracy",
        AccuracyBasis::Adjusted => "adjusted accuracy",
    }
}

/// Week-by-week history with rolling columns where available, followed by
/// the season summary.
pub fn history(
    player: &str,
    season_year: i32,
    rows: &[HistoryRow],
    rolling: &[RollingRow],
    summary: &HistorySummary,
) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{player}, season {season_year}");
    if rows.is_empty() {
        let _ = writeln!(out, "No data.");
        return out;
    }

    let by_week: HashMap<WeekId, &RollingRow> = rolling.iter().map(|r| (r.row.week_id, r)).collect();

    let _ = writeln!(
        out,
        "{:>4}  {:<10}  {:<12} {:>7} {:>8}  {:>8} {:>7}",
        "Week", "Date", "Status", "Score", "Acc", "Roll avg", "Roll sd"
    );
    for row in rows {
        let date = row
            .week_date
            .map(|d| d.format("%Y-%m-%d").to_string())
            .unwrap_or_else(|| "-".into());
        let score = if row.is_participated() {
            format!("{}/{}", row.correct_guesses, row.total_games)
        } else {
            "-".into()
        };
        let (avg, sd) = match by_week.get(&row.week_id) {
            Some(r) => (
                pct(r.rolling_avg),
                r.rolling_std
                    .map(|s| format!("{s:.1}"))
                    .unwrap_or_else(|| "-".into()),
            ),
            None => ("-".into(), "-".into()),
        };
        let _ = writeln!(
            out,
            "{:>4}  {:<10}  {:<12} {:>7} {:>8}  {:>8} {:>7}",
            row.week_number,
            date,
            row.status.label(),
            score,
            opt_pct(row.accuracy),
            avg,
            sd,
        );
    }

    let _ = writeln!(out);
    let _ = writeln!(
        out,
        "Weeks: {} (played {}, omitted {}, no result {}), participation {}",
        summary.weeks,
        summary.participated,
        summary.omitted,
        summary.no_result,
        pct(summary.participation_rate),
    );
    let _ = writeln!(out, "Average accuracy: {}", opt_pct(summary.average_accuracy));
    if let (Some(best), Some(worst)) = (summary.best_week, summary.worst_week) {
        let _ = writeln!(
            out,
            "Best week: {} ({}), worst week: {} ({})",
            best.week_number,
            pct(best.accuracy),
            worst.week_number,
            pct(worst.accuracy),
        );
    }
    out
}

/// Trend table, strongest improvers first.
pub fn trends(season_year: i32, min_weeks: usize, records: &[TrendRecord]) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Season {season_year} trends (min {min_weeks} weeks played)");
    if records.is_empty() {
        let _ = writeln!(out, "No player has enough weeks.");
        return out;
    }

    let mut ordered: Vec<&TrendRecord> = records.iter().collect();
    ordered.sort_by(|a, b| {
        b.trend_slope
            .partial_cmp(&a.trend_slope)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let _ = writeln!(
        out,
        "{:<20} {:>5} {:>8} {:>8} {:>8} {:>7} {:>7} {:>6} {:>6}  {:<10} {:<12}",
        "Player", "Wks", "Overall", "Early", "Recent", "Change", "Slope", "R2", "Vol", "Trend", "Signal"
    );
    for r in ordered {
        let _ = writeln!(
            out,
            "{:<20} {:>5} {:>8} {:>8} {:>8} {:>+7.1} {:>+7.2} {:>6.3} {:>6.1}  {:<10} {:<12}",
            r.player_name,
            r.weeks_played,
            pct(r.overall_accuracy),
            pct(r.early_avg),
            pct(r.recent_avg),
            r.improvement,
            r.trend_slope,
            r.trend_r_squared,
            r.volatility,
            r.trend_category.label(),
            r.trend_significance.label(),
        );
    }
    out
}

pub fn seasons(seasons: &[i32]) -> String {
    if seasons.is_empty() {
        return "No seasons.\n".into();
    }
    seasons.iter().map(|s| format!("{s}\n")).collect()
}
