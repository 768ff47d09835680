// Per-player season timeline: every scheduled week joined with whatever the
// player recorded for it.

use std::collections::HashMap;

use chrono::NaiveDate;
use pickem_core::record::{GameResult, Outcome, Player, PlayerId, WeekId};
use pickem_core::LeagueSnapshot;
use serde::Serialize;
use tracing::debug;

use crate::numeric::{mean, percentage};

// ---------------------------------------------------------------------------
// Output types
// ---------------------------------------------------------------------------

/// Status of a week in a player's history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum HistoryStatus {
    Participated,
    Omitted,
    /// Scheduled, but nothing was recorded for the player.
    NoResult,
}

impl HistoryStatus {
    pub fn label(&self) -> &'static str {
        match self {
            HistoryStatus::Participated => "participated",
            HistoryStatus::Omitted => "omitted",
            HistoryStatus::NoResult => "no_result",
        }
    }
}

/// One week of a player's season.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistoryRow {
    pub week_id: WeekId,
    pub week_number: u32,
    pub season_year: i32,
    pub week_date: Option<NaiveDate>,
    pub total_games: u32,
    /// 0 unless the player participated.
    pub correct_guesses: u32,
    pub status: HistoryStatus,
    /// Percentage correct; only defined for participated weeks with games.
    pub accuracy: Option<f64>,
}

impl HistoryRow {
    pub fn is_participated(&self) -> bool {
        self.status == HistoryStatus::Participated
    }
}

// ---------------------------------------------------------------------------
// Reconstruction
// ---------------------------------------------------------------------------

/// Build the week-by-week history of `player_name` in `season_year`.
///
/// Returns an empty vector when no player has that name. Rows are ordered
/// by week number; later stages rely on that order being chronological.
pub fn player_history(snapshot: &LeagueSnapshot, player_name: &str, season_year: i32) -> Vec<HistoryRow> {
    let Some(player) = snapshot.player_by_name(player_name) else {
        debug!(player_name, "history requested for unknown player");
        return Vec::new();
    };
    let results = snapshot.result_index();
    history_for(snapshot, &results, player, season_year)
}

/// History for an already-resolved player against a prebuilt result index.
pub(crate) fn history_for(
    snapshot: &LeagueSnapshot,
    results: &HashMap<(PlayerId, WeekId), &GameResult>,
    player: &Player,
    season_year: i32,
) -> Vec<HistoryRow> {
    let mut rows: Vec<HistoryRow> = snapshot
        .weeks_in_scope(season_year, None)
        .into_iter()
        .map(|week| {
            let outcome = results.get(&(player.id, week.id)).map(|r| r.outcome);
            let (status, correct_guesses) = match outcome {
                Some(Outcome::Participated { correct_guesses }) => {
                    (HistoryStatus::Participated, correct_guesses)
                }
                Some(Outcome::Omitted) => (HistoryStatus::Omitted, 0),
                None => (HistoryStatus::NoResult, 0),
            };
            let accuracy = (status == HistoryStatus::Participated && week.total_games > 0).then(|| {
                percentage(u64::from(correct_guesses), u64::from(week.total_games))
            });
            HistoryRow {
                week_id: week.id,
                week_number: week.week_number,
                season_year: week.season_year,
                week_date: week.week_date,
                total_games: week.total_games,
                correct_guesses,
                status,
                accuracy,
            }
        })
        .collect();

    rows.sort_by_key(|r| r.week_number);
    rows
}

// ---------------------------------------------------------------------------
// Summary
// ---------------------------------------------------------------------------

/// A single week singled out in a summary.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct WeekMark {
    pub week_number: u32,
    pub accuracy: f64,
}

/// Headline numbers for a player's season history.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistorySummary {
    pub weeks: usize,
    pub participated: usize,
    pub omitted: usize,
    pub no_result: usize,
    /// Participated weeks as a percentage of scheduled weeks.
    pub participation_rate: f64,
    /// Mean of the defined weekly accuracies.
    pub average_accuracy: Option<f64>,
    pub best_week: Option<WeekMark>,
    pub worst_week: Option<WeekMark>,
}

/// Summarize history rows. Ties for best/worst go to the earliest week.
pub fn summarize_history(rows: &[HistoryRow]) -> HistorySummary {
    let count = |status: HistoryStatus| rows.iter().filter(|r| r.status == status).count();
    let participated = count(HistoryStatus::Participated);

    let marks: Vec<WeekMark> = rows
        .iter()
        .filter_map(|r| {
            r.accuracy.map(|accuracy| WeekMark {
                week_number: r.week_number,
                accuracy,
            })
        })
        .collect();
    let accuracies: Vec<f64> = marks.iter().map(|m| m.accuracy).collect();

    let best_week = marks.iter().copied().fold(None, |best: Option<WeekMark>, m| match best {
        Some(b) if b.accuracy >= m.accuracy => Some(b),
        _ => Some(m),
    });
    let worst_week = marks.iter().copied().fold(None, |worst: Option<WeekMark>, m| match worst {
        Some(w) if w.accuracy <= m.accuracy => Some(w),
        _ => Some(m),
    });

    HistorySummary {
        weeks: rows.len(),
        participated,
        omitted: count(HistoryStatus::Omitted),
        no_result: count(HistoryStatus::NoResult),
        participation_rate: percentage(participated as u64, rows.len() as u64),
        average_accuracy: mean(&accuracies),
        best_week,
        worst_week,
    }
}
