// Season and weekly standings: absolute vs. adjusted accuracy.
//
// Absolute accuracy charges a player for every scheduled week, whether they
// played, sat out, or simply have nothing recorded. Adjusted accuracy only
// looks at weeks they actually played.

use std::cmp::Ordering;

use pickem_core::record::Outcome;
use pickem_core::LeagueSnapshot;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::numeric::{percentage, round_to};

// ---------------------------------------------------------------------------
// Output types
// ---------------------------------------------------------------------------

/// One player's line in the standings.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StandingsRow {
    pub player_name: String,
    /// Weeks in scope, regardless of what was recorded.
    pub weeks_absolute: u32,
    pub correct_absolute: u64,
    pub possible_absolute: u64,
    /// Percentage, one decimal.
    pub accuracy_absolute: f64,
    /// Weeks with a participated result.
    pub weeks_adjusted: u32,
    pub correct_adjusted: u64,
    pub possible_adjusted: u64,
    /// Percentage, one decimal.
    pub accuracy_adjusted: f64,
    /// Weeks in scope without a participated result (omitted or missing).
    pub omitted_weeks: u32,
}

impl StandingsRow {
    pub fn accuracy(&self, basis: AccuracyBasis) -> f64 {
        match basis {
            AccuracyBasis::Absolute => self.accuracy_absolute,
            AccuracyBasis::Adjusted => self.accuracy_adjusted,
        }
    }
}

/// Which accuracy column a view ranks by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccuracyBasis {
    Absolute,
    Adjusted,
}

/// Standings for one season, or one week of it.
///
/// Rows come out in player order, unsorted; callers rank them with
/// [`StandingsTable::sort_by_accuracy`] for the column they display.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StandingsTable {
    pub season_year: i32,
    pub week_number: Option<u32>,
    pub rows: Vec<StandingsRow>,
}

impl StandingsTable {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Sort rows by the chosen accuracy, highest first. The sort is stable,
    /// so ties keep player order.
    pub fn sort_by_accuracy(&mut self, basis: AccuracyBasis) {
        self.rows.sort_by(|a, b| {
            b.accuracy(basis)
                .partial_cmp(&a.accuracy(basis))
                .unwrap_or(Ordering::Equal)
        });
    }

    /// Consuming form of [`StandingsTable::sort_by_accuracy`].
    pub fn sorted_by(mut self, basis: AccuracyBasis) -> Self {
        self.sort_by_accuracy(basis);
        self
    }

    /// Best row by the chosen accuracy; the earliest row wins a tie.
    pub fn leader(&self, basis: AccuracyBasis) -> Option<&StandingsRow> {
        self.rows.iter().fold(None, |best: Option<&StandingsRow>, row| match best {
            Some(b) if b.accuracy(basis) >= row.accuracy(basis) => Some(b),
            _ => Some(row),
        })
    }
}

// ---------------------------------------------------------------------------
// Core computation
// ---------------------------------------------------------------------------

#[derive(Default)]
struct Tally {
    weeks_absolute: u32,
    correct_absolute: u64,
    possible_absolute: u64,
    weeks_adjusted: u32,
    correct_adjusted: u64,
    possible_adjusted: u64,
}

/// Compute standings for `season_year`, optionally restricted to one week.
///
/// For each player and each in-scope week:
/// - no result: the week's games count toward the absolute denominator only;
/// - omitted: same as no result;
/// - participated: the score counts toward both numerators and the week's
///   games toward both denominators.
///
/// With no players or no in-scope weeks the table is empty. A week with
/// zero games contributes nothing and never divides.
pub fn compute_standings(
    snapshot: &LeagueSnapshot,
    season_year: i32,
    week_number: Option<u32>,
) -> StandingsTable {
    let weeks = snapshot.weeks_in_scope(season_year, week_number);
    let mut table = StandingsTable {
        season_year,
        week_number,
        rows: Vec::new(),
    };
    if snapshot.players.is_empty() || weeks.is_empty() {
        return table;
    }

    let results = snapshot.result_index();

    for player in &snapshot.players {
        let mut tally = Tally::default();
        for week in &weeks {
            let games = u64::from(week.total_games);
            tally.weeks_absolute += 1;
            tally.possible_absolute += games;

            let outcome = results.get(&(player.id, week.id)).map(|r| r.outcome);
            if let Some(Outcome::Participated { correct_guesses }) = outcome {
                let correct = u64::from(correct_guesses);
                tally.correct_absolute += correct;
                tally.weeks_adjusted += 1;
                tally.correct_adjusted += correct;
                tally.possible_adjusted += games;
            }
        }

        table.rows.push(StandingsRow {
            player_name: player.name.clone(),
            weeks_absolute: tally.weeks_absolute,
            correct_absolute: tally.correct_absolute,
            possible_absolute: tally.possible_absolute,
            accuracy_absolute: round_to(percentage(tally.correct_absolute, tally.possible_absolute), 1),
            weeks_adjusted: tally.weeks_adjusted,
            correct_adjusted: tally.correct_adjusted,
            possible_adjusted: tally.possible_adjusted,
            accuracy_adjusted: round_to(percentage(tally.correct_adjusted, tally.possible_adjusted), 1),
            omitted_weeks: tally.weeks_absolute - tally.weeks_adjusted,
        });
    }

    debug!(
        season_year,
        week_number = ?week_number,
        players = table.rows.len(),
        weeks = weeks.len(),
        "standings computed"
    );
    table
}

/// Standings for a single week of a season.
pub fn weekly_standings(snapshot: &LeagueSnapshot, season_year: i32, week_number: u32) -> StandingsTable {
    compute_standings(snapshot, season_year, Some(week_number))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
