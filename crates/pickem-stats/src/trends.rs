// Improvement trends: does a player's weekly accuracy move over the season?
//
// A least-squares line of accuracy against week number gives the slope
// (points per week). Whether that slope "means something" is decided by a
// fixed rule of thumb on slope size and fit quality, not by a statistical
// test: |slope| >= 0.75 and r^2 >= 0.25.

use pickem_core::LeagueSnapshot;
use serde::Serialize;
use tracing::debug;

use crate::history::{history_for, HistoryRow};
use crate::numeric::{mean, round_to, sample_std_dev};
use crate::regression::{linear_fit, LinearFit};

/// Minimum |slope| (points per week) for a trend to count as meaningful.
pub const SIGNIFICANT_SLOPE: f64 = 0.75;

/// Minimum r^2 for a trend to count as meaningful.
pub const SIGNIFICANT_R_SQUARED: f64 = 0.25;

/// Slopes inside (-0.5, 0.5) are "Stable".
pub const STABLE_SLOPE: f64 = 0.5;

pub const DEFAULT_MIN_WEEKS: usize = 3;

// ---------------------------------------------------------------------------
// Classification
// ---------------------------------------------------------------------------

/// Direction of a player's trend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TrendCategory {
    Improving,
    Stable,
    Declining,
}

impl TrendCategory {
    /// Classify a slope. `|slope| < 0.5` is Stable, `slope > 0.5` is
    /// Improving and everything else, including `slope <= -0.5`, falls
    /// through to Declining.
    pub fn classify(slope: f64) -> Self {
        if slope.abs() < STABLE_SLOPE {
            TrendCategory::Stable
        } else if slope > STABLE_SLOPE {
            TrendCategory::Improving
        } else {
            TrendCategory::Declining
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            TrendCategory::Improving => "Improving",
            TrendCategory::Stable => "Stable",
            TrendCategory::Declining => "Declining",
        }
    }
}

/// Whether a trend clears the significance heuristic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TrendSignificance {
    Meaningful,
    Inconclusive,
}

impl TrendSignificance {
    pub fn of(fit: &LinearFit) -> Self {
        if fit.slope.abs() >= SIGNIFICANT_SLOPE && fit.r_squared >= SIGNIFICANT_R_SQUARED {
            TrendSignificance::Meaningful
        } else {
            TrendSignificance::Inconclusive
        }
    }

    pub fn is_significant(&self) -> bool {
        *self == TrendSignificance::Meaningful
    }

    pub fn label(&self) -> &'static str {
        match self {
            TrendSignificance::Meaningful => "Meaningful",
            TrendSignificance::Inconclusive => "Inconclusive",
        }
    }
}

// ---------------------------------------------------------------------------
// Trend record
// ---------------------------------------------------------------------------

/// Season trend summary for one player. Percentages are rounded to one
/// decimal, the slope to two and r^2 to three.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendRecord {
    pub player_name: String,
    pub weeks_played: usize,
    pub overall_accuracy: f64,
    /// Mean of the first `min_weeks` weekly accuracies.
    pub early_avg: f64,
    /// Mean of the last `min_weeks` weekly accuracies.
    pub recent_avg: f64,
    pub improvement: f64,
    pub trend_slope: f64,
    pub trend_r_squared: f64,
    /// Sample standard deviation of weekly accuracy.
    pub volatility: f64,
    pub trend_category: TrendCategory,
    pub trend_significance: TrendSignificance,
}

// ---------------------------------------------------------------------------
// Core computation
// ---------------------------------------------------------------------------

/// Trend records for every player with at least `min_weeks` participated
/// weeks in `season_year`, in player order.
///
/// A `min_weeks` of 0 is treated as 1.
pub fn compute_improvement_trends(
    snapshot: &LeagueSnapshot,
    season_year: i32,
    min_weeks: usize,
) -> Vec<TrendRecord> {
    let results = snapshot.result_index();
    let records: Vec<TrendRecord> = snapshot
        .players
        .iter()
        .filter_map(|player| {
            let history = history_for(snapshot, &results, player, season_year);
            analyze_history(&player.name, &history, min_weeks)
        })
        .collect();

    debug!(
        season_year,
        min_weeks,
        players = snapshot.players.len(),
        qualifying = records.len(),
        "improvement trends computed"
    );
    records
}

/// Trend record for a single player, if they qualify.
pub fn player_trend(
    snapshot: &LeagueSnapshot,
    player_name: &str,
    season_year: i32,
    min_weeks: usize,
) -> Option<TrendRecord> {
    let player = snapshot.player_by_name(player_name)?;
    let results = snapshot.result_index();
    let history = history_for(snapshot, &results, player, season_year);
    analyze_history(&player.name, &history, min_weeks)
}

/// Trend record from chronologically ordered history rows. Only
/// participated weeks with a defined accuracy count.
pub fn analyze_history(player_name: &str, history: &[HistoryRow], min_weeks: usize) -> Option<TrendRecord> {
    let points: Vec<(f64, f64)> = history
        .iter()
        .filter(|r| r.is_participated())
        .filter_map(|r| r.accuracy.map(|a| (f64::from(r.week_number), a)))
        .collect();
    analyze_series(player_name, &points, min_weeks)
}

/// Trend record from `(week_number, accuracy)` points in chronological
/// order. Returns `None` when there are fewer than `min_weeks` points.
pub fn analyze_series(player_name: &str, points: &[(f64, f64)], min_weeks: usize) -> Option<TrendRecord> {
    let min_weeks = min_weeks.max(1);
    if points.len() < min_weeks {
        return None;
    }

    let (weeks, accuracies): (Vec<f64>, Vec<f64>) = points.iter().copied().unzip();
    let fit = linear_fit(&weeks, &accuracies);

    let overall = mean(&accuracies).unwrap_or(0.0);
    let early = mean(&accuracies[..min_weeks]).unwrap_or(0.0);
    let recent = mean(&accuracies[accuracies.len() - min_weeks..]).unwrap_or(0.0);
    let volatility = sample_std_dev(&accuracies).unwrap_or(0.0);

    Some(TrendRecord {
        player_name: player_name.to_string(),
        weeks_played: points.len(),
        overall_accuracy: round_to(overall, 1),
        early_avg: round_to(early, 1),
        recent_avg: round_to(recent, 1),
        improvement: round_to(recent - early, 1),
        trend_slope: round_to(fit.slope, 2),
        trend_r_squared: round_to(fit.r_squared, 3),
        volatility: round_to(volatility, 1),
        trend_category: TrendCategory::classify(fit.slope),
        trend_significance: TrendSignificance::of(&fit),
    })
}
