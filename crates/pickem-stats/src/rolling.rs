// Trailing-window averages over a player's participated weeks.

use serde::Serialize;

use crate::history::HistoryRow;
use crate::numeric::{mean, sample_std_dev};

pub const DEFAULT_WINDOW: usize = 3;

/// A participated history row with its trailing-window statistics.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RollingRow {
    #[serde(flatten)]
    pub row: HistoryRow,
    /// Mean accuracy over the last `min(window, i + 1)` participated weeks.
    pub rolling_avg: f64,
    /// Sample standard deviation over the same values; `None` when the
    /// window holds a single value.
    pub rolling_std: Option<f64>,
}

/// Rolling averages over the participated rows of `history`, kept in their
/// original order.
///
/// Returns nothing when fewer than `window` rows qualify. Early rows use a
/// partial window rather than being dropped. A `window` of 0 is treated
/// as 1.
pub fn rolling_averages(history: &[HistoryRow], window: usize) -> Vec<RollingRow> {
    let window = window.max(1);
    let played: Vec<(&HistoryRow, f64)> = history
        .iter()
        .filter(|r| r.is_participated())
        .filter_map(|r| r.accuracy.map(|a| (r, a)))
        .collect();
    if played.len() < window {
        return Vec::new();
    }

    let accuracies: Vec<f64> = played.iter().map(|(_, a)| *a).collect();
    played
        .iter()
        .enumerate()
        .map(|(i, (row, _))| {
            let start = (i + 1).saturating_sub(window);
            let values = &accuracies[start..=i];
            RollingRow {
                row: (*row).clone(),
                rolling_avg: mean(values).unwrap_or(0.0),
                rolling_std: sample_std_dev(values),
            }
        })
        .collect()
}
