// Analysis over a league snapshot: standings, per-player history,
// improvement trends and rolling averages.
//
// Everything here is a pure function of a `LeagueSnapshot`; nothing touches
// the store.

pub mod history;
pub mod numeric;
pub mod regression;
pub mod rolling;
pub mod standings;
pub mod trends;

#[cfg(test)]
mod fixtures;

pub use history::{player_history, summarize_history, HistoryRow, HistoryStatus, HistorySummary};
pub use rolling::{rolling_averages, RollingRow};
pub use standings::{compute_standings, weekly_standings, AccuracyBasis, StandingsRow, StandingsTable};
pub use trends::{
    compute_improvement_trends, player_trend, TrendCategory, TrendRecord, TrendSignificance,
};
