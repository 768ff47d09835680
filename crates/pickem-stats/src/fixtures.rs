// Snapshot builders for unit tests.

use pickem_core::record::{GameResult, Outcome, Player, Week};
use pickem_core::LeagueSnapshot;

/// Incrementally assembles a snapshot with sequential ids.
#[derive(Default)]
pub(crate) struct SnapshotBuilder {
    snap: LeagueSnapshot,
}

impl SnapshotBuilder {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn player(mut self, name: &str) -> Self {
        let id = self.snap.players.len() as i64 + 1;
        self.snap.players.push(Player {
            id,
            name: name.into(),
            created_at: None,
        });
        self
    }

    /// Add weeks `1..=count` of `season_year`, each with `total_games`.
    pub(crate) fn season(mut self, season_year: i32, count: u32, total_games: u32) -> Self {
        for week_number in 1..=count {
            self = self.week(season_year, week_number, total_games);
        }
        self
    }

    pub(crate) fn week(mut self, season_year: i32, week_number: u32, total_games: u32) -> Self {
        let id = self.snap.weeks.len() as i64 + 1;
        self.snap.weeks.push(Week {
            id,
            week_number,
            season_year,
            total_games,
            week_date: None,
            created_at: None,
        });
        self
    }

    fn push_result(&mut self, player: &str, season_year: i32, week_number: u32, outcome: Outcome) {
        let player_id = self
            .snap
            .player_by_name(player)
            .map(|p| p.id)
            .unwrap_or_else(|| panic!("no player {player}"));
        let week_id = self
            .snap
            .week_in_season(season_year, week_number)
            .map(|w| w.id)
            .unwrap_or_else(|| panic!("no week {week_number} in {season_year}"));
        let id = self.snap.results.len() as i64 + 1;
        self.snap.results.push(GameResult {
            id,
            player_id,
            week_id,
            outcome,
            created_at: None,
        });
    }

    pub(crate) fn played(mut self, player: &str, season_year: i32, week_number: u32, correct: u32) -> Self {
        self.push_result(
            player,
            season_year,
            week_number,
            Outcome::Participated {
                correct_guesses: correct,
            },
        );
        self
    }

    pub(crate) fn omitted(mut self, player: &str, season_year: i32, week_number: u32) -> Self {
        self.push_result(player, season_year, week_number, Outcome::Omitted);
        self
    }

    /// Record a participated score for each consecutive week starting at 1.
    pub(crate) fn scores(mut self, player: &str, season_year: i32, correct: &[u32]) -> Self {
        for (i, &c) in correct.iter().enumerate() {
            self = self.played(player, season_year, i as u32 + 1, c);
        }
        self
    }

    pub(crate) fn build(self) -> LeagueSnapshot {
        self.snap
    }
}

pub(crate) fn approx_eq(a: f64, b: f64, epsilon: f64) -> bool {
    (a - b).abs() < epsilon
}
