// Write-side service over a record store.
//
// Stores only know flat records. This layer owns the relational rules:
// unique player names, one week per (season, week number), results that
// reference existing players and weeks with an in-range score, at most one
// result per (player, week), and cascading deletes.

use chrono::{NaiveDate, Utc};
use thiserror::Error;
use tracing::info;

use crate::record::{coerce_i64, Collection, GameResult, Outcome, Player, PlayerId, Week, WeekId};
use crate::snapshot::LeagueSnapshot;
use crate::store::{RecordStore, StoreError};

#[derive(Debug, Error)]
pub enum LeagueError {
    #[error("player name must not be empty")]
    EmptyName,

    #[error("a player named `{0}` already exists")]
    DuplicatePlayer(String),

    #[error("no player with id {0}")]
    PlayerNotFound(PlayerId),

    #[error("no player named `{0}`")]
    UnknownPlayer(String),

    #[error("no week with id {0}")]
    WeekNotFound(WeekId),

    #[error("no week {week_number} in season {season_year}")]
    UnknownWeek { season_year: i32, week_number: u32 },

    #[error("week {week_number} of season {season_year} already exists")]
    DuplicateWeek { season_year: i32, week_number: u32 },

    #[error("invalid value for `{field}`: {message}")]
    Invalid { field: &'static str, message: String },

    #[error("{correct} correct guesses exceeds the {total} games of the week")]
    ScoreOutOfRange { correct: u32, total: u32 },

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// CRUD surface for players, weeks and results with integrity checks.
pub struct League<S> {
    store: S,
}

impl<S: RecordStore> League<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn into_inner(self) -> S {
        self.store
    }

    /// Fresh snapshot of all three collections.
    pub fn snapshot(&self) -> Result<LeagueSnapshot, LeagueError> {
        Ok(self.store.snapshot()?)
    }

    // ------------------------------------------------------------------
    // Players
    // ------------------------------------------------------------------

    /// Add a player. Names are trimmed and must be unique ignoring case.
    pub fn add_player(&self, name: &str) -> Result<Player, LeagueError> {
        let name = validate_name(name)?;
        let snap = self.snapshot()?;
        ensure_name_free(&snap, &name, None)?;

        let player = Player {
            id: self.store.next_id(Collection::Players)?,
            name,
            created_at: Some(Utc::now()),
        };
        self.store
            .upsert_record(Collection::Players, player.id, &player.to_record())?;
        info!(id = player.id, name = %player.name, "player added");
        Ok(player)
    }

    /// Rename a player. Identity (the id) is unchanged.
    pub fn rename_player(&self, id: PlayerId, new_name: &str) -> Result<Player, LeagueError> {
        let name = validate_name(new_name)?;
        let snap = self.snapshot()?;
        let mut player = snap
            .player(id)
            .cloned()
            .ok_or(LeagueError::PlayerNotFound(id))?;
        ensure_name_free(&snap, &name, Some(id))?;

        player.name = name;
        self.store
            .upsert_record(Collection::Players, id, &player.to_record())?;
        info!(id, name = %player.name, "player renamed");
        Ok(player)
    }

    /// Delete a player and every result they own. Returns the number of
    /// results removed.
    pub fn delete_player(&self, id: PlayerId) -> Result<usize, LeagueError> {
        let snap = self.snapshot()?;
        if snap.player(id).is_none() {
            return Err(LeagueError::PlayerNotFound(id));
        }
        let removed = self.delete_results_where(&snap, |r| r.player_id == id)?;
        self.store.delete_record(Collection::Players, id)?;
        info!(id, results_removed = removed, "player deleted");
        Ok(removed)
    }

    // ------------------------------------------------------------------
    // Weeks
    // ------------------------------------------------------------------

    /// Schedule a week. Week number and total games must be positive, and
    /// the (season, week number) pair must be new.
    pub fn add_week(
        &self,
        season_year: i32,
        week_number: u32,
        total_games: u32,
        week_date: NaiveDate,
    ) -> Result<Week, LeagueError> {
        if week_number == 0 {
            return Err(LeagueError::Invalid {
                field: "week_number",
                message: "must be greater than 0".into(),
            });
        }
        if total_games == 0 {
            return Err(LeagueError::Invalid {
                field: "total_games",
                message: "must be greater than 0".into(),
            });
        }

        let snap = self.snapshot()?;
        if snap.week_in_season(season_year, week_number).is_some() {
            return Err(LeagueError::DuplicateWeek {
                season_year,
                week_number,
            });
        }

        let week = Week {
            id: self.store.next_id(Collection::Weeks)?,
            week_number,
            season_year,
            total_games,
            week_date: Some(week_date),
            created_at: Some(Utc::now()),
        };
        self.store
            .upsert_record(Collection::Weeks, week.id, &week.to_record())?;
        info!(id = week.id, season_year, week_number, total_games, "week added");
        Ok(week)
    }

    /// Delete a week and every result recorded against it. Returns the
    /// number of results removed.
    pub fn delete_week(&self, id: WeekId) -> Result<usize, LeagueError> {
        let snap = self.snapshot()?;
        if snap.week(id).is_none() {
            return Err(LeagueError::WeekNotFound(id));
        }
        let removed = self.delete_results_where(&snap, |r| r.week_id == id)?;
        self.store.delete_record(Collection::Weeks, id)?;
        info!(id, results_removed = removed, "week deleted");
        Ok(removed)
    }

    // ------------------------------------------------------------------
    // Results
    // ------------------------------------------------------------------

    /// Record a player's outcome for a week.
    ///
    /// If a result already exists for the pair it is overwritten in place
    /// (same id, original `created_at`); any further duplicates left behind
    /// by earlier writers are removed so the pair ends up with exactly one.
    pub fn record_result(
        &self,
        player_id: PlayerId,
        week_id: WeekId,
        outcome: Outcome,
    ) -> Result<GameResult, LeagueError> {
        let snap = self.snapshot()?;
        if snap.player(player_id).is_none() {
            return Err(LeagueError::PlayerNotFound(player_id));
        }
        let week = snap.week(week_id).ok_or(LeagueError::WeekNotFound(week_id))?;
        if let Outcome::Participated { correct_guesses } = outcome {
            if correct_guesses > week.total_games {
                return Err(LeagueError::ScoreOutOfRange {
                    correct: correct_guesses,
                    total: week.total_games,
                });
            }
        }

        // Match on the raw records so that copies the snapshot dropped as
        // malformed are cleaned up too.
        let mut existing = self
            .store
            .list_records(Collection::Results)?
            .iter()
            .filter(|r| {
                coerce_i64(r.get("player_id")) == Some(player_id)
                    && coerce_i64(r.get("week_id")) == Some(week_id)
            })
            .filter_map(|r| coerce_i64(r.get("id")))
            .collect::<Vec<i64>>()
            .into_iter();

        let result = match existing.next() {
            Some(id) => GameResult {
                id,
                player_id,
                week_id,
                outcome,
                created_at: snap
                    .results
                    .iter()
                    .find(|r| r.id == id)
                    .and_then(|r| r.created_at)
                    .or_else(|| Some(Utc::now())),
            },
            None => GameResult {
                id: self.store.next_id(Collection::Results)?,
                player_id,
                week_id,
                outcome,
                created_at: Some(Utc::now()),
            },
        };
        for stale in existing {
            self.store.delete_record(Collection::Results, stale)?;
        }

        self.store
            .upsert_record(Collection::Results, result.id, &result.to_record())?;
        info!(
            id = result.id,
            player_id,
            week_id,
            status = result.outcome.status().as_str(),
            "result recorded"
        );
        Ok(result)
    }

    /// Record a result addressed by player name and (season, week number).
    pub fn record_result_by_name(
        &self,
        player_name: &str,
        season_year: i32,
        week_number: u32,
        outcome: Outcome,
    ) -> Result<GameResult, LeagueError> {
        let snap = self.snapshot()?;
        let player_id = snap
            .player_by_name(player_name)
            .map(|p| p.id)
            .ok_or_else(|| LeagueError::UnknownPlayer(player_name.trim().to_string()))?;
        let week_id = snap
            .week_in_season(season_year, week_number)
            .map(|w| w.id)
            .ok_or(LeagueError::UnknownWeek {
                season_year,
                week_number,
            })?;
        self.record_result(player_id, week_id, outcome)
    }

    /// Remove a single result.
    pub fn delete_result(&self, id: i64) -> Result<bool, LeagueError> {
        Ok(self.store.delete_record(Collection::Results, id)?)
    }

    fn delete_results_where(
        &self,
        snap: &LeagueSnapshot,
        pred: impl Fn(&GameResult) -> bool,
    ) -> Result<usize, LeagueError> {
        let mut removed = 0;
        for result in snap.results.iter().filter(|r| pred(r)) {
            if self.store.delete_record(Collection::Results, result.id)? {
                removed += 1;
            }
        }
        Ok(removed)
    }
}

fn validate_name(name: &str) -> Result<String, LeagueError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(LeagueError::EmptyName);
    }
    Ok(name.to_string())
}

fn ensure_name_free(snap: &LeagueSnapshot, name: &str, except: Option<PlayerId>) -> Result<(), LeagueError> {
    let taken = snap
        .players
        .iter()
        .any(|p| Some(p.id) != except && p.name.eq_ignore_ascii_case(name));
    if taken {
        return Err(LeagueError::DuplicatePlayer(name.to_string()));
    }
    Ok(())
}
