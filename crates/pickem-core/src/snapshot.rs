// Immutable in-memory snapshot of the three league collections.
//
// Every analysis runs against one snapshot taken from the store up front;
// nothing in the analysis path reads the store or any shared state.

use std::collections::hash_map::Entry;
use std::collections::HashMap;

use tracing::{debug, warn};

use crate::record::{GameResult, Player, PlayerId, RawRecord, Week, WeekId};

/// Owned copy of players, weeks and results at a point in time.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LeagueSnapshot {
    pub players: Vec<Player>,
    pub weeks: Vec<Week>,
    pub results: Vec<GameResult>,
}

impl LeagueSnapshot {
    pub fn new(players: Vec<Player>, weeks: Vec<Week>, results: Vec<GameResult>) -> Self {
        Self {
            players,
            weeks,
            results,
        }
    }

    /// Coerce raw store records into a snapshot. Records that cannot be
    /// coerced are dropped (and logged) rather than failing the whole load,
    /// as are participated results scoring more than their week's games.
    pub fn from_records(players: &[RawRecord], weeks: &[RawRecord], results: &[RawRecord]) -> Self {
        let players = coerce_all(players, "players", Player::from_record);
        let weeks = coerce_all(weeks, "weeks", Week::from_record);
        let results = coerce_all(results, "results", GameResult::from_record);
        let results = drop_out_of_range(results, &weeks);
        debug!(
            players = players.len(),
            weeks = weeks.len(),
            results = results.len(),
            "snapshot loaded"
        );
        Self::new(players, weeks, results)
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty() && self.weeks.is_empty() && self.results.is_empty()
    }

    /// Look up a player by exact (trimmed) name.
    pub fn player_by_name(&self, name: &str) -> Option<&Player> {
        let name = name.trim();
        self.players.iter().find(|p| p.name == name)
    }

    pub fn player(&self, id: PlayerId) -> Option<&Player> {
        self.players.iter().find(|p| p.id == id)
    }

    pub fn week(&self, id: WeekId) -> Option<&Week> {
        self.weeks.iter().find(|w| w.id == id)
    }

    /// Find the week scheduled as `week_number` of `season_year`.
    pub fn week_in_season(&self, season_year: i32, week_number: u32) -> Option<&Week> {
        self.weeks
            .iter()
            .find(|w| w.season_year == season_year && w.week_number == week_number)
    }

    /// Weeks belonging to `season_year` (and to `week_number`, when given),
    /// in snapshot order.
    pub fn weeks_in_scope(&self, season_year: i32, week_number: Option<u32>) -> Vec<&Week> {
        self.weeks
            .iter()
            .filter(|w| w.season_year == season_year)
            .filter(|w| week_number.map_or(true, |n| w.week_number == n))
            .collect()
    }

    /// Distinct season years present, most recent first.
    pub fn seasons(&self) -> Vec<i32> {
        let mut seasons: Vec<i32> = self.weeks.iter().map(|w| w.season_year).collect();
        seasons.sort_unstable_by(|a, b| b.cmp(a));
        seasons.dedup();
        seasons
    }

    /// Index results by `(player_id, week_id)`.
    ///
    /// At most one result per pair is expected. If the snapshot holds more
    /// than one, the first in snapshot order wins and the rest are logged.
    pub fn result_index(&self) -> HashMap<(PlayerId, WeekId), &GameResult> {
        let mut index = HashMap::with_capacity(self.results.len());
        for result in &self.results {
            match index.entry((result.player_id, result.week_id)) {
                Entry::Vacant(slot) => {
                    slot.insert(result);
                }
                Entry::Occupied(kept) => {
                    let kept = kept.get();
                    warn!(
                        player_id = result.player_id,
                        week_id = result.week_id,
                        kept = kept.id,
                        ignored = result.id,
                        "duplicate result for player/week; keeping the first"
                    );
                }
            }
        }
        index
    }
}

fn coerce_all<T>(records: &[RawRecord], collection: &str, coerce: fn(&RawRecord) -> Option<T>) -> Vec<T> {
    let mut out = Vec::with_capacity(records.len());
    for record in records {
        match coerce(record) {
            Some(item) => out.push(item),
            None => warn!(
                collection,
                id = ?record.get("id"),
                "dropping malformed record"
            ),
        }
    }
    out
}

/// Drop participated results whose score exceeds the `total_games` of a
/// known week. Results against unknown weeks are kept; no week in scope
/// will ever join them.
fn drop_out_of_range(results: Vec<GameResult>, weeks: &[Week]) -> Vec<GameResult> {
    let totals: HashMap<WeekId, u32> = weeks.iter().map(|w| (w.id, w.total_games)).collect();
    results
        .into_iter()
        .filter(|r| {
            let (Some(correct), Some(&total)) = (r.outcome.correct_guesses(), totals.get(&r.week_id)) else {
                return true;
            };
            if correct > total {
                warn!(
                    id = r.id,
                    week_id = r.week_id,
                    correct,
                    total,
                    "dropping result scoring more than the week's games"
                );
                return false;
            }
            true
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::Outcome;
    use serde_json::json;

    fn week(id: WeekId, season_year: i32, week_number: u32) -> Week {
        Week {
            id,
            week_number,
            season_year,
            total_games: 10,
            week_date: None,
            created_at: None,
        }
    }

    fn result(id: i64, player_id: PlayerId, week_id: WeekId, correct: u32) -> GameResult {
        GameResult {
            id,
            player_id,
            week_id,
            outcome: Outcome::Participated {
                correct_guesses: correct,
            },
            created_at: None,
        }
    }

    #[test]
    fn from_records_drops_malformed_rows() {
        let players = vec![
            RawRecord::from([("id".into(), json!(1)), ("name".into(), json!("Alice"))]),
            RawRecord::from([("id".into(), json!("x")), ("name".into(), json!("Bob"))]),
        ];
        let weeks = vec![RawRecord::from([
            ("id".into(), json!(1)),
            ("week_number".into(), json!("1")),
            ("season_year".into(), json!("2025")),
            ("total_games".into(), json!("10")),
        ])];
        let snap = LeagueSnapshot::from_records(&players, &weeks, &[]);
        assert_eq!(snap.players.len(), 1);
        assert_eq!(snap.players[0].name, "Alice");
        assert_eq!(snap.weeks.len(), 1);
        assert!(snap.results.is_empty());
    }

    #[test]
    fn from_records_drops_scores_above_total_games() {
        let weeks = vec![RawRecord::from([
            ("id".into(), json!(1)),
            ("week_number".into(), json!(1)),
            ("season_year".into(), json!(2025)),
            ("total_games".into(), json!(10)),
        ])];
        let result = |id: i64, correct: serde_json::Value, status: &str| {
            RawRecord::from([
                ("id".into(), json!(id)),
                ("player_id".into(), json!(1)),
                ("week_id".into(), json!(1)),
                ("correct_guesses".into(), correct),
                ("status".into(), json!(status)),
            ])
        };
        let results = vec![
            result(1, json!("15"), "participated"),
            result(2, json!(10), "participated"),
            result(3, json!(null), "omitted"),
        ];
        let snap = LeagueSnapshot::from_records(&[], &weeks, &results);
        let kept: Vec<i64> = snap.results.iter().map(|r| r.id).collect();
        assert_eq!(kept, vec![2, 3]);
    }

    #[test]
    fn weeks_in_scope_filters_season_and_week() {
        let snap = LeagueSnapshot::new(
            vec![],
            vec![week(1, 2024, 1), week(2, 2025, 1), week(3, 2025, 2)],
            vec![],
        );
        let season: Vec<WeekId> = snap.weeks_in_scope(2025, None).iter().map(|w| w.id).collect();
        assert_eq!(season, vec![2, 3]);
        let single: Vec<WeekId> = snap.weeks_in_scope(2025, Some(2)).iter().map(|w| w.id).collect();
        assert_eq!(single, vec![3]);
        assert!(snap.weeks_in_scope(2023, None).is_empty());
    }

    #[test]
    fn seasons_are_distinct_and_descending() {
        let snap = LeagueSnapshot::new(
            vec![],
            vec![week(1, 2024, 1), week(2, 2025, 1), week(3, 2024, 2)],
            vec![],
        );
        assert_eq!(snap.seasons(), vec![2025, 2024]);
    }

    #[test]
    fn result_index_keeps_first_duplicate() {
        let snap = LeagueSnapshot::new(
            vec![],
            vec![week(1, 2025, 1)],
            vec![result(10, 1, 1, 4), result(11, 1, 1, 9)],
        );
        let index = snap.result_index();
        assert_eq!(index.len(), 1);
        assert_eq!(index[&(1, 1)].id, 10);
    }

    #[test]
    fn player_lookup_trims_name() {
        let snap = LeagueSnapshot::new(
            vec![Player {
                id: 1,
                name: "Alice".into(),
                created_at: None,
            }],
            vec![],
            vec![],
        );
        assert_eq!(snap.player_by_name("  Alice ").map(|p| p.id), Some(1));
        assert!(snap.player_by_name("alice").is_none());
    }
}
