// League records (players, weeks, results) and coercion from flat store rows.
//
// Stores hand back loosely typed, field-named records. Everything numeric is
// coerced leniently: unparseable values become absent rather than errors, and
// a record missing a required field is rejected here so the analysis code
// only ever sees well-formed structs.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

pub type PlayerId = i64;
pub type WeekId = i64;
pub type ResultId = i64;

/// A flat, field-named record as stored by a [`crate::store::RecordStore`].
pub type RawRecord = BTreeMap<String, Value>;

const DATE_FORMAT: &str = "%Y-%m-%d";

// ---------------------------------------------------------------------------
// Collections
// ---------------------------------------------------------------------------

/// The three record collections a store exposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Collection {
    Players,
    Weeks,
    Results,
}

impl Collection {
    pub const ALL: [Collection; 3] = [Collection::Players, Collection::Weeks, Collection::Results];

    /// Collection (and table) name.
    pub fn name(&self) -> &'static str {
        match self {
            Collection::Players => "players",
            Collection::Weeks => "weeks",
            Collection::Results => "results",
        }
    }

    /// Canonical field names, `id` first.
    pub fn fields(&self) -> &'static [&'static str] {
        match self {
            Collection::Players => &["id", "name", "created_at"],
            Collection::Weeks => &[
                "id",
                "week_number",
                "season_year",
                "total_games",
                "week_date",
                "created_at",
            ],
            Collection::Results => &[
                "id",
                "player_id",
                "week_id",
                "correct_guesses",
                "status",
                "created_at",
            ],
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Error)]
#[error("unknown collection `{0}` (expected players, weeks or results)")]
pub struct UnknownCollection(pub String);

impl FromStr for Collection {
    type Err = UnknownCollection;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "players" => Ok(Collection::Players),
            // "games" and "predictions" are the sheet names older exports used.
            "weeks" | "games" => Ok(Collection::Weeks),
            "results" | "predictions" => Ok(Collection::Results),
            other => Err(UnknownCollection(other.to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// Typed records
// ---------------------------------------------------------------------------

/// A contest participant. Names are unique and used as the public lookup key.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Player {
    pub id: PlayerId,
    pub name: String,
    pub created_at: Option<DateTime<Utc>>,
}

/// One scheduled week of a season. `total_games` is the maximum possible score.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Week {
    pub id: WeekId,
    pub week_number: u32,
    pub season_year: i32,
    pub total_games: u32,
    pub week_date: Option<NaiveDate>,
    pub created_at: Option<DateTime<Utc>>,
}

/// Recorded status of a player's week.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResultStatus {
    Participated,
    Omitted,
}

impl ResultStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResultStatus::Participated => "participated",
            ResultStatus::Omitted => "omitted",
        }
    }
}

impl FromStr for ResultStatus {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "participated" => Ok(ResultStatus::Participated),
            "omitted" => Ok(ResultStatus::Omitted),
            _ => Err(()),
        }
    }
}

/// What a player did in a week. A score only exists for participated weeks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum Outcome {
    Participated { correct_guesses: u32 },
    Omitted,
}

impl Outcome {
    pub fn status(&self) -> ResultStatus {
        match self {
            Outcome::Participated { .. } => ResultStatus::Participated,
            Outcome::Omitted => ResultStatus::Omitted,
        }
    }

    pub fn correct_guesses(&self) -> Option<u32> {
        match self {
            Outcome::Participated { correct_guesses } => Some(*correct_guesses),
            Outcome::Omitted => None,
        }
    }
}

/// A player's recorded result for one week.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GameResult {
    pub id: ResultId,
    pub player_id: PlayerId,
    pub week_id: WeekId,
    #[serde(flatten)]
    pub outcome: Outcome,
    pub created_at: Option<DateTime<Utc>>,
}

// ---------------------------------------------------------------------------
// Record <-> struct conversion
// ---------------------------------------------------------------------------

impl Player {
    /// Build a player from a store record. Returns `None` when the id or name
    /// is missing.
    pub fn from_record(record: &RawRecord) -> Option<Self> {
        Some(Player {
            id: coerce_i64(record.get("id"))?,
            name: coerce_string(record.get("name"))?,
            created_at: coerce_timestamp(record.get("created_at")),
        })
    }

    pub fn to_record(&self) -> RawRecord {
        let mut record = RawRecord::new();
        record.insert("id".into(), Value::from(self.id));
        record.insert("name".into(), Value::from(self.name.clone()));
        record.insert("created_at".into(), timestamp_value(self.created_at));
        record
    }
}

impl Week {
    /// Build a week from a store record. Returns `None` when any of id,
    /// week number, season year or total games is missing or not a valid
    /// non-negative integer.
    pub fn from_record(record: &RawRecord) -> Option<Self> {
        Some(Week {
            id: coerce_i64(record.get("id"))?,
            week_number: coerce_u32(record.get("week_number"))?,
            season_year: coerce_i64(record.get("season_year")).and_then(|v| i32::try_from(v).ok())?,
            total_games: coerce_u32(record.get("total_games"))?,
            week_date: coerce_date(record.get("week_date")),
            created_at: coerce_timestamp(record.get("created_at")),
        })
    }

    pub fn to_record(&self) -> RawRecord {
        let mut record = RawRecord::new();
        record.insert("id".into(), Value::from(self.id));
        record.insert("week_number".into(), Value::from(self.week_number));
        record.insert("season_year".into(), Value::from(self.season_year));
        record.insert("total_games".into(), Value::from(self.total_games));
        record.insert(
            "week_date".into(),
            self.week_date
                .map(|d| Value::from(d.format(DATE_FORMAT).to_string()))
                .unwrap_or(Value::Null),
        );
        record.insert("created_at".into(), timestamp_value(self.created_at));
        record
    }
}

impl GameResult {
    /// Build a result from a store record. A participated result whose score
    /// cannot be read is rejected, as is an unrecognized status.
    pub fn from_record(record: &RawRecord) -> Option<Self> {
        let status = coerce_string(record.get("status"))?.parse::<ResultStatus>().ok()?;
        let outcome = match status {
            ResultStatus::Participated => Outcome::Participated {
                correct_guesses: coerce_u32(record.get("correct_guesses"))?,
            },
            ResultStatus::Omitted => Outcome::Omitted,
        };
        Some(GameResult {
            id: coerce_i64(record.get("id"))?,
            player_id: coerce_i64(record.get("player_id"))?,
            week_id: coerce_i64(record.get("week_id"))?,
            outcome,
            created_at: coerce_timestamp(record.get("created_at")),
        })
    }

    pub fn to_record(&self) -> RawRecord {
        let mut record = RawRecord::new();
        record.insert("id".into(), Value::from(self.id));
        record.insert("player_id".into(), Value::from(self.player_id));
        record.insert("week_id".into(), Value::from(self.week_id));
        record.insert(
            "correct_guesses".into(),
            self.outcome
                .correct_guesses()
                .map(Value::from)
                .unwrap_or(Value::Null),
        );
        record.insert("status".into(), Value::from(self.outcome.status().as_str()));
        record.insert("created_at".into(), timestamp_value(self.created_at));
        record
    }
}

// ---------------------------------------------------------------------------
// Coercion helpers
// ---------------------------------------------------------------------------

/// Coerce a JSON scalar to an integer. Accepts integers, integral floats and
/// numeric strings (`"7"`, `" 7.0 "`). Everything else is `None`.
pub fn coerce_i64(value: Option<&Value>) -> Option<i64> {
    match value? {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().and_then(integral)),
        Value::String(s) => {
            let s = s.trim();
            s.parse::<i64>()
                .ok()
                .or_else(|| s.parse::<f64>().ok().and_then(integral))
        }
        _ => None,
    }
}

/// Like [`coerce_i64`], but rejects negative values and values past `u32::MAX`.
pub fn coerce_u32(value: Option<&Value>) -> Option<u32> {
    coerce_i64(value).and_then(|v| u32::try_from(v).ok())
}

/// Coerce a JSON scalar to a trimmed, non-empty string. Numbers are rendered.
pub fn coerce_string(value: Option<&Value>) -> Option<String> {
    let s = match value? {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        _ => return None,
    };
    (!s.is_empty()).then_some(s)
}

/// Parse a timestamp written as RFC 3339 or `YYYY-MM-DD HH:MM:SS[.fff]` (UTC).
pub fn coerce_timestamp(value: Option<&Value>) -> Option<DateTime<Utc>> {
    let s = coerce_string(value)?;
    if let Ok(ts) = DateTime::parse_from_rfc3339(&s) {
        return Some(ts.with_timezone(&Utc));
    }
    ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(&s, fmt).ok())
        .map(|naive| naive.and_utc())
}

/// Parse a calendar date. A full timestamp is accepted and truncated to its date.
pub fn coerce_date(value: Option<&Value>) -> Option<NaiveDate> {
    let s = coerce_string(value)?;
    NaiveDate::parse_from_str(&s, DATE_FORMAT)
        .ok()
        .or_else(|| s.get(..10).and_then(|d| NaiveDate::parse_from_str(d, DATE_FORMAT).ok()))
}

fn integral(f: f64) -> Option<i64> {
    (f.is_finite() && f.fract() == 0.0 && f.abs() < 9.0e15).then_some(f as i64)
}

fn timestamp_value(ts: Option<DateTime<Utc>>) -> Value {
    ts.map(|t| Value::from(t.to_rfc3339()))
        .unwrap_or(Value::Null)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(value: Value) -> RawRecord {
        match value {
            Value::Object(map) => map.into_iter().collect(),
            other => panic!("expected object, got {other}"),
        }
    }

    #[test]
    fn coerce_i64_accepts_numbers_and_numeric_strings() {
        assert_eq!(coerce_i64(Some(&json!(7))), Some(7));
        assert_eq!(coerce_i64(Some(&json!(7.0))), Some(7));
        assert_eq!(coerce_i64(Some(&json!("12"))), Some(12));
        assert_eq!(coerce_i64(Some(&json!(" 12.0 "))), Some(12));
    }

    #[test]
    fn coerce_i64_treats_garbage_as_absent() {
        assert_eq!(coerce_i64(None), None);
        assert_eq!(coerce_i64(Some(&Value::Null)), None);
        assert_eq!(coerce_i64(Some(&json!("seven"))), None);
        assert_eq!(coerce_i64(Some(&json!(7.5))), None);
        assert_eq!(coerce_i64(Some(&json!(""))), None);
        assert_eq!(coerce_i64(Some(&json!(true))), None);
    }

    #[test]
    fn coerce_u32_rejects_negatives() {
        assert_eq!(coerce_u32(Some(&json!(-1))), None);
        assert_eq!(coerce_u32(Some(&json!("3"))), Some(3));
    }

    #[test]
    fn coerce_timestamp_formats() {
        let rfc = coerce_timestamp(Some(&json!("2025-09-07T18:30:00Z"))).unwrap();
        let sql = coerce_timestamp(Some(&json!("2025-09-07 18:30:00"))).unwrap();
        assert_eq!(rfc, sql);
        assert!(coerce_timestamp(Some(&json!("last tuesday"))).is_none());
    }

    #[test]
    fn coerce_date_truncates_timestamps() {
        let expected = NaiveDate::from_ymd_opt(2025, 9, 7).unwrap();
        assert_eq!(coerce_date(Some(&json!("2025-09-07"))), Some(expected));
        assert_eq!(coerce_date(Some(&json!("2025-09-07 00:00:00"))), Some(expected));
        assert_eq!(coerce_date(Some(&json!("07/09/2025"))), None);
    }

    #[test]
    fn week_from_string_fields() {
        let week = Week::from_record(&record(json!({
            "id": "4",
            "week_number": "2",
            "season_year": 2025,
            "total_games": "16",
            "week_date": "2025-09-14",
        })))
        .unwrap();
        assert_eq!(week.id, 4);
        assert_eq!(week.week_number, 2);
        assert_eq!(week.season_year, 2025);
        assert_eq!(week.total_games, 16);
        assert!(week.created_at.is_none());
    }

    #[test]
    fn week_missing_total_is_rejected() {
        let week = Week::from_record(&record(json!({
            "id": 1, "week_number": 1, "season_year": 2025, "total_games": "n/a",
        })));
        assert!(week.is_none());
    }

    #[test]
    fn participated_result_requires_score() {
        let ok = GameResult::from_record(&record(json!({
            "id": 1, "player_id": 1, "week_id": 1, "correct_guesses": "9", "status": "Participated",
        })))
        .unwrap();
        assert_eq!(ok.outcome, Outcome::Participated { correct_guesses: 9 });

        let missing = GameResult::from_record(&record(json!({
            "id": 2, "player_id": 1, "week_id": 1, "correct_guesses": "", "status": "participated",
        })));
        assert!(missing.is_none());
    }

    #[test]
    fn omitted_result_ignores_score() {
        let result = GameResult::from_record(&record(json!({
            "id": 3, "player_id": 1, "week_id": 2, "correct_guesses": 5, "status": "omitted",
        })))
        .unwrap();
        assert_eq!(result.outcome, Outcome::Omitted);
        assert_eq!(result.outcome.correct_guesses(), None);
    }

    #[test]
    fn unknown_status_is_rejected() {
        let result = GameResult::from_record(&record(json!({
            "id": 3, "player_id": 1, "week_id": 2, "status": "forfeit",
        })));
        assert!(result.is_none());
    }

    #[test]
    fn result_record_round_trips_status() {
        let result = GameResult {
            id: 5,
            player_id: 2,
            week_id: 3,
            outcome: Outcome::Omitted,
            created_at: None,
        };
        let rec = result.to_record();
        assert_eq!(rec["status"], json!("omitted"));
        assert_eq!(rec["correct_guesses"], Value::Null);
        assert_eq!(GameResult::from_record(&rec), Some(result));
    }

    #[test]
    fn collection_parses_legacy_names() {
        assert_eq!("games".parse::<Collection>().unwrap(), Collection::Weeks);
        assert_eq!("Predictions".parse::<Collection>().unwrap(), Collection::Results);
        assert!("teams".parse::<Collection>().is_err());
    }
}
