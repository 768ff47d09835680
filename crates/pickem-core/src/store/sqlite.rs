// SQLite persistence for the league collections.

use std::sync::{Mutex, MutexGuard};

use rusqlite::types::Value as SqlValue;
use rusqlite::{params, params_from_iter, Connection};
use serde_json::Value;
use tracing::debug;

use crate::record::{Collection, RawRecord};
use crate::store::{canonical_fields, RecordStore, StoreError};

/// SQLite-backed record store. One table per collection; columns are
/// declared with type affinity only, so whatever scalar a caller writes is
/// kept and coerced later on read.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open (or create) a SQLite database at `path` and ensure all tables
    /// exist. Pass `":memory:"` for an ephemeral in-memory database (useful
    /// for tests).
    pub fn open(path: &str) -> Result<Self, StoreError> {
        let conn = Connection::open(path).map_err(|source| StoreError::Open {
            path: path.to_string(),
            source,
        })?;

        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA busy_timeout = 5000;",
        )?;

        conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS players (
                id          INTEGER PRIMARY KEY,
                name        TEXT,
                created_at  TEXT
            );

            CREATE TABLE IF NOT EXISTS weeks (
                id          INTEGER PRIMARY KEY,
                week_number INTEGER,
                season_year INTEGER,
                total_games INTEGER,
                week_date   TEXT,
                created_at  TEXT
            );

            CREATE TABLE IF NOT EXISTS results (
                id              INTEGER PRIMARY KEY,
                player_id       INTEGER,
                week_id         INTEGER,
                correct_guesses INTEGER,
                status          TEXT,
                created_at      TEXT
            );

            CREATE INDEX IF NOT EXISTS idx_weeks_season ON weeks(season_year, week_number);
            CREATE INDEX IF NOT EXISTS idx_results_player_week ON results(player_id, week_id);
            ",
        )?;

        debug!(path, "record store opened");

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Acquire the database connection.
    ///
    /// Panics if the mutex is poisoned (another thread panicked while
    /// holding the lock).
    fn conn(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().expect("database mutex poisoned")
    }

    /// Number of rows in `collection`.
    pub fn count(&self, collection: Collection) -> Result<usize, StoreError> {
        let conn = self.conn();
        let count: i64 = conn.query_row(
            &format!("SELECT COUNT(*) FROM {}", collection.name()),
            [],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }
}

impl RecordStore for SqliteStore {
    fn list_records(&self, collection: Collection) -> Result<Vec<RawRecord>, StoreError> {
        let fields = collection.fields();
        let conn = self.conn();
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM {} ORDER BY id",
            fields.join(", "),
            collection.name()
        ))?;

        let records = stmt
            .query_map([], |row| {
                let mut record = RawRecord::new();
                for (i, &name) in fields.iter().enumerate() {
                    let value: SqlValue = row.get(i)?;
                    record.insert(name.to_string(), from_sql(value));
                }
                Ok(record)
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(records)
    }

    fn upsert_record(&self, collection: Collection, id: i64, fields: &RawRecord) -> Result<(), StoreError> {
        let record = canonical_fields(collection, id, fields);
        let names = collection.fields();
        let placeholders: Vec<String> = (1..=names.len()).map(|i| format!("?{i}")).collect();
        let updates: Vec<String> = names
            .iter()
            .filter(|&&name| name != "id")
            .map(|name| format!("{name} = excluded.{name}"))
            .collect();
        let sql = format!(
            "INSERT INTO {} ({}) VALUES ({})
             ON CONFLICT(id) DO UPDATE SET {}",
            collection.name(),
            names.join(", "),
            placeholders.join(", "),
            updates.join(", ")
        );
        let values = names.iter().map(|&name| to_sql(&record[name]));

        let conn = self.conn();
        conn.execute(&sql, params_from_iter(values))?;
        Ok(())
    }

    fn delete_record(&self, collection: Collection, id: i64) -> Result<bool, StoreError> {
        let conn = self.conn();
        let removed = conn.execute(
            &format!("DELETE FROM {} WHERE id = ?1", collection.name()),
            params![id],
        )?;
        Ok(removed > 0)
    }

    fn next_id(&self, collection: Collection) -> Result<i64, StoreError> {
        let conn = self.conn();
        let next: i64 = conn.query_row(
            &format!("SELECT COALESCE(MAX(id), 0) + 1 FROM {}", collection.name()),
            [],
            |row| row.get(0),
        )?;
        Ok(next)
    }
}

fn from_sql(value: SqlValue) -> Value {
    match value {
        SqlValue::Null | SqlValue::Blob(_) => Value::Null,
        SqlValue::Integer(i) => Value::from(i),
        SqlValue::Real(f) => serde_json::Number::from_f64(f)
            .map(Value::Number)
            .unwrap_or(Value::Null),
        SqlValue::Text(s) => Value::String(s),
    }
}

fn to_sql(value: &Value) -> SqlValue {
    match value {
        Value::Null => SqlValue::Null,
        Value::Bool(b) => SqlValue::Integer(i64::from(*b)),
        Value::Number(n) => match n.as_i64() {
            Some(i) => SqlValue::Integer(i),
            None => n.as_f64().map_or(SqlValue::Null, SqlValue::Real),
        },
        Value::String(s) => SqlValue::Text(s.clone()),
        other => SqlValue::Text(other.to_string()),
    }
}
