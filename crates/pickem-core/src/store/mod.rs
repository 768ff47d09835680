// Record store abstraction: list-all and upsert-by-id over the three
// league collections, plus the backends that implement it.

pub mod memory;
pub mod sqlite;

use thiserror::Error;

use crate::record::{Collection, RawRecord};
use crate::snapshot::LeagueSnapshot;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to open store at {path}: {source}")]
    Open {
        path: String,
        source: rusqlite::Error,
    },
}

/// Persistence collaborator for the league records.
///
/// Stores deal only in flat, field-named records and do not enforce any
/// relationships between collections; that is the job of
/// [`crate::league::League`]. Writes are last-write-wins.
pub trait RecordStore {
    /// Every record of `collection`, ordered by id.
    fn list_records(&self, collection: Collection) -> Result<Vec<RawRecord>, StoreError>;

    /// Insert or wholesale replace the record with `id`. Fields outside the
    /// collection's canonical set are ignored; the `id` field in `fields`
    /// is overridden by `id`.
    fn upsert_record(&self, collection: Collection, id: i64, fields: &RawRecord) -> Result<(), StoreError>;

    /// Remove the record with `id`. Returns whether a record was removed.
    fn delete_record(&self, collection: Collection, id: i64) -> Result<bool, StoreError>;

    /// Smallest id greater than every id currently in `collection`.
    fn next_id(&self, collection: Collection) -> Result<i64, StoreError> {
        let max = self
            .list_records(collection)?
            .iter()
            .filter_map(|r| crate::record::coerce_i64(r.get("id")))
            .max()
            .unwrap_or(0);
        Ok(max + 1)
    }

    /// Read all three collections and coerce them into a snapshot.
    fn snapshot(&self) -> Result<LeagueSnapshot, StoreError> {
        let players = self.list_records(Collection::Players)?;
        let weeks = self.list_records(Collection::Weeks)?;
        let results = self.list_records(Collection::Results)?;
        Ok(LeagueSnapshot::from_records(&players, &weeks, &results))
    }
}

impl<S: RecordStore + ?Sized> RecordStore for &S {
    fn list_records(&self, collection: Collection) -> Result<Vec<RawRecord>, StoreError> {
        (**self).list_records(collection)
    }

    fn upsert_record(&self, collection: Collection, id: i64, fields: &RawRecord) -> Result<(), StoreError> {
        (**self).upsert_record(collection, id, fields)
    }

    fn delete_record(&self, collection: Collection, id: i64) -> Result<bool, StoreError> {
        (**self).delete_record(collection, id)
    }

    fn next_id(&self, collection: Collection) -> Result<i64, StoreError> {
        (**self).next_id(collection)
    }
}

/// Keep only the canonical fields of `collection`, forcing `id`.
pub(crate) fn canonical_fields(collection: Collection, id: i64, fields: &RawRecord) -> RawRecord {
    let mut record: RawRecord = collection
        .fields()
        .iter()
        .map(|&name| {
            let value = fields.get(name).cloned().unwrap_or(serde_json::Value::Null);
            (name.to_string(), value)
        })
        .collect();
    record.insert("id".into(), serde_json::Value::from(id));
    record
}
