// In-process record store, used by tests and for scratch analyses of
// imported CSV files.

use std::collections::BTreeMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::record::{Collection, RawRecord};
use crate::store::{canonical_fields, RecordStore, StoreError};

type Tables = BTreeMap<Collection, BTreeMap<i64, RawRecord>>;

#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, Tables> {
        self.tables.read().expect("memory store lock poisoned")
    }

    fn write(&self) -> RwLockWriteGuard<'_, Tables> {
        self.tables.write().expect("memory store lock poisoned")
    }
}

impl RecordStore for MemoryStore {
    fn list_records(&self, collection: Collection) -> Result<Vec<RawRecord>, StoreError> {
        Ok(self
            .read()
            .get(&collection)
            .map(|table| table.values().cloned().collect())
            .unwrap_or_default())
    }

    fn upsert_record(&self, collection: Collection, id: i64, fields: &RawRecord) -> Result<(), StoreError> {
        self.write()
            .entry(collection)
            .or_default()
            .insert(id, canonical_fields(collection, id, fields));
        Ok(())
    }

    fn delete_record(&self, collection: Collection, id: i64) -> Result<bool, StoreError> {
        Ok(self
            .write()
            .get_mut(&collection)
            .is_some_and(|table| table.remove(&id).is_some()))
    }

    fn next_id(&self, collection: Collection) -> Result<i64, StoreError> {
        Ok(self
            .read()
            .get(&collection)
            .and_then(|table| table.keys().next_back().copied())
            .map_or(1, |max| max + 1))
    }
}
