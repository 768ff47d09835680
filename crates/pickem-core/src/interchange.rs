// CSV import/export of whole collections.
//
// Import is lenient: every cell lands in the store as a string
// (or null when empty) and typing happens later at snapshot time, so a sheet
// with a few bad cells still loads.

use std::io::{Read, Write};

use serde_json::Value;
use tracing::{info, warn};

use crate::record::{coerce_i64, Collection, RawRecord};
use crate::store::{RecordStore, StoreError};

/// Outcome of a CSV import.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportSummary {
    /// Rows written to the store.
    pub imported: usize,
    /// Rows that had no usable `id` and were given a fresh one.
    pub assigned_ids: usize,
}

/// Read a headed CSV and upsert each row into `collection`.
///
/// Columns outside the collection's field set are ignored. Rows whose `id`
/// is missing or not an integer get the next free id.
pub fn import_csv<S, R>(store: &S, collection: Collection, reader: R) -> Result<ImportSummary, StoreError>
where
    S: RecordStore + ?Sized,
    R: Read,
{
    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(reader);
    let headers = rdr.headers()?.clone();

    let unknown: Vec<&str> = headers
        .iter()
        .filter(|h| !collection.fields().contains(h))
        .collect();
    if !unknown.is_empty() {
        warn!(%collection, columns = ?unknown, "ignoring unknown CSV columns");
    }

    let mut summary = ImportSummary::default();
    for row in rdr.records() {
        let row = row?;
        let record: RawRecord = headers
            .iter()
            .zip(row.iter())
            .filter(|(h, _)| collection.fields().contains(h))
            .map(|(h, cell)| {
                let value = if cell.is_empty() {
                    Value::Null
                } else {
                    Value::String(cell.to_string())
                };
                (h.to_string(), value)
            })
            .collect();

        let id = match coerce_i64(record.get("id")) {
            Some(id) => id,
            None => {
                summary.assigned_ids += 1;
                store.next_id(collection)?
            }
        };
        store.upsert_record(collection, id, &record)?;
        summary.imported += 1;
    }

    info!(
        %collection,
        imported = summary.imported,
        assigned_ids = summary.assigned_ids,
        "CSV import finished"
    );
    Ok(summary)
}

/// Write every record of `collection` as CSV with the canonical columns.
/// Returns the number of rows written.
pub fn export_csv<S, W>(store: &S, collection: Collection, writer: W) -> Result<usize, StoreError>
where
    S: RecordStore + ?Sized,
    W: Write,
{
    let fields = collection.fields();
    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record(fields)?;

    let records = store.list_records(collection)?;
    for record in &records {
        wtr.write_record(fields.iter().map(|&f| cell(record.get(f))))?;
    }
    wtr.flush()?;
    Ok(records.len())
}

fn cell(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}
