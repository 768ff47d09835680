// Records, snapshots and persistence for the pick'em league.
//
// Analysis lives in `pickem-stats`; this crate only gets data in and out of
// a store and into a consistent, typed snapshot.

pub mod config;
pub mod interchange;
pub mod league;
pub mod record;
pub mod snapshot;
pub mod store;

pub use league::{League, LeagueError};
pub use record::{Collection, GameResult, Outcome, Player, RawRecord, ResultStatus, Week};
pub use snapshot::LeagueSnapshot;
pub use store::{MemoryStore, RecordStore, SqliteStore, StoreError};
