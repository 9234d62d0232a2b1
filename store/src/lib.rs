//! RateSync Store
//!
//! Append-only persistence for rate snapshots and symbol sets, plus the
//! freshness checks derived from it.

pub mod store;
pub mod memory;
pub mod postgres;
pub mod freshness;

pub use store::SnapshotStore;
pub use memory::MemoryStore;
pub use postgres::PgStore;
pub use freshness::{FreshnessOracle, RecordKind};
