//! facepass-store — durable personnel database, presence ledger, and
//! enrollment engine.
//!
//! Owns everything stateful: per-identity personnel records, the append-only
//! entry/exit ledger, the single serialized database unit with load-time
//! dimension repair, photo-asset archiving, and the synchronous engine that
//! ties them to the descriptor extraction and matching in `facepass-core`.

pub mod assets;
pub mod config;
pub mod database;
pub mod engine;
pub mod personnel;
pub mod store;

pub use config::Config;
pub use database::{Database, DatabaseError};
pub use engine::{Engine, EngineError, EnrollmentRequest};
pub use personnel::{LedgerAction, LedgerEntry, PersonnelRecord, PresenceStatus, Profile};
pub use store::{Store, StoreError};
