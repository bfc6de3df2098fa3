//! Personnel records — profiles, presence state, and ledger entries.

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Employee profile attached to exactly one enrolled identity.
///
/// Unknown fields are rejected at the deserialization boundary; the loose
/// per-person dictionaries of earlier systems are not accepted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Profile {
    pub position: String,
    pub age: u32,
    pub rank: String,
}

/// Presence state, derived solely from the most recent ledger entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PresenceStatus {
    Away,
    AtWork,
}

/// Direction of a ledger event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LedgerAction {
    Entry,
    Exit,
}

/// Per-identity record: profile, presence, event timestamps, and paths to
/// archived photo assets. The database unit stores paths only, never bytes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersonnelRecord {
    pub profile: Profile,
    pub status: PresenceStatus,
    pub entry_time: Option<DateTime<Local>>,
    pub exit_time: Option<DateTime<Local>>,
    pub face_photo_path: Option<PathBuf>,
    pub original_photo_path: Option<PathBuf>,
}

impl PersonnelRecord {
    /// Fresh record for a first enrollment: away, no events, no assets yet.
    pub fn new(profile: Profile) -> Self {
        Self {
            profile,
            status: PresenceStatus::Away,
            entry_time: None,
            exit_time: None,
            face_photo_path: None,
            original_photo_path: None,
        }
    }
}

/// One entry in the append-only entry/exit ledger. Never edited or removed;
/// insertion order is chronological order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub identity: String,
    pub action: LedgerAction,
    pub timestamp: DateTime<Local>,
}
