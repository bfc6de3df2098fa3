//! In-memory personnel database — gallery, records, append-only ledger.
//!
//! A plain value with no I/O: the caller owns it and persists it through
//! [`crate::store::Store`] after each mutation.

use crate::personnel::{LedgerAction, LedgerEntry, PersonnelRecord, PresenceStatus, Profile};
use chrono::Local;
use facepass_core::gallery::GalleryError;
use facepass_core::{Descriptor, Gallery};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

/// Version tag written into new database units. Legacy tagless units
/// deserialize with version 0; the dimension probe in the store remains the
/// actual compatibility mechanism.
pub const SCHEMA_VERSION: u32 = 1;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum DatabaseError {
    #[error("unknown identity: {0}")]
    UnknownIdentity(String),
    #[error("identity already exists: {0}")]
    DuplicateIdentity(String),
}

impl From<GalleryError> for DatabaseError {
    fn from(err: GalleryError) -> Self {
        match err {
            GalleryError::UnknownIdentity(name) => DatabaseError::UnknownIdentity(name),
            GalleryError::DuplicateIdentity(name) => DatabaseError::DuplicateIdentity(name),
        }
    }
}

/// The full persisted state: descriptor gallery, personnel records, ledger,
/// and the monotonically increasing identity counter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Database {
    #[serde(default)]
    pub schema_version: u32,
    pub gallery: Gallery,
    pub records: HashMap<String, PersonnelRecord>,
    pub ledger: Vec<LedgerEntry>,
    pub identity_counter: u64,
}

impl Default for Database {
    fn default() -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            gallery: Gallery::new(),
            records: HashMap::new(),
            ledger: Vec::new(),
            identity_counter: 0,
        }
    }
}

impl Database {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a descriptor sample for an identity. The first enrollment
    /// creates the identity, its personnel record, and bumps the identity
    /// counter; later enrollments only grow the sample list and leave the
    /// existing record untouched.
    pub fn enroll(&mut self, identity: &str, profile: Profile, descriptor: Descriptor) {
        let created = self.gallery.enroll(identity, descriptor);
        if created {
            self.identity_counter += 1;
        }
        self.records
            .entry(identity.to_string())
            .or_insert_with(|| PersonnelRecord::new(profile));
    }

    /// Remove an identity, its samples, and its record. Idempotent; returns
    /// false if nothing was present.
    pub fn delete_identity(&mut self, identity: &str) -> bool {
        let removed_samples = self.gallery.remove(identity);
        let removed_record = self.records.remove(identity).is_some();
        removed_samples || removed_record
    }

    /// Atomically move an identity's sample list and record to a new key.
    pub fn rename_identity(&mut self, old: &str, new: &str) -> Result<(), DatabaseError> {
        if old == new {
            if !self.gallery.contains(old) {
                return Err(DatabaseError::UnknownIdentity(old.to_string()));
            }
            return Ok(());
        }
        self.gallery.rename(old, new)?;
        if let Some(record) = self.records.remove(old) {
            self.records.insert(new.to_string(), record);
        }
        // Ledger entries are immutable after append: past events keep the
        // name the identity had when they were recorded.
        Ok(())
    }

    /// Apply an entry/exit transition and append the matching ledger entry.
    ///
    /// The transition is unconditional: a second Entry without an intervening
    /// Exit simply refreshes the entry timestamp (preserved source behavior).
    pub fn record_event(
        &mut self,
        identity: &str,
        action: LedgerAction,
    ) -> Result<LedgerEntry, DatabaseError> {
        let record = self
            .records
            .get_mut(identity)
            .ok_or_else(|| DatabaseError::UnknownIdentity(identity.to_string()))?;

        let timestamp = Local::now();
        match action {
            LedgerAction::Entry => {
                record.status = PresenceStatus::AtWork;
                record.entry_time = Some(timestamp);
            }
            LedgerAction::Exit => {
                record.status = PresenceStatus::Away;
                record.exit_time = Some(timestamp);
            }
        }

        let entry = LedgerEntry {
            identity: identity.to_string(),
            action,
            timestamp,
        };
        self.ledger.push(entry.clone());
        Ok(entry)
    }

    /// Replace an identity's profile fields.
    pub fn update_profile(&mut self, identity: &str, profile: Profile) -> Result<(), DatabaseError> {
        let record = self
            .records
            .get_mut(identity)
            .ok_or_else(|| DatabaseError::UnknownIdentity(identity.to_string()))?;
        record.profile = profile;
        Ok(())
    }

    /// Rename an identity (when `old != new`) and replace its profile.
    pub fn update_identity(
        &mut self,
        old: &str,
        new: &str,
        profile: Profile,
    ) -> Result<(), DatabaseError> {
        self.rename_identity(old, new)?;
        self.update_profile(new, profile)
    }

    pub fn record(&self, identity: &str) -> Option<&PersonnelRecord> {
        self.records.get(identity)
    }

    pub(crate) fn record_mut(&mut self, identity: &str) -> Option<&mut PersonnelRecord> {
        self.records.get_mut(identity)
    }

    /// All enrolled identity names in enrollment order.
    pub fn identities(&self) -> impl Iterator<Item = &str> {
        self.gallery.identities()
    }

    /// Ledger entries oldest-first, optionally filtered to one identity.
    pub fn history(&self, identity: Option<&str>) -> Vec<&LedgerEntry> {
        match identity {
            Some(name) => self.ledger.iter().filter(|e| e.identity == name).collect(),
            None => self.ledger.iter().collect(),
        }
    }
}
