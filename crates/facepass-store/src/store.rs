//! Durable persistence — one JSON unit, atomic rewrite, load-time repair.
//!
//! The whole [`Database`] is serialized as a single document and fully
//! rewritten on every mutation. Writes go to a `.tmp` sibling first, then
//! rename over the target, so a crash mid-write never corrupts the unit.
//!
//! Loading self-heals dimension drift: the descriptor format may evolve
//! between versions, so any stored descriptor whose length disagrees with the
//! current extractor output is purged, together with the personnel record of
//! any identity left without samples.

use crate::database::Database;
use facepass_core::features;
use std::fs;
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("failed to write database unit: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to serialize database unit: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Handle to the on-disk database unit.
pub struct Store {
    path: PathBuf,
}

impl Store {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the database unit and repair dimension drift.
    ///
    /// A missing file is a first run; an unreadable or corrupt file degrades
    /// to an empty database (logged loudly) rather than failing the host.
    /// The only error path is a failed rewrite of a repaired unit — losing
    /// the repair silently would reintroduce the corruption on next load.
    pub fn load(&self) -> Result<Database, StoreError> {
        let mut db = self.read_unit();
        let removed = repair_dimensions(&mut db);
        if removed > 0 {
            tracing::info!(removed, "persisting dimension-repaired database");
            self.save(&db)?;
        }
        Ok(db)
    }

    fn read_unit(&self) -> Database {
        if !self.path.exists() {
            tracing::debug!(path = %self.path.display(), "no database unit on disk, starting empty");
            return Database::new();
        }

        let file = match fs::File::open(&self.path) {
            Ok(file) => file,
            Err(error) => {
                tracing::error!(
                    path = %self.path.display(),
                    %error,
                    "cannot open database unit, starting empty"
                );
                return Database::new();
            }
        };

        match serde_json::from_reader(BufReader::new(file)) {
            Ok(db) => db,
            Err(error) => {
                tracing::error!(
                    path = %self.path.display(),
                    %error,
                    "database unit is corrupt, starting empty"
                );
                Database::new()
            }
        }
    }

    /// Atomically rewrite the full database unit.
    ///
    /// Errors are surfaced to the caller — silently losing an enrollment or a
    /// ledger event is unacceptable.
    pub fn save(&self, db: &Database) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }

        let tmp_path = self.path.with_extension("tmp");
        {
            let file = fs::File::create(&tmp_path)?;
            let mut writer = BufWriter::new(file);
            serde_json::to_writer(&mut writer, db)?;
            writer.flush()?;
        }
        fs::rename(&tmp_path, &self.path)?;
        Ok(())
    }
}

/// Purge descriptors whose length no longer matches the current extractor
/// output, probing the reference length on a blank calibration region.
/// Identities left with no samples lose their personnel record too.
/// Returns the number of descriptors removed.
fn repair_dimensions(db: &mut Database) -> usize {
    let reference_len = features::calibration_descriptor_len();

    let removed = db.gallery.retain_samples(|identity, descriptor| {
        if descriptor.len() == reference_len {
            true
        } else {
            tracing::warn!(
                identity,
                stored_len = descriptor.len(),
                reference_len,
                "purging descriptor with incompatible dimensionality"
            );
            false
        }
    });

    for identity in db.gallery.prune_empty() {
        tracing::warn!(
            identity = %identity,
            "no compatible descriptors left, dropping personnel record"
        );
        db.records.remove(&identity);
    }

    removed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::SCHEMA_VERSION;
    use crate::personnel::{LedgerAction, Profile};
    use facepass_core::features::DESCRIPTOR_LEN;
    use facepass_core::Descriptor;

    fn profile() -> Profile {
        Profile {
            position: "operator".to_string(),
            age: 28,
            rank: "junior".to_string(),
        }
    }

    fn full_length_descriptor(seed: f32) -> Descriptor {
        Descriptor {
            values: (0..DESCRIPTOR_LEN).map(|i| seed + i as f32).collect(),
        }
    }

    #[test]
    fn test_missing_file_loads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::new(dir.path().join("face_database.json"));
        let db = store.load().unwrap();
        assert!(db.gallery.is_empty());
        assert!(db.ledger.is_empty());
        assert_eq!(db.schema_version, SCHEMA_VERSION);
    }

    #[test]
    fn test_round_trip_preserves_everything() {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::new(dir.path().join("face_database.json"));

        let mut db = Database::new();
        db.enroll("alice", profile(), full_length_descriptor(0.0));
        db.enroll("alice", profile(), full_length_descriptor(1.0));
        db.enroll("bob", profile(), full_length_descriptor(2.0));
        db.record_event("alice", LedgerAction::Entry).unwrap();
        db.record_event("alice", LedgerAction::Exit).unwrap();

        store.save(&db).unwrap();
        let loaded = store.load().unwrap();

        let names: Vec<&str> = loaded.identities().collect();
        assert_eq!(names, vec!["alice", "bob"]);
        assert_eq!(loaded.gallery.samples("alice").unwrap().len(), 2);
        assert_eq!(loaded.gallery.samples("bob").unwrap().len(), 1);
        assert_eq!(loaded.ledger.len(), 2);
        assert_eq!(loaded.ledger, db.ledger);
        assert_eq!(loaded.identity_counter, 2);
    }

    #[test]
    fn test_corrupt_unit_degrades_to_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("face_database.json");
        fs::write(&path, b"{ not json").unwrap();

        let db = Store::new(&path).load().unwrap();
        assert!(db.gallery.is_empty());
        assert!(db.records.is_empty());
    }

    #[test]
    fn test_dimension_repair_drops_stale_descriptor() {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::new(dir.path().join("face_database.json"));

        let mut db = Database::new();
        db.enroll("alice", profile(), full_length_descriptor(0.0));
        // A short descriptor from an older extractor version.
        db.enroll(
            "alice",
            profile(),
            Descriptor {
                values: vec![1.0; 100],
            },
        );
        store.save(&db).unwrap();

        let repaired = store.load().unwrap();
        assert_eq!(repaired.gallery.samples("alice").unwrap().len(), 1);
        assert!(repaired.record("alice").is_some());
    }

    #[test]
    fn test_dimension_repair_drops_orphaned_record_and_persists() {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::new(dir.path().join("face_database.json"));

        let mut db = Database::new();
        db.enroll("alice", profile(), full_length_descriptor(0.0));
        db.enroll(
            "bob",
            profile(),
            Descriptor {
                values: vec![1.0; 7],
            },
        );
        store.save(&db).unwrap();

        let repaired = store.load().unwrap();
        assert!(!repaired.gallery.contains("bob"));
        assert!(repaired.record("bob").is_none());
        assert!(repaired.record("alice").is_some());

        // The repaired state is what got persisted: a second load sees the
        // same database without re-repairing.
        let again = store.load().unwrap();
        assert!(!again.gallery.contains("bob"));
        assert!(again.record("bob").is_none());
    }

    #[test]
    fn test_legacy_unit_without_version_tag_loads() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("face_database.json");
        fs::write(
            &path,
            br#"{"gallery":{"entries":[]},"records":{},"ledger":[],"identity_counter":3}"#,
        )
        .unwrap();

        let db = Store::new(&path).load().unwrap();
        assert_eq!(db.schema_version, 0);
        assert_eq!(db.identity_counter, 3);
    }

    #[test]
    fn test_save_leaves_no_tmp_file_behind() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("face_database.json");
        let store = Store::new(&path);
        store.save(&Database::new()).unwrap();

        assert!(path.exists());
        assert!(!path.with_extension("tmp").exists());
    }
}
