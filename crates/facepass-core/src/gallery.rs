//! Identity gallery — insertion-ordered descriptor lists per identity.
//!
//! Insertion order is part of the contract: matching iterates entries in the
//! order identities were first enrolled, which makes tie-breaking
//! deterministic and `identities()` stable.

use crate::types::Descriptor;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum GalleryError {
    #[error("unknown identity: {0}")]
    UnknownIdentity(String),
    #[error("identity already exists: {0}")]
    DuplicateIdentity(String),
}

/// One enrolled identity and its descriptor samples.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GalleryEntry {
    pub identity: String,
    pub samples: Vec<Descriptor>,
}

/// The full gallery of enrolled identities.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Gallery {
    entries: Vec<GalleryEntry>,
}

impl Gallery {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a descriptor sample to an identity's list, creating the identity
    /// if absent. Returns true when the identity was newly created.
    pub fn enroll(&mut self, identity: &str, descriptor: Descriptor) -> bool {
        if let Some(entry) = self.entries.iter_mut().find(|e| e.identity == identity) {
            entry.samples.push(descriptor);
            return false;
        }
        self.entries.push(GalleryEntry {
            identity: identity.to_string(),
            samples: vec![descriptor],
        });
        true
    }

    /// Remove an identity and all its samples. Idempotent: returns false if
    /// the identity was not present.
    pub fn remove(&mut self, identity: &str) -> bool {
        let before = self.entries.len();
        self.entries.retain(|e| e.identity != identity);
        self.entries.len() != before
    }

    /// Move an identity's sample list to a new key, keeping its position in
    /// iteration order. Fails if `old` is absent or `new` is already taken.
    pub fn rename(&mut self, old: &str, new: &str) -> Result<(), GalleryError> {
        if old == new {
            return if self.contains(old) {
                Ok(())
            } else {
                Err(GalleryError::UnknownIdentity(old.to_string()))
            };
        }
        if self.contains(new) {
            return Err(GalleryError::DuplicateIdentity(new.to_string()));
        }
        let entry = self
            .entries
            .iter_mut()
            .find(|e| e.identity == old)
            .ok_or_else(|| GalleryError::UnknownIdentity(old.to_string()))?;
        entry.identity = new.to_string();
        Ok(())
    }

    pub fn contains(&self, identity: &str) -> bool {
        self.entries.iter().any(|e| e.identity == identity)
    }

    /// Descriptor samples for one identity, if enrolled.
    pub fn samples(&self, identity: &str) -> Option<&[Descriptor]> {
        self.entries
            .iter()
            .find(|e| e.identity == identity)
            .map(|e| e.samples.as_slice())
    }

    /// All identity names in insertion order.
    pub fn identities(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.identity.as_str())
    }

    /// Entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &GalleryEntry> {
        self.entries.iter()
    }

    /// Number of enrolled identities.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Keep only samples for which `keep` returns true. Returns the number of
    /// samples removed. Identities left empty are not removed here — see
    /// [`prune_empty`](Self::prune_empty).
    pub fn retain_samples<F>(&mut self, mut keep: F) -> usize
    where
        F: FnMut(&str, &Descriptor) -> bool,
    {
        let mut removed = 0;
        for entry in &mut self.entries {
            let before = entry.samples.len();
            entry.samples.retain(|d| keep(&entry.identity, d));
            removed += before - entry.samples.len();
        }
        removed
    }

    /// Drop identities with no samples left, returning their names.
    pub fn prune_empty(&mut self) -> Vec<String> {
        let mut dropped = Vec::new();
        self.entries.retain(|e| {
            if e.samples.is_empty() {
                dropped.push(e.identity.clone());
                false
            } else {
                true
            }
        });
        dropped
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn descriptor(values: &[f32]) -> Descriptor {
        Descriptor {
            values: values.to_vec(),
        }
    }

    #[test]
    fn test_enroll_creates_then_appends() {
        let mut gallery = Gallery::new();
        assert!(gallery.enroll("alice", descriptor(&[1.0])));
        assert!(!gallery.enroll("alice", descriptor(&[2.0])));
        assert_eq!(gallery.samples("alice").unwrap().len(), 2);
    }

    #[test]
    fn test_enroll_isolation_between_identities() {
        let mut gallery = Gallery::new();
        gallery.enroll("alice", descriptor(&[1.0]));
        gallery.enroll("bob", descriptor(&[2.0]));
        gallery.enroll("bob", descriptor(&[3.0]));

        assert_eq!(gallery.samples("alice").unwrap().len(), 1);
        assert_eq!(gallery.samples("bob").unwrap().len(), 2);
    }

    #[test]
    fn test_remove_is_idempotent() {
        let mut gallery = Gallery::new();
        gallery.enroll("alice", descriptor(&[1.0]));
        assert!(gallery.remove("alice"));
        assert!(!gallery.remove("alice"));
        assert!(!gallery.contains("alice"));
    }

    #[test]
    fn test_identities_keep_insertion_order() {
        let mut gallery = Gallery::new();
        gallery.enroll("charlie", descriptor(&[1.0]));
        gallery.enroll("alice", descriptor(&[1.0]));
        gallery.enroll("bob", descriptor(&[1.0]));
        // Re-enrolling must not reorder.
        gallery.enroll("charlie", descriptor(&[2.0]));

        let names: Vec<&str> = gallery.identities().collect();
        assert_eq!(names, vec!["charlie", "alice", "bob"]);
    }

    #[test]
    fn test_rename_moves_samples_and_keeps_position() {
        let mut gallery = Gallery::new();
        gallery.enroll("alice", descriptor(&[1.0]));
        gallery.enroll("bob", descriptor(&[2.0]));

        gallery.rename("alice", "alicia").unwrap();
        let names: Vec<&str> = gallery.identities().collect();
        assert_eq!(names, vec!["alicia", "bob"]);
        assert_eq!(gallery.samples("alicia").unwrap().len(), 1);
        assert!(gallery.samples("alice").is_none());
    }

    #[test]
    fn test_rename_unknown_identity_fails() {
        let mut gallery = Gallery::new();
        let err = gallery.rename("ghost", "someone").unwrap_err();
        assert_eq!(err, GalleryError::UnknownIdentity("ghost".to_string()));
    }

    #[test]
    fn test_rename_onto_existing_identity_fails() {
        let mut gallery = Gallery::new();
        gallery.enroll("alice", descriptor(&[1.0]));
        gallery.enroll("bob", descriptor(&[2.0]));
        let err = gallery.rename("alice", "bob").unwrap_err();
        assert_eq!(err, GalleryError::DuplicateIdentity("bob".to_string()));
    }

    #[test]
    fn test_retain_samples_and_prune_empty() {
        let mut gallery = Gallery::new();
        gallery.enroll("alice", descriptor(&[1.0, 0.0]));
        gallery.enroll("alice", descriptor(&[1.0]));
        gallery.enroll("bob", descriptor(&[1.0]));

        let removed = gallery.retain_samples(|_, d| d.len() == 2);
        assert_eq!(removed, 2);

        let dropped = gallery.prune_empty();
        assert_eq!(dropped, vec!["bob".to_string()]);
        assert_eq!(gallery.samples("alice").unwrap().len(), 1);
    }
}
