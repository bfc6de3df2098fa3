//! Enrollment, identification, and ledger orchestration.
//!
//! The engine owns the database, the store, and the asset archive, and runs
//! every operation synchronously: each mutation rewrites the durable unit
//! before returning. Mutations take `&mut self`, so a single instance is
//! already externally serialized; hosts sharing one across threads put it
//! behind their own mutex.

use crate::assets::AssetArchive;
use crate::config::Config;
use crate::database::{Database, DatabaseError};
use crate::personnel::{LedgerAction, LedgerEntry, PersonnelRecord, Profile};
use crate::store::{Store, StoreError};
use facepass_core::features::{self, WORKING_SIZE};
use facepass_core::{Descriptor, FaceRegion, MatchResult, Matcher, TopKMeanMatcher};
use image::DynamicImage;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("feature extraction failed: degenerate face region")]
    ExtractionFailed,
    #[error("unknown identity: {0}")]
    UnknownIdentity(String),
    #[error("identity already exists: {0}")]
    DuplicateIdentity(String),
    #[error("failed to read enrollment image {}: {source}", path.display())]
    Image {
        path: PathBuf,
        source: image::ImageError,
    },
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl From<DatabaseError> for EngineError {
    fn from(err: DatabaseError) -> Self {
        match err {
            DatabaseError::UnknownIdentity(name) => EngineError::UnknownIdentity(name),
            DatabaseError::DuplicateIdentity(name) => EngineError::DuplicateIdentity(name),
        }
    }
}

/// Request to enroll one face sample for an identity.
pub struct EnrollmentRequest {
    pub identity: String,
    pub profile: Profile,
    /// Cropped grayscale face region from the external detector.
    pub region: FaceRegion,
    /// Full capture frame to archive alongside the face crop.
    pub archival_frame: Option<DynamicImage>,
}

/// Synchronous feature-extraction, matching, and personnel-ledger engine.
pub struct Engine {
    db: Database,
    store: Store,
    assets: AssetArchive,
    matcher: TopKMeanMatcher,
    threshold: f32,
}

impl Engine {
    /// Open the engine: load the durable unit, repairing dimension drift.
    pub fn open(config: &Config) -> Result<Self, StoreError> {
        let store = Store::new(&config.db_path);
        let db = store.load()?;
        tracing::info!(
            db_path = %config.db_path.display(),
            identities = db.identities().count(),
            ledger_entries = db.ledger.len(),
            "engine opened"
        );
        Ok(Self {
            db,
            store,
            assets: AssetArchive::new(&config.faces_dir),
            matcher: TopKMeanMatcher,
            threshold: config.match_threshold,
        })
    }

    /// Enroll one face sample, creating the identity and its personnel record
    /// on first enrollment, archiving photo assets, and persisting.
    pub fn enroll(&mut self, request: EnrollmentRequest) -> Result<(), EngineError> {
        if request.region.is_degenerate() {
            return Err(EngineError::ExtractionFailed);
        }
        let region = request.region.resize(WORKING_SIZE, WORKING_SIZE);
        let descriptor = features::extract(&region);
        if descriptor.is_empty() {
            return Err(EngineError::ExtractionFailed);
        }

        self.db.enroll(&request.identity, request.profile, descriptor);

        let face_path = self.assets.archive_face(&request.identity, &region);
        let original_path = request
            .archival_frame
            .as_ref()
            .and_then(|frame| self.assets.archive_original(&request.identity, frame));
        if let Some(record) = self.db.record_mut(&request.identity) {
            if face_path.is_some() {
                record.face_photo_path = face_path;
            }
            if original_path.is_some() {
                record.original_photo_path = original_path;
            }
        }

        self.store.save(&self.db)?;
        tracing::info!(
            identity = %request.identity,
            samples = self.db.gallery.samples(&request.identity).map_or(0, |s| s.len()),
            "enrolled face sample"
        );
        Ok(())
    }

    /// Enroll several samples for one identity in a single commit. Degenerate
    /// regions are skipped; at least one sample must survive. Returns the
    /// number of samples enrolled.
    pub fn enroll_samples(
        &mut self,
        identity: &str,
        profile: Profile,
        regions: &[FaceRegion],
    ) -> Result<usize, EngineError> {
        let mut descriptors = Vec::with_capacity(regions.len());
        for region in regions {
            let descriptor = extract_resized(region);
            if descriptor.is_empty() {
                tracing::warn!(identity, "skipping degenerate sample during enrollment");
                continue;
            }
            descriptors.push(descriptor);
        }
        if descriptors.is_empty() {
            return Err(EngineError::ExtractionFailed);
        }

        let enrolled = descriptors.len();
        for descriptor in descriptors {
            self.db.enroll(identity, profile.clone(), descriptor);
        }
        self.store.save(&self.db)?;
        tracing::info!(identity, enrolled, "enrolled sample batch");
        Ok(enrolled)
    }

    /// Enroll from an image file holding an already-cropped face: load,
    /// convert to grayscale, resize, enroll, and archive the source file
    /// verbatim as the original-photo asset.
    pub fn enroll_from_image(
        &mut self,
        path: &Path,
        identity: &str,
        profile: Profile,
    ) -> Result<(), EngineError> {
        let gray = image::open(path)
            .map_err(|source| EngineError::Image {
                path: path.to_path_buf(),
                source,
            })?
            .to_luma8();
        let (width, height) = gray.dimensions();
        let region = FaceRegion {
            data: gray.into_raw(),
            width,
            height,
        };

        self.enroll(EnrollmentRequest {
            identity: identity.to_string(),
            profile,
            region,
            archival_frame: None,
        })?;

        if let Some(original) = self.assets.archive_original_file(identity, path) {
            if let Some(record) = self.db.record_mut(identity) {
                record.original_photo_path = Some(original);
            }
            self.store.save(&self.db)?;
        }
        Ok(())
    }

    /// Identify a face region against the enrolled gallery.
    pub fn identify(&self, region: &FaceRegion) -> Result<MatchResult, EngineError> {
        let descriptor = extract_resized(region);
        if descriptor.is_empty() {
            return Err(EngineError::ExtractionFailed);
        }
        Ok(self
            .matcher
            .identify(&descriptor, &self.db.gallery, self.threshold))
    }

    /// Record an entry/exit event for an enrolled identity and persist.
    pub fn record_event(
        &mut self,
        identity: &str,
        action: LedgerAction,
    ) -> Result<LedgerEntry, EngineError> {
        let entry = self.db.record_event(identity, action)?;
        self.store.save(&self.db)?;
        tracing::info!(identity, action = ?action, "recorded ledger event");
        Ok(entry)
    }

    /// Replace an identity's profile and persist.
    pub fn update_profile(&mut self, identity: &str, profile: Profile) -> Result<(), EngineError> {
        self.db.update_profile(identity, profile)?;
        self.store.save(&self.db)?;
        Ok(())
    }

    /// Rename an identity and replace its profile, atomically, then persist.
    pub fn update_identity(
        &mut self,
        old: &str,
        new: &str,
        profile: Profile,
    ) -> Result<(), EngineError> {
        self.db.update_identity(old, new, profile)?;
        self.store.save(&self.db)?;
        tracing::info!(old, new, "updated identity");
        Ok(())
    }

    /// Delete an identity, its samples, and its record. Idempotent; persists
    /// only when something was actually removed.
    pub fn delete_identity(&mut self, identity: &str) -> Result<bool, EngineError> {
        let removed = self.db.delete_identity(identity);
        if removed {
            self.store.save(&self.db)?;
            tracing::info!(identity, "deleted identity");
        }
        Ok(removed)
    }

    /// Personnel record snapshot for one identity.
    pub fn record(&self, identity: &str) -> Option<&PersonnelRecord> {
        self.db.record(identity)
    }

    /// Enrolled identity names in enrollment order.
    pub fn identities(&self) -> Vec<&str> {
        self.db.identities().collect()
    }

    /// Ledger entries oldest-first, optionally filtered to one identity.
    /// Presentation layers reverse for most-recent-first display.
    pub fn history(&self, identity: Option<&str>) -> Vec<&LedgerEntry> {
        self.db.history(identity)
    }

    /// Read-only view of the underlying database.
    pub fn database(&self) -> &Database {
        &self.db
    }
}

/// Resize to the working size and extract, mapping degenerate regions to the
/// empty descriptor before the resize can mask them as all-black images.
fn extract_resized(region: &FaceRegion) -> Descriptor {
    if region.is_degenerate() {
        return Descriptor::empty();
    }
    features::extract(&region.resize(WORKING_SIZE, WORKING_SIZE))
}
