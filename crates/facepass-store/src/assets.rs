//! Photo-asset archiving — face crops and original frames on disk.
//!
//! Assets live in a per-identity directory under the faces dir; the database
//! unit stores only their paths. Archiving is best-effort: a failed write is
//! logged and the enrollment proceeds without the asset path.

use chrono::Local;
use facepass_core::FaceRegion;
use image::{DynamicImage, GrayImage};
use std::fs;
use std::path::{Path, PathBuf};

/// Replace characters that would break a directory name. Spaces become
/// underscores too, matching the layout of archived galleries.
pub fn sanitize_identity(name: &str) -> String {
    name.chars()
        .map(|c| match c {
            ' ' | '/' | '\\' => '_',
            other => other,
        })
        .collect()
}

/// Writer for archived photo assets.
pub struct AssetArchive {
    faces_dir: PathBuf,
}

impl AssetArchive {
    pub fn new(faces_dir: impl Into<PathBuf>) -> Self {
        Self {
            faces_dir: faces_dir.into(),
        }
    }

    /// Archive a processed grayscale face crop as `face_<unix-ts>.jpg`.
    pub fn archive_face(&self, identity: &str, region: &FaceRegion) -> Option<PathBuf> {
        let dir = self.identity_dir(identity)?;
        let path = dir.join(format!("face_{}.jpg", Local::now().timestamp()));

        let image = match GrayImage::from_raw(region.width, region.height, region.data.clone()) {
            Some(image) => image,
            None => {
                tracing::warn!(identity, "face region buffer inconsistent, skipping asset");
                return None;
            }
        };

        match image.save(&path) {
            Ok(()) => Some(path),
            Err(error) => {
                tracing::warn!(identity, %error, "failed to archive face crop");
                None
            }
        }
    }

    /// Archive the original capture frame as `original_<unix-ts>.jpg`.
    pub fn archive_original(&self, identity: &str, frame: &DynamicImage) -> Option<PathBuf> {
        let dir = self.identity_dir(identity)?;
        let path = dir.join(format!("original_{}.jpg", Local::now().timestamp()));

        match frame.to_rgb8().save(&path) {
            Ok(()) => Some(path),
            Err(error) => {
                tracing::warn!(identity, %error, "failed to archive original frame");
                None
            }
        }
    }

    /// Archive an on-disk source image by copying it verbatim.
    pub fn archive_original_file(&self, identity: &str, source: &Path) -> Option<PathBuf> {
        let dir = self.identity_dir(identity)?;
        let path = dir.join(format!("original_{}.jpg", Local::now().timestamp()));

        match fs::copy(source, &path) {
            Ok(_) => Some(path),
            Err(error) => {
                tracing::warn!(identity, %error, "failed to archive source image");
                None
            }
        }
    }

    fn identity_dir(&self, identity: &str) -> Option<PathBuf> {
        let dir = self.faces_dir.join(sanitize_identity(identity));
        if let Err(error) = fs::create_dir_all(&dir) {
            tracing::warn!(identity, %error, "cannot create asset directory");
            return None;
        }
        Some(dir)
    }
}
