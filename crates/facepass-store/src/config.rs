//! Library configuration, loaded from environment variables.

use facepass_core::DEFAULT_MATCH_THRESHOLD;
use std::path::PathBuf;

/// Paths and tunables for an [`crate::engine::Engine`] instance.
#[derive(Debug, Clone)]
pub struct Config {
    /// Path to the serialized database unit.
    pub db_path: PathBuf,
    /// Directory for archived photo assets.
    pub faces_dir: PathBuf,
    /// Minimum top-k mean similarity for a positive identification.
    pub match_threshold: f32,
}

impl Config {
    /// Load configuration from `FACEPASS_*` environment variables with
    /// defaults under the XDG data directory.
    pub fn from_env() -> Self {
        let data_dir = std::env::var("FACEPASS_DATA_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| default_data_dir());

        let db_path = std::env::var("FACEPASS_DB_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| data_dir.join("face_database.json"));

        let faces_dir = std::env::var("FACEPASS_FACES_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| data_dir.join("faces"));

        Self {
            db_path,
            faces_dir,
            match_threshold: env_f32("FACEPASS_MATCH_THRESHOLD", DEFAULT_MATCH_THRESHOLD),
        }
    }

    /// Configuration rooted at an explicit data directory, bypassing the
    /// environment. Hosts with their own settings plumbing use this.
    pub fn with_data_dir(data_dir: impl Into<PathBuf>) -> Self {
        let data_dir = data_dir.into();
        Self {
            db_path: data_dir.join("face_database.json"),
            faces_dir: data_dir.join("faces"),
            match_threshold: DEFAULT_MATCH_THRESHOLD,
        }
    }
}

fn default_data_dir() -> PathBuf {
    std::env::var("XDG_DATA_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
            PathBuf::from(home).join(".local/share")
        })
        .join("facepass")
}

fn env_f32(key: &str, default: f32) -> f32 {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
