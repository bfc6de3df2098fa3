//! facepass-core — classical face descriptor extraction and matching.
//!
//! Computes fixed-length texture/intensity/gradient descriptors from cropped
//! grayscale face regions (no learned models) and matches them against
//! per-identity galleries using top-k mean cosine similarity.

pub mod features;
pub mod gallery;
pub mod matcher;
pub mod region;
pub mod types;

pub use gallery::{Gallery, GalleryEntry, GalleryError};
pub use matcher::{Matcher, TopKMeanMatcher, DEFAULT_MATCH_THRESHOLD};
pub use region::FaceRegion;
pub use types::{Descriptor, MatchResult};
