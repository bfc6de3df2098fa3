//! Gallery matching — top-k mean cosine similarity with a fixed threshold.

use crate::gallery::Gallery;
use crate::types::{Descriptor, MatchResult};

// --- Named constants ---
/// Minimum top-k mean similarity for a positive identification.
pub const DEFAULT_MATCH_THRESHOLD: f32 = 0.65;
/// Number of best per-identity similarities averaged per candidate.
const TOP_K: usize = 3;

/// Strategy for identifying a query descriptor against the gallery.
pub trait Matcher {
    fn identify(&self, query: &Descriptor, gallery: &Gallery, threshold: f32) -> MatchResult;
}

/// Top-k mean cosine matcher.
///
/// For each identity, the query is compared against every stored sample and
/// the mean of the top [`TOP_K`] similarities is that identity's score —
/// smoothing outlier samples while still rewarding consistent matches.
/// Candidates are visited in gallery insertion order, so an exact score tie
/// resolves to the earliest-enrolled identity.
pub struct TopKMeanMatcher;

impl Matcher for TopKMeanMatcher {
    fn identify(&self, query: &Descriptor, gallery: &Gallery, threshold: f32) -> MatchResult {
        let mut best_score = 0.0f32;
        let mut best_identity: Option<&str> = None;

        for entry in gallery.iter() {
            let mut similarities: Vec<f32> = Vec::with_capacity(entry.samples.len());
            for stored in &entry.samples {
                // A stored sample from another extractor version must not
                // fail the whole call — skip it and keep comparing.
                if stored.len() != query.len() {
                    tracing::warn!(
                        identity = %entry.identity,
                        stored_len = stored.len(),
                        query_len = query.len(),
                        "skipping stored descriptor with mismatched length"
                    );
                    continue;
                }
                similarities.push(query.similarity(stored));
            }
            if similarities.is_empty() {
                continue;
            }

            similarities.sort_by(|a, b| b.total_cmp(a));
            let k = similarities.len().min(TOP_K);
            let score = similarities[..k].iter().sum::<f32>() / k as f32;

            if score > best_score {
                best_score = score;
                best_identity = Some(&entry.identity);
            }
        }

        match best_identity {
            Some(identity) if best_score > threshold => MatchResult {
                matched: true,
                identity: Some(identity.to_string()),
                confidence: best_score,
            },
            _ => MatchResult::no_match(best_score),
        }
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
    fn test_enrolled_sample_identifies_itself() {
        let mut gallery = Gallery::new();
        gallery.enroll("alice", descriptor(&[1.0, 0.0, 0.0]));
        gallery.enroll("bob", descriptor(&[0.0, 1.0, 0.0]));

        let result =
            TopKMeanMatcher.identify(&descriptor(&[1.0, 0.0, 0.0]), &gallery, DEFAULT_MATCH_THRESHOLD);
        assert!(result.matched);
        assert_eq!(result.identity.as_deref(), Some("alice"));
        assert!((result.confidence - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_below_threshold_is_no_match() {
        let mut gallery = Gallery::new();
        gallery.enroll("alice", descriptor(&[1.0, 0.0]));

        // Orthogonal query: similarity 0.0.
        let result = TopKMeanMatcher.identify(&descriptor(&[0.0, 1.0]), &gallery, DEFAULT_MATCH_THRESHOLD);
        assert!(!result.matched);
        assert!(result.identity.is_none());
        assert!(result.confidence < DEFAULT_MATCH_THRESHOLD);
    }

    #[test]
    fn test_empty_gallery_is_no_match() {
        let result =
            TopKMeanMatcher.identify(&descriptor(&[1.0]), &Gallery::new(), DEFAULT_MATCH_THRESHOLD);
        assert!(!result.matched);
        assert_eq!(result.confidence, 0.0);
    }

    #[test]
    fn test_top_k_mean_ignores_outlier_samples() {
        let mut gallery = Gallery::new();
        // Three good samples plus one orthogonal outlier: the outlier must not
        // drag the score down because only the top 3 are averaged.
        gallery.enroll("alice", descriptor(&[1.0, 0.0]));
        gallery.enroll("alice", descriptor(&[1.0, 0.0]));
        gallery.enroll("alice", descriptor(&[1.0, 0.0]));
        gallery.enroll("alice", descriptor(&[0.0, 1.0]));

        let result = TopKMeanMatcher.identify(&descriptor(&[1.0, 0.0]), &gallery, DEFAULT_MATCH_THRESHOLD);
        assert!(result.matched);
        assert!((result.confidence - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_fewer_than_k_samples_average_what_exists() {
        let mut gallery = Gallery::new();
        gallery.enroll("alice", descriptor(&[1.0, 0.0]));
        gallery.enroll("alice", descriptor(&[0.0, 1.0]));

        // Mean of [1.0, 0.0] over two samples.
        let result = TopKMeanMatcher.identify(&descriptor(&[1.0, 0.0]), &gallery, 0.4);
        assert!(result.matched);
        assert!((result.confidence - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_dimension_mismatch_skips_sample_not_call() {
        let mut gallery = Gallery::new();
        gallery.enroll("alice", descriptor(&[1.0, 0.0, 0.0, 0.0]));
        gallery.enroll("alice", descriptor(&[1.0, 0.0]));

        // Only the length-2 sample is comparable; the call still succeeds.
        let result = TopKMeanMatcher.identify(&descriptor(&[1.0, 0.0]), &gallery, DEFAULT_MATCH_THRESHOLD);
        assert!(result.matched);
        assert_eq!(result.identity.as_deref(), Some("alice"));
    }

    #[test]
    fn test_identity_with_no_comparable_samples_is_skipped() {
        let mut gallery = Gallery::new();
        gallery.enroll("alice", descriptor(&[1.0, 0.0, 0.0]));
        gallery.enroll("bob", descriptor(&[1.0, 0.0]));

        let result = TopKMeanMatcher.identify(&descriptor(&[1.0, 0.0]), &gallery, DEFAULT_MATCH_THRESHOLD);
        assert!(result.matched);
        assert_eq!(result.identity.as_deref(), Some("bob"));
    }

    #[test]
    fn test_exact_tie_resolves_to_first_enrolled() {
        let mut gallery = Gallery::new();
        gallery.enroll("first", descriptor(&[1.0, 0.0]));
        gallery.enroll("second", descriptor(&[1.0, 0.0]));

        let result = TopKMeanMatcher.identify(&descriptor(&[1.0, 0.0]), &gallery, DEFAULT_MATCH_THRESHOLD);
        assert!(result.matched);
        assert_eq!(result.identity.as_deref(), Some("first"));
    }

    #[test]
    fn test_score_exactly_at_threshold_is_no_match() {
        let mut gallery = Gallery::new();
        gallery.enroll("alice", descriptor(&[1.0, 0.0]));

        let result = TopKMeanMatcher.identify(&descriptor(&[1.0, 0.0]), &gallery, 1.0);
        assert!(!result.matched, "threshold must be exceeded, not met");
    }
}
