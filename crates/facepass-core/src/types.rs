use serde::{Deserialize, Serialize};

/// Fixed-length face descriptor (832-dimensional when produced by the
/// extractor), L2-normalized. An empty value marks a failed extraction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Descriptor {
    pub values: Vec<f32>,
}

impl Descriptor {
    /// The empty descriptor — the extractor's "extraction failed" result.
    pub fn empty() -> Self {
        Self { values: Vec::new() }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Compute cosine similarity between two descriptors.
    ///
    /// Returns a value in [-1, 1]; higher = more similar. Descriptors built
    /// from count histograms are non-negative, so in practice this is [0, 1].
    pub fn similarity(&self, other: &Descriptor) -> f32 {
        let mut dot = 0.0f32;
        let mut norm_a = 0.0f32;
        let mut norm_b = 0.0f32;

        for (a, b) in self.values.iter().zip(other.values.iter()) {
            dot += a * b;
            norm_a += a * a;
            norm_b += b * b;
        }

        let denom = norm_a.sqrt() * norm_b.sqrt();
        if denom > 0.0 {
            dot / denom
        } else {
            0.0
        }
    }
}

/// Result of matching a query descriptor against the gallery.
#[derive(Debug, Clone)]
pub struct MatchResult {
    pub matched: bool,
    /// Name of the matched identity (if any).
    pub identity: Option<String>,
    /// Top-k mean cosine similarity of the best candidate, in [0, 1].
    pub confidence: f32,
}

impl MatchResult {
    pub fn no_match(confidence: f32) -> Self {
        Self {
            matched: false,
            identity: None,
            confidence,
        }
    }
}
