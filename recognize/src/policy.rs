//! Hybrid accept/reject decision over the best candidates of a gallery scan.

use crate::metric::distance_to_score;
use crate::types::MatchMethod;

/// Best-so-far candidate of a scan: index of the identity in the scanned
/// gallery plus the metric value (cosine score or euclidean distance,
/// depending on which best this is). Transient; lives for one call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Candidate {
    pub index: usize,
    pub value: f32,
}

/// Outcome of [`choose_match`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MatchDecision {
    /// Index of the accepted identity, or None on rejection.
    pub index: Option<usize>,
    pub method: MatchMethod,
    /// Reported confidence in [0, 1]; computed for diagnostic display even
    /// on rejection.
    pub score: f32,
}

/// Decides whether to accept a match given the best cosine and best
/// euclidean candidates of a full scan.
///
/// Cosine similarity is checked first: it is scale-invariant and the
/// primary signal. Euclidean distance is a corroborating signal consulted
/// only when cosine is inconclusive; its accepted score is mapped through
/// [`distance_to_score`]. Ties during the scan go to the first-encountered
/// candidate, an artifact of gallery enumeration order rather than a
/// semantic guarantee.
pub fn choose_match(
    best_cosine: Option<Candidate>,
    best_euclidean: Option<Candidate>,
    cosine_threshold: f32,
    euclidean_threshold: f32,
) -> MatchDecision {
    if let Some(c) = best_cosine {
        if c.value >= cosine_threshold {
            return MatchDecision {
                index: Some(c.index),
                method: MatchMethod::Cosine,
                score: c.value,
            };
        }
    }

    if let Some(e) = best_euclidean {
        if e.value <= euclidean_threshold {
            return MatchDecision {
                index: Some(e.index),
                method: MatchMethod::Euclidean,
                score: distance_to_score(e.value),
            };
        }
    }

    // Rejected: still report the best diagnostic score available.
    let score = match (best_cosine, best_euclidean) {
        (Some(c), _) => c.value,
        (None, Some(e)) => distance_to_score(e.value),
        (None, None) => 0.0,
    };

    MatchDecision {
        index: None,
        method: MatchMethod::None,
        score,
    }
}
