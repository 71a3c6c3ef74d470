//! # Similarity Scorers
//!
//! Three independent closeness measures between an already-normalized query
//! and candidate text. Raw (unnormalized) strings are accepted, but scores
//! on them are not meaningful.

pub mod alignment;
pub mod fuzzy;
pub mod lcs;

use std::panic::{self, AssertUnwindSafe};

use serde::{Deserialize, Serialize};

use crate::error::ScoringError;

pub use alignment::{LocalAlignment, alignment_score, local_alignment};
pub use fuzzy::fuzzy_score;
pub use lcs::lcs_length;

/// The three similarity signals for one (query, candidate) pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimilarityScores {
    /// Token-set ratio in `[0, 100]`.
    pub fuzzy: u8,
    /// Local alignment score, `>= 0`.
    pub alignment: u32,
    /// Longest common subsequence length, in chars.
    pub lcs: u32,
}

/// Computes all three signals for one pair.
///
/// `max_chars` guards the quadratic scorers: when either input is longer the
/// pair is rejected instead of allocating an unbounded matrix. A panic inside
/// a scorer is caught and reported as [`ScoringError::Panicked`].
///
/// # Errors
///
/// Returns a [`ScoringError`] for this pair only; callers degrade the
/// candidate rather than abort.
pub fn score_pair(
    query: &str,
    text: &str,
    max_chars: Option<usize>,
) -> Result<SimilarityScores, ScoringError> {
    if let Some(limit) = max_chars {
        let len = query.chars().count().max(text.chars().count());
        if len > limit {
            return Err(ScoringError::InputTooLong { len, limit });
        }
    }

    panic::catch_unwind(AssertUnwindSafe(|| SimilarityScores {
        fuzzy: fuzzy_score(query, text),
        alignment: alignment_score(query, text),
        lcs: lcs_length(query, text),
    }))
    .map_err(|payload| ScoringError::Panicked(panic_message(payload.as_ref())))
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
