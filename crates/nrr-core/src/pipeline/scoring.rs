//! Concurrent similarity scoring for one query's hits.

use rayon::ThreadPool;
use rayon::prelude::*;
use tracing::warn;

use crate::similarity::{SimilarityScores, score_pair};
use crate::types::{CandidateRecord, RetrievalHit};

/// Scores every resolved hit on `pool`.
///
/// Result `i` belongs to hit `i` whatever order the workers finish in.
/// Unresolved hits and pairs whose scoring fails yield `None`.
pub(crate) fn score_hits(
    pool: &ThreadPool,
    query: &str,
    hits: &[RetrievalHit],
    resolved: &[Option<&CandidateRecord>],
    max_chars: Option<usize>,
) -> Vec<Option<SimilarityScores>> {
    pool.install(|| {
        hits.par_iter()
            .zip(resolved.par_iter())
            .map(|(hit, record)| {
                let record = (*record)?;
                match score_pair(query, &record.normalized_text, max_chars) {
                    Ok(scores) => Some(scores),
                    Err(e) => {
                        warn!(document_id = %hit.document_id, error = %e, "similarity scoring failed");
                        None
                    }
                }
            })
            .collect()
    })
}
