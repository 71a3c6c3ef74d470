//! # Retrieval Adapter
//!
//! Lexical retrieval is an external collaborator: the pipeline only needs to
//! build an index from the normalized corpus once per run and then ask it for
//! ranked candidates. Engines implement [`RetrievalEngine`]; tests substitute
//! their own.

pub mod lgd;
pub mod tantivy_engine;

use std::collections::HashSet;

use crate::error::{NrrError, Result};
use crate::types::{CandidateRecord, RetrievalHit};

pub use lgd::LgdEngine;
pub use tantivy_engine::TantivyEngine;

/// Default number of candidates an engine evaluates before truncation.
pub const DEFAULT_CANDIDATE_POOL: usize = 100;

/// Builds lexical indexes.
///
/// Building may mutate the filesystem and is not safe to run concurrently
/// with itself or with queries against the same location.
pub trait RetrievalEngine: Send + Sync {
    /// Discards any previous index and builds a fresh one keyed by
    /// `document_id` over `normalized_text`.
    ///
    /// # Errors
    ///
    /// Returns `NrrError::IndexBuild` if the corpus is empty, contains a
    /// duplicate `document_id`, or the engine fails.
    fn build_index(&self, corpus: &[CandidateRecord]) -> Result<Box<dyn LexicalIndex>>;
}

/// A built index, read-only for the rest of the run.
pub trait LexicalIndex: Send + Sync {
    /// Up to `max_results` hits in descending score order, ranks 0-based.
    ///
    /// Ties are broken in an engine-defined order that is stable within a run.
    ///
    /// # Errors
    ///
    /// Returns `NrrError::Retrieval` if the engine fails.
    fn query(&self, text: &str, max_results: usize) -> Result<Vec<RetrievalHit>>;

    /// Number of indexed documents.
    fn num_docs(&self) -> usize;
}

/// Rejects corpora no engine can index.
pub(crate) fn check_corpus(corpus: &[CandidateRecord]) -> Result<()> {
    if corpus.is_empty() {
        return Err(NrrError::IndexBuild("corpus is empty".into()));
    }
    let mut seen = HashSet::with_capacity(corpus.len());
    for record in corpus {
        if !seen.insert(record.document_id.as_str()) {
            return Err(NrrError::IndexBuild(format!(
                "duplicate document id {:?}",
                record.document_id
            )));
        }
    }
    Ok(())
}
