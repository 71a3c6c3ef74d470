//! In-memory lexical engine using the log-logistic DFR model (LGD).
//!
//! Weighting follows Terrier's `LGD`. For a query term `t` with query
//! frequency `qtf`, term frequency `tf` in a document of length `dl`:
//!
//! ```text
//! f     = document_frequency(t) / num_docs
//! tfn   = tf * log2(1 + c * avg_dl / dl)
//! score = (qtf / max_qtf) * log2((f + tfn) / f)
//! ```
//!
//! summed over the distinct query terms. Tokens are the whitespace-separated
//! words of the normalized text, with no stemming or stopword removal.

use std::collections::HashMap;

use tracing::info;

use super::{DEFAULT_CANDIDATE_POOL, LexicalIndex, RetrievalEngine, check_corpus};
use crate::error::Result;
use crate::types::{CandidateRecord, RetrievalHit};

/// Default term-frequency normalization parameter.
pub const DEFAULT_C: f64 = 1.0;

/// Builds [`LgdIndex`]es in memory; nothing touches the filesystem.
#[derive(Debug, Clone, Copy)]
pub struct LgdEngine {
    c: f64,
    candidate_pool: usize,
}

impl LgdEngine {
    #[must_use]
    pub fn new() -> Self {
        Self {
            c: DEFAULT_C,
            candidate_pool: DEFAULT_CANDIDATE_POOL,
        }
    }

    /// Sets the length normalization parameter `c`.
    #[must_use]
    pub fn with_c(mut self, c: f64) -> Self {
        self.c = c;
        self
    }

    /// Sets how many candidates are ranked before truncation.
    #[must_use]
    pub fn with_candidate_pool(mut self, candidate_pool: usize) -> Self {
        self.candidate_pool = candidate_pool.max(1);
        self
    }
}

impl Default for LgdEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl RetrievalEngine for LgdEngine {
    fn build_index(&self, corpus: &[CandidateRecord]) -> Result<Box<dyn LexicalIndex>> {
        check_corpus(corpus)?;
        let index = LgdIndex::build(corpus, self.c, self.candidate_pool);
        info!(
            docs = index.doc_ids.len(),
            terms = index.postings.len(),
            "lgd index built"
        );
        Ok(Box::new(index))
    }
}


/// Inverted index over whitespace tokens.
#[derive(Debug)]
pub struct LgdIndex {
    doc_ids: Vec<String>,
    doc_lengths: Vec<u32>,
    avg_doc_length: f64,
    /// `(doc ordinal, tf)` per term, in ascending ordinal order.
    postings: HashMap<String, Vec<(u32, u32)>>,
    c: f64,
    candidate_pool: usize,
}

impl LgdIndex {
    fn build(corpus: &[CandidateRecord], c: f64, candidate_pool: usize) -> Self {
        let mut doc_ids = Vec::with_capacity(corpus.len());
        let mut doc_lengths = Vec::with_capacity(corpus.len());
        let mut postings: HashMap<String, Vec<(u32, u32)>> = HashMap::new();
        let mut total_length: u64 = 0;

        for (ordinal, record) in corpus.iter().enumerate() {
            let mut counts: HashMap<&str, u32> = HashMap::new();
            let mut length = 0u32;
            for token in record.normalized_text.split_whitespace() {
                *counts.entry(token).or_default() += 1;
                length += 1;
            }
            for (token, tf) in counts {
                postings
                    .entry(token.to_string())
                    .or_default()
                    .push((ordinal as u32, tf));
            }
            doc_ids.push(record.document_id.clone());
            doc_lengths.push(length);
            total_length += u64::from(length);
        }

        let avg_doc_length = if doc_ids.is_empty() {
            0.0
        } else {
            total_length as f64 / doc_ids.len() as f64
        };

        Self {
            doc_ids,
            doc_lengths,
            avg_doc_length,
            postings,
            c,
            candidate_pool,
        }
    }

    fn term_weight(
        &self,
        key_frequency: f64,
        tf: u32,
        doc_length: u32,
        document_frequency: usize,
    ) -> f64 {
        let f = document_frequency as f64 / self.doc_ids.len() as f64;
        let tfn = f64::from(tf) * (1.0 + self.c * self.avg_doc_length / f64::from(doc_length)).log2();
        key_frequency * ((f + tfn) / f).log2()
    }
}

impl LexicalIndex for LgdIndex {
    fn query(&self, text: &str, max_results: usize) -> Result<Vec<RetrievalHit>> {
        if max_results == 0 {
            return Ok(Vec::new());
        }

        let mut query_terms: Vec<(&str, u32)> = Vec::new();
        for token in text.split_whitespace() {
            match query_terms.iter_mut().find(|(t, _)| *t == token) {
                Some((_, qtf)) => *qtf += 1,
                None => query_terms.push((token, 1)),
            }
        }

        let max_qtf = query_terms.iter().map(|&(_, qtf)| qtf).max().unwrap_or(1);

        let mut scores: HashMap<u32, f64> = HashMap::new();
        for (term, qtf) in query_terms {
            let Some(postings) = self.postings.get(term) else {
                continue;
            };
            let key_frequency = f64::from(qtf) / f64::from(max_qtf);
            for &(ordinal, tf) in postings {
                let doc_length = self.doc_lengths[ordinal as usize];
                *scores.entry(ordinal).or_default() +=
                    self.term_weight(key_frequency, tf, doc_length, postings.len());
            }
        }

        let mut ranked: Vec<(u32, f64)> = scores.into_iter().collect();
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0)));
        ranked.truncate(self.candidate_pool.max(max_results));

        Ok(ranked
            .into_iter()
            .take(max_results)
            .enumerate()
            .map(|(rank, (ordinal, score))| RetrievalHit {
                document_id: self.doc_ids[ordinal as usize].clone(),
                score,
                rank,
            })
            .collect())
    }

    fn num_docs(&self) -> usize {
        self.doc_ids.len()
    }
}
