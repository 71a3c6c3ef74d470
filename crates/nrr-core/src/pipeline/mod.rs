//! # Search Pipeline
//!
//! Drives a run end to end: validate and normalize the input tables, rebuild
//! the lexical index, then for each query in turn retrieve candidates, score
//! them concurrently, classify them and assemble the ranked result rows.

pub mod config;
mod prepare;
mod scoring;

use std::collections::{HashMap, HashSet};

use rayon::{ThreadPool, ThreadPoolBuilder};
use tracing::{debug, info, warn};

use crate::classifier::MatchClassifier;
use crate::error::{NrrError, Result};
use crate::features::build_features;
use crate::normalize::TextNormalizer;
use crate::retrieval::{LexicalIndex, RetrievalEngine};
use crate::types::{CandidateRecord, Frame, Query, ResultSet, ScoredCandidate};

pub use config::{DEFAULT_MAX_RESULTS, PipelineConfig};

/// Search-and-classify pipeline.
///
/// Owns its engine, classifier and scoring pool. The index is rebuilt on
/// every call to [`search`](Self::search), so a pipeline must not be used
/// from two threads at once when its engine writes to a shared location.
pub struct SearchPipeline {
    engine: Box<dyn RetrievalEngine>,
    classifier: MatchClassifier,
    normalizer: TextNormalizer,
    config: PipelineConfig,
    pool: ThreadPool,
}

impl SearchPipeline {
    /// Creates a pipeline from its collaborators.
    ///
    /// # Errors
    ///
    /// Returns `NrrError::InvalidConfig` for out-of-range settings or if the
    /// scoring pool cannot be started.
    pub fn new(
        engine: Box<dyn RetrievalEngine>,
        classifier: MatchClassifier,
        config: PipelineConfig,
    ) -> Result<Self> {
        config.validate()?;
        let pool = ThreadPoolBuilder::new()
            .num_threads(config.worker_threads.unwrap_or(0))
            .thread_name(|i| format!("nrr-score-{i}"))
            .build()
            .map_err(|e| NrrError::InvalidConfig(format!("failed to start scoring pool: {e}")))?;

        Ok(Self {
            engine,
            classifier,
            normalizer: TextNormalizer::new()?,
            config,
            pool,
        })
    }

    #[must_use]
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    #[must_use]
    pub fn classifier(&self) -> &MatchClassifier {
        &self.classifier
    }

    /// Runs the pipeline over a query table and a corpus table.
    ///
    /// # Errors
    ///
    /// Validation errors are reported before anything is indexed. Index
    /// build, retrieval and inference failures abort the run. Per-candidate
    /// scoring failures and unresolved hits only degrade that row.
    ///
    /// # Examples
    /// ```no_run
    /// use nrr_core::{Frame, LgdEngine, MatchClassifier, ModelConfig, PipelineConfig, SearchPipeline};
    ///
    /// let classifier = MatchClassifier::load(&ModelConfig::default())?;
    /// let pipeline = SearchPipeline::new(Box::new(LgdEngine::new()), classifier, PipelineConfig::default())?;
    ///
    /// let queries = Frame::from_str_rows(["qid", "query"], &[["q1", "apple pie"]]);
    /// let corpus = Frame::from_str_rows(
    ///     ["docno", "text"],
    ///     &[["1", "apple pie recipe"], ["2", "banana bread recipe"]],
    /// );
    /// let results = pipeline.search(&queries, &corpus)?;
    /// assert_eq!(results.get("q1").unwrap()[0].document_id, "1");
    /// # Ok::<(), nrr_core::NrrError>(())
    /// ```
    pub fn search(&self, queries: &Frame, corpus: &Frame) -> Result<ResultSet> {
        let (queries, corpus) =
            prepare::prepare_inputs(queries, corpus, &self.config, &self.normalizer)?;
        self.run(&queries, &corpus)
    }

    /// Runs the pipeline over already-normalized records.
    ///
    /// # Errors
    ///
    /// Returns `NrrError::DuplicateIdentifier` for a repeated query id,
    /// `NrrError::EmptyTable` for an empty input, and the same run errors as
    /// [`search`](Self::search).
    pub fn search_records(&self, queries: &[Query], corpus: &[CandidateRecord]) -> Result<ResultSet> {
        let mut seen = HashSet::with_capacity(queries.len());
        for query in queries {
            if !seen.insert(query.id.as_str()) {
                return Err(NrrError::DuplicateIdentifier {
                    table: "query",
                    id: query.id.clone(),
                });
            }
        }
        prepare::ensure_non_empty(queries, corpus)?;
        self.run(queries, corpus)
    }

    fn run(&self, queries: &[Query], corpus: &[CandidateRecord]) -> Result<ResultSet> {
        let index = self.engine.build_index(corpus)?;
        let lookup: HashMap<&str, &CandidateRecord> = corpus
            .iter()
            .map(|record| (record.document_id.as_str(), record))
            .collect();

        let mut results = ResultSet::new();
        for query in queries {
            let candidates = self.rank_query(index.as_ref(), &lookup, query)?;
            results.insert(query.id.clone(), candidates);
        }

        info!(queries = results.len(), "search complete");
        Ok(results)
    }

    fn rank_query(
        &self,
        index: &dyn LexicalIndex,
        lookup: &HashMap<&str, &CandidateRecord>,
        query: &Query,
    ) -> Result<Vec<ScoredCandidate>> {
        let hits = index.query(&query.normalized_text, self.config.max_results)?;
        info!(query_id = %query.id, hits = hits.len(), "retrieved candidates");

        let resolved: Vec<Option<&CandidateRecord>> = hits
            .iter()
            .map(|hit| {
                let record = lookup.get(hit.document_id.as_str()).copied();
                if record.is_none() {
                    warn!(query_id = %query.id, document_id = %hit.document_id, "retrieved document not in corpus");
                }
                record
            })
            .collect();

        let scores = scoring::score_hits(
            &self.pool,
            &query.normalized_text,
            &hits,
            &resolved,
            self.config.max_scoring_chars,
        );

        let calibration = self.classifier.calibration();
        let mut candidates: Vec<ScoredCandidate> = hits
            .iter()
            .zip(&resolved)
            .zip(&scores)
            .map(|((hit, record), scores)| {
                let mut candidate = ScoredCandidate::from_hit(hit, &query.normalized_text);
                if let Some(record) = record {
                    candidate.text = record.normalized_text.clone();
                    candidate.source_label = record.source_label.clone();
                }
                if let Some(scores) = scores {
                    candidate.fuzzy_score = Some(scores.fuzzy);
                    candidate.alignment_score = Some(scores.alignment);
                    candidate.lcs_length = Some(scores.lcs);
                    candidate.set_features(build_features(hit, scores, calibration));
                }
                candidate
            })
            .collect();

        let features: Vec<_> = candidates.iter().filter_map(ScoredCandidate::features).collect();
        let labels = self.classifier.predict(&features)?;
        for (candidate, label) in candidates
            .iter_mut()
            .filter(|c| c.features().is_some())
            .zip(labels)
        {
            candidate.predicted_label = Some(label);
        }

        candidates.sort_by(|a, b| {
            b.retrieval_score
                .total_cmp(&a.retrieval_score)
                .then(a.rank.cmp(&b.rank))
        });

        debug!(
            query_id = %query.id,
            matches = candidates.iter().filter(|c| c.is_match()).count(),
            "query classified"
        );
        Ok(candidates)
    }
}
