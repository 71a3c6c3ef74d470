use crate::error::{NrrError, Result};

/// Default number of hits kept per query.
pub const DEFAULT_MAX_RESULTS: usize = 10;

/// Configuration for a [`SearchPipeline`](super::SearchPipeline).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineConfig {
    /// Hits kept per query after retrieval
    pub max_results: usize,
    /// Scoring worker threads; `None` lets rayon decide
    pub worker_threads: Option<usize>,
    /// Pairs with a longer side (in chars) skip similarity scoring
    pub max_scoring_chars: Option<usize>,
    /// Identifier column of the query table
    pub query_id_column: String,
    /// Text column of the query table
    pub query_text_column: String,
    /// Identifier column of the corpus table
    pub corpus_id_column: String,
    /// Text column of the corpus table
    pub corpus_text_column: String,
    /// Optional provenance column copied into every result row
    pub source_column: Option<String>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            max_results: DEFAULT_MAX_RESULTS,
            worker_threads: None,
            max_scoring_chars: None,
            query_id_column: "qid".to_string(),
            query_text_column: "query".to_string(),
            corpus_id_column: "docno".to_string(),
            corpus_text_column: "text".to_string(),
            source_column: None,
        }
    }
}

impl PipelineConfig {
    /// Create a new pipeline configuration with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set how many hits are kept per query.
    pub fn with_max_results(mut self, max_results: usize) -> Self {
        self.max_results = max_results;
        self
    }

    /// Set the size of the scoring worker pool.
    pub fn with_worker_threads(mut self, threads: usize) -> Self {
        self.worker_threads = Some(threads);
        self
    }

    /// Bound the input length of the quadratic similarity scorers.
    pub fn with_max_scoring_chars(mut self, limit: usize) -> Self {
        self.max_scoring_chars = Some(limit);
        self
    }

    /// Set the query table's identifier and text columns.
    pub fn with_query_columns(mut self, id: impl Into<String>, text: impl Into<String>) -> Self {
        self.query_id_column = id.into();
        self.query_text_column = text.into();
        self
    }

    /// Set the corpus table's identifier and text columns.
    pub fn with_corpus_columns(mut self, id: impl Into<String>, text: impl Into<String>) -> Self {
        self.corpus_id_column = id.into();
        self.corpus_text_column = text.into();
        self
    }

    /// Copy this corpus column into each result as its source label.
    pub fn with_source_column(mut self, column: impl Into<String>) -> Self {
        self.source_column = Some(column.into());
        self
    }

    pub(crate) fn validate(&self) -> Result<()> {
        if self.max_results == 0 {
            return Err(NrrError::InvalidConfig("max_results must be at least 1".into()));
        }
        if self.worker_threads == Some(0) {
            return Err(NrrError::InvalidConfig("worker_threads must be at least 1".into()));
        }
        if self.max_scoring_chars == Some(0) {
            return Err(NrrError::InvalidConfig("max_scoring_chars must be at least 1".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_reference_columns() {
        let config = PipelineConfig::default();
        assert_eq!(config.max_results, 10);
        assert_eq!(config.query_id_column, "qid");
        assert_eq!(config.query_text_column, "query");
        assert_eq!(config.corpus_id_column, "docno");
        assert_eq!(config.corpus_text_column, "text");
        assert!(config.source_column.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn rejects_zero_values() {
        assert!(PipelineConfig::new().with_max_results(0).validate().is_err());
        assert!(PipelineConfig::new().with_worker_threads(0).validate().is_err());
        assert!(PipelineConfig::new().with_max_scoring_chars(0).validate().is_err());
    }
}
