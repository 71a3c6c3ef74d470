use serde::{Deserialize, Serialize};

/// A short text whose best-matching corpus records are sought.
///
/// Identifiers must be unique across one query set; the pipeline validates
/// this before doing any work.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Query {
    /// Caller-supplied identifier.
    pub id: String,
    /// Text as supplied.
    pub raw_text: String,
    /// Text after normalization; never empty.
    pub normalized_text: String,
}

/// A corpus record indexed for retrieval.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateRecord {
    /// Caller-supplied identifier, unique within the corpus.
    pub document_id: String,
    /// Text as supplied.
    pub raw_text: String,
    /// Text after normalization; never empty.
    pub normalized_text: String,
    /// Optional provenance label, e.g. the file a page of text came from.
    pub source_label: Option<String>,
}

impl CandidateRecord {
    /// Creates a record without a source label.
    #[must_use]
    pub fn new(
        document_id: impl Into<String>,
        raw_text: impl Into<String>,
        normalized_text: impl Into<String>,
    ) -> Self {
        Self {
            document_id: document_id.into(),
            raw_text: raw_text.into(),
            normalized_text: normalized_text.into(),
            source_label: None,
        }
    }
}
