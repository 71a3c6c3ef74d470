use thiserror::Error;

/// Errors that can occur during NRR core operations.
#[derive(Debug, Error)]
pub enum NrrError {
    /// A required column is absent from an input table.
    #[error("{table} table is missing required column {column:?}")]
    MissingColumn {
        /// Which table was being validated ("query" or "corpus").
        table: &'static str,
        /// The column that could not be found.
        column: String,
    },

    /// An identifier cell is null or absent.
    #[error("{table} table has a null identifier in column {column:?} at row {row}")]
    NullIdentifier {
        /// Which table was being validated.
        table: &'static str,
        /// The identifier column.
        column: String,
        /// Zero-based row position.
        row: usize,
    },

    /// The same identifier appears more than once.
    #[error("{table} table has duplicate identifier {id:?}")]
    DuplicateIdentifier {
        /// Which table was being validated.
        table: &'static str,
        /// The repeated identifier.
        id: String,
    },

    /// Nothing left to process once missing texts were dropped.
    #[error("{table} table is empty after normalization")]
    EmptyTable {
        /// Which table was being validated.
        table: &'static str,
    },

    /// The retrieval engine could not construct an index.
    #[error("failed to build index: {0}")]
    IndexBuild(String),

    /// The retrieval engine failed while answering a query.
    #[error("retrieval error: {0}")]
    Retrieval(String),

    /// The classifier weights could not be fetched or loaded.
    #[error("failed to load model: {0}")]
    ModelLoad(String),

    /// The model inference failed.
    #[error("inference error: {0}")]
    Inference(String),

    /// A configuration value is out of range.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Input data could not be decoded into a table.
    #[error("invalid input data: {0}")]
    InvalidData(String),

    /// A regex pattern failed to compile (should not happen with static patterns).
    #[error("regex compilation error: {0}")]
    RegexError(#[from] regex::Error),

    /// Filesystem error outside of index building.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl NrrError {
    /// Returns `true` for input validation failures, which abort a run before
    /// any retrieval happens.
    #[must_use]
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::MissingColumn { .. }
                | Self::NullIdentifier { .. }
                | Self::DuplicateIdentifier { .. }
                | Self::EmptyTable { .. }
        )
    }
}

/// Result type alias for NRR operations.
pub type Result<T> = std::result::Result<T, NrrError>;

/// Failure of a single similarity computation.
///
/// Never aborts a run: the affected candidate keeps its retrieval data and
/// leaves the similarity fields unset.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScoringError {
    /// One of the strings exceeds the configured scoring length guard.
    #[error("input of {len} chars exceeds scoring limit of {limit}")]
    InputTooLong {
        /// Length of the longer input, in chars.
        len: usize,
        /// Configured limit.
        limit: usize,
    },

    /// A scorer panicked.
    #[error("similarity scorer panicked: {0}")]
    Panicked(String),
}
