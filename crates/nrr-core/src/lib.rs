//! # NRR Core
//!
//! Re-ranks lexical retrieval results for record matching. Each query's
//! candidates are scored with three string-similarity signals, combined with
//! the retrieval score into a mean-centered feature vector and classified by
//! a small pre-trained MLP as match or non-match.
//!
//! ## Quick Start
//!
//! ```rust
//! use nrr_core::similarity::{alignment_score, fuzzy_score, lcs_length};
//! use nrr_core::TextNormalizer;
//!
//! let normalizer = TextNormalizer::new().unwrap();
//! let query = normalizer.normalize("Apple Pie!").unwrap();
//! let text = normalizer.normalize("apple pie recipe").unwrap();
//!
//! assert_eq!(query, "apple pie");
//! assert_eq!(fuzzy_score(&query, &text), 100);
//! assert_eq!(alignment_score(&query, &text), 18);
//! assert_eq!(lcs_length(&query, &text), 9);
//! ```
pub mod classifier;
pub mod error;
pub mod features;
pub mod normalize;
pub mod pipeline;
pub mod retrieval;
pub mod similarity;
pub mod types;

// Re-export primary API
pub use classifier::{MatchClassifier, ModelConfig};
pub use error::{NrrError, Result, ScoringError};
pub use features::{FeatureCalibration, FeatureVector, build_features};
pub use normalize::TextNormalizer;
pub use pipeline::{PipelineConfig, SearchPipeline};
pub use retrieval::{LexicalIndex, LgdEngine, RetrievalEngine, TantivyEngine};
pub use similarity::SimilarityScores;
pub use types::{CandidateRecord, Frame, Query, ResultSet, RetrievalHit, ScoredCandidate};
