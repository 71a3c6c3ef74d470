//! # Feature Builder
//!
//! Turns the retrieval score and the three similarity signals into the
//! classifier's 4-dimensional input by subtracting calibration means.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{NrrError, Result};
use crate::similarity::SimilarityScores;
use crate::types::RetrievalHit;

/// Mean retrieval score of the calibration corpus.
pub const RETRIEVAL_MEAN: f64 = 23.824547841344483;
/// Mean fuzzy token-set score of the calibration corpus.
pub const FUZZY_MEAN: f64 = 91.57859531772576;
/// Mean local alignment score of the calibration corpus.
pub const ALIGNMENT_MEAN: f64 = 45.26086956521739;
/// Mean LCS length of the calibration corpus.
pub const LCS_MEAN: f64 = 43.03010033444816;

/// Number of classifier inputs.
pub const FEATURE_DIM: usize = 4;

/// Per-signal centers the classifier weights were trained against.
///
/// A retrained classifier must ship matching values; see
/// [`MatchClassifier::calibration`](crate::classifier::MatchClassifier::calibration).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeatureCalibration {
    pub retrieval_mean: f64,
    pub fuzzy_mean: f64,
    pub alignment_mean: f64,
    pub lcs_mean: f64,
}

impl Default for FeatureCalibration {
    fn default() -> Self {
        Self {
            retrieval_mean: RETRIEVAL_MEAN,
            fuzzy_mean: FUZZY_MEAN,
            alignment_mean: ALIGNMENT_MEAN,
            lcs_mean: LCS_MEAN,
        }
    }
}

impl FeatureCalibration {
    /// Reads calibration means from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns `NrrError::ModelLoad` if the file is unreadable or malformed,
    /// since the means are part of the model artifact.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            NrrError::ModelLoad(format!("failed to read calibration {}: {e}", path.display()))
        })?;
        serde_json::from_str(&content).map_err(|e| {
            NrrError::ModelLoad(format!("failed to parse calibration {}: {e}", path.display()))
        })
    }

    /// Centers the four raw signals.
    #[must_use]
    pub fn build(&self, retrieval_score: f64, scores: &SimilarityScores) -> FeatureVector {
        FeatureVector {
            retrieval_feature: (retrieval_score - self.retrieval_mean) as f32,
            fuzzy_feature: (f64::from(scores.fuzzy) - self.fuzzy_mean) as f32,
            alignment_feature: (f64::from(scores.alignment) - self.alignment_mean) as f32,
            lcs_feature: (f64::from(scores.lcs) - self.lcs_mean) as f32,
        }
    }
}

/// Builds the feature vector for one retrieved and scored candidate.
#[must_use]
pub fn build_features(
    hit: &RetrievalHit,
    scores: &SimilarityScores,
    calibration: &FeatureCalibration,
) -> FeatureVector {
    calibration.build(hit.score, scores)
}

/// Mean-centered classifier input, always in the order
/// retrieval, fuzzy, alignment, lcs.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector {
    pub retrieval_feature: f32,
    pub fuzzy_feature: f32,
    pub alignment_feature: f32,
    pub lcs_feature: f32,
}

impl FeatureVector {
    /// The features as a fixed-order array.
    #[must_use]
    pub fn as_array(&self) -> [f32; FEATURE_DIM] {
        [
            self.retrieval_feature,
            self.fuzzy_feature,
            self.alignment_feature,
            self.lcs_feature,
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn subtracts_shipped_means_in_order() {
        let scores = SimilarityScores {
            fuzzy: 100,
            alignment: 18,
            lcs: 9,
        };
        let features = FeatureCalibration::default().build(30.0, &scores).as_array();

        let expected = [
            (30.0 - RETRIEVAL_MEAN) as f32,
            (100.0 - FUZZY_MEAN) as f32,
            (18.0 - ALIGNMENT_MEAN) as f32,
            (9.0 - LCS_MEAN) as f32,
        ];
        assert_eq!(features, expected);
        assert!(features[0] > 0.0 && features[1] > 0.0);
        assert!(features[2] < 0.0 && features[3] < 0.0);
    }

    #[test]
    fn custom_calibration_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("calibration.json");
        std::fs::write(
            &path,
            r#"{"retrieval_mean": 1.0, "fuzzy_mean": 2.0, "alignment_mean": 3.0, "lcs_mean": 4.0}"#,
        )
        .unwrap();

        let calibration = FeatureCalibration::from_path(&path).unwrap();
        let scores = SimilarityScores {
            fuzzy: 2,
            alignment: 3,
            lcs: 4,
        };
        assert_eq!(calibration.build(1.0, &scores).as_array(), [0.0; 4]);
    }

    #[test]
    fn malformed_calibration_is_model_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("calibration.json");
        std::fs::write(&path, "{\"retrieval_mean\": 1.0}").unwrap();
        assert!(matches!(
            FeatureCalibration::from_path(&path),
            Err(NrrError::ModelLoad(_))
        ));
    }
}
