use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::features::FeatureVector;
use crate::similarity::SimilarityScores;

/// One candidate returned by a lexical index for a query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievalHit {
    /// Identifier of the matched corpus record.
    pub document_id: String,
    /// Engine-defined relevance score; larger is better.
    pub score: f64,
    /// 0-based position in the engine's descending-score order.
    pub rank: usize,
}

/// A retrieved candidate annotated with similarity signals and a match decision.
///
/// Candidates whose document could not be resolved, or whose scoring failed,
/// keep their retrieval data and leave every derived field unset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredCandidate {
    /// Identifier of the matched corpus record.
    pub document_id: String,
    /// Engine-defined relevance score.
    pub retrieval_score: f64,
    /// Position in the engine's original order.
    pub rank: usize,
    /// Normalized query text.
    pub query: String,
    /// Normalized candidate text; empty when the document was not found.
    pub text: String,
    /// Provenance label copied from the corpus, when configured.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_label: Option<String>,
    /// Token-set ratio in `[0, 100]`.
    pub fuzzy_score: Option<u8>,
    /// Local alignment score.
    pub alignment_score: Option<u32>,
    /// Longest common subsequence length.
    pub lcs_length: Option<u32>,
    /// Mean-centered retrieval score.
    pub retrieval_feature: Option<f32>,
    /// Mean-centered fuzzy score.
    pub fuzzy_feature: Option<f32>,
    /// Mean-centered alignment score.
    pub alignment_feature: Option<f32>,
    /// Mean-centered LCS length.
    pub lcs_feature: Option<f32>,
    /// 1 for a predicted match, 0 otherwise.
    pub predicted_label: Option<u8>,
}

impl ScoredCandidate {
    /// Starts a candidate from a hit; all derived fields are unset.
    #[must_use]
    pub fn from_hit(hit: &RetrievalHit, query: &str) -> Self {
        Self {
            document_id: hit.document_id.clone(),
            retrieval_score: hit.score,
            rank: hit.rank,
            query: query.to_string(),
            text: String::new(),
            source_label: None,
            fuzzy_score: None,
            alignment_score: None,
            lcs_length: None,
            retrieval_feature: None,
            fuzzy_feature: None,
            alignment_feature: None,
            lcs_feature: None,
            predicted_label: None,
        }
    }

    /// Similarity signals, if all three were computed.
    #[must_use]
    pub fn similarity(&self) -> Option<SimilarityScores> {
        Some(SimilarityScores {
            fuzzy: self.fuzzy_score?,
            alignment: self.alignment_score?,
            lcs: self.lcs_length?,
        })
    }

    /// Classifier inputs, if all four were computed.
    #[must_use]
    pub fn features(&self) -> Option<FeatureVector> {
        Some(FeatureVector {
            retrieval_feature: self.retrieval_feature?,
            fuzzy_feature: self.fuzzy_feature?,
            alignment_feature: self.alignment_feature?,
            lcs_feature: self.lcs_feature?,
        })
    }

    /// Stores the classifier inputs as the four feature columns.
    pub fn set_features(&mut self, features: FeatureVector) {
        self.retrieval_feature = Some(features.retrieval_feature);
        self.fuzzy_feature = Some(features.fuzzy_feature);
        self.alignment_feature = Some(features.alignment_feature);
        self.lcs_feature = Some(features.lcs_feature);
    }

    /// Returns `true` if the classifier predicted a match.
    #[must_use]
    pub fn is_match(&self) -> bool {
        self.predicted_label == Some(1)
    }
}

/// Ordered mapping from query identifier to its ranked candidates.
///
/// Queries appear in input order; candidates are ordered by descending
/// retrieval score, ties kept in retrieval rank order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResultSet {
    entries: IndexMap<String, Vec<ScoredCandidate>>,
}

impl ResultSet {
    /// Creates an empty result set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records the candidates for one query, replacing any previous entry.
    pub fn insert(&mut self, query_id: impl Into<String>, candidates: Vec<ScoredCandidate>) {
        self.entries.insert(query_id.into(), candidates);
    }

    /// Candidates for `query_id`.
    #[must_use]
    pub fn get(&self, query_id: &str) -> Option<&[ScoredCandidate]> {
        self.entries.get(query_id).map(Vec::as_slice)
    }

    /// Iterates over `(query_id, candidates)` in input order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[ScoredCandidate])> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    /// Number of queries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if no query was processed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Keeps only candidates predicted to match.
    #[must_use]
    pub fn matches_only(mut self) -> Self {
        for candidates in self.entries.values_mut() {
            candidates.retain(ScoredCandidate::is_match);
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hit(id: &str, score: f64, rank: usize) -> RetrievalHit {
        RetrievalHit {
            document_id: id.into(),
            score,
            rank,
        }
    }

    #[test]
    fn from_hit_leaves_derived_fields_unset() {
        let candidate = ScoredCandidate::from_hit(&hit("7", 3.5, 0), "apple pie");
        assert_eq!(candidate.document_id, "7");
        assert_eq!(candidate.query, "apple pie");
        assert!(candidate.text.is_empty());
        assert!(candidate.similarity().is_none());
        assert!(!candidate.is_match());
    }

    #[test]
    fn result_set_preserves_insertion_order() {
        let mut set = ResultSet::new();
        set.insert("q2", vec![]);
        set.insert("q1", vec![ScoredCandidate::from_hit(&hit("1", 1.0, 0), "a")]);
        let ids: Vec<&str> = set.iter().map(|(id, _)| id).collect();
        assert_eq!(ids, ["q2", "q1"]);
        assert_eq!(set.get("q1").map(<[_]>::len), Some(1));
        assert!(set.get("q3").is_none());
    }

    #[test]
    fn matches_only_filters_candidates() {
        let mut yes = ScoredCandidate::from_hit(&hit("1", 2.0, 0), "a");
        yes.predicted_label = Some(1);
        let mut no = ScoredCandidate::from_hit(&hit("2", 1.0, 1), "a");
        no.predicted_label = Some(0);
        let unset = ScoredCandidate::from_hit(&hit("3", 0.5, 2), "a");

        let mut set = ResultSet::new();
        set.insert("q1", vec![yes, no, unset]);
        let filtered = set.matches_only();
        let ids: Vec<&str> = filtered.get("q1").unwrap().iter().map(|c| c.document_id.as_str()).collect();
        assert_eq!(ids, ["1"]);
    }

    #[test]
    fn serializes_as_map_of_rows() {
        let mut candidate = ScoredCandidate::from_hit(&hit("1", 2.0, 0), "apple");
        candidate.set_features(FeatureVector {
            retrieval_feature: 1.0,
            fuzzy_feature: 2.0,
            alignment_feature: 3.0,
            lcs_feature: 4.0,
        });
        assert_eq!(candidate.features().map(|f| f.fuzzy_feature), Some(2.0));
        let mut set = ResultSet::new();
        set.insert("q1", vec![candidate]);

        let json = serde_json::to_value(&set).unwrap();
        let row = &json["q1"][0];
        assert_eq!(row["document_id"], "1");
        assert_eq!(row["lcs_feature"], 4.0);
        assert!(row.get("source_label").is_none());
        assert!(row["predicted_label"].is_null());
    }

    #[test]
    fn degraded_rows_keep_every_column() {
        let scored = {
            let mut c = ScoredCandidate::from_hit(&hit("1", 2.0, 0), "apple");
            c.fuzzy_score = Some(100);
            c.alignment_score = Some(10);
            c.lcs_length = Some(5);
            c.set_features(FeatureVector {
                retrieval_feature: 0.5,
                fuzzy_feature: 8.5,
                alignment_feature: -35.0,
                lcs_feature: -38.0,
            });
            c.predicted_label = Some(1);
            c
        };
        let ghost = ScoredCandidate::from_hit(&hit("ghost", 1.0, 1), "apple");

        let keys = |c: &ScoredCandidate| -> Vec<String> {
            let value = serde_json::to_value(c).unwrap();
            value.as_object().unwrap().keys().cloned().collect()
        };
        assert_eq!(keys(&ghost), keys(&scored));

        let row = serde_json::to_value(&ghost).unwrap();
        for column in [
            "fuzzy_score",
            "alignment_score",
            "lcs_length",
            "retrieval_feature",
            "fuzzy_feature",
            "alignment_feature",
            "lcs_feature",
            "predicted_label",
        ] {
            assert!(row.get(column).is_some_and(serde_json::Value::is_null), "{column}");
        }
        assert!(ghost.features().is_none());
    }
}
