use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use candle_core::{DType, Device, Tensor};
use nrr_core::classifier::model::{HIDDEN_1, HIDDEN_2};
use nrr_core::features::{FEATURE_DIM, FUZZY_MEAN};
use nrr_core::{
    CandidateRecord, Frame, LexicalIndex, LgdEngine, MatchClassifier, ModelConfig, NrrError,
    PipelineConfig, Query, Result, RetrievalEngine, RetrievalHit, SearchPipeline, TantivyEngine,
};

/// Writes weights whose logit equals the centered fuzzy feature, so a
/// candidate matches iff its fuzzy score is above the calibration mean.
fn fuzzy_classifier() -> MatchClassifier {
    let dev = Device::Cpu;
    let mut fc1 = vec![0f32; HIDDEN_1 * FEATURE_DIM];
    fc1[1] = 1.0;
    fc1[FEATURE_DIM + 1] = -1.0;
    let mut fc2 = vec![0f32; HIDDEN_2 * HIDDEN_1];
    fc2[0] = 1.0;
    fc2[HIDDEN_1 + 1] = 1.0;
    let mut fc3 = vec![0f32; HIDDEN_2];
    fc3[0] = 1.0;
    fc3[1] = -1.0;

    let tensors = HashMap::from([
        ("fc1.weight".to_string(), Tensor::from_vec(fc1, (HIDDEN_1, FEATURE_DIM), &dev).unwrap()),
        ("fc1.bias".to_string(), Tensor::zeros(HIDDEN_1, DType::F32, &dev).unwrap()),
        ("fc2.weight".to_string(), Tensor::from_vec(fc2, (HIDDEN_2, HIDDEN_1), &dev).unwrap()),
        ("fc2.bias".to_string(), Tensor::zeros(HIDDEN_2, DType::F32, &dev).unwrap()),
        ("fc3.weight".to_string(), Tensor::from_vec(fc3, (1, HIDDEN_2), &dev).unwrap()),
        ("fc3.bias".to_string(), Tensor::zeros(1, DType::F32, &dev).unwrap()),
    ]);

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nrr_mlp.safetensors");
    candle_core::safetensors::save(&tensors, &path).unwrap();
    MatchClassifier::load(&ModelConfig::new(&path).with_url("http://127.0.0.1:9/unused")).unwrap()
}

/// Engine returning a fixed hit list and counting index builds.
struct StubEngine {
    hits: Vec<RetrievalHit>,
    builds: Arc<AtomicUsize>,
}

struct StubIndex {
    hits: Vec<RetrievalHit>,
}

impl RetrievalEngine for StubEngine {
    fn build_index(&self, _corpus: &[CandidateRecord]) -> Result<Box<dyn LexicalIndex>> {
        self.builds.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(StubIndex {
            hits: self.hits.clone(),
        }))
    }
}

impl LexicalIndex for StubIndex {
    fn query(&self, _text: &str, max_results: usize) -> Result<Vec<RetrievalHit>> {
        Ok(self.hits.iter().take(max_results).cloned().collect())
    }

    fn num_docs(&self) -> usize {
        self.hits.len()
    }
}

fn hit(id: &str, score: f64, rank: usize) -> RetrievalHit {
    RetrievalHit {
        document_id: id.to_string(),
        score,
        rank,
    }
}

fn stub_pipeline(hits: Vec<RetrievalHit>) -> (SearchPipeline, Arc<AtomicUsize>) {
    let builds = Arc::new(AtomicUsize::new(0));
    let engine = StubEngine {
        hits,
        builds: Arc::clone(&builds),
    };
    let pipeline = SearchPipeline::new(
        Box::new(engine),
        fuzzy_classifier(),
        PipelineConfig::default().with_worker_threads(2),
    )
    .unwrap();
    (pipeline, builds)
}

fn apple_corpus() -> Frame {
    Frame::from_str_rows(
        ["docno", "text"],
        &[["1", "apple pie recipe"], ["2", "banana bread recipe"]],
    )
}

fn apple_queries() -> Frame {
    Frame::from_str_rows(["qid", "query"], &[["q1", "apple pie"]])
}

#[test]
fn apple_pie_ranks_and_classifies() {
    let (pipeline, builds) = stub_pipeline(vec![hit("1", 7.5, 0), hit("2", 1.2, 1)]);
    let results = pipeline.search(&apple_queries(), &apple_corpus()).unwrap();
    assert_eq!(builds.load(Ordering::SeqCst), 1);

    let rows = results.get("q1").unwrap();
    let ids: Vec<&str> = rows.iter().map(|c| c.document_id.as_str()).collect();
    assert_eq!(ids, ["1", "2"]);

    assert_eq!(rows[0].query, "apple pie");
    assert_eq!(rows[0].text, "apple pie recipe");
    assert_eq!(rows[0].fuzzy_score, Some(100));
    assert_eq!(rows[0].alignment_score, Some(18));
    assert_eq!(rows[0].lcs_length, Some(9));
    assert!(rows[0].fuzzy_score > rows[1].fuzzy_score);

    let features = rows[0].features().unwrap();
    assert_eq!(features.fuzzy_feature, (100.0 - FUZZY_MEAN) as f32);
    assert_eq!(rows[0].predicted_label, Some(1));
    assert_eq!(rows[1].predicted_label, Some(0));
}

#[test]
fn missing_query_id_column_fails_before_retrieval() {
    let (pipeline, builds) = stub_pipeline(vec![hit("1", 1.0, 0)]);
    let queries = Frame::from_str_rows(["identifier", "query"], &[["q1", "apple pie"]]);

    let err = pipeline.search(&queries, &apple_corpus()).unwrap_err();
    assert!(err.is_validation());
    assert!(matches!(err, NrrError::MissingColumn { table: "query", .. }));
    assert_eq!(builds.load(Ordering::SeqCst), 0);
}

#[test]
fn unresolvable_hit_is_degraded_not_fatal() {
    let (pipeline, _) = stub_pipeline(vec![hit("1", 3.0, 0), hit("ghost", 2.0, 1)]);
    let results = pipeline.search(&apple_queries(), &apple_corpus()).unwrap();

    let rows = results.get("q1").unwrap();
    assert_eq!(rows.len(), 2);

    let ghost = &rows[1];
    assert_eq!(ghost.document_id, "ghost");
    assert_eq!(ghost.retrieval_score, 2.0);
    assert!(ghost.text.is_empty());
    assert!(ghost.similarity().is_none());
    assert!(ghost.features().is_none());
    assert!(ghost.lcs_feature.is_none());
    assert!(ghost.predicted_label.is_none());

    assert_eq!(rows[0].predicted_label, Some(1));
}

#[test]
fn candidates_are_sorted_by_descending_score_with_stable_ties() {
    let (pipeline, _) = stub_pipeline(vec![
        hit("2", 1.0, 0),
        hit("1", 5.0, 1),
        hit("3", 5.0, 2),
        hit("4", 3.0, 3),
    ]);
    let corpus = Frame::from_str_rows(
        ["docno", "text"],
        &[["1", "apple"], ["2", "apple pie"], ["3", "pie"], ["4", "apple tart"]],
    );
    let results = pipeline.search(&apple_queries(), &corpus).unwrap();

    let rows = results.get("q1").unwrap();
    let ids: Vec<&str> = rows.iter().map(|c| c.document_id.as_str()).collect();
    assert_eq!(ids, ["1", "3", "4", "2"]);
    assert!(rows.windows(2).all(|w| w[0].retrieval_score >= w[1].retrieval_score));
}

#[test]
fn scoring_length_guard_degrades_long_candidates() {
    let builds = Arc::new(AtomicUsize::new(0));
    let engine = StubEngine {
        hits: vec![hit("1", 2.0, 0), hit("2", 1.0, 1)],
        builds,
    };
    let config = PipelineConfig::default().with_max_scoring_chars(12);
    let pipeline = SearchPipeline::new(Box::new(engine), fuzzy_classifier(), config).unwrap();
    let corpus = Frame::from_str_rows(
        ["docno", "text"],
        &[["1", "apple pie"], ["2", "apple pie with a very long description"]],
    );

    let results = pipeline.search(&apple_queries(), &corpus).unwrap();
    let rows = results.get("q1").unwrap();
    assert!(rows[0].similarity().is_some());
    assert_eq!(rows[1].text, "apple pie with a very long description");
    assert!(rows[1].similarity().is_none());
    assert!(rows[1].predicted_label.is_none());
}

#[test]
fn repeated_runs_are_identical() {
    let pipeline = SearchPipeline::new(
        Box::new(LgdEngine::new()),
        fuzzy_classifier(),
        PipelineConfig::default(),
    )
    .unwrap();
    let queries = Frame::from_str_rows(
        ["qid", "query"],
        &[["q1", "apple pie"], ["q2", "bread"], ["q3", "Recipe!"]],
    );

    let first = pipeline.search(&queries, &apple_corpus()).unwrap();
    let second = pipeline.search(&queries, &apple_corpus()).unwrap();
    assert_eq!(first, second);

    let order: Vec<&str> = first.iter().map(|(id, _)| id).collect();
    assert_eq!(order, ["q1", "q2", "q3"]);
    assert_eq!(first.get("q3").unwrap().len(), 2);
}

#[test]
fn tantivy_engine_end_to_end_with_source_labels() {
    let dir = tempfile::tempdir().unwrap();
    let engine = TantivyEngine::new(dir.path().join("pd_index"));
    let config = PipelineConfig::default().with_source_column("file_name");
    let pipeline = SearchPipeline::new(Box::new(engine), fuzzy_classifier(), config).unwrap();

    let corpus = Frame::from_json_str(
        r#"
        {"docno": 1, "text": "Apple pie recipe", "file_name": "page_1.png"}
        {"docno": 2, "text": "Banana bread recipe", "file_name": "page_2.png"}
        {"docno": 3, "text": "12345", "file_name": "page_3.png"}
        "#,
    )
    .unwrap();

    let results = pipeline.search(&apple_queries(), &corpus).unwrap();
    let rows = results.get("q1").unwrap();
    assert_eq!(rows[0].document_id, "1");
    assert_eq!(rows[0].source_label.as_deref(), Some("page_1.png"));
    assert!(rows[0].is_match());
    assert!(rows.iter().all(|c| c.document_id != "3"));

    let matches = results.matches_only();
    assert!(matches.get("q1").unwrap().iter().all(|c| c.is_match()));
}

#[test]
fn typed_records_skip_table_validation() {
    let (pipeline, _) = stub_pipeline(vec![hit("a", 1.0, 0)]);
    let queries = vec![Query {
        id: "q".into(),
        raw_text: "Apple".into(),
        normalized_text: "apple".into(),
    }];
    let corpus = vec![CandidateRecord::new("a", "Apple", "apple")];

    let results = pipeline.search_records(&queries, &corpus).unwrap();
    assert_eq!(results.get("q").unwrap()[0].fuzzy_score, Some(100));

    let duplicated = vec![queries[0].clone(), queries[0].clone()];
    assert!(matches!(
        pipeline.search_records(&duplicated, &corpus),
        Err(NrrError::DuplicateIdentifier { table: "query", .. })
    ));
    assert!(matches!(
        pipeline.search_records(&queries, &[]),
        Err(NrrError::EmptyTable { table: "corpus" })
    ));
}

#[test]
fn invalid_config_is_rejected() {
    let result = SearchPipeline::new(
        Box::new(LgdEngine::new()),
        fuzzy_classifier(),
        PipelineConfig::default().with_max_results(0),
    );
    assert!(matches!(result, Err(NrrError::InvalidConfig(_))));
}
