//! On-disk lexical engine backed by Tantivy (BM25 ranking).

use std::path::{Path, PathBuf};

use tantivy::collector::TopDocs;
use tantivy::query::QueryParser;
use tantivy::schema::{Field, STORED, STRING, Schema, TEXT, Value};
use tantivy::{Index, IndexReader, IndexWriter, TantivyDocument, doc};
use tracing::{debug, info};

use super::{DEFAULT_CANDIDATE_POOL, LexicalIndex, RetrievalEngine, check_corpus};
use crate::error::{NrrError, Result};
use crate::types::{CandidateRecord, RetrievalHit};

/// Default index location, relative to the working directory.
pub const DEFAULT_INDEX_DIR: &str = "./pd_index";

const WRITER_HEAP_BYTES: usize = 50_000_000;

#[derive(Debug, Clone, Copy)]
struct Fields {
    docno: Field,
    text: Field,
}

fn build_schema() -> (Schema, Fields) {
    let mut builder = Schema::builder();
    let docno = builder.add_text_field("docno", STRING | STORED);
    let text = builder.add_text_field("text", TEXT | STORED);
    (builder.build(), Fields { docno, text })
}

/// Tantivy engine writing its index under a fixed directory.
///
/// Every [`build_index`](RetrievalEngine::build_index) call deletes the
/// directory first; the index is a per-run artifact, not a cache.
#[derive(Debug, Clone)]
pub struct TantivyEngine {
    index_dir: PathBuf,
    candidate_pool: usize,
}

impl TantivyEngine {
    /// Creates an engine that indexes into `index_dir`.
    pub fn new(index_dir: impl Into<PathBuf>) -> Self {
        Self {
            index_dir: index_dir.into(),
            candidate_pool: DEFAULT_CANDIDATE_POOL,
        }
    }

    /// Sets how many candidates are fetched before truncation.
    #[must_use]
    pub fn with_candidate_pool(mut self, candidate_pool: usize) -> Self {
        self.candidate_pool = candidate_pool.max(1);
        self
    }

    /// The directory the index is written to.
    #[must_use]
    pub fn index_dir(&self) -> &Path {
        &self.index_dir
    }
}

impl Default for TantivyEngine {
    fn default() -> Self {
        Self::new(DEFAULT_INDEX_DIR)
    }
}

fn build_error(context: &str, e: impl std::fmt::Display) -> NrrError {
    NrrError::IndexBuild(format!("{context}: {e}"))
}

impl RetrievalEngine for TantivyEngine {
    fn build_index(&self, corpus: &[CandidateRecord]) -> Result<Box<dyn LexicalIndex>> {
        check_corpus(corpus)?;

        if self.index_dir.exists() {
            debug!(dir = %self.index_dir.display(), "removing stale index");
            std::fs::remove_dir_all(&self.index_dir)
                .map_err(|e| build_error("failed to remove stale index", e))?;
        }
        std::fs::create_dir_all(&self.index_dir)
            .map_err(|e| build_error("failed to create index directory", e))?;

        let (schema, fields) = build_schema();
        let index = Index::create_in_dir(&self.index_dir, schema)
            .map_err(|e| build_error("failed to create index", e))?;

        // A single indexing thread keeps one segment, so tie order follows corpus order.
        let mut writer: IndexWriter = index
            .writer_with_num_threads(1, WRITER_HEAP_BYTES)
            .map_err(|e| build_error("failed to create index writer", e))?;

        for record in corpus {
            writer
                .add_document(doc!(
                    fields.docno => record.document_id.clone(),
                    fields.text => record.normalized_text.clone(),
                ))
                .map_err(|e| build_error("failed to add document", e))?;
        }
        writer
            .commit()
            .map_err(|e| build_error("failed to commit index", e))?;

        let reader = index
            .reader()
            .map_err(|e| build_error("failed to open index reader", e))?;

        info!(
            dir = %self.index_dir.display(),
            docs = corpus.len(),
            "tantivy index rebuilt"
        );

        Ok(Box::new(TantivyIndex {
            index,
            reader,
            fields,
            candidate_pool: self.candidate_pool,
            num_docs: corpus.len(),
        }))
    }
}

struct TantivyIndex {
    index: Index,
    reader: IndexReader,
    fields: Fields,
    candidate_pool: usize,
    num_docs: usize,
}

fn retrieval_error(context: &str, e: impl std::fmt::Display) -> NrrError {
    NrrError::Retrieval(format!("{context}: {e}"))
}

impl LexicalIndex for TantivyIndex {
    fn query(&self, text: &str, max_results: usize) -> Result<Vec<RetrievalHit>> {
        if max_results == 0 || text.trim().is_empty() {
            return Ok(Vec::new());
        }

        let parser = QueryParser::for_index(&self.index, vec![self.fields.text]);
        let query = parser
            .parse_query(text)
            .map_err(|e| retrieval_error("failed to parse query", e))?;

        let searcher = self.reader.searcher();
        let fetch_limit = self.candidate_pool.max(max_results);
        let mut top_docs = searcher
            .search(&query, &TopDocs::with_limit(fetch_limit))
            .map_err(|e| retrieval_error("search failed", e))?;
        top_docs.sort_by(|a, b| b.0.total_cmp(&a.0).then(a.1.cmp(&b.1)));

        let mut hits = Vec::with_capacity(max_results.min(top_docs.len()));
        for (score, address) in top_docs.into_iter().take(max_results) {
            let doc: TantivyDocument = searcher
                .doc(address)
                .map_err(|e| retrieval_error("failed to load document", e))?;
            let document_id = doc
                .get_first(self.fields.docno)
                .and_then(|v| v.as_str())
                .ok_or_else(|| NrrError::Retrieval("indexed document has no docno".into()))?
                .to_string();
            hits.push(RetrievalHit {
                document_id,
                score: f64::from(score),
                rank: hits.len(),
            });
        }

        Ok(hits)
    }

    fn num_docs(&self) -> usize {
        self.num_docs
    }
}
