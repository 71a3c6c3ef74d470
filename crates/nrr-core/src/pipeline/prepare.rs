//! Validation and normalization of the input tables.

use std::collections::HashSet;

use tracing::info;

use super::PipelineConfig;
use crate::error::{NrrError, Result};
use crate::normalize::TextNormalizer;
use crate::types::{CandidateRecord, Frame, Query};

const QUERY_TABLE: &str = "query";
const CORPUS_TABLE: &str = "corpus";

/// Checks that the required columns exist and every identifier is present
/// and unique. Returns the identifiers in row order.
fn validate_table(
    frame: &Frame,
    table: &'static str,
    id_column: &str,
    required: &[&str],
) -> Result<Vec<String>> {
    for column in std::iter::once(id_column).chain(required.iter().copied()) {
        if !frame.has_column(column) {
            return Err(NrrError::MissingColumn {
                table,
                column: column.to_string(),
            });
        }
    }

    let mut seen = HashSet::with_capacity(frame.len());
    let mut ids = Vec::with_capacity(frame.len());
    for row in 0..frame.len() {
        let id = frame.cell(row, id_column).ok_or_else(|| NrrError::NullIdentifier {
            table,
            column: id_column.to_string(),
            row,
        })?;
        if !seen.insert(id.clone()) {
            return Err(NrrError::DuplicateIdentifier { table, id });
        }
        ids.push(id);
    }
    Ok(ids)
}

/// Validates both tables, then normalizes them, dropping rows whose text
/// normalizes to nothing.
///
/// Both tables are validated before either is normalized, so a bad corpus
/// is reported even when the query table is also empty.
pub(crate) fn prepare_inputs(
    queries: &Frame,
    corpus: &Frame,
    config: &PipelineConfig,
    normalizer: &TextNormalizer,
) -> Result<(Vec<Query>, Vec<CandidateRecord>)> {
    let query_ids = validate_table(
        queries,
        QUERY_TABLE,
        &config.query_id_column,
        &[config.query_text_column.as_str()],
    )?;

    let mut corpus_required = vec![config.corpus_text_column.as_str()];
    if let Some(source) = &config.source_column {
        corpus_required.push(source.as_str());
    }
    let doc_ids = validate_table(corpus, CORPUS_TABLE, &config.corpus_id_column, &corpus_required)?;

    let normalized_queries: Vec<Query> = query_ids
        .into_iter()
        .enumerate()
        .filter_map(|(row, id)| {
            let raw_text = queries.cell(row, &config.query_text_column)?;
            let normalized_text = normalizer.normalize(&raw_text)?;
            Some(Query {
                id,
                raw_text,
                normalized_text,
            })
        })
        .collect();

    let records: Vec<CandidateRecord> = doc_ids
        .into_iter()
        .enumerate()
        .filter_map(|(row, document_id)| {
            let raw_text = corpus.cell(row, &config.corpus_text_column)?;
            let normalized_text = normalizer.normalize(&raw_text)?;
            let source_label = config
                .source_column
                .as_deref()
                .and_then(|column| corpus.cell(row, column));
            Some(CandidateRecord {
                document_id,
                raw_text,
                normalized_text,
                source_label,
            })
        })
        .collect();

    info!(
        queries = normalized_queries.len(),
        dropped_queries = queries.len() - normalized_queries.len(),
        records = records.len(),
        dropped_records = corpus.len() - records.len(),
        "inputs normalized"
    );

    ensure_non_empty(&normalized_queries, &records)?;
    Ok((normalized_queries, records))
}

pub(crate) fn ensure_non_empty(queries: &[Query], corpus: &[CandidateRecord]) -> Result<()> {
    if queries.is_empty() {
        return Err(NrrError::EmptyTable { table: QUERY_TABLE });
    }
    if corpus.is_empty() {
        return Err(NrrError::EmptyTable { table: CORPUS_TABLE });
    }
    Ok(())
}
