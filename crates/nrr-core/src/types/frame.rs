use std::path::Path;

use serde_json::{Map, Value};

use crate::error::{NrrError, Result};

/// A small column-oriented view over JSON records.
///
/// Stands in for the query and corpus tables the pipeline consumes. Columns
/// are kept in order of first appearance; a row may omit a column, in which
/// case the cell reads as missing.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Frame {
    columns: Vec<String>,
    rows: Vec<Map<String, Value>>,
}

impl Frame {
    /// Creates an empty frame with the given columns.
    #[must_use]
    pub fn new<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            columns: columns.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
        }
    }

    /// Builds a frame of string cells, mostly useful in tests and examples.
    ///
    /// # Examples
    /// ```
    /// use nrr_core::Frame;
    ///
    /// let queries = Frame::from_str_rows(["qid", "query"], &[["q1", "apple pie"]]);
    /// assert_eq!(queries.len(), 1);
    /// assert_eq!(queries.cell(0, "query").as_deref(), Some("apple pie"));
    /// ```
    #[must_use]
    pub fn from_str_rows<const N: usize>(columns: [&str; N], rows: &[[&str; N]]) -> Self {
        let mut frame = Self::new(columns);
        for row in rows {
            let record = columns
                .iter()
                .zip(row.iter())
                .map(|(c, v)| ((*c).to_string(), Value::String((*v).to_string())))
                .collect();
            frame.push_row(record);
        }
        frame
    }

    /// Builds a frame from records; the column list is the union of their keys.
    #[must_use]
    pub fn from_records(records: Vec<Map<String, Value>>) -> Self {
        let mut frame = Self::default();
        for record in records {
            frame.push_row(record);
        }
        frame
    }

    /// Parses a JSON array of objects, or JSON Lines with one object per line.
    ///
    /// # Errors
    ///
    /// Returns `NrrError::InvalidData` if the input is neither form or a
    /// record is not a JSON object.
    pub fn from_json_str(input: &str) -> Result<Self> {
        let trimmed = input.trim_start();
        let values: Vec<Value> = if trimmed.starts_with('[') {
            serde_json::from_str(trimmed).map_err(|e| NrrError::InvalidData(e.to_string()))?
        } else {
            trimmed
                .lines()
                .enumerate()
                .filter(|(_, line)| !line.trim().is_empty())
                .map(|(n, line)| {
                    serde_json::from_str(line)
                        .map_err(|e| NrrError::InvalidData(format!("line {}: {e}", n + 1)))
                })
                .collect::<Result<_>>()?
        };

        let records = values
            .into_iter()
            .enumerate()
            .map(|(i, value)| match value {
                Value::Object(map) => Ok(map),
                other => Err(NrrError::InvalidData(format!(
                    "record {i} is not an object: {other}"
                ))),
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self::from_records(records))
    }

    /// Reads a frame from a `.json` or `.jsonl` file.
    ///
    /// # Errors
    ///
    /// Returns `NrrError::Io` if the file cannot be read and
    /// `NrrError::InvalidData` if it cannot be decoded.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json_str(&content)
    }

    /// Appends a row, registering any column not seen before.
    pub fn push_row(&mut self, row: Map<String, Value>) {
        for key in row.keys() {
            if !self.has_column(key) {
                self.columns.push(key.clone());
            }
        }
        self.rows.push(row);
    }

    /// Column names in order of first appearance.
    #[must_use]
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Returns `true` if the frame declares `column`.
    #[must_use]
    pub fn has_column(&self, column: &str) -> bool {
        self.columns.iter().any(|c| c == column)
    }

    /// Number of rows.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Returns `true` if the frame has no rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Cell at `row`/`column` as a string, `None` if absent or null.
    ///
    /// Numbers and booleans are stringified so identifiers compare as text.
    #[must_use]
    pub fn cell(&self, row: usize, column: &str) -> Option<String> {
        self.rows
            .get(row)
            .and_then(|r| r.get(column))
            .and_then(cell_to_string)
    }
}

fn cell_to_string(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        other => Some(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_json_array() {
        let frame = Frame::from_json_str(
            r#"[{"docno": 1, "text": "apple pie"}, {"docno": "2", "text": null, "file": "a.pdf"}]"#,
        )
        .unwrap();
        assert_eq!(frame.len(), 2);
        assert_eq!(frame.columns(), ["docno", "text", "file"]);
        assert_eq!(frame.cell(0, "docno").as_deref(), Some("1"));
        assert_eq!(frame.cell(1, "text"), None);
        assert_eq!(frame.cell(0, "file"), None);
        assert_eq!(frame.cell(5, "docno"), None);
    }

    #[test]
    fn parses_json_lines() {
        let input = "{\"qid\": \"q1\", \"query\": \"apple\"}\n\n{\"qid\": \"q2\", \"query\": \"pear\"}\n";
        let frame = Frame::from_json_str(input).unwrap();
        assert_eq!(frame.len(), 2);
        assert!(frame.has_column("qid"));
        assert_eq!(frame.cell(1, "query").as_deref(), Some("pear"));
    }

    #[test]
    fn rejects_non_object_records() {
        let err = Frame::from_json_str("[1, 2]").unwrap_err();
        assert!(matches!(err, NrrError::InvalidData(_)));

        let err = Frame::from_json_str("{\"qid\": 1}\nnot json").unwrap_err();
        assert!(err.to_string().contains("line 2"));
    }

    #[test]
    fn empty_frame_keeps_declared_columns() {
        let frame = Frame::new(["qid", "query"]);
        assert!(frame.is_empty());
        assert!(frame.has_column("query"));
        assert!(!frame.has_column("text"));
    }
}
