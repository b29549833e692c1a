//! Typed errors raised while extracting NEO and close-approach records.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("cannot open '{}': {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV read failed near line {row}: {source}")]
    Csv {
        row: u64,
        #[source]
        source: csv::Error,
    },

    #[error("row {row} has {found} columns, expected at least {expected}")]
    ShortRow {
        row: u64,
        found: usize,
        expected: usize,
    },

    #[error("row {row}: field '{field}' is not a number: {value:?}")]
    InvalidNumber {
        row: u64,
        field: &'static str,
        value: String,
    },

    #[error("row {row}: unparseable close-approach date {value:?}")]
    InvalidDate { row: u64, value: String },

    #[error("malformed JSON document: {0}")]
    Json(#[from] serde_json::Error),

    #[error("JSON 'fields' header is missing required field '{0}'")]
    MissingField(&'static str),

    #[error("data row {row}: {reason}")]
    MalformedRow { row: u64, reason: String },
}
