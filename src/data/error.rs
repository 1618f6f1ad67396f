use std::path::PathBuf;

use thiserror::Error;

/// Reasons a measurement file body cannot be turned into a [`Table`].
///
/// [`Table`]: super::model::Table
#[derive(Debug, Error)]
pub enum TableError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("no '#' header line declaring the columns")]
    MissingHeader,
    #[error("line {line}: expected {expected} values, found {found}")]
    ColumnCountMismatch {
        line: usize,
        expected: usize,
        found: usize,
    },
    #[error("line {line}: '{token}' is not a number")]
    InvalidNumber { line: usize, token: String },
    #[error("column '{0}' not found")]
    MissingColumn(String),
    #[error("failed to write table: {0}")]
    Write(#[from] csv::Error),
}

/// Filename counters that cannot be summarised without losing digits.
#[derive(Debug, Error, PartialEq)]
pub enum ProvenanceError {
    #[error("'{0}' holds a number too large for a 64-bit counter")]
    NumberTooLarge(String),
    #[error("datapoint capture total overflows a 64-bit counter")]
    CaptureOverflow,
}
