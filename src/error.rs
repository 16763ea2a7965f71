use std::path::PathBuf;

use thiserror::Error;

/// Everything that can stop a dataset build.
#[derive(Debug, Error)]
pub enum DataError {
    #[error("cannot read '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV error in '{}': {source}", path.display())]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("parquet error in '{}': {source}", path.display())]
    Parquet {
        path: PathBuf,
        #[source]
        source: parquet::errors::ParquetError,
    },

    #[error("arrow error in '{}': {source}", path.display())]
    Arrow {
        path: PathBuf,
        #[source]
        source: arrow::error::ArrowError,
    },

    #[error("invalid configuration JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("'{}' has no header row", path.display())]
    EmptyHeader { path: PathBuf },

    #[error("{role} column '{column}' not found in header of '{}'", path.display())]
    MissingColumn {
        path: PathBuf,
        role: &'static str,
        column: String,
    },

    #[error(
        "'{}' does not match the schema of '{}': missing {missing:?}, unexpected {unexpected:?}",
        path.display(),
        reference.display()
    )]
    SchemaMismatch {
        path: PathBuf,
        reference: PathBuf,
        missing: Vec<String>,
        unexpected: Vec<String>,
    },

    #[error("{}, line {row}, column '{column}': '{value}' is not a number", path.display())]
    NonNumeric {
        path: PathBuf,
        row: usize,
        column: String,
        value: String,
    },

    #[error("unsupported {dtype} column '{column}' in '{}'", path.display())]
    UnsupportedColumn {
        path: PathBuf,
        column: String,
        dtype: String,
    },

    #[error("{source_name} has {rows} rows, need at least {needed} for windows of length {window_len}")]
    InsufficientRows {
        source_name: String,
        rows: usize,
        window_len: usize,
        needed: usize,
    },

    #[error("window shape error: {0}")]
    Shape(#[from] ndarray::ShapeError),
}

pub type Result<T> = std::result::Result<T, DataError>;
