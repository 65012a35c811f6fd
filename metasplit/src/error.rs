//! Error types for metasplit operations.

use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid metadata query '{0}': expected <path>@<id-column><clauses>")]
    InvalidQuery(String),

    #[error("Invalid clause: {0}")]
    InvalidClause(String),

    #[error("File not found: {0}")]
    SourceNotFound(PathBuf),

    #[error("Variable '{variable}' not found in headers of {table}")]
    MissingVariable { variable: String, table: String },

    #[error("Empty selection: {0}")]
    EmptySelection(String),

    #[error("Selected identifiers missing from target headers: {}", .0.join(", "))]
    MissingHeader(Vec<String>),

    #[error("Row {row} has no identifier (identifier column has {len} values)")]
    RowOutOfRange { row: usize, len: usize },

    #[error("{program} failed ({status}): {stderr}")]
    ExternalTool {
        program: String,
        status: String,
        stderr: String,
    },
}

pub type Result<T> = std::result::Result<T, Error>;
