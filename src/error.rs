use std::path::PathBuf;

use thiserror::Error;

/// Result type for schema inspection.
pub type Result<T> = std::result::Result<T, AnalyserError>;

/// Errors raised while opening or inspecting a table file.
#[derive(Debug, Error)]
pub enum AnalyserError {
    /// The file is missing, unreadable, corrupt, or not a recognised table file.
    #[error("Cannot open table file: {}: {reason}", .path.display())]
    FileOpen { path: PathBuf, reason: String },

    /// The file opened but holds no table-shaped object with this name.
    #[error("Tree '{tree}' not found in {}", .path.display())]
    TableNotFound { tree: String, path: PathBuf },

    /// A query was made after the analyser was closed.
    #[error("cannot {0}: analyser is closed")]
    InvalidState(&'static str),

    #[error("Branch '{0}' not found")]
    BranchNotFound(String),

    #[error(transparent)]
    DuckDb(#[from] duckdb::Error),

    #[error(transparent)]
    Parquet(#[from] parquet::errors::ParquetError),

    #[error(transparent)]
    Arrow(#[from] arrow::error::ArrowError),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl AnalyserError {
    pub(crate) fn file_open(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        Self::FileOpen {
            path: path.into(),
            reason: reason.to_string(),
        }
    }
}
