use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ExportError>;

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV parsing error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid parameter '{name}': {message}")]
    InvalidParameter { name: String, message: String },

    #[error("Source file not found: {}", path.display())]
    MissingSourceFile { path: PathBuf },

    #[error("Row {row} of {}: {message}", path.display())]
    RowParseFailure {
        path: PathBuf,
        row: usize,
        message: String,
    },

    #[error("Failed to filter {}: {message}", path.display())]
    FileFilterFailure { path: PathBuf, message: String },

    #[error("Failed to build archive {}: {message}", path.display())]
    ArchiveBuildFailure { path: PathBuf, message: String },

    #[error("Failed to clean up {}: {source}", path.display())]
    CleanupFailure {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Validation error: {0}")]
    Validation(#[from] validator::ValidationErrors),

    #[error("Export cancelled: {0}")]
    Cancelled(String),

    #[error("Async task error: {0}")]
    TaskJoin(#[from] tokio::task::JoinError),
}

impl ExportError {
    pub fn invalid_parameter(name: &str, message: impl Into<String>) -> Self {
        ExportError::InvalidParameter {
            name: name.to_string(),
            message: message.into(),
        }
    }

    pub fn file_filter(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        ExportError::FileFilterFailure {
            path: path.into(),
            message: message.into(),
        }
    }

    pub fn archive_build(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        ExportError::ArchiveBuildFailure {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Errors the caller caused, as opposed to server-side failures.
    pub fn is_client_error(&self) -> bool {
        matches!(self, ExportError::InvalidParameter { .. })
    }
}

impl From<config::ConfigError> for ExportError {
    fn from(e: config::ConfigError) -> Self {
        ExportError::Config(e.to_string())
    }
}
