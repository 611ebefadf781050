use crate::error::{ExportError, Result};
use crate::utils::constants::ARCHIVE_CONTENT_TYPE;
use std::path::Path;
use tracing::debug;

/// A finished export, ready to hand to a client as a file download
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportResponse {
    pub filename: String,
    pub content_type: &'static str,
    pub body: Vec<u8>,
}

impl ExportResponse {
    /// Read the whole archive into memory as an attachment named `filename`
    pub fn from_archive(archive_path: &Path, filename: &str) -> Result<Self> {
        let body = std::fs::read(archive_path).map_err(|e| {
            ExportError::archive_build(archive_path, format!("archive unreadable: {}", e))
        })?;
        debug!("Read {} bytes from {}", body.len(), archive_path.display());

        Ok(Self {
            filename: filename.to_string(),
            content_type: ARCHIVE_CONTENT_TYPE,
            body,
        })
    }

    pub fn content_disposition(&self) -> String {
        format!("attachment; filename={}", self.filename)
    }

    /// Header pairs for an HTTP response
    pub fn headers(&self) -> Vec<(&'static str, String)> {
        vec![
            ("Content-Type", self.content_type.to_string()),
            ("Content-Disposition", self.content_disposition()),
            ("Content-Length", self.body.len().to_string()),
        ]
    }

    pub fn len(&self) -> usize {
        self.body.len()
    }

    pub fn is_empty(&self) -> bool {
        self.body.is_empty()
    }
}
