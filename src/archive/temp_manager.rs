use crate::error::{ExportError, Result};
use crate::utils::filename::{archive_filename, generate_workdir_name};
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tracing::{debug, info, warn};

/// Per-request staging area.
///
/// Layout under the configured temp base:
///
/// ```text
/// {temp_base}/.man-export-XXXXXX/        scratch root, unique per request
///     {timestamp}_MAN_DATA/              working directory (archived)
///     {timestamp}_MAN_DATA.tar.gz        archive artifact
/// ```
///
/// The scratch root makes the timestamp-named directory unique even when two
/// requests start within the same second. Everything is removed by
/// [`WorkingDirectory::cleanup`] or, failing that, on drop.
pub struct WorkingDirectory {
    scratch: Option<TempDir>,
    name: String,
    path: PathBuf,
    archive_path: PathBuf,
}

impl WorkingDirectory {
    pub fn new(temp_base: &Path) -> Result<Self> {
        Self::with_name(temp_base, generate_workdir_name())
    }

    pub fn with_name(temp_base: &Path, name: String) -> Result<Self> {
        std::fs::create_dir_all(temp_base)?;

        let scratch = tempfile::Builder::new()
            .prefix(".man-export-")
            .tempdir_in(temp_base)
            .map_err(|e| {
                ExportError::Io(std::io::Error::new(
                    e.kind(),
                    format!(
                        "Failed to create staging directory in {}: {}",
                        temp_base.display(),
                        e
                    ),
                ))
            })?;

        let path = scratch.path().join(&name);
        std::fs::create_dir(&path)?;
        let archive_path = scratch.path().join(archive_filename(&name));

        debug!("Created working directory {}", path.display());

        Ok(Self {
            scratch: Some(scratch),
            name,
            path,
            archive_path,
        })
    }

    /// Unique `{timestamp}_MAN_DATA` name, also the archive's root folder
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn archive_path(&self) -> &Path {
        &self.archive_path
    }

    /// Directory holding both the working directory and the archive
    pub fn scratch_path(&self) -> Option<&Path> {
        self.scratch.as_ref().map(|s| s.path())
    }

    pub fn attachment_filename(&self) -> String {
        archive_filename(&self.name)
    }

    /// Create (if needed) and return a subdirectory of the working directory
    pub fn subdir(&self, name: &str) -> Result<PathBuf> {
        let dir = self.path.join(name);
        std::fs::create_dir_all(&dir)?;
        Ok(dir)
    }

    /// Remove the working directory and archive. Failures are logged and
    /// returned, never panicked on; calling twice is a no-op.
    pub fn cleanup(&mut self) -> Result<()> {
        let Some(scratch) = self.scratch.take() else {
            return Ok(());
        };

        let scratch_path = scratch.path().to_path_buf();
        match scratch.close() {
            Ok(()) => {
                info!("Removed working directory {} and its archive", self.name);
                Ok(())
            }
            Err(source) => {
                let error = ExportError::CleanupFailure {
                    path: scratch_path,
                    source,
                };
                warn!("{}", error);
                Err(error)
            }
        }
    }
}

impl Drop for WorkingDirectory {
    fn drop(&mut self) {
        // cleanup() already logged any failure
        let _ = self.cleanup();
    }
}
