use crate::error::{ExportError, Result};
use crate::utils::cancel::CancellationToken;
use flate2::write::GzEncoder;
use flate2::Compression;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, error, info};

/// Compresses a working directory into a single archive file
pub trait ArchiveBuilder: Send + Sync {
    /// Archive `source_dir` (rooted at its own directory name) into `archive_path`
    fn build(&self, source_dir: &Path, archive_path: &Path) -> Result<PathBuf>;
}

/// Gzip-compressed tar built in-process
pub struct TarGzBuilder {
    compression: Compression,
    cancel: CancellationToken,
}

impl TarGzBuilder {
    pub fn new() -> Self {
        Self {
            compression: Compression::default(),
            cancel: CancellationToken::new(),
        }
    }

    pub fn with_compression_level(mut self, level: u32) -> Self {
        self.compression = Compression::new(level.min(9));
        self
    }

    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    fn write_archive(&self, source_dir: &Path, archive_path: &Path) -> Result<()> {
        let root_name = source_dir
            .file_name()
            .ok_or_else(|| ExportError::archive_build(archive_path, "source has no directory name"))?;

        let file = File::create(archive_path)?;
        let encoder = GzEncoder::new(BufWriter::new(file), self.compression);
        let mut tar = tar::Builder::new(encoder);
        tar.follow_symlinks(false);

        let root = PathBuf::from(root_name);
        tar.append_dir(&root, source_dir)?;

        let mut entries = 0usize;
        let mut pending = vec![(source_dir.to_path_buf(), root)];
        while let Some((dir, archive_dir)) = pending.pop() {
            let mut children: Vec<PathBuf> = std::fs::read_dir(&dir)?
                .map(|entry| entry.map(|e| e.path()))
                .collect::<std::io::Result<_>>()?;
            children.sort();

            for child in children {
                self.cancel.check("archive build")?;

                let Some(name) = child.file_name() else {
                    continue;
                };
                let archive_name = archive_dir.join(name);

                if child.is_dir() {
                    tar.append_dir(&archive_name, &child)?;
                    pending.push((child, archive_name));
                } else {
                    tar.append_path_with_name(&child, &archive_name)?;
                    entries += 1;
                }
            }
        }

        let encoder = tar.into_inner()?;
        let mut writer = encoder.finish()?;
        writer.flush()?;

        debug!("Wrote {} files into {}", entries, archive_path.display());
        Ok(())
    }
}

impl Default for TarGzBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ArchiveBuilder for TarGzBuilder {
    fn build(&self, source_dir: &Path, archive_path: &Path) -> Result<PathBuf> {
        match self.write_archive(source_dir, archive_path) {
            Ok(()) => {
                info!("Created archive {}", archive_path.display());
                Ok(archive_path.to_path_buf())
            }
            Err(ExportError::Cancelled(reason)) => Err(ExportError::Cancelled(reason)),
            Err(e) => {
                error!("Archive build failed for {}: {}", source_dir.display(), e);
                Err(ExportError::archive_build(archive_path, e.to_string()))
            }
        }
    }
}
