use crate::archive::WorkingDirectory;
use crate::error::{ExportError, Result};
use crate::models::Retrieval;
use crate::utils::filename::is_safe_site_name;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// What the materializer put into a working directory
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StagingReport {
    pub copied: BTreeMap<Retrieval, Vec<PathBuf>>,
    pub missing: usize,
    pub rejected: usize,
    pub policy_documents: Vec<PathBuf>,
}

impl StagingReport {
    pub fn files_copied(&self) -> usize {
        self.copied.values().map(Vec::len).sum()
    }

    pub fn data_files(&self) -> Vec<PathBuf> {
        self.copied.values().flatten().cloned().collect()
    }
}

/// Copies selected data files and policy documents from the read-only source
/// tree into a working directory.
pub struct StagingMaterializer {
    source_root: PathBuf,
    policy_documents: Vec<String>,
}

impl StagingMaterializer {
    pub fn new(source_root: impl Into<PathBuf>) -> Self {
        Self {
            source_root: source_root.into(),
            policy_documents: Vec::new(),
        }
    }

    pub fn with_policy_documents(mut self, documents: &[String]) -> Self {
        self.policy_documents = documents.to_vec();
        self
    }

    pub fn source_root(&self) -> &Path {
        &self.source_root
    }

    /// Stage every candidate that exists under `{source}/{retrieval}/` into the
    /// matching subdirectory of `workdir`, then copy the policy documents.
    pub fn materialize(
        &self,
        workdir: &WorkingDirectory,
        retrievals: &[Retrieval],
        candidates: &[String],
    ) -> Result<StagingReport> {
        let mut report = StagingReport::default();

        let candidates: Vec<&String> = candidates
            .iter()
            .filter(|candidate| {
                let safe = is_safe_candidate(candidate);
                if !safe {
                    warn!("Rejecting candidate file name '{}'", candidate);
                    report.rejected += 1;
                }
                safe
            })
            .collect();

        for retrieval in retrievals {
            let target_dir = workdir.subdir(retrieval.dir_name())?;
            let source_dir = self.source_root.join(retrieval.dir_name());
            let staged = report.copied.entry(*retrieval).or_default();

            for candidate in &candidates {
                // A candidate belongs to the retrieval its extension names
                if Retrieval::for_file_name(candidate) != Some(*retrieval) {
                    continue;
                }

                let source = source_dir.join(candidate);
                if !source.is_file() {
                    debug!("{}", ExportError::MissingSourceFile { path: source });
                    report.missing += 1;
                    continue;
                }

                let target = target_dir.join(candidate);
                if target.exists() {
                    continue;
                }
                std::fs::copy(&source, &target)?;
                staged.push(target);
            }
        }

        for document in &self.policy_documents {
            if let Some(copied) = self.copy_policy_document(workdir, document)? {
                report.policy_documents.push(copied);
            }
        }

        info!(
            "Staged {} files into {} ({} not in source, {} policy documents)",
            report.files_copied(),
            workdir.name(),
            report.missing,
            report.policy_documents.len()
        );

        Ok(report)
    }

    fn copy_policy_document(
        &self,
        workdir: &WorkingDirectory,
        document: &str,
    ) -> Result<Option<PathBuf>> {
        let source = self.source_root.join(document);
        let target = workdir.path().join(document);

        if !source.is_file() {
            warn!("Policy document {} does not exist", source.display());
            return Ok(None);
        }

        if let Some(parent) = target.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::copy(&source, &target)?;
        debug!("Copied {} to {}", source.display(), target.display());

        Ok(Some(target))
    }
}

fn is_safe_candidate(candidate: &str) -> bool {
    match candidate.rsplit_once('_') {
        Some((site, _)) => is_safe_site_name(site) && !candidate.contains(['/', '\\']),
        None => false,
    }
}
