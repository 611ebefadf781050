use crate::archive::{ArchiveBuilder, StagingMaterializer, StagingReport, TarGzBuilder, WorkingDirectory};
use crate::error::Result;
use crate::export::{ExportResponse, FileSelector, ParameterResolver};
use crate::models::{RawSelection, Retrieval, Selection};
use crate::processors::{FilterReport, ParallelProcessor, RowFilter};
use crate::settings::ExportSettings;
use crate::utils::cancel::CancellationToken;
use crate::utils::progress::ProgressReporter;
use std::time::Instant;
use tracing::{debug, info, warn};

/// What each stage did for one export
#[derive(Debug, Default)]
pub struct ExportSummary {
    pub candidates: usize,
    pub staging: StagingReport,
    /// `None` when the selection carried no date or latitude constraint
    pub filter: Option<FilterReport>,
    pub archive_bytes: usize,
    pub elapsed_ms: u128,
}

impl ExportSummary {
    pub fn summary(&self) -> String {
        let mut lines = vec![
            format!("Candidates: {}", self.candidates),
            format!(
                "Staged: {} data files ({} missing, {} rejected), {} policy documents",
                self.staging.files_copied(),
                self.staging.missing,
                self.staging.rejected,
                self.staging.policy_documents.len()
            ),
        ];
        match &self.filter {
            Some(report) => lines.push(report.summary()),
            None => lines.push("Filtering: skipped (no constraint)".to_string()),
        }
        lines.push(format!(
            "Archive: {} bytes in {} ms",
            self.archive_bytes, self.elapsed_ms
        ));
        lines.join("\n")
    }
}

/// Runs one export request end to end: resolve, select, stage, filter,
/// archive, then read the archive into a response.
///
/// The working directory is removed before `export` returns, whatever the
/// outcome.
pub struct ExportPipeline {
    settings: ExportSettings,
    resolver: ParameterResolver,
    selector: FileSelector,
    archive_builder: Option<Box<dyn ArchiveBuilder>>,
    cancel: CancellationToken,
}

impl ExportPipeline {
    pub fn new(settings: ExportSettings) -> Self {
        Self {
            settings,
            resolver: ParameterResolver::new(),
            selector: FileSelector::new(),
            archive_builder: None,
            cancel: CancellationToken::new(),
        }
    }

    pub fn with_resolver(mut self, resolver: ParameterResolver) -> Self {
        self.resolver = resolver;
        self
    }

    /// Replace the default tar.gz builder
    pub fn with_archive_builder(mut self, builder: Box<dyn ArchiveBuilder>) -> Self {
        self.archive_builder = Some(builder);
        self
    }

    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn settings(&self) -> &ExportSettings {
        &self.settings
    }

    /// Handle for cancelling an export running on another thread
    pub fn cancellation(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn export(
        &self,
        raw: RawSelection,
        progress: Option<&ProgressReporter>,
    ) -> Result<(ExportResponse, ExportSummary)> {
        let started = Instant::now();
        let cancel = self.cancel.with_deadline_from_now(self.settings.deadline());

        let selection = self.resolver.resolve(raw);
        let mut workdir = WorkingDirectory::new(&self.settings.temp_base)?;
        info!("Export started in {}", workdir.path().display());

        let result = self.run_stages(&selection, &workdir, &cancel, progress);

        // cleanup() logs its own failure
        if let Err(e) = workdir.cleanup() {
            debug!("Cleanup after export reported: {}", e);
        }

        let (response, mut summary) = result?;
        summary.elapsed_ms = started.elapsed().as_millis();
        info!(
            "Export {} ready ({} bytes, {} ms)",
            response.filename, summary.archive_bytes, summary.elapsed_ms
        );
        Ok((response, summary))
    }

    fn run_stages(
        &self,
        selection: &Selection,
        workdir: &WorkingDirectory,
        cancel: &CancellationToken,
        progress: Option<&ProgressReporter>,
    ) -> Result<(ExportResponse, ExportSummary)> {
        let candidates = self.selector.select(selection);
        info!(
            "Selected {} candidate files for {} sites",
            candidates.len(),
            selection.sites.len()
        );
        if candidates.is_empty() {
            warn!("Selection produced no candidate files; archive will hold policy documents only");
        }

        if let Some(p) = progress {
            p.set_message("Staging files...");
        }
        let retrievals = selection.recognized_retrievals();
        let staging = StagingMaterializer::new(&self.settings.source_root)
            .with_policy_documents(&self.settings.policy_documents)
            .materialize(workdir, &retrievals, &candidates)?;
        cancel.check("staging")?;

        let filter = if selection.requires_filtering() {
            let bounds = selection.filter_bounds()?;
            let dirs: Vec<&str> = retrievals.iter().map(Retrieval::dir_name).collect();
            let files = ParallelProcessor::collect_data_files(workdir.path(), &dirs)?;

            if let Some(p) = progress {
                p.set_message("Filtering rows...");
            }
            let row_filter = RowFilter::new(bounds).with_empty_result(self.settings.empty_result);
            let report = ParallelProcessor::new(self.settings.max_workers)
                .with_cancellation(cancel.clone())
                .process_files(&files, &row_filter, progress)?;
            cancel.check("row filtering")?;
            Some(report)
        } else {
            debug!("No date or latitude constraint; files left untouched");
            None
        };

        if let Some(p) = progress {
            p.set_message("Building archive...");
        }
        let archive_path = match &self.archive_builder {
            Some(builder) => builder.build(workdir.path(), workdir.archive_path())?,
            None => TarGzBuilder::new()
                .with_cancellation(cancel.clone())
                .build(workdir.path(), workdir.archive_path())?,
        };

        let response = ExportResponse::from_archive(&archive_path, &workdir.attachment_filename())?;
        let summary = ExportSummary {
            candidates: candidates.len(),
            staging,
            filter,
            archive_bytes: response.len(),
            elapsed_ms: 0,
        };
        Ok((response, summary))
    }
}
