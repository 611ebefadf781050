use crate::error::{ExportError, Result};
use crate::processors::{FileOutcome, RowFilter};
use crate::utils::cancel::CancellationToken;
use crate::utils::constants::DEFAULT_MAX_WORKERS;
use crate::utils::progress::ProgressReporter;
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Tally of a parallel filtering pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterReport {
    pub files_filtered: usize,
    pub files_kept_original: usize,
    pub files_header_only: usize,
    pub files_failed: usize,
    pub files_skipped: usize,
    pub rows_total: usize,
    pub rows_kept: usize,
    pub failures: Vec<(PathBuf, String)>,
}

impl FilterReport {
    fn record(&mut self, path: &Path, outcome: FileOutcome) {
        match outcome {
            FileOutcome::Filtered { kept, total } => {
                self.files_filtered += 1;
                self.rows_kept += kept;
                self.rows_total += total;
            }
            FileOutcome::KeptOriginal { total } => {
                self.files_kept_original += 1;
                self.rows_total += total;
            }
            FileOutcome::HeaderOnly { total } => {
                self.files_header_only += 1;
                self.rows_total += total;
            }
            FileOutcome::Failed { message } => {
                self.files_failed += 1;
                self.failures.push((path.to_path_buf(), message));
            }
            FileOutcome::Skipped => self.files_skipped += 1,
        }
    }

    pub fn files_seen(&self) -> usize {
        self.files_filtered
            + self.files_kept_original
            + self.files_header_only
            + self.files_failed
            + self.files_skipped
    }

    pub fn summary(&self) -> String {
        format!(
            "{} files filtered ({} of {} rows kept), {} left unfiltered (no match), {} header-only, {} failed, {} skipped",
            self.files_filtered,
            self.rows_kept,
            self.rows_total,
            self.files_kept_original,
            self.files_header_only,
            self.files_failed,
            self.files_skipped
        )
    }
}

/// Runs the row filter over staged files on a fixed-width worker pool.
///
/// Each file is an independent task owning its path; a failing file never
/// stops its siblings. `process_files` returns only after every task finished.
pub struct ParallelProcessor {
    max_workers: usize,
    cancel: CancellationToken,
}

impl ParallelProcessor {
    pub fn new(max_workers: usize) -> Self {
        Self {
            max_workers: max_workers.max(1),
            cancel: CancellationToken::new(),
        }
    }

    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn max_workers(&self) -> usize {
        self.max_workers
    }

    pub fn process_files(
        &self,
        files: &[PathBuf],
        filter: &RowFilter,
        progress: Option<&ProgressReporter>,
    ) -> Result<FilterReport> {
        if let Some(p) = progress {
            p.set_length(files.len() as u64);
            p.set_message(&format!("Filtering {} files...", files.len()));
        }

        // Configure Rayon thread pool
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.max_workers)
            .thread_name(|i| format!("row-filter-{}", i))
            .build()
            .map_err(|e| ExportError::Config(e.to_string()))?;

        let outcomes: Vec<FileOutcome> = pool.install(|| {
            files
                .par_iter()
                .map(|path| {
                    let outcome = if self.cancel.is_cancelled() {
                        debug!("Skipping {} after cancellation", path.display());
                        FileOutcome::Skipped
                    } else {
                        filter.filter_file(path)
                    };

                    if let Some(p) = progress {
                        p.increment(1);
                    }
                    outcome
                })
                .collect()
        });

        let mut report = FilterReport::default();
        for (path, outcome) in files.iter().zip(outcomes) {
            report.record(path, outcome);
        }

        if report.files_failed > 0 {
            warn!("{} of {} files could not be filtered", report.files_failed, files.len());
        }
        info!("Row filter: {}", report.summary());

        Ok(report)
    }

    /// Data files under the per-retrieval subdirectories of a working directory
    pub fn collect_data_files(workdir: &Path, retrieval_dirs: &[&str]) -> Result<Vec<PathBuf>> {
        let mut files = Vec::new();

        for dir_name in retrieval_dirs {
            let dir = workdir.join(dir_name);
            if !dir.is_dir() {
                warn!("Retrieval directory {} is missing", dir.display());
                continue;
            }

            for entry in std::fs::read_dir(&dir)? {
                let path = entry?.path();
                if path.is_file() {
                    files.push(path);
                }
            }
        }

        files.sort();
        Ok(files)
    }
}

impl Default for ParallelProcessor {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_WORKERS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::FilterBounds;
    use chrono::NaiveDate;
    use tempfile::TempDir;

    const HEADER: &str = "h1\nh2\nh3\nh4\nDate(dd:mm:yyyy),Latitude,Longitude,AOD_500nm\n";

    fn write_file(dir: &Path, name: &str, rows: &[&str]) -> PathBuf {
        let path = dir.join(name);
        let mut content = HEADER.to_string();
        for row in rows {
            content.push_str(row);
            content.push('\n');
        }
        std::fs::write(&path, content).unwrap();
        path
    }

    fn june_filter() -> RowFilter {
        RowFilter::new(FilterBounds {
            start: NaiveDate::from_ymd_opt(2018, 6, 1),
            end: NaiveDate::from_ymd_opt(2018, 6, 30),
            ..FilterBounds::default()
        })
    }

    #[test]
    fn test_failures_are_isolated() {
        let dir = TempDir::new().unwrap();
        let good = write_file(
            dir.path(),
            "A_daily.lev15",
            &["01:05:2018,1,1,0.1", "10:06:2018,1,1,0.2"],
        );
        let broken = dir.path().join("B_daily.lev15");
        std::fs::write(&broken, "not enough lines\n").unwrap();
        let unmatched = write_file(dir.path(), "C_daily.lev15", &["01:01:2010,1,1,0.1"]);

        let processor = ParallelProcessor::new(4);
        let report = processor
            .process_files(&[good.clone(), broken, unmatched], &june_filter(), None)
            .unwrap();

        assert_eq!(report.files_filtered, 1);
        assert_eq!(report.files_failed, 1);
        assert_eq!(report.files_kept_original, 1);
        assert_eq!(report.rows_kept, 1);
        assert_eq!(report.rows_total, 3);
        assert_eq!(report.files_seen(), 3);

        let content = std::fs::read_to_string(&good).unwrap();
        assert!(content.ends_with("10:06:2018,1,1,0.2\n"));
    }

    #[test]
    fn test_cancelled_pool_skips_files() {
        let dir = TempDir::new().unwrap();
        let path = write_file(dir.path(), "A_daily.lev15", &["01:05:2018,1,1,0.1"]);
        let before = std::fs::read_to_string(&path).unwrap();

        let cancel = CancellationToken::new();
        cancel.cancel();
        let processor = ParallelProcessor::new(2).with_cancellation(cancel);
        let report = processor
            .process_files(&[path.clone()], &june_filter(), None)
            .unwrap();

        assert_eq!(report.files_skipped, 1);
        assert_eq!(std::fs::read_to_string(&path).unwrap(), before);
    }

    #[test]
    fn test_collect_data_files() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir(dir.path().join("AOD")).unwrap();
        std::fs::create_dir(dir.path().join("SDA")).unwrap();
        write_file(&dir.path().join("AOD"), "X_daily.lev15", &[]);
        write_file(&dir.path().join("SDA"), "X_daily.ONEILL_15", &[]);
        std::fs::write(dir.path().join("data_usage_policy.txt"), "policy").unwrap();

        let files = ParallelProcessor::collect_data_files(dir.path(), &["AOD", "SDA", "XYZ"]).unwrap();
        assert_eq!(files.len(), 2);
        assert!(files.iter().all(|f| !f.ends_with("data_usage_policy.txt")));
    }

    #[test]
    fn test_worker_count_is_at_least_one() {
        assert_eq!(ParallelProcessor::new(0).max_workers(), 1);
        assert_eq!(ParallelProcessor::default().max_workers(), 4);
    }
}
