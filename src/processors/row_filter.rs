use crate::error::{ExportError, Result};
use crate::models::{DataRow, FilterBounds};
use crate::readers::DataFileReader;
use crate::writers::DataFileWriter;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, warn};

/// What to do with a file when no row survives the filter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EmptyResultPolicy {
    /// Leave the file exactly as staged, so it ships unfiltered
    #[default]
    KeepOriginal,
    /// Rewrite the file with its header and column row only
    HeaderOnly,
}

impl std::str::FromStr for EmptyResultPolicy {
    type Err = ExportError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "keep-original" => Ok(EmptyResultPolicy::KeepOriginal),
            "header-only" => Ok(EmptyResultPolicy::HeaderOnly),
            other => Err(ExportError::Config(format!(
                "unknown empty_result policy '{}' (expected keep-original or header-only)",
                other
            ))),
        }
    }
}

/// Result of filtering one staged file
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileOutcome {
    /// File rewritten with `kept` of `total` rows
    Filtered { kept: usize, total: usize },
    /// No row matched; file left as staged
    KeptOriginal { total: usize },
    /// No row matched; file reduced to its header
    HeaderOnly { total: usize },
    /// File could not be filtered and was left unmodified
    Failed { message: String },
    /// Cancelled before the file was opened
    Skipped,
}

/// Date and bounding-box row filter for MAN data files
#[derive(Debug, Clone, Copy)]
pub struct RowFilter {
    bounds: FilterBounds,
    empty_result: EmptyResultPolicy,
}

impl RowFilter {
    pub fn new(bounds: FilterBounds) -> Self {
        Self {
            bounds,
            empty_result: EmptyResultPolicy::default(),
        }
    }

    pub fn with_empty_result(mut self, empty_result: EmptyResultPolicy) -> Self {
        self.empty_result = empty_result;
        self
    }

    pub fn bounds(&self) -> &FilterBounds {
        &self.bounds
    }

    /// A row passes when it satisfies every active constraint. A missing value
    /// never satisfies a constraint on its field.
    pub fn matches(&self, row: &DataRow) -> bool {
        let b = &self.bounds;
        at_least(row.date, b.start)
            && at_most(row.date, b.end)
            && at_least(row.latitude, b.min_lat)
            && at_most(row.latitude, b.max_lat)
            && at_least(row.longitude, b.min_lng)
            && at_most(row.longitude, b.max_lng)
    }

    /// Filter one file in place. Never returns an error: failures are logged
    /// and reported as [`FileOutcome::Failed`] with the file untouched.
    pub fn filter_file(&self, path: &Path) -> FileOutcome {
        match self.try_filter_file(path) {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!("Leaving {} unfiltered: {}", path.display(), e);
                FileOutcome::Failed {
                    message: e.to_string(),
                }
            }
        }
    }

    fn try_filter_file(&self, path: &Path) -> Result<FileOutcome> {
        let file = DataFileReader::new().read(path)?;

        if self.bounds.constrains_latitude() && file.layout.latitude.is_none() {
            return Err(ExportError::file_filter(path, "no Latitude column"));
        }
        if self.bounds.constrains_longitude() && file.layout.longitude.is_none() {
            return Err(ExportError::file_filter(path, "no Longitude column"));
        }
        if file.parse_failures > 0 {
            warn!(
                "{} rows in {} have an unparsable date or coordinate",
                file.parse_failures,
                path.display()
            );
        }

        let total = file.row_count();
        let kept: Vec<&DataRow> = file.rows.iter().filter(|row| self.matches(row)).collect();

        if kept.is_empty() {
            debug!("No rows of {} match the selection", path.display());
            return match self.empty_result {
                EmptyResultPolicy::KeepOriginal => Ok(FileOutcome::KeptOriginal { total }),
                EmptyResultPolicy::HeaderOnly => {
                    DataFileWriter::new().write_rows(path, &file, std::iter::empty())?;
                    Ok(FileOutcome::HeaderOnly { total })
                }
            };
        }

        let kept = DataFileWriter::new().write_rows(path, &file, kept)?;
        debug!("Kept {}/{} rows of {}", kept, total, path.display());

        Ok(FileOutcome::Filtered { kept, total })
    }
}

fn at_least<T: PartialOrd>(value: Option<T>, bound: Option<T>) -> bool {
    match (value, bound) {
        (_, None) => true,
        (Some(v), Some(b)) => v >= b,
        (None, Some(_)) => false,
    }
}

fn at_most<T: PartialOrd>(value: Option<T>, bound: Option<T>) -> bool {
    match (value, bound) {
        (_, None) => true,
        (Some(v), Some(b)) => v <= b,
        (None, Some(_)) => false,
    }
}
