use crate::models::{Frequency, Quality, Retrieval, Selection};
use crate::utils::constants::FILE_ENDINGS;
use std::collections::HashSet;
use tracing::warn;

/// Expands a selection into candidate data file names,
/// `{site}_{frequencyPrefix}.{extension}`, keeping only recognized endings.
pub struct FileSelector {
    endings: HashSet<String>,
}

impl FileSelector {
    pub fn new() -> Self {
        Self::with_endings(FILE_ENDINGS.iter().copied())
    }

    pub fn with_endings<'a>(endings: impl IntoIterator<Item = &'a str>) -> Self {
        Self {
            endings: endings.into_iter().map(str::to_string).collect(),
        }
    }

    /// Candidates ordered by retrieval, site, frequency, then quality.
    /// Duplicated inputs produce duplicated candidates.
    pub fn select(&self, selection: &Selection) -> Vec<String> {
        let mut candidates = Vec::new();

        for retrieval_label in &selection.retrievals {
            let Some(retrieval) = Retrieval::from_label(retrieval_label) else {
                warn!("Retrieval '{}' not in quality map", retrieval_label);
                continue;
            };

            for site in &selection.sites {
                for frequency in &selection.frequencies {
                    let Some(prefix) = Frequency::from_label(frequency).map(|f| f.file_prefix())
                    else {
                        continue;
                    };

                    for quality in &selection.qualities {
                        let Some(quality) = Quality::from_label(quality) else {
                            continue;
                        };

                        let ending = format!("{}.{}", prefix, retrieval.extension(quality));
                        if self.endings.contains(&ending) {
                            candidates.push(format!("{}_{}", site, ending));
                        }
                    }
                }
            }
        }

        candidates
    }
}

impl Default for FileSelector {
    fn default() -> Self {
        Self::new()
    }
}
