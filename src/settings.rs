use crate::error::Result;
use crate::processors::EmptyResultPolicy;
use crate::utils::constants::{
    DEFAULT_DEADLINE_SECS, DEFAULT_MAX_WORKERS, DEFAULT_SOURCE_ROOT, DEFAULT_TEMP_BASE,
    POLICY_DOCUMENTS,
};
use ::config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use validator::Validate;

/// Export settings, layered as built-in defaults < config file < `MAN_EXPORT_*`
/// environment variables. CLI flags override the result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct ExportSettings {
    /// Root of the read-only source archive
    pub source_root: PathBuf,

    /// Directory under which per-request working directories are created
    pub temp_base: PathBuf,

    /// Files copied from the source root into every export
    pub policy_documents: Vec<String>,

    #[validate(range(min = 1, max = 64))]
    pub max_workers: usize,

    #[validate(range(min = 1))]
    pub deadline_secs: u64,

    pub empty_result: EmptyResultPolicy,
}

impl ExportSettings {
    pub fn load(config_file: Option<&Path>) -> Result<Self> {
        let mut builder = Config::builder()
            .set_default("source_root", DEFAULT_SOURCE_ROOT)?
            .set_default("temp_base", DEFAULT_TEMP_BASE)?
            .set_default("policy_documents", POLICY_DOCUMENTS.to_vec())?
            .set_default("max_workers", DEFAULT_MAX_WORKERS as i64)?
            .set_default("deadline_secs", DEFAULT_DEADLINE_SECS as i64)?
            .set_default("empty_result", "keep-original")?;

        if let Some(path) = config_file {
            builder = builder.add_source(File::from(path).required(true));
        }

        builder = builder.add_source(
            Environment::with_prefix("MAN_EXPORT")
                .try_parsing(true)
                .list_separator(",")
                .with_list_parse_key("policy_documents"),
        );

        let settings: ExportSettings = builder.build()?.try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn deadline(&self) -> Duration {
        Duration::from_secs(self.deadline_secs)
    }
}

impl Default for ExportSettings {
    fn default() -> Self {
        Self {
            source_root: PathBuf::from(DEFAULT_SOURCE_ROOT),
            temp_base: PathBuf::from(DEFAULT_TEMP_BASE),
            policy_documents: POLICY_DOCUMENTS.iter().map(|s| s.to_string()).collect(),
            max_workers: DEFAULT_MAX_WORKERS,
            deadline_secs: DEFAULT_DEADLINE_SECS,
            empty_result: EmptyResultPolicy::KeepOriginal,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults_validate() {
        let settings = ExportSettings::default();
        assert!(settings.validate().is_ok());
        assert_eq!(settings.max_workers, 4);
        assert_eq!(settings.deadline(), Duration::from_secs(300));
        assert_eq!(settings.policy_documents.len(), 2);
    }

    #[test]
    fn test_load_from_file() -> Result<()> {
        let dir = TempDir::new()?;
        let path = dir.path().join("export.toml");
        std::fs::write(
            &path,
            "source_root = \"/data/man\"\nmax_workers = 8\nempty_result = \"header-only\"\n",
        )?;

        let settings = ExportSettings::load(Some(&path))?;
        assert_eq!(settings.source_root, PathBuf::from("/data/man"));
        assert_eq!(settings.max_workers, 8);
        assert_eq!(settings.empty_result, EmptyResultPolicy::HeaderOnly);
        assert_eq!(settings.temp_base, PathBuf::from(DEFAULT_TEMP_BASE));
        Ok(())
    }

    #[test]
    fn test_invalid_worker_count_is_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("export.toml");
        std::fs::write(&path, "max_workers = 0\n").unwrap();

        assert!(ExportSettings::load(Some(&path)).is_err());
    }

    #[test]
    fn test_missing_config_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        assert!(ExportSettings::load(Some(&dir.path().join("absent.toml"))).is_err());
    }
}
