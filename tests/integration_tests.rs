use chrono::NaiveDate;
use flate2::read::GzDecoder;
use man_export::archive::{ArchiveBuilder, StagingMaterializer, WorkingDirectory};
use man_export::export::{ExportPipeline, ExportResponse, FileSelector, ParameterResolver};
use man_export::models::{FilterBounds, RawSelection, Retrieval};
use man_export::processors::{FileOutcome, RowFilter};
use man_export::{ExportError, ExportSettings, Result};
use pretty_assertions::assert_eq;
use std::collections::BTreeMap;
use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

const HEADER: &str = "AERONET Version 3; Maritime Aerosol Network (MAN)\n\
Polarstern cruise 2020\n\
PI=A. Smirnov; Contact=alexander.smirnov-1@nasa.gov\n\
Level 1.5: cloud screened\n\
Date(dd:mm:yyyy),Time(hh:mm:ss),Air Mass,Latitude,Longitude,AOD_500nm\n";

const ROWS: [&str; 4] = [
    "28:02:2020,10:12:00,1.2,-20.5,10.0,0.081",
    "01:06:2020,11:00:00,1.1,5.25,-30.0,0.120",
    "15:07:2020,12:30:00,1.4,40.0,-25.5,0.210",
    "02:01:2021,09:45:00,1.3,61.0,5.0,0.050",
];

fn data_file(rows: &[&str]) -> String {
    let mut content = HEADER.to_string();
    for row in rows {
        content.push_str(row);
        content.push('\n');
    }
    content
}

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 5, 20).unwrap()
}

struct SourceTree {
    _root: TempDir,
    settings: ExportSettings,
}

impl SourceTree {
    fn new() -> Self {
        let root = TempDir::new().unwrap();
        let source = root.path().join("src");
        fs::create_dir_all(source.join("AOD")).unwrap();
        fs::create_dir_all(source.join("SDA")).unwrap();

        fs::write(source.join("AOD/Polarstern_20_daily.lev15"), data_file(&ROWS)).unwrap();
        fs::write(source.join("AOD/Polarstern_20_all_points.lev15"), data_file(&ROWS)).unwrap();
        fs::write(source.join("SDA/Polarstern_20_daily.ONEILL_15"), data_file(&ROWS)).unwrap();
        fs::write(source.join("data_usage_policy.pdf"), "%PDF-1.4 policy").unwrap();
        fs::write(source.join("data_usage_policy.txt"), "Use with attribution.\n").unwrap();

        let settings = ExportSettings {
            source_root: source,
            temp_base: root.path().join("temp"),
            ..ExportSettings::default()
        };
        Self {
            _root: root,
            settings,
        }
    }

    fn source(&self, relative: &str) -> String {
        fs::read_to_string(self.settings.source_root.join(relative)).unwrap()
    }

    fn pipeline(&self) -> ExportPipeline {
        ExportPipeline::new(self.settings.clone()).with_resolver(ParameterResolver::with_today(today()))
    }

    fn temp_base_is_empty(&self) -> bool {
        fs::read_dir(&self.settings.temp_base)
            .map(|mut entries| entries.next().is_none())
            .unwrap_or(true)
    }
}

fn selection(start: Option<&str>, end: Option<&str>) -> RawSelection {
    RawSelection {
        sites: vec!["Polarstern_20".to_string()],
        start_date: start.map(str::to_string),
        end_date: end.map(str::to_string),
        retrievals: vec!["AOD".to_string(), "SDA".to_string()],
        frequencies: vec!["Daily".to_string()],
        qualities: vec!["Level 1.5".to_string()],
        ..RawSelection::default()
    }
}

/// Archive entries keyed by path; directories map to `None`
fn unpack(response: &ExportResponse) -> BTreeMap<String, Option<String>> {
    let mut archive = tar::Archive::new(GzDecoder::new(response.body.as_slice()));
    let mut entries = BTreeMap::new();
    for entry in archive.entries().unwrap() {
        let mut entry = entry.unwrap();
        let name = entry
            .path()
            .unwrap()
            .to_string_lossy()
            .trim_end_matches('/')
            .to_string();
        let content = if entry.header().entry_type().is_dir() {
            None
        } else {
            let mut text = String::new();
            entry.read_to_string(&mut text).unwrap();
            Some(text)
        };
        entries.insert(name, content);
    }
    entries
}

fn root_name(response: &ExportResponse) -> String {
    response
        .filename
        .strip_suffix(".tar.gz")
        .unwrap()
        .to_string()
}

#[test]
fn test_export_filters_rows_by_date_range() -> Result<()> {
    let tree = SourceTree::new();
    let (response, summary) = tree
        .pipeline()
        .export(selection(Some("2020-05-01"), Some("2020-12-31")), None)?;

    assert_eq!(response.content_type, "application/gzip");
    assert!(response.filename.ends_with("_MAN_DATA.tar.gz"));

    let report = summary.filter.expect("date range should trigger filtering");
    assert_eq!(report.files_filtered, 2);
    assert_eq!(report.rows_total, 8);
    assert_eq!(report.rows_kept, 4);

    let root = root_name(&response);
    let entries = unpack(&response);
    let expected = Some(data_file(&ROWS[1..3]));
    assert_eq!(entries[&format!("{}/AOD/Polarstern_20_daily.lev15", root)], expected);
    assert_eq!(entries[&format!("{}/SDA/Polarstern_20_daily.ONEILL_15", root)], expected);
    assert!(entries.contains_key(&format!("{}/data_usage_policy.pdf", root)));
    assert!(entries.contains_key(&format!("{}/data_usage_policy.txt", root)));
    assert!(!entries.keys().any(|k| k.contains("all_points")));

    assert!(tree.temp_base_is_empty());
    Ok(())
}

#[test]
fn test_epoch_start_and_today_end_leave_files_byte_identical() -> Result<()> {
    let tree = SourceTree::new();
    let (response, summary) = tree
        .pipeline()
        .export(selection(Some("2004-10-16"), Some("2024-05-20")), None)?;

    assert!(summary.filter.is_none());

    let root = root_name(&response);
    let entries = unpack(&response);
    assert_eq!(
        entries[&format!("{}/AOD/Polarstern_20_daily.lev15", root)],
        Some(tree.source("AOD/Polarstern_20_daily.lev15"))
    );
    assert_eq!(
        entries[&format!("{}/SDA/Polarstern_20_daily.ONEILL_15", root)],
        Some(tree.source("SDA/Polarstern_20_daily.ONEILL_15"))
    );
    assert!(tree.temp_base_is_empty());
    Ok(())
}

#[test]
fn test_latitude_bound_without_dates_filters() -> Result<()> {
    let tree = SourceTree::new();
    let mut raw = selection(None, None);
    raw.retrievals = vec!["AOD".to_string()];
    raw.bounds.min_lat = Some("0".to_string());
    raw.bounds.max_lat = Some("45".to_string());

    let (response, _) = tree.pipeline().export(raw, None)?;
    let entries = unpack(&response);
    let root = root_name(&response);

    assert_eq!(
        entries[&format!("{}/AOD/Polarstern_20_daily.lev15", root)],
        Some(data_file(&ROWS[1..3]))
    );
    assert!(!entries.contains_key(&format!("{}/SDA", root)));
    Ok(())
}

#[test]
fn test_longitude_only_bound_does_not_trigger_filtering() -> Result<()> {
    let tree = SourceTree::new();
    let mut raw = selection(None, None);
    raw.bounds.min_lng = Some("0".to_string());

    let (_, summary) = tree.pipeline().export(raw, None)?;
    assert!(summary.filter.is_none());
    Ok(())
}

#[test]
fn test_invalid_bounding_box_is_rejected_and_cleaned_up() {
    let tree = SourceTree::new();
    let mut raw = selection(Some("2020-01-01"), None);
    raw.bounds.max_lng = Some("east".to_string());

    let err = tree.pipeline().export(raw, None).unwrap_err();
    assert!(err.is_client_error(), "{}", err);
    assert!(tree.temp_base_is_empty());
}

#[test]
fn test_malformed_date_is_rejected() {
    let tree = SourceTree::new();
    let err = tree
        .pipeline()
        .export(selection(Some("20/05/2020"), None), None)
        .unwrap_err();
    assert!(matches!(err, ExportError::InvalidParameter { .. }));
    assert!(tree.temp_base_is_empty());
}

struct BrokenArchiver;

impl ArchiveBuilder for BrokenArchiver {
    fn build(&self, source_dir: &Path, archive_path: &Path) -> Result<PathBuf> {
        // Leave a partial artifact behind, as a crashed tar would
        assert!(source_dir.is_dir());
        fs::write(archive_path, b"\x1f\x8b partial")?;
        Err(ExportError::archive_build(archive_path, "simulated failure"))
    }
}

#[test]
fn test_archive_failure_still_cleans_up() {
    let tree = SourceTree::new();
    let pipeline = tree.pipeline().with_archive_builder(Box::new(BrokenArchiver));

    let result = pipeline.export(selection(Some("2020-05-01"), None), None);
    assert!(matches!(result, Err(ExportError::ArchiveBuildFailure { .. })));
    assert!(tree.temp_base_is_empty());
}

#[test]
fn test_empty_selection_ships_policy_documents_only() -> Result<()> {
    let tree = SourceTree::new();
    let mut raw = selection(None, None);
    raw.frequencies.clear();

    let (response, summary) = tree.pipeline().export(raw, None)?;
    assert_eq!(summary.candidates, 0);

    let root = root_name(&response);
    let files: Vec<String> = unpack(&response)
        .into_iter()
        .filter(|(_, content)| content.is_some())
        .map(|(name, _)| name)
        .collect();
    assert_eq!(
        files,
        vec![
            format!("{}/data_usage_policy.pdf", root),
            format!("{}/data_usage_policy.txt", root),
        ]
    );
    Ok(())
}

#[test]
fn test_materializer_copies_exactly_the_existing_candidates() -> Result<()> {
    let tree = SourceTree::new();
    let raw = RawSelection {
        sites: vec!["Polarstern_20".to_string(), "Akademik_19".to_string()],
        retrievals: vec!["AOD".to_string(), "SDA".to_string()],
        frequencies: vec!["Daily".to_string(), "Point".to_string(), "Series".to_string()],
        qualities: vec!["Level 1.5".to_string()],
        ..RawSelection::default()
    };
    let selection = ParameterResolver::with_today(today()).resolve(raw);
    let candidates = FileSelector::new().select(&selection);
    assert_eq!(candidates.len(), 12);

    let workdir = WorkingDirectory::new(&tree.settings.temp_base)?;
    let report = StagingMaterializer::new(&tree.settings.source_root).materialize(
        &workdir,
        &selection.recognized_retrievals(),
        &candidates,
    )?;

    for retrieval in [Retrieval::Aod, Retrieval::Sda] {
        let expected: Vec<&String> = candidates
            .iter()
            .filter(|c| Retrieval::for_file_name(c) == Some(retrieval))
            .filter(|c| {
                tree.settings
                    .source_root
                    .join(retrieval.dir_name())
                    .join(c.as_str())
                    .is_file()
            })
            .collect();

        let mut staged: Vec<String> = fs::read_dir(workdir.path().join(retrieval.dir_name()))?
            .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
            .collect();
        staged.sort();
        let mut expected: Vec<String> = expected.into_iter().cloned().collect();
        expected.sort();

        assert_eq!(staged, expected, "{}", retrieval);
    }
    assert_eq!(report.files_copied(), 3);
    assert_eq!(report.missing, 9);
    Ok(())
}

#[test]
fn test_filtering_is_idempotent_and_preserves_header() -> Result<()> {
    let dir = TempDir::new()?;
    let path = dir.path().join("Polarstern_20_daily.lev15");
    fs::write(&path, data_file(&ROWS))?;

    let filter = RowFilter::new(FilterBounds {
        start: NaiveDate::from_ymd_opt(2020, 3, 1),
        min_lat: Some(0.0),
        ..FilterBounds::default()
    });

    assert_eq!(filter.filter_file(&path), FileOutcome::Filtered { kept: 3, total: 4 });
    let once = fs::read_to_string(&path)?;
    assert!(once.starts_with(HEADER));
    assert_eq!(once, data_file(&ROWS[1..]));

    assert_eq!(filter.filter_file(&path), FileOutcome::Filtered { kept: 3, total: 3 });
    assert_eq!(fs::read_to_string(&path)?, once);
    Ok(())
}

#[test]
fn test_crlf_files_keep_their_line_endings() -> Result<()> {
    let dir = TempDir::new()?;
    let path = dir.path().join("Polarstern_20_daily.lev15");
    let content = data_file(&ROWS).replace('\n', "\r\n");
    fs::write(&path, &content)?;

    let filter = RowFilter::new(FilterBounds {
        end: NaiveDate::from_ymd_opt(2020, 6, 1),
        ..FilterBounds::default()
    });
    assert_eq!(filter.filter_file(&path), FileOutcome::Filtered { kept: 2, total: 4 });

    let expected = data_file(&ROWS[..2]).replace('\n', "\r\n");
    assert_eq!(fs::read_to_string(&path)?, expected);
    Ok(())
}
