use crate::error::Result;
use crate::models::{DataFile, DataRow};
use crate::utils::constants::DEFAULT_BUFFER_SIZE;
use csv::WriterBuilder;
use std::io::{BufWriter, Write};
use std::path::Path;
use tempfile::NamedTempFile;

/// Rewrites MAN data files in place. The replacement is written next to the
/// original and renamed over it, so a failed write leaves the original intact.
pub struct DataFileWriter;

impl DataFileWriter {
    pub fn new() -> Self {
        Self
    }

    /// Write `file`'s preamble followed by `rows` to `path`
    pub fn write_rows<'a, I>(&self, path: &Path, file: &DataFile, rows: I) -> Result<usize>
    where
        I: IntoIterator<Item = &'a DataRow>,
    {
        let dir = path.parent().unwrap_or_else(|| Path::new("."));
        let staged = NamedTempFile::new_in(dir)?;

        let written = {
            let mut writer = BufWriter::with_capacity(DEFAULT_BUFFER_SIZE, staged.as_file());
            writer.write_all(&file.header)?;
            writer.write_all(&file.column_row)?;
            if !file.column_row.ends_with(b"\n") && !file.column_row.is_empty() {
                writer.write_all(file.line_ending.as_bytes())?;
            }

            let mut csv_writer = WriterBuilder::new()
                .has_headers(false)
                .flexible(true)
                .terminator(file.line_ending.as_terminator())
                .from_writer(&mut writer);

            let mut written = 0;
            for row in rows {
                csv_writer.write_byte_record(&row.record)?;
                written += 1;
            }
            csv_writer.flush()?;
            drop(csv_writer);
            writer.flush()?;
            written
        };

        if let Ok(metadata) = std::fs::metadata(path) {
            std::fs::set_permissions(staged.path(), metadata.permissions())?;
        }
        staged.persist(path).map_err(|e| e.error)?;

        Ok(written)
    }
}

impl Default for DataFileWriter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::readers::DataFileReader;
    use tempfile::TempDir;

    const SAMPLE: &str = "header one\nheader two\nheader three\nheader four\n\
        Date(dd:mm:yyyy),Site,Latitude,Longitude\n\
        01:01:2019,\"Ship, Outbound\",10.0,20.0\n\
        02:01:2019,Ship,11.0,21.0\n";

    #[test]
    fn test_rewrite_keeps_preamble_and_original_fields() -> Result<()> {
        let dir = TempDir::new()?;
        let path = dir.path().join("Ship_daily.lev15");
        std::fs::write(&path, SAMPLE)?;

        let file = DataFileReader::new().read(&path)?;
        let written = DataFileWriter::new().write_rows(&path, &file, file.rows.iter().take(1))?;
        assert_eq!(written, 1);

        let content = std::fs::read_to_string(&path)?;
        assert_eq!(
            content,
            "header one\nheader two\nheader three\nheader four\n\
             Date(dd:mm:yyyy),Site,Latitude,Longitude\n\
             01:01:2019,\"Ship, Outbound\",10.0,20.0\n"
        );
        Ok(())
    }

    #[test]
    fn test_rewrite_preserves_crlf() -> Result<()> {
        let dir = TempDir::new()?;
        let path = dir.path().join("Ship_series.lev20");
        std::fs::write(&path, SAMPLE.replace('\n', "\r\n"))?;

        let file = DataFileReader::new().read(&path)?;
        DataFileWriter::new().write_rows(&path, &file, file.rows.iter().skip(1))?;

        let content = std::fs::read_to_string(&path)?;
        assert!(content.ends_with("Longitude\r\n02:01:2019,Ship,11.0,21.0\r\n"));
        Ok(())
    }

    #[test]
    fn test_no_stray_temp_files() -> Result<()> {
        let dir = TempDir::new()?;
        let path = dir.path().join("Ship_daily.lev15");
        std::fs::write(&path, SAMPLE)?;

        let file = DataFileReader::new().read(&path)?;
        DataFileWriter::new().write_rows(&path, &file, file.rows.iter())?;

        let entries = std::fs::read_dir(dir.path())?.count();
        assert_eq!(entries, 1);
        Ok(())
    }
}
