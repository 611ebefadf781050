use crate::error::{ExportError, Result};
use crate::models::{ColumnLayout, DataFile, DataRow, LineEnding};
use crate::utils::constants::{
    DATE_COLUMN, FILE_DATE_FORMAT, HEADER_LINE_COUNT, LATITUDE_COLUMN, LONGITUDE_COLUMN,
};
use crate::utils::coordinates::parse_cell;
use chrono::NaiveDate;
use csv::{ByteRecord, ReaderBuilder};
use std::path::Path;
use tracing::debug;

/// Reads MAN data files: a fixed disclaimer header, a column header row, then
/// comma-separated rows.
pub struct DataFileReader {
    header_lines: usize,
}

impl DataFileReader {
    pub fn new() -> Self {
        Self {
            header_lines: HEADER_LINE_COUNT,
        }
    }

    pub fn with_header_lines(header_lines: usize) -> Self {
        Self { header_lines }
    }

    pub fn read(&self, path: &Path) -> Result<DataFile> {
        let bytes = std::fs::read(path)?;
        self.parse(path, &bytes)
    }

    /// Split `bytes` into preamble and rows. `path` is only used for messages.
    pub fn parse(&self, path: &Path, bytes: &[u8]) -> Result<DataFile> {
        let header_end = nth_line_end(bytes, self.header_lines).ok_or_else(|| {
            ExportError::file_filter(
                path,
                format!("expected {} header lines", self.header_lines),
            )
        })?;

        let body = &bytes[header_end..];
        let column_row_end = nth_line_end(body, 1).unwrap_or(body.len());
        let column_row = &body[..column_row_end];
        if column_row.iter().all(u8::is_ascii_whitespace) {
            return Err(ExportError::file_filter(path, "missing column header row"));
        }

        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(body);

        let layout = locate_columns(reader.byte_headers()?);
        let date_index = layout
            .date
            .ok_or_else(|| ExportError::file_filter(path, format!("no '{}' column", DATE_COLUMN)))?;

        let mut rows = Vec::new();
        let mut parse_failures = 0;
        let mut record = ByteRecord::new();
        while reader.read_byte_record(&mut record)? {
            let date = record.get(date_index).and_then(parse_file_date);
            let latitude = layout.latitude.and_then(|i| record.get(i)).and_then(parse_cell);
            let longitude = layout.longitude.and_then(|i| record.get(i)).and_then(parse_cell);

            let bad_coordinate = (layout.latitude.is_some() && latitude.is_none())
                || (layout.longitude.is_some() && longitude.is_none());
            if date.is_none() || bad_coordinate {
                parse_failures += 1;
                let failure = ExportError::RowParseFailure {
                    path: path.to_path_buf(),
                    row: rows.len() + 1,
                    message: "unparsable date or coordinate, kept with empty value".to_string(),
                };
                debug!("{}", failure);
            }

            rows.push(DataRow {
                record: record.clone(),
                date,
                latitude,
                longitude,
            });
        }

        Ok(DataFile {
            header: bytes[..header_end].to_vec(),
            column_row: column_row.to_vec(),
            layout,
            line_ending: LineEnding::detect(column_row),
            rows,
            parse_failures,
        })
    }
}

impl Default for DataFileReader {
    fn default() -> Self {
        Self::new()
    }
}

/// Parse a `dd:mm:yyyy` date cell
pub fn parse_file_date(cell: &[u8]) -> Option<NaiveDate> {
    let text = std::str::from_utf8(cell).ok()?.trim();
    NaiveDate::parse_from_str(text, FILE_DATE_FORMAT).ok()
}

fn locate_columns(headers: &ByteRecord) -> ColumnLayout {
    let find = |name: &str| {
        headers
            .iter()
            .position(|h| std::str::from_utf8(h).map(str::trim) == Ok(name))
    };

    ColumnLayout {
        date: find(DATE_COLUMN),
        latitude: find(LATITUDE_COLUMN),
        longitude: find(LONGITUDE_COLUMN),
    }
}

/// Byte offset just past the `n`th newline, or `None` if the input has fewer lines
fn nth_line_end(bytes: &[u8], n: usize) -> Option<usize> {
    if n == 0 {
        return Some(0);
    }
    bytes
        .iter()
        .enumerate()
        .filter(|(_, b)| **b == b'\n')
        .nth(n - 1)
        .map(|(i, _)| i + 1)
}
