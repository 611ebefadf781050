use chrono::NaiveDate;
use csv::ByteRecord;

/// Line ending used by a data file, detected from its column header row
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineEnding {
    Lf,
    CrLf,
}

impl LineEnding {
    pub fn detect(line: &[u8]) -> Self {
        if line.ends_with(b"\r\n") {
            LineEnding::CrLf
        } else {
            LineEnding::Lf
        }
    }

    pub fn as_bytes(&self) -> &'static [u8] {
        match self {
            LineEnding::Lf => b"\n",
            LineEnding::CrLf => b"\r\n",
        }
    }

    pub fn as_terminator(&self) -> csv::Terminator {
        match self {
            LineEnding::Lf => csv::Terminator::Any(b'\n'),
            LineEnding::CrLf => csv::Terminator::CRLF,
        }
    }
}

/// Positions of the columns the row filter reads
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ColumnLayout {
    pub date: Option<usize>,
    pub latitude: Option<usize>,
    pub longitude: Option<usize>,
}

/// One data row: the original fields plus the values parsed out of them.
/// Unparsable values are kept as `None`; the row itself is never dropped at
/// parse time.
#[derive(Debug, Clone)]
pub struct DataRow {
    pub record: ByteRecord,
    pub date: Option<NaiveDate>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

/// A MAN tabular data file split into its verbatim preamble and parsed rows
#[derive(Debug, Clone)]
pub struct DataFile {
    /// Disclaimer and metadata lines, byte-for-byte including line endings
    pub header: Vec<u8>,
    /// The column header row, byte-for-byte
    pub column_row: Vec<u8>,
    pub layout: ColumnLayout,
    pub line_ending: LineEnding,
    pub rows: Vec<DataRow>,
    /// Number of rows whose date or coordinates could not be parsed
    pub parse_failures: usize,
}

impl DataFile {
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }
}
