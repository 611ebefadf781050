/// Retrieval directory names in the source tree
pub const AOD_DIR: &str = "AOD";
pub const SDA_DIR: &str = "SDA";

/// Frequency file prefixes
pub const SERIES_PREFIX: &str = "series";
pub const POINT_PREFIX: &str = "all_points";
pub const DAILY_PREFIX: &str = "daily";

/// Documents copied into every export regardless of the selection
pub const POLICY_DOCUMENTS: [&str; 2] = ["data_usage_policy.pdf", "data_usage_policy.txt"];

/// Recognized `{prefix}.{extension}` endings of MAN data files
pub const FILE_ENDINGS: [&str; 14] = [
    "all_points.lev10",
    "all_points.lev15",
    "all_points.lev20",
    "series.lev15",
    "series.lev20",
    "daily.lev15",
    "daily.lev20",
    "all_points.ONEILL_10",
    "all_points.ONEILL_15",
    "all_points.ONEILL_20",
    "series.ONEILL_15",
    "series.ONEILL_20",
    "daily.ONEILL_15",
    "daily.ONEILL_20",
];

/// Data file layout
pub const HEADER_LINE_COUNT: usize = 4;
pub const DATE_COLUMN: &str = "Date(dd:mm:yyyy)";
pub const LATITUDE_COLUMN: &str = "Latitude";
pub const LONGITUDE_COLUMN: &str = "Longitude";
pub const FILE_DATE_FORMAT: &str = "%d:%m:%Y";

/// Request parameter date format
pub const REQUEST_DATE_FORMAT: &str = "%Y-%m-%d";

/// Earliest selectable start date; a request carrying it means "no lower bound"
pub const EPOCH_START_DATE: &str = "2004-10-16";

/// Working directory and archive naming
pub const WORKDIR_SUFFIX: &str = "_MAN_DATA";
pub const ARCHIVE_EXTENSION: &str = "tar.gz";
pub const ARCHIVE_CONTENT_TYPE: &str = "application/gzip";

/// Processing defaults
pub const DEFAULT_MAX_WORKERS: usize = 4;
pub const DEFAULT_DEADLINE_SECS: u64 = 300;
pub const DEFAULT_SOURCE_ROOT: &str = "./src";
pub const DEFAULT_TEMP_BASE: &str = "./temp";
pub const DEFAULT_BUFFER_SIZE: usize = 8192 * 16; // 128KB

/// Default numeric field exposed by measurement queries
pub const DEFAULT_READING: &str = "aod_500nm";
