use crate::utils::constants::{ARCHIVE_EXTENSION, WORKDIR_SUFFIX};
use chrono::Utc;

/// Generate the working directory name with format: {unixTimestamp}_MAN_DATA
pub fn generate_workdir_name() -> String {
    workdir_name_for(Utc::now().timestamp())
}

pub fn workdir_name_for(timestamp: i64) -> String {
    format!("{}{}", timestamp, WORKDIR_SUFFIX)
}

/// Archive file name for a working directory: {workdir}.tar.gz
pub fn archive_filename(workdir_name: &str) -> String {
    format!("{}.{}", workdir_name, ARCHIVE_EXTENSION)
}

/// Whether a site identifier is safe to splice into a file name under the
/// source tree.
pub fn is_safe_site_name(site: &str) -> bool {
    !site.is_empty()
        && site != "."
        && !site.contains("..")
        && !site.contains(['/', '\\', '\0'])
}
