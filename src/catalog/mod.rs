pub mod memory;

pub use memory::{CatalogData, InMemoryCatalog};

use crate::error::Result;
use crate::models::{Measurement, RawBounds, SiteSummary};
use serde::{Deserialize, Serialize};

/// Filters for the site listing. All fields are optional and kept raw.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SiteQuery {
    pub bounds: RawBounds,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

/// Filters for the measurement listing. `sites` must be non-empty.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MeasurementQuery {
    pub sites: Vec<String>,
    pub bounds: RawBounds,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    /// Numeric column exposed as `value`; defaults to `aod_500nm`
    pub reading: Option<String>,
}

/// Site and measurement lookups the map frontend runs before an export
pub trait SiteCatalog {
    fn list_sites(&self, query: &SiteQuery) -> Result<Vec<SiteSummary>>;

    fn site_measurements(&self, query: &MeasurementQuery) -> Result<Vec<Measurement>>;
}
