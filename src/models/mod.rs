pub mod data_file;
pub mod selection;
pub mod site;

pub use data_file::{ColumnLayout, DataFile, DataRow, LineEnding};
pub use selection::{
    FilterBounds, Frequency, GeoBounds, Quality, RawBounds, RawSelection, Retrieval, Selection,
};
pub use site::{LatLng, Measurement, MeasurementRecord, SiteRecord, SiteSummary};
