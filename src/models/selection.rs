use crate::error::{ExportError, Result};
use crate::utils::constants::{
    AOD_DIR, DAILY_PREFIX, POINT_PREFIX, REQUEST_DATE_FORMAT, SDA_DIR, SERIES_PREFIX,
};
use crate::utils::coordinates::parse_bound;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Measurement product family
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Retrieval {
    Aod,
    Sda,
}

impl Retrieval {
    pub fn from_label(label: &str) -> Option<Self> {
        match label {
            "AOD" => Some(Retrieval::Aod),
            "SDA" => Some(Retrieval::Sda),
            _ => None,
        }
    }

    /// Directory holding this product, both in the source tree and the export
    pub fn dir_name(&self) -> &'static str {
        match self {
            Retrieval::Aod => AOD_DIR,
            Retrieval::Sda => SDA_DIR,
        }
    }

    /// File extension for a quality level of this product
    pub fn extension(&self, quality: Quality) -> &'static str {
        match (self, quality) {
            (Retrieval::Aod, Quality::Level10) => "lev10",
            (Retrieval::Aod, Quality::Level15) => "lev15",
            (Retrieval::Aod, Quality::Level20) => "lev20",
            (Retrieval::Sda, Quality::Level10) => "ONEILL_10",
            (Retrieval::Sda, Quality::Level15) => "ONEILL_15",
            (Retrieval::Sda, Quality::Level20) => "ONEILL_20",
        }
    }

    /// Route a data file to its product by extension (`*.lev*` is AOD, `*.ONEILL*` is SDA)
    pub fn for_file_name(file_name: &str) -> Option<Self> {
        let (_, extension) = file_name.rsplit_once('.')?;
        if extension.starts_with("lev") {
            Some(Retrieval::Aod)
        } else if extension.starts_with("ONEILL") {
            Some(Retrieval::Sda)
        } else {
            None
        }
    }
}

impl std::fmt::Display for Retrieval {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.dir_name())
    }
}

/// Temporal aggregation of a file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Frequency {
    Series,
    Point,
    Daily,
}

impl Frequency {
    pub fn from_label(label: &str) -> Option<Self> {
        match label {
            "Series" => Some(Frequency::Series),
            "Point" => Some(Frequency::Point),
            "Daily" => Some(Frequency::Daily),
            _ => None,
        }
    }

    pub fn file_prefix(&self) -> &'static str {
        match self {
            Frequency::Series => SERIES_PREFIX,
            Frequency::Point => POINT_PREFIX,
            Frequency::Daily => DAILY_PREFIX,
        }
    }
}

/// Processing level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Quality {
    Level10, // raw
    Level15, // cloud-screened
    Level20, // quality-assured
}

impl Quality {
    pub fn from_label(label: &str) -> Option<Self> {
        match label {
            "Level 1.0" => Some(Quality::Level10),
            "Level 1.5" => Some(Quality::Level15),
            "Level 2.0" => Some(Quality::Level20),
            _ => None,
        }
    }
}

/// Bounding-box values exactly as received. Parsing is deferred to the row
/// filter so malformed numbers only fail a request that actually uses them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawBounds {
    pub min_lat: Option<String>,
    pub min_lng: Option<String>,
    pub max_lat: Option<String>,
    pub max_lng: Option<String>,
}

impl RawBounds {
    pub fn parse(&self) -> Result<GeoBounds> {
        Ok(GeoBounds {
            min_lat: parse_bound("min_lat", self.min_lat.as_deref())?,
            min_lng: parse_bound("min_lng", self.min_lng.as_deref())?,
            max_lat: parse_bound("max_lat", self.max_lat.as_deref())?,
            max_lng: parse_bound("max_lng", self.max_lng.as_deref())?,
        })
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct GeoBounds {
    pub min_lat: Option<f64>,
    pub min_lng: Option<f64>,
    pub max_lat: Option<f64>,
    pub max_lng: Option<f64>,
}

impl GeoBounds {
    /// `[min_lat, min_lng, max_lat, max_lng]` when every corner was supplied
    pub fn complete(&self) -> Option<[f64; 4]> {
        Some([self.min_lat?, self.min_lng?, self.max_lat?, self.max_lng?])
    }
}

/// Selection fields as they arrive from the caller
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawSelection {
    pub sites: Vec<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub retrievals: Vec<String>,
    pub frequencies: Vec<String>,
    pub qualities: Vec<String>,
    pub bounds: RawBounds,
}

/// Normalized selection produced by the parameter resolver
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Selection {
    pub sites: Vec<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub retrievals: Vec<String>,
    pub frequencies: Vec<String>,
    pub qualities: Vec<String>,
    pub bounds: RawBounds,
}

impl Selection {
    /// Row filtering runs only when a date bound or a lower latitude bound was
    /// requested; other bounds alone leave files as staged.
    pub fn requires_filtering(&self) -> bool {
        self.start_date.is_some() || self.end_date.is_some() || self.bounds.min_lat.is_some()
    }

    /// Recognized retrievals in request order, without repeats
    pub fn recognized_retrievals(&self) -> Vec<Retrieval> {
        let mut retrievals = Vec::new();
        for retrieval in self.retrievals.iter().filter_map(|r| Retrieval::from_label(r)) {
            if !retrievals.contains(&retrieval) {
                retrievals.push(retrieval);
            }
        }
        retrievals
    }

    /// Parse the date range and bounding box into row filter bounds
    pub fn filter_bounds(&self) -> Result<FilterBounds> {
        let geo = self.bounds.parse()?;
        Ok(FilterBounds {
            start: parse_request_date("start_date", self.start_date.as_deref())?,
            end: parse_request_date("end_date", self.end_date.as_deref())?,
            min_lat: geo.min_lat,
            max_lat: geo.max_lat,
            min_lng: geo.min_lng,
            max_lng: geo.max_lng,
        })
    }
}

/// Active constraints of the row filter. `None` means unbounded.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FilterBounds {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
    pub min_lat: Option<f64>,
    pub max_lat: Option<f64>,
    pub min_lng: Option<f64>,
    pub max_lng: Option<f64>,
}

impl FilterBounds {
    pub fn is_unbounded(&self) -> bool {
        *self == FilterBounds::default()
    }

    pub fn constrains_latitude(&self) -> bool {
        self.min_lat.is_some() || self.max_lat.is_some()
    }

    pub fn constrains_longitude(&self) -> bool {
        self.min_lng.is_some() || self.max_lng.is_some()
    }
}

pub fn parse_request_date(name: &str, value: Option<&str>) -> Result<Option<NaiveDate>> {
    match value.map(str::trim) {
        None | Some("") => Ok(None),
        Some(v) => NaiveDate::parse_from_str(v, REQUEST_DATE_FORMAT)
            .map(Some)
            .map_err(|e| {
                ExportError::invalid_parameter(name, format!("'{}' is not a YYYY-MM-DD date: {}", v, e))
            }),
    }
}
