use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use validator::Validate;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Validate)]
pub struct LatLng {
    #[validate(range(min = -90.0, max = 90.0))]
    pub lat: f64,

    #[validate(range(min = -180.0, max = 180.0))]
    pub lng: f64,
}

/// A measurement site (usually a ship cruise) and its observation span
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct SiteRecord {
    #[validate(length(min = 1))]
    pub name: String,

    #[serde(default)]
    pub aeronet_number: i32,

    #[serde(default)]
    pub description: String,

    /// Derived [earliest, latest] measurement dates
    #[serde(default)]
    pub span_date: Option<[NaiveDate; 2]>,
}

/// One daily-averaged measurement row. `readings` holds the numeric columns
/// (aod_500nm, water_vapor, ...) keyed by column name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct MeasurementRecord {
    #[validate(length(min = 1))]
    pub site: String,

    #[serde(default)]
    pub filename: String,

    pub date: NaiveDate,

    pub time: NaiveTime,

    #[validate(nested)]
    pub latlng: Option<LatLng>,

    #[serde(default)]
    pub aeronet_number: i32,

    #[serde(default)]
    pub readings: BTreeMap<String, f64>,
}

/// Row of the site-listing query
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SiteSummary {
    pub name: String,
    pub span_date: Option<[NaiveDate; 2]>,
}

/// Row of the measurements query; `value` is the caller-selected reading
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Measurement {
    pub site: String,
    pub filename: String,
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub latlng: Option<LatLng>,
    pub aeronet_number: i32,
    pub value: Option<f64>,
}
