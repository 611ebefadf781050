use crate::catalog::{MeasurementQuery, SiteCatalog, SiteQuery};
use crate::error::{ExportError, Result};
use crate::models::selection::parse_request_date;
use crate::models::{LatLng, Measurement, MeasurementRecord, SiteRecord, SiteSummary};
use crate::utils::constants::DEFAULT_READING;
use crate::utils::coordinates::within_box;
use crate::utils::Clock;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::{BTreeMap, HashSet};
use std::path::Path;
use tracing::{debug, info, warn};
use validator::Validate;

/// On-disk catalog layout
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CatalogData {
    #[serde(default)]
    pub sites: Vec<SiteRecord>,
    #[serde(default)]
    pub measurements: Vec<MeasurementRecord>,
}

/// Catalog held in memory, loaded from a JSON document
#[derive(Debug, Clone)]
pub struct InMemoryCatalog {
    data: CatalogData,
    clock: Clock,
}

impl InMemoryCatalog {
    pub fn new(data: CatalogData) -> Self {
        Self {
            data,
            clock: Clock::system(),
        }
    }

    pub fn with_today(self, today: NaiveDate) -> Self {
        self.with_clock(Clock::fixed(today))
    }

    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    /// Load and validate a catalog JSON file
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let catalog = Self::from_json_str(&content)?;
        info!(
            "Loaded catalog {} ({} sites, {} measurements)",
            path.display(),
            catalog.data.sites.len(),
            catalog.data.measurements.len()
        );
        Ok(catalog)
    }

    pub fn from_json_str(content: &str) -> Result<Self> {
        let data: CatalogData = serde_json::from_str(content)?;
        for site in &data.sites {
            site.validate()?;
        }
        for measurement in &data.measurements {
            measurement.validate()?;
        }
        Ok(Self::new(data))
    }

    pub fn sites(&self) -> &[SiteRecord] {
        &self.data.sites
    }

    pub fn measurements(&self) -> &[MeasurementRecord] {
        &self.data.measurements
    }

    /// Set every site's `span_date` to the earliest and latest date of its
    /// measurements, or `None` when it has none. Returns how many changed.
    pub fn recompute_span_dates(&mut self) -> usize {
        let mut spans: BTreeMap<&str, [NaiveDate; 2]> = BTreeMap::new();
        for m in &self.data.measurements {
            spans
                .entry(m.site.as_str())
                .and_modify(|span| {
                    span[0] = span[0].min(m.date);
                    span[1] = span[1].max(m.date);
                })
                .or_insert([m.date, m.date]);
        }

        let mut changed = 0;
        for site in &mut self.data.sites {
            let span = spans.get(site.name.as_str()).copied();
            if site.span_date != span {
                debug!("Span of {} is now {:?}", site.name, span);
                site.span_date = span;
                changed += 1;
            }
        }

        info!("Recomputed span dates, {} sites changed", changed);
        changed
    }
}

fn span_matches(
    span: Option<[NaiveDate; 2]>,
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
    today: NaiveDate,
) -> bool {
    if start.is_none() && end.is_none() {
        return true;
    }
    let Some([first, last]) = span else {
        return false;
    };

    match (start, end) {
        (Some(start), Some(end)) => overlaps(first, last, start, end),
        (Some(start), None) => overlaps(first, last, start, today),
        (None, Some(end)) => first <= end && last >= end,
        (None, None) => true,
    }
}

/// The span intersects the range, or wholly contains it
fn overlaps(first: NaiveDate, last: NaiveDate, start: NaiveDate, end: NaiveDate) -> bool {
    (first <= end && last >= start) || (first <= start && last >= end)
}

fn latlng_within(latlng: Option<LatLng>, corners: [f64; 4]) -> bool {
    let [min_lat, min_lng, max_lat, max_lng] = corners;
    latlng.is_some_and(|p| within_box(p.lat, p.lng, min_lat, min_lng, max_lat, max_lng))
}

/// Site listing dates are advisory; an unparsable one is ignored
fn lenient_date(name: &str, value: Option<&str>) -> Option<NaiveDate> {
    match parse_request_date(name, value) {
        Ok(date) => date,
        Err(e) => {
            warn!("Ignoring {}", e);
            None
        }
    }
}

impl SiteCatalog for InMemoryCatalog {
    fn list_sites(&self, query: &SiteQuery) -> Result<Vec<SiteSummary>> {
        let mut in_box: Option<HashSet<&str>> = None;

        let all_present = [
            &query.bounds.min_lat,
            &query.bounds.min_lng,
            &query.bounds.max_lat,
            &query.bounds.max_lng,
        ]
        .iter()
        .all(|v| v.as_deref().is_some_and(|s| !s.trim().is_empty()));

        if all_present {
            let corners = match query.bounds.parse().map(|b| b.complete()) {
                Ok(Some(corners)) => corners,
                Ok(None) => return Ok(Vec::new()),
                Err(e) => {
                    warn!("Invalid bounding box for site listing: {}", e);
                    return Ok(Vec::new());
                }
            };

            let names: HashSet<&str> = self
                .data
                .measurements
                .iter()
                .filter(|m| latlng_within(m.latlng, corners))
                .map(|m| m.site.as_str())
                .collect();
            if names.is_empty() {
                return Ok(Vec::new());
            }
            in_box = Some(names);
        }

        // A date that is given but unusable drops date filtering altogether
        let given = |v: &Option<String>| v.as_deref().is_some_and(|s| !s.trim().is_empty());
        let start = lenient_date("start_date", query.start_date.as_deref());
        let end = lenient_date("end_date", query.end_date.as_deref());
        let unusable = (given(&query.start_date) && start.is_none())
            || (given(&query.end_date) && end.is_none());
        let (start, end) = if unusable { (None, None) } else { (start, end) };
        let today = self.clock.today();

        let mut sites: Vec<&SiteRecord> = self
            .data
            .sites
            .iter()
            .filter(|s| in_box.as_ref().map_or(true, |names| names.contains(s.name.as_str())))
            .filter(|s| span_matches(s.span_date, start, end, today))
            .collect();

        sites.sort_by(|a, b| match (a.span_date, b.span_date) {
            (Some(x), Some(y)) => x[0].cmp(&y[0]),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        });

        Ok(sites
            .into_iter()
            .map(|s| SiteSummary {
                name: s.name.clone(),
                span_date: s.span_date,
            })
            .collect())
    }

    fn site_measurements(&self, query: &MeasurementQuery) -> Result<Vec<Measurement>> {
        let sites: HashSet<&str> = query
            .sites
            .iter()
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .collect();
        if sites.is_empty() {
            return Err(ExportError::invalid_parameter("sites", "No sites selected"));
        }

        let reading = query
            .reading
            .as_deref()
            .map(str::trim)
            .filter(|r| !r.is_empty())
            .unwrap_or(DEFAULT_READING);
        let known = reading == DEFAULT_READING
            || self.data.measurements.iter().any(|m| m.readings.contains_key(reading));
        if !known {
            return Err(ExportError::invalid_parameter(
                "reading",
                format!("unknown reading '{}'", reading),
            ));
        }

        let corners = query.bounds.parse()?.complete();
        let start = parse_request_date("start_date", query.start_date.as_deref())?;
        let end = parse_request_date("end_date", query.end_date.as_deref())?;

        let measurements: Vec<Measurement> = self
            .data
            .measurements
            .iter()
            .filter(|m| sites.contains(m.site.as_str()))
            .filter(|m| corners.map_or(true, |c| latlng_within(m.latlng, c)))
            .filter(|m| start.map_or(true, |s| m.date >= s))
            .filter(|m| end.map_or(true, |e| m.date <= e))
            .map(|m| Measurement {
                site: m.site.clone(),
                filename: m.filename.clone(),
                date: m.date,
                time: m.time,
                latlng: m.latlng,
                aeronet_number: m.aeronet_number,
                value: m.readings.get(reading).copied(),
            })
            .collect();

        debug!(
            "{} measurements for {} sites ({})",
            measurements.len(),
            sites.len(),
            reading
        );
        Ok(measurements)
    }
}
