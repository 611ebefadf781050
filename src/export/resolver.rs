use crate::models::{RawBounds, RawSelection, Selection};
use crate::utils::constants::{EPOCH_START_DATE, REQUEST_DATE_FORMAT};
use crate::utils::Clock;
use chrono::NaiveDate;
use tracing::debug;

/// Normalizes raw request fields into a [`Selection`].
///
/// The frontend always sends its date pickers' values, so a start date equal
/// to the epoch default or an end date equal to today means the user never
/// narrowed that side of the range. Those become unbounded here; nothing else
/// is validated. "Today" is read from the clock on every call.
#[derive(Debug, Clone)]
pub struct ParameterResolver {
    epoch_start: String,
    clock: Clock,
}

impl ParameterResolver {
    pub fn new() -> Self {
        Self::with_clock(Clock::system())
    }

    pub fn with_today(today: NaiveDate) -> Self {
        Self::with_clock(Clock::fixed(today))
    }

    pub fn with_clock(clock: Clock) -> Self {
        Self {
            epoch_start: EPOCH_START_DATE.to_string(),
            clock,
        }
    }

    pub fn resolve(&self, raw: RawSelection) -> Selection {
        let today = self.clock.today().format(REQUEST_DATE_FORMAT).to_string();
        let start_date = non_blank(raw.start_date).filter(|d| *d != self.epoch_start);
        let end_date = non_blank(raw.end_date).filter(|d| *d != today);

        debug!(
            "Resolved date range: start={:?} end={:?}",
            start_date, end_date
        );

        Selection {
            sites: raw
                .sites
                .into_iter()
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
            start_date,
            end_date,
            retrievals: raw.retrievals,
            frequencies: raw.frequencies,
            qualities: raw.qualities,
            bounds: RawBounds {
                min_lat: non_blank(raw.bounds.min_lat),
                min_lng: non_blank(raw.bounds.min_lng),
                max_lat: non_blank(raw.bounds.max_lat),
                max_lng: non_blank(raw.bounds.max_lng),
            },
        }
    }
}

impl Default for ParameterResolver {
    fn default() -> Self {
        Self::new()
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
