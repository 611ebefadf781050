use chrono::{Local, NaiveDate};
use std::fmt;
use std::sync::Arc;

type DateSource = Arc<dyn Fn() -> NaiveDate + Send + Sync>;

/// Source of the current local date, read again on every call.
///
/// Long-lived handlers hold a `Clock` rather than a date so that "today"
/// moves on at midnight.
#[derive(Clone, Default)]
pub struct Clock {
    source: Option<DateSource>,
}

impl Clock {
    /// The local wall clock
    pub fn system() -> Self {
        Self { source: None }
    }

    pub fn fixed(today: NaiveDate) -> Self {
        Self::from_fn(move || today)
    }

    pub fn from_fn(source: impl Fn() -> NaiveDate + Send + Sync + 'static) -> Self {
        Self {
            source: Some(Arc::new(source)),
        }
    }

    pub fn today(&self) -> NaiveDate {
        match &self.source {
            Some(source) => source(),
            None => Local::now().date_naive(),
        }
    }
}

impl fmt::Debug for Clock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.source {
            Some(_) => f.write_str("Clock(custom)"),
            None => f.write_str("Clock(system)"),
        }
    }
}
