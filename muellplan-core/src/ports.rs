//! Traits describing the collaborators the query service depends on.

use chrono::{NaiveDate, Utc};

use crate::dataset::DatasetError;
use crate::model::{ZoneCode, ZoneSchedule};

/// Source of compiled schedules, e.g. a JSON dataset on disk.
pub trait ScheduleStore: Send + Sync {
    /// Load the schedule of a single zone.
    ///
    /// # Errors
    ///
    /// Returns [`DatasetError::ZoneNotFound`] when the dataset has no entry for
    /// the zone, and [`DatasetError::Unavailable`] or [`DatasetError::Corrupted`]
    /// when the dataset itself cannot be read.
    fn zone_schedule(&self, zone: ZoneCode) -> Result<ZoneSchedule, DatasetError>;

    /// All zones the dataset knows about.
    ///
    /// # Errors
    ///
    /// Returns a [`DatasetError`] when the dataset cannot be read.
    fn zone_codes(&self) -> Result<Vec<ZoneCode>, DatasetError>;
}

/// Provides the calendar day queries are answered for.
pub trait Clock: Send + Sync {
    /// Current calendar day.
    fn today(&self) -> NaiveDate;
}

#[derive(Debug, Clone, Copy, Default)]
/// Clock backed by the system time, read as a UTC calendar day.
pub struct SystemClock;

impl Clock for SystemClock {
    fn today(&self) -> NaiveDate {
        Utc::now().date_naive()
    }
}

#[derive(Debug, Clone, Copy)]
/// Clock pinned to a single day.
pub struct FixedClock(pub NaiveDate);

impl Clock for FixedClock {
    fn today(&self) -> NaiveDate {
        self.0
    }
}
