//! High-level service facade used by clients to answer pickup queries.

use std::sync::Arc;

use chrono::NaiveDate;

use crate::dataset::DatasetError;
use crate::model::{FutureSchedule, NextPickupResult, ZoneCode};
use crate::ports::{Clock, ScheduleStore, SystemClock};
use crate::query::{NextPickupCache, future_pickups};

/// Public entry point for next-pickup and schedule lookups.
pub struct ScheduleService {
    store: Arc<dyn ScheduleStore>,
    clock: Arc<dyn Clock>,
    cache: NextPickupCache,
}

impl ScheduleService {
    /// Create a service reading from `store` and using the system clock.
    #[must_use]
    pub fn new(store: Arc<dyn ScheduleStore>) -> Self {
        Self::with_clock(store, Arc::new(SystemClock))
    }

    /// Create a service with an explicit clock.
    #[must_use]
    pub fn with_clock(store: Arc<dyn ScheduleStore>, clock: Arc<dyn Clock>) -> Self {
        Self {
            store,
            clock,
            cache: NextPickupCache::new(),
        }
    }

    /// Current reference date.
    #[must_use]
    pub fn today(&self) -> NaiveDate {
        self.clock.today()
    }

    /// List all zones of the dataset.
    ///
    /// # Errors
    ///
    /// Returns a [`DatasetError`] if the dataset cannot be read.
    pub fn zones(&self) -> Result<Vec<ZoneCode>, DatasetError> {
        self.store.zone_codes()
    }

    /// Next pickup per waste type for a zone as of today.
    ///
    /// # Errors
    ///
    /// Returns [`DatasetError::ZoneNotFound`] for unknown zones and other
    /// [`DatasetError`] variants if the dataset cannot be read.
    pub fn next_pickups(&self, zone: ZoneCode) -> Result<NextPickupResult, DatasetError> {
        self.next_pickups_on(zone, self.today())
    }

    /// Next pickup per waste type for a zone as of `today`.
    ///
    /// # Errors
    ///
    /// See [`ScheduleService::next_pickups`].
    pub fn next_pickups_on(
        &self,
        zone: ZoneCode,
        today: NaiveDate,
    ) -> Result<NextPickupResult, DatasetError> {
        let schedule = self.store.zone_schedule(zone)?;
        Ok(self.cache.next_pickups(zone, &schedule, today))
    }

    /// All remaining collection days for a zone as of today.
    ///
    /// # Errors
    ///
    /// See [`ScheduleService::next_pickups`].
    pub fn future_pickups(&self, zone: ZoneCode) -> Result<FutureSchedule, DatasetError> {
        self.future_pickups_on(zone, self.today())
    }

    /// All remaining collection days for a zone as of `today`.
    ///
    /// # Errors
    ///
    /// See [`ScheduleService::next_pickups`].
    pub fn future_pickups_on(
        &self,
        zone: ZoneCode,
        today: NaiveDate,
    ) -> Result<FutureSchedule, DatasetError> {
        let schedule = self.store.zone_schedule(zone)?;
        Ok(FutureSchedule {
            zone,
            reference_date: today,
            schedule: future_pickups(&schedule, today),
        })
    }
}
