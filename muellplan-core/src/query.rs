//! Next-pickup and future-schedule queries for a single zone.

use std::collections::HashMap;

use chrono::NaiveDate;
use parking_lot::Mutex;
use tracing::debug;

use crate::model::{FuturePickup, NextPickup, NextPickupResult, WasteType, ZoneCode, ZoneSchedule};

/// Compute the next pickup of every waste type on or after `today`.
///
/// Dates are scanned in ascending order and the first date seen for a waste
/// type wins. Waste types without any future date get `None`.
#[must_use]
pub fn compute_next_pickups(
    zone: ZoneCode,
    schedule: &ZoneSchedule,
    today: NaiveDate,
) -> NextPickupResult {
    let mut next: HashMap<WasteType, NaiveDate> = HashMap::with_capacity(WasteType::ALL.len());

    for (date, waste_types) in schedule.range(today..) {
        for waste_type in waste_types {
            next.entry(*waste_type).or_insert(*date);
        }
        if next.len() == WasteType::ALL.len() {
            break;
        }
    }

    NextPickupResult {
        zone,
        reference_date: today,
        next_pickups: WasteType::ALL
            .into_iter()
            .map(|waste_type| NextPickup {
                waste_type,
                date: next.get(&waste_type).copied(),
            })
            .collect(),
    }
}

/// All collection days on or after `today` in date order.
#[must_use]
pub fn future_pickups(schedule: &ZoneSchedule, today: NaiveDate) -> Vec<FuturePickup> {
    schedule
        .range(today..)
        .map(|(date, waste_types)| FuturePickup {
            date: *date,
            waste_types: waste_types.clone(),
        })
        .collect()
}

/// Per-zone cache of next-pickup results, valid for one calendar day.
///
/// The whole check-compute-store sequence runs under one lock, so concurrent
/// queries never observe a half-written entry.
#[derive(Debug, Default)]
pub struct NextPickupCache {
    entries: Mutex<HashMap<ZoneCode, NextPickupResult>>,
}

impl NextPickupCache {
    /// Empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Next pickups of `zone` as seen on `today`.
    ///
    /// Returns the cached result if it was computed for `today`; otherwise
    /// computes a fresh result and replaces the cached one.
    pub fn next_pickups(
        &self,
        zone: ZoneCode,
        schedule: &ZoneSchedule,
        today: NaiveDate,
    ) -> NextPickupResult {
        let mut entries = self.entries.lock();
        if let Some(cached) = entries.get(&zone)
            && cached.reference_date == today
        {
            debug!(%zone, %today, "next pickups served from cache");
            return cached.clone();
        }

        let result = compute_next_pickups(zone, schedule, today);
        entries.insert(zone, result.clone());
        debug!(%zone, %today, "next pickups recomputed");
        result
    }

    /// Cached result for `zone`, regardless of its reference date.
    #[must_use]
    pub fn cached(&self, zone: ZoneCode) -> Option<NextPickupResult> {
        self.entries.lock().get(&zone).cloned()
    }

    /// Number of cached zones.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    /// Whether no zone is cached.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    /// Drop all cached results.
    pub fn clear(&self) {
        self.entries.lock().clear();
    }
}
