//! Public holidays on which no waste is collected.

use std::collections::BTreeMap;

use chrono::{Duration, NaiveDate};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
/// Set of named non-collection days.
pub struct HolidayCalendar {
    days: BTreeMap<NaiveDate, String>,
}

impl HolidayCalendar {
    /// Empty calendar.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Statutory public holidays of Bavaria in `year`.
    ///
    /// Days that are holidays only in parts of the state are not included, see
    /// [`HolidayCalendar::with_regional_holidays`].
    #[must_use]
    pub fn bavaria(year: i32) -> Self {
        let mut calendar = Self::new();
        let mut fixed = |month: u32, day: u32, name: &str| {
            if let Some(date) = NaiveDate::from_ymd_opt(year, month, day) {
                calendar.insert(date, name);
            }
        };
        fixed(1, 1, "Neujahr");
        fixed(1, 6, "Heilige Drei Könige");
        fixed(5, 1, "Tag der Arbeit");
        fixed(10, 3, "Tag der Deutschen Einheit");
        fixed(11, 1, "Allerheiligen");
        fixed(12, 25, "Erster Weihnachtstag");
        fixed(12, 26, "Zweiter Weihnachtstag");
        if year == 2017 {
            fixed(10, 31, "Reformationstag");
        }

        if let Some(easter) = easter_sunday(year) {
            for (offset, name) in [
                (-2, "Karfreitag"),
                (1, "Ostermontag"),
                (39, "Christi Himmelfahrt"),
                (50, "Pfingstmontag"),
                (60, "Fronleichnam"),
            ] {
                calendar.insert(easter + Duration::days(offset), name);
            }
        }
        calendar
    }

    /// Add the holidays observed in the collection area but missing from the
    /// state-wide calendar (Mariä Himmelfahrt on 15 August).
    #[must_use]
    pub fn with_regional_holidays(mut self, year: i32) -> Self {
        if let Some(date) = NaiveDate::from_ymd_opt(year, 8, 15) {
            self.insert(date, "Mariä Himmelfahrt");
        }
        self
    }

    /// Add or rename a holiday.
    pub fn insert<S: Into<String>>(&mut self, date: NaiveDate, name: S) {
        self.days.insert(date, name.into());
    }

    /// Whether `date` is a holiday.
    #[must_use]
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.days.contains_key(&date)
    }

    /// Name of the holiday on `date`.
    #[must_use]
    pub fn name(&self, date: NaiveDate) -> Option<&str> {
        self.days.get(&date).map(String::as_str)
    }

    /// Number of holidays.
    #[must_use]
    pub fn len(&self) -> usize {
        self.days.len()
    }

    /// Whether the calendar has no holidays.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.days.is_empty()
    }

    /// Holidays in date order.
    pub fn iter(&self) -> impl Iterator<Item = (NaiveDate, &str)> {
        self.days.iter().map(|(date, name)| (*date, name.as_str()))
    }
}

/// Easter Sunday in the Gregorian calendar (anonymous Gregorian algorithm).
#[must_use]
pub fn easter_sunday(year: i32) -> Option<NaiveDate> {
    let golden = year.rem_euclid(19);
    let century = year.div_euclid(100);
    let year_of_century = year.rem_euclid(100);
    let leap_skips = century.div_euclid(4);
    let century_rest = century.rem_euclid(4);
    let correction = (century + 8).div_euclid(25);
    let moon = (century - correction + 1).div_euclid(3);
    let epact = (19 * golden + century - leap_skips - moon + 15).rem_euclid(30);
    let quarter = year_of_century.div_euclid(4);
    let quarter_rest = year_of_century.rem_euclid(4);
    let weekday = (32 + 2 * century_rest + 2 * quarter - epact - quarter_rest).rem_euclid(7);
    let shift = (golden + 11 * epact + 22 * weekday).div_euclid(451);
    let days = epact + weekday - 7 * shift + 114;

    let month = u32::try_from(days.div_euclid(31)).ok()?;
    let day = u32::try_from(days.rem_euclid(31) + 1).ok()?;
    NaiveDate::from_ymd_opt(year, month, day)
}
