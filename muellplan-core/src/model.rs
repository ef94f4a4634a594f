//! Domain data structures for zones, waste types, and compiled pickup schedules.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
/// Waste fractions printed in the collection calendar, in column order.
pub enum WasteType {
    /// Residual/gray bin.
    #[serde(rename = "Restmüll")]
    Residual,
    /// Organic waste.
    #[serde(rename = "Biomüll")]
    Organic,
    /// Paper and cardboard.
    #[serde(rename = "Papiermüll")]
    Paper,
    /// Light packaging, collected in yellow bags.
    #[serde(rename = "Gelber Sack")]
    Packaging,
}

impl WasteType {
    /// All waste types in the order they appear on a calendar cell.
    pub const ALL: [WasteType; 4] = [
        WasteType::Residual,
        WasteType::Organic,
        WasteType::Paper,
        WasteType::Packaging,
    ];

    /// German label used in the calendar and in the compiled dataset.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            WasteType::Residual => "Restmüll",
            WasteType::Organic => "Biomüll",
            WasteType::Paper => "Papiermüll",
            WasteType::Packaging => "Gelber Sack",
        }
    }
}

impl fmt::Display for WasteType {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.label())
    }
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
/// Errors raised when parsing zone identifiers from text.
pub enum ZoneCodeError {
    /// Not one of the letters A to E.
    #[error("Invalid letter zone: {0:?}")]
    LetterZone(String),
    /// Not one of the numbers 1 to 4.
    #[error("Invalid number zone: {0:?}")]
    NumberZone(String),
    /// Not one of the printed number-zone designators.
    #[error("Invalid number zone designator: {0:?}")]
    Designator(String),
    /// Not a two character code such as `A1`.
    #[error("Invalid zone code: {0:?}")]
    ZoneCode(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
/// Letter part of a zone code.
pub enum LetterZone {
    /// Zone A.
    A,
    /// Zone B.
    B,
    /// Zone C.
    C,
    /// Zone D.
    D,
    /// Zone E.
    E,
}

impl LetterZone {
    /// All letter zones in alphabetical order.
    pub const ALL: [LetterZone; 5] = [
        LetterZone::A,
        LetterZone::B,
        LetterZone::C,
        LetterZone::D,
        LetterZone::E,
    ];

    /// Upper case letter.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            LetterZone::A => "A",
            LetterZone::B => "B",
            LetterZone::C => "C",
            LetterZone::D => "D",
            LetterZone::E => "E",
        }
    }
}

impl FromStr for LetterZone {
    type Err = ZoneCodeError;

    /// Parses a letter zone, ignoring case.
    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.to_lowercase().as_str() {
            "a" => Ok(LetterZone::A),
            "b" => Ok(LetterZone::B),
            "c" => Ok(LetterZone::C),
            "d" => Ok(LetterZone::D),
            "e" => Ok(LetterZone::E),
            _ => Err(ZoneCodeError::LetterZone(raw.to_owned())),
        }
    }
}

impl fmt::Display for LetterZone {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

impl From<LetterZone> for String {
    fn from(letter: LetterZone) -> Self {
        letter.as_str().to_owned()
    }
}

impl TryFrom<String> for LetterZone {
    type Error = ZoneCodeError;

    fn try_from(raw: String) -> Result<Self, Self::Error> {
        raw.parse()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
/// Number part of a zone code.
pub enum NumberZone {
    /// Zone 1.
    One,
    /// Zone 2.
    Two,
    /// Zone 3.
    Three,
    /// Zone 4.
    Four,
}

impl NumberZone {
    /// All number zones in ascending order.
    pub const ALL: [NumberZone; 4] = [
        NumberZone::One,
        NumberZone::Two,
        NumberZone::Three,
        NumberZone::Four,
    ];

    /// Digit as printed in the calendar.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            NumberZone::One => "1",
            NumberZone::Two => "2",
            NumberZone::Three => "3",
            NumberZone::Four => "4",
        }
    }
}

impl FromStr for NumberZone {
    type Err = ZoneCodeError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw {
            "1" => Ok(NumberZone::One),
            "2" => Ok(NumberZone::Two),
            "3" => Ok(NumberZone::Three),
            "4" => Ok(NumberZone::Four),
            _ => Err(ZoneCodeError::NumberZone(raw.to_owned())),
        }
    }
}

impl fmt::Display for NumberZone {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

impl From<NumberZone> for String {
    fn from(number: NumberZone) -> Self {
        number.as_str().to_owned()
    }
}

impl TryFrom<String> for NumberZone {
    type Error = ZoneCodeError;

    fn try_from(raw: String) -> Result<Self, Self::Error> {
        raw.parse()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
/// Number-zone designator printed for one waste type on one day.
///
/// Designators such as `1/2` serve two adjacent number zones.
pub enum ZoneDesignator {
    /// `1`
    One,
    /// `2`
    Two,
    /// `3`
    Three,
    /// `4`
    Four,
    /// `1/2`
    OneTwo,
    /// `2/3`
    TwoThree,
    /// `3/4`
    ThreeFour,
}

impl ZoneDesignator {
    /// Text as printed in the calendar.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            ZoneDesignator::One => "1",
            ZoneDesignator::Two => "2",
            ZoneDesignator::Three => "3",
            ZoneDesignator::Four => "4",
            ZoneDesignator::OneTwo => "1/2",
            ZoneDesignator::TwoThree => "2/3",
            ZoneDesignator::ThreeFour => "3/4",
        }
    }

    /// Whether this designator serves the given number zone.
    ///
    /// Matching is a substring test on the printed text, so `1/2` covers both
    /// zone 1 and zone 2.
    #[must_use]
    pub fn covers(self, number: NumberZone) -> bool {
        self.as_str().contains(number.as_str())
    }
}

impl FromStr for ZoneDesignator {
    type Err = ZoneCodeError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw {
            "1" => Ok(ZoneDesignator::One),
            "2" => Ok(ZoneDesignator::Two),
            "3" => Ok(ZoneDesignator::Three),
            "4" => Ok(ZoneDesignator::Four),
            "1/2" => Ok(ZoneDesignator::OneTwo),
            "2/3" => Ok(ZoneDesignator::TwoThree),
            "3/4" => Ok(ZoneDesignator::ThreeFour),
            _ => Err(ZoneCodeError::Designator(raw.to_owned())),
        }
    }
}

impl fmt::Display for ZoneDesignator {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

impl From<ZoneDesignator> for String {
    fn from(designator: ZoneDesignator) -> Self {
        designator.as_str().to_owned()
    }
}

impl TryFrom<String> for ZoneDesignator {
    type Error = ZoneCodeError;

    fn try_from(raw: String) -> Result<Self, Self::Error> {
        raw.parse()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
/// Two character collection area identifier such as `A1`.
pub struct ZoneCode {
    /// Letter part.
    pub letter: LetterZone,
    /// Number part.
    pub number: NumberZone,
}

impl ZoneCode {
    /// Combine a letter and a number zone.
    #[must_use]
    pub fn new(letter: LetterZone, number: NumberZone) -> Self {
        Self { letter, number }
    }
}

impl FromStr for ZoneCode {
    type Err = ZoneCodeError;

    /// Parses codes matching `^[A-E][1-4]$` after trimming surrounding whitespace.
    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let code = raw.trim();
        let mut chars = code.chars();
        let (Some(letter_char), Some(number_char), None) = (chars.next(), chars.next(), chars.next())
        else {
            return Err(ZoneCodeError::ZoneCode(raw.to_owned()));
        };
        if !letter_char.is_ascii_uppercase() {
            return Err(ZoneCodeError::ZoneCode(raw.to_owned()));
        }

        let letter = LetterZone::from_str(letter_char.encode_utf8(&mut [0; 4]))
            .map_err(|_err| ZoneCodeError::ZoneCode(raw.to_owned()))?;
        let number = NumberZone::from_str(number_char.encode_utf8(&mut [0; 4]))
            .map_err(|_err| ZoneCodeError::ZoneCode(raw.to_owned()))?;
        Ok(Self { letter, number })
    }
}

impl fmt::Display for ZoneCode {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "{}{}", self.letter, self.number)
    }
}

impl From<ZoneCode> for String {
    fn from(zone: ZoneCode) -> Self {
        zone.to_string()
    }
}

impl TryFrom<String> for ZoneCode {
    type Error = ZoneCodeError;

    fn try_from(raw: String) -> Result<Self, Self::Error> {
        raw.parse()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
/// OCR output for a single calendar cell.
pub struct RawCellRecord {
    /// Month label of the calendar column, e.g. `Jan`.
    pub month: String,
    /// One-based calendar row. May exceed the real length of the month.
    pub day: u32,
    /// Whitespace separated tokens recognised in the cell.
    pub tokens: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
/// Validated collection day: a letter zone and one designator per waste type.
pub struct PickupRecord {
    /// Collection date.
    pub date: NaiveDate,
    /// Letter zone served on this date.
    pub letter_zone: LetterZone,
    /// Number zones for residual waste.
    pub residual: ZoneDesignator,
    /// Number zones for organic waste.
    pub organic: ZoneDesignator,
    /// Number zones for paper.
    pub paper: ZoneDesignator,
    /// Number zones for packaging.
    pub packaging: ZoneDesignator,
}

impl PickupRecord {
    /// Designator printed for the given waste type.
    #[must_use]
    pub fn designator(&self, waste_type: WasteType) -> ZoneDesignator {
        match waste_type {
            WasteType::Residual => self.residual,
            WasteType::Organic => self.organic,
            WasteType::Paper => self.paper,
            WasteType::Packaging => self.packaging,
        }
    }

    /// Waste types collected for `number` on this date, in column order.
    #[must_use]
    pub fn waste_types_for(&self, number: NumberZone) -> Vec<WasteType> {
        WasteType::ALL
            .into_iter()
            .filter(|waste_type| self.designator(*waste_type).covers(number))
            .collect()
    }
}

/// Collection dates of a single zone mapped to the waste types collected that day.
pub type ZoneSchedule = BTreeMap<NaiveDate, Vec<WasteType>>;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
/// Compiled dataset: `letter → number → date → [waste type]`.
pub struct ScheduleTable(pub BTreeMap<LetterZone, BTreeMap<NumberZone, ZoneSchedule>>);

impl ScheduleTable {
    /// Schedule of a single zone, if the dataset contains it.
    #[must_use]
    pub fn zone(&self, zone: ZoneCode) -> Option<&ZoneSchedule> {
        self.0.get(&zone.letter)?.get(&zone.number)
    }

    /// Mutable schedule of a zone, created empty on first access.
    pub fn zone_mut(&mut self, zone: ZoneCode) -> &mut ZoneSchedule {
        self.0
            .entry(zone.letter)
            .or_default()
            .entry(zone.number)
            .or_default()
    }

    /// All zones present in the dataset.
    pub fn zones(&self) -> impl Iterator<Item = ZoneCode> + '_ {
        self.0.iter().flat_map(|(letter, numbers)| {
            numbers
                .keys()
                .map(|number| ZoneCode::new(*letter, *number))
        })
    }

    /// Merge another table into this one. Dates present in both keep `other`'s entry.
    pub fn merge(&mut self, other: ScheduleTable) {
        for (letter, numbers) in other.0 {
            for (number, schedule) in numbers {
                self.zone_mut(ZoneCode::new(letter, number)).extend(schedule);
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
/// Next collection date of one waste type.
pub struct NextPickup {
    /// Waste type.
    #[serde(rename = "type")]
    pub waste_type: WasteType,
    /// Next date on or after the reference date; `None` (serialized as `""`) if there is none.
    #[serde(with = "empty_date")]
    pub date: Option<NaiveDate>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
/// Next pickup per waste type for one zone, as seen on `reference_date`.
pub struct NextPickupResult {
    /// Zone the result was computed for.
    pub zone: ZoneCode,
    /// Day the result is valid for.
    pub reference_date: NaiveDate,
    /// One entry per waste type in [`WasteType::ALL`] order.
    pub next_pickups: Vec<NextPickup>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
/// One upcoming collection day.
pub struct FuturePickup {
    /// Collection date.
    pub date: NaiveDate,
    /// Waste types collected on that date.
    pub waste_types: Vec<WasteType>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
/// Remaining collection days of one zone, as seen on `reference_date`.
pub struct FutureSchedule {
    /// Zone the schedule belongs to.
    pub zone: ZoneCode,
    /// First day included in the schedule.
    pub reference_date: NaiveDate,
    /// Collection days in date order.
    pub schedule: Vec<FuturePickup>,
}

/// Serializes `Option<NaiveDate>` as an ISO date or an empty string.
mod empty_date {
    use chrono::NaiveDate;
    use serde::{Deserialize, Deserializer, Serializer};

    const FORMAT: &str = "%Y-%m-%d";

    pub(super) fn serialize<S: Serializer>(
        date: &Option<NaiveDate>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match date {
            Some(date) => serializer.collect_str(&date.format(FORMAT)),
            None => serializer.serialize_str(""),
        }
    }

    pub(super) fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<NaiveDate>, D::Error> {
        let raw = String::deserialize(deserializer)?;
        if raw.is_empty() {
            return Ok(None);
        }
        NaiveDate::parse_from_str(&raw, FORMAT)
            .map(Some)
            .map_err(serde::de::Error::custom)
    }
}
