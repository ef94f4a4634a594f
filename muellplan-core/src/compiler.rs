//! Compiles raw OCR cell records of a year into the schedule table.
//!
//! The pipeline drops placeholder cells and holidays, parses the pickup tokens
//! of every collection day, validates them and pivots the result into
//! `letter → number → date → [waste type]`. Filters are silent; any validation
//! failure aborts the whole run with every offending row attached.

use std::fmt;
use std::io;
use std::path::PathBuf;

use chrono::NaiveDate;
use serde::Serialize;
use tracing::{error, info, instrument};

use crate::config::PipelineConfig;
use crate::dataset::write_table;
use crate::holidays::HolidayCalendar;
use crate::model::{
    LetterZone, NumberZone, PickupRecord, RawCellRecord, ScheduleTable, WasteType, ZoneCode,
    ZoneDesignator,
};
use crate::raw_table::{self, RawTableError, month_number};

/// Leading tokens of every cell that belong to the printed calendar rather than
/// the pickup plan: day of week and day number, e.g. `['2', 'Do', ...]`.
///
/// This is a fixed offset into the OCR token layout. If the calendar furniture
/// is ever tokenized differently the pickup parse shifts silently.
pub const CALENDAR_FURNITURE_TOKENS: usize = 2;

/// Tokens of a collection day: letter zone plus one designator per waste type.
pub const PICKUP_SLOTS: usize = 5;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
/// Calendar cell rejected by validation.
pub struct RejectedRow {
    /// Month label of the cell.
    pub month: String,
    /// Day of the cell.
    pub day: u32,
    /// Materialized date.
    pub date: NaiveDate,
    /// Pickup tokens after the calendar furniture.
    pub pickups: Vec<String>,
}

impl fmt::Display for RejectedRow {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            formatter,
            "{} ({} {}): [{}]",
            self.date,
            self.day,
            self.month,
            self.pickups.join(", ")
        )
    }
}

#[derive(thiserror::Error, Debug)]
/// Fatal errors of a compilation run.
pub enum CompileError {
    /// Raw tables could not be loaded.
    #[error(transparent)]
    RawTable(#[from] RawTableError),
    /// Day, month and year do not form a calendar date.
    #[error("Invalid calendar date: day {day} of {month:?} {year}")]
    InvalidDate {
        /// Month label of the cell.
        month: String,
        /// Day of the cell.
        day: u32,
        /// Compiled year.
        year: i32,
    },
    /// Collection days without exactly five pickup tokens.
    #[error("{} pickup list(s) do not have exactly 5 entries", .rows.len())]
    PickupCount {
        /// Offending rows.
        rows: Vec<RejectedRow>,
    },
    /// Collection days whose first pickup token is not a letter zone.
    #[error("{} pickup letter zone(s) are not valid", .rows.len())]
    LetterZone {
        /// Offending rows.
        rows: Vec<RejectedRow>,
    },
    /// Collection days with a token that is not a number-zone designator.
    #[error("{} row(s) contain an invalid number zone", .rows.len())]
    NumberZone {
        /// Offending rows.
        rows: Vec<RejectedRow>,
    },
    /// Writing the compiled dataset failed.
    #[error("Failed to write dataset {path}: {source}")]
    Write {
        /// Target file.
        path: PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: io::Error,
    },
}

impl CompileError {
    /// Rows that failed validation, empty for other errors.
    #[must_use]
    pub fn rows(&self) -> &[RejectedRow] {
        match self {
            CompileError::PickupCount { rows }
            | CompileError::LetterZone { rows }
            | CompileError::NumberZone { rows } => rows,
            _ => &[],
        }
    }
}

/// Cell with its materialized date.
struct DatedCell<'a> {
    record: &'a RawCellRecord,
    date: NaiveDate,
}

/// Collection day with its pickup tokens.
struct Candidate<'a> {
    cell: DatedCell<'a>,
    pickups: &'a [String],
}

impl Candidate<'_> {
    fn rejected(&self) -> RejectedRow {
        RejectedRow {
            month: self.cell.record.month.clone(),
            day: self.cell.record.day,
            date: self.cell.date,
            pickups: self.pickups.to_vec(),
        }
    }
}

/// Compile the raw records of `year` into a schedule table.
///
/// # Errors
///
/// Returns a [`CompileError`] if a cell has no valid date or any collection day
/// fails validation. No partial table is produced.
#[instrument(skip(records, holidays), fields(records = records.len()))]
pub fn compile(
    records: &[RawCellRecord],
    year: i32,
    holidays: &HolidayCalendar,
) -> Result<ScheduleTable, CompileError> {
    let pickups = parse_pickup_records(records, year, holidays)?;
    let table = pivot(&pickups);
    info!(collection_days = pickups.len(), "compiled schedule table");
    Ok(table)
}

/// Run the filtering and validation stages and return one record per collection day.
///
/// # Errors
///
/// See [`compile`].
pub fn parse_pickup_records(
    records: &[RawCellRecord],
    year: i32,
    holidays: &HolidayCalendar,
) -> Result<Vec<PickupRecord>, CompileError> {
    let cells = materialize_dates(drop_placeholders(records), year)?;
    let workdays = drop_holidays(cells, holidays);
    let candidates = extract_pickups(workdays)?;
    let letters = validate_letter_zones(&candidates)?;
    let designators = validate_number_zones(&candidates)?;

    Ok(candidates
        .iter()
        .zip(letters)
        .zip(designators)
        .map(
            |((candidate, letter_zone), [residual, organic, paper, packaging])| PickupRecord {
                date: candidate.cell.date,
                letter_zone,
                residual,
                organic,
                paper,
                packaging,
            },
        )
        .collect())
}

fn drop_placeholders(records: &[RawCellRecord]) -> impl Iterator<Item = &RawCellRecord> {
    records.iter().filter(|record| !record.tokens.is_empty())
}

fn materialize_dates<'a>(
    records: impl Iterator<Item = &'a RawCellRecord>,
    year: i32,
) -> Result<Vec<DatedCell<'a>>, CompileError> {
    records
        .map(|record| {
            month_number(&record.month)
                .and_then(|month| NaiveDate::from_ymd_opt(year, month, record.day))
                .map(|date| DatedCell { record, date })
                .ok_or_else(|| CompileError::InvalidDate {
                    month: record.month.clone(),
                    day: record.day,
                    year,
                })
        })
        .collect()
}

fn drop_holidays<'a>(cells: Vec<DatedCell<'a>>, holidays: &HolidayCalendar) -> Vec<DatedCell<'a>> {
    cells
        .into_iter()
        .filter(|cell| !holidays.contains(cell.date))
        .collect()
}

fn extract_pickups<'a>(cells: Vec<DatedCell<'a>>) -> Result<Vec<Candidate<'a>>, CompileError> {
    let candidates: Vec<Candidate<'a>> = cells
        .into_iter()
        .map(|cell| {
            let record: &'a RawCellRecord = cell.record;
            Candidate {
                pickups: record
                    .tokens
                    .get(CALENDAR_FURNITURE_TOKENS..)
                    .unwrap_or_default(),
                cell,
            }
        })
        // A single leftover token marks a day without collection (weekends).
        .filter(|candidate| candidate.pickups.len() > 1)
        .collect();

    let rejected = rejected_rows(&candidates, |candidate| {
        candidate.pickups.len() != PICKUP_SLOTS
    });
    if !rejected.is_empty() {
        report("invalid pickup lists (count != 5)", &rejected);
        return Err(CompileError::PickupCount { rows: rejected });
    }
    Ok(candidates)
}

fn validate_letter_zones(candidates: &[Candidate<'_>]) -> Result<Vec<LetterZone>, CompileError> {
    let letters: Vec<Option<LetterZone>> = candidates
        .iter()
        .map(|candidate| parse_letter_zone(candidate.pickups))
        .collect();

    let rejected: Vec<RejectedRow> = candidates
        .iter()
        .zip(&letters)
        .filter(|(_, letter)| letter.is_none())
        .map(|(candidate, _)| candidate.rejected())
        .collect();
    if !rejected.is_empty() {
        report("invalid pickup letter zones", &rejected);
        return Err(CompileError::LetterZone { rows: rejected });
    }
    Ok(letters.into_iter().flatten().collect())
}

fn validate_number_zones(
    candidates: &[Candidate<'_>],
) -> Result<Vec<[ZoneDesignator; 4]>, CompileError> {
    let designators: Vec<Option<[ZoneDesignator; 4]>> = candidates
        .iter()
        .map(|candidate| parse_designators(candidate.pickups))
        .collect();

    let rejected: Vec<RejectedRow> = candidates
        .iter()
        .zip(&designators)
        .filter(|(_, designator)| designator.is_none())
        .map(|(candidate, _)| candidate.rejected())
        .collect();
    if !rejected.is_empty() {
        report("invalid number zones", &rejected);
        return Err(CompileError::NumberZone { rows: rejected });
    }
    Ok(designators.into_iter().flatten().collect())
}

fn parse_letter_zone(pickups: &[String]) -> Option<LetterZone> {
    pickups.first()?.parse::<LetterZone>().ok()
}

/// Designators in waste type column order.
fn parse_designators(pickups: &[String]) -> Option<[ZoneDesignator; 4]> {
    let [_, residual, organic, paper, packaging] = pickups else {
        return None;
    };
    Some([
        residual.parse::<ZoneDesignator>().ok()?,
        organic.parse::<ZoneDesignator>().ok()?,
        paper.parse::<ZoneDesignator>().ok()?,
        packaging.parse::<ZoneDesignator>().ok()?,
    ])
}

fn rejected_rows(
    candidates: &[Candidate<'_>],
    is_invalid: impl Fn(&Candidate<'_>) -> bool,
) -> Vec<RejectedRow> {
    candidates
        .iter()
        .filter(|candidate| is_invalid(*candidate))
        .map(Candidate::rejected)
        .collect()
}

fn report(message: &str, rows: &[RejectedRow]) {
    error!(count = rows.len(), "{message}");
    for row in rows {
        error!("  {row}");
    }
}

/// Pivot validated records into the schedule table.
///
/// Every letter/number bucket is present in the result. A record contributes
/// to the `(letter, number)` bucket with every waste type whose designator
/// contains `number`.
#[must_use]
pub fn pivot(records: &[PickupRecord]) -> ScheduleTable {
    let mut table = ScheduleTable::default();
    for letter in LetterZone::ALL {
        for number in NumberZone::ALL {
            let schedule = table.zone_mut(ZoneCode::new(letter, number));
            for record in records.iter().filter(|record| record.letter_zone == letter) {
                let waste_types: Vec<WasteType> = record.waste_types_for(number);
                if !waste_types.is_empty() {
                    schedule.insert(record.date, waste_types);
                }
            }
        }
    }
    table
}

/// Compile the raw tables of the configured year and write the dataset.
///
/// Nothing is written when compilation fails.
///
/// # Errors
///
/// Returns a [`CompileError`] if loading, compiling or writing fails.
#[instrument(skip(config), fields(year = config.year))]
pub fn compile_year(config: &PipelineConfig) -> Result<PathBuf, CompileError> {
    let records = raw_table::load_year(&config.ocr_results_dir, config.year)?;
    let holidays = HolidayCalendar::bavaria(config.year).with_regional_holidays(config.year);
    let table = compile(&records, config.year, &holidays)?;

    let path = config.dataset_path();
    write_table(&path, &table).map_err(|source| CompileError::Write {
        path: path.clone(),
        source,
    })?;
    Ok(path)
}
