//! CSV storage for raw OCR cell records.
//!
//! One file holds the cells of one calendar page with the columns `Month`,
//! `Day` and `Text`. `Text` is the token list encoded as a JSON array; list
//! literals with single quoted items (`['2', 'Do', 'C']`) are read as well.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::model::RawCellRecord;

#[derive(thiserror::Error, Debug)]
/// Errors that can occur while reading or writing raw cell tables.
pub enum RawTableError {
    /// File system access failed.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    /// The CSV layer failed.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    /// A `Text` column could not be decoded into tokens.
    #[error("Invalid token list {text:?} in {path}")]
    TokenList {
        /// File containing the row.
        path: PathBuf,
        /// Offending column content.
        text: String,
    },
    /// No raw table exists for the requested year.
    #[error("No CSV files found for year {year} in {dir}")]
    NoInput {
        /// Directory that was searched.
        dir: PathBuf,
        /// Requested year.
        year: i32,
    },
}

#[derive(Debug, Serialize, Deserialize)]
struct CsvRow {
    #[serde(rename = "Month", default)]
    month: String,
    #[serde(rename = "Day")]
    day: u32,
    #[serde(rename = "Text", default)]
    text: String,
}

/// Month number (1–12) for an English or German month name or abbreviation.
#[must_use]
pub fn month_number(label: &str) -> Option<u32> {
    let lower = label.trim().trim_end_matches('.').to_lowercase();
    let number = match lower.as_str() {
        "jan" | "january" | "januar" | "jän" | "jänner" => 1,
        "feb" | "february" | "februar" => 2,
        "mar" | "march" | "mär" | "märz" | "maerz" => 3,
        "apr" | "april" => 4,
        "may" | "mai" => 5,
        "jun" | "june" | "juni" => 6,
        "jul" | "july" | "juli" => 7,
        "aug" | "august" => 8,
        "sep" | "sept" | "september" => 9,
        "oct" | "october" | "okt" | "oktober" => 10,
        "nov" | "november" => 11,
        "dec" | "december" | "dez" | "dezember" => 12,
        _ => return None,
    };
    Some(number)
}

/// File name for the raw table of a page covering `months`, e.g. `01_06_2026.csv`.
///
/// Returns `None` if the first or last month label is not a month name.
#[must_use]
pub fn page_file_name(months: &[String], year: i32) -> Option<String> {
    let first = month_number(months.first()?)?;
    let last = month_number(months.last()?)?;
    Some(format!("{first:02}_{last:02}_{year}.csv"))
}

/// Encode tokens for the `Text` column.
#[must_use]
pub fn encode_tokens(tokens: &[String]) -> String {
    serde_json::to_string(tokens).unwrap_or_else(|_| String::from("[]"))
}

/// Decode a `Text` column. Empty text decodes to an empty token list.
#[must_use]
pub fn decode_tokens(text: &str) -> Option<Vec<String>> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Some(Vec::new());
    }
    if let Ok(tokens) = serde_json::from_str::<Vec<String>>(trimmed) {
        return Some(tokens);
    }

    let inner = trimmed.strip_prefix('[')?.strip_suffix(']')?;
    decode_quoted_items(inner)
}

/// Splits the items of a quoted list literal such as `'11', 'Di', '1,2'`.
///
/// Separators inside quotes belong to the item.
fn decode_quoted_items(items: &str) -> Option<Vec<String>> {
    let mut tokens = Vec::new();
    let mut rest = items.trim_start();
    while !rest.is_empty() {
        let quote = rest.chars().next().filter(|mark| matches!(mark, '\'' | '"'))?;
        let (token, after) = rest.strip_prefix(quote)?.split_once(quote)?;
        tokens.push(token.to_owned());
        rest = after.trim_start();
        if !rest.is_empty() {
            rest = rest.strip_prefix(',')?.trim_start();
        }
    }
    Some(tokens)
}

/// Write records to a CSV file, creating parent directories.
///
/// # Errors
///
/// Returns a [`RawTableError`] if the file cannot be written.
pub fn write_records(path: &Path, records: &[RawCellRecord]) -> Result<(), RawTableError> {
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    let mut writer = csv::Writer::from_path(path)?;
    for record in records {
        writer.serialize(CsvRow {
            month: record.month.clone(),
            day: record.day,
            text: encode_tokens(&record.tokens),
        })?;
    }
    writer.flush()?;
    info!(path = %path.display(), rows = records.len(), "wrote raw cell table");
    Ok(())
}

/// Read records from a CSV file.
///
/// # Errors
///
/// Returns a [`RawTableError`] if the file cannot be read or a row is malformed.
pub fn read_records(path: &Path) -> Result<Vec<RawCellRecord>, RawTableError> {
    let mut reader = csv::Reader::from_path(path)?;
    let mut records = Vec::new();
    for row in reader.deserialize::<CsvRow>() {
        let row = row?;
        let tokens = decode_tokens(&row.text).ok_or_else(|| RawTableError::TokenList {
            path: path.to_path_buf(),
            text: row.text.clone(),
        })?;
        records.push(RawCellRecord {
            month: row.month,
            day: row.day,
            tokens,
        });
    }
    debug!(path = %path.display(), rows = records.len(), "read raw cell table");
    Ok(records)
}

/// CSV files in `dir` whose name contains `year`, sorted by name.
///
/// # Errors
///
/// Returns [`RawTableError::Io`] if the directory cannot be listed.
pub fn year_files(dir: &Path, year: i32) -> Result<Vec<PathBuf>, RawTableError> {
    let year_text = year.to_string();
    let mut files = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        let is_csv = path
            .extension()
            .is_some_and(|extension| extension.eq_ignore_ascii_case("csv"));
        let matches_year = path
            .file_name()
            .and_then(|name| name.to_str())
            .is_some_and(|name| name.contains(&year_text));
        if is_csv && matches_year {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// Read and concatenate all raw tables of a year.
///
/// # Errors
///
/// Returns [`RawTableError::NoInput`] if no file matches the year, or any error
/// from reading the files.
pub fn load_year(dir: &Path, year: i32) -> Result<Vec<RawCellRecord>, RawTableError> {
    let files = year_files(dir, year)?;
    if files.is_empty() {
        return Err(RawTableError::NoInput {
            dir: dir.to_path_buf(),
            year,
        });
    }

    let mut records = Vec::new();
    for file in &files {
        records.extend(read_records(file)?);
    }
    info!(files = files.len(), rows = records.len(), year, "loaded raw cell tables");
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_json_and_quoted_lists() {
        let expected = vec!["2".to_owned(), "Do".to_owned(), "1/2".to_owned()];
        assert_eq!(decode_tokens(r#"["2","Do","1/2"]"#), Some(expected.clone()));
        assert_eq!(decode_tokens("['2', 'Do', '1/2']"), Some(expected));
        assert_eq!(decode_tokens("[]"), Some(Vec::new()));
        assert_eq!(decode_tokens(""), Some(Vec::new()));
        assert_eq!(decode_tokens("2 Do"), None);
    }

    #[test]
    fn quoted_items_may_contain_commas() {
        let tokens = decode_tokens("['11', 'Di', 'A', '1,2', '3', \"it's\"]").unwrap();
        assert_eq!(tokens, ["11", "Di", "A", "1,2", "3", "it's"]);
        assert_eq!(decode_tokens("['11', 'Di'"), None);
        assert_eq!(decode_tokens("['11' 'Di']"), None);
        assert_eq!(decode_tokens("['11', ]"), Some(vec!["11".to_owned()]));
    }

    #[test]
    fn legacy_rows_with_commas_are_read() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("01_06_2025.csv");
        fs::write(
            &path,
            "Month,Day,Text\nMar,10,\"['11', 'Di', 'A', '1,2', '3', '4', '2']\"\nMar,31,[]\n",
        )
        .unwrap();

        let records = read_records(&path).unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].tokens, ["11", "Di", "A", "1,2", "3", "4", "2"]);
        assert!(records[1].tokens.is_empty());
    }

    #[test]
    fn month_names_in_both_locales() {
        assert_eq!(month_number("Mar"), Some(3));
        assert_eq!(month_number("März"), Some(3));
        assert_eq!(month_number("okt."), Some(10));
        assert_eq!(month_number("Dec"), Some(12));
        assert_eq!(month_number("Foo"), None);
    }

    #[test]
    fn page_file_name_uses_month_range() {
        let months: Vec<String> = ["Jul", "Aug", "Sep", "Oct", "Nov", "Dec"]
            .into_iter()
            .map(str::to_owned)
            .collect();
        assert_eq!(page_file_name(&months, 2026).as_deref(), Some("07_12_2026.csv"));
        assert_eq!(page_file_name(&[], 2026), None);
    }
}
