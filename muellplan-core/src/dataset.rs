//! Persistence of compiled schedule tables as JSON documents.

use std::fs::{self, File};
use std::io::{self, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{debug, info};

use crate::model::{ScheduleTable, ZoneCode, ZoneSchedule};
use crate::ports::ScheduleStore;

#[derive(thiserror::Error, Debug)]
/// Errors that can occur while reading a compiled dataset.
pub enum DatasetError {
    /// The dataset file does not exist or cannot be opened.
    #[error("Waste collection schedule data file not found: {path}")]
    Unavailable {
        /// File that was requested.
        path: PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: io::Error,
    },
    /// The dataset file is not a valid schedule document.
    #[error("Waste collection schedule data file is corrupted: {path}")]
    Corrupted {
        /// File that failed to parse.
        path: PathBuf,
        /// Underlying parse failure.
        #[source]
        source: serde_json::Error,
    },
    /// The requested zone is not part of the dataset.
    #[error("Zone '{0}' not found in waste collection data")]
    ZoneNotFound(ZoneCode),
}

impl DatasetError {
    /// Whether this is a lookup miss rather than a data error.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, DatasetError::ZoneNotFound(_))
    }
}

/// File name of the compiled dataset of a year.
#[must_use]
pub fn dataset_file_name(year: i32) -> String {
    format!("waste-collection-{year}.json")
}

/// Read a compiled schedule table from disk.
///
/// # Errors
///
/// Returns [`DatasetError::Unavailable`] if the file cannot be opened and
/// [`DatasetError::Corrupted`] if it does not parse.
pub fn read_table(path: &Path) -> Result<ScheduleTable, DatasetError> {
    let file = File::open(path).map_err(|source| DatasetError::Unavailable {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_reader(BufReader::new(file)).map_err(|source| DatasetError::Corrupted {
        path: path.to_path_buf(),
        source,
    })
}

/// Write a schedule table as pretty printed UTF-8 JSON, creating parent directories.
///
/// # Errors
///
/// Returns an I/O error if the file cannot be created or written.
pub fn write_table(path: &Path, table: &ScheduleTable) -> io::Result<()> {
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    let mut writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(&mut writer, table)?;
    writer.write_all(b"\n")?;
    writer.flush()?;
    info!(path = %path.display(), "wrote schedule dataset");
    Ok(())
}

impl ScheduleStore for ScheduleTable {
    fn zone_schedule(&self, zone: ZoneCode) -> Result<ZoneSchedule, DatasetError> {
        self.zone(zone)
            .cloned()
            .ok_or(DatasetError::ZoneNotFound(zone))
    }

    fn zone_codes(&self) -> Result<Vec<ZoneCode>, DatasetError> {
        Ok(self.zones().collect())
    }
}

/// Schedule store backed by one or more JSON dataset files.
///
/// Files are read lazily on first use and merged in the given order. A failed
/// read is reported to the caller and retried on the next request.
pub struct JsonScheduleStore {
    paths: Vec<PathBuf>,
    table: RwLock<Option<Arc<ScheduleTable>>>,
}

impl JsonScheduleStore {
    /// Create a store reading the given dataset files.
    #[must_use]
    pub fn new(paths: Vec<PathBuf>) -> Self {
        Self {
            paths,
            table: RwLock::new(None),
        }
    }

    /// Create a store for a single dataset file.
    #[must_use]
    pub fn single<P: Into<PathBuf>>(path: P) -> Self {
        Self::new(vec![path.into()])
    }

    /// Loaded table, reading the dataset files if necessary.
    ///
    /// # Errors
    ///
    /// Returns a [`DatasetError`] if any dataset file is missing or corrupted.
    pub fn table(&self) -> Result<Arc<ScheduleTable>, DatasetError> {
        if let Some(table) = self.table.read().as_ref() {
            return Ok(Arc::clone(table));
        }

        let mut guard = self.table.write();
        if let Some(table) = guard.as_ref() {
            return Ok(Arc::clone(table));
        }

        let mut merged = ScheduleTable::default();
        for path in &self.paths {
            debug!(path = %path.display(), "loading schedule dataset");
            merged.merge(read_table(path)?);
        }
        let table = Arc::new(merged);
        *guard = Some(Arc::clone(&table));
        Ok(table)
    }
}

impl ScheduleStore for JsonScheduleStore {
    fn zone_schedule(&self, zone: ZoneCode) -> Result<ZoneSchedule, DatasetError> {
        self.table()?.zone_schedule(zone)
    }

    fn zone_codes(&self) -> Result<Vec<ZoneCode>, DatasetError> {
        Ok(self.table()?.zones().collect())
    }
}
