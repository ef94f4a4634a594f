//! Pipeline configuration.
//!
//! Configuration is loaded from a JSON file. Every field has a default, so a
//! file only needs to list what differs from it.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::dataset::dataset_file_name;
use crate::raw_table::page_file_name;

/// Default configuration file path.
pub const DEFAULT_CONFIG_PATH: &str = "config/muellplan.json";

#[derive(thiserror::Error, Debug)]
/// Errors that can occur while loading the configuration.
pub enum ConfigError {
    /// The file could not be read.
    #[error("Failed to read config file {path}: {source}")]
    Read {
        /// Config file.
        path: PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: io::Error,
    },
    /// The file is not valid configuration JSON.
    #[error("Failed to parse config file {path}: {source}")]
    Parse {
        /// Config file.
        path: PathBuf,
        /// Underlying parse failure.
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
/// Settings for extraction, compilation and querying.
pub struct PipelineConfig {
    /// Year of the collection calendar.
    pub year: i32,
    /// Directory holding the raw cell CSV tables.
    pub ocr_results_dir: PathBuf,
    /// Directory holding the compiled JSON datasets.
    pub dataset_dir: PathBuf,
    /// Calendar pages to extract, usually one per half-year.
    pub pages: Vec<PageConfig>,
    /// Calendar grid layout.
    pub grid: GridConfig,
    /// Cell image preprocessing.
    pub preprocess: PreprocessConfig,
    /// OCR engine settings.
    pub ocr: OcrConfig,
    /// Digitize cells on a worker pool.
    pub parallel: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            year: 2026,
            ocr_results_dir: PathBuf::from("resources/ocr_results"),
            dataset_dir: PathBuf::from("resources/waste_collection_api_data"),
            pages: Vec::new(),
            grid: GridConfig::default(),
            preprocess: PreprocessConfig::default(),
            ocr: OcrConfig::default(),
            parallel: true,
        }
    }
}

impl PipelineConfig {
    /// Load configuration from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if the file cannot be read or parsed.
    pub fn from_file<P: AsRef<Path>>(config_path: P) -> Result<Self, ConfigError> {
        let path = config_path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Load configuration from `path`, or the defaults if the file does not exist.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if the file exists but cannot be read or parsed.
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        if path.as_ref().exists() {
            Self::from_file(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Path of the compiled dataset of the configured year.
    #[must_use]
    pub fn dataset_path(&self) -> PathBuf {
        self.dataset_dir.join(dataset_file_name(self.year))
    }

    /// Path of the raw cell table of a page.
    ///
    /// Uses the page's explicit output name, otherwise one derived from its
    /// month range, otherwise `page_<index>_<year>.csv`.
    #[must_use]
    pub fn ocr_csv_path(&self, index: usize, page: &PageConfig) -> PathBuf {
        let name = page
            .output
            .clone()
            .or_else(|| page_file_name(&page.months, self.year))
            .unwrap_or_else(|| format!("page_{index}_{}.csv", self.year));
        self.ocr_results_dir.join(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
/// One scanned calendar page.
pub struct PageConfig {
    /// Raster image of the page.
    pub image: PathBuf,
    /// Crop box `[left, top, right, bottom]` around the day grid, below the month headers.
    pub crop: [u32; 4],
    /// Month labels of the grid columns, left to right.
    pub months: Vec<String>,
    /// Output CSV file name inside `ocr_results_dir`.
    #[serde(default)]
    pub output: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
/// Layout of the day grid.
pub struct GridConfig {
    /// Day rows.
    pub rows: u32,
    /// Month columns.
    pub cols: u32,
    /// Pixels added around every cell to catch text on the grid lines.
    pub overlap_px: u32,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            rows: 31,
            cols: 6,
            overlap_px: 4,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
/// Parameters of the cell preprocessing chain.
pub struct PreprocessConfig {
    /// CLAHE clip limit relative to the mean histogram bin.
    pub clahe_clip_limit: f32,
    /// CLAHE tiles per axis, `0` skips contrast equalization.
    pub clahe_tiles: u32,
    /// Bilateral filter neighbourhood diameter in pixels, `0` skips denoising.
    pub bilateral_diameter: u32,
    /// Bilateral filter intensity sigma.
    pub bilateral_sigma_color: f32,
    /// Bilateral filter spatial sigma.
    pub bilateral_sigma_space: f32,
    /// Upscale factor applied before recognition, `1` keeps the cell size.
    pub upscale: u32,
}

impl Default for PreprocessConfig {
    fn default() -> Self {
        Self {
            clahe_clip_limit: 3.0,
            clahe_tiles: 8,
            bilateral_diameter: 9,
            bilateral_sigma_color: 75.0,
            bilateral_sigma_space: 75.0,
            upscale: 2,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
/// Settings of the Tesseract OCR engine.
pub struct OcrConfig {
    /// Tesseract language codes, German and English by default.
    pub languages: Vec<String>,
    /// Directory holding the `.traineddata` files, the Tesseract default if unset.
    pub tessdata_dir: Option<PathBuf>,
    /// Page segmentation mode.
    pub psm: u8,
    /// Resolution in DPI reported to the engine for every cell.
    pub source_resolution: i32,
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            languages: vec![String::from("deu"), String::from("eng")],
            tessdata_dir: None,
            psm: 6,
            source_resolution: 300,
        }
    }
}
