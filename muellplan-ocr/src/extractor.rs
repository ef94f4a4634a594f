use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use image::DynamicImage;
use muellplan_core::RawCellRecord;
use muellplan_core::config::{GridConfig, PageConfig, PipelineConfig};
use muellplan_core::raw_table::{RawTableError, write_records};
use rayon::prelude::*;
use thiserror::Error;
use tracing::{debug, info, instrument};

use crate::digitizer::CellDigitizer;
use crate::grid::{CellBox, grid_cells};
use crate::recognizer::TextRecognizer;

#[derive(Debug, Error)]
/// Failure while turning calendar pages into raw tables.
pub enum ExtractError {
    /// The page image could not be opened or decoded.
    #[error("failed to load page {path}: {source}")]
    Image {
        /// Page image path.
        path: PathBuf,
        /// Underlying error.
        source: image::ImageError,
    },
    /// The crop box does not select any pixels of the page.
    #[error("crop box {crop:?} is outside the {width}x{height} page {path}")]
    Crop {
        /// Page image path.
        path: PathBuf,
        /// Requested `(left, top, right, bottom)` box.
        crop: [u32; 4],
        /// Page width.
        width: u32,
        /// Page height.
        height: u32,
    },
    /// The grid has no rows or no columns.
    #[error("invalid grid of {cols} columns and {rows} rows")]
    InvalidGrid {
        /// Configured rows.
        rows: u32,
        /// Configured columns.
        cols: u32,
    },
    /// The raw table could not be written.
    #[error(transparent)]
    RawTable(#[from] RawTableError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// Number of digitized cells out of the cells of the page.
pub struct Progress {
    /// Cells finished so far.
    pub done: usize,
    /// Cells of the page.
    pub total: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// Month labels and grid geometry of one calendar page.
pub struct CalendarLayout {
    /// Label of every column, left to right.
    pub months: Vec<String>,
    /// Day rows per column.
    pub rows: u32,
    /// Month columns.
    pub cols: u32,
    /// Pixels each cell is grown by on every side.
    pub overlap_px: u32,
}

impl CalendarLayout {
    /// Layout with the given month labels and grid geometry.
    #[must_use]
    pub fn new(months: Vec<String>, grid: &GridConfig) -> Self {
        Self {
            months,
            rows: grid.rows,
            cols: grid.cols,
            overlap_px: grid.overlap_px,
        }
    }

    fn month(&self, col: u32) -> String {
        usize::try_from(col)
            .ok()
            .and_then(|index| self.months.get(index))
            .cloned()
            .unwrap_or_default()
    }
}

/// Digitizes every cell of a calendar grid image.
pub struct CalendarExtractor {
    digitizer: CellDigitizer,
    parallel: bool,
}

impl CalendarExtractor {
    /// Creates an extractor, digitizing cells on the rayon pool if `parallel` is set.
    #[must_use]
    pub fn new(digitizer: CellDigitizer, parallel: bool) -> Self {
        Self {
            digitizer,
            parallel,
        }
    }

    /// Extracts one raw record per valid cell of `page`, columns first.
    ///
    /// `page` must already be cropped to the grid. `progress` is called after
    /// every digitized cell; in parallel mode the calls come from worker threads.
    ///
    /// # Errors
    ///
    /// Returns [`ExtractError::InvalidGrid`] if the layout has no rows or columns.
    #[instrument(skip_all, fields(cols = layout.cols, rows = layout.rows))]
    pub fn extract(
        &self,
        page: &DynamicImage,
        layout: &CalendarLayout,
        progress: &(dyn Fn(Progress) + Sync),
    ) -> Result<Vec<RawCellRecord>, ExtractError> {
        if layout.rows == 0 || layout.cols == 0 {
            return Err(ExtractError::InvalidGrid {
                rows: layout.rows,
                cols: layout.cols,
            });
        }
        let cells = grid_cells(
            page.width(),
            page.height(),
            layout.cols,
            layout.rows,
            layout.overlap_px,
        );
        let total = cells.len();
        let done = AtomicUsize::new(0);
        info!(cells = total, engine = self.digitizer.engine(), "digitizing calendar");

        let digitize = |cell: &CellBox| {
            let record = self.digitize_cell(page, layout, cell);
            let finished = done.fetch_add(1, Ordering::Relaxed) + 1;
            progress(Progress {
                done: finished,
                total,
            });
            record
        };
        let records = if self.parallel {
            cells.par_iter().map(digitize).collect()
        } else {
            cells.iter().map(digitize).collect()
        };
        Ok(records)
    }

    fn digitize_cell(
        &self,
        page: &DynamicImage,
        layout: &CalendarLayout,
        cell: &CellBox,
    ) -> RawCellRecord {
        let crop = page.crop_imm(cell.left, cell.top, cell.width(), cell.height());
        let tokens = self.digitizer.digitize(&crop);
        let record = RawCellRecord {
            month: layout.month(cell.col),
            day: cell.row + 1,
            tokens,
        };
        debug!(month = %record.month, day = record.day, tokens = ?record.tokens, "cell digitized");
        record
    }

    /// Loads, crops and extracts one configured page.
    ///
    /// # Errors
    ///
    /// Returns an error if the page cannot be loaded or the grid is invalid.
    pub fn extract_page(
        &self,
        page: &PageConfig,
        grid: &GridConfig,
        progress: &(dyn Fn(Progress) + Sync),
    ) -> Result<Vec<RawCellRecord>, ExtractError> {
        let image = load_page(&page.image, page.crop)?;
        self.extract(&image, &CalendarLayout::new(page.months.clone(), grid), progress)
    }
}

/// Opens a page image and crops it to the `(left, top, right, bottom)` box.
///
/// The box is clamped to the page.
///
/// # Errors
///
/// Returns an error if the image cannot be decoded or the clamped box is empty.
pub fn load_page(path: &Path, crop: [u32; 4]) -> Result<DynamicImage, ExtractError> {
    let image = image::open(path).map_err(|source| ExtractError::Image {
        path: path.to_path_buf(),
        source,
    })?;
    let [left, top, crop_right, crop_bottom] = crop;
    let right = crop_right.min(image.width());
    let bottom = crop_bottom.min(image.height());
    if right <= left || bottom <= top {
        return Err(ExtractError::Crop {
            path: path.to_path_buf(),
            crop,
            width: image.width(),
            height: image.height(),
        });
    }
    Ok(image.crop_imm(left, top, right - left, bottom - top))
}

/// Extracts every configured page and writes one raw table per page.
///
/// Returns the written CSV paths in page order.
///
/// # Errors
///
/// Returns the first page loading, grid or write error.
#[instrument(skip_all, fields(year = config.year, pages = config.pages.len()))]
pub fn extract_pages(
    config: &PipelineConfig,
    recognizer: Arc<dyn TextRecognizer>,
    progress: &(dyn Fn(&Path, Progress) + Sync),
) -> Result<Vec<PathBuf>, ExtractError> {
    let extractor = CalendarExtractor::new(
        CellDigitizer::new(recognizer, config.preprocess),
        config.parallel,
    );
    let mut written = Vec::with_capacity(config.pages.len());
    for (index, page) in config.pages.iter().enumerate() {
        info!(image = %page.image.display(), "extracting page");
        let records = extractor.extract_page(page, &config.grid, &|step| {
            progress(&page.image, step);
        })?;
        let path = config.ocr_csv_path(index, page);
        write_records(&path, &records)?;
        info!(path = %path.display(), records = records.len(), "raw table written");
        written.push(path);
    }
    Ok(written)
}
