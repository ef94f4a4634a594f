use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use image::{DynamicImage, GrayImage, Luma};
use muellplan_core::config::{GridConfig, PageConfig, PipelineConfig, PreprocessConfig};
use muellplan_core::raw_table::read_records;
use muellplan_ocr::{
    CalendarExtractor, CalendarLayout, CellDigitizer, ExtractError, OcrError, Progress,
    TextRecognizer, extract_pages, load_page,
};
use parking_lot::Mutex;

const CELL_WIDTH: u32 = 10;
const CELL_HEIGHT: u32 = 4;

/// Reports the gray level at the center of the cell.
#[derive(Default)]
struct CenterPixelRecognizer {
    calls: AtomicUsize,
}

impl TextRecognizer for CenterPixelRecognizer {
    fn name(&self) -> &str {
        "center-pixel"
    }

    fn recognize(&self, image: &GrayImage) -> Result<Vec<String>, OcrError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let value = image.get_pixel(image.width() / 2, image.height() / 2).0[0];
        Ok(vec![format!(" {value} ")])
    }
}

struct BrokenRecognizer;

impl TextRecognizer for BrokenRecognizer {
    fn name(&self) -> &str {
        "broken"
    }

    fn recognize(&self, _image: &GrayImage) -> Result<Vec<String>, OcrError> {
        Err(OcrError::Engine {
            engine: String::from("broken"),
            message: String::from("no engine"),
        })
    }
}

fn passthrough() -> PreprocessConfig {
    PreprocessConfig {
        clahe_tiles: 0,
        bilateral_diameter: 0,
        upscale: 1,
        ..PreprocessConfig::default()
    }
}

fn grid() -> GridConfig {
    GridConfig {
        overlap_px: 0,
        ..GridConfig::default()
    }
}

fn months() -> Vec<String> {
    ["Jan", "Feb", "Mar", "Apr", "May", "Jun"]
        .into_iter()
        .map(String::from)
        .collect()
}

fn cell_value(col: u32, row: u32) -> u8 {
    u8::try_from(col * 31 + row + 1).unwrap()
}

/// A 6 × 31 calendar whose cells are filled with distinct gray levels.
fn calendar() -> GrayImage {
    GrayImage::from_fn(6 * CELL_WIDTH, 31 * CELL_HEIGHT, |x_pos, y_pos| {
        Luma([cell_value(x_pos / CELL_WIDTH, y_pos / CELL_HEIGHT)])
    })
}

fn extractor(recognizer: Arc<dyn TextRecognizer>, parallel: bool) -> CalendarExtractor {
    CalendarExtractor::new(CellDigitizer::new(recognizer, passthrough()), parallel)
}

fn no_progress(_: Progress) {}

#[test]
fn test_cells_are_read_columns_first() {
    let recognizer = Arc::new(CenterPixelRecognizer::default());
    let layout = CalendarLayout::new(months(), &grid());

    let records = extractor(recognizer.clone(), false)
        .extract(&DynamicImage::ImageLuma8(calendar()), &layout, &no_progress)
        .unwrap();

    assert_eq!(records.len(), 6 * 31);
    assert_eq!(recognizer.calls.load(Ordering::SeqCst), 6 * 31);
    assert_eq!((records[0].month.as_str(), records[0].day), ("Jan", 1));
    assert_eq!((records[30].month.as_str(), records[30].day), ("Jan", 31));
    assert_eq!((records[31].month.as_str(), records[31].day), ("Feb", 1));
    for record in &records {
        let index = months()
            .iter()
            .position(|label| *label == record.month)
            .unwrap();
        let col = u32::try_from(index).unwrap();
        let expected = cell_value(col, record.day - 1).to_string();
        assert_eq!(record.tokens, vec![expected], "{} {}", record.month, record.day);
    }
}

#[test]
fn test_parallel_extraction_keeps_order() {
    let page = DynamicImage::ImageLuma8(calendar());
    let layout = CalendarLayout::new(months(), &grid());

    let sequential = extractor(Arc::new(CenterPixelRecognizer::default()), false)
        .extract(&page, &layout, &no_progress)
        .unwrap();
    let parallel = extractor(Arc::new(CenterPixelRecognizer::default()), true)
        .extract(&page, &layout, &no_progress)
        .unwrap();

    assert_eq!(sequential, parallel);
}

#[test]
fn test_progress_counts_every_cell() {
    let seen = Mutex::new(Vec::new());
    let layout = CalendarLayout::new(months(), &grid());

    extractor(Arc::new(CenterPixelRecognizer::default()), true)
        .extract(&DynamicImage::ImageLuma8(calendar()), &layout, &|step| {
            seen.lock().push(step);
        })
        .unwrap();

    let mut done: Vec<usize> = seen.lock().iter().map(|step| step.done).collect();
    done.sort_unstable();
    assert_eq!(done, (1..=186).collect::<Vec<_>>());
    assert!(seen.lock().iter().all(|step| step.total == 186));
}

#[test]
fn test_missing_month_labels_are_empty() {
    let layout = CalendarLayout::new(vec![String::from("Jul")], &grid());

    let records = extractor(Arc::new(CenterPixelRecognizer::default()), false)
        .extract(&DynamicImage::ImageLuma8(calendar()), &layout, &no_progress)
        .unwrap();

    assert_eq!(records[0].month, "Jul");
    assert_eq!(records[31].month, "");
}

#[test]
fn test_overlap_is_clamped_at_the_border() {
    let layout = CalendarLayout::new(months(), &GridConfig::default());

    let records = extractor(Arc::new(CenterPixelRecognizer::default()), false)
        .extract(&DynamicImage::ImageLuma8(calendar()), &layout, &no_progress)
        .unwrap();

    assert_eq!(records.len(), 6 * 31);
}

#[test]
fn test_empty_grid_is_rejected() {
    let layout = CalendarLayout {
        months: months(),
        rows: 0,
        cols: 6,
        overlap_px: 4,
    };

    let err = extractor(Arc::new(CenterPixelRecognizer::default()), false)
        .extract(&DynamicImage::ImageLuma8(calendar()), &layout, &no_progress)
        .unwrap_err();

    assert!(matches!(err, ExtractError::InvalidGrid { rows: 0, cols: 6 }));
}

#[test]
fn test_recognizer_failure_yields_empty_tokens() {
    let layout = CalendarLayout::new(months(), &grid());

    let records = extractor(Arc::new(BrokenRecognizer), true)
        .extract(&DynamicImage::ImageLuma8(calendar()), &layout, &no_progress)
        .unwrap();

    assert_eq!(records.len(), 6 * 31);
    assert!(records.iter().all(|record| record.tokens.is_empty()));
}

#[test]
fn test_empty_cell_skips_recognition() {
    let recognizer = Arc::new(CenterPixelRecognizer::default());
    let digitizer = CellDigitizer::new(recognizer.clone(), PreprocessConfig::default());

    let tokens = digitizer.digitize(&DynamicImage::ImageLuma8(GrayImage::new(0, 0)));

    assert!(tokens.is_empty());
    assert_eq!(recognizer.calls.load(Ordering::SeqCst), 0);
}

#[test]
fn test_default_preprocessing_reaches_the_recognizer() {
    let recognizer = Arc::new(CenterPixelRecognizer::default());
    let digitizer = CellDigitizer::new(recognizer.clone(), PreprocessConfig::default());

    let tokens = digitizer.digitize(&DynamicImage::ImageLuma8(GrayImage::from_pixel(
        30,
        12,
        Luma([200]),
    )));

    assert_eq!(tokens.len(), 1);
    assert_eq!(recognizer.calls.load(Ordering::SeqCst), 1);
}

#[test]
fn test_load_page_crops() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("page.png");
    GrayImage::from_pixel(20, 10, Luma([0])).save(&path).unwrap();

    let cropped = load_page(&path, [5, 2, 15, 8]).unwrap();
    assert_eq!((cropped.width(), cropped.height()), (10, 6));

    let clamped = load_page(&path, [5, 2, 500, 500]).unwrap();
    assert_eq!((clamped.width(), clamped.height()), (15, 8));

    let err = load_page(&path, [25, 0, 30, 10]).unwrap_err();
    assert!(matches!(err, ExtractError::Crop { .. }));

    let err = load_page(&dir.path().join("missing.png"), [0, 0, 1, 1]).unwrap_err();
    assert!(matches!(err, ExtractError::Image { .. }));
}

#[test]
fn test_extract_pages_writes_raw_tables() {
    let dir = tempfile::tempdir().unwrap();
    let image = dir.path().join("first-half.png");
    let mut page = GrayImage::from_pixel(100, 150, Luma([255]));
    for (x_pos, y_pos, pixel) in calendar().enumerate_pixels() {
        page.put_pixel(x_pos + 20, y_pos + 10, *pixel);
    }
    page.save(&image).unwrap();

    let config = PipelineConfig {
        year: 2026,
        ocr_results_dir: dir.path().join("ocr"),
        pages: vec![PageConfig {
            image,
            crop: [20, 10, 80, 134],
            months: months(),
            output: None,
        }],
        grid: grid(),
        preprocess: passthrough(),
        ..PipelineConfig::default()
    };

    let written = extract_pages(
        &config,
        Arc::new(CenterPixelRecognizer::default()),
        &|_, _| {},
    )
    .unwrap();

    assert_eq!(written, vec![dir.path().join("ocr").join("01_06_2026.csv")]);
    let records = read_records(&written[0]).unwrap();
    assert_eq!(records.len(), 6 * 31);
    assert_eq!(records[32].month, "Feb");
    assert_eq!(records[32].day, 2);
    assert_eq!(records[32].tokens, vec![cell_value(1, 1).to_string()]);
}
