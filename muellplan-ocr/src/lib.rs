//! Calendar scan digitization: grid partitioning, cell preprocessing and OCR.

/// Cell image to token conversion.
pub mod digitizer;
/// Reads a calendar page cell by cell into raw records.
pub mod extractor;
/// Grid boundaries and cell rectangles.
pub mod grid;
/// Cell image enhancement ahead of recognition.
pub mod preprocess;
/// Text recognition port.
pub mod recognizer;
/// Tesseract backend.
pub mod tesseract;

pub use digitizer::CellDigitizer;
pub use extractor::{
    CalendarExtractor, CalendarLayout, ExtractError, Progress, extract_pages, load_page,
};
pub use grid::{CellBox, cell_box, compute_bounds};
pub use preprocess::Preprocessor;
pub use recognizer::{OcrError, TextRecognizer};
pub use tesseract::TesseractRecognizer;
