use std::sync::Arc;

use image::DynamicImage;
use muellplan_core::config::PreprocessConfig;
use tracing::warn;

use crate::preprocess::Preprocessor;
use crate::recognizer::TextRecognizer;

#[derive(Clone)]
/// Turns one cell image into whitespace separated tokens.
pub struct CellDigitizer {
    recognizer: Arc<dyn TextRecognizer>,
    preprocessor: Preprocessor,
}

impl CellDigitizer {
    /// Creates a digitizer that feeds preprocessed cells to `recognizer`.
    #[must_use]
    pub fn new(recognizer: Arc<dyn TextRecognizer>, settings: PreprocessConfig) -> Self {
        Self {
            recognizer,
            preprocessor: Preprocessor::new(settings),
        }
    }

    /// Name of the recognition backend.
    #[must_use]
    pub fn engine(&self) -> &str {
        self.recognizer.name()
    }

    /// Recognizes the tokens of one cell.
    ///
    /// Never fails: an empty cell or a recognizer error yields no tokens.
    #[must_use]
    pub fn digitize(&self, cell: &DynamicImage) -> Vec<String> {
        if cell.width() == 0 || cell.height() == 0 {
            return Vec::new();
        }
        let prepared = self.preprocessor.apply(cell);
        match self.recognizer.recognize(&prepared) {
            Ok(fragments) => tokenize(&fragments),
            Err(err) => {
                warn!(engine = self.engine(), error = %err, "cell recognition failed");
                Vec::new()
            }
        }
    }
}

/// Joins recognized fragments and splits them on whitespace.
#[must_use]
pub fn tokenize(fragments: &[String]) -> Vec<String> {
    fragments
        .join(" ")
        .split_whitespace()
        .map(str::to_owned)
        .collect()
}
