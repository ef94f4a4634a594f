use image::GrayImage;
use thiserror::Error;

#[derive(Debug, Error)]
/// Failure of a text recognition backend.
pub enum OcrError {
    /// The cell could not be encoded for the engine.
    #[error("failed to encode cell image: {0}")]
    Encode(#[from] image::ImageError),
    /// The engine could not be started with the requested settings.
    #[error("failed to start OCR engine `{engine}`: {message}")]
    Init {
        /// Engine and languages.
        engine: String,
        /// Engine diagnostics.
        message: String,
    },
    /// The engine failed to read the cell.
    #[error("OCR engine `{engine}` failed: {message}")]
    Engine {
        /// Engine and languages.
        engine: String,
        /// Engine diagnostics.
        message: String,
    },
}

/// Recognizes text in a preprocessed grayscale cell.
///
/// Implementations are shared across worker threads.
pub trait TextRecognizer: Send + Sync {
    /// Human readable backend name.
    fn name(&self) -> &str;

    /// Returns the recognized text fragments in reading order.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend fails on this image.
    fn recognize(&self, image: &GrayImage) -> Result<Vec<String>, OcrError>;
}
