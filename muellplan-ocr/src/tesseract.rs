use std::cell::RefCell;
use std::io::Cursor;

use image::{GrayImage, ImageFormat};
use leptess::{LepTess, Variable};
use muellplan_core::config::OcrConfig;
use tracing::{debug, trace};

use crate::recognizer::{OcrError, TextRecognizer};

thread_local! {
    /// Engine of the current worker thread with the settings it was started with.
    static ENGINE: RefCell<Option<(EngineSettings, LepTess)>> = const { RefCell::new(None) };
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct EngineSettings {
    data_path: Option<String>,
    languages: String,
    psm: u8,
}

#[derive(Debug, Clone)]
/// Recognizer backed by the Tesseract library through `leptess`.
///
/// Each worker thread keeps its own engine and reuses it for every cell it
/// reads, so the language data is loaded once per thread.
pub struct TesseractRecognizer {
    settings: EngineSettings,
    resolution: i32,
}

impl TesseractRecognizer {
    /// Creates a recognizer from the OCR settings.
    #[must_use]
    pub fn new(config: &OcrConfig) -> Self {
        Self {
            settings: EngineSettings {
                data_path: config
                    .tessdata_dir
                    .as_deref()
                    .map(|dir| dir.to_string_lossy().into_owned()),
                languages: config.languages.join("+"),
                psm: config.psm,
            },
            resolution: config.source_resolution,
        }
    }

    /// Language argument handed to the engine, e.g. `deu+eng`.
    #[must_use]
    pub fn languages(&self) -> &str {
        &self.settings.languages
    }

    /// Page segmentation mode.
    #[must_use]
    pub const fn psm(&self) -> u8 {
        self.settings.psm
    }

    fn engine(&self) -> String {
        format!("tesseract {}", self.settings.languages)
    }

    fn start(&self) -> Result<LepTess, OcrError> {
        let mut engine = LepTess::new(self.settings.data_path.as_deref(), &self.settings.languages)
            .map_err(|err| OcrError::Init {
                engine: self.engine(),
                message: err.to_string(),
            })?;
        engine
            .set_variable(Variable::TesseditPagesegMode, &self.settings.psm.to_string())
            .map_err(|err| OcrError::Init {
                engine: self.engine(),
                message: err.to_string(),
            })?;
        debug!(
            languages = %self.settings.languages,
            psm = self.settings.psm,
            "tesseract engine started"
        );
        Ok(engine)
    }

    fn read(&self, engine: &mut LepTess, png: &[u8]) -> Result<String, OcrError> {
        let failed = |message: String| OcrError::Engine {
            engine: self.engine(),
            message,
        };
        engine
            .set_image_from_mem(png)
            .map_err(|err| failed(err.to_string()))?;
        engine.set_source_resolution(self.resolution);
        engine.get_utf8_text().map_err(|err| failed(err.to_string()))
    }
}

impl Default for TesseractRecognizer {
    fn default() -> Self {
        Self::new(&OcrConfig::default())
    }
}

impl TextRecognizer for TesseractRecognizer {
    fn name(&self) -> &str {
        "tesseract"
    }

    fn recognize(&self, image: &GrayImage) -> Result<Vec<String>, OcrError> {
        let png = encode_png(image)?;
        let text = ENGINE.with_borrow_mut(|slot| -> Result<String, OcrError> {
            let mut engine = match slot.take() {
                Some((settings, engine)) if settings == self.settings => engine,
                _ => self.start()?,
            };
            let text = self.read(&mut engine, &png);
            *slot = Some((self.settings.clone(), engine));
            text
        })?;

        trace!(text = %text, "tesseract output");
        Ok(text_lines(&text))
    }
}

fn encode_png(image: &GrayImage) -> Result<Vec<u8>, OcrError> {
    let mut cursor = Cursor::new(Vec::new());
    image.write_to(&mut cursor, ImageFormat::Png)?;
    Ok(cursor.into_inner())
}

/// Non-empty trimmed lines of the engine output.
fn text_lines(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_owned)
        .collect()
}
