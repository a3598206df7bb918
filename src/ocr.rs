use image::{DynamicImage, GrayImage};
use ocrs::{ImageSource, OcrEngine, OcrEngineParams};
use rten::Model;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::ticker;

/// Anything that can read the text of a cleaned binary image.
///
/// Implementations return the normalised ticker, or `None` when nothing
/// readable was found.
pub trait TextRecognizer {
    fn text_for_image(&self, image: &GrayImage) -> anyhow::Result<Option<String>>;
}

/// Local recognizer backed by the `ocrs` engine
pub struct OcrsRecognizer {
    engine: OcrEngine,
}

impl OcrsRecognizer {
    /// Load the models from the standard cache location
    pub fn from_cache() -> anyhow::Result<Self> {
        Self::from_dir(&default_model_dir()?)
    }

    /// Load `text-detection.rten` and `text-recognition.rten` from `dir`
    pub fn from_dir(dir: &Path) -> anyhow::Result<Self> {
        let detection_model_path = dir.join("text-detection.rten");
        let recognition_model_path = dir.join("text-recognition.rten");

        if !detection_model_path.exists() || !recognition_model_path.exists() {
            anyhow::bail!(
                "OCR models not found. Please run: ocrs-cli --help (or download models manually)\n\
                 Expected locations:\n  - {}\n  - {}",
                detection_model_path.display(),
                recognition_model_path.display()
            );
        }

        let detection_model = Model::load_file(&detection_model_path)?;
        let recognition_model = Model::load_file(&recognition_model_path)?;

        let engine = OcrEngine::new(OcrEngineParams {
            detection_model: Some(detection_model),
            recognition_model: Some(recognition_model),
            ..Default::default()
        })?;

        Ok(Self { engine })
    }
}

impl TextRecognizer for OcrsRecognizer {
    fn text_for_image(&self, image: &GrayImage) -> anyhow::Result<Option<String>> {
        // The engine expects three channels
        let rgb = DynamicImage::ImageLuma8(image.clone()).to_rgb8();

        let img_source = ImageSource::from_bytes(rgb.as_raw(), rgb.dimensions())?;
        let ocr_input = self.engine.prepare_input(img_source)?;
        let text = self.engine.get_text(&ocr_input)?;
        debug!(raw = %text.trim(), "ocrs output");

        Ok(ticker::longest_ticker(&text))
    }
}

/// `~/.cache/ocrs`, where `ocrs-cli` stores its models
pub fn default_model_dir() -> anyhow::Result<PathBuf> {
    let home_dir = std::env::var("HOME").or_else(|_| std::env::var("USERPROFILE"))?;
    Ok(Path::new(&home_dir).join(".cache/ocrs"))
}
