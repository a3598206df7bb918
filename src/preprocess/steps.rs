use anyhow::Result;

use crate::error::PreprocessError;
use crate::pipeline::{Frame, MetadataValue, PipelineContext, PipelineData, PipelineStep};
use crate::preprocess::contours::GlyphImage;
use crate::preprocess::{binarize, denoise, normalize, realign};

fn unexpected(step: &'static str, expected: &'static str, frame: &Frame) -> anyhow::Error {
    PreprocessError::UnexpectedFrame {
        step,
        expected,
        actual: frame.kind(),
    }
    .into()
}

/// Enhance flat images, convert to grayscale and smooth
pub struct NormalizeStep;

impl PipelineStep for NormalizeStep {
    fn process(&self, data: PipelineData, context: &PipelineContext) -> Result<PipelineData> {
        let Frame::Color(image) = &data.frame else {
            return Err(unexpected("normalize", "color", &data.frame));
        };

        let (gray, enhanced) = normalize::normalize(image, &data.stats, &context.profile);
        Ok(PipelineData {
            frame: Frame::Gray(gray),
            ..data
        }
        .with_metadata("enhanced", MetadataValue::Bool(enhanced)))
    }

    fn name(&self) -> &str {
        "Contrast Normalization"
    }
}

/// Threshold with the branch matching the image polarity
pub struct BinarizeStep;

impl PipelineStep for BinarizeStep {
    fn process(&self, data: PipelineData, context: &PipelineContext) -> Result<PipelineData> {
        let Frame::Gray(gray) = &data.frame else {
            return Err(unexpected("binarize", "gray", &data.frame));
        };

        let (binary, polarity) = binarize::binarize(gray, &data.stats, &data.plan, &context.profile);
        let kernel = data.plan.kernel.size() as i32;
        Ok(PipelineData {
            frame: Frame::Binary(GlyphImage::new(binary)),
            ..data
        }
        .with_metadata("branch", MetadataValue::String(polarity.as_str().to_string()))
        .with_metadata("kernel", MetadataValue::Int(kernel)))
    }

    fn name(&self) -> &str {
        "Polarity Binarization"
    }
}

/// Remove speckle regions
pub struct DenoiseStep;

impl PipelineStep for DenoiseStep {
    fn process(&self, mut data: PipelineData, context: &PipelineContext) -> Result<PipelineData> {
        let removed = match &mut data.frame {
            Frame::Binary(glyphs) => denoise::remove_small_contours(glyphs, &context.profile),
            other => return Err(unexpected("denoise", "binary", other)),
        };
        Ok(data.with_metadata("contours_removed", MetadataValue::Int(removed as i32)))
    }

    fn name(&self) -> &str {
        "Contour Denoise"
    }
}

/// Move vertically misplaced regions back to the centre line
pub struct RealignStep;

impl PipelineStep for RealignStep {
    fn process(&self, mut data: PipelineData, context: &PipelineContext) -> Result<PipelineData> {
        let moved = match &mut data.frame {
            Frame::Binary(glyphs) => {
                let (width, height) = glyphs.dimensions();
                realign::realign_contours(glyphs, width, height / 2, &context.profile)
            }
            other => return Err(unexpected("realign", "binary", other)),
        };
        Ok(data.with_metadata("contours_relocated", MetadataValue::Int(moved as i32)))
    }

    fn name(&self) -> &str {
        "Contour Realign"
    }
}
