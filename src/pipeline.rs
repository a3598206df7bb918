use image::{DynamicImage, GrayImage};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use anyhow::Result;
use tracing::{debug, info};

use crate::error::PreprocessError;
use crate::models::{ImageStatistics, MorphologyPlan, ThresholdProfile};
use crate::preprocess::contours::GlyphImage;
use crate::preprocess::statistics;

/// Image as it moves through the stages
#[derive(Debug, Clone)]
pub enum Frame {
    /// Raw input from the loader
    Color(DynamicImage),
    /// Smoothed single-channel image
    Gray(GrayImage),
    /// Two-valued image, glyphs dark on light
    Binary(GlyphImage),
}

impl Frame {
    pub fn kind(&self) -> &'static str {
        match self {
            Frame::Color(_) => "color",
            Frame::Gray(_) => "gray",
            Frame::Binary(_) => "binary",
        }
    }

    pub fn dimensions(&self) -> (u32, u32) {
        match self {
            Frame::Color(img) => (img.width(), img.height()),
            Frame::Gray(img) => img.dimensions(),
            Frame::Binary(img) => img.dimensions(),
        }
    }

    pub fn to_dynamic(&self) -> DynamicImage {
        match self {
            Frame::Color(img) => img.clone(),
            Frame::Gray(img) => DynamicImage::ImageLuma8(img.clone()),
            Frame::Binary(img) => DynamicImage::ImageLuma8(img.pixels().clone()),
        }
    }
}

/// Data that flows through the pipeline for one image
#[derive(Debug, Clone)]
pub struct PipelineData {
    /// Name used in logs and debug file names
    pub name: String,

    pub frame: Frame,

    /// Computed once from the input, never recomputed
    pub stats: ImageStatistics,

    /// Kernel chosen from `stats`, fixed for the whole run
    pub plan: MorphologyPlan,

    /// Decisions taken by the steps (e.g. "branch", "contours_removed")
    pub metadata: HashMap<String, MetadataValue>,
}

/// Metadata value types
#[derive(Debug, Clone, PartialEq)]
pub enum MetadataValue {
    Bool(bool),
    String(String),
    Int(i32),
}

impl PipelineData {
    /// Validate the input and compute the statistics that steer every stage
    pub fn from_image(
        name: impl Into<String>,
        image: Option<DynamicImage>,
        profile: &ThresholdProfile,
    ) -> Result<Self> {
        let name = name.into();
        let image = image.ok_or_else(|| {
            PreprocessError::InvalidImage(format!("{}: loader produced no image", name))
        })?;
        if image.width() == 0 || image.height() == 0 {
            return Err(PreprocessError::InvalidImage(format!(
                "{}: image has zero size ({}x{})",
                name,
                image.width(),
                image.height()
            ))
            .into());
        }

        let stats = statistics::compute(&image, profile);
        let plan = statistics::choose_kernel(&stats, profile);

        Ok(Self {
            name,
            frame: Frame::Color(image),
            stats,
            plan,
            metadata: HashMap::new(),
        })
    }

    /// Add metadata
    pub fn with_metadata(mut self, key: impl Into<String>, value: MetadataValue) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }

    /// Get metadata as bool
    pub fn get_bool(&self, key: &str) -> Option<bool> {
        match self.metadata.get(key) {
            Some(MetadataValue::Bool(v)) => Some(*v),
            _ => None,
        }
    }

    /// Get metadata as string
    pub fn get_string(&self, key: &str) -> Option<&str> {
        match self.metadata.get(key) {
            Some(MetadataValue::String(v)) => Some(v.as_str()),
            _ => None,
        }
    }

    /// Get metadata as int
    pub fn get_int(&self, key: &str) -> Option<i32> {
        match self.metadata.get(key) {
            Some(MetadataValue::Int(v)) => Some(*v),
            _ => None,
        }
    }

    /// The cleaned binary image, once the binarize step has run
    pub fn into_binary(self) -> Result<GrayImage> {
        match self.frame {
            Frame::Binary(glyphs) => Ok(glyphs.into_inner()),
            other => Err(PreprocessError::UnexpectedFrame {
                step: "output",
                expected: "binary",
                actual: other.kind(),
            }
            .into()),
        }
    }
}

/// Debug configuration for pipeline execution
#[derive(Clone, Debug)]
pub struct DebugConfig {
    /// Root directory for debug outputs
    pub output_dir: PathBuf,
}

/// Context available to all pipeline steps
#[derive(Clone)]
pub struct PipelineContext {
    pub profile: Arc<ThresholdProfile>,
    pub debug: Option<DebugConfig>,
}

/// Trait that all pipeline steps must implement
pub trait PipelineStep: Send + Sync {
    /// Transform one image; the output keeps the input's dimensions
    fn process(&self, data: PipelineData, context: &PipelineContext) -> Result<PipelineData>;

    /// Human-readable name for this step (used in logs and debug folders)
    fn name(&self) -> &str;
}

/// Composable pipeline builder
#[derive(Clone)]
pub struct Pipeline {
    steps: Vec<Arc<dyn PipelineStep>>,
    context: PipelineContext,
}

impl Pipeline {
    /// Create a new empty pipeline
    pub fn new(profile: Arc<ThresholdProfile>) -> Self {
        Self {
            steps: Vec::new(),
            context: PipelineContext {
                profile,
                debug: None,
            },
        }
    }

    /// Enable debug mode with output directory
    /// The directory must be empty or non-existent
    pub fn with_debug(mut self, output_dir: PathBuf) -> Result<Self> {
        // Check if directory exists and is empty
        if output_dir.exists() {
            let entries = std::fs::read_dir(&output_dir)?;
            if entries.count() > 0 {
                return Err(anyhow::anyhow!(
                    "Debug directory is not empty: {}",
                    output_dir.display()
                ));
            }
        } else {
            std::fs::create_dir_all(&output_dir)?;
        }

        self.context.debug = Some(DebugConfig { output_dir });

        Ok(self)
    }

    /// Add a processing step to the pipeline
    pub fn add_step(mut self, step: Arc<dyn PipelineStep>) -> Self {
        self.steps.push(step);
        self
    }

    /// Names of the configured steps, in order
    pub fn step_names(&self) -> Vec<&str> {
        self.steps.iter().map(|s| s.name()).collect()
    }

    /// Run every step on one image.
    ///
    /// `None` (the loader could not produce an image) fails with
    /// [`PreprocessError::InvalidImage`] before any step runs.
    pub fn run(&self, name: &str, input: Option<DynamicImage>) -> Result<PipelineData> {
        let mut data = PipelineData::from_image(name, input, &self.context.profile)?;
        let input_dims = data.frame.dimensions();

        self.save_debug(0, "input", &data)?;

        for (step_idx, step) in self.steps.iter().enumerate() {
            debug!(image = %data.name, step = step.name(), "running step");
            data = step.process(data, &self.context)?;
            debug_assert_eq!(data.frame.dimensions(), input_dims);
            self.save_debug(step_idx + 1, step.name(), &data)?;
        }

        info!(
            image = %data.name,
            width = input_dims.0,
            height = input_dims.1,
            branch = data.get_string("branch").unwrap_or("-"),
            "preprocessing finished"
        );

        Ok(data)
    }

    /// Run the pipeline but stop at an intermediate step (useful for debugging)
    pub fn run_partial(&self, name: &str, input: Option<DynamicImage>, num_steps: usize) -> Result<PipelineData> {
        let mut data = PipelineData::from_image(name, input, &self.context.profile)?;
        for step in self.steps.iter().take(num_steps) {
            data = step.process(data, &self.context)?;
        }
        Ok(data)
    }

    fn save_debug(&self, index: usize, step_name: &str, data: &PipelineData) -> Result<()> {
        let Some(debug_config) = &self.context.debug else {
            return Ok(());
        };

        let step_dir_name = format!("{:02}_{}", index, step_name.to_lowercase().replace(' ', "_"));
        let step_dir = debug_config.output_dir.join(&step_dir_name);
        std::fs::create_dir_all(&step_dir)?;

        let output_path = step_dir.join(format!("{}.png", file_stem(&data.name)));
        data.frame
            .to_dynamic()
            .save(&output_path)
            .map_err(|e| anyhow::anyhow!("Failed to save debug image: {}", e))?;

        debug!("saved {}", output_path.display());
        Ok(())
    }
}

fn file_stem(name: &str) -> String {
    std::path::Path::new(name)
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "image".to_string())
}
