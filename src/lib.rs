pub mod error;
pub mod evaluation;
pub mod loader;
pub mod models;
pub mod ocr;
pub mod pipeline;
pub mod preprocess;
pub mod ticker;

pub use error::PreprocessError;
pub use models::{ImageStatistics, Kernel, MorphologyPlan, Polarity, ThresholdProfile, TickerReading};
pub use ocr::{OcrsRecognizer, TextRecognizer};
pub use pipeline::{
    DebugConfig, Frame, MetadataValue, Pipeline, PipelineContext, PipelineData, PipelineStep,
};
pub use preprocess::{build_standard_pipeline, clean_image};
pub use preprocess::contours::{BoundingBox, Contour, ContourSet, GlyphImage};
