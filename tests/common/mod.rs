#![allow(dead_code)]

mod fixtures;
pub use fixtures::*;

// Re-export commonly used types from tickerscan for tests
pub use tickerscan::{
    Frame, GlyphImage, Pipeline, PipelineData, PreprocessError, ThresholdProfile,
    build_standard_pipeline,
};
