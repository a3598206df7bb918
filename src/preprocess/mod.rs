pub mod statistics;
pub mod normalize;
pub mod morphology;
pub mod binarize;
pub mod contours;
pub mod denoise;
pub mod realign;
pub mod steps;

use anyhow::Result;
use image::{DynamicImage, GrayImage};
use std::sync::Arc;

use crate::models::ThresholdProfile;
use crate::pipeline::Pipeline;

/// Build the cleanup pipeline for a profile.
///
/// Realignment is only added when the profile asks for it.
pub fn build_standard_pipeline(profile: Arc<ThresholdProfile>) -> Pipeline {
    use steps::*;

    let realign = profile.realign_contours;
    let pipeline = Pipeline::new(profile)
        .add_step(Arc::new(NormalizeStep))
        .add_step(Arc::new(BinarizeStep))
        .add_step(Arc::new(DenoiseStep));

    if realign {
        pipeline.add_step(Arc::new(RealignStep))
    } else {
        pipeline
    }
}

/// Clean one image with the standard pipeline and return the binary result
pub fn clean_image(image: Option<DynamicImage>, profile: &ThresholdProfile) -> Result<GrayImage> {
    build_standard_pipeline(Arc::new(profile.clone()))
        .run("image", image)?
        .into_binary()
}
