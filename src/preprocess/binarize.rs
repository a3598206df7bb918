use image::GrayImage;
use imageproc::contrast::{ThresholdType, otsu_level, threshold};
use tracing::debug;

use crate::models::{ImageStatistics, MorphologyPlan, Polarity, ThresholdProfile};
use crate::preprocess::morphology::{dilate, erode};

/// Decide which thresholding branch an image needs
pub fn choose_polarity(stats: &ImageStatistics, profile: &ThresholdProfile) -> Polarity {
    if stats.light_grey_pixel_pct > profile.light_grey_pixel_threshold {
        Polarity::DarkOnLight
    } else {
        Polarity::LightOnDark
    }
}

/// Reduce a smoothed grayscale image to two values, glyphs dark on light
pub fn binarize(
    gray: &GrayImage,
    stats: &ImageStatistics,
    plan: &MorphologyPlan,
    profile: &ThresholdProfile,
) -> (GrayImage, Polarity) {
    let polarity = choose_polarity(stats, profile);
    debug!(branch = polarity.as_str(), kernel = plan.kernel.size(), "binarizing");

    let binary = match polarity {
        Polarity::DarkOnLight => {
            let thresh = threshold(gray, profile.dark_glyph_threshold, ThresholdType::BinaryInverted);
            let corrected = correct_polarity(thresh, profile.inversion_intensity_threshold);
            erode(&corrected, plan.kernel, 1)
        }
        Polarity::LightOnDark => {
            let level = otsu_level(gray);
            debug!(level, "otsu threshold");
            let thresh = threshold(gray, level, ThresholdType::Binary);
            let eroded = erode(&thresh, plan.kernel, plan.erosion_iterations);
            let opened = dilate(&eroded, plan.kernel, profile.dilation_iterations);
            correct_polarity(opened, profile.inversion_intensity_threshold)
        }
    };

    (binary, polarity)
}

pub fn mean_intensity(img: &GrayImage) -> f64 {
    let n = img.width() as f64 * img.height() as f64;
    if n == 0.0 {
        return 0.0;
    }
    img.pixels().map(|p| p[0] as f64).sum::<f64>() / n
}

/// Invert every pixel value
pub fn invert(mut img: GrayImage) -> GrayImage {
    image::imageops::invert(&mut img);
    img
}

/// Invert images that are mostly dark so glyphs end up dark on light
pub fn correct_polarity(img: GrayImage, inversion_threshold: f64) -> GrayImage {
    let mean = mean_intensity(&img);
    if mean < inversion_threshold {
        debug!(mean, "inverting mostly dark image");
        invert(img)
    } else {
        img
    }
}
