use image::DynamicImage;
use tracing::debug;

use crate::models::{ImageStatistics, Kernel, MorphologyPlan, ThresholdProfile};
use crate::preprocess::normalize::luma_bt601;

/// Fraction of pixels whose R, G and B channels are all >= `threshold`
pub fn pixel_fraction(img: &DynamicImage, threshold: u8) -> f64 {
    let rgb = img.to_rgb8();
    let total = rgb.width() as u64 * rgb.height() as u64;
    if total == 0 {
        return 0.0;
    }

    let matching = rgb
        .pixels()
        .filter(|p| p.0.iter().all(|&c| c >= threshold))
        .count() as u64;

    matching as f64 / total as f64
}

/// Mean and population variance of the luminance channel
pub fn intensity_moments(img: &DynamicImage) -> (f64, f64) {
    let gray = luma_bt601(img);
    let n = gray.width() as f64 * gray.height() as f64;
    if n == 0.0 {
        return (0.0, 0.0);
    }

    let mut sum = 0f64;
    let mut sum_sq = 0f64;
    for p in gray.pixels() {
        let v = p[0] as f64;
        sum += v;
        sum_sq += v * v;
    }

    let mean = sum / n;
    let variance = (sum_sq / n - mean * mean).max(0.0);
    (mean, variance)
}

/// Compute all statistics that steer the later stages
pub fn compute(img: &DynamicImage, profile: &ThresholdProfile) -> ImageStatistics {
    let white_pixel_pct = pixel_fraction(img, profile.white_rgb);
    let light_grey_pixel_pct = pixel_fraction(img, profile.light_grey_rgb);
    let (mean_intensity, intensity_variance) = intensity_moments(img);

    let stats = ImageStatistics {
        white_pixel_pct,
        light_grey_pixel_pct,
        mean_intensity,
        intensity_variance,
        width: img.width(),
        height: img.height(),
    };

    debug!(
        white = stats.white_pixel_pct,
        light_grey = stats.light_grey_pixel_pct,
        mean = stats.mean_intensity,
        variance = stats.intensity_variance,
        "image statistics"
    );

    stats
}

/// Pick the structuring element from the amount of bright area
pub fn choose_kernel(stats: &ImageStatistics, profile: &ThresholdProfile) -> MorphologyPlan {
    if stats.area() * stats.white_pixel_pct < profile.pixel_area_threshold {
        MorphologyPlan {
            kernel: Kernel::Square2,
            erosion_iterations: 3,
        }
    } else {
        MorphologyPlan {
            kernel: Kernel::Square3,
            erosion_iterations: 4,
        }
    }
}
