use serde::{Deserialize, Serialize};
use std::path::Path;

/// Pixel value of glyph pixels in a cleaned binary image
pub const GLYPH: u8 = 0;

/// Pixel value of background pixels in a cleaned binary image
pub const BACKGROUND: u8 = 255;

/// Tuning constants for one preprocessing run.
///
/// Built once at startup (preset or JSON file) and shared read-only by every
/// image. Missing JSON fields fall back to the default preset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ThresholdProfile {
    /// Bright-pixel area below which the small kernel is used
    pub pixel_area_threshold: f64,
    /// Mean intensity below which a binary image gets inverted
    pub inversion_intensity_threshold: f64,
    /// White fraction that marks an image as having no bright content
    pub white_pixel_threshold: f64,
    /// Light-grey fraction separating the two polarity branches
    pub light_grey_pixel_threshold: f64,
    /// Regions smaller than this fraction of the image are speckle
    pub contour_area_fraction_threshold: f64,
    /// Denoising only runs with at least this many regions
    pub min_contour_count_for_denoise: usize,
    /// Minimum |offset| / width for a region to be considered misplaced
    pub alignment_offset_fraction: f64,
    /// Minimum z-score of a region's offset to be considered misplaced
    pub alignment_deviation_z: f64,

    /// Per-channel threshold for "white" pixels
    pub white_rgb: u8,
    /// Per-channel threshold for "light grey" pixels
    pub light_grey_rgb: u8,
    /// Fixed threshold of the dark-character branch
    pub dark_glyph_threshold: u8,
    pub clahe_clip_limit: f32,
    pub clahe_tile_grid: u32,
    /// Dilations applied after erosion in the light-character branch
    pub dilation_iterations: u32,
    /// Run the realignment stage after denoising
    pub realign_contours: bool,
}

impl Default for ThresholdProfile {
    fn default() -> Self {
        Self {
            pixel_area_threshold: 15000.0,
            inversion_intensity_threshold: 145.0,
            white_pixel_threshold: 0.0,
            light_grey_pixel_threshold: 0.30,
            contour_area_fraction_threshold: 0.008,
            min_contour_count_for_denoise: 100,
            alignment_offset_fraction: 0.15,
            alignment_deviation_z: 1.50,
            white_rgb: 240,
            light_grey_rgb: 150,
            dark_glyph_threshold: 135,
            clahe_clip_limit: 3.0,
            clahe_tile_grid: 3,
            dilation_iterations: 9,
            realign_contours: false,
        }
    }
}

impl ThresholdProfile {
    /// Profile for the local recognition model, which reads a single
    /// horizontal line and benefits from re-centred glyphs
    pub fn centered() -> Self {
        Self {
            realign_contours: true,
            ..Self::default()
        }
    }

    /// Load a profile from a JSON file; absent keys keep their defaults
    pub fn from_json_file(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("Failed to read profile {}: {}", path.display(), e))?;
        let profile = serde_json::from_str(&raw)
            .map_err(|e| anyhow::anyhow!("Invalid profile {}: {}", path.display(), e))?;
        Ok(profile)
    }
}

/// Scalar summaries of the input image, computed once per run
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ImageStatistics {
    pub white_pixel_pct: f64,
    pub light_grey_pixel_pct: f64,
    pub mean_intensity: f64,
    pub intensity_variance: f64,
    pub width: u32,
    pub height: u32,
}

impl ImageStatistics {
    pub fn area(&self) -> f64 {
        self.width as f64 * self.height as f64
    }
}

/// Square structuring element used by erosion and dilation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kernel {
    Square2,
    Square3,
}

impl Kernel {
    pub fn size(&self) -> u32 {
        match self {
            Kernel::Square2 => 2,
            Kernel::Square3 => 3,
        }
    }
}

/// Kernel and erosion count, fixed for the remainder of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MorphologyPlan {
    pub kernel: Kernel,
    pub erosion_iterations: u32,
}

/// Which thresholding branch the binarizer took
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Polarity {
    /// Dark glyphs on a light background
    DarkOnLight,
    /// Light glyphs on a dark background
    LightOnDark,
}

impl Polarity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Polarity::DarkOnLight => "dark_on_light",
            Polarity::LightOnDark => "light_on_dark",
        }
    }
}

/// Ticker read from one cleaned image
#[derive(Debug, Clone)]
pub struct TickerReading {
    /// Image file name
    pub source: String,
    pub ticker: Option<String>,
}
