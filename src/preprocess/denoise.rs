use tracing::debug;

use crate::models::ThresholdProfile;
use crate::preprocess::contours::GlyphImage;

/// Paint over glyph regions too small to be characters.
///
/// Only runs when there are at least `min_contour_count_for_denoise`
/// regions; with fewer, every region is assumed to be a real glyph.
/// Returns the number of regions removed.
pub fn remove_small_contours(glyphs: &mut GlyphImage, profile: &ThresholdProfile) -> usize {
    let set = glyphs.contours();
    if set.len() < profile.min_contour_count_for_denoise {
        debug!(
            contours = set.len(),
            min = profile.min_contour_count_for_denoise,
            "too few contours to denoise"
        );
        return 0;
    }

    let (width, height) = glyphs.dimensions();
    let image_area = width as f64 * height as f64;

    let small: Vec<usize> = set
        .contours()
        .iter()
        .enumerate()
        .filter(|(_, c)| (c.area() as f64 / image_area) < profile.contour_area_fraction_threshold)
        .map(|(i, _)| i)
        .collect();

    let total = set.len();
    let mut edit = glyphs.edit(set);
    for &index in &small {
        edit.erase(index);
    }

    debug!(removed = small.len(), total, "removed small contours");
    small.len()
}
