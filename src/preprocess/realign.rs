use tracing::debug;

use crate::models::ThresholdProfile;
use crate::preprocess::contours::{BoundingBox, GlyphImage};

/// Mean and population standard deviation
fn mean_std(values: &[f64]) -> (f64, f64) {
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    (mean, variance.sqrt())
}

/// Indices of contours whose vertical offset from `center_y` is both large
/// relative to `image_width` and a positive statistical outlier
pub fn find_outliers(offsets: &[i64], image_width: u32, profile: &ThresholdProfile) -> Vec<usize> {
    if offsets.is_empty() || image_width == 0 {
        return Vec::new();
    }

    let values: Vec<f64> = offsets.iter().map(|&o| o as f64).collect();
    let (mean, std) = mean_std(&values);
    if std == 0.0 {
        debug!(contours = offsets.len(), "offsets have zero deviation, nothing to realign");
        return Vec::new();
    }

    values
        .iter()
        .enumerate()
        .filter(|&(_, &offset)| {
            offset.abs() / image_width as f64 > profile.alignment_offset_fraction
                && (offset - mean) / std > profile.alignment_deviation_z
        })
        .map(|(i, _)| i)
        .collect()
}

/// Move misplaced glyph regions back to the vertical centre line.
///
/// Returns the number of regions moved.
pub fn realign_contours(
    glyphs: &mut GlyphImage,
    image_width: u32,
    center_y: u32,
    profile: &ThresholdProfile,
) -> usize {
    let set = glyphs.contours();
    if set.is_empty() {
        return 0;
    }

    let offsets: Vec<i64> = set
        .contours()
        .iter()
        .map(|c| c.mid_y() - center_y as i64)
        .collect();
    let outliers = find_outliers(&offsets, image_width, profile);
    if outliers.is_empty() {
        return 0;
    }

    let (_, height) = glyphs.dimensions();
    let mut edit = glyphs.edit(set);
    for &index in &outliers {
        let bbox: BoundingBox = edit.contours()[index].bbox;
        let character = edit.copy_region(bbox);
        edit.erase(index);

        let target_y = (center_y as i64 - (bbox.height / 2) as i64)
            .clamp(0, (height - bbox.height) as i64) as u32;
        edit.paste(&character, bbox.x, target_y);

        debug!(
            x = bbox.x,
            from_y = bbox.y,
            to_y = target_y,
            offset = offsets[index],
            "re-centred contour"
        );
    }

    outliers.len()
}
