use image::{DynamicImage, GrayImage, Luma, Rgb};
use imageproc::definitions::Image;
use imageproc::filter::filter3x3;
use imageproc::map::map_colors;
use tracing::debug;

use crate::models::{ImageStatistics, ThresholdProfile};

/// True when the image has no bright content at all and needs local
/// contrast enhancement to recover faint glyphs
pub fn needs_enhancement(stats: &ImageStatistics, profile: &ThresholdProfile) -> bool {
    stats.white_pixel_pct == profile.white_pixel_threshold
        && stats.light_grey_pixel_pct < profile.light_grey_pixel_threshold
}

/// Normalized 3x3 Gaussian, the outer product of [1, 2, 1] / 4
const GAUSSIAN_3X3: [f32; 9] = [
    1.0 / 16.0, 2.0 / 16.0, 1.0 / 16.0,
    2.0 / 16.0, 4.0 / 16.0, 2.0 / 16.0,
    1.0 / 16.0, 2.0 / 16.0, 1.0 / 16.0,
];

/// BT.601 luma in 14-bit fixed point: 0.299 R + 0.587 G + 0.114 B, rounded.
///
/// The fixed thresholds in [`ThresholdProfile`] are tuned against these
/// weights, not the Rec.709 ones `DynamicImage::to_luma8` uses.
pub fn luma_bt601(img: &DynamicImage) -> GrayImage {
    map_colors(&img.to_rgb8(), |Rgb([r, g, b])| {
        let y = (r as u32 * 4899 + g as u32 * 9617 + b as u32 * 1868 + (1 << 13)) >> 14;
        Luma([y as u8])
    })
}

/// Smooth with the 3x3 Gaussian; borders replicate the edge pixels
pub fn smooth3x3(gray: &GrayImage) -> GrayImage {
    let smoothed: Image<Luma<f32>> = filter3x3(gray, &GAUSSIAN_3X3);
    map_colors(&smoothed, |Luma([v])| Luma([v.round().clamp(0.0, 255.0) as u8]))
}

/// Flatten to grayscale (enhancing flat images first) and smooth.
///
/// Returns the smoothed image and whether enhancement was applied.
pub fn normalize(
    img: &DynamicImage,
    stats: &ImageStatistics,
    profile: &ThresholdProfile,
) -> (GrayImage, bool) {
    let luma = luma_bt601(img);

    let enhanced = needs_enhancement(stats, profile);
    let gray = if enhanced {
        debug!(
            clip_limit = profile.clahe_clip_limit,
            grid = profile.clahe_tile_grid,
            "applying local contrast enhancement"
        );
        clahe(&luma, profile.clahe_clip_limit, profile.clahe_tile_grid)
    } else {
        luma
    };

    (smooth3x3(&gray), enhanced)
}

/// Contrast-limited adaptive histogram equalization on a single channel.
///
/// The image is split into a `grid` x `grid` set of tiles; each tile gets
/// its own clipped equalization table and pixels blend the tables of the
/// four nearest tile centres.
pub fn clahe(gray: &GrayImage, clip_limit: f32, grid: u32) -> GrayImage {
    let (width, height) = gray.dimensions();
    if width == 0 || height == 0 {
        return gray.clone();
    }

    let grid_x = grid.clamp(1, width);
    let grid_y = grid.clamp(1, height);
    let tile_w = width / grid_x;
    let tile_h = height / grid_y;

    let mut luts = Vec::with_capacity((grid_x * grid_y) as usize);
    for ty in 0..grid_y {
        for tx in 0..grid_x {
            let x0 = tx * tile_w;
            let y0 = ty * tile_h;
            // Last row/column of tiles absorbs the remainder
            let x1 = if tx == grid_x - 1 { width } else { x0 + tile_w };
            let y1 = if ty == grid_y - 1 { height } else { y0 + tile_h };
            luts.push(tile_lut(gray, (x0, y0, x1, y1), clip_limit));
        }
    }

    let lut_at = |tx: u32, ty: u32| &luts[(ty * grid_x + tx) as usize];

    GrayImage::from_fn(width, height, |x, y| {
        let v = gray.get_pixel(x, y)[0] as usize;

        let (tx0, tx1, wx) = neighbours(x, tile_w, grid_x);
        let (ty0, ty1, wy) = neighbours(y, tile_h, grid_y);

        let top = lut_at(tx0, ty0)[v] as f32 * (1.0 - wx) + lut_at(tx1, ty0)[v] as f32 * wx;
        let bottom = lut_at(tx0, ty1)[v] as f32 * (1.0 - wx) + lut_at(tx1, ty1)[v] as f32 * wx;
        let value = top * (1.0 - wy) + bottom * wy;

        Luma([value.round().clamp(0.0, 255.0) as u8])
    })
}

/// Tile indices on either side of a coordinate and the blend weight
fn neighbours(pos: u32, tile: u32, count: u32) -> (u32, u32, f32) {
    let f = (pos as f32 + 0.5) / tile as f32 - 0.5;
    let lower = f.floor().clamp(0.0, (count - 1) as f32) as u32;
    let upper = (lower + 1).min(count - 1);
    let weight = (f - lower as f32).clamp(0.0, 1.0);
    (lower, upper, weight)
}

fn tile_lut(gray: &GrayImage, (x0, y0, x1, y1): (u32, u32, u32, u32), clip_limit: f32) -> [u8; 256] {
    let mut hist = [0u32; 256];
    for y in y0..y1 {
        for x in x0..x1 {
            hist[gray.get_pixel(x, y)[0] as usize] += 1;
        }
    }
    let area = (x1 - x0) * (y1 - y0);

    if clip_limit > 0.0 {
        let limit = ((clip_limit * area as f32 / 256.0) as u32).max(1);
        let mut excess = 0u32;
        for bin in hist.iter_mut() {
            if *bin > limit {
                excess += *bin - limit;
                *bin = limit;
            }
        }

        let add = excess / 256;
        let residual = excess % 256;
        for bin in hist.iter_mut() {
            *bin += add;
        }
        if residual > 0 {
            let step = (256 / residual).max(1) as usize;
            for bin in hist.iter_mut().step_by(step).take(residual as usize) {
                *bin += 1;
            }
        }
    }

    let scale = 255.0 / area as f32;
    let mut lut = [0u8; 256];
    let mut cdf = 0u32;
    for (i, count) in hist.iter().enumerate() {
        cdf += count;
        lut[i] = (cdf as f32 * scale).round().min(255.0) as u8;
    }
    lut
}
