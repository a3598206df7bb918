use image::{DynamicImage, GrayImage, ImageBuffer, Luma, Rgb};
use std::collections::BTreeSet;
use tickerscan::models::{BACKGROUND, GLYPH};

/// A rectangle in pixel coordinates: (x, y, width, height)
pub type Rect = (u32, u32, u32, u32);

fn inside((x0, y0, w, h): Rect, x: u32, y: u32) -> bool {
    x >= x0 && x < x0 + w && y >= y0 && y < y0 + h
}

/// 100x100 light-grey screenshot with one dark glyph in the middle
pub fn light_grey_with_dark_glyph() -> DynamicImage {
    let glyph = (40, 30, 20, 40);
    let img = ImageBuffer::from_fn(100, 100, |x, y| {
        if inside(glyph, x, y) { Rgb([20u8, 20, 20]) } else { Rgb([200u8, 200, 200]) }
    });
    DynamicImage::ImageRgb8(img)
}

/// 100x100 light-grey screenshot with one saturated green glyph, as in
/// "price up" overlays
pub fn light_grey_with_green_glyph() -> DynamicImage {
    let glyph = (40, 30, 20, 40);
    let img = ImageBuffer::from_fn(100, 100, |x, y| {
        if inside(glyph, x, y) { Rgb([0u8, 200, 0]) } else { Rgb([200u8, 200, 200]) }
    });
    DynamicImage::ImageRgb8(img)
}

/// 100x100 dark screenshot with one white glyph in the middle
pub fn dark_with_light_glyph() -> DynamicImage {
    let glyph = (40, 30, 20, 40);
    let img = ImageBuffer::from_fn(100, 100, |x, y| {
        if inside(glyph, x, y) { Rgb([255u8, 255, 255]) } else { Rgb([20u8, 20, 20]) }
    });
    DynamicImage::ImageRgb8(img)
}

/// Near-black capture whose glyph is barely brighter than the background
pub fn flat_near_black() -> DynamicImage {
    let glyph = (30, 20, 40, 40);
    let img = ImageBuffer::from_fn(90, 90, |x, y| {
        if inside(glyph, x, y) { Rgb([40u8, 38, 42]) } else { Rgb([10u8, 12, 10]) }
    });
    DynamicImage::ImageRgb8(img)
}

/// Colourful overlay with a gradient, several glyph blocks and
/// deterministic salt noise
pub fn noisy_overlay() -> DynamicImage {
    let glyphs = [(20, 30, 12, 40), (40, 30, 12, 40), (60, 30, 12, 40), (80, 60, 12, 25)];
    let mut state = 0x2545_f491u32;
    let img = ImageBuffer::from_fn(120, 100, |x, y| {
        state = state.wrapping_mul(1_103_515_245).wrapping_add(12_345);
        if glyphs.iter().any(|&g| inside(g, x, y)) {
            Rgb([245u8, 245, 240])
        } else if (state >> 16) % 97 == 0 {
            Rgb([255u8, 255, 255])
        } else {
            Rgb([(x * 2) as u8, 30, (y * 2) as u8])
        }
    });
    DynamicImage::ImageRgb8(img)
}

/// Blank binary canvas
pub fn binary_canvas(width: u32, height: u32) -> GrayImage {
    GrayImage::from_pixel(width, height, Luma([BACKGROUND]))
}

/// Paint a glyph rectangle onto a binary canvas
pub fn fill_glyph(img: &mut GrayImage, (x0, y0, w, h): Rect) {
    for y in y0..y0 + h {
        for x in x0..x0 + w {
            img.put_pixel(x, y, Luma([GLYPH]));
        }
    }
}

/// True when every pixel inside `rect` has value `value`
pub fn rect_is(img: &GrayImage, (x0, y0, w, h): Rect, value: u8) -> bool {
    (y0..y0 + h).all(|y| (x0..x0 + w).all(|x| img.get_pixel(x, y)[0] == value))
}

pub fn distinct_values(img: &GrayImage) -> BTreeSet<u8> {
    img.pixels().map(|p| p[0]).collect()
}
