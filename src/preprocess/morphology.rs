use image::{GrayImage, Luma};
use imageproc::distance_transform::Norm;
use imageproc::morphology;

use crate::models::Kernel;

/// Erode white regions `iterations` times with the given kernel
pub fn erode(img: &GrayImage, kernel: Kernel, iterations: u32) -> GrayImage {
    if iterations == 0 {
        return img.clone();
    }
    match kernel {
        // n passes of a 3x3 square equal one pass of a (2n+1) square
        Kernel::Square3 => morphology::erode(img, Norm::LInf, clamp_radius(iterations)),
        Kernel::Square2 => repeat(img, iterations, |v, n| v.min(n)),
    }
}

/// Dilate white regions `iterations` times with the given kernel
pub fn dilate(img: &GrayImage, kernel: Kernel, iterations: u32) -> GrayImage {
    if iterations == 0 {
        return img.clone();
    }
    match kernel {
        Kernel::Square3 => morphology::dilate(img, Norm::LInf, clamp_radius(iterations)),
        Kernel::Square2 => repeat(img, iterations, |v, n| v.max(n)),
    }
}

fn clamp_radius(iterations: u32) -> u8 {
    iterations.min(u8::MAX as u32) as u8
}

fn repeat(img: &GrayImage, iterations: u32, pick: impl Fn(u8, u8) -> u8 + Copy) -> GrayImage {
    let mut out = square2_pass(img, pick);
    for _ in 1..iterations {
        out = square2_pass(&out, pick);
    }
    out
}

/// One pass of a 2x2 kernel anchored at its bottom-right cell, so each pixel
/// looks at itself and its left, upper and upper-left neighbours. Pixels
/// outside the image are ignored.
fn square2_pass(img: &GrayImage, pick: impl Fn(u8, u8) -> u8) -> GrayImage {
    let (width, height) = img.dimensions();
    GrayImage::from_fn(width, height, |x, y| {
        let mut value = img.get_pixel(x, y)[0];
        if x > 0 {
            value = pick(value, img.get_pixel(x - 1, y)[0]);
        }
        if y > 0 {
            value = pick(value, img.get_pixel(x, y - 1)[0]);
        }
        if x > 0 && y > 0 {
            value = pick(value, img.get_pixel(x - 1, y - 1)[0]);
        }
        Luma([value])
    })
}
