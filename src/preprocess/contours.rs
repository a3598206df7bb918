use image::{GrayImage, ImageBuffer, Luma};
use imageproc::contours::{BorderType, find_contours};
use imageproc::region_labelling::{Connectivity, connected_components};

use crate::models::BACKGROUND;

/// Axis-aligned box around a glyph region
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoundingBox {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// Outer boundary of one 8-connected glyph region
#[derive(Debug, Clone)]
pub struct Contour {
    /// Region label in the set's label image
    pub label: u32,
    /// Boundary points in tracing order
    pub points: Vec<(u32, u32)>,
    pub bbox: BoundingBox,
    pub pixel_count: u32,
}

impl Contour {
    pub fn area(&self) -> u32 {
        self.pixel_count
    }

    /// Vertical mid-point of the bounding box, rounded down
    pub fn mid_y(&self) -> i64 {
        (2 * self.bbox.y as i64 + self.bbox.height as i64).div_euclid(2)
    }
}

/// Binary image with glyphs in [`GLYPH`](crate::models::GLYPH) on [`BACKGROUND`].
///
/// Every edit bumps the generation; contour sets remember the generation
/// they were traced from and cannot be applied to a later one.
#[derive(Debug, Clone)]
pub struct GlyphImage {
    pixels: GrayImage,
    generation: u64,
}

impl GlyphImage {
    pub fn new(pixels: GrayImage) -> Self {
        Self { pixels, generation: 0 }
    }

    pub fn pixels(&self) -> &GrayImage {
        &self.pixels
    }

    pub fn into_inner(self) -> GrayImage {
        self.pixels
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.pixels.dimensions()
    }

    /// Trace the outer boundary of every glyph region in raster order
    pub fn contours(&self) -> ContourSet {
        let (width, height) = self.pixels.dimensions();
        let mask = GrayImage::from_fn(width, height, |x, y| {
            Luma([if self.pixels.get_pixel(x, y)[0] == BACKGROUND { 0 } else { 255 }])
        });
        let labels = connected_components(&mask, Connectivity::Eight, Luma([0u8]));

        // (min_x, min_y, max_x, max_y, count) per label
        let max_label = labels.pixels().map(|p| p[0]).max().unwrap_or(0) as usize;
        let mut regions: Vec<Option<(u32, u32, u32, u32, u32)>> = vec![None; max_label + 1];
        for (x, y, label) in labels.enumerate_pixels() {
            let label = label[0] as usize;
            if label == 0 {
                continue;
            }
            regions[label] = Some(match regions[label] {
                Some((min_x, min_y, max_x, max_y, count)) => {
                    (min_x.min(x), min_y.min(y), max_x.max(x), max_y.max(y), count + 1)
                }
                None => (x, y, x, y, 1),
            });
        }

        let contours = find_contours::<u32>(&mask)
            .into_iter()
            .filter(|c| c.border_type == BorderType::Outer)
            .filter_map(|c| {
                let first = c.points.first()?;
                let label = labels.get_pixel(first.x, first.y)[0];
                let (min_x, min_y, max_x, max_y, count) = regions.get(label as usize).copied().flatten()?;
                Some(Contour {
                    label,
                    points: c.points.iter().map(|p| (p.x, p.y)).collect(),
                    bbox: BoundingBox {
                        x: min_x,
                        y: min_y,
                        width: max_x - min_x + 1,
                        height: max_y - min_y + 1,
                    },
                    pixel_count: count,
                })
            })
            .collect();

        ContourSet {
            generation: self.generation,
            contours,
            labels,
        }
    }

    /// Start editing the image with contours traced from its current state.
    ///
    /// Panics if `set` was traced from an earlier generation.
    pub fn edit(&mut self, set: ContourSet) -> ContourEdit<'_> {
        assert_eq!(
            set.generation, self.generation,
            "contour set traced from generation {} applied to generation {}",
            set.generation, self.generation
        );
        ContourEdit { image: self, set }
    }
}

/// Contours of one image generation plus the label image they index into
pub struct ContourSet {
    generation: u64,
    contours: Vec<Contour>,
    labels: ImageBuffer<Luma<u32>, Vec<u32>>,
}

impl ContourSet {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn contours(&self) -> &[Contour] {
        &self.contours
    }

    pub fn len(&self) -> usize {
        self.contours.len()
    }

    pub fn is_empty(&self) -> bool {
        self.contours.is_empty()
    }
}

/// Batch of edits against one generation; the image moves to the next
/// generation when the edit is dropped.
pub struct ContourEdit<'a> {
    image: &'a mut GlyphImage,
    set: ContourSet,
}

impl ContourEdit<'_> {
    pub fn contours(&self) -> &[Contour] {
        &self.set.contours
    }

    /// Paint the pixels of contour `index` with the background value
    pub fn erase(&mut self, index: usize) {
        let contour = &self.set.contours[index];
        let bbox = contour.bbox;
        for y in bbox.y..bbox.y + bbox.height {
            for x in bbox.x..bbox.x + bbox.width {
                if self.set.labels.get_pixel(x, y)[0] == contour.label {
                    self.image.pixels.put_pixel(x, y, Luma([BACKGROUND]));
                }
            }
        }
    }

    /// Copy of the current pixels inside `bbox`
    pub fn copy_region(&self, bbox: BoundingBox) -> GrayImage {
        image::imageops::crop_imm(&self.image.pixels, bbox.x, bbox.y, bbox.width, bbox.height).to_image()
    }

    /// Overwrite pixels starting at (`x`, `y`) with `patch`, clipped to the image
    pub fn paste(&mut self, patch: &GrayImage, x: u32, y: u32) {
        image::imageops::replace(&mut self.image.pixels, patch, x as i64, y as i64);
    }
}

impl Drop for ContourEdit<'_> {
    fn drop(&mut self) {
        self.image.generation += 1;
    }
}
