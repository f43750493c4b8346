//! 2×2 quad composition and downsampling.
//!
//! This is the central step of the pyramid build: four source tiles merge
//! into one destination tile at the next coarser level, halving both the
//! resolution and the coordinate-space extent. Quads whose four children
//! are all absent are pruned (no output tile is written), which is what
//! keeps unpopulated regions out of the pyramid instead of rendering them
//! as solid placeholder tiles.

use std::sync::Arc;

use image::imageops::{self, FilterType};
use image::RgbImage;
use tracing::trace;

use crate::coord::TileCoord;
use crate::tile::{Placeholder, SourceTile};

/// Largest dimension of a written composite, in pixels.
pub const MAX_TILE_DIMENSION: u32 = 1024;

/// The 2×2 group of source tiles feeding one destination tile.
///
/// Field order matches the on-grid layout: for a quad origin `(x, y)` the
/// children are `(x, y)`, `(x+1, y)`, `(x, y+1)`, `(x+1, y+1)`.
#[derive(Debug, Clone)]
pub struct Quad {
    pub top_left: SourceTile,
    pub top_right: SourceTile,
    pub bottom_left: SourceTile,
    pub bottom_right: SourceTile,
}

impl Quad {
    /// True if no child has a backing file; the quad composes to nothing.
    pub fn is_blank(&self) -> bool {
        self.top_left.is_absent()
            && self.top_right.is_absent()
            && self.bottom_left.is_absent()
            && self.bottom_right.is_absent()
    }

    fn cells(&self) -> [(u32, u32, &SourceTile); 4] {
        [
            (0, 0, &self.top_left),
            (1, 0, &self.top_right),
            (0, 1, &self.bottom_left),
            (1, 1, &self.bottom_right),
        ]
    }
}

/// Merges quads of source tiles into downsampled destination tiles.
///
/// Holds the shared placeholder; absent children are rendered from it.
/// The compositor is immutable and cheap to share across the concurrent
/// composition tasks of a level.
#[derive(Debug, Clone)]
pub struct TileCompositor {
    placeholder: Arc<Placeholder>,
    max_dimension: u32,
}

impl TileCompositor {
    /// Creates a compositor around the shared placeholder.
    pub fn new(placeholder: Arc<Placeholder>) -> Self {
        Self {
            placeholder,
            max_dimension: MAX_TILE_DIMENSION,
        }
    }

    /// Overrides the maximum output dimension (tests use small tiles).
    pub fn with_max_dimension(mut self, max_dimension: u32) -> Self {
        self.max_dimension = max_dimension;
        self
    }

    /// Composes one quad into a destination tile.
    ///
    /// Returns `None` for a blank quad; the destination tile stays absent.
    /// Otherwise the four children (placeholder standing in for absent
    /// ones) are arranged in a 2×2 grid and the result is downsampled so
    /// neither dimension exceeds the configured maximum, using a bicubic
    /// (Catmull-Rom) filter.
    pub fn compose(&self, origin: TileCoord, quad: &Quad) -> Option<RgbImage> {
        if quad.is_blank() {
            trace!(%origin, "Quad is blank, pruning");
            return None;
        }

        // Uniform cell size: leaf tiles are captured at one resolution, but
        // take the max over the quad so a stray odd-sized tile cannot
        // truncate its neighbours.
        let (mut cell_w, mut cell_h) = (0u32, 0u32);
        for (_, _, tile) in quad.cells() {
            let (w, h) = match tile {
                SourceTile::Present(image) => image.dimensions(),
                SourceTile::Absent => self.placeholder.dimensions(),
            };
            cell_w = cell_w.max(w);
            cell_h = cell_h.max(h);
        }

        let mut canvas = RgbImage::new(cell_w * 2, cell_h * 2);
        for (col, row, tile) in quad.cells() {
            let image = match tile {
                SourceTile::Present(image) => image,
                SourceTile::Absent => self.placeholder.image(),
            };
            imageops::replace(
                &mut canvas,
                image,
                i64::from(col * cell_w),
                i64::from(row * cell_h),
            );
        }

        Some(self.shrink_to_fit(canvas))
    }

    /// Downsamples `image` to fit within the maximum dimension, preserving
    /// aspect ratio. Images already small enough pass through untouched;
    /// the filter only ever shrinks.
    fn shrink_to_fit(&self, image: RgbImage) -> RgbImage {
        let (w, h) = image.dimensions();
        let max = self.max_dimension;
        if w <= max && h <= max {
            return image;
        }

        let scale = (f64::from(max) / f64::from(w)).min(f64::from(max) / f64::from(h));
        let new_w = ((f64::from(w) * scale).round() as u32).max(1);
        let new_h = ((f64::from(h) * scale).round() as u32).max(1);

        imageops::resize(&image, new_w, new_h, FilterType::CatmullRom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    fn solid(w: u32, h: u32, rgb: [u8; 3]) -> RgbImage {
        RgbImage::from_pixel(w, h, Rgb(rgb))
    }

    fn compositor(max_dimension: u32) -> TileCompositor {
        let placeholder = Arc::new(Placeholder::from_image(solid(8, 8, [0, 0, 0])));
        TileCompositor::new(placeholder).with_max_dimension(max_dimension)
    }

    #[test]
    fn test_blank_quad_is_pruned() {
        let compositor = compositor(16);
        let quad = Quad {
            top_left: SourceTile::Absent,
            top_right: SourceTile::Absent,
            bottom_left: SourceTile::Absent,
            bottom_right: SourceTile::Absent,
        };
        assert!(compositor.compose(TileCoord::new(0, 0), &quad).is_none());
    }

    #[test]
    fn test_single_present_child_composes() {
        let compositor = compositor(16);
        let quad = Quad {
            top_left: SourceTile::Absent,
            top_right: SourceTile::Present(solid(8, 8, [250, 10, 10])),
            bottom_left: SourceTile::Absent,
            bottom_right: SourceTile::Absent,
        };

        let out = compositor.compose(TileCoord::new(4, 4), &quad).unwrap();
        assert_eq!(out.dimensions(), (16, 16));

        // Top-right quadrant carries the red child, the rest is placeholder
        // black (sampled inside quadrants, away from filter seams).
        assert_eq!(out.get_pixel(12, 4).0, [250, 10, 10]);
        assert_eq!(out.get_pixel(4, 4).0, [0, 0, 0]);
        assert_eq!(out.get_pixel(4, 12).0, [0, 0, 0]);
        assert_eq!(out.get_pixel(12, 12).0, [0, 0, 0]);
    }

    #[test]
    fn test_quadrant_arrangement() {
        let compositor = compositor(32);
        let quad = Quad {
            top_left: SourceTile::Present(solid(8, 8, [255, 0, 0])),
            top_right: SourceTile::Present(solid(8, 8, [0, 255, 0])),
            bottom_left: SourceTile::Present(solid(8, 8, [0, 0, 255])),
            bottom_right: SourceTile::Present(solid(8, 8, [255, 255, 0])),
        };

        // Max dimension 32 leaves the 16x16 canvas unresized, so quadrant
        // pixels are exact.
        let out = compositor.compose(TileCoord::new(0, 0), &quad).unwrap();
        assert_eq!(out.dimensions(), (16, 16));
        assert_eq!(out.get_pixel(3, 3).0, [255, 0, 0]);
        assert_eq!(out.get_pixel(12, 3).0, [0, 255, 0]);
        assert_eq!(out.get_pixel(3, 12).0, [0, 0, 255]);
        assert_eq!(out.get_pixel(12, 12).0, [255, 255, 0]);
    }

    #[test]
    fn test_composite_is_downsampled_to_fit() {
        let compositor = compositor(8);
        let quad = Quad {
            top_left: SourceTile::Present(solid(8, 8, [100, 100, 100])),
            top_right: SourceTile::Present(solid(8, 8, [100, 100, 100])),
            bottom_left: SourceTile::Present(solid(8, 8, [100, 100, 100])),
            bottom_right: SourceTile::Present(solid(8, 8, [100, 100, 100])),
        };

        let out = compositor.compose(TileCoord::new(0, 0), &quad).unwrap();
        assert_eq!(out.dimensions(), (8, 8));
    }

    #[test]
    fn test_small_composite_is_not_upscaled() {
        let compositor = compositor(1024);
        let quad = Quad {
            top_left: SourceTile::Present(solid(8, 8, [1, 2, 3])),
            top_right: SourceTile::Absent,
            bottom_left: SourceTile::Absent,
            bottom_right: SourceTile::Absent,
        };

        let out = compositor.compose(TileCoord::new(0, 0), &quad).unwrap();
        assert_eq!(out.dimensions(), (16, 16));
    }

    #[test]
    fn test_mixed_sizes_use_largest_cell() {
        let compositor = compositor(64);
        let quad = Quad {
            top_left: SourceTile::Present(solid(16, 16, [9, 9, 9])),
            top_right: SourceTile::Present(solid(8, 8, [9, 9, 9])),
            bottom_left: SourceTile::Absent,
            bottom_right: SourceTile::Absent,
        };

        let out = compositor.compose(TileCoord::new(0, 0), &quad).unwrap();
        assert_eq!(out.dimensions(), (32, 32));
    }
}
