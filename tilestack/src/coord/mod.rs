//! Tile coordinate types and quadtree math.
//!
//! Tiles are addressed by an integer `(x, y)` pair within a zoom level's
//! grid. Coordinates may be negative: the captured map grows outward from
//! the origin in all four directions. Each coarser level collapses a 2×2
//! quad of tiles into one, so a tile's parent is found by flooring both
//! coordinates halved; plain truncating division would be wrong for
//! negative coordinates.

mod bounds;

pub use bounds::{Bounds, QuadOrigins};

use std::fmt;

/// Finest zoom level the pyramid builder reads as input.
///
/// Leaf tiles at this level are produced externally before the build runs;
/// every coarser level down to 0 is derived from it.
pub const LEAF_ZOOM: u8 = 9;

/// A tile position within one zoom level's grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TileCoord {
    pub x: i32,
    pub y: i32,
}

impl TileCoord {
    /// Creates a tile coordinate.
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Returns the coordinate of this tile's parent at the next coarser level.
    ///
    /// Uses floor division, so `(-1, -1)` maps to `(-1, -1)` and `(-2, -2)`
    /// maps to `(-1, -1)`, keeping quads contiguous across the origin.
    pub fn parent(self) -> TileCoord {
        TileCoord {
            x: self.x.div_euclid(2),
            y: self.y.div_euclid(2),
        }
    }

    /// Returns the four child coordinates at the next finer level, in
    /// top-left, top-right, bottom-left, bottom-right order.
    pub fn children(self) -> [TileCoord; 4] {
        let (x, y) = (self.x * 2, self.y * 2);
        [
            TileCoord::new(x, y),
            TileCoord::new(x + 1, y),
            TileCoord::new(x, y + 1),
            TileCoord::new(x + 1, y + 1),
        ]
    }

    /// Rounds both coordinates down to the nearest even value.
    ///
    /// Quads start on even coordinates; bounding boxes are aligned with this
    /// so stepping by 2 from the top-left corner never splits a quad.
    pub fn align_even(self) -> TileCoord {
        TileCoord {
            x: self.x - self.x.rem_euclid(2),
            y: self.y - self.y.rem_euclid(2),
        }
    }
}

impl fmt::Display for TileCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}
