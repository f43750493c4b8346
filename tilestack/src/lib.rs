//! Tilestack - quadtree tile pyramid renderer
//!
//! Tilestack turns a directory of externally captured leaf tiles into a
//! multi-resolution tile pyramid: each zoom level merges 2×2 quads of the
//! level below and downsamples them, until the whole dataset fits in a
//! single tile. Absent regions are represented by a shared placeholder
//! image and pruned from coarser levels instead of being rendered.
//!
//! The expected working directory layout:
//!
//! ```text
//! <workdir>/
//!   empty.jpg            placeholder asset, loaded once
//!   tiles/9/<x>x<y>.jpg  leaf tiles, produced externally
//!   tiles/8/ ... 0/      written by the build, coarsest level last
//! ```
//!
//! [`pipeline::PyramidBuilder`] is the main entry point; [`harvest`]
//! supervises the external process that produces the leaf tiles.

pub mod compose;
pub mod config;
pub mod coord;
pub mod harvest;
pub mod logging;
pub mod pipeline;
pub mod progress;
pub mod scan;
pub mod tile;

/// Crate version, surfaced by the CLI banner.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
