//! Tile naming, storage, and the shared placeholder asset.

mod filename;
mod placeholder;
mod store;

pub use filename::{parse_tile_filename, tile_filename, ParseError};
pub use placeholder::{Placeholder, PlaceholderError, PLACEHOLDER_ASSET};
pub use store::{SourceTile, StoreError, TileStore, DEFAULT_JPEG_QUALITY, TILES_DIR};
