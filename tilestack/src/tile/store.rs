//! On-disk tile storage.
//!
//! Tiles live under `<workdir>/tiles/<z>/<x>x<y>.jpg`. The store reads
//! single tiles for composition and writes composites one level up,
//! creating level directories on demand. An absent file is an expected,
//! non-error outcome ([`SourceTile::Absent`]); every other I/O or codec
//! failure is fatal to the run.
//!
//! Outputs are write-once: a level's tiles are written exactly once and
//! only read again when the next coarser level is built, so no locking is
//! needed beyond the filesystem itself.

use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use image::codecs::jpeg::JpegEncoder;
use image::{ImageFormat, RgbImage};
use thiserror::Error;

use crate::coord::TileCoord;

use super::filename::tile_filename;

/// Subdirectory of the working directory holding the tile tree.
pub const TILES_DIR: &str = "tiles";

/// Default JPEG quality for written composites.
pub const DEFAULT_JPEG_QUALITY: u8 = 90;

/// Errors from tile storage. Everything here aborts the run; "file absent"
/// is not an error but a [`SourceTile::Absent`] result.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Failed to open or read an existing tile file.
    #[error("failed to read tile {}: {}", .path.display(), .source)]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    /// A tile file exists but is not decodable JPEG.
    #[error("failed to decode tile {}: {}", .path.display(), .source)]
    Decode {
        path: PathBuf,
        source: image::ImageError,
    },

    /// Failed to create a level directory.
    #[error("failed to create level directory {}: {}", .path.display(), .source)]
    CreateDir {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Failed to encode a composite as JPEG.
    #[error("failed to encode tile {}: {}", .path.display(), .source)]
    Encode {
        path: PathBuf,
        source: image::ImageError,
    },

    /// Failed to write an encoded tile out.
    #[error("failed to write tile {}: {}", .path.display(), .source)]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// A source tile read for composition: either decoded pixels or an
/// explicit absence marker. Absence is expected (unpopulated regions have
/// no files) and is what lets the compositor prune all-blank quads.
#[derive(Debug, Clone)]
pub enum SourceTile {
    Present(RgbImage),
    Absent,
}

impl SourceTile {
    /// True if no file backs this tile.
    pub fn is_absent(&self) -> bool {
        matches!(self, SourceTile::Absent)
    }
}

/// Reads and writes tiles inside one working directory.
#[derive(Debug, Clone)]
pub struct TileStore {
    workdir: PathBuf,
    jpeg_quality: u8,
}

impl TileStore {
    /// Creates a store rooted at the working directory.
    pub fn new(workdir: impl Into<PathBuf>) -> Self {
        Self {
            workdir: workdir.into(),
            jpeg_quality: DEFAULT_JPEG_QUALITY,
        }
    }

    /// Overrides the JPEG quality used for written composites.
    pub fn with_jpeg_quality(mut self, quality: u8) -> Self {
        self.jpeg_quality = quality;
        self
    }

    /// Directory holding one zoom level's tiles.
    pub fn level_dir(&self, level: u8) -> PathBuf {
        self.workdir.join(TILES_DIR).join(level.to_string())
    }

    /// Full path of one tile file.
    pub fn tile_path(&self, level: u8, coord: TileCoord) -> PathBuf {
        self.level_dir(level).join(tile_filename(coord))
    }

    /// Reads one tile. A missing file yields [`SourceTile::Absent`]; any
    /// other failure is fatal.
    pub fn read_tile(&self, level: u8, coord: TileCoord) -> Result<SourceTile, StoreError> {
        let path = self.tile_path(level, coord);

        let file = match File::open(&path) {
            Ok(file) => file,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(SourceTile::Absent),
            Err(e) => return Err(StoreError::Read { path, source: e }),
        };

        let image = image::load(BufReader::new(file), ImageFormat::Jpeg)
            .map_err(|e| StoreError::Decode { path, source: e })?;

        Ok(SourceTile::Present(image.into_rgb8()))
    }

    /// Writes one composite tile, creating the level directory if needed.
    pub fn write_tile(
        &self,
        level: u8,
        coord: TileCoord,
        image: &RgbImage,
    ) -> Result<(), StoreError> {
        let dir = self.level_dir(level);
        fs::create_dir_all(&dir).map_err(|e| StoreError::CreateDir {
            path: dir.clone(),
            source: e,
        })?;

        let path = dir.join(tile_filename(coord));
        let file = File::create(&path).map_err(|e| StoreError::Write {
            path: path.clone(),
            source: e,
        })?;

        let mut writer = BufWriter::new(file);
        let encoder = JpegEncoder::new_with_quality(&mut writer, self.jpeg_quality);
        image
            .write_with_encoder(encoder)
            .map_err(|e| StoreError::Encode {
                path: path.clone(),
                source: e,
            })?;

        writer
            .flush()
            .map_err(|e| StoreError::Write { path, source: e })
    }
}
