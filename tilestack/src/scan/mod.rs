//! Occupied-area scanning over a zoom level directory.
//!
//! Before a coarser level can be built, the builder needs to know which
//! region of the source level is populated. The scanner globs the level's
//! `*.jpg` files, parses each basename back into a coordinate, and folds
//! them into a quad-aligned [`Bounds`]. A level directory with no tile
//! files (or that does not exist yet) yields `None`: nothing to do, not an
//! error.
//!
//! Filenames that do not parse as `<x>x<y>.jpg` are handled per an explicit
//! [`ParsePolicy`]; with the default policy they are dropped from the
//! bounds with a warning.

use std::path::PathBuf;

use glob::glob;
use thiserror::Error;
use tracing::{debug, warn};

use crate::coord::Bounds;
use crate::tile::{parse_tile_filename, TILES_DIR};

/// What to do with a tile filename that does not parse during scanning.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ParsePolicy {
    /// Drop the file silently.
    Ignore,
    /// Drop the file and emit a diagnostic.
    #[default]
    Warn,
    /// Abort the run.
    Fail,
}

/// Errors during an area scan.
#[derive(Debug, Error)]
pub enum ScanError {
    /// The level directory path is not valid UTF-8 and cannot be globbed.
    #[error("level directory is not valid UTF-8: {}", .0.display())]
    NonUtf8Path(PathBuf),

    /// A directory entry could not be read.
    #[error("failed to read level directory entry: {0}")]
    ReadEntry(#[from] glob::GlobError),

    /// A filename failed to parse under [`ParsePolicy::Fail`].
    #[error("malformed tile filename: {}", .0.display())]
    MalformedFilename(PathBuf),
}

/// Derives the occupied bounding box of a zoom level from filenames on
/// disk.
#[derive(Debug, Clone)]
pub struct AreaScanner {
    workdir: PathBuf,
    policy: ParsePolicy,
}

impl AreaScanner {
    /// Creates a scanner rooted at the working directory.
    pub fn new(workdir: impl Into<PathBuf>) -> Self {
        Self {
            workdir: workdir.into(),
            policy: ParsePolicy::default(),
        }
    }

    /// Overrides the malformed-filename policy.
    pub fn with_policy(mut self, policy: ParsePolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Scans one zoom level and returns the quad-aligned bounds of its
    /// present tiles, or `None` if the level is empty.
    pub fn scan_level(&self, level: u8) -> Result<Option<Bounds>, ScanError> {
        let dir = self.workdir.join(TILES_DIR).join(level.to_string());
        let dir_str = dir
            .to_str()
            .ok_or_else(|| ScanError::NonUtf8Path(dir.clone()))?;

        // Escape the directory part so glob metacharacters in the workdir
        // path cannot distort the match; only the `*.jpg` tail is a wildcard.
        // A nonexistent level directory simply matches nothing.
        let pattern = format!("{}/*.jpg", glob::Pattern::escape(dir_str));
        let entries = glob(&pattern).expect("tile glob pattern is well-formed");

        let mut extremes: Option<(i32, i32, i32, i32)> = None;
        let mut tiles = 0u64;

        for entry in entries {
            let path = entry?;
            let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };

            let coord = match parse_tile_filename(name) {
                Ok(coord) => coord,
                Err(e) => match self.policy {
                    ParsePolicy::Ignore => continue,
                    ParsePolicy::Warn => {
                        warn!(file = %path.display(), error = %e, "Skipping malformed tile filename");
                        continue;
                    }
                    ParsePolicy::Fail => return Err(ScanError::MalformedFilename(path)),
                },
            };

            tiles += 1;
            extremes = Some(match extremes {
                None => (coord.x, coord.y, coord.x, coord.y),
                Some((min_x, min_y, max_x, max_y)) => (
                    min_x.min(coord.x),
                    min_y.min(coord.y),
                    max_x.max(coord.x),
                    max_y.max(coord.y),
                ),
            });
        }

        let bounds = extremes
            .map(|(min_x, min_y, max_x, max_y)| Bounds::from_extremes(min_x, min_y, max_x, max_y));

        match bounds {
            Some(b) => debug!(
                level,
                tiles,
                top_left = %b.top_left(),
                bottom_right = %b.bottom_right(),
                "Scanned level area"
            ),
            None => debug!(level, "Level is empty"),
        }

        Ok(bounds)
    }
}
