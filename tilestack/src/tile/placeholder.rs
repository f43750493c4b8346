//! Placeholder image for absent tiles.
//!
//! The working directory carries an `empty.jpg` asset representing "no
//! content here". It is decoded exactly once, before any level processing
//! starts, and shared read-only by every concurrent composition: absent
//! child tiles are rendered from it, and a quad whose children are all
//! absent is pruned instead of being composed from four placeholder copies.
//!
//! Absence is tracked explicitly (see [`crate::tile::SourceTile`]) rather
//! than by comparing an image against this one.

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use image::{ImageFormat, RgbImage};
use thiserror::Error;

/// Name of the placeholder asset inside a working directory.
pub const PLACEHOLDER_ASSET: &str = "empty.jpg";

/// Errors loading the placeholder asset. All of them abort the run: without
/// the placeholder there is no way to composite quads with absent children.
#[derive(Debug, Error)]
pub enum PlaceholderError {
    /// The asset file does not exist.
    #[error("placeholder asset missing: {}", .0.display())]
    Missing(PathBuf),

    /// The asset exists but could not be read.
    #[error("failed to read placeholder {}: {}", .path.display(), .source)]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The asset could not be decoded as JPEG.
    #[error("failed to decode placeholder {}: {}", .path.display(), .source)]
    Decode {
        path: PathBuf,
        source: image::ImageError,
    },
}

/// The shared "empty tile" image.
#[derive(Debug, Clone)]
pub struct Placeholder {
    image: RgbImage,
}

impl Placeholder {
    /// Decode the placeholder from `empty.jpg` at `path`.
    pub fn load(path: &Path) -> Result<Self, PlaceholderError> {
        let file = match File::open(path) {
            Ok(file) => file,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(PlaceholderError::Missing(path.to_path_buf()));
            }
            Err(e) => {
                return Err(PlaceholderError::Read {
                    path: path.to_path_buf(),
                    source: e,
                });
            }
        };

        let image = image::load(BufReader::new(file), ImageFormat::Jpeg).map_err(|e| {
            PlaceholderError::Decode {
                path: path.to_path_buf(),
                source: e,
            }
        })?;

        Ok(Self {
            image: image.into_rgb8(),
        })
    }

    /// Build a placeholder directly from an image. Used by tests and by
    /// callers that synthesize the asset instead of shipping one.
    pub fn from_image(image: RgbImage) -> Self {
        Self { image }
    }

    /// The placeholder pixels.
    pub fn image(&self) -> &RgbImage {
        &self.image
    }

    /// Placeholder dimensions, used as the fallback cell size when a whole
    /// quad column or row is absent.
    pub fn dimensions(&self) -> (u32, u32) {
        self.image.dimensions()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    #[test]
    fn test_load_missing_asset() {
        let dir = tempfile::tempdir().unwrap();
        let result = Placeholder::load(&dir.path().join(PLACEHOLDER_ASSET));
        assert!(matches!(result, Err(PlaceholderError::Missing(_))));
    }

    #[test]
    fn test_load_undecodable_asset() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(PLACEHOLDER_ASSET);
        std::fs::write(&path, b"not a jpeg").unwrap();

        let result = Placeholder::load(&path);
        assert!(matches!(result, Err(PlaceholderError::Decode { .. })));
    }

    #[test]
    fn test_load_valid_asset() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(PLACEHOLDER_ASSET);

        let image = RgbImage::from_pixel(16, 16, Rgb([0, 0, 0]));
        image.save_with_format(&path, ImageFormat::Jpeg).unwrap();

        let placeholder = Placeholder::load(&path).unwrap();
        assert_eq!(placeholder.dimensions(), (16, 16));
    }
}
