//! Build configuration for the pyramid renderer.

use thiserror::Error;

use crate::compose::MAX_TILE_DIMENSION;
use crate::coord::LEAF_ZOOM;
use crate::scan::ParsePolicy;
use crate::tile::DEFAULT_JPEG_QUALITY;

/// Default number of compositions allowed in flight at once.
///
/// Each in-flight composition holds up to five decoded images (four
/// children plus the composite), so this bound is what caps peak memory
/// and open file handles on large levels.
pub const DEFAULT_MAX_IN_FLIGHT: usize = 48;

/// Configuration errors, reported before any level is touched.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("max_in_flight must be at least 1")]
    ZeroInFlight,

    #[error("jpeg_quality must be 1..=100, got {0}")]
    InvalidQuality(u8),

    #[error("leaf_zoom must be 1..={max}, got {got}", max = LEAF_ZOOM)]
    InvalidLeafZoom { got: u8 },

    #[error("max_tile_dimension must be at least 1")]
    ZeroDimension,
}

/// Tunables for one pyramid build.
///
/// Defaults match the production contract: leaf tiles at zoom 9, at most
/// 48 concurrent compositions, composites capped at 1024 px per side.
#[derive(Debug, Clone)]
pub struct RenderConfig {
    /// Admission gate capacity.
    pub max_in_flight: usize,
    /// Largest written composite dimension, in pixels.
    pub max_tile_dimension: u32,
    /// JPEG quality for written composites.
    pub jpeg_quality: u8,
    /// Handling of malformed tile filenames during area scans.
    pub parse_policy: ParsePolicy,
    /// Finest zoom level, populated externally before the build.
    pub leaf_zoom: u8,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            max_in_flight: DEFAULT_MAX_IN_FLIGHT,
            max_tile_dimension: MAX_TILE_DIMENSION,
            jpeg_quality: DEFAULT_JPEG_QUALITY,
            parse_policy: ParsePolicy::default(),
            leaf_zoom: LEAF_ZOOM,
        }
    }
}

impl RenderConfig {
    /// Creates the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the admission gate capacity.
    pub fn with_max_in_flight(mut self, max_in_flight: usize) -> Self {
        self.max_in_flight = max_in_flight;
        self
    }

    /// Sets the output dimension cap.
    pub fn with_max_tile_dimension(mut self, max_tile_dimension: u32) -> Self {
        self.max_tile_dimension = max_tile_dimension;
        self
    }

    /// Sets the JPEG quality for written composites.
    pub fn with_jpeg_quality(mut self, jpeg_quality: u8) -> Self {
        self.jpeg_quality = jpeg_quality;
        self
    }

    /// Sets the malformed-filename policy.
    pub fn with_parse_policy(mut self, parse_policy: ParsePolicy) -> Self {
        self.parse_policy = parse_policy;
        self
    }

    /// Sets the leaf zoom level.
    pub fn with_leaf_zoom(mut self, leaf_zoom: u8) -> Self {
        self.leaf_zoom = leaf_zoom;
        self
    }

    /// Validates the configuration before a build.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_in_flight == 0 {
            return Err(ConfigError::ZeroInFlight);
        }
        if self.jpeg_quality == 0 || self.jpeg_quality > 100 {
            return Err(ConfigError::InvalidQuality(self.jpeg_quality));
        }
        if self.leaf_zoom == 0 || self.leaf_zoom > LEAF_ZOOM {
            return Err(ConfigError::InvalidLeafZoom {
                got: self.leaf_zoom,
            });
        }
        if self.max_tile_dimension == 0 {
            return Err(ConfigError::ZeroDimension);
        }
        Ok(())
    }
}
