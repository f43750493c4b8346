//! Level-by-level pyramid build pipeline.
//!
//! [`PyramidBuilder`] drives [`LevelBuilder`] over destination levels in
//! strict finest-to-coarsest order; within a level, quad compositions run
//! as independent tasks bounded by the [`ConcurrencyGate`].

mod driver;
mod level;
mod limiter;

pub use driver::{PyramidBuilder, PyramidSummary};
pub use level::{LevelBuilder, LevelOutcome, TileOutcome};
pub use limiter::{ConcurrencyGate, GatePermit};

use thiserror::Error;

use crate::config::ConfigError;
use crate::scan::ScanError;
use crate::tile::{PlaceholderError, StoreError};

/// Errors aborting a pyramid build.
///
/// The build is fail-fast: the first unrecoverable error stops the run and
/// surfaces here. Absent source tiles are not errors; they are substituted
/// with the placeholder long before this type is involved.
#[derive(Debug, Error)]
pub enum RenderError {
    /// Invalid build configuration.
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),

    /// The placeholder asset is missing or undecodable.
    #[error(transparent)]
    Placeholder(#[from] PlaceholderError),

    /// Area scanning failed.
    #[error(transparent)]
    Scan(#[from] ScanError),

    /// Tile read, decode, encode, or write failed.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// A composition task panicked or was torn down mid-level.
    #[error("composition task failed: {0}")]
    TaskFailure(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_store_error_is_transparent() {
        let err = RenderError::from(StoreError::Write {
            path: PathBuf::from("/work/tiles/8/0x0.jpg"),
            source: std::io::Error::other("disk full"),
        });
        assert!(err.to_string().contains("/work/tiles/8/0x0.jpg"));
        assert!(err.to_string().contains("disk full"));
    }

    #[test]
    fn test_config_error_is_wrapped() {
        let err = RenderError::from(ConfigError::ZeroInFlight);
        assert!(err.to_string().contains("invalid configuration"));
    }
}
