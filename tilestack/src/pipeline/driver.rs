//! Top-level pyramid build loop.
//!
//! Loads the placeholder once, then walks destination levels from the
//! finest (one below the leaf zoom) down toward 0, stopping as soon as a
//! level fits the whole dataset in a single tile.

use std::path::PathBuf;
use std::sync::Arc;

use tracing::info;

use crate::compose::TileCompositor;
use crate::config::RenderConfig;
use crate::progress::{NoProgress, ProgressObserver};
use crate::scan::AreaScanner;
use crate::tile::{Placeholder, TileStore, PLACEHOLDER_ASSET};

use super::level::{LevelBuilder, LevelOutcome};
use super::limiter::ConcurrencyGate;
use super::RenderError;

/// Summary of a finished pyramid build.
#[derive(Debug, Clone, Default)]
pub struct PyramidSummary {
    /// Per-level outcomes, finest first.
    pub levels: Vec<LevelOutcome>,
    /// Total composites written across all levels.
    pub tiles_written: u64,
    /// Highest number of compositions ever in flight at once.
    pub peak_in_flight: usize,
}

impl PyramidSummary {
    /// The coarsest level that was built, if any level ran at all.
    pub fn coarsest_level(&self) -> Option<u8> {
        self.levels.last().map(|outcome| outcome.level)
    }
}

/// Drives the level-by-level pyramid build over one working directory.
pub struct PyramidBuilder {
    workdir: PathBuf,
    config: RenderConfig,
    progress: Arc<dyn ProgressObserver>,
}

impl PyramidBuilder {
    /// Creates a builder over a working directory with default settings.
    pub fn new(workdir: impl Into<PathBuf>) -> Self {
        Self {
            workdir: workdir.into(),
            config: RenderConfig::default(),
            progress: Arc::new(NoProgress),
        }
    }

    /// Replaces the build configuration.
    pub fn with_config(mut self, config: RenderConfig) -> Self {
        self.config = config;
        self
    }

    /// Attaches a progress observer.
    pub fn with_progress(mut self, progress: Arc<dyn ProgressObserver>) -> Self {
        self.progress = progress;
        self
    }

    /// Runs the full build.
    ///
    /// Leaf tiles at the configured leaf zoom must already exist (the
    /// external driver produces them); the placeholder asset must be
    /// present and decodable. Levels run strictly in order, finest to
    /// coarsest, and the loop stops once a level reports a single
    /// destination tile, or after level 0.
    pub async fn run(&self) -> Result<PyramidSummary, RenderError> {
        self.config.validate()?;

        let asset = self.workdir.join(PLACEHOLDER_ASSET);
        info!(asset = %asset.display(), "Loading placeholder asset");
        let placeholder =
            tokio::task::spawn_blocking(move || Placeholder::load(&asset))
                .await
                .map_err(|e| RenderError::TaskFailure(e.to_string()))??;

        let store =
            Arc::new(TileStore::new(&self.workdir).with_jpeg_quality(self.config.jpeg_quality));
        let compositor = Arc::new(
            TileCompositor::new(Arc::new(placeholder))
                .with_max_dimension(self.config.max_tile_dimension),
        );
        let gate = Arc::new(ConcurrencyGate::new(self.config.max_in_flight, "compose"));
        let scanner = AreaScanner::new(&self.workdir).with_policy(self.config.parse_policy);

        let builder = LevelBuilder::new(
            scanner,
            store,
            compositor,
            Arc::clone(&gate),
            Arc::clone(&self.progress),
        );

        let mut summary = PyramidSummary::default();
        for level in (0..self.config.leaf_zoom).rev() {
            let outcome = builder.build(level).await?;
            summary.tiles_written += outcome.written;
            summary.levels.push(outcome);

            if !outcome.has_more() {
                break;
            }
        }
        summary.peak_in_flight = gate.high_water();

        info!(
            levels = summary.levels.len(),
            tiles_written = summary.tiles_written,
            coarsest = ?summary.coarsest_level(),
            "Pyramid build complete"
        );

        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coord::TileCoord;
    use image::{ImageFormat, Rgb, RgbImage};
    use std::path::Path;

    fn prepare_workdir(dir: &Path) {
        let placeholder = RgbImage::from_pixel(8, 8, Rgb([0, 0, 0]));
        placeholder
            .save_with_format(dir.join(PLACEHOLDER_ASSET), ImageFormat::Jpeg)
            .unwrap();
    }

    fn write_leaf(dir: &Path, x: i32, y: i32) {
        let store = TileStore::new(dir);
        let image = RgbImage::from_pixel(8, 8, Rgb([120, 200, 80]));
        store.write_tile(9, TileCoord::new(x, y), &image).unwrap();
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_missing_placeholder_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        write_leaf(dir.path(), 0, 0);

        let result = PyramidBuilder::new(dir.path()).run().await;
        assert!(matches!(result, Err(RenderError::Placeholder(_))));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_empty_leaf_level_terminates_immediately() {
        let dir = tempfile::tempdir().unwrap();
        prepare_workdir(dir.path());

        let summary = PyramidBuilder::new(dir.path()).run().await.unwrap();
        assert_eq!(summary.tiles_written, 0);
        assert_eq!(summary.levels.len(), 1);
        assert_eq!(summary.levels[0].destinations, 0);
        assert!(!dir.path().join("tiles/8").exists());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_single_quad_builds_one_level_and_stops() {
        let dir = tempfile::tempdir().unwrap();
        prepare_workdir(dir.path());
        for (x, y) in [(0, 0), (1, 0), (0, 1), (1, 1)] {
            write_leaf(dir.path(), x, y);
        }

        let summary = PyramidBuilder::new(dir.path()).run().await.unwrap();
        assert_eq!(summary.tiles_written, 1);
        assert_eq!(summary.coarsest_level(), Some(8));
        assert!(dir.path().join("tiles/8/0x0.jpg").is_file());
        assert!(!dir.path().join("tiles/7").exists());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_wide_area_narrows_level_by_level() {
        let dir = tempfile::tempdir().unwrap();
        prepare_workdir(dir.path());
        // 8x8 leaf grid: 16 quads at level 8, 4 at level 7, 1 at level 6.
        for x in 0..8 {
            for y in 0..8 {
                write_leaf(dir.path(), x, y);
            }
        }

        let summary = PyramidBuilder::new(dir.path()).run().await.unwrap();
        let destinations: Vec<u64> = summary.levels.iter().map(|l| l.destinations).collect();
        assert_eq!(destinations, vec![16, 4, 1]);
        assert_eq!(summary.tiles_written, 21);
        assert_eq!(summary.coarsest_level(), Some(6));
        assert!(dir.path().join("tiles/6/0x0.jpg").is_file());
        assert!(!dir.path().join("tiles/5").exists());
    }
}
