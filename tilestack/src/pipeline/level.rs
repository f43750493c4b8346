//! Single-level build: scan the source level, composite every quad.
//!
//! Levels are strictly sequential (level `z` reads the files level `z+1`
//! wrote), but within a level every quad is an independent task bounded by
//! the admission gate. Tasks never wait on each other's results: each one
//! writes a disjoint output file, so the only shared state is the
//! read-only placeholder, the gate counters, and the progress counter.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::task::JoinSet;
use tracing::{debug, info};

use crate::compose::{Quad, TileCompositor};
use crate::coord::TileCoord;
use crate::progress::ProgressObserver;
use crate::scan::AreaScanner;
use crate::tile::TileStore;

use super::limiter::ConcurrencyGate;
use super::RenderError;

/// What happened to one destination quad.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TileOutcome {
    /// A composite was written.
    Written,
    /// All four children were absent; nothing was written.
    Pruned,
}

/// Result of building one destination level.
#[derive(Debug, Clone, Copy)]
pub struct LevelOutcome {
    /// Destination zoom level.
    pub level: u8,
    /// Destination quad count derived from the source bounds.
    pub destinations: u64,
    /// Composites actually written.
    pub written: u64,
    /// Blank quads pruned.
    pub pruned: u64,
}

impl LevelOutcome {
    fn empty(level: u8) -> Self {
        Self {
            level,
            destinations: 0,
            written: 0,
            pruned: 0,
        }
    }

    /// True while the pyramid still narrows: more than one destination
    /// tile means a coarser level is needed.
    pub fn has_more(&self) -> bool {
        self.destinations > 1
    }
}

/// Builds one destination level from the level above it.
pub struct LevelBuilder {
    scanner: AreaScanner,
    store: Arc<TileStore>,
    compositor: Arc<TileCompositor>,
    gate: Arc<ConcurrencyGate>,
    progress: Arc<dyn ProgressObserver>,
}

impl LevelBuilder {
    /// Assembles a level builder from the shared pipeline pieces.
    pub fn new(
        scanner: AreaScanner,
        store: Arc<TileStore>,
        compositor: Arc<TileCompositor>,
        gate: Arc<ConcurrencyGate>,
        progress: Arc<dyn ProgressObserver>,
    ) -> Self {
        Self {
            scanner,
            store,
            compositor,
            gate,
            progress,
        }
    }

    /// Builds destination level `level` from source level `level + 1`.
    ///
    /// Scans the source bounds, dispatches one gated composition task per
    /// quad, and waits for all of them. The first failed task aborts the
    /// level (fail-fast; remaining tasks are dropped with the `JoinSet`).
    pub async fn build(&self, level: u8) -> Result<LevelOutcome, RenderError> {
        let source = level + 1;

        let scanner = self.scanner.clone();
        let bounds = tokio::task::spawn_blocking(move || scanner.scan_level(source))
            .await
            .map_err(|e| RenderError::TaskFailure(e.to_string()))??;

        let Some(bounds) = bounds else {
            debug!(level, source, "Source level empty, nothing to build");
            return Ok(LevelOutcome::empty(level));
        };

        let destinations = bounds.destination_count();
        info!(
            level,
            source,
            top_left = %bounds.top_left(),
            bottom_right = %bounds.bottom_right(),
            destinations,
            "Building zoom level"
        );
        self.progress.level_started(level, destinations);

        let completed = Arc::new(AtomicU64::new(0));
        let mut tasks: JoinSet<Result<TileOutcome, RenderError>> = JoinSet::new();

        for origin in bounds.quad_origins() {
            let store = Arc::clone(&self.store);
            let compositor = Arc::clone(&self.compositor);
            let gate = Arc::clone(&self.gate);
            let progress = Arc::clone(&self.progress);
            let completed = Arc::clone(&completed);

            tasks.spawn(async move {
                let _permit = gate.admit().await;

                let outcome = tokio::task::spawn_blocking(move || {
                    compose_quad(&store, &compositor, level, origin)
                })
                .await
                .map_err(|e| RenderError::TaskFailure(e.to_string()))??;

                let done = completed.fetch_add(1, Ordering::Relaxed) + 1;
                progress.tile_finished(level, done);
                Ok(outcome)
            });
        }

        let mut written = 0u64;
        let mut pruned = 0u64;
        while let Some(joined) = tasks.join_next().await {
            let outcome = joined.map_err(|e| RenderError::TaskFailure(e.to_string()))??;
            match outcome {
                TileOutcome::Written => written += 1,
                TileOutcome::Pruned => pruned += 1,
            }
        }

        info!(level, written, pruned, "Completed zoom level");
        self.progress.level_finished(level, written, pruned);

        Ok(LevelOutcome {
            level,
            destinations,
            written,
            pruned,
        })
    }
}

/// Reads one quad of children at `level + 1`, composes them, and writes
/// the destination tile at `level`. Runs on the blocking pool: decode,
/// resize, and encode are all CPU- or disk-bound.
fn compose_quad(
    store: &TileStore,
    compositor: &TileCompositor,
    level: u8,
    origin: TileCoord,
) -> Result<TileOutcome, RenderError> {
    let source = level + 1;

    let quad = Quad {
        top_left: store.read_tile(source, origin)?,
        top_right: store.read_tile(source, TileCoord::new(origin.x + 1, origin.y))?,
        bottom_left: store.read_tile(source, TileCoord::new(origin.x, origin.y + 1))?,
        bottom_right: store.read_tile(source, TileCoord::new(origin.x + 1, origin.y + 1))?,
    };

    match compositor.compose(origin, &quad) {
        Some(composite) => {
            store.write_tile(level, origin.parent(), &composite)?;
            Ok(TileOutcome::Written)
        }
        None => Ok(TileOutcome::Pruned),
    }
}
