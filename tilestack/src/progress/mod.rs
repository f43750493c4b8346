//! Progress reporting seam between the pipeline and its caller.
//!
//! The level builder reports tile completions from concurrent tasks, so
//! implementations must be `Send + Sync`; the CLI hangs its progress bars
//! off this trait, and tests use it to observe scheduling.

/// Observer of pyramid build progress.
///
/// All methods have empty default bodies; implement only what you need.
pub trait ProgressObserver: Send + Sync {
    /// A destination level is about to be built with `expected` candidate
    /// quads.
    fn level_started(&self, level: u8, expected: u64) {
        let _ = (level, expected);
    }

    /// One composition task finished (written or pruned); `completed` is
    /// the running count for this level.
    fn tile_finished(&self, level: u8, completed: u64) {
        let _ = (level, completed);
    }

    /// A destination level finished; `written` tiles produced, `pruned`
    /// blank quads skipped.
    fn level_finished(&self, level: u8, written: u64, pruned: u64) {
        let _ = (level, written, pruned);
    }
}

/// No-op observer for headless runs.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoProgress;

impl ProgressObserver for NoProgress {}
