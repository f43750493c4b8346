//! Harvesting tiles from an external producer process.
//!
//! The pyramid builder itself never talks to the producer; it only needs a
//! populated leaf level. This module is the interface to the process that
//! populates it: spawn the producer, watch it from two angles, and decide
//! when the leaf tiles are complete.
//!
//! Two independent watchers race:
//!
//! - the **exit watcher** owns the child process and posts when it exits,
//!   which is always abnormal, because a healthy producer keeps running
//!   until we terminate it;
//! - the **marker watcher** polls the producer's marker file and tile
//!   output until the announced tile count is on disk, then posts.
//!
//! The first signal wins ([`CompletionRace`]); the loser is discarded. If
//! the tiles won, the producer is still running and gets terminated
//! exactly once, via [`TerminateOnce`], regardless of which code path
//! asks for it.

mod race;
mod watcher;

pub use race::{CompletionRace, RaceSender, TerminateOnce};
pub use watcher::{MarkerWatcher, DEFAULT_GRACE, DEFAULT_POLL_INTERVAL};

use std::process::ExitStatus;

use thiserror::Error;
use tokio::process::Child;
use tokio::sync::oneshot;
use tracing::{info, warn};

/// Completion signal posted by a harvest watcher.
#[derive(Debug)]
pub enum HarvestSignal {
    /// The announced number of leaf tiles is on disk.
    TilesReady(u64),
    /// The producer process exited on its own. `None` means its status
    /// could not be collected.
    ProcessExited(Option<ExitStatus>),
    /// A watcher hit an unrecoverable condition.
    WatcherFailed(String),
}

/// Errors ending a harvest without a usable leaf level.
#[derive(Debug, Error)]
pub enum HarvestError {
    /// The producer exited before its tiles were complete.
    #[error("producer exited before rendering completed ({status})")]
    AbnormalExit {
        status: String,
    },

    /// A watcher failed.
    #[error("harvest watcher failed: {0}")]
    WatcherFailed(String),

    /// Every watcher went away without posting a signal.
    #[error("all harvest watchers stopped without signalling")]
    NoSignal,
}

/// Supervises one producer process until its leaf tiles are harvested.
pub struct Harvester {
    child: Child,
    watcher: MarkerWatcher,
}

impl Harvester {
    /// Creates a harvester around an already spawned producer.
    pub fn new(child: Child, watcher: MarkerWatcher) -> Self {
        Self { child, watcher }
    }

    /// Waits until the leaf tiles are complete, then terminates the
    /// producer. Returns the announced tile count.
    ///
    /// The producer exiting first, even cleanly (e.g. a user closing it),
    /// is an abnormal end: its tile output cannot be trusted to be
    /// complete.
    pub async fn wait(self) -> Result<u64, HarvestError> {
        let (signal, race) = CompletionRace::channel();

        let marker_signal = signal.clone();
        let marker_task = tokio::spawn(self.watcher.watch(marker_signal));

        // The exit watcher owns the child. Termination is requested over a
        // oneshot so the kill happens where the child lives.
        let (kill_tx, kill_rx) = oneshot::channel::<()>();
        let exit_signal = signal;
        let mut child = self.child;
        let exit_task = tokio::spawn(async move {
            tokio::select! {
                status = child.wait() => {
                    exit_signal.post(HarvestSignal::ProcessExited(status.ok()));
                }
                _ = kill_rx => {
                    if let Err(e) = child.start_kill() {
                        warn!(error = %e, "Failed to signal producer, it may have already exited");
                    }
                    // Reap so the producer does not linger as a zombie.
                    let _ = child.wait().await;
                }
            }
        });

        let terminate = TerminateOnce::new();
        let outcome = match race.first().await {
            Some(HarvestSignal::TilesReady(count)) => {
                info!(count, "Leaf tiles complete, terminating producer");
                terminate.run(|| {
                    let _ = kill_tx.send(());
                });
                Ok(count)
            }
            Some(HarvestSignal::ProcessExited(status)) => {
                let status = status
                    .map(|s| s.to_string())
                    .unwrap_or_else(|| "unknown status".to_string());
                Err(HarvestError::AbnormalExit { status })
            }
            Some(HarvestSignal::WatcherFailed(reason)) => {
                terminate.run(|| {
                    let _ = kill_tx.send(());
                });
                Err(HarvestError::WatcherFailed(reason))
            }
            None => Err(HarvestError::NoSignal),
        };

        marker_task.abort();
        let _ = exit_task.await;

        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;
    use std::time::Duration;
    use tokio::process::Command;

    fn fast_watcher(workdir: &Path) -> MarkerWatcher {
        MarkerWatcher::new(workdir.join("rendered-tiles"), workdir.join("tiles/9"))
            .with_grace(Duration::from_millis(1))
            .with_poll_interval(Duration::from_millis(5))
    }

    fn long_running_producer() -> Child {
        Command::new("sleep")
            .arg("30")
            .spawn()
            .expect("spawn sleep")
    }

    #[tokio::test]
    async fn test_tiles_ready_terminates_producer() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("rendered-tiles"), "2").unwrap();
        let tiles = dir.path().join("tiles/9");
        std::fs::create_dir_all(&tiles).unwrap();
        std::fs::write(tiles.join("0x0.jpg"), b"").unwrap();
        std::fs::write(tiles.join("1x0.jpg"), b"").unwrap();

        let harvester = Harvester::new(long_running_producer(), fast_watcher(dir.path()));
        let count = harvester.wait().await.unwrap();
        assert_eq!(count, 2);
        // wait() only returns after the exit watcher reaped the child, so
        // reaching this point means the producer is gone.
    }

    #[tokio::test]
    async fn test_producer_exit_before_tiles_is_abnormal() {
        let dir = tempfile::tempdir().unwrap();
        // No marker, no tiles; the producer exits immediately.
        let child = Command::new("true").spawn().expect("spawn true");

        let harvester = Harvester::new(child, fast_watcher(dir.path()));
        let result = harvester.wait().await;
        assert!(matches!(result, Err(HarvestError::AbnormalExit { .. })));
    }

    #[tokio::test]
    async fn test_clean_exit_is_still_abnormal() {
        // A zero exit status is reported as abnormal as well: the producer
        // is supposed to outlive the harvest.
        let dir = tempfile::tempdir().unwrap();
        let child = Command::new("true").spawn().expect("spawn true");

        let harvester = Harvester::new(child, fast_watcher(dir.path()));
        match harvester.wait().await {
            Err(HarvestError::AbnormalExit { status }) => {
                assert!(status.contains("exit status"), "status: {}", status);
            }
            other => panic!("unexpected outcome: {:?}", other.map(|_| ())),
        }
    }

    #[tokio::test]
    async fn test_malformed_marker_fails_and_terminates() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("rendered-tiles"), "garbage").unwrap();

        let harvester = Harvester::new(long_running_producer(), fast_watcher(dir.path()));
        let result = harvester.wait().await;
        assert!(matches!(result, Err(HarvestError::WatcherFailed(_))));
    }
}
