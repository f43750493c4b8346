//! Marker-file watcher for externally produced tiles.
//!
//! The external producer announces how many leaf tiles it will render by
//! writing that count to a marker file, then writes the tiles themselves.
//! The watcher polls in two phases: first until the marker file exists and
//! parses, then until the leaf tile directory holds at least the announced
//! number of files. It then posts `TilesReady` to the completion race.
//!
//! The producer takes a while to even start up, so polling begins only
//! after a grace delay.

use std::path::PathBuf;
use std::time::Duration;

use tokio::time::sleep;
use tracing::{debug, warn};

use super::race::RaceSender;
use super::HarvestSignal;

/// Default delay before the first poll.
pub const DEFAULT_GRACE: Duration = Duration::from_secs(15);

/// Default interval between polls.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Polls a marker file and a tile directory until the announced tile count
/// is present on disk.
#[derive(Debug, Clone)]
pub struct MarkerWatcher {
    marker_file: PathBuf,
    tiles_dir: PathBuf,
    grace: Duration,
    poll_interval: Duration,
}

impl MarkerWatcher {
    /// Creates a watcher over the marker file and the leaf tile directory
    /// it announces.
    pub fn new(marker_file: impl Into<PathBuf>, tiles_dir: impl Into<PathBuf>) -> Self {
        Self {
            marker_file: marker_file.into(),
            tiles_dir: tiles_dir.into(),
            grace: DEFAULT_GRACE,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }

    /// Overrides the startup grace delay.
    pub fn with_grace(mut self, grace: Duration) -> Self {
        self.grace = grace;
        self
    }

    /// Overrides the poll interval.
    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    /// Watches until the announced tiles exist, then posts to the race.
    ///
    /// Runs until it posts (win or lose) or the marker file contents turn
    /// out to be garbage, which posts `WatcherFailed` instead: the
    /// producer wrote the marker, so a malformed count means something is
    /// genuinely wrong, not merely slow.
    pub async fn watch(self, signal: RaceSender<HarvestSignal>) {
        sleep(self.grace).await;

        let expected = loop {
            match tokio::fs::read_to_string(&self.marker_file).await {
                Ok(contents) => match contents.trim().parse::<u64>() {
                    Ok(count) => break count,
                    Err(_) => {
                        warn!(
                            marker = %self.marker_file.display(),
                            contents = contents.trim(),
                            "Marker file is not a tile count"
                        );
                        signal.post(HarvestSignal::WatcherFailed(format!(
                            "marker file {} is not a tile count: {:?}",
                            self.marker_file.display(),
                            contents.trim()
                        )));
                        return;
                    }
                },
                Err(_) => {
                    debug!(marker = %self.marker_file.display(), "Marker file not ready");
                    sleep(self.poll_interval).await;
                }
            }
        };

        debug!(expected, "Marker announced tile count");

        loop {
            let found = count_files(&self.tiles_dir).await;
            if found >= expected {
                debug!(found, expected, "All announced tiles present");
                signal.post(HarvestSignal::TilesReady(expected));
                return;
            }
            debug!(found, expected, "Waiting for more tiles");
            sleep(self.poll_interval).await;
        }
    }
}

/// Counts regular files in a directory; a missing directory counts zero.
async fn count_files(dir: &PathBuf) -> u64 {
    let Ok(mut entries) = tokio::fs::read_dir(dir).await else {
        return 0;
    };

    let mut count = 0;
    while let Ok(Some(entry)) = entries.next_entry().await {
        if entry.file_type().await.map(|t| t.is_file()).unwrap_or(false) {
            count += 1;
        }
    }
    count
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::harvest::CompletionRace;
    use std::path::Path;
    use std::time::Duration;

    fn fast_watcher(marker: &Path, tiles: &Path) -> MarkerWatcher {
        MarkerWatcher::new(marker, tiles)
            .with_grace(Duration::from_millis(1))
            .with_poll_interval(Duration::from_millis(5))
    }

    fn touch_tiles(dir: &Path, count: usize) {
        std::fs::create_dir_all(dir).unwrap();
        for i in 0..count {
            std::fs::write(dir.join(format!("{}x0.jpg", i)), b"").unwrap();
        }
    }

    #[tokio::test]
    async fn test_posts_when_tiles_already_present() {
        let dir = tempfile::tempdir().unwrap();
        let marker = dir.path().join("rendered-tiles");
        let tiles = dir.path().join("tiles/9");
        std::fs::write(&marker, "3\n").unwrap();
        touch_tiles(&tiles, 3);

        let (tx, race) = CompletionRace::channel();
        tokio::spawn(fast_watcher(&marker, &tiles).watch(tx));

        match race.first().await {
            Some(HarvestSignal::TilesReady(count)) => assert_eq!(count, 3),
            other => panic!("unexpected signal: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_waits_for_marker_then_tiles() {
        let dir = tempfile::tempdir().unwrap();
        let marker = dir.path().join("rendered-tiles");
        let tiles = dir.path().join("tiles/9");

        let (tx, race) = CompletionRace::channel();
        tokio::spawn(fast_watcher(&marker, &tiles).watch(tx));

        // Marker appears late, tiles later still.
        let marker_clone = marker.clone();
        let tiles_clone = tiles.clone();
        tokio::spawn(async move {
            sleep(Duration::from_millis(20)).await;
            std::fs::write(&marker_clone, "2").unwrap();
            sleep(Duration::from_millis(20)).await;
            touch_tiles(&tiles_clone, 2);
        });

        match race.first().await {
            Some(HarvestSignal::TilesReady(count)) => assert_eq!(count, 2),
            other => panic!("unexpected signal: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_malformed_marker_posts_failure() {
        let dir = tempfile::tempdir().unwrap();
        let marker = dir.path().join("rendered-tiles");
        let tiles = dir.path().join("tiles/9");
        std::fs::write(&marker, "not a number").unwrap();

        let (tx, race) = CompletionRace::channel();
        tokio::spawn(fast_watcher(&marker, &tiles).watch(tx));

        assert!(matches!(
            race.first().await,
            Some(HarvestSignal::WatcherFailed(_))
        ));
    }

    #[tokio::test]
    async fn test_extra_tiles_still_satisfy_the_count() {
        let dir = tempfile::tempdir().unwrap();
        let marker = dir.path().join("rendered-tiles");
        let tiles = dir.path().join("tiles/9");
        std::fs::write(&marker, "2").unwrap();
        touch_tiles(&tiles, 5);

        let (tx, race) = CompletionRace::channel();
        tokio::spawn(fast_watcher(&marker, &tiles).watch(tx));

        assert!(matches!(
            race.first().await,
            Some(HarvestSignal::TilesReady(2))
        ));
    }
}
