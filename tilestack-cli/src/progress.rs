//! Console progress bars over the library's progress seam.

use std::sync::Mutex;

use indicatif::{ProgressBar, ProgressStyle};
use tilestack::progress::ProgressObserver;

/// One progress bar per zoom level, replaced as levels advance.
pub struct ConsoleProgress {
    current: Mutex<Option<ProgressBar>>,
}

impl ConsoleProgress {
    pub fn new() -> Self {
        Self {
            current: Mutex::new(None),
        }
    }

    fn bar_style() -> ProgressStyle {
        ProgressStyle::with_template("{prefix:>8} [{bar:40}] {pos}/{len} tiles")
            .expect("progress template is well-formed")
            .progress_chars("=> ")
    }
}

impl Default for ConsoleProgress {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressObserver for ConsoleProgress {
    fn level_started(&self, level: u8, expected: u64) {
        let bar = ProgressBar::new(expected);
        bar.set_style(Self::bar_style());
        bar.set_prefix(format!("level {}", level));

        if let Ok(mut current) = self.current.lock() {
            *current = Some(bar);
        }
    }

    fn tile_finished(&self, _level: u8, _completed: u64) {
        if let Ok(current) = self.current.lock() {
            if let Some(bar) = current.as_ref() {
                bar.inc(1);
            }
        }
    }

    fn level_finished(&self, level: u8, written: u64, pruned: u64) {
        if let Ok(mut current) = self.current.lock() {
            if let Some(bar) = current.take() {
                bar.finish_and_clear();
            }
        }
        println!(
            "Completed zoom level {} ({} written, {} pruned)",
            level, written, pruned
        );
    }
}
