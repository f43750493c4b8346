//! First-signal-wins completion race.
//!
//! Several independent watcher tasks observe the same external process
//! from different angles; whichever finishes first decides the outcome.
//! The rule is explicit: the first post wins, every later post is
//! discarded. There is no further coordination between watchers; losers
//! are simply ignored or dropped.

use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::mpsc;

/// Sending half of a completion race. Cloned into each watcher task.
#[derive(Debug)]
pub struct RaceSender<T> {
    tx: mpsc::Sender<T>,
}

impl<T> Clone for RaceSender<T> {
    fn clone(&self) -> Self {
        Self {
            tx: self.tx.clone(),
        }
    }
}

impl<T> RaceSender<T> {
    /// Posts a completion signal.
    ///
    /// Returns `true` if this post won the race. A losing post (the race
    /// already has a winner, or the receiver is gone) returns `false`
    /// and the value is discarded.
    pub fn post(&self, value: T) -> bool {
        self.tx.try_send(value).is_ok()
    }
}

/// Receiving half of a completion race.
#[derive(Debug)]
pub struct CompletionRace<T> {
    rx: mpsc::Receiver<T>,
}

impl<T> CompletionRace<T> {
    /// Creates a race and its shared sending half.
    pub fn channel() -> (RaceSender<T>, CompletionRace<T>) {
        // Capacity 1: the winning post parks in the slot, every later
        // try_send fails immediately.
        let (tx, rx) = mpsc::channel(1);
        (RaceSender { tx }, CompletionRace { rx })
    }

    /// Waits for the winning signal.
    ///
    /// Consumes the race: after this resolves the receiver is gone and all
    /// later posts lose. Returns `None` only if every sender was dropped
    /// without posting.
    pub async fn first(mut self) -> Option<T> {
        self.rx.recv().await
    }
}

/// One-shot guard around a cleanup action.
///
/// Whichever watcher wins the race, the corresponding external cleanup
/// (terminating the process) must happen exactly once. `run` executes the
/// action on the first call and refuses every call after that, from any
/// thread.
#[derive(Debug, Default)]
pub struct TerminateOnce {
    fired: AtomicBool,
}

impl TerminateOnce {
    /// Creates an unfired guard.
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs `action` if the guard has not fired yet.
    ///
    /// Returns `true` if the action ran.
    pub fn run<F: FnOnce()>(&self, action: F) -> bool {
        if self.fired.swap(true, Ordering::SeqCst) {
            return false;
        }
        action();
        true
    }

    /// True once the action has run.
    pub fn has_fired(&self) -> bool {
        self.fired.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_first_post_wins() {
        let (tx, race) = CompletionRace::channel();

        assert!(tx.post("winner"));
        assert!(!tx.post("loser"), "second post must be discarded");

        assert_eq!(race.first().await, Some("winner"));
    }

    #[tokio::test]
    async fn test_posts_after_race_resolves_are_discarded() {
        let (tx, race) = CompletionRace::channel();

        assert!(tx.post(1));
        assert_eq!(race.first().await, Some(1));

        // The receiver is gone; the slot being free again must not let a
        // late post pretend it won.
        assert!(!tx.post(2));
    }

    #[tokio::test]
    async fn test_race_between_two_tasks_yields_exactly_one_winner() {
        let (tx, race) = CompletionRace::channel();

        let wins = Arc::new(AtomicUsize::new(0));
        let mut handles = Vec::new();
        for id in 0..2 {
            let tx = tx.clone();
            let wins = Arc::clone(&wins);
            handles.push(tokio::spawn(async move {
                if tx.post(id) {
                    wins.fetch_add(1, Ordering::SeqCst);
                }
            }));
        }
        drop(tx);

        let winner = race.first().await.unwrap();
        for handle in handles {
            handle.await.unwrap();
        }

        assert_eq!(wins.load(Ordering::SeqCst), 1);
        assert!(winner < 2);
    }

    #[tokio::test]
    async fn test_all_senders_dropped_without_posting() {
        let (tx, race) = CompletionRace::<u32>::channel();
        drop(tx);
        assert_eq!(race.first().await, None);
    }

    #[test]
    fn test_terminate_once_runs_exactly_once() {
        let guard = TerminateOnce::new();
        let calls = AtomicUsize::new(0);

        assert!(guard.run(|| {
            calls.fetch_add(1, Ordering::SeqCst);
        }));
        assert!(!guard.run(|| {
            calls.fetch_add(1, Ordering::SeqCst);
        }));

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(guard.has_fired());
    }
}
