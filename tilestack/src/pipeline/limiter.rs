//! Admission gate bounding concurrent compositions.
//!
//! A composition holds up to five decoded images at once (four children
//! plus the composite), so an unbounded level would scale peak memory and
//! open file handles with the quad count. The gate is an explicit counting
//! semaphore: a task acquires a permit before doing any work and the
//! permit releases itself on drop, success or failure, so errors never
//! leak capacity.
//!
//! The gate tracks in-flight and high-water counters so the bound is
//! observable from tests and summaries.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

/// Fixed-capacity admission gate for composition tasks.
#[derive(Debug)]
pub struct ConcurrencyGate {
    semaphore: Arc<Semaphore>,
    capacity: usize,
    in_flight: Arc<AtomicUsize>,
    high_water: Arc<AtomicUsize>,
    label: String,
}

/// RAII admission slot. Dropping it releases the slot unconditionally.
#[derive(Debug)]
pub struct GatePermit {
    _permit: OwnedSemaphorePermit,
    in_flight: Arc<AtomicUsize>,
}

impl Drop for GatePermit {
    fn drop(&mut self) {
        self.in_flight.fetch_sub(1, Ordering::Relaxed);
    }
}

impl ConcurrencyGate {
    /// Creates a gate with the given capacity.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is zero; configuration validation rejects that
    /// before a gate is ever constructed.
    pub fn new(capacity: usize, label: impl Into<String>) -> Self {
        assert!(capacity > 0, "gate capacity must be > 0");
        let label = label.into();
        tracing::debug!(capacity, label = %label, "Created admission gate");
        Self {
            semaphore: Arc::new(Semaphore::new(capacity)),
            capacity,
            in_flight: Arc::new(AtomicUsize::new(0)),
            high_water: Arc::new(AtomicUsize::new(0)),
            label,
        }
    }

    /// Waits for a free slot and occupies it.
    pub async fn admit(&self) -> GatePermit {
        let permit = Arc::clone(&self.semaphore)
            .acquire_owned()
            .await
            .expect("admission gate semaphore closed");

        let now = self.in_flight.fetch_add(1, Ordering::Relaxed) + 1;
        self.high_water.fetch_max(now, Ordering::Relaxed);

        GatePermit {
            _permit: permit,
            in_flight: Arc::clone(&self.in_flight),
        }
    }

    /// Configured capacity.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of permits currently held.
    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::Relaxed)
    }

    /// Highest number of permits ever held at once.
    pub fn high_water(&self) -> usize {
        self.high_water.load(Ordering::Relaxed)
    }

    /// Gate label, for logging.
    pub fn label(&self) -> &str {
        &self.label
    }
}
