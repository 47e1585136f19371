//! Bounded in-flight slots with guaranteed release

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

/// Bounds the number of concurrently running workflows
///
/// Cheap to clone; clones share the same slots and counters.
#[derive(Debug, Clone)]
pub struct ConcurrencyLimiter {
    semaphore: Arc<Semaphore>,
    max_concurrent: usize,
    counters: Arc<SlotCounters>,
}

#[derive(Debug, Default)]
struct SlotCounters {
    acquired: AtomicUsize,
    released: AtomicUsize,
    in_flight: AtomicUsize,
    peak: AtomicUsize,
}

/// The slot semaphore was closed while waiting
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("concurrency limiter closed")]
pub struct LimiterClosed;

/// Snapshot of slot accounting
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LimiterStats {
    /// Configured maximum
    pub max_concurrent: usize,
    /// Slots handed out
    pub acquired: usize,
    /// Slots given back
    pub released: usize,
    /// Slots currently held
    pub in_flight: usize,
    /// Highest number of slots held at once
    pub peak: usize,
}

impl LimiterStats {
    /// Every acquired slot has been released
    pub fn is_balanced(&self) -> bool {
        self.acquired == self.released && self.in_flight == 0
    }
}

impl ConcurrencyLimiter {
    /// Create a limiter with `max_concurrent` slots (at least one)
    pub fn new(max_concurrent: usize) -> Self {
        let max_concurrent = max_concurrent.max(1);
        Self {
            semaphore: Arc::new(Semaphore::new(max_concurrent)),
            max_concurrent,
            counters: Arc::new(SlotCounters::default()),
        }
    }

    /// Wait for a free slot
    ///
    /// Cancel-safe: dropping the future before it resolves takes no slot.
    pub async fn acquire(&self) -> Result<SlotGuard, LimiterClosed> {
        let permit = Arc::clone(&self.semaphore)
            .acquire_owned()
            .await
            .map_err(|_| LimiterClosed)?;
        Ok(self.guard(permit))
    }

    /// Current accounting
    pub fn stats(&self) -> LimiterStats {
        LimiterStats {
            max_concurrent: self.max_concurrent,
            acquired: self.counters.acquired.load(Ordering::SeqCst),
            released: self.counters.released.load(Ordering::SeqCst),
            in_flight: self.counters.in_flight.load(Ordering::SeqCst),
            peak: self.counters.peak.load(Ordering::SeqCst),
        }
    }

    fn guard(&self, permit: OwnedSemaphorePermit) -> SlotGuard {
        self.counters.acquired.fetch_add(1, Ordering::SeqCst);
        let now = self.counters.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.counters.peak.fetch_max(now, Ordering::SeqCst);
        SlotGuard {
            _permit: permit,
            counters: Arc::clone(&self.counters),
        }
    }
}

/// A held slot; released on drop
#[derive(Debug)]
#[must_use = "the slot is released as soon as the guard is dropped"]
pub struct SlotGuard {
    _permit: OwnedSemaphorePermit,
    counters: Arc<SlotCounters>,
}

impl Drop for SlotGuard {
    fn drop(&mut self) {
        // Counters first; the permit field drops right after this body.
        self.counters.in_flight.fetch_sub(1, Ordering::SeqCst);
        self.counters.released.fetch_add(1, Ordering::SeqCst);
    }
}
