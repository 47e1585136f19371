//! Pacing of workflow launches

use governor::{clock::DefaultClock, state::InMemoryState, state::NotKeyed, Quota, RateLimiter};
use std::num::NonZeroU32;

type Bucket = RateLimiter<NotKeyed, InMemoryState, DefaultClock>;

/// Spaces out workflow launches to a sustained rate
///
/// The orchestrator awaits [`LaunchPacer::wait`] before spawning each
/// workflow. The bucket holds a single token, so a run never starts with a
/// burst: launch `n` happens no earlier than `(n - 1) / rate` seconds in.
/// Without a rate every wait returns immediately.
pub struct LaunchPacer {
    bucket: Option<Bucket>,
    launches_per_sec: Option<u32>,
}

impl LaunchPacer {
    /// Pace launches to `rate` per second; `None` or a non-positive rate disables pacing
    ///
    /// Fractional rates round up to the next whole launch per second.
    pub fn new(rate: Option<f64>) -> Self {
        let launches_per_sec = rate
            .filter(|per_sec| *per_sec > 0.0)
            .map(|per_sec| (per_sec.ceil() as u32).max(1));
        let bucket = launches_per_sec
            .and_then(NonZeroU32::new)
            .map(|n| RateLimiter::direct(Quota::per_second(n).allow_burst(NonZeroU32::MIN)));

        Self {
            bucket,
            launches_per_sec,
        }
    }

    /// Wait for the next launch slot
    pub async fn wait(&self) {
        if let Some(bucket) = &self.bucket {
            bucket.until_ready().await;
        }
    }
}

impl std::fmt::Debug for LaunchPacer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LaunchPacer")
            .field("launches_per_sec", &self.launches_per_sec)
            .finish()
    }
}
