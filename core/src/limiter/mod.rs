//! Admission control for workflows
//!
//! Two independent gates sit in front of every workflow:
//!
//! - [`ConcurrencyLimiter`] bounds how many workflows are in flight. A slot is
//!   held by a [`SlotGuard`] and released when the guard drops, so success,
//!   failure, timeout, panic and cancellation all give the slot back exactly once.
//! - [`LaunchPacer`] optionally spaces out workflow launches (token bucket).
//!
//! # Example
//!
//! ```ignore
//! let limiter = ConcurrencyLimiter::new(10);
//! let slot = limiter.acquire().await?;
//! let outcome = driver.run(request).await;
//! drop(slot);
//! assert_eq!(limiter.stats().released, 1);
//! ```

mod pacer;
mod slots;

pub use pacer::LaunchPacer;
pub use slots::{ConcurrencyLimiter, LimiterClosed, LimiterStats, SlotGuard};
