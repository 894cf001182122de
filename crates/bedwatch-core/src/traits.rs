//! Core trait abstractions for the bedwatch system.
//!
//! These traits define the seams between the fusion engine and its external
//! collaborators:
//!
//! - [`MonotonicClock`]: injected time source so hysteresis and rate-limit
//!   logic can be unit-tested without real wall-clock delays
//! - [`ObjectDetector`]: the external per-frame neural detector
//! - [`SceneCaptioner`]: the external vision-language captioner invoked when
//!   the arbitration engine emits a trigger
//!
//! The engine itself never runs a neural network; it only consumes detector
//! output and produces trigger events for the captioner's scheduler.

use async_trait::async_trait;
use std::sync::atomic::{AtomicI64, Ordering};
use std::time::{Duration, Instant};

use crate::error::CoreResult;
use crate::types::{Detection, RgbFrame, Timestamp};

// =============================================================================
// Clock
// =============================================================================

/// A monotonic time source.
///
/// All temporal logic in the engine (buffer eviction, stillness timing,
/// stability counting, trigger rate limiting) reads time through this trait
/// so the same clock domain is used everywhere.
pub trait MonotonicClock: Send + Sync {
    /// Current monotonic time.
    fn now(&self) -> Timestamp;
}

/// Production clock anchored to an arbitrary process epoch.
///
/// Backed by [`std::time::Instant`], so it never moves backwards and is
/// unaffected by wall-clock adjustments.
#[derive(Debug, Clone)]
pub struct SystemClock {
    anchor: Instant,
}

impl SystemClock {
    /// Creates a clock anchored at the current instant.
    #[must_use]
    pub fn new() -> Self {
        Self {
            anchor: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl MonotonicClock for SystemClock {
    fn now(&self) -> Timestamp {
        let nanos = i64::try_from(self.anchor.elapsed().as_nanos()).unwrap_or(i64::MAX);
        Timestamp::from_nanos(nanos)
    }
}

/// Manually advanced clock for tests.
///
/// ```rust
/// use bedwatch_core::{ManualClock, MonotonicClock};
/// use std::time::Duration;
///
/// let clock = ManualClock::new();
/// let t0 = clock.now();
/// clock.advance(Duration::from_millis(33));
/// assert_eq!(clock.now().delta_nanos(t0), 33_000_000);
/// ```
#[derive(Debug, Default)]
pub struct ManualClock {
    nanos: AtomicI64,
}

impl ManualClock {
    /// Creates a clock at the process epoch.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a clock at a given starting point.
    #[must_use]
    pub fn starting_at(timestamp: Timestamp) -> Self {
        Self {
            nanos: AtomicI64::new(timestamp.as_nanos()),
        }
    }

    /// Advances the clock by `duration`.
    pub fn advance(&self, duration: Duration) {
        let nanos = i64::try_from(duration.as_nanos()).unwrap_or(i64::MAX);
        self.nanos.fetch_add(nanos, Ordering::SeqCst);
    }

    /// Sets the clock to an absolute timestamp.
    pub fn set(&self, timestamp: Timestamp) {
        self.nanos.store(timestamp.as_nanos(), Ordering::SeqCst);
    }
}

impl MonotonicClock for ManualClock {
    fn now(&self) -> Timestamp {
        Timestamp::from_nanos(self.nanos.load(Ordering::SeqCst))
    }
}

// =============================================================================
// External collaborators
// =============================================================================

/// External per-frame object detector.
///
/// Implementations wrap a neural runtime and return class-labeled bounding
/// boxes. The engine treats the output as opaque input and performs no
/// detection itself.
pub trait ObjectDetector: Send {
    /// Detects objects in an RGB frame.
    fn detect(&mut self, frame: &RgbFrame) -> CoreResult<Vec<Detection>>;
}

/// External vision-language captioner (the "slow pipeline").
///
/// Invoked by an external scheduler when the arbitration engine emits a
/// trigger event; never called from the fusion engine directly.
#[async_trait]
pub trait SceneCaptioner: Send + Sync {
    /// Produces a rich textual description of the frame.
    async fn describe(&self, frame: &RgbFrame, prompt: &str) -> CoreResult<String>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_system_clock_is_monotonic() {
        let clock = SystemClock::new();
        let a = clock.now();
        let b = clock.now();
        assert!(b >= a);
    }

    #[test]
    fn test_manual_clock_advance_and_set() {
        let clock = ManualClock::new();
        assert_eq!(clock.now(), Timestamp::ZERO);

        clock.advance(Duration::from_secs(2));
        assert_eq!(clock.now().as_millis(), 2000);

        clock.set(Timestamp::from_millis(500));
        assert_eq!(clock.now().as_millis(), 500);
    }

    #[test]
    fn test_manual_clock_starting_at() {
        let clock = ManualClock::starting_at(Timestamp::from_millis(100));
        assert_eq!(clock.now().as_millis(), 100);
    }
}
