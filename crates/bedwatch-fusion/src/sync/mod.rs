//! Frame synchronization for independently clocked sensor streams.
//!
//! The RGB camera and the time-of-flight sensor run on independent clocks
//! and frame rates. [`FrameSynchronizer`] pairs frames whose capture
//! timestamps fall within a tolerance window, grading each pair's quality
//! by the residual timestamp delta.

mod synchronizer;

pub use synchronizer::{FrameSynchronizer, SyncStats, SyncedFramePair};

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for the frame synchronizer.
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// Maximum timestamp delta at which two frames count as the same moment.
    /// Default: one 30 fps frame period (33 ms).
    pub tolerance: Duration,
    /// Buffer depth per stream; also scales the staleness horizon
    /// (`tolerance * max_buffer_size`). Default: 8.
    pub max_buffer_size: usize,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            tolerance: Duration::from_millis(33),
            max_buffer_size: 8,
        }
    }
}

impl SyncConfig {
    /// Creates a new builder.
    #[must_use]
    pub fn builder() -> SyncConfigBuilder {
        SyncConfigBuilder::default()
    }

    /// Tolerance in nanoseconds.
    #[must_use]
    pub(crate) fn tolerance_nanos(&self) -> i64 {
        i64::try_from(self.tolerance.as_nanos()).unwrap_or(i64::MAX)
    }
}

/// Builder for [`SyncConfig`].
#[derive(Debug, Default)]
pub struct SyncConfigBuilder {
    config: SyncConfig,
}

impl SyncConfigBuilder {
    /// Set the pairing tolerance.
    #[must_use]
    pub fn tolerance(mut self, tolerance: Duration) -> Self {
        self.config.tolerance = tolerance;
        self
    }

    /// Set the per-stream buffer depth.
    #[must_use]
    pub fn max_buffer_size(mut self, size: usize) -> Self {
        self.config.max_buffer_size = size.max(1);
        self
    }

    /// Build the configuration.
    #[must_use]
    pub fn build(self) -> SyncConfig {
        self.config
    }
}

/// Grade of a synchronized pair, from the residual timestamp delta.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SyncQuality {
    /// Delta under 10 ms
    Excellent,
    /// Delta under 20 ms
    Good,
    /// Delta under 33 ms
    Acceptable,
    /// Within tolerance but at least a full frame period apart
    Poor,
}

impl SyncQuality {
    /// Grades an absolute timestamp delta in nanoseconds.
    #[must_use]
    pub fn from_delta_nanos(delta_nanos: i64) -> Self {
        let delta = delta_nanos.abs();
        if delta < 10_000_000 {
            SyncQuality::Excellent
        } else if delta < 20_000_000 {
            SyncQuality::Good
        } else if delta < 33_000_000 {
            SyncQuality::Acceptable
        } else {
            SyncQuality::Poor
        }
    }
}
