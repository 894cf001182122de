//! Per-frame motion estimation from consecutive RGB frames.
//!
//! Raw single-frame differencing is too noisy (sensor noise, compression
//! artifacts) to drive alerting directly, so the estimator keeps a short
//! ring buffer of per-frame difference scores and reports their running
//! mean.

mod estimator;

pub use estimator::{MotionEstimator, MotionState};

/// Configuration for the motion estimator.
#[derive(Debug, Clone)]
pub struct MotionConfig {
    /// Motion level at or below which the frame counts as still.
    /// Default: 0.05.
    pub stillness_threshold: f64,
    /// Ring buffer length for the running mean. Default: 30 (one second
    /// at 30 fps).
    pub history_frames: usize,
    /// Spatial subsampling step in pixels, both axes. Default: 4.
    pub sample_step: usize,
}

impl Default for MotionConfig {
    fn default() -> Self {
        Self {
            stillness_threshold: 0.05,
            history_frames: 30,
            sample_step: 4,
        }
    }
}

impl MotionConfig {
    /// Creates a new builder.
    #[must_use]
    pub fn builder() -> MotionConfigBuilder {
        MotionConfigBuilder::default()
    }
}

/// Builder for [`MotionConfig`].
#[derive(Debug, Default)]
pub struct MotionConfigBuilder {
    config: MotionConfig,
}

impl MotionConfigBuilder {
    /// Set the stillness threshold.
    #[must_use]
    pub fn stillness_threshold(mut self, threshold: f64) -> Self {
        self.config.stillness_threshold = threshold.clamp(0.0, 1.0);
        self
    }

    /// Set the ring buffer length.
    #[must_use]
    pub fn history_frames(mut self, frames: usize) -> Self {
        self.config.history_frames = frames.max(1);
        self
    }

    /// Set the spatial subsampling step.
    #[must_use]
    pub fn sample_step(mut self, step: usize) -> Self {
        self.config.sample_step = step.max(1);
        self
    }

    /// Build the configuration.
    #[must_use]
    pub fn build(self) -> MotionConfig {
        self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_clamps() {
        let config = MotionConfig::builder()
            .stillness_threshold(1.5)
            .history_frames(0)
            .sample_step(0)
            .build();
        assert_eq!(config.stillness_threshold, 1.0);
        assert_eq!(config.history_frames, 1);
        assert_eq!(config.sample_step, 1);
    }
}
