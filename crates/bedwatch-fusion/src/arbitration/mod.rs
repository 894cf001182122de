//! Event arbitration: real-time alerting and debounced escalation.
//!
//! Two layers run on every evaluation cycle. The fast path turns the
//! cycle's fused observations into at most one [`Alert`], picked by
//! fixed priority. The slow path debounces per-category classification
//! signals through [`StableState`] and schedules at most one
//! [`TriggerEvent`] for expensive downstream analysis, rate-limited so
//! a noisy classifier cannot saturate that analysis.
//!
//! [`Alert`]: crate::domain::Alert
//! [`TriggerEvent`]: crate::domain::TriggerEvent

mod engine;
mod stability;

pub use engine::{ArbitrationEngine, CycleInput};
pub use stability::{StableState, Transition};

use std::time::Duration;

/// Configuration for the arbitration engine.
#[derive(Debug, Clone)]
pub struct ArbitrationConfig {
    /// Consecutive identical samples required before a category value
    /// counts as stable. Default: 3.
    pub stability_threshold: usize,
    /// Stillness duration that raises a stillness alert, in seconds.
    /// Default: 300.
    pub stillness_alert_secs: u64,
    /// Depth-fall confidence above which the depth-verified fall alert
    /// fires. Default: 0.7.
    pub depth_fall_confidence: f64,
    /// Bed-zone excursion that qualifies as leaving the zone, in
    /// meters. Default: 0.5.
    pub bed_exit_distance_meters: f64,
    /// Safety-signal confidence that bypasses the stability
    /// requirement. Default: 0.85.
    pub safety_bypass_confidence: f64,
    /// Minimum interval between emitted triggers. Default: 60 s.
    pub min_trigger_interval: Duration,
    /// Quiet period after which a periodic fallback trigger fires.
    /// Default: 300 s.
    pub fallback_interval: Duration,
}

impl Default for ArbitrationConfig {
    fn default() -> Self {
        Self {
            stability_threshold: 3,
            stillness_alert_secs: 300,
            depth_fall_confidence: 0.7,
            bed_exit_distance_meters: 0.5,
            safety_bypass_confidence: 0.85,
            min_trigger_interval: Duration::from_secs(60),
            fallback_interval: Duration::from_secs(300),
        }
    }
}

impl ArbitrationConfig {
    /// Creates a new builder.
    #[must_use]
    pub fn builder() -> ArbitrationConfigBuilder {
        ArbitrationConfigBuilder::default()
    }
}

/// Builder for [`ArbitrationConfig`].
#[derive(Debug, Default)]
pub struct ArbitrationConfigBuilder {
    config: ArbitrationConfig,
}

impl ArbitrationConfigBuilder {
    /// Set the stability threshold.
    #[must_use]
    pub fn stability_threshold(mut self, threshold: usize) -> Self {
        self.config.stability_threshold = threshold.max(1);
        self
    }

    /// Set the stillness alert threshold in seconds.
    #[must_use]
    pub fn stillness_alert_secs(mut self, secs: u64) -> Self {
        self.config.stillness_alert_secs = secs;
        self
    }

    /// Set the depth-fall alert confidence threshold.
    #[must_use]
    pub fn depth_fall_confidence(mut self, confidence: f64) -> Self {
        self.config.depth_fall_confidence = confidence.clamp(0.0, 1.0);
        self
    }

    /// Set the bed-exit distance in meters.
    #[must_use]
    pub fn bed_exit_distance_meters(mut self, meters: f64) -> Self {
        self.config.bed_exit_distance_meters = meters.max(0.0);
        self
    }

    /// Set the safety stability-bypass confidence.
    #[must_use]
    pub fn safety_bypass_confidence(mut self, confidence: f64) -> Self {
        self.config.safety_bypass_confidence = confidence.clamp(0.0, 1.0);
        self
    }

    /// Set the minimum interval between triggers.
    #[must_use]
    pub fn min_trigger_interval(mut self, interval: Duration) -> Self {
        self.config.min_trigger_interval = interval;
        self
    }

    /// Set the periodic fallback interval.
    #[must_use]
    pub fn fallback_interval(mut self, interval: Duration) -> Self {
        self.config.fallback_interval = interval;
        self
    }

    /// Build the configuration.
    #[must_use]
    pub fn build(self) -> ArbitrationConfig {
        self.config
    }
}
