//! # Bedwatch Fusion
//!
//! Temporal sensor-fusion and event-arbitration engine for bedside
//! patient monitoring.
//!
//! The engine fuses an RGB camera stream with a time-of-flight depth
//! stream, tracks subject motion and pose over time, and arbitrates the
//! fused observations into at most one alert and one escalation trigger
//! per cycle. Detection and scene captioning stay outside this crate,
//! behind the traits in `bedwatch-core`; this crate owns everything
//! temporal.
//!
//! ## Architecture
//!
//! ```text
//!  RGB stream ──┐                        ┌──────────────┐
//!               ├─► FrameSynchronizer ──►│ fused pair   │
//!  depth stream─┘                        └──────┬───────┘
//!                                               │
//!            ┌──────────────┬───────────────────┼─────────────┐
//!            ▼              ▼                   ▼             │
//!     MotionEstimator  DepthAnalyzer   classify + PoseSmoother│
//!            │              │                   │             │
//!            └──────────────┴───────┬───────────┘             │
//!                                   ▼                         │
//!                          ArbitrationEngine ◄── external signals
//!                                   │
//!                       at most one Alert + one TriggerEvent
//! ```
//!
//! ## Example
//!
//! ```rust,no_run
//! use bedwatch_core::{RgbFrame, Timestamp};
//! use bedwatch_fusion::{MonitorConfig, PatientMonitor};
//!
//! fn main() -> bedwatch_fusion::Result<()> {
//!     let mut monitor = PatientMonitor::new(MonitorConfig::default());
//!     let mut alerts = monitor.subscribe();
//!
//!     let frame = RgbFrame::new(
//!         vec![0; 640 * 480 * 4],
//!         640,
//!         480,
//!         Timestamp::from_millis(0),
//!     )?;
//!     if let Some(pair) = monitor.ingest_rgb(frame) {
//!         let outcome = monitor.evaluate(&pair, &[], &[]);
//!         assert!(outcome.alert.is_none() || alerts.try_recv().is_ok());
//!     }
//!     Ok(())
//! }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod arbitration;
pub mod depth;
pub mod domain;
pub mod motion;
pub mod pipeline;
pub mod pose;
pub mod sync;

pub use arbitration::{ArbitrationConfig, ArbitrationEngine, CycleInput, StableState};
pub use depth::{
    BedZone, DepthAnalyzer, DepthConfig, DepthReconstructor, DepthStats, FallDetector, FallEvent,
};
pub use domain::{
    Alert, AlertEnvelope, AlertId, ClassificationSignal, CycleOutcome, Pose, SignalCategory,
    Suppression, TriggerEvent,
};
pub use motion::{MotionConfig, MotionEstimator, MotionState};
pub use pipeline::{MonitorStats, PatientMonitor};
pub use pose::{PoseConfig, PoseSmoother, SmoothedPose};
pub use sync::{FrameSynchronizer, SyncConfig, SyncQuality, SyncStats, SyncedFramePair};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Common result type for fusion operations
pub type Result<T> = std::result::Result<T, FusionError>;

/// Unified error type for fusion operations
#[derive(Debug, thiserror::Error)]
pub enum FusionError {
    /// Core type or validation error
    #[error("core error: {0}")]
    Core(#[from] bedwatch_core::CoreError),

    /// Malformed frame input
    #[error("frame error: {0}")]
    Frame(#[from] bedwatch_core::FrameError),

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// Alert delivery error
    #[error("alert channel error: {0}")]
    AlertChannel(String),
}

/// Aggregate configuration for a [`PatientMonitor`].
#[derive(Debug, Clone)]
pub struct MonitorConfig {
    /// Frame synchronizer settings.
    pub sync: SyncConfig,
    /// Motion estimator settings.
    pub motion: MotionConfig,
    /// Depth analysis and fall detection settings.
    pub depth: DepthConfig,
    /// Pose smoothing settings.
    pub pose: PoseConfig,
    /// Arbitration settings.
    pub arbitration: ArbitrationConfig,
    /// Alert broadcast channel capacity.
    pub alert_channel_capacity: usize,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            sync: SyncConfig::default(),
            motion: MotionConfig::default(),
            depth: DepthConfig::default(),
            pose: PoseConfig::default(),
            arbitration: ArbitrationConfig::default(),
            alert_channel_capacity: 64,
        }
    }
}

impl MonitorConfig {
    /// Creates a new builder.
    #[must_use]
    pub fn builder() -> MonitorConfigBuilder {
        MonitorConfigBuilder::default()
    }
}

/// Builder for [`MonitorConfig`].
#[derive(Debug, Default)]
pub struct MonitorConfigBuilder {
    config: MonitorConfig,
}

impl MonitorConfigBuilder {
    /// Set the synchronizer configuration.
    #[must_use]
    pub fn sync(mut self, sync: SyncConfig) -> Self {
        self.config.sync = sync;
        self
    }

    /// Set the motion estimator configuration.
    #[must_use]
    pub fn motion(mut self, motion: MotionConfig) -> Self {
        self.config.motion = motion;
        self
    }

    /// Set the depth analysis configuration.
    #[must_use]
    pub fn depth(mut self, depth: DepthConfig) -> Self {
        self.config.depth = depth;
        self
    }

    /// Set the pose smoothing configuration.
    #[must_use]
    pub fn pose(mut self, pose: PoseConfig) -> Self {
        self.config.pose = pose;
        self
    }

    /// Set the arbitration configuration.
    #[must_use]
    pub fn arbitration(mut self, arbitration: ArbitrationConfig) -> Self {
        self.config.arbitration = arbitration;
        self
    }

    /// Set the alert channel capacity.
    #[must_use]
    pub fn alert_channel_capacity(mut self, capacity: usize) -> Self {
        self.config.alert_channel_capacity = capacity.max(1);
        self
    }

    /// Build the configuration.
    #[must_use]
    pub fn build(self) -> MonitorConfig {
        self.config
    }
}

/// Commonly used types, importable in one line.
pub mod prelude {
    pub use crate::arbitration::{ArbitrationConfig, ArbitrationEngine, CycleInput};
    pub use crate::depth::{DepthAnalyzer, DepthConfig, FallEvent};
    pub use crate::domain::{
        Alert, AlertEnvelope, ClassificationSignal, CycleOutcome, Pose, SignalCategory,
        TriggerEvent,
    };
    pub use crate::motion::{MotionConfig, MotionEstimator, MotionState};
    pub use crate::pipeline::{MonitorStats, PatientMonitor};
    pub use crate::pose::{PoseConfig, PoseSmoother};
    pub use crate::sync::{FrameSynchronizer, SyncConfig, SyncedFramePair};
    pub use crate::{FusionError, MonitorConfig, Result};
}
