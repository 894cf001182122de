//! Vertical-displacement fall detection over a sliding position window.

use std::collections::VecDeque;

use bedwatch_core::{Position3D, Timestamp};

use super::DepthConfig;

/// Verdict for one observed position sample.
///
/// `vertical_drop_meters` follows sensor convention: Y increases
/// downward, so a positive drop means the subject moved toward the
/// floor.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FallEvent {
    /// Whether both the drop and velocity thresholds were exceeded
    pub fall_detected: bool,
    /// Detector confidence in the verdict
    pub confidence: f64,
    /// Drop from the window's highest point to the current position
    pub vertical_drop_meters: f64,
    /// Downward velocity between the oldest and newest retained samples
    pub velocity_mps: f64,
    /// The position observed this sample
    pub position: Position3D,
}

impl FallEvent {
    fn quiet(position: Position3D) -> Self {
        Self {
            fall_detected: false,
            confidence: 0.0,
            vertical_drop_meters: 0.0,
            velocity_mps: 0.0,
            position,
        }
    }
}

/// Spherical zone around the configured bed center.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BedZone {
    /// Bed center in sensor space
    pub center: Position3D,
    /// Zone radius in meters
    pub radius_meters: f64,
}

impl Default for BedZone {
    fn default() -> Self {
        Self {
            center: Position3D::new(0.0, 0.0, 2.0),
            radius_meters: 1.5,
        }
    }
}

impl BedZone {
    /// Creates a zone around `center` with the given radius in meters.
    #[must_use]
    pub fn new(center: Position3D, radius_meters: f64) -> Self {
        Self {
            center,
            radius_meters: radius_meters.max(0.0),
        }
    }

    /// Whether `position` lies inside the zone (boundary inclusive).
    #[must_use]
    pub fn contains(&self, position: &Position3D) -> bool {
        self.center.distance_to(position) <= self.radius_meters
    }

    /// Signed distance from `position` to the zone boundary, in meters.
    /// Positive outside the zone, negative inside.
    #[must_use]
    pub fn excursion(&self, position: &Position3D) -> f64 {
        self.center.distance_to(position) - self.radius_meters
    }
}

/// Detects falls from the vertical trajectory of the subject's
/// reconstructed position.
///
/// Keeps a time-and-count-bounded history of observed positions. A fall
/// requires both a large drop within the window and a matching downward
/// velocity; a slow drop (sitting down, settling into bed) reports low
/// confidence without declaring a fall.
pub struct FallDetector {
    drop_threshold_meters: f64,
    velocity_threshold_mps: f64,
    window_nanos: i64,
    max_samples: usize,
    history: VecDeque<(Timestamp, Position3D)>,
}

impl FallDetector {
    /// High confidence assigned when both drop and velocity thresholds
    /// are exceeded.
    pub const FALL_CONFIDENCE: f64 = 0.9;
    /// Low confidence assigned to a drop without matching velocity.
    pub const SLOW_DROP_CONFIDENCE: f64 = 0.3;

    /// Creates a detector from the depth configuration.
    #[must_use]
    pub fn new(config: &DepthConfig) -> Self {
        Self {
            drop_threshold_meters: config.fall_drop_meters,
            velocity_threshold_mps: config.fall_velocity_mps,
            window_nanos: config.fall_window_ms * 1_000_000,
            max_samples: config.fall_window_samples,
            history: VecDeque::with_capacity(config.fall_window_samples),
        }
    }

    /// Appends a position sample and evaluates the window.
    pub fn observe(&mut self, position: Position3D, now: Timestamp) -> FallEvent {
        self.history.push_back((now, position));
        let horizon = now.as_nanos() - self.window_nanos;
        while let Some((timestamp, _)) = self.history.front() {
            if timestamp.as_nanos() >= horizon && self.history.len() <= self.max_samples {
                break;
            }
            self.history.pop_front();
        }

        if self.history.len() < 2 {
            return FallEvent::quiet(position);
        }

        let min_y = self
            .history
            .iter()
            .map(|(_, p)| p.y)
            .fold(f64::INFINITY, f64::min);
        let vertical_drop = position.y - min_y;

        let (first_time, first) = self.history.front().copied().unwrap_or((now, position));
        let (last_time, last) = self.history.back().copied().unwrap_or((now, position));
        let elapsed_secs = last_time.delta_nanos(first_time) as f64 / 1_000_000_000.0;
        let velocity = if elapsed_secs > 0.0 {
            (last.y - first.y) / elapsed_secs
        } else {
            0.0
        };

        let (fall_detected, confidence) = if vertical_drop > self.drop_threshold_meters
            && velocity > self.velocity_threshold_mps
        {
            (true, Self::FALL_CONFIDENCE)
        } else if vertical_drop > self.drop_threshold_meters {
            (false, Self::SLOW_DROP_CONFIDENCE)
        } else {
            (false, 0.0)
        };

        if fall_detected {
            tracing::warn!(
                drop_meters = vertical_drop,
                velocity_mps = velocity,
                "fall signature detected in depth trajectory"
            );
        }

        FallEvent {
            fall_detected,
            confidence,
            vertical_drop_meters: vertical_drop,
            velocity_mps: velocity,
            position,
        }
    }

    /// Number of position samples currently retained.
    #[must_use]
    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    /// Clears the position history.
    pub fn reset(&mut self) {
        self.history.clear();
    }
}
