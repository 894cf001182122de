//! Alert and trigger types emitted by the arbitration engine.
//!
//! An [`Alert`] is an immediate, user-facing condition (fast path, evaluated
//! every frame). A [`TriggerEvent`] schedules the much more expensive
//! vision-language analysis (slow path, debounced and rate-limited). Both
//! carry a priority rank where **lower numbers are more urgent**, and at
//! most one of each is emitted per evaluation cycle.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::signal::Pose;

/// Unique identifier for an emitted alert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AlertId(Uuid);

impl AlertId {
    /// Creates a new random alert ID.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Returns the inner UUID.
    #[must_use]
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for AlertId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for AlertId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Real-time alert conditions, highest priority first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Alert {
    /// Fall confirmed by depth drop + velocity analysis
    DepthVerifiedFall {
        /// Vertical drop over the detection window, meters
        drop_meters: f64,
        /// Detector confidence in the fall
        confidence: f64,
    },
    /// Fall inferred from bounding-box geometry (pose = Fallen)
    FallDetected,
    /// Subject was inside the bed zone and has left it
    LeavingBedZone {
        /// Distance beyond the bed-zone boundary, meters
        distance_meters: f64,
    },
    /// No motion for longer than the configured threshold
    Stillness {
        /// Elapsed stillness, seconds
        duration_seconds: u64,
    },
    /// Smoothed pose changed between two known poses
    PoseChange {
        /// Previous stable pose
        from: Pose,
        /// New stable pose
        to: Pose,
    },
}

impl Alert {
    /// Priority rank; lower is more urgent.
    #[must_use]
    pub fn priority(&self) -> u8 {
        match self {
            Alert::DepthVerifiedFall { .. } => 1,
            Alert::FallDetected => 2,
            Alert::LeavingBedZone { .. } => 3,
            Alert::Stillness { .. } => 4,
            Alert::PoseChange { .. } => 5,
        }
    }

    /// Stable kind label for logging and diagnostics.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Alert::DepthVerifiedFall { .. } => "depth_verified_fall",
            Alert::FallDetected => "fall_detected",
            Alert::LeavingBedZone { .. } => "leaving_bed_zone",
            Alert::Stillness { .. } => "stillness",
            Alert::PoseChange { .. } => "pose_change",
        }
    }

    /// Human-readable one-line summary.
    #[must_use]
    pub fn summary(&self) -> String {
        match self {
            Alert::DepthVerifiedFall {
                drop_meters,
                confidence,
            } => format!(
                "fall verified by depth: {drop_meters:.2}m drop (confidence {confidence:.2})"
            ),
            Alert::FallDetected => "fall detected from body geometry".to_string(),
            Alert::LeavingBedZone { distance_meters } => {
                format!("subject leaving bed zone, {distance_meters:.2}m past the boundary")
            }
            Alert::Stillness { duration_seconds } => {
                format!("no motion for {duration_seconds}s")
            }
            Alert::PoseChange { from, to } => format!("pose changed: {from} -> {to}"),
        }
    }
}

/// An [`Alert`] stamped with identity and wall-clock emission time.
///
/// The wall-clock timestamp is metadata for charting; all internal timing
/// stays on the monotonic clock.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertEnvelope {
    /// Unique alert identifier
    pub id: AlertId,
    /// Wall-clock emission time
    pub created_at: DateTime<Utc>,
    /// The alert condition
    pub alert: Alert,
}

impl AlertEnvelope {
    /// Wraps an alert with a fresh ID and the current wall-clock time.
    #[must_use]
    pub fn new(alert: Alert) -> Self {
        Self {
            id: AlertId::new(),
            created_at: Utc::now(),
            alert,
        }
    }
}

/// Escalation triggers for the expensive vision-language analysis.
///
/// Each variant carries a human-diagnostic reason string explaining what
/// made the transition escalation-worthy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TriggerEvent {
    /// High-confidence safety concern (may bypass stability debouncing)
    Safety {
        /// Why the trigger fired
        reason: String,
    },
    /// Significant stable body-position transition
    PositionChange {
        /// Why the trigger fired
        reason: String,
    },
    /// Stable alertness-state transition
    AlertnessChange {
        /// Why the trigger fired
        reason: String,
    },
    /// Stable activity-level transition
    ActivityChange {
        /// Why the trigger fired
        reason: String,
    },
    /// Stable comfort/distress transition
    ComfortConcern {
        /// Why the trigger fired
        reason: String,
    },
    /// Nothing significant happened for the maximum fallback interval
    PeriodicFallback {
        /// Why the trigger fired
        reason: String,
    },
}

impl TriggerEvent {
    /// Priority rank; lower is more urgent.
    #[must_use]
    pub fn priority(&self) -> u8 {
        match self {
            TriggerEvent::Safety { .. } => 1,
            TriggerEvent::PositionChange { .. } => 2,
            TriggerEvent::AlertnessChange { .. } => 3,
            TriggerEvent::ActivityChange { .. } => 4,
            TriggerEvent::ComfortConcern { .. } => 5,
            TriggerEvent::PeriodicFallback { .. } => 6,
        }
    }

    /// Stable kind label for logging and diagnostics.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            TriggerEvent::Safety { .. } => "safety",
            TriggerEvent::PositionChange { .. } => "position_change",
            TriggerEvent::AlertnessChange { .. } => "alertness_change",
            TriggerEvent::ActivityChange { .. } => "activity_change",
            TriggerEvent::ComfortConcern { .. } => "comfort_concern",
            TriggerEvent::PeriodicFallback { .. } => "periodic_fallback",
        }
    }

    /// The diagnostic reason string.
    #[must_use]
    pub fn reason(&self) -> &str {
        match self {
            TriggerEvent::Safety { reason }
            | TriggerEvent::PositionChange { reason }
            | TriggerEvent::AlertnessChange { reason }
            | TriggerEvent::ActivityChange { reason }
            | TriggerEvent::ComfortConcern { reason }
            | TriggerEvent::PeriodicFallback { reason } => reason,
        }
    }
}

/// A true condition that was intentionally not emitted this cycle.
///
/// Suppression is policy, not failure: diagnostics must be able to
/// distinguish "nothing was true" from "something was true but lost".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Suppression {
    /// Alert condition lost to a higher-priority alert
    AlertPriorityLoss {
        /// The suppressed alert
        alert: Alert,
    },
    /// Trigger condition lost to a higher-priority trigger
    TriggerPriorityLoss {
        /// The suppressed trigger
        trigger: TriggerEvent,
    },
    /// Trigger arrived before the minimum re-trigger interval elapsed
    TriggerRateLimited {
        /// The suppressed trigger
        trigger: TriggerEvent,
        /// Milliseconds until the rate limiter re-opens
        retry_in_ms: i64,
    },
}

/// Result of one arbitration cycle.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CycleOutcome {
    /// The single highest-priority alert, if any condition was true
    pub alert: Option<AlertEnvelope>,
    /// The single selected trigger, if any passed debouncing and rate limits
    pub trigger: Option<TriggerEvent>,
    /// Conditions that were true but suppressed by policy
    pub suppressed: Vec<Suppression>,
}

impl CycleOutcome {
    /// True when nothing was emitted and nothing was suppressed.
    #[must_use]
    pub fn is_quiet(&self) -> bool {
        self.alert.is_none() && self.trigger.is_none() && self.suppressed.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_alert_priority_ordering() {
        let verified = Alert::DepthVerifiedFall {
            drop_meters: 0.6,
            confidence: 0.9,
        };
        let stillness = Alert::Stillness {
            duration_seconds: 120,
        };
        assert!(verified.priority() < Alert::FallDetected.priority());
        assert!(Alert::FallDetected.priority() < stillness.priority());
        assert_eq!(
            Alert::PoseChange {
                from: Pose::Lying,
                to: Pose::Sitting
            }
            .priority(),
            5
        );
    }

    #[test]
    fn test_trigger_priority_ordering() {
        let safety = TriggerEvent::Safety {
            reason: "bed rail down".into(),
        };
        let fallback = TriggerEvent::PeriodicFallback {
            reason: "routine check".into(),
        };
        assert!(safety.priority() < fallback.priority());
        assert_eq!(safety.reason(), "bed rail down");
    }

    #[test]
    fn test_envelope_carries_unique_ids() {
        let a = AlertEnvelope::new(Alert::FallDetected);
        let b = AlertEnvelope::new(Alert::FallDetected);
        assert_ne!(a.id, b.id);
        assert_eq!(a.alert, b.alert);
    }

    #[test]
    fn test_outcome_quiet() {
        assert!(CycleOutcome::default().is_quiet());

        let outcome = CycleOutcome {
            suppressed: vec![Suppression::AlertPriorityLoss {
                alert: Alert::FallDetected,
            }],
            ..Default::default()
        };
        assert!(!outcome.is_quiet());
    }

    #[test]
    fn test_alert_serializes() {
        let envelope = AlertEnvelope::new(Alert::LeavingBedZone {
            distance_meters: 2.1,
        });
        let json = serde_json::to_string(&envelope).unwrap();
        assert!(json.contains("LeavingBedZone"));
    }
}
