//! Poses and per-frame classification signals.

use bedwatch_core::Confidence;
use serde::{Deserialize, Serialize};

/// Coarse body pose derived from bounding-box geometry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Pose {
    /// No confident classification
    #[default]
    Unknown,
    /// Horizontal, in bed or on a couch
    Lying,
    /// Upright torso, lower body supported
    Sitting,
    /// Fully upright
    Standing,
    /// Horizontal near the floor
    Fallen,
}

impl std::fmt::Display for Pose {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Pose::Unknown => "unknown",
            Pose::Lying => "lying",
            Pose::Sitting => "sitting",
            Pose::Standing => "standing",
            Pose::Fallen => "fallen",
        };
        write!(f, "{label}")
    }
}

/// Monitored signal categories for debounced escalation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SignalCategory {
    /// Body position / posture
    Position,
    /// Awake, drowsy, asleep, unresponsive
    Alertness,
    /// Activity / movement level
    Activity,
    /// Safety-relevant observations (highest urgency)
    Safety,
    /// Comfort and distress indicators
    Comfort,
}

impl SignalCategory {
    /// All monitored categories, in escalation-priority order.
    pub const ALL: [SignalCategory; 5] = [
        SignalCategory::Safety,
        SignalCategory::Position,
        SignalCategory::Alertness,
        SignalCategory::Activity,
        SignalCategory::Comfort,
    ];

    /// Stable lowercase name for logging.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            SignalCategory::Position => "position",
            SignalCategory::Alertness => "alertness",
            SignalCategory::Activity => "activity",
            SignalCategory::Safety => "safety",
            SignalCategory::Comfort => "comfort",
        }
    }
}

impl std::fmt::Display for SignalCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A generic per-frame discrete classification with confidence.
///
/// Produced by the external zero-shot classifier (or, for
/// [`SignalCategory::Position`], derived from the pose classifier) and
/// consumed by the arbitration engine's stability tracking.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationSignal {
    /// Which monitored category this observation belongs to
    pub category: SignalCategory,
    /// Discrete state label, e.g. `"lying_on_side"` or `"on floor"`
    pub label: String,
    /// Classifier confidence
    pub confidence: Confidence,
}

impl ClassificationSignal {
    /// Creates a classification signal.
    #[must_use]
    pub fn new(
        category: SignalCategory,
        label: impl Into<String>,
        confidence: Confidence,
    ) -> Self {
        Self {
            category,
            label: label.into(),
            confidence,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pose_display() {
        assert_eq!(Pose::Fallen.to_string(), "fallen");
        assert_eq!(Pose::default(), Pose::Unknown);
    }

    #[test]
    fn test_category_order_starts_with_safety() {
        assert_eq!(SignalCategory::ALL[0], SignalCategory::Safety);
        assert_eq!(SignalCategory::ALL.len(), 5);
    }

    #[test]
    fn test_signal_construction() {
        let signal = ClassificationSignal::new(
            SignalCategory::Position,
            "lying_on_back",
            Confidence::clamped(0.8),
        );
        assert_eq!(signal.category.as_str(), "position");
        assert_eq!(signal.label, "lying_on_back");
    }
}
