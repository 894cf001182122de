//! The per-cycle arbitration engine.

use std::collections::HashMap;

use bedwatch_core::Timestamp;

use crate::depth::FallEvent;
use crate::domain::{
    Alert, AlertEnvelope, ClassificationSignal, CycleOutcome, Pose, SignalCategory, Suppression,
    TriggerEvent,
};
use crate::motion::MotionState;
use crate::pose::SmoothedPose;

use super::{ArbitrationConfig, StableState, Transition};

/// One evaluation cycle's fused observations.
#[derive(Debug, Clone)]
pub struct CycleInput<'a> {
    /// Monotonic time of this cycle.
    pub now: Timestamp,
    /// Smoothed pose state.
    pub pose: SmoothedPose,
    /// Raw bounding-box fall screen for this frame, independent of the
    /// smoothed pose.
    pub geometry_fall: bool,
    /// Depth-trajectory fall verdict, when depth was available.
    pub fall: Option<FallEvent>,
    /// Whether the subject is inside the bed zone, when known.
    pub in_bed_zone: Option<bool>,
    /// Signed distance to the bed-zone boundary (positive outside),
    /// when known.
    pub bed_zone_excursion: Option<f64>,
    /// Motion state for this cycle.
    pub motion: MotionState,
    /// Per-category classification signals for this cycle.
    pub signals: &'a [ClassificationSignal],
}

/// Arbitrates one fused observation cycle into at most one alert and at
/// most one trigger.
///
/// All timing uses the monotonic clock carried in [`CycleInput::now`];
/// the engine never reads a clock of its own, which keeps every
/// debounce and rate-limit decision reproducible in tests.
pub struct ArbitrationEngine {
    config: ArbitrationConfig,
    stable: HashMap<SignalCategory, StableState<String>>,
    was_in_bed_zone: Option<bool>,
    stillness_raised: bool,
    last_pose: Pose,
    last_trigger_at: Option<Timestamp>,
    started_at: Option<Timestamp>,
}

impl ArbitrationEngine {
    /// Creates an engine with the given configuration.
    #[must_use]
    pub fn new(config: ArbitrationConfig) -> Self {
        Self {
            config,
            stable: HashMap::new(),
            was_in_bed_zone: None,
            stillness_raised: false,
            last_pose: Pose::Unknown,
            last_trigger_at: None,
            started_at: None,
        }
    }

    /// Runs one arbitration cycle.
    pub fn evaluate(&mut self, input: &CycleInput<'_>) -> CycleOutcome {
        if self.started_at.is_none() {
            self.started_at = Some(input.now);
        }

        let mut outcome = CycleOutcome::default();
        self.evaluate_alerts(input, &mut outcome);
        self.evaluate_triggers(input, &mut outcome);
        outcome
    }

    /// Fast path: collect every true alert condition, emit the highest
    /// priority, record the rest as suppressed.
    fn evaluate_alerts(&mut self, input: &CycleInput<'_>, outcome: &mut CycleOutcome) {
        let mut conditions: Vec<Alert> = Vec::new();

        if let Some(fall) = &input.fall {
            if fall.fall_detected && fall.confidence > self.config.depth_fall_confidence {
                conditions.push(Alert::DepthVerifiedFall {
                    drop_meters: fall.vertical_drop_meters,
                    confidence: fall.confidence,
                });
            }
        }

        if input.pose.pose == Pose::Fallen || input.geometry_fall {
            conditions.push(Alert::FallDetected);
        }

        if let (Some(inside), Some(excursion)) = (input.in_bed_zone, input.bed_zone_excursion) {
            if self.was_in_bed_zone == Some(true)
                && !inside
                && excursion > self.config.bed_exit_distance_meters
            {
                conditions.push(Alert::LeavingBedZone {
                    distance_meters: excursion,
                });
            }
            self.was_in_bed_zone = Some(inside);
        }

        if input.motion.is_still {
            let still_secs = (input.motion.stillness_duration_ms / 1_000).max(0) as u64;
            if still_secs >= self.config.stillness_alert_secs && !self.stillness_raised {
                self.stillness_raised = true;
                conditions.push(Alert::Stillness {
                    duration_seconds: still_secs,
                });
            }
        } else {
            // re-arm once motion resumes
            self.stillness_raised = false;
        }

        if input.pose.pose != self.last_pose && self.last_pose != Pose::Unknown {
            conditions.push(Alert::PoseChange {
                from: self.last_pose,
                to: input.pose.pose,
            });
        }
        self.last_pose = input.pose.pose;

        conditions.sort_by_key(Alert::priority);
        let mut conditions = conditions.into_iter();
        if let Some(winner) = conditions.next() {
            tracing::info!(kind = winner.kind(), summary = %winner.summary(), "alert raised");
            outcome.alert = Some(AlertEnvelope::new(winner));
            outcome
                .suppressed
                .extend(conditions.map(|alert| Suppression::AlertPriorityLoss { alert }));
        }
    }

    /// Slow path: debounce per-category signals, filter for
    /// significance, pick the most urgent trigger, and gate it by the
    /// re-trigger interval.
    fn evaluate_triggers(&mut self, input: &CycleInput<'_>, outcome: &mut CycleOutcome) {
        let mut candidates: Vec<TriggerEvent> = Vec::new();

        for signal in input.signals {
            let state = self
                .stable
                .entry(signal.category)
                .or_insert_with(|| StableState::new(self.config.stability_threshold));

            let bypass = signal.category == SignalCategory::Safety
                && signal.confidence.value() > self.config.safety_bypass_confidence;
            let transition = if bypass {
                state.force(signal.label.clone())
            } else {
                state.observe(signal.label.clone())
            };

            let Some(transition) = transition else {
                continue;
            };
            if !Self::is_significant(signal.category, &transition) {
                tracing::debug!(
                    category = %signal.category,
                    from = transition.from.as_deref().unwrap_or("none"),
                    to = %transition.to,
                    "stable transition below significance filter"
                );
                continue;
            }
            candidates.push(Self::make_trigger(signal.category, &transition, bypass));
        }

        candidates.sort_by_key(TriggerEvent::priority);
        let mut candidates = candidates.into_iter();
        let mut selected = candidates.next();
        outcome
            .suppressed
            .extend(candidates.map(|trigger| Suppression::TriggerPriorityLoss { trigger }));

        if selected.is_none() {
            selected = self.periodic_fallback(input.now);
        }

        let Some(trigger) = selected else {
            return;
        };

        if let Some(last) = self.last_trigger_at {
            let elapsed = input.now.delta_nanos(last);
            let min_interval = self.config.min_trigger_interval.as_nanos() as i64;
            if elapsed < min_interval {
                let retry_in_ms = (min_interval - elapsed) / 1_000_000;
                tracing::debug!(
                    kind = trigger.kind(),
                    retry_in_ms,
                    "trigger rate-limited"
                );
                outcome.suppressed.push(Suppression::TriggerRateLimited {
                    trigger,
                    retry_in_ms,
                });
                return;
            }
        }

        tracing::info!(kind = trigger.kind(), reason = trigger.reason(), "trigger emitted");
        self.last_trigger_at = Some(input.now);
        outcome.trigger = Some(trigger);
    }

    fn periodic_fallback(&self, now: Timestamp) -> Option<TriggerEvent> {
        let last = self.last_trigger_at.or(self.started_at)?;
        let elapsed = now.delta_nanos(last);
        let interval = self.config.fallback_interval.as_nanos() as i64;
        if elapsed < interval {
            return None;
        }
        Some(TriggerEvent::PeriodicFallback {
            reason: format!(
                "no significant change for {}s, routine re-check",
                elapsed / 1_000_000_000
            ),
        })
    }

    fn is_significant(category: SignalCategory, transition: &Transition<String>) -> bool {
        match category {
            SignalCategory::Position => {
                let Some(from) = transition.from.as_deref() else {
                    // first stable observation establishes the baseline
                    return true;
                };
                let to = transition.to.as_str();
                if from.contains("floor") || to.contains("floor") {
                    return true;
                }
                // shifts between lying variants are routine repositioning
                !(from.contains("lying") && to.contains("lying"))
            }
            _ => true,
        }
    }

    fn make_trigger(
        category: SignalCategory,
        transition: &Transition<String>,
        bypassed: bool,
    ) -> TriggerEvent {
        let reason = if bypassed {
            format!("high-confidence safety signal: {}", transition.to)
        } else {
            format!(
                "{} stabilized: {} -> {}",
                category,
                transition.from.as_deref().unwrap_or("unknown"),
                transition.to
            )
        };
        match category {
            SignalCategory::Safety => TriggerEvent::Safety { reason },
            SignalCategory::Position => TriggerEvent::PositionChange { reason },
            SignalCategory::Alertness => TriggerEvent::AlertnessChange { reason },
            SignalCategory::Activity => TriggerEvent::ActivityChange { reason },
            SignalCategory::Comfort => TriggerEvent::ComfortConcern { reason },
        }
    }

    /// The current stable value for a category, if one has been
    /// promoted.
    #[must_use]
    pub fn stable_value(&self, category: SignalCategory) -> Option<&str> {
        self.stable
            .get(&category)
            .and_then(|state| state.stable().map(String::as_str))
    }

    /// Clears all temporal state back to a fresh monitoring session.
    pub fn reset(&mut self) {
        self.stable.clear();
        self.was_in_bed_zone = None;
        self.stillness_raised = false;
        self.last_pose = Pose::Unknown;
        self.last_trigger_at = None;
        self.started_at = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bedwatch_core::{Confidence, Position3D};

    fn engine() -> ArbitrationEngine {
        ArbitrationEngine::new(ArbitrationConfig::default())
    }

    fn smoothed(pose: Pose) -> SmoothedPose {
        SmoothedPose {
            pose,
            confidence: 0.8,
            previous: Pose::Unknown,
            held_for_ms: 0,
        }
    }

    fn moving_motion(now: Timestamp) -> MotionState {
        MotionState {
            motion_level: 0.4,
            is_still: false,
            stillness_duration_ms: 0,
            last_motion_at: now,
        }
    }

    fn still_motion(duration_ms: i64, last_motion: Timestamp) -> MotionState {
        MotionState {
            motion_level: 0.0,
            is_still: true,
            stillness_duration_ms: duration_ms,
            last_motion_at: last_motion,
        }
    }

    fn quiet_input(now: Timestamp) -> CycleInput<'static> {
        CycleInput {
            now,
            pose: smoothed(Pose::Unknown),
            geometry_fall: false,
            fall: None,
            in_bed_zone: None,
            bed_zone_excursion: None,
            motion: moving_motion(now),
            signals: &[],
        }
    }

    fn fall_event(confidence: f64) -> FallEvent {
        FallEvent {
            fall_detected: confidence > 0.5,
            confidence,
            vertical_drop_meters: 0.7,
            velocity_mps: 2.3,
            position: Position3D::new(0.0, 0.7, 2.0),
        }
    }

    fn secs(s: i64) -> Timestamp {
        Timestamp::from_millis(s * 1_000)
    }

    #[test]
    fn test_quiet_cycle() {
        let mut engine = engine();
        let outcome = engine.evaluate(&quiet_input(secs(0)));
        assert!(outcome.is_quiet());
    }

    #[test]
    fn test_depth_fall_outranks_pose_fall() {
        let mut engine = engine();
        let mut input = quiet_input(secs(0));
        input.pose = smoothed(Pose::Fallen);
        input.fall = Some(fall_event(0.9));
        let outcome = engine.evaluate(&input);

        let alert = outcome.alert.unwrap().alert;
        assert!(matches!(alert, Alert::DepthVerifiedFall { .. }));
        assert_eq!(
            outcome.suppressed,
            vec![Suppression::AlertPriorityLoss {
                alert: Alert::FallDetected
            }]
        );
    }

    #[test]
    fn test_geometry_fall_raises_plain_fall() {
        let mut engine = engine();
        let mut input = quiet_input(secs(0));
        input.geometry_fall = true;
        let alert = engine.evaluate(&input).alert.unwrap().alert;
        assert_eq!(alert, Alert::FallDetected);
    }

    #[test]
    fn test_low_confidence_depth_fall_does_not_alert() {
        let mut engine = engine();
        let mut input = quiet_input(secs(0));
        input.fall = Some(fall_event(0.3));
        let outcome = engine.evaluate(&input);
        assert!(outcome.alert.is_none());
    }

    #[test]
    fn test_leaving_bed_zone_requires_prior_presence() {
        let mut engine = engine();

        // first sighting is already outside: no alert, just a baseline
        let mut input = quiet_input(secs(0));
        input.in_bed_zone = Some(false);
        input.bed_zone_excursion = Some(0.8);
        assert!(engine.evaluate(&input).alert.is_none());

        // re-enters the zone
        let mut input = quiet_input(secs(1));
        input.in_bed_zone = Some(true);
        input.bed_zone_excursion = Some(-0.4);
        assert!(engine.evaluate(&input).alert.is_none());

        // leaves it decisively
        let mut input = quiet_input(secs(2));
        input.in_bed_zone = Some(false);
        input.bed_zone_excursion = Some(0.7);
        let alert = engine.evaluate(&input).alert.unwrap().alert;
        assert!(matches!(
            alert,
            Alert::LeavingBedZone { distance_meters } if (distance_meters - 0.7).abs() < 1e-9
        ));
    }

    #[test]
    fn test_small_excursion_does_not_alert() {
        let mut engine = engine();
        let mut input = quiet_input(secs(0));
        input.in_bed_zone = Some(true);
        input.bed_zone_excursion = Some(-0.4);
        engine.evaluate(&input);

        let mut input = quiet_input(secs(1));
        input.in_bed_zone = Some(false);
        input.bed_zone_excursion = Some(0.2);
        assert!(engine.evaluate(&input).alert.is_none());
    }

    #[test]
    fn test_stillness_is_edge_triggered() {
        let mut engine = engine();

        let mut input = quiet_input(secs(400));
        input.motion = still_motion(320_000, secs(80));
        let outcome = engine.evaluate(&input);
        assert!(matches!(
            outcome.alert.as_ref().unwrap().alert,
            Alert::Stillness {
                duration_seconds: 320
            }
        ));

        // still the next cycle: no second alert
        let mut input = quiet_input(secs(401));
        input.motion = still_motion(321_000, secs(80));
        assert!(engine.evaluate(&input).alert.is_none());

        // motion resumes, then a new long stillness re-alerts
        engine.evaluate(&quiet_input(secs(402)));
        let mut input = quiet_input(secs(800));
        input.motion = still_motion(310_000, secs(490));
        assert!(engine.evaluate(&input).alert.is_some());
    }

    #[test]
    fn test_pose_change_needs_known_baseline() {
        let mut engine = engine();

        let mut input = quiet_input(secs(0));
        input.pose = smoothed(Pose::Lying);
        // Unknown -> Lying is not a pose-change alert
        assert!(engine.evaluate(&input).alert.is_none());

        let mut input = quiet_input(secs(1));
        input.pose = smoothed(Pose::Sitting);
        let alert = engine.evaluate(&input).alert.unwrap().alert;
        assert_eq!(
            alert,
            Alert::PoseChange {
                from: Pose::Lying,
                to: Pose::Sitting
            }
        );
    }

    fn position_signal(label: &str, confidence: f64) -> ClassificationSignal {
        ClassificationSignal::new(
            SignalCategory::Position,
            label,
            Confidence::clamped(confidence),
        )
    }

    #[test]
    fn test_trigger_requires_stability() {
        let mut engine = engine();
        let signals = vec![position_signal("standing", 0.8)];

        for cycle in 0..2 {
            let mut input = quiet_input(secs(cycle));
            input.signals = &signals;
            assert!(engine.evaluate(&input).trigger.is_none());
        }

        let mut input = quiet_input(secs(2));
        input.signals = &signals;
        let trigger = engine.evaluate(&input).trigger.unwrap();
        assert!(matches!(trigger, TriggerEvent::PositionChange { .. }));
        assert_eq!(engine.stable_value(SignalCategory::Position), Some("standing"));
    }

    #[test]
    fn test_lying_variants_not_significant() {
        let mut engine = engine();

        let back = vec![position_signal("lying_on_back", 0.8)];
        for cycle in 0..3 {
            let mut input = quiet_input(secs(cycle));
            input.signals = &back;
            engine.evaluate(&input);
        }

        // stable shift to another lying variant: debounced but filtered
        let side = vec![position_signal("lying_on_side", 0.8)];
        for cycle in 100..103 {
            let mut input = quiet_input(secs(cycle));
            input.signals = &side;
            let outcome = engine.evaluate(&input);
            assert!(outcome.trigger.is_none());
        }
        assert_eq!(
            engine.stable_value(SignalCategory::Position),
            Some("lying_on_side")
        );
    }

    #[test]
    fn test_floor_transition_always_significant() {
        let mut engine = engine();

        let lying = vec![position_signal("lying_on_back", 0.8)];
        for cycle in 0..3 {
            let mut input = quiet_input(secs(cycle));
            input.signals = &lying;
            engine.evaluate(&input);
        }

        let floor = vec![position_signal("lying on floor", 0.8)];
        let mut trigger = None;
        for cycle in 100..103 {
            let mut input = quiet_input(secs(cycle));
            input.signals = &floor;
            trigger = engine.evaluate(&input).trigger.or(trigger);
        }
        assert!(matches!(trigger, Some(TriggerEvent::PositionChange { .. })));
    }

    #[test]
    fn test_safety_bypasses_stability() {
        let mut engine = engine();
        let signals = vec![ClassificationSignal::new(
            SignalCategory::Safety,
            "bed rail down",
            Confidence::clamped(0.95),
        )];
        let mut input = quiet_input(secs(0));
        input.signals = &signals;
        let trigger = engine.evaluate(&input).trigger.unwrap();
        assert!(matches!(trigger, TriggerEvent::Safety { .. }));
    }

    #[test]
    fn test_moderate_safety_confidence_still_debounced() {
        let mut engine = engine();
        let signals = vec![ClassificationSignal::new(
            SignalCategory::Safety,
            "iv line strained",
            Confidence::clamped(0.6),
        )];
        let mut input = quiet_input(secs(0));
        input.signals = &signals;
        assert!(engine.evaluate(&input).trigger.is_none());
    }

    #[test]
    fn test_safety_emits_immediately_position_follows() {
        let mut engine = engine();
        let signals = vec![
            position_signal("standing", 0.8),
            ClassificationSignal::new(
                SignalCategory::Safety,
                "climbing over rail",
                Confidence::clamped(0.95),
            ),
        ];
        let mut outcome = CycleOutcome::default();
        for cycle in 0..3 {
            let mut input = quiet_input(secs(cycle * 100));
            input.signals = &signals;
            outcome = engine.evaluate(&input);
        }
        // cycle 3: position stabilizes, but safety was already emitted
        // on cycle 1 and repeats are not transitions; position wins now
        assert!(matches!(
            outcome.trigger,
            Some(TriggerEvent::PositionChange { .. })
        ));
    }

    #[test]
    fn test_rate_limit_suppresses_early_trigger() {
        let mut engine = engine();

        let standing = vec![position_signal("standing", 0.8)];
        for cycle in 0..3 {
            let mut input = quiet_input(secs(cycle));
            input.signals = &standing;
            engine.evaluate(&input);
        }

        // a new stable value 10 s later: inside the 60 s window
        let sitting = vec![position_signal("sitting", 0.8)];
        let mut outcome = CycleOutcome::default();
        for cycle in 10..13 {
            let mut input = quiet_input(secs(cycle));
            input.signals = &sitting;
            outcome = engine.evaluate(&input);
        }
        assert!(outcome.trigger.is_none());
        assert!(matches!(
            outcome.suppressed.as_slice(),
            [Suppression::TriggerRateLimited { retry_in_ms, .. }] if *retry_in_ms > 0
        ));
    }

    #[test]
    fn test_periodic_fallback_after_quiet_interval() {
        let mut engine = engine();
        assert!(engine.evaluate(&quiet_input(secs(0))).trigger.is_none());
        assert!(engine.evaluate(&quiet_input(secs(200))).trigger.is_none());
        let trigger = engine.evaluate(&quiet_input(secs(301))).trigger.unwrap();
        assert!(matches!(trigger, TriggerEvent::PeriodicFallback { .. }));
        // the fallback resets the quiet timer
        assert!(engine.evaluate(&quiet_input(secs(302))).trigger.is_none());
    }

    #[test]
    fn test_reset_clears_baselines() {
        let mut engine = engine();

        let mut input = quiet_input(secs(0));
        input.pose = smoothed(Pose::Lying);
        input.in_bed_zone = Some(true);
        input.bed_zone_excursion = Some(-0.4);
        engine.evaluate(&input);

        engine.reset();

        // after reset, a pose differing from the old baseline is not a
        // change, and being outside the zone is not an exit
        let mut input = quiet_input(secs(1));
        input.pose = smoothed(Pose::Standing);
        input.in_bed_zone = Some(false);
        input.bed_zone_excursion = Some(0.9);
        assert!(engine.evaluate(&input).alert.is_none());
    }
}
