//! Top-level monitoring pipeline.

use bedwatch_core::{Detection, DepthFrame, RgbFrame, Timestamp};
use tokio::sync::broadcast;

use crate::arbitration::{ArbitrationEngine, CycleInput};
use crate::depth::DepthAnalyzer;
use crate::domain::{AlertEnvelope, ClassificationSignal, CycleOutcome};
use crate::motion::MotionEstimator;
use crate::pose::{classify, indicates_fall, PoseSmoother};
use crate::sync::{FrameSynchronizer, SyncStats, SyncedFramePair};
use crate::MonitorConfig;

/// Diagnostic snapshot of a monitoring session.
#[derive(Debug, Clone, Default)]
pub struct MonitorStats {
    /// Evaluation cycles completed.
    pub cycles: u64,
    /// Alerts emitted.
    pub alerts_emitted: u64,
    /// Triggers emitted.
    pub triggers_emitted: u64,
    /// Conditions suppressed by priority or rate limiting.
    pub suppressions: u64,
    /// Frame synchronizer counters.
    pub sync: SyncStats,
}

/// The monitoring engine for one camera stream.
///
/// Owns the full fusion stack: synchronizer, motion estimator, depth
/// analyzer, pose smoother, and arbitration engine. Ingestion
/// (`ingest_rgb` / `ingest_depth`) may be called from the two capture
/// threads through a shared reference to the synchronizer; everything
/// downstream of a synced pair is single-threaded and driven by
/// [`evaluate`](Self::evaluate) on the analysis task.
///
/// Alerts fan out on a broadcast channel; slow subscribers drop old
/// alerts rather than blocking the analysis loop.
pub struct PatientMonitor {
    synchronizer: FrameSynchronizer,
    motion: MotionEstimator,
    depth: DepthAnalyzer,
    smoother: PoseSmoother,
    engine: ArbitrationEngine,
    alert_tx: broadcast::Sender<AlertEnvelope>,
    cycles: u64,
    alerts_emitted: u64,
    triggers_emitted: u64,
    suppressions: u64,
}

impl PatientMonitor {
    /// Creates a monitor from the aggregate configuration.
    #[must_use]
    pub fn new(config: MonitorConfig) -> Self {
        let (alert_tx, _) = broadcast::channel(config.alert_channel_capacity);
        Self {
            synchronizer: FrameSynchronizer::new(config.sync),
            motion: MotionEstimator::new(config.motion),
            depth: DepthAnalyzer::new(config.depth),
            smoother: PoseSmoother::new(config.pose),
            engine: ArbitrationEngine::new(config.arbitration),
            alert_tx,
            cycles: 0,
            alerts_emitted: 0,
            triggers_emitted: 0,
            suppressions: 0,
        }
    }

    /// Subscribes to emitted alerts.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<AlertEnvelope> {
        self.alert_tx.subscribe()
    }

    /// Submits an RGB frame; returns a fused pair when a close-enough
    /// depth frame was waiting.
    pub fn ingest_rgb(&self, frame: RgbFrame) -> Option<SyncedFramePair> {
        self.synchronizer.submit_rgb(frame)
    }

    /// Submits a depth frame; returns a fused pair when a close-enough
    /// RGB frame was waiting.
    pub fn ingest_depth(&self, frame: DepthFrame) -> Option<SyncedFramePair> {
        self.synchronizer.submit_depth(frame)
    }

    /// Runs one evaluation cycle over a fused pair.
    ///
    /// `detections` must already be filtered to the subject-of-interest
    /// class; the highest-confidence one drives pose and depth
    /// tracking. `signals` are this cycle's per-category classifications
    /// from the external classifier.
    pub fn evaluate(
        &mut self,
        pair: &SyncedFramePair,
        detections: &[Detection],
        signals: &[ClassificationSignal],
    ) -> CycleOutcome {
        let now = pair.rgb.timestamp();

        let motion = self.motion.analyze(&pair.rgb);
        self.depth.update_map(&pair.depth);

        let subject = detections
            .iter()
            .max_by(|a, b| a.confidence.value().total_cmp(&b.confidence.value()));

        let (pose, geometry_fall, fall) = match subject {
            Some(detection) => {
                let bbox = detection.bounding_box.clamped();
                let raw = classify(&bbox);
                let pose = self
                    .smoother
                    .observe(raw, detection.confidence.value(), now);
                let fall = self.depth.track_subject(&bbox, now);
                (pose, indicates_fall(&bbox), fall)
            }
            None => (self.smoother.observe_absent(now), false, None),
        };

        let input = CycleInput {
            now,
            pose,
            geometry_fall,
            fall,
            in_bed_zone: self.depth.in_bed_zone(),
            bed_zone_excursion: self.depth.bed_zone_excursion(),
            motion,
            signals,
        };
        let outcome = self.engine.evaluate(&input);

        self.cycles += 1;
        self.suppressions += outcome.suppressed.len() as u64;
        if let Some(envelope) = &outcome.alert {
            self.alerts_emitted += 1;
            // an absent subscriber is not an error
            let _ = self.alert_tx.send(envelope.clone());
        }
        if outcome.trigger.is_some() {
            self.triggers_emitted += 1;
        }

        tracing::debug!(
            cycle = self.cycles,
            pose = %pose.pose,
            motion_level = motion.motion_level,
            alert = outcome.alert.as_ref().map(|e| e.alert.kind()).unwrap_or("none"),
            trigger = outcome.trigger.as_ref().map_or("none", |t| t.kind()),
            "evaluation cycle complete"
        );
        outcome
    }

    /// Seconds of stillness as of `now`, from the motion estimator.
    #[must_use]
    pub fn seconds_since_motion(&self, now: Timestamp) -> f64 {
        self.motion.seconds_since_motion(now)
    }

    /// Diagnostic counters for this session.
    #[must_use]
    pub fn stats(&self) -> MonitorStats {
        MonitorStats {
            cycles: self.cycles,
            alerts_emitted: self.alerts_emitted,
            triggers_emitted: self.triggers_emitted,
            suppressions: self.suppressions,
            sync: self.synchronizer.stats(),
        }
    }

    /// Atomically abandons all temporal context, e.g. when monitoring
    /// restarts for a new subject. Subscribers stay connected.
    pub fn reset(&mut self) {
        self.synchronizer.reset();
        self.motion.reset();
        self.depth.reset();
        self.smoother.reset();
        self.engine.reset();
        self.cycles = 0;
        self.alerts_emitted = 0;
        self.triggers_emitted = 0;
        self.suppressions = 0;
        tracing::info!("monitor state reset");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MonitorConfig;
    use bedwatch_core::{BoundingBox, Confidence};

    fn rgb(value: u8, millis: i64) -> RgbFrame {
        RgbFrame::new(vec![value; 32 * 24 * 4], 32, 24, Timestamp::from_millis(millis)).unwrap()
    }

    fn depth(depth_mm: u16, millis: i64) -> DepthFrame {
        DepthFrame::from_raw(vec![depth_mm; 32 * 24], 32, 24, Timestamp::from_millis(millis))
            .unwrap()
    }

    fn person(bbox: BoundingBox, confidence: f64) -> Detection {
        Detection::new(bbox, 0, Confidence::clamped(confidence), "person")
    }

    #[test]
    fn test_rgb_then_depth_fuses() {
        let monitor = PatientMonitor::new(MonitorConfig::default());
        assert!(monitor.ingest_rgb(rgb(0, 0)).is_none());
        let pair = monitor.ingest_depth(depth(2_000, 5)).unwrap();
        // delta is rgb minus depth, so the later depth frame reads negative
        assert_eq!(pair.time_delta_nanos, -5_000_000);
    }

    #[test]
    fn test_evaluate_counts_cycles() {
        let mut monitor = PatientMonitor::new(MonitorConfig::default());
        monitor.ingest_rgb(rgb(0, 0));
        let pair = monitor.ingest_depth(depth(2_000, 2)).unwrap();
        let bbox = BoundingBox::new(0.4, 0.3, 0.2, 0.5).unwrap();
        monitor.evaluate(&pair, &[person(bbox, 0.9)], &[]);
        let stats = monitor.stats();
        assert_eq!(stats.cycles, 1);
        assert_eq!(stats.sync.pairs_emitted, 1);
    }

    #[test]
    fn test_fall_alert_reaches_subscriber() {
        let mut monitor = PatientMonitor::new(MonitorConfig::default());
        let mut alerts = monitor.subscribe();

        // wide box at the bottom of the frame: geometric fall signature
        let fallen = BoundingBox::new(0.1, 0.75, 0.7, 0.2).unwrap();
        monitor.ingest_rgb(rgb(0, 0));
        let pair = monitor.ingest_depth(depth(2_000, 2)).unwrap();
        let outcome = monitor.evaluate(&pair, &[person(fallen, 0.9)], &[]);
        assert!(outcome.alert.is_some());

        let envelope = alerts.try_recv().unwrap();
        assert_eq!(envelope.alert.kind(), "fall_detected");
        assert_eq!(monitor.stats().alerts_emitted, 1);
    }

    #[test]
    fn test_reset_clears_counters_and_buffers() {
        let mut monitor = PatientMonitor::new(MonitorConfig::default());
        monitor.ingest_rgb(rgb(0, 0));
        let pair = monitor.ingest_depth(depth(2_000, 2)).unwrap();
        monitor.evaluate(&pair, &[], &[]);

        monitor.reset();
        let stats = monitor.stats();
        assert_eq!(stats.cycles, 0);
        assert_eq!(stats.sync.pairs_emitted, 0);
    }
}
