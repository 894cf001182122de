//! Depth-map reconstruction and depth-verified fall detection.
//!
//! The time-of-flight sensor delivers 16-bit millimeter samples with the
//! sentinel values 0 (too near / no return) and 0xFFFF (too far), which
//! every consumer in this module treats as missing data. On top of the
//! reconstructed map sit two consumers: 3D position estimation for the
//! subject's bounding box, and a fall detector that tracks vertical
//! displacement of that position over a sliding window.

mod fall;
mod reconstructor;

pub use fall::{BedZone, FallDetector, FallEvent};
pub use reconstructor::{DepthReconstructor, DepthStats};

use bedwatch_core::{BoundingBox, DepthFrame, Position3D, Timestamp};

/// Configuration for depth analysis.
#[derive(Debug, Clone)]
pub struct DepthConfig {
    /// Vertical drop that qualifies as a fall, in meters. Default: 0.5.
    pub fall_drop_meters: f64,
    /// Downward velocity that upgrades a drop to high confidence, in
    /// meters per second. Default: 1.5.
    pub fall_velocity_mps: f64,
    /// Sliding window over position history, in milliseconds.
    /// Default: 1000.
    pub fall_window_ms: i64,
    /// Maximum positions retained in the window. Default: 30.
    pub fall_window_samples: usize,
    /// Monitored bed zone.
    pub bed_zone: BedZone,
    /// Horizontal focal-length approximation for the sensor, in pixels.
    /// Default: 500.
    pub focal_fx: f64,
    /// Vertical focal-length approximation for the sensor, in pixels.
    /// Default: 500.
    pub focal_fy: f64,
}

impl Default for DepthConfig {
    fn default() -> Self {
        Self {
            fall_drop_meters: 0.5,
            fall_velocity_mps: 1.5,
            fall_window_ms: 1_000,
            fall_window_samples: 30,
            bed_zone: BedZone::default(),
            focal_fx: 500.0,
            focal_fy: 500.0,
        }
    }
}

impl DepthConfig {
    /// Creates a new builder.
    #[must_use]
    pub fn builder() -> DepthConfigBuilder {
        DepthConfigBuilder::default()
    }
}

/// Builder for [`DepthConfig`].
#[derive(Debug, Default)]
pub struct DepthConfigBuilder {
    config: DepthConfig,
}

impl DepthConfigBuilder {
    /// Set the fall drop threshold in meters.
    #[must_use]
    pub fn fall_drop_meters(mut self, meters: f64) -> Self {
        self.config.fall_drop_meters = meters.max(0.0);
        self
    }

    /// Set the fall velocity threshold in meters per second.
    #[must_use]
    pub fn fall_velocity_mps(mut self, mps: f64) -> Self {
        self.config.fall_velocity_mps = mps.max(0.0);
        self
    }

    /// Set the position history window in milliseconds.
    #[must_use]
    pub fn fall_window_ms(mut self, millis: i64) -> Self {
        self.config.fall_window_ms = millis.max(1);
        self
    }

    /// Set the maximum number of positions retained in the window.
    #[must_use]
    pub fn fall_window_samples(mut self, samples: usize) -> Self {
        self.config.fall_window_samples = samples.max(2);
        self
    }

    /// Set the monitored bed zone.
    #[must_use]
    pub fn bed_zone(mut self, zone: BedZone) -> Self {
        self.config.bed_zone = zone;
        self
    }

    /// Set the focal-length approximations in pixels.
    #[must_use]
    pub fn focal_lengths(mut self, fx: f64, fy: f64) -> Self {
        self.config.focal_fx = fx;
        self.config.focal_fy = fy;
        self
    }

    /// Build the configuration.
    #[must_use]
    pub fn build(self) -> DepthConfig {
        self.config
    }
}

/// Facade over the depth reconstructor and the fall detector.
///
/// Feed it depth frames via [`update_map`](Self::update_map) and the
/// subject's bounding box via [`track_subject`](Self::track_subject);
/// it reports falls and bed-zone status derived from the reconstructed
/// 3D position.
pub struct DepthAnalyzer {
    config: DepthConfig,
    reconstructor: DepthReconstructor,
    fall_detector: FallDetector,
    last_position: Option<Position3D>,
    last_motion_z: Option<f64>,
}

impl DepthAnalyzer {
    /// Creates an analyzer with the given configuration.
    #[must_use]
    pub fn new(config: DepthConfig) -> Self {
        let fall_detector = FallDetector::new(&config);
        let reconstructor = DepthReconstructor::with_focal(config.focal_fx, config.focal_fy);
        Self {
            config,
            reconstructor,
            fall_detector,
            last_position: None,
            last_motion_z: None,
        }
    }

    /// Ingests a depth frame into the reconstructed map.
    ///
    /// A frame whose resolution differs from the current map is logged
    /// and rejected; the map is left unchanged. Returns whether the
    /// frame was accepted.
    pub fn update_map(&mut self, frame: &DepthFrame) -> bool {
        self.reconstructor.update_map(frame)
    }

    /// Estimates the subject's 3D position from the bounding box and
    /// feeds it to the fall detector. Returns the fall verdict for this
    /// sample, or `None` when no position could be recovered.
    pub fn track_subject(
        &mut self,
        bounding_box: &BoundingBox,
        now: Timestamp,
    ) -> Option<FallEvent> {
        let position = self.reconstructor.estimate_position(bounding_box)?;
        self.last_position = Some(position);
        Some(self.fall_detector.observe(position, now))
    }

    /// Depth-axis motion level against the previous call: `|Δz|`
    /// steepened by a factor of 10 and capped at 1.0. The first call
    /// with valid depth reports 0.0; `None` when no position can be
    /// recovered.
    pub fn analyze_motion(&mut self, bounding_box: &BoundingBox) -> Option<f64> {
        let position = self.reconstructor.estimate_position(bounding_box)?;
        let level = self
            .last_motion_z
            .map(|z| ((position.z - z).abs() * 10.0).min(1.0));
        self.last_motion_z = Some(position.z);
        Some(level.unwrap_or(0.0))
    }

    /// Most recent reconstructed subject position.
    #[must_use]
    pub fn last_position(&self) -> Option<Position3D> {
        self.last_position
    }

    /// Whether the most recent position lies inside the bed zone.
    /// `None` until a position has been reconstructed.
    #[must_use]
    pub fn in_bed_zone(&self) -> Option<bool> {
        self.last_position
            .map(|p| self.config.bed_zone.contains(&p))
    }

    /// Distance from the most recent position to the bed zone boundary,
    /// in meters. Positive outside the zone, negative inside.
    #[must_use]
    pub fn bed_zone_excursion(&self) -> Option<f64> {
        self.last_position
            .map(|p| self.config.bed_zone.excursion(&p))
    }

    /// Aggregate statistics over a region of the reconstructed map.
    #[must_use]
    pub fn region_stats(&self, bounding_box: &BoundingBox) -> Option<DepthStats> {
        self.reconstructor.region_stats(bounding_box)
    }

    /// Access to the underlying reconstructor.
    #[must_use]
    pub fn reconstructor(&self) -> &DepthReconstructor {
        &self.reconstructor
    }

    /// Clears the reconstructed map, position history, and fall state.
    pub fn reset(&mut self) {
        self.reconstructor.reset();
        self.fall_detector.reset();
        self.last_position = None;
        self.last_motion_z = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bedwatch_core::DepthFrame;

    fn flat_frame(depth_mm: u16, width: usize, height: usize, millis: i64) -> DepthFrame {
        DepthFrame::from_raw(
            vec![depth_mm; width * height],
            width,
            height,
            Timestamp::from_millis(millis),
        )
        .unwrap()
    }

    #[test]
    fn test_track_subject_requires_map() {
        let mut analyzer = DepthAnalyzer::new(DepthConfig::default());
        let bbox = BoundingBox::new(0.4, 0.4, 0.2, 0.2).unwrap();
        assert!(analyzer.track_subject(&bbox, Timestamp::ZERO).is_none());
        assert!(analyzer.in_bed_zone().is_none());
    }

    #[test]
    fn test_track_subject_reports_position() {
        let mut analyzer = DepthAnalyzer::new(DepthConfig::default());
        analyzer.update_map(&flat_frame(2_000, 64, 48, 0));
        let bbox = BoundingBox::new(0.4, 0.4, 0.2, 0.2).unwrap();
        let event = analyzer.track_subject(&bbox, Timestamp::ZERO);
        assert!(event.is_some());
        let position = analyzer.last_position().unwrap();
        assert!((position.z - 2.0).abs() < 1e-9);
        // centered subject at the bed depth sits inside the default zone
        assert_eq!(analyzer.in_bed_zone(), Some(true));
    }

    #[test]
    fn test_depth_axis_motion() {
        let mut analyzer = DepthAnalyzer::new(DepthConfig::default());
        let bbox = BoundingBox::new(0.4, 0.4, 0.2, 0.2).unwrap();

        analyzer.update_map(&flat_frame(2_000, 64, 48, 0));
        assert_eq!(analyzer.analyze_motion(&bbox), Some(0.0));

        // 5 cm toward the sensor reads as 0.5 on the steepened scale
        analyzer.update_map(&flat_frame(1_950, 64, 48, 33));
        let level = analyzer.analyze_motion(&bbox).unwrap();
        assert!((level - 0.5).abs() < 1e-9);

        // large jumps saturate
        analyzer.update_map(&flat_frame(3_000, 64, 48, 66));
        assert_eq!(analyzer.analyze_motion(&bbox), Some(1.0));
    }

    #[test]
    fn test_reset_clears_position() {
        let mut analyzer = DepthAnalyzer::new(DepthConfig::default());
        analyzer.update_map(&flat_frame(2_000, 64, 48, 0));
        let bbox = BoundingBox::new(0.4, 0.4, 0.2, 0.2).unwrap();
        analyzer.track_subject(&bbox, Timestamp::ZERO);
        analyzer.reset();
        assert!(analyzer.last_position().is_none());
        assert!(analyzer.track_subject(&bbox, Timestamp::ZERO).is_none());
    }
}
