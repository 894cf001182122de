//! Frame-differencing motion estimator.

use std::collections::VecDeque;

use bedwatch_core::{utils, RgbFrame, Timestamp, RGBA_BYTES_PER_PIXEL};

use super::MotionConfig;

/// Motion measurement for a single frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MotionState {
    /// Smoothed motion level in `[0.0, 1.0]`.
    pub motion_level: f64,
    /// Whether the smoothed level is at or below the stillness threshold.
    pub is_still: bool,
    /// How long the subject has been still, in milliseconds. Zero while
    /// moving.
    pub stillness_duration_ms: i64,
    /// Timestamp of the most recent frame whose smoothed level exceeded
    /// the stillness threshold.
    pub last_motion_at: Timestamp,
}

/// Estimates motion from consecutive RGB frames by subsampled luma
/// differencing.
///
/// The first frame after construction or [`reset`](Self::reset), and any
/// frame whose resolution differs from its predecessor, only primes the
/// comparison baseline and reports zero motion.
pub struct MotionEstimator {
    config: MotionConfig,
    previous: Option<PriorFrame>,
    history: VecDeque<f64>,
    motion_level: f64,
    last_motion_at: Timestamp,
    still_since: Timestamp,
    frames_analyzed: u64,
}

struct PriorFrame {
    pixels: Vec<u8>,
    width: usize,
    height: usize,
}

impl MotionEstimator {
    /// Creates an estimator with the given configuration.
    #[must_use]
    pub fn new(config: MotionConfig) -> Self {
        let capacity = config.history_frames;
        Self {
            config,
            previous: None,
            history: VecDeque::with_capacity(capacity),
            motion_level: 0.0,
            last_motion_at: Timestamp::ZERO,
            still_since: Timestamp::ZERO,
            frames_analyzed: 0,
        }
    }

    /// Analyzes one frame against its predecessor and updates the
    /// smoothed motion level.
    pub fn analyze(&mut self, frame: &RgbFrame) -> MotionState {
        let now = frame.timestamp();
        self.frames_analyzed += 1;

        let resolution_changed = self
            .previous
            .as_ref()
            .is_some_and(|p| p.width != frame.width() || p.height != frame.height());
        if resolution_changed {
            tracing::debug!(
                width = frame.width(),
                height = frame.height(),
                "frame resolution changed, re-priming motion baseline"
            );
            self.history.clear();
            self.motion_level = 0.0;
            self.previous = None;
        }

        let Some(previous) = self.previous.take() else {
            self.previous = Some(PriorFrame {
                pixels: frame.pixels().to_vec(),
                width: frame.width(),
                height: frame.height(),
            });
            self.last_motion_at = now;
            self.still_since = now;
            return self.state(now);
        };

        let raw = self.frame_difference(&previous, frame);
        self.previous = Some(PriorFrame {
            pixels: frame.pixels().to_vec(),
            width: frame.width(),
            height: frame.height(),
        });

        if self.history.len() == self.config.history_frames {
            self.history.pop_front();
        }
        self.history.push_back(raw);
        self.motion_level = self.history.iter().sum::<f64>() / self.history.len() as f64;

        if self.motion_level > self.config.stillness_threshold {
            self.last_motion_at = now;
            self.still_since = now;
        }

        self.state(now)
    }

    /// Seconds elapsed since the last frame with motion, as of `now`.
    #[must_use]
    pub fn seconds_since_motion(&self, now: Timestamp) -> f64 {
        now.delta_nanos(self.last_motion_at).max(0) as f64 / 1_000_000_000.0
    }

    /// Whether the subject has been still for at least `threshold_secs`.
    #[must_use]
    pub fn should_alert_stillness(&self, now: Timestamp, threshold_secs: u64) -> bool {
        self.frames_analyzed > 0 && self.seconds_since_motion(now) >= threshold_secs as f64
    }

    /// Current smoothed motion level.
    #[must_use]
    pub fn motion_level(&self) -> f64 {
        self.motion_level
    }

    /// Number of frames analyzed since construction or reset.
    #[must_use]
    pub fn frames_analyzed(&self) -> u64 {
        self.frames_analyzed
    }

    /// Clears all state, including the comparison baseline and the
    /// stillness timer.
    pub fn reset(&mut self) {
        self.previous = None;
        self.history.clear();
        self.motion_level = 0.0;
        self.last_motion_at = Timestamp::ZERO;
        self.still_since = Timestamp::ZERO;
        self.frames_analyzed = 0;
    }

    fn state(&self, now: Timestamp) -> MotionState {
        let is_still = self.motion_level <= self.config.stillness_threshold;
        let stillness_duration_ms = if is_still {
            now.delta_nanos(self.still_since).max(0) / 1_000_000
        } else {
            0
        };
        MotionState {
            motion_level: self.motion_level,
            is_still,
            stillness_duration_ms,
            last_motion_at: self.last_motion_at,
        }
    }

    /// Mean absolute luma difference over a subsampled pixel grid,
    /// normalized to `[0.0, 1.0]` and steepened so small physical motion
    /// registers clearly.
    fn frame_difference(&self, previous: &PriorFrame, frame: &RgbFrame) -> f64 {
        let width = frame.width();
        let height = frame.height();
        let step = self.config.sample_step;
        let prev = previous.pixels.as_slice();
        let curr = frame.pixels();

        let mut total = 0.0;
        let mut samples = 0u64;
        for y in (0..height).step_by(step) {
            for x in (0..width).step_by(step) {
                let idx = (y * width + x) * RGBA_BYTES_PER_PIXEL;
                let luma_prev = utils::luma(prev[idx], prev[idx + 1], prev[idx + 2]);
                let luma_curr = utils::luma(curr[idx], curr[idx + 1], curr[idx + 2]);
                total += (luma_curr - luma_prev).abs() / 255.0;
                samples += 1;
            }
        }

        if samples == 0 {
            return 0.0;
        }
        let average = total / samples as f64;
        (average * 5.0).min(1.0)
    }
}
