//! Timestamp-based pairing of RGB and depth frames.

use bedwatch_core::{DepthFrame, RgbFrame};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::{SyncConfig, SyncQuality};

/// A matched RGB + depth frame pair.
///
/// Produced once per successful match and consumed immediately downstream;
/// the synchronizer never retains a reference to it.
#[derive(Debug, Clone)]
pub struct SyncedFramePair {
    /// The RGB frame
    pub rgb: RgbFrame,
    /// The depth frame
    pub depth: DepthFrame,
    /// Signed `rgb_timestamp - depth_timestamp` in nanoseconds; its
    /// magnitude never exceeds the configured tolerance
    pub time_delta_nanos: i64,
    /// Quality grade derived from the delta
    pub quality: SyncQuality,
}

/// Counters exposed as a diagnostic snapshot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncStats {
    /// Total RGB frames submitted
    pub rgb_submitted: u64,
    /// Total depth frames submitted
    pub depth_submitted: u64,
    /// Pairs emitted
    pub pairs_emitted: u64,
    /// Frames evicted unmatched (staleness or buffer overflow)
    pub frames_dropped: u64,
    /// Current RGB buffer occupancy
    pub rgb_buffered: usize,
    /// Current depth buffer occupancy
    pub depth_buffered: usize,
}

impl SyncStats {
    /// Fraction of submitted frames that found a partner, per stream pair.
    #[must_use]
    pub fn sync_rate(&self) -> f64 {
        let submitted = self.rgb_submitted.min(self.depth_submitted);
        if submitted == 0 {
            return 0.0;
        }
        self.pairs_emitted as f64 / submitted as f64
    }
}

/// Buffers shared by the two producer threads.
#[derive(Debug, Default)]
struct SyncBuffers {
    rgb: BTreeMap<i64, RgbFrame>,
    depth: BTreeMap<i64, DepthFrame>,
    stats: SyncStats,
}

impl SyncBuffers {
    /// Nearest buffered timestamp to `target` in `keys`-ordered map.
    /// Earlier entry wins a tie so eviction pressure stays on old frames.
    fn nearest_key<V>(map: &BTreeMap<i64, V>, target: i64) -> Option<i64> {
        let below = map.range(..=target).next_back().map(|(k, _)| *k);
        let above = map.range(target..).next().map(|(k, _)| *k);
        match (below, above) {
            (Some(b), Some(a)) => {
                if (target - b) <= (a - target) {
                    Some(b)
                } else {
                    Some(a)
                }
            }
            (Some(b), None) => Some(b),
            (None, Some(a)) => Some(a),
            (None, None) => None,
        }
    }

    /// Drops entries older than `horizon` and enforces the count bound.
    fn evict(&mut self, horizon: i64, max_buffer_size: usize) {
        let mut dropped = 0u64;

        let keep = self.rgb.split_off(&horizon);
        dropped += self.rgb.len() as u64;
        self.rgb = keep;

        let keep = self.depth.split_off(&horizon);
        dropped += self.depth.len() as u64;
        self.depth = keep;

        while self.rgb.len() > max_buffer_size {
            self.rgb.pop_first();
            dropped += 1;
        }
        while self.depth.len() > max_buffer_size {
            self.depth.pop_first();
            dropped += 1;
        }

        if dropped > 0 {
            self.stats.frames_dropped += dropped;
            tracing::debug!(dropped, horizon_nanos = horizon, "evicted stale frames");
        }
    }
}

/// Pairs independently timestamped RGB and depth frames.
///
/// `submit_rgb` and `submit_depth` may be called concurrently from two
/// producer threads; the shared buffers are guarded by a single mutex and
/// every operation inside it is bounded, so producers never block for long
/// and are shed by eviction rather than back-pressure.
///
/// No frame is ever matched twice: a frame either leaves immediately as
/// half of an emitted pair, or waits in its buffer until matched or
/// evicted.
pub struct FrameSynchronizer {
    config: SyncConfig,
    buffers: Mutex<SyncBuffers>,
}

impl FrameSynchronizer {
    /// Creates a synchronizer.
    #[must_use]
    pub fn new(config: SyncConfig) -> Self {
        Self {
            config,
            buffers: Mutex::new(SyncBuffers::default()),
        }
    }

    /// Creates a synchronizer with default configuration.
    #[must_use]
    pub fn default_config() -> Self {
        Self::new(SyncConfig::default())
    }

    /// Submits an RGB frame; returns a pair if a depth counterpart within
    /// tolerance was already buffered.
    pub fn submit_rgb(&self, frame: RgbFrame) -> Option<SyncedFramePair> {
        let tolerance = self.config.tolerance_nanos();
        let t = frame.timestamp().as_nanos();
        let mut buffers = self.buffers.lock();
        buffers.stats.rgb_submitted += 1;

        // Remove-then-emit keeps matching at-most-once.
        let matched = SyncBuffers::nearest_key(&buffers.depth, t)
            .filter(|key| (t - key).abs() <= tolerance)
            .and_then(|key| buffers.depth.remove(&key).map(|depth| (key, depth)));

        let result = if let Some((key, depth)) = matched {
            buffers.stats.pairs_emitted += 1;
            let time_delta_nanos = t - key;
            Some(SyncedFramePair {
                rgb: frame,
                depth,
                time_delta_nanos,
                quality: SyncQuality::from_delta_nanos(time_delta_nanos),
            })
        } else {
            if buffers.rgb.insert(t, frame).is_some() {
                // Same-timestamp resubmission replaces the old frame.
                buffers.stats.frames_dropped += 1;
            }
            None
        };

        self.finish_submission(&mut buffers, t);
        result
    }

    /// Submits a depth frame; returns a pair if an RGB counterpart within
    /// tolerance was already buffered.
    pub fn submit_depth(&self, frame: DepthFrame) -> Option<SyncedFramePair> {
        let tolerance = self.config.tolerance_nanos();
        let t = frame.timestamp().as_nanos();
        let mut buffers = self.buffers.lock();
        buffers.stats.depth_submitted += 1;

        let matched = SyncBuffers::nearest_key(&buffers.rgb, t)
            .filter(|key| (t - key).abs() <= tolerance)
            .and_then(|key| buffers.rgb.remove(&key).map(|rgb| (key, rgb)));

        let result = if let Some((key, rgb)) = matched {
            buffers.stats.pairs_emitted += 1;
            let time_delta_nanos = key - t;
            Some(SyncedFramePair {
                rgb,
                depth: frame,
                time_delta_nanos,
                quality: SyncQuality::from_delta_nanos(time_delta_nanos),
            })
        } else {
            if buffers.depth.insert(t, frame).is_some() {
                buffers.stats.frames_dropped += 1;
            }
            None
        };

        self.finish_submission(&mut buffers, t);
        result
    }

    /// Eviction + occupancy bookkeeping after every submission.
    fn finish_submission(&self, buffers: &mut SyncBuffers, now_nanos: i64) {
        let horizon = now_nanos
            - self
                .config
                .tolerance_nanos()
                .saturating_mul(self.config.max_buffer_size as i64);
        buffers.evict(horizon, self.config.max_buffer_size);
        buffers.stats.rgb_buffered = buffers.rgb.len();
        buffers.stats.depth_buffered = buffers.depth.len();
    }

    /// Diagnostic snapshot of the counters.
    #[must_use]
    pub fn stats(&self) -> SyncStats {
        self.buffers.lock().stats
    }

    /// Drops both buffers and zeroes the counters, as for a new session.
    pub fn reset(&self) {
        let mut buffers = self.buffers.lock();
        buffers.rgb.clear();
        buffers.depth.clear();
        buffers.stats = SyncStats::default();
    }
}
