//! Majority-vote pose smoothing.

use std::collections::VecDeque;

use bedwatch_core::Timestamp;

use crate::domain::Pose;

use super::PoseConfig;

/// Smoothed pose state for one evaluation cycle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SmoothedPose {
    /// The pose currently held stable.
    pub pose: Pose,
    /// Confidence in the held pose.
    pub confidence: f64,
    /// The pose held before the current one.
    pub previous: Pose,
    /// How long the current pose has been held, in milliseconds.
    pub held_for_ms: i64,
}

/// Debounces raw per-frame pose verdicts with a vote window.
///
/// A candidate pose replaces the held pose once it dominates the
/// window: either it collects the full vote quota, or a smaller quota
/// at high mean confidence. Cycles without a detection decay the held
/// confidence instead of casting a vote, so a briefly occluded subject
/// does not flip the pose.
pub struct PoseSmoother {
    config: PoseConfig,
    votes: VecDeque<(Pose, f64)>,
    pose: Pose,
    confidence: f64,
    previous: Pose,
    held_since: Timestamp,
}

impl PoseSmoother {
    /// Creates a smoother with the given configuration.
    #[must_use]
    pub fn new(config: PoseConfig) -> Self {
        let capacity = config.vote_window;
        Self {
            config,
            votes: VecDeque::with_capacity(capacity),
            pose: Pose::Unknown,
            confidence: 0.0,
            previous: Pose::Unknown,
            held_since: Timestamp::ZERO,
        }
    }

    /// Casts one raw classification vote and re-evaluates the window.
    pub fn observe(&mut self, raw: Pose, confidence: f64, now: Timestamp) -> SmoothedPose {
        if self.votes.len() == self.config.vote_window {
            self.votes.pop_front();
        }
        self.votes.push_back((raw, confidence.clamp(0.0, 1.0)));

        if let Some((candidate, votes, mean_confidence)) = self.leading_candidate() {
            let promoted = votes >= self.config.promote_votes
                || (votes >= self.config.confident_votes
                    && mean_confidence > self.config.confident_threshold);
            if promoted && candidate != self.pose {
                tracing::debug!(
                    from = %self.pose,
                    to = %candidate,
                    votes,
                    "pose promoted by vote majority"
                );
                self.previous = self.pose;
                self.pose = candidate;
                self.held_since = now;
            }
            if promoted {
                self.confidence = mean_confidence;
            }
        }

        self.state(now)
    }

    /// Registers a cycle without any subject detection: the held
    /// confidence decays and no vote is cast.
    pub fn observe_absent(&mut self, now: Timestamp) -> SmoothedPose {
        self.confidence *= self.config.decay;
        self.state(now)
    }

    /// The pose currently held stable.
    #[must_use]
    pub fn pose(&self) -> Pose {
        self.pose
    }

    /// The pose held before the current one.
    #[must_use]
    pub fn previous(&self) -> Pose {
        self.previous
    }

    /// Confidence in the held pose.
    #[must_use]
    pub fn confidence(&self) -> f64 {
        self.confidence
    }

    /// Clears votes and held state back to [`Pose::Unknown`].
    pub fn reset(&mut self) {
        self.votes.clear();
        self.pose = Pose::Unknown;
        self.confidence = 0.0;
        self.previous = Pose::Unknown;
        self.held_since = Timestamp::ZERO;
    }

    fn state(&self, now: Timestamp) -> SmoothedPose {
        SmoothedPose {
            pose: self.pose,
            confidence: self.confidence,
            previous: self.previous,
            held_for_ms: now.delta_nanos(self.held_since).max(0) / 1_000_000,
        }
    }

    /// Most frequent non-Unknown pose in the window with its vote count
    /// and mean confidence.
    fn leading_candidate(&self) -> Option<(Pose, usize, f64)> {
        let mut best: Option<(Pose, usize, f64)> = None;
        for candidate in [Pose::Lying, Pose::Sitting, Pose::Standing, Pose::Fallen] {
            let mut votes = 0usize;
            let mut confidence_sum = 0.0;
            for (pose, confidence) in &self.votes {
                if *pose == candidate {
                    votes += 1;
                    confidence_sum += confidence;
                }
            }
            if votes == 0 {
                continue;
            }
            let mean_confidence = confidence_sum / votes as f64;
            if best.map_or(true, |(_, best_votes, _)| votes > best_votes) {
                best = Some((candidate, votes, mean_confidence));
            }
        }
        best
    }
}
