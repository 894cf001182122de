//! Geometric pose classification and temporal smoothing.
//!
//! Classification is purely geometric over the subject's bounding box;
//! no learned model is involved. The raw per-frame verdict is noisy, so
//! a majority-vote smoother sits between the classifier and anything
//! that reacts to pose.

mod classifier;
mod smoother;

pub use classifier::{classify, indicates_fall};
pub use smoother::{PoseSmoother, SmoothedPose};

/// Configuration for the pose smoother.
#[derive(Debug, Clone)]
pub struct PoseConfig {
    /// Number of recent votes considered. Default: 10.
    pub vote_window: usize,
    /// Votes required to promote a candidate pose. Default: 5.
    pub promote_votes: usize,
    /// Reduced vote requirement for high-confidence candidates.
    /// Default: 3.
    pub confident_votes: usize,
    /// Mean confidence above which the reduced requirement applies.
    /// Default: 0.7.
    pub confident_threshold: f64,
    /// Per-cycle confidence decay applied when the subject is not
    /// detected. Default: 0.95.
    pub decay: f64,
}

impl Default for PoseConfig {
    fn default() -> Self {
        Self {
            vote_window: 10,
            promote_votes: 5,
            confident_votes: 3,
            confident_threshold: 0.7,
            decay: 0.95,
        }
    }
}

impl PoseConfig {
    /// Creates a new builder.
    #[must_use]
    pub fn builder() -> PoseConfigBuilder {
        PoseConfigBuilder::default()
    }
}

/// Builder for [`PoseConfig`].
#[derive(Debug, Default)]
pub struct PoseConfigBuilder {
    config: PoseConfig,
}

impl PoseConfigBuilder {
    /// Set the vote window length.
    #[must_use]
    pub fn vote_window(mut self, window: usize) -> Self {
        self.config.vote_window = window.max(1);
        self
    }

    /// Set the full vote requirement.
    #[must_use]
    pub fn promote_votes(mut self, votes: usize) -> Self {
        self.config.promote_votes = votes.max(1);
        self
    }

    /// Set the reduced high-confidence vote requirement.
    #[must_use]
    pub fn confident_votes(mut self, votes: usize) -> Self {
        self.config.confident_votes = votes.max(1);
        self
    }

    /// Set the confidence threshold for the reduced requirement.
    #[must_use]
    pub fn confident_threshold(mut self, threshold: f64) -> Self {
        self.config.confident_threshold = threshold.clamp(0.0, 1.0);
        self
    }

    /// Set the no-detection confidence decay factor.
    #[must_use]
    pub fn decay(mut self, decay: f64) -> Self {
        self.config.decay = decay.clamp(0.0, 1.0);
        self
    }

    /// Build the configuration.
    #[must_use]
    pub fn build(self) -> PoseConfig {
        self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_floors_and_clamps() {
        let config = PoseConfig::builder()
            .vote_window(0)
            .promote_votes(0)
            .confident_votes(0)
            .confident_threshold(2.0)
            .decay(1.5)
            .build();
        assert_eq!(config.vote_window, 1);
        assert_eq!(config.promote_votes, 1);
        assert_eq!(config.confident_votes, 1);
        assert_eq!(config.confident_threshold, 1.0);
        assert_eq!(config.decay, 1.0);
    }
}
