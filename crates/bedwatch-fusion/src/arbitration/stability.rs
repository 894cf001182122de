//! Debounce state machine for noisy per-frame classifications.

/// A promoted change of stable value.
///
/// `from` is `None` when this is the first value ever promoted (the
/// state had no baseline yet).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition<T> {
    /// The previous stable value, if any
    pub from: Option<T>,
    /// The newly promoted stable value
    pub to: T,
}

/// Per-category debouncer: a raw value becomes the stable value only
/// after it has been observed for a configured number of consecutive
/// cycles.
///
/// State machine: `NoBaseline → Stable(v1) → Stable(v2) → …`, with no
/// terminal state. A differing observation restarts the candidate count
/// at 1; it never partially credits the previous candidate.
#[derive(Debug, Clone)]
pub struct StableState<T> {
    threshold: usize,
    stable: Option<T>,
    candidate: Option<T>,
    consecutive: usize,
}

impl<T: Clone + PartialEq> StableState<T> {
    /// Creates a state requiring `threshold` consecutive observations,
    /// floored at 1.
    #[must_use]
    pub fn new(threshold: usize) -> Self {
        Self {
            threshold: threshold.max(1),
            stable: None,
            candidate: None,
            consecutive: 0,
        }
    }

    /// Feeds one raw observation. Returns the transition when this
    /// observation promotes a new stable value.
    pub fn observe(&mut self, value: T) -> Option<Transition<T>> {
        match &self.candidate {
            Some(candidate) if *candidate == value => self.consecutive += 1,
            _ => {
                self.candidate = Some(value.clone());
                self.consecutive = 1;
            }
        }

        if self.consecutive < self.threshold || self.stable.as_ref() == Some(&value) {
            return None;
        }
        let from = self.stable.replace(value.clone());
        Some(Transition { from, to: value })
    }

    /// Promotes `value` immediately, skipping the consecutive-count
    /// requirement. Returns the transition unless `value` already was
    /// the stable value.
    pub fn force(&mut self, value: T) -> Option<Transition<T>> {
        self.candidate = Some(value.clone());
        self.consecutive = self.threshold;
        if self.stable.as_ref() == Some(&value) {
            return None;
        }
        let from = self.stable.replace(value.clone());
        Some(Transition { from, to: value })
    }

    /// The current stable value; `None` before the first promotion.
    #[must_use]
    pub fn stable(&self) -> Option<&T> {
        self.stable.as_ref()
    }

    /// Whether no value has been promoted yet.
    #[must_use]
    pub fn is_baseline(&self) -> bool {
        self.stable.is_none()
    }

    /// Returns to `NoBaseline`, discarding the candidate and count.
    pub fn reset(&mut self) {
        self.stable = None;
        self.candidate = None;
        self.consecutive = 0;
    }
}
