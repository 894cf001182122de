//! Domain types for the fusion engine.
//!
//! Pure data: poses, classification signals, alerts, triggers, and the
//! per-cycle outcome. No temporal state lives here.

pub mod alert;
pub mod signal;

pub use alert::{Alert, AlertEnvelope, AlertId, CycleOutcome, Suppression, TriggerEvent};
pub use signal::{ClassificationSignal, Pose, SignalCategory};
