//! # Bedwatch Core
//!
//! Core types, traits, and utilities for the bedwatch patient monitoring
//! engine.
//!
//! This crate provides the foundational building blocks shared across the
//! bedwatch ecosystem, including:
//!
//! - **Core Data Types**: [`RgbFrame`], [`DepthFrame`], [`BoundingBox`],
//!   [`Detection`], and [`Position3D`] for representing camera frames,
//!   detector output, and reconstructed 3D positions.
//!
//! - **Error Types**: Comprehensive error handling via the [`error`] module.
//!   Input-shape problems (wrong depth dimensions, malformed boxes) are
//!   reported and recoverable; nothing in this crate panics on bad input.
//!
//! - **Traits**: Seams to external collaborators — [`ObjectDetector`] for
//!   the per-frame neural detector, [`SceneCaptioner`] for the
//!   vision-language captioner, and [`MonotonicClock`] so temporal logic can
//!   be tested without real wall-clock delays.
//!
//! - **Utilities**: Luminance conversion and small statistics helpers used
//!   across the codebase.
//!
//! ## Feature Flags
//!
//! - `serde`: Enable serialization/deserialization via serde
//!
//! ## Example
//!
//! ```rust
//! use bedwatch_core::{BoundingBox, Confidence, Detection};
//!
//! let bbox = BoundingBox::new(0.2, 0.3, 0.25, 0.5).unwrap();
//! let det = Detection::new(bbox, 0, Confidence::clamped(0.92), "person");
//!
//! assert!(det.bounding_box.aspect_ratio() < 1.0);
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod error;
pub mod traits;
pub mod types;
pub mod utils;

// Re-export commonly used types at the crate root
pub use error::{CoreError, CoreResult, FrameError};
pub use traits::{ManualClock, MonotonicClock, ObjectDetector, SceneCaptioner, SystemClock};
pub use types::{
    // Frame types
    DepthFrame, RgbFrame,
    // Geometry types
    BoundingBox, Position3D,
    // Detector types
    Detection,
    // Common types
    Confidence, FrameId, Timestamp,
};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Sentinel raw depth value for "too near / no return" (DEPTH16)
pub const DEPTH_INVALID_NEAR: u16 = 0;

/// Sentinel raw depth value for "saturated / no return" (DEPTH16)
pub const DEPTH_INVALID_FAR: u16 = 0xFFFF;

/// Bytes per pixel in an RGBA8 frame
pub const RGBA_BYTES_PER_PIXEL: usize = 4;

/// Prelude module for convenient imports.
///
/// ```rust
/// use bedwatch_core::prelude::*;
/// ```
pub mod prelude {
    pub use crate::error::{CoreError, CoreResult, FrameError};
    pub use crate::traits::{ManualClock, MonotonicClock, ObjectDetector, SystemClock};
    pub use crate::types::{
        BoundingBox, Confidence, DepthFrame, Detection, FrameId, Position3D, RgbFrame, Timestamp,
    };
}
