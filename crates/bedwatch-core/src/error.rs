//! Error types for the bedwatch system.
//!
//! This module provides error handling using [`thiserror`] for automatic
//! `Display` and `Error` trait implementations.
//!
//! # Error Hierarchy
//!
//! - [`CoreError`]: Top-level error type for core operations
//! - [`FrameError`]: Input-shape errors from frame and bounding-box data
//!
//! Nothing here is fatal to a monitoring session: every error corresponds
//! to a single rejected input, after which the pipeline continues with its
//! prior state.
//!
//! # Example
//!
//! ```rust
//! use bedwatch_core::error::{CoreError, FrameError};
//!
//! fn ingest_depth() -> Result<(), CoreError> {
//!     Err(FrameError::DimensionMismatch {
//!         expected_width: 320,
//!         expected_height: 240,
//!         actual_width: 640,
//!         actual_height: 480,
//!     }
//!     .into())
//! }
//! ```

use thiserror::Error;

/// A specialized `Result` type for core operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// Top-level error type for core operations.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum CoreError {
    /// Input-shape error from frame or bounding-box data
    #[error("Frame error: {0}")]
    Frame(#[from] FrameError),

    /// Configuration error
    #[error("Configuration error: {message}")]
    Configuration {
        /// Description of the configuration error
        message: String,
    },

    /// Validation error for input data
    #[error("Validation error: {message}")]
    Validation {
        /// Description of what validation failed
        message: String,
    },
}

impl CoreError {
    /// Creates a new configuration error.
    #[must_use]
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Creates a new validation error.
    #[must_use]
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }
}

/// Input-shape errors for frames and bounding boxes.
///
/// The offending input is rejected and prior state is retained; these
/// never abort the pipeline.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum FrameError {
    /// A depth update did not match the established map dimensions
    #[error(
        "depth frame size mismatch: expected {expected_width}x{expected_height}, \
         got {actual_width}x{actual_height}"
    )]
    DimensionMismatch {
        /// Expected frame width in pixels
        expected_width: usize,
        /// Expected frame height in pixels
        expected_height: usize,
        /// Width of the rejected frame
        actual_width: usize,
        /// Height of the rejected frame
        actual_height: usize,
    },

    /// A pixel or sample buffer had the wrong length for its dimensions
    #[error("buffer length {actual} does not match {width}x{height} frame (expected {expected})")]
    BufferSize {
        /// Frame width in pixels
        width: usize,
        /// Frame height in pixels
        height: usize,
        /// Expected buffer length
        expected: usize,
        /// Actual buffer length
        actual: usize,
    },

    /// A bounding box failed validation
    #[error("malformed bounding box: {message}")]
    MalformedBoundingBox {
        /// Description of the malformation
        message: String,
    },

    /// A frame had zero width or height
    #[error("empty frame: {width}x{height}")]
    EmptyFrame {
        /// Frame width in pixels
        width: usize,
        /// Frame height in pixels
        height: usize,
    },
}

impl FrameError {
    /// Creates a malformed-bounding-box error.
    #[must_use]
    pub fn malformed_bbox(message: impl Into<String>) -> Self {
        Self::MalformedBoundingBox {
            message: message.into(),
        }
    }
}
