//! Core data types for the bedwatch system.
//!
//! This module defines the fundamental data structures used throughout the
//! bedwatch ecosystem for representing camera frames, detector output, and
//! reconstructed 3D positions.
//!
//! # Type Categories
//!
//! - **Frame Types**: [`RgbFrame`], [`DepthFrame`]
//! - **Geometry Types**: [`BoundingBox`], [`Position3D`]
//! - **Detector Types**: [`Detection`]
//! - **Common Types**: [`Confidence`], [`Timestamp`], [`FrameId`]
//!
//! # Coordinate Conventions
//!
//! Bounding boxes are normalized to `[0, 1]` in both axes with the origin at
//! the top-left of the frame. 3D positions are camera-relative meters:
//! x right+, y down+, z forward+ (so a *larger* y means *lower* in space).

use ndarray::Array2;
use std::time::Duration;
use uuid::Uuid;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult, FrameError};
use crate::{DEPTH_INVALID_FAR, DEPTH_INVALID_NEAR, RGBA_BYTES_PER_PIXEL};

// =============================================================================
// Common Types
// =============================================================================

/// Monotonic timestamp with nanosecond resolution.
///
/// Measured from an arbitrary per-process epoch (see
/// [`SystemClock`](crate::traits::SystemClock)), never from the wall clock,
/// so buffer eviction and rate limiting are immune to clock adjustments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Timestamp(i64);

impl Timestamp {
    /// The process epoch.
    pub const ZERO: Self = Self(0);

    /// Creates a timestamp from nanoseconds since the process epoch.
    #[must_use]
    pub fn from_nanos(nanos: i64) -> Self {
        Self(nanos)
    }

    /// Creates a timestamp from milliseconds since the process epoch.
    #[must_use]
    pub fn from_millis(millis: i64) -> Self {
        Self(millis.saturating_mul(1_000_000))
    }

    /// Returns nanoseconds since the process epoch.
    #[must_use]
    pub fn as_nanos(&self) -> i64 {
        self.0
    }

    /// Returns whole milliseconds since the process epoch.
    #[must_use]
    pub fn as_millis(&self) -> i64 {
        self.0 / 1_000_000
    }

    /// Signed difference `self - earlier` in nanoseconds.
    #[must_use]
    pub fn delta_nanos(&self, earlier: Timestamp) -> i64 {
        self.0 - earlier.0
    }

    /// Absolute difference between two timestamps in nanoseconds.
    #[must_use]
    pub fn abs_delta_nanos(&self, other: Timestamp) -> i64 {
        (self.0 - other.0).abs()
    }

    /// Returns this timestamp advanced by `duration` (saturating).
    #[must_use]
    pub fn saturating_add(&self, duration: Duration) -> Self {
        let nanos = i64::try_from(duration.as_nanos()).unwrap_or(i64::MAX);
        Self(self.0.saturating_add(nanos))
    }
}

/// Unique identifier for a captured frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct FrameId(Uuid);

impl FrameId {
    /// Creates a new unique frame ID.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates a frame ID from an existing UUID.
    #[must_use]
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the inner UUID.
    #[must_use]
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for FrameId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for FrameId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A confidence score constrained to `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Confidence(f64);

impl Confidence {
    /// Creates a confidence score, validating the range.
    ///
    /// # Errors
    ///
    /// Returns a validation error if `value` is not within `[0, 1]` or is
    /// not finite.
    pub fn new(value: f64) -> CoreResult<Self> {
        if !value.is_finite() || !(0.0..=1.0).contains(&value) {
            return Err(CoreError::validation(format!(
                "confidence {value} outside [0, 1]"
            )));
        }
        Ok(Self(value))
    }

    /// Creates a confidence score, clamping out-of-range values.
    ///
    /// Non-finite input clamps to zero.
    #[must_use]
    pub fn clamped(value: f64) -> Self {
        if value.is_finite() {
            Self(value.clamp(0.0, 1.0))
        } else {
            Self(0.0)
        }
    }

    /// Returns the inner value.
    #[must_use]
    pub fn value(&self) -> f64 {
        self.0
    }
}

impl std::fmt::Display for Confidence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}

// =============================================================================
// Geometry Types
// =============================================================================

/// Axis-aligned bounding box in normalized `[0, 1]` frame coordinates.
///
/// `x`/`y` is the top-left corner; `width`/`height` extend right and down.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct BoundingBox {
    /// Left edge, normalized
    pub x: f64,
    /// Top edge, normalized
    pub y: f64,
    /// Width, normalized
    pub width: f64,
    /// Height, normalized
    pub height: f64,
}

impl BoundingBox {
    /// Creates a bounding box, validating its shape.
    ///
    /// # Errors
    ///
    /// Returns [`FrameError::MalformedBoundingBox`] if any component is not
    /// finite or if width/height is negative.
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Result<Self, FrameError> {
        for (name, v) in [("x", x), ("y", y), ("width", width), ("height", height)] {
            if !v.is_finite() {
                return Err(FrameError::malformed_bbox(format!("{name} is not finite")));
            }
        }
        if width < 0.0 || height < 0.0 {
            return Err(FrameError::malformed_bbox(format!(
                "negative extent {width}x{height}"
            )));
        }
        Ok(Self {
            x,
            y,
            width,
            height,
        })
    }

    /// Returns the box clamped into the unit square.
    #[must_use]
    pub fn clamped(&self) -> Self {
        let x = self.x.clamp(0.0, 1.0);
        let y = self.y.clamp(0.0, 1.0);
        Self {
            x,
            y,
            width: self.width.min(1.0 - x),
            height: self.height.min(1.0 - y),
        }
    }

    /// Right edge, normalized.
    #[must_use]
    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    /// Bottom edge, normalized.
    #[must_use]
    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    /// Center X coordinate, normalized.
    #[must_use]
    pub fn center_x(&self) -> f64 {
        self.x + self.width / 2.0
    }

    /// Center Y coordinate, normalized (0 = top of frame, 1 = bottom).
    #[must_use]
    pub fn center_y(&self) -> f64 {
        self.y + self.height / 2.0
    }

    /// Width-over-height aspect ratio.
    ///
    /// The height is floored at a one-pixel equivalent (1/1080) so a
    /// degenerate box cannot divide by zero.
    #[must_use]
    pub fn aspect_ratio(&self) -> f64 {
        const MIN_HEIGHT: f64 = 1.0 / 1080.0;
        self.width / self.height.max(MIN_HEIGHT)
    }
}

/// A point in camera-relative 3D space, meters.
///
/// x right+, y down+, z forward+ (distance from the camera).
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Position3D {
    /// Meters right of the optical axis
    pub x: f64,
    /// Meters below the optical axis
    pub y: f64,
    /// Meters in front of the camera
    pub z: f64,
}

impl Position3D {
    /// The camera origin.
    pub const ORIGIN: Self = Self {
        x: 0.0,
        y: 0.0,
        z: 0.0,
    };

    /// Creates a position.
    #[must_use]
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Euclidean distance to another position, meters.
    #[must_use]
    pub fn distance_to(&self, other: &Position3D) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        let dz = self.z - other.z;
        (dx * dx + dy * dy + dz * dz).sqrt()
    }
}

// =============================================================================
// Detector Types
// =============================================================================

/// A single object detection from the external per-frame detector.
///
/// The caller filters detections to the subject-of-interest class before
/// handing them to the pose classifier or arbitration engine.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Detection {
    /// Normalized bounding box of the detected object
    pub bounding_box: BoundingBox,
    /// Detector class index (0 = person for COCO-style detectors)
    pub class_id: u32,
    /// Detector confidence
    pub confidence: Confidence,
    /// Human-readable class label
    pub class_name: String,
}

impl Detection {
    /// Creates a detection.
    #[must_use]
    pub fn new(
        bounding_box: BoundingBox,
        class_id: u32,
        confidence: Confidence,
        class_name: impl Into<String>,
    ) -> Self {
        Self {
            bounding_box,
            class_id,
            confidence,
            class_name: class_name.into(),
        }
    }
}

// =============================================================================
// Frame Types
// =============================================================================

/// An RGBA8 camera frame with a monotonic capture timestamp.
#[derive(Debug, Clone)]
pub struct RgbFrame {
    id: FrameId,
    pixels: Vec<u8>,
    width: usize,
    height: usize,
    timestamp: Timestamp,
}

impl RgbFrame {
    /// Creates a frame from an RGBA8 pixel buffer.
    ///
    /// # Errors
    ///
    /// Returns [`FrameError::EmptyFrame`] for zero dimensions and
    /// [`FrameError::BufferSize`] if the buffer length does not equal
    /// `width * height * 4`.
    pub fn new(
        pixels: Vec<u8>,
        width: usize,
        height: usize,
        timestamp: Timestamp,
    ) -> Result<Self, FrameError> {
        if width == 0 || height == 0 {
            return Err(FrameError::EmptyFrame { width, height });
        }
        let expected = width * height * RGBA_BYTES_PER_PIXEL;
        if pixels.len() != expected {
            return Err(FrameError::BufferSize {
                width,
                height,
                expected,
                actual: pixels.len(),
            });
        }
        Ok(Self {
            id: FrameId::new(),
            pixels,
            width,
            height,
            timestamp,
        })
    }

    /// Unique frame identifier.
    #[must_use]
    pub fn id(&self) -> FrameId {
        self.id
    }

    /// Raw RGBA8 pixel buffer in row-major order.
    #[must_use]
    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    /// Frame width in pixels.
    #[must_use]
    pub fn width(&self) -> usize {
        self.width
    }

    /// Frame height in pixels.
    #[must_use]
    pub fn height(&self) -> usize {
        self.height
    }

    /// Monotonic capture timestamp.
    #[must_use]
    pub fn timestamp(&self) -> Timestamp {
        self.timestamp
    }
}

/// A DEPTH16 frame: per-pixel distances in millimeters.
///
/// Raw values of `0` and `0xFFFF` are sentinels for "no valid return" and
/// must never be interpreted as distances.
#[derive(Debug, Clone)]
pub struct DepthFrame {
    samples: Array2<u16>,
    timestamp: Timestamp,
}

impl DepthFrame {
    /// Creates a depth frame from a row-major millimeter sample buffer.
    ///
    /// # Errors
    ///
    /// Returns [`FrameError::EmptyFrame`] for zero dimensions and
    /// [`FrameError::BufferSize`] if the buffer length does not equal
    /// `width * height`.
    pub fn from_raw(
        samples: Vec<u16>,
        width: usize,
        height: usize,
        timestamp: Timestamp,
    ) -> Result<Self, FrameError> {
        if width == 0 || height == 0 {
            return Err(FrameError::EmptyFrame { width, height });
        }
        if samples.len() != width * height {
            return Err(FrameError::BufferSize {
                width,
                height,
                expected: width * height,
                actual: samples.len(),
            });
        }
        // Length was just validated, so the shape conversion cannot fail.
        let samples = Array2::from_shape_vec((height, width), samples)
            .map_err(|_| FrameError::EmptyFrame { width, height })?;
        Ok(Self { samples, timestamp })
    }

    /// Frame width in pixels.
    #[must_use]
    pub fn width(&self) -> usize {
        self.samples.ncols()
    }

    /// Frame height in pixels.
    #[must_use]
    pub fn height(&self) -> usize {
        self.samples.nrows()
    }

    /// Monotonic capture timestamp.
    #[must_use]
    pub fn timestamp(&self) -> Timestamp {
        self.timestamp
    }

    /// Raw millimeter sample at `(x, y)`, sentinel values included.
    ///
    /// Returns `None` outside the frame.
    #[must_use]
    pub fn raw_at(&self, x: usize, y: usize) -> Option<u16> {
        self.samples.get((y, x)).copied()
    }

    /// Depth in meters at `(x, y)`.
    ///
    /// Returns `None` outside the frame and for either sentinel value, so
    /// "no depth" is always distinguishable from a valid zero-adjacent
    /// reading.
    #[must_use]
    pub fn depth_meters_at(&self, x: usize, y: usize) -> Option<f64> {
        match self.raw_at(x, y)? {
            DEPTH_INVALID_NEAR | DEPTH_INVALID_FAR => None,
            mm => Some(f64::from(mm) / 1000.0),
        }
    }

    /// The underlying sample array (rows = y, columns = x).
    #[must_use]
    pub fn samples(&self) -> &Array2<u16> {
        &self.samples
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timestamp_deltas() {
        let a = Timestamp::from_millis(100);
        let b = Timestamp::from_millis(133);
        assert_eq!(b.delta_nanos(a), 33_000_000);
        assert_eq!(a.delta_nanos(b), -33_000_000);
        assert_eq!(a.abs_delta_nanos(b), 33_000_000);
        assert_eq!(b.as_millis(), 133);
    }

    #[test]
    fn test_timestamp_saturating_add() {
        let t = Timestamp::from_millis(5).saturating_add(Duration::from_millis(10));
        assert_eq!(t.as_millis(), 15);
    }

    #[test]
    fn test_confidence_validation() {
        assert!(Confidence::new(0.5).is_ok());
        assert!(Confidence::new(1.0).is_ok());
        assert!(Confidence::new(1.1).is_err());
        assert!(Confidence::new(-0.1).is_err());
        assert!(Confidence::new(f64::NAN).is_err());
    }

    #[test]
    fn test_confidence_clamping() {
        assert_eq!(Confidence::clamped(1.5).value(), 1.0);
        assert_eq!(Confidence::clamped(-0.5).value(), 0.0);
        assert_eq!(Confidence::clamped(f64::NAN).value(), 0.0);
    }

    #[test]
    fn test_bounding_box_rejects_malformed() {
        assert!(BoundingBox::new(0.1, 0.1, -0.2, 0.3).is_err());
        assert!(BoundingBox::new(f64::NAN, 0.1, 0.2, 0.3).is_err());
        assert!(BoundingBox::new(0.1, 0.1, 0.2, 0.3).is_ok());
    }

    #[test]
    fn test_bounding_box_geometry() {
        let bbox = BoundingBox::new(0.2, 0.4, 0.4, 0.2).unwrap();
        assert!((bbox.center_x() - 0.4).abs() < 1e-9);
        assert!((bbox.center_y() - 0.5).abs() < 1e-9);
        assert!((bbox.aspect_ratio() - 2.0).abs() < 1e-9);
        assert!((bbox.bottom() - 0.6).abs() < 1e-9);
    }

    #[test]
    fn test_bounding_box_aspect_ratio_floors_height() {
        let bbox = BoundingBox::new(0.0, 0.0, 0.5, 0.0).unwrap();
        assert!(bbox.aspect_ratio().is_finite());
    }

    #[test]
    fn test_bounding_box_clamped() {
        let bbox = BoundingBox::new(0.8, 0.9, 0.5, 0.5).unwrap().clamped();
        assert!(bbox.right() <= 1.0 + 1e-9);
        assert!(bbox.bottom() <= 1.0 + 1e-9);
    }

    #[test]
    fn test_position_distance() {
        let a = Position3D::new(0.0, 0.0, 2.0);
        let b = Position3D::new(3.0, 4.0, 2.0);
        assert!((a.distance_to(&b) - 5.0).abs() < 1e-9);
    }

    #[test]
    fn test_rgb_frame_validates_buffer() {
        let ts = Timestamp::ZERO;
        assert!(RgbFrame::new(vec![0; 4 * 4 * 4], 4, 4, ts).is_ok());
        assert!(matches!(
            RgbFrame::new(vec![0; 10], 4, 4, ts),
            Err(FrameError::BufferSize { .. })
        ));
        assert!(matches!(
            RgbFrame::new(vec![], 0, 4, ts),
            Err(FrameError::EmptyFrame { .. })
        ));
    }

    #[test]
    fn test_depth_frame_sentinels() {
        let mut samples = vec![1500u16; 16];
        samples[0] = DEPTH_INVALID_NEAR;
        samples[1] = DEPTH_INVALID_FAR;
        let frame = DepthFrame::from_raw(samples, 4, 4, Timestamp::ZERO).unwrap();

        assert_eq!(frame.depth_meters_at(0, 0), None);
        assert_eq!(frame.depth_meters_at(1, 0), None);
        assert_eq!(frame.depth_meters_at(2, 0), Some(1.5));
        // Out of bounds
        assert_eq!(frame.depth_meters_at(4, 0), None);
        assert_eq!(frame.depth_meters_at(0, 4), None);
    }

    #[test]
    fn test_depth_frame_validates_buffer() {
        assert!(matches!(
            DepthFrame::from_raw(vec![0; 5], 4, 4, Timestamp::ZERO),
            Err(FrameError::BufferSize { .. })
        ));
    }
}
