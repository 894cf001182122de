//! Depth-map storage, per-region statistics, and 3D back-projection.

use bedwatch_core::{
    utils, BoundingBox, DepthFrame, Position3D, Timestamp, DEPTH_INVALID_FAR, DEPTH_INVALID_NEAR,
};
use ndarray::Array2;

/// Aggregate statistics over the valid samples of one map region.
///
/// All depth fields are meters. When `valid_pixels` is zero the depth
/// fields stay at their zero defaults rather than being fabricated.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct DepthStats {
    /// Smallest valid depth in the region
    pub min: f64,
    /// Largest valid depth in the region
    pub max: f64,
    /// Mean of the valid depths
    pub mean: f64,
    /// Median of the valid depths (selection, not a full sort)
    pub median: f64,
    /// Samples that carried a real distance
    pub valid_pixels: usize,
    /// All samples inside the region
    pub total_pixels: usize,
}

/// Holds the most recent depth map and answers spatial queries on it.
pub struct DepthReconstructor {
    map: Option<Array2<u16>>,
    map_timestamp: Timestamp,
    focal_fx: f64,
    focal_fy: f64,
}

impl Default for DepthReconstructor {
    fn default() -> Self {
        Self::with_focal(500.0, 500.0)
    }
}

impl DepthReconstructor {
    /// Neighborhood half-width for position sampling; 5x5 pixels total.
    const NEIGHBORHOOD_RADIUS: isize = 2;

    /// Creates a reconstructor with the given focal-length
    /// approximations, in pixels.
    #[must_use]
    pub fn with_focal(focal_fx: f64, focal_fy: f64) -> Self {
        Self {
            map: None,
            map_timestamp: Timestamp::ZERO,
            focal_fx,
            focal_fy,
        }
    }

    /// Replaces the current map with `frame`.
    ///
    /// Once a map exists, a frame with different dimensions is logged
    /// and rejected, leaving the map unchanged. Returns whether the
    /// frame was accepted.
    pub fn update_map(&mut self, frame: &DepthFrame) -> bool {
        if let Some(map) = &self.map {
            let (rows, cols) = map.dim();
            if (frame.height(), frame.width()) != (rows, cols) {
                tracing::warn!(
                    current_width = cols,
                    current_height = rows,
                    frame_width = frame.width(),
                    frame_height = frame.height(),
                    "depth frame dimensions changed mid-stream, rejecting update"
                );
                return false;
            }
        }
        self.map = Some(frame.samples().clone());
        self.map_timestamp = frame.timestamp();
        true
    }

    /// Whether a map has been ingested.
    #[must_use]
    pub fn has_map(&self) -> bool {
        self.map.is_some()
    }

    /// Capture timestamp of the current map.
    #[must_use]
    pub fn map_timestamp(&self) -> Timestamp {
        self.map_timestamp
    }

    /// Depth in meters at map pixel `(x, y)`, or `None` when out of
    /// bounds or the sample is one of the sentinel values.
    #[must_use]
    pub fn depth_at(&self, x: usize, y: usize) -> Option<f64> {
        let map = self.map.as_ref()?;
        let raw = *map.get((y, x))?;
        sample_meters(raw)
    }

    /// Statistics over the valid samples inside a normalized bounding
    /// box, or `None` when no map has been ingested.
    #[must_use]
    pub fn region_stats(&self, bounding_box: &BoundingBox) -> Option<DepthStats> {
        let map = self.map.as_ref()?;
        let (rows, cols) = map.dim();
        let (x0, y0, x1, y1) = pixel_rect(bounding_box, cols, rows);

        let mut values = Vec::with_capacity((x1 - x0) * (y1 - y0));
        let mut total_pixels = 0usize;
        for y in y0..y1 {
            for x in x0..x1 {
                total_pixels += 1;
                if let Some(meters) = sample_meters(map[(y, x)]) {
                    values.push(meters);
                }
            }
        }

        let mut stats = DepthStats {
            total_pixels,
            valid_pixels: values.len(),
            ..DepthStats::default()
        };
        if values.is_empty() {
            return Some(stats);
        }

        stats.min = values.iter().copied().fold(f64::INFINITY, f64::min);
        stats.max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        stats.mean = utils::mean(&values);
        stats.median = utils::median_in_place(&mut values).unwrap_or_default();
        Some(stats)
    }

    /// Back-projects the bounding-box center into sensor space.
    ///
    /// Samples the median of a 5x5 neighborhood around the projected
    /// center, falling back to the full-box median when the
    /// neighborhood holds no valid samples. Returns `None` when no
    /// valid depth can be recovered.
    #[must_use]
    pub fn estimate_position(&self, bounding_box: &BoundingBox) -> Option<Position3D> {
        let map = self.map.as_ref()?;
        let (rows, cols) = map.dim();
        if rows == 0 || cols == 0 {
            return None;
        }

        let u = ((bounding_box.center_x() * cols as f64) as isize).clamp(0, cols as isize - 1);
        let v = ((bounding_box.center_y() * rows as f64) as isize).clamp(0, rows as isize - 1);

        let mut neighborhood = Vec::with_capacity(25);
        for dy in -Self::NEIGHBORHOOD_RADIUS..=Self::NEIGHBORHOOD_RADIUS {
            for dx in -Self::NEIGHBORHOOD_RADIUS..=Self::NEIGHBORHOOD_RADIUS {
                let (x, y) = (u + dx, v + dy);
                if x < 0 || y < 0 || x >= cols as isize || y >= rows as isize {
                    continue;
                }
                if let Some(meters) = sample_meters(map[(y as usize, x as usize)]) {
                    neighborhood.push(meters);
                }
            }
        }

        let depth = match utils::median_in_place(&mut neighborhood) {
            Some(meters) => meters,
            None => {
                let stats = self.region_stats(bounding_box)?;
                if stats.valid_pixels == 0 {
                    return None;
                }
                stats.median
            }
        };
        if depth <= 0.0 {
            return None;
        }

        let cx = cols as f64 / 2.0;
        let cy = rows as f64 / 2.0;
        Some(Position3D {
            x: (u as f64 - cx) * depth / self.focal_fx,
            y: (v as f64 - cy) * depth / self.focal_fy,
            z: depth,
        })
    }

    /// Discards the current map.
    pub fn reset(&mut self) {
        self.map = None;
        self.map_timestamp = Timestamp::ZERO;
    }
}

fn sample_meters(raw: u16) -> Option<f64> {
    if raw == DEPTH_INVALID_NEAR || raw == DEPTH_INVALID_FAR {
        None
    } else {
        Some(f64::from(raw) / 1000.0)
    }
}

fn pixel_rect(bounding_box: &BoundingBox, cols: usize, rows: usize) -> (usize, usize, usize, usize) {
    let x0 = ((bounding_box.x * cols as f64) as usize).min(cols);
    let y0 = ((bounding_box.y * rows as f64) as usize).min(rows);
    let x1 = ((bounding_box.right() * cols as f64).ceil() as usize).min(cols);
    let y1 = ((bounding_box.bottom() * rows as f64).ceil() as usize).min(rows);
    (x0, y0, x1.max(x0), y1.max(y0))
}
