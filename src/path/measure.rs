//! Arc-length sampling of path geometry.
//!
//! Text-on-path needs random access into a curve by distance: "where is the
//! point 42.5 units along this path, and which way is it heading?". The
//! approach here:
//! - flatten the path once into line segments at a fixed tolerance
//! - keep the cumulative length at each segment boundary
//! - answer queries with a binary search plus linear interpolation
//!
//! The tangent of a query is the direction of the segment it falls on, which
//! is exactly what flattening guarantees to approximate within tolerance.

use lyon::math::Point;
use lyon::path::iterator::PathIterator;
use lyon::path::{Event, Path};

/// Flattening tolerance for measurement. Small enough that glyph placement
/// does not visibly wobble, large enough to keep the table short.
const TOLERANCE: f32 = 0.05;

/// A position/direction sample along a path.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct PathSample {
    pub position: Point,
    /// Direction of travel at the sample, in degrees.
    pub tangent_deg: f32,
}

/// Precomputed arc-length table over one path.
#[derive(Debug, Clone)]
pub struct PathMeasure {
    segments: Vec<(Point, Point)>,
    /// `cumulative[i]` is the path length up to the *end* of `segments[i]`.
    cumulative: Vec<f32>,
    total: f32,
}

impl PathMeasure {
    pub fn new(path: &Path) -> Self {
        let mut segments = Vec::new();
        let mut cumulative = Vec::new();
        let mut total = 0.0f32;

        let mut push = |from: Point, to: Point| {
            let len = (to - from).length();
            if len > 0.0 {
                total += len;
                segments.push((from, to));
                cumulative.push(total);
            }
        };

        for event in path.iter().flattened(TOLERANCE) {
            match event {
                Event::Begin { .. } => {}
                Event::Line { from, to } => push(from, to),
                Event::End { last, first, close } => {
                    if close {
                        push(last, first);
                    }
                }
                // Flattening leaves no curve events behind.
                _ => {}
            }
        }

        Self {
            segments,
            cumulative,
            total,
        }
    }

    /// Total arc length. Zero for empty or degenerate paths.
    pub fn length(&self) -> f32 {
        self.total
    }

    /// Sample position and tangent at `distance` along the path.
    ///
    /// Distances are clamped to `[0, length]`; `None` only for a path with no
    /// measurable geometry.
    pub fn sample(&self, distance: f32) -> Option<PathSample> {
        if self.segments.is_empty() {
            return None;
        }

        let target = distance.clamp(0.0, self.total);
        let index = match self
            .cumulative
            .binary_search_by(|len| len.partial_cmp(&target).unwrap_or(std::cmp::Ordering::Less))
        {
            Ok(i) => i,
            Err(i) => i.min(self.segments.len() - 1),
        };

        let (from, to) = self.segments[index];
        let seg_end = self.cumulative[index];
        let seg_len = (to - from).length();
        let seg_start = seg_end - seg_len;
        let t = if seg_len > 0.0 {
            (target - seg_start) / seg_len
        } else {
            0.0
        };

        let direction = to - from;
        Some(PathSample {
            position: from + direction * t,
            tangent_deg: direction.y.atan2(direction.x).to_degrees(),
        })
    }
}
