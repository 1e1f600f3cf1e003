//! Planar polygon measurements.
//!
//! Polygons are slices of [`Point2`] interpreted as closed loops: the last
//! point connects back to the first. Repeated consecutive points (as produced
//! by duplicated leaf entries) contribute zero-length segments and are
//! otherwise harmless.

use nalgebra::Point2;
use std::f64::consts::{PI, TAU};

use super::Bounds2;

/// Orientation of a closed polygon.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Winding {
    /// Negative signed area.
    Clockwise,
    /// Positive signed area.
    #[default]
    CounterClockwise,
}

impl Winding {
    /// The winding described by a signed area. Zero area counts as
    /// counter-clockwise.
    #[inline]
    pub fn from_signed_area(area: f64) -> Self {
        if area < 0.0 {
            Winding::Clockwise
        } else {
            Winding::CounterClockwise
        }
    }

    /// The opposite orientation.
    #[inline]
    pub fn reversed(self) -> Self {
        match self {
            Winding::Clockwise => Winding::CounterClockwise,
            Winding::CounterClockwise => Winding::Clockwise,
        }
    }
}

/// Shoelace signed area. Positive for counter-clockwise loops.
pub fn signed_area(points: &[Point2<f64>]) -> f64 {
    let n = points.len();
    if n < 3 {
        return 0.0;
    }
    let mut sum = 0.0;
    for i in 0..n {
        let a = &points[i];
        let b = &points[(i + 1) % n];
        sum += a.x * b.y - b.x * a.y;
    }
    sum * 0.5
}

/// Whether the loop is clockwise (strictly negative area).
#[inline]
pub fn is_clockwise(points: &[Point2<f64>]) -> bool {
    signed_area(points) < 0.0
}

/// Lengths of every closing segment, in loop order.
pub fn segment_lengths(points: &[Point2<f64>]) -> impl Iterator<Item = f64> + '_ {
    let n = points.len();
    (0..if n < 2 { 0 } else { n }).map(move |i| (points[(i + 1) % n] - points[i]).norm())
}

/// Total length of the closed loop.
pub fn perimeter(points: &[Point2<f64>]) -> f64 {
    segment_lengths(points).sum()
}

/// Isoperimetric quotient `4πA / P²`, clamped to `[0, 1]`.
///
/// A circle scores 1 and a unit square π/4. Degenerate loops (zero perimeter)
/// score 0.
pub fn compactness(area: f64, perimeter: f64) -> f64 {
    if perimeter <= 0.0 {
        return 0.0;
    }
    (4.0 * PI * area.abs() / (perimeter * perimeter)).min(1.0)
}

/// Mean of the loop vertices, `None` for an empty slice.
pub fn vertex_centroid(points: &[Point2<f64>]) -> Option<Point2<f64>> {
    if points.is_empty() {
        return None;
    }
    let sum = points
        .iter()
        .fold(nalgebra::Vector2::zeros(), |acc, p| acc + p.coords);
    Some(Point2::from(sum / points.len() as f64))
}

/// Angle of the direction `from -> to`, measured counter-clockwise from +X.
///
/// Coincident points have angle 0.
#[inline]
pub fn direction_angle(from: &Point2<f64>, to: &Point2<f64>) -> f64 {
    let d = to - from;
    if d.x == 0.0 && d.y == 0.0 {
        0.0
    } else {
        d.y.atan2(d.x)
    }
}

/// Counter-clockwise angle swept from ray `pivot -> a` to ray `pivot -> b`,
/// in `[0, 2π)`.
pub fn ccw_angle(pivot: &Point2<f64>, a: &Point2<f64>, b: &Point2<f64>) -> f64 {
    let angle = direction_angle(pivot, b) - direction_angle(pivot, a);
    let wrapped = angle.rem_euclid(TAU);
    // rem_euclid can round up to exactly TAU for tiny negative inputs
    if wrapped >= TAU {
        0.0
    } else {
        wrapped
    }
}

/// Incremental convexity test over consecutive vertex triples.
///
/// Collinear triples are ignored. The polygon is convex when every
/// non-degenerate turn has the same sign.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConvexityTracker {
    positive: bool,
    negative: bool,
}

impl ConvexityTracker {
    /// Create an empty tracker.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the turn at `b` for the path `a -> b -> c`.
    #[inline]
    pub fn push(&mut self, a: &Point2<f64>, b: &Point2<f64>, c: &Point2<f64>) {
        let ab = b - a;
        let bc = c - b;
        let cross = ab.x * bc.y - ab.y * bc.x;
        if cross > f64::EPSILON {
            self.positive = true;
        } else if cross < -f64::EPSILON {
            self.negative = true;
        }
    }

    /// Whether all recorded turns agree.
    #[inline]
    pub fn is_convex(&self) -> bool {
        !(self.positive && self.negative)
    }
}

/// Whether every turn of the closed loop has the same sign.
pub fn is_convex(points: &[Point2<f64>]) -> bool {
    let n = points.len();
    if n < 3 {
        return false;
    }
    let mut tracker = ConvexityTracker::new();
    for i in 0..n {
        tracker.push(&points[i], &points[(i + 1) % n], &points[(i + 2) % n]);
    }
    tracker.is_convex()
}

/// Even-odd point-in-polygon test.
pub fn point_in_polygon(p: &Point2<f64>, polygon: &[Point2<f64>]) -> bool {
    let n = polygon.len();
    if n < 3 {
        return false;
    }
    let mut inside = false;
    let mut j = n - 1;
    for i in 0..n {
        let pi = &polygon[i];
        let pj = &polygon[j];
        if (pi.y > p.y) != (pj.y > p.y) {
            let x = (pj.x - pi.x) * (p.y - pi.y) / (pj.y - pi.y) + pi.x;
            if p.x < x {
                inside = !inside;
            }
        }
        j = i;
    }
    inside
}

/// Whether any of `points` lies inside `polygon`.
///
/// `bounds` is the polygon's bounding box and is used to reject points early.
pub fn any_point_in_polygon<'a, It>(points: It, polygon: &[Point2<f64>], bounds: &Bounds2) -> bool
where
    It: IntoIterator<Item = &'a Point2<f64>>,
{
    points
        .into_iter()
        .any(|p| bounds.contains_point(p) && point_in_polygon(p, polygon))
}

/// Distance from `p` to the segment `a-b`.
pub fn point_segment_distance(p: &Point2<f64>, a: &Point2<f64>, b: &Point2<f64>) -> f64 {
    let ab = b - a;
    let len_sq = ab.norm_squared();
    if len_sq <= f64::EPSILON {
        return (p - a).norm();
    }
    let t = ((p - a).dot(&ab) / len_sq).clamp(0.0, 1.0);
    (p - (a + ab * t)).norm()
}

/// Summary measurements of a closed loop.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PolygonInfo {
    /// Shoelace signed area.
    pub signed_area: f64,
    /// Closed loop length.
    pub perimeter: f64,
    /// `4π|A|/P²`, at most 1.
    pub compactness: f64,
    /// All turns agree in sign.
    pub convex: bool,
}

impl PolygonInfo {
    /// Measure a closed loop.
    pub fn compute(points: &[Point2<f64>]) -> Self {
        let signed_area = signed_area(points);
        let perimeter = perimeter(points);
        Self {
            signed_area,
            perimeter,
            compactness: compactness(signed_area, perimeter),
            convex: is_convex(points),
        }
    }

    /// Orientation of the loop.
    #[inline]
    pub fn winding(&self) -> Winding {
        Winding::from_signed_area(self.signed_area)
    }
}
