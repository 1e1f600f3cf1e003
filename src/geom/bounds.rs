//! Axis-aligned bounding boxes.

use nalgebra::{Point, SVector};

/// An axis-aligned box in `D` dimensions.
///
/// A freshly created box is *empty* (min = +inf, max = -inf) and becomes valid
/// once a point has been added. All containment and intersection tests treat
/// the boundary as inside.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds<const D: usize> {
    /// Minimum corner.
    pub min: Point<f64, D>,
    /// Maximum corner.
    pub max: Point<f64, D>,
}

/// 2D bounds, used for projected polygons and triage filters.
pub type Bounds2 = Bounds<2>;

/// 3D bounds, used for cell positions in world space.
pub type Bounds3 = Bounds<3>;

impl<const D: usize> Default for Bounds<D> {
    fn default() -> Self {
        Self::empty()
    }
}

impl<const D: usize> Bounds<D> {
    /// Create an empty box that contains nothing.
    pub fn empty() -> Self {
        Self {
            min: Point::from(SVector::<f64, D>::repeat(f64::INFINITY)),
            max: Point::from(SVector::<f64, D>::repeat(f64::NEG_INFINITY)),
        }
    }

    /// Create a box from two corners, in any order.
    pub fn new(a: Point<f64, D>, b: Point<f64, D>) -> Self {
        let mut bounds = Self::empty();
        bounds.extend(&a);
        bounds.extend(&b);
        bounds
    }

    /// Create the smallest box containing every point.
    pub fn from_points<'a, It>(points: It) -> Self
    where
        It: IntoIterator<Item = &'a Point<f64, D>>,
    {
        let mut bounds = Self::empty();
        for p in points {
            bounds.extend(p);
        }
        bounds
    }

    /// Whether at least one point has been added.
    #[inline]
    pub fn is_valid(&self) -> bool {
        (0..D).all(|i| self.min[i] <= self.max[i])
    }

    /// Grow the box to include `p`.
    #[inline]
    pub fn extend(&mut self, p: &Point<f64, D>) {
        for i in 0..D {
            self.min[i] = self.min[i].min(p[i]);
            self.max[i] = self.max[i].max(p[i]);
        }
    }

    /// Extent along each axis; zero for an empty box.
    pub fn size(&self) -> SVector<f64, D> {
        if self.is_valid() {
            self.max - self.min
        } else {
            SVector::<f64, D>::zeros()
        }
    }

    /// Length of the box diagonal.
    pub fn diagonal(&self) -> f64 {
        self.size().norm()
    }

    /// Box center, `None` if empty.
    pub fn center(&self) -> Option<Point<f64, D>> {
        self.is_valid()
            .then(|| Point::from((self.min.coords + self.max.coords) * 0.5))
    }

    /// Whether `p` lies inside or on the boundary.
    pub fn contains_point(&self, p: &Point<f64, D>) -> bool {
        (0..D).all(|i| p[i] >= self.min[i] && p[i] <= self.max[i])
    }

    /// Whether `other` lies entirely inside this box.
    pub fn contains(&self, other: &Self) -> bool {
        other.is_valid()
            && self.is_valid()
            && (0..D).all(|i| other.min[i] >= self.min[i] && other.max[i] <= self.max[i])
    }

    /// Whether the two boxes overlap or touch.
    pub fn intersects(&self, other: &Self) -> bool {
        self.is_valid()
            && other.is_valid()
            && (0..D).all(|i| self.min[i] <= other.max[i] && other.min[i] <= self.max[i])
    }
}
