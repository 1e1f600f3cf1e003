//! Projection of 3D positions onto a 2D plane.
//!
//! Face enumeration only ever looks at 2D coordinates. [`Projection`] maps
//! node positions onto a plane, and [`ProjectedPointSet`] does the same for
//! auxiliary point sets (holes, seeds) lazily, the first time a consumer on any
//! thread asks for them.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{PoisonError, RwLock};

use nalgebra::{Point2, Point3, Vector3};

use super::Cluster;
use crate::error::{CellError, Result};
use crate::geom::{polygon, Bounds2};

/// An orthonormal plane basis used to flatten 3D positions.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Projection {
    origin: Point3<f64>,
    u: Vector3<f64>,
    v: Vector3<f64>,
}

impl Default for Projection {
    fn default() -> Self {
        Self::xy()
    }
}

impl Projection {
    /// Drop the z coordinate.
    pub fn xy() -> Self {
        Self {
            origin: Point3::origin(),
            u: Vector3::x(),
            v: Vector3::y(),
        }
    }

    /// Project onto the plane through the origin with the given normal.
    ///
    /// The basis is right-handed around `normal`, so a normal of +Z gives the
    /// same result as [`Projection::xy`].
    pub fn from_normal(normal: Vector3<f64>) -> Result<Self> {
        let len = normal.norm();
        if !len.is_finite() || len < 1e-12 {
            return Err(CellError::DegenerateProjection);
        }
        let n = normal / len;
        let helper = if n.x.abs() < 0.9 {
            Vector3::x()
        } else {
            Vector3::y()
        };
        let u = (helper - n * helper.dot(&n)).normalize();
        let v = n.cross(&u);
        Ok(Self {
            origin: Point3::origin(),
            u,
            v,
        })
    }

    /// Move the plane origin. Only translates the 2D output.
    pub fn with_origin(mut self, origin: Point3<f64>) -> Self {
        self.origin = origin;
        self
    }

    /// Project one point.
    #[inline]
    pub fn project(&self, p: &Point3<f64>) -> Point2<f64> {
        let d = p - self.origin;
        Point2::new(d.dot(&self.u), d.dot(&self.v))
    }

    /// Project every node of a cluster, indexed by node.
    pub fn project_cluster(&self, cluster: &Cluster) -> Vec<Point2<f64>> {
        cluster
            .nodes()
            .iter()
            .map(|n| self.project(&n.position))
            .collect()
    }
}

#[derive(Debug, Default)]
struct Projected {
    points: Vec<Point2<f64>>,
    bounds: Bounds2,
}

/// A point set projected to 2D on first use.
///
/// Safe to share between threads: the first caller projects under a write
/// lock, later callers see the `ready` flag and only take the read lock.
#[derive(Debug)]
pub struct ProjectedPointSet {
    source: Vec<Point3<f64>>,
    projection: Projection,
    ready: AtomicBool,
    projected: RwLock<Projected>,
}

impl ProjectedPointSet {
    /// Wrap 3D points to be projected lazily.
    pub fn new(source: Vec<Point3<f64>>, projection: Projection) -> Self {
        Self {
            source,
            projection,
            ready: AtomicBool::new(false),
            projected: RwLock::new(Projected::default()),
        }
    }

    /// Wrap points that are already in plane coordinates.
    pub fn from_2d(points: Vec<Point2<f64>>) -> Self {
        let bounds = Bounds2::from_points(&points);
        let source = points.iter().map(|p| Point3::new(p.x, p.y, 0.0)).collect();
        Self {
            source,
            projection: Projection::xy(),
            ready: AtomicBool::new(true),
            projected: RwLock::new(Projected { points, bounds }),
        }
    }

    /// Number of points.
    #[inline]
    pub fn len(&self) -> usize {
        self.source.len()
    }

    /// Whether the set has no points.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.source.is_empty()
    }

    /// Whether projection has already happened.
    #[inline]
    pub fn is_projected(&self) -> bool {
        self.ready.load(Ordering::Acquire)
    }

    /// Project the points if no thread has done so yet.
    pub fn ensure_projected(&self) {
        if self.ready.load(Ordering::Acquire) {
            return;
        }
        let mut guard = self
            .projected
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        if self.ready.load(Ordering::Acquire) {
            return;
        }
        let points: Vec<Point2<f64>> = self
            .source
            .iter()
            .map(|p| self.projection.project(p))
            .collect();
        let bounds = Bounds2::from_points(&points);
        log::trace!("projected {} auxiliary point(s)", points.len());
        *guard = Projected { points, bounds };
        self.ready.store(true, Ordering::Release);
    }

    /// Run `f` over the projected points and their bounds.
    pub fn with_projected<R>(&self, f: impl FnOnce(&[Point2<f64>], &Bounds2) -> R) -> R {
        self.ensure_projected();
        let guard = self
            .projected
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        f(&guard.points, &guard.bounds)
    }

    /// Projected point by index.
    pub fn get(&self, index: usize) -> Option<Point2<f64>> {
        self.with_projected(|points, _| points.get(index).copied())
    }

    /// Whether any point lies strictly inside `polygon`.
    pub fn any_inside(&self, polygon: &[Point2<f64>], polygon_bounds: &Bounds2) -> bool {
        self.with_projected(|points, bounds| {
            bounds.intersects(polygon_bounds)
                && polygon::any_point_in_polygon(points, polygon, polygon_bounds)
        })
    }

    /// Indices of the points inside `polygon`, ascending.
    pub fn indices_inside(&self, polygon: &[Point2<f64>], polygon_bounds: &Bounds2) -> Vec<usize> {
        self.with_projected(|points, bounds| {
            if !bounds.intersects(polygon_bounds) {
                return Vec::new();
            }
            points
                .iter()
                .enumerate()
                .filter(|(_, p)| {
                    polygon_bounds.contains_point(p) && polygon::point_in_polygon(p, polygon)
                })
                .map(|(i, _)| i)
                .collect()
        })
    }
}
