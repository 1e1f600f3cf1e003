//! Cell filtering configuration and the per-run constraint state.
//!
//! [`CellConstraintsConfig`] is a plain value describing which faces are kept.
//! [`CellConstraints`] wraps one config for the duration of an extraction run
//! and owns the mutable state shared by every worker: the uniqueness sets, the
//! optional hole points and the cached enumerator and wrapper cell.

use std::sync::{Arc, Mutex, OnceLock, PoisonError};

use nalgebra::Point2;

use super::cell::{cell_hash, Cell, CellData, CellResult};
use super::sharded::ShardedHashSet;
use super::wrapper;
use crate::dcel::FaceEnumerator;
use crate::error::{CellError, Result};
use crate::geom::{polygon, Winding};
use crate::graph::{Cluster, FaceId, HalfEdgeId, NodeId, ProjectedPointSet, Projection};

/// An optional inclusive range. An unset bound never rejects.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Limit<T> {
    /// Values below this are rejected.
    pub min: Option<T>,
    /// Values above this are rejected.
    pub max: Option<T>,
}

impl<T: PartialOrd + Copy> Limit<T> {
    /// No bound at all.
    pub const fn none() -> Self {
        Self {
            min: None,
            max: None,
        }
    }

    /// Both bounds.
    pub fn between(min: T, max: T) -> Self {
        Self {
            min: Some(min),
            max: Some(max),
        }
    }

    /// Lower bound only.
    pub fn at_least(min: T) -> Self {
        Self {
            min: Some(min),
            max: None,
        }
    }

    /// Upper bound only.
    pub fn at_most(max: T) -> Self {
        Self {
            min: None,
            max: Some(max),
        }
    }

    /// Whether `value` satisfies both bounds.
    #[inline]
    pub fn contains(&self, value: T) -> bool {
        self.min.map_or(true, |min| value >= min) && self.max.map_or(true, |max| value <= max)
    }

    /// Whether neither bound is set.
    #[inline]
    pub fn is_unbounded(&self) -> bool {
        self.min.is_none() && self.max.is_none()
    }

    fn is_ordered(&self) -> bool {
        match (self.min, self.max) {
            (Some(min), Some(max)) => min <= max,
            _ => true,
        }
    }
}

/// Convexity filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum AspectFilter {
    /// Keep convex and concave cells.
    #[default]
    Both,
    /// Keep convex cells only.
    ConvexOnly,
    /// Keep concave cells only.
    ConcaveOnly,
}

impl AspectFilter {
    /// Whether a cell with the given convexity passes.
    #[inline]
    pub fn accepts(self, is_convex: bool) -> bool {
        match self {
            AspectFilter::Both => true,
            AspectFilter::ConvexOnly => is_convex,
            AspectFilter::ConcaveOnly => !is_convex,
        }
    }
}

/// Which faces become cells, and in what shape.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CellConstraintsConfig {
    /// Output winding of accepted cells (default: counter-clockwise).
    pub winding: Winding,
    /// Reverse mismatched cells instead of rejecting them (default: true).
    pub fix_winding: bool,
    /// Convexity filter (default: both).
    pub aspect: AspectFilter,
    /// Keep faces that pass through a leaf node (default: true).
    pub keep_cells_with_leaves: bool,
    /// Repeat each leaf entry in the node sequence and polygon (default: false).
    pub duplicate_leaf_points: bool,
    /// Store signed rather than absolute area (default: false).
    pub signed_area: bool,
    /// A cycle and its reverse count as the same cell (default: false).
    pub opposite_winding_is_duplicate: bool,
    /// Cells whose area is within this distance of the wrapper's are
    /// classified as the wrapper. Zero disables the check.
    pub wrapper_tolerance: f64,
    /// Unique node count.
    pub points: Limit<usize>,
    /// World-space bounds diagonal.
    pub bounds_size: Limit<f64>,
    /// Area, as stored.
    pub area: Limit<f64>,
    /// Perimeter.
    pub perimeter: Limit<f64>,
    /// Every individual segment length.
    pub segment_length: Limit<f64>,
    /// Compactness.
    pub compactness: Limit<f64>,
}

impl Default for CellConstraintsConfig {
    fn default() -> Self {
        Self {
            winding: Winding::CounterClockwise,
            fix_winding: true,
            aspect: AspectFilter::Both,
            keep_cells_with_leaves: true,
            duplicate_leaf_points: false,
            signed_area: false,
            opposite_winding_is_duplicate: false,
            wrapper_tolerance: 0.0,
            points: Limit::none(),
            bounds_size: Limit::none(),
            area: Limit::none(),
            perimeter: Limit::none(),
            segment_length: Limit::none(),
            compactness: Limit::none(),
        }
    }
}

impl CellConstraintsConfig {
    /// Set the output winding.
    pub fn with_winding(mut self, winding: Winding) -> Self {
        self.winding = winding;
        self
    }

    /// Reject mismatched windings instead of fixing them.
    pub fn reject_wrong_winding(mut self) -> Self {
        self.fix_winding = false;
        self
    }

    /// Set the convexity filter.
    pub fn with_aspect(mut self, aspect: AspectFilter) -> Self {
        self.aspect = aspect;
        self
    }

    /// Reject faces that visit a leaf node.
    pub fn omit_leaves(mut self) -> Self {
        self.keep_cells_with_leaves = false;
        self
    }

    /// Repeat leaf entries in the output.
    pub fn with_duplicate_leaf_points(mut self, duplicate: bool) -> Self {
        self.duplicate_leaf_points = duplicate;
        self
    }

    /// Store signed area.
    pub fn with_signed_area(mut self, signed: bool) -> Self {
        self.signed_area = signed;
        self
    }

    /// Treat opposite traversals as duplicates.
    pub fn with_opposite_winding_is_duplicate(mut self, enabled: bool) -> Self {
        self.opposite_winding_is_duplicate = enabled;
        self
    }

    /// Set the wrapper area tolerance.
    pub fn with_wrapper_tolerance(mut self, tolerance: f64) -> Self {
        self.wrapper_tolerance = tolerance;
        self
    }

    /// Set the unique node count limit.
    pub fn with_points(mut self, limit: Limit<usize>) -> Self {
        self.points = limit;
        self
    }

    /// Set the bounds diagonal limit.
    pub fn with_bounds_size(mut self, limit: Limit<f64>) -> Self {
        self.bounds_size = limit;
        self
    }

    /// Set the area limit.
    pub fn with_area(mut self, limit: Limit<f64>) -> Self {
        self.area = limit;
        self
    }

    /// Set the perimeter limit.
    pub fn with_perimeter(mut self, limit: Limit<f64>) -> Self {
        self.perimeter = limit;
        self
    }

    /// Set the per-segment length limit.
    pub fn with_segment_length(mut self, limit: Limit<f64>) -> Self {
        self.segment_length = limit;
        self
    }

    /// Set the compactness limit.
    pub fn with_compactness(mut self, limit: Limit<f64>) -> Self {
        self.compactness = limit;
        self
    }

    /// Configuration used for the wrapper cell: same output shape, no
    /// filtering.
    pub fn relaxed(&self) -> Self {
        Self {
            winding: self.winding,
            duplicate_leaf_points: self.duplicate_leaf_points,
            signed_area: self.signed_area,
            ..Self::default()
        }
    }

    /// Check that tolerances are finite and every limit has `min <= max`.
    pub fn validate(&self) -> Result<()> {
        if !self.wrapper_tolerance.is_finite() || self.wrapper_tolerance < 0.0 {
            return Err(CellError::invalid_param(
                "wrapper_tolerance",
                self.wrapper_tolerance,
                "must be finite and non-negative",
            ));
        }
        if !self.points.is_ordered() {
            return Err(CellError::invalid_param(
                "points",
                format!("{:?}", self.points),
                "min exceeds max",
            ));
        }
        let ranges = [
            ("bounds_size", &self.bounds_size),
            ("area", &self.area),
            ("perimeter", &self.perimeter),
            ("segment_length", &self.segment_length),
            ("compactness", &self.compactness),
        ];
        for (name, limit) in ranges {
            if !limit.is_ordered() {
                return Err(CellError::invalid_param(
                    name,
                    format!("{:?}", limit),
                    "min exceeds max",
                ));
            }
        }
        Ok(())
    }
}

/// A face that did not become a cell.
#[derive(Debug, Clone, PartialEq)]
pub struct Rejection {
    /// The failed check.
    pub result: CellResult,
    /// The cell as far as it was built, when a polygon exists.
    pub cell: Option<Cell>,
}

impl Rejection {
    pub(crate) fn bare(result: CellResult) -> Self {
        Self { result, cell: None }
    }

    pub(crate) fn with_cell(result: CellResult, cell: Cell) -> Self {
        Self {
            result,
            cell: Some(cell),
        }
    }
}

/// Accepted cell or the reason the face was rejected.
pub type CellOutcome = std::result::Result<Cell, Rejection>;

/// The outcome of one face, as a [`CellResult`].
pub fn outcome_result(outcome: &CellOutcome) -> CellResult {
    match outcome {
        Ok(_) => CellResult::Success,
        Err(r) => r.result,
    }
}

/// Shared state of one extraction run.
#[derive(Debug)]
pub struct CellConstraints {
    config: CellConstraintsConfig,
    holes: Option<Arc<ProjectedPointSet>>,
    unique_start_half_edges: ShardedHashSet,
    unique_cells: ShardedHashSet,
    enumerator: Mutex<Option<Arc<FaceEnumerator>>>,
    wrapper: OnceLock<Option<Arc<Cell>>>,
}

impl CellConstraints {
    /// Create the run state for a validated configuration.
    pub fn new(config: CellConstraintsConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            holes: None,
            unique_start_half_edges: ShardedHashSet::new(),
            unique_cells: ShardedHashSet::new(),
            enumerator: Mutex::new(None),
            wrapper: OnceLock::new(),
        })
    }

    /// Reject faces containing any of these points.
    pub fn with_holes(mut self, holes: Arc<ProjectedPointSet>) -> Self {
        self.holes = Some(holes);
        self
    }

    /// The configuration.
    #[inline]
    pub fn config(&self) -> &CellConstraintsConfig {
        &self.config
    }

    /// The hole point set, if any.
    #[inline]
    pub fn holes(&self) -> Option<&Arc<ProjectedPointSet>> {
        self.holes.as_ref()
    }

    /// Pre-size the uniqueness sets for about `num_faces` faces.
    pub fn reserve(&self, num_faces: usize) {
        self.unique_start_half_edges.reserve(num_faces);
        self.unique_cells.reserve(num_faces);
    }

    /// Claim a starting half-edge. Returns `false` if it was already claimed.
    #[inline]
    pub fn claim_start_half_edge(&self, h: HalfEdgeId) -> bool {
        self.unique_start_half_edges.insert(h.raw() as u64)
    }

    /// Whether a starting half-edge has been claimed.
    #[inline]
    pub fn contains_start_half_edge(&self, h: HalfEdgeId) -> bool {
        self.unique_start_half_edges.contains(h.raw() as u64)
    }

    /// Register a cell hash. Returns `false` if it was already registered.
    #[inline]
    pub fn is_unique_cell_hash(&self, hash: u64) -> bool {
        self.unique_cells.insert(hash)
    }

    /// Whether a cell hash has been registered.
    #[inline]
    pub fn contains_cell_hash(&self, hash: u64) -> bool {
        self.unique_cells.contains(hash)
    }

    /// Number of registered cell hashes.
    pub fn num_unique_cells(&self) -> usize {
        self.unique_cells.len()
    }

    /// Forget every claimed half-edge and registered hash. The cached
    /// enumerator and wrapper are kept.
    pub fn reset(&self) {
        self.unique_start_half_edges.clear();
        self.unique_cells.clear();
    }

    /// Cache an enumerator for later [`get_or_build_enumerator`] calls.
    ///
    /// [`get_or_build_enumerator`]: CellConstraints::get_or_build_enumerator
    pub fn set_enumerator(&self, enumerator: Arc<FaceEnumerator>) {
        *self
            .enumerator
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(enumerator);
    }

    /// The cached enumerator, if any.
    pub fn enumerator(&self) -> Option<Arc<FaceEnumerator>> {
        self.enumerator
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Return the cached enumerator, or build one from `cluster` projected
    /// with `projection` and cache it.
    pub fn get_or_build_enumerator(
        &self,
        cluster: &Arc<Cluster>,
        projection: &Projection,
    ) -> Result<Arc<FaceEnumerator>> {
        let mut guard = self
            .enumerator
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if let Some(existing) = guard.as_ref() {
            return Ok(Arc::clone(existing));
        }
        let built = Arc::new(FaceEnumerator::from_projection(
            Arc::clone(cluster),
            projection,
        )?);
        *guard = Some(Arc::clone(&built));
        Ok(built)
    }

    /// Return the wrapper cell of `enumerator`, building and caching it on
    /// first use. `None` when the graph has no wrapper.
    pub fn get_or_build_wrapper(&self, enumerator: &FaceEnumerator) -> Option<Arc<Cell>> {
        self.wrapper
            .get_or_init(|| wrapper::build_wrapper_cell(enumerator, self).map(Arc::new))
            .clone()
    }

    /// The wrapper cell, if it has already been built.
    pub fn wrapper_cell(&self) -> Option<Arc<Cell>> {
        self.wrapper.get().and_then(Clone::clone)
    }

    /// Run every check except uniqueness on one walked face.
    ///
    /// `relaxed` builds the cell with [`CellConstraintsConfig::relaxed`] and
    /// skips holes and the wrapper comparison.
    pub(crate) fn evaluate(
        &self,
        cluster: &Cluster,
        positions: &[Point2<f64>],
        face: FaceId,
        raw_nodes: &[NodeId],
        closed: bool,
        relaxed: bool,
    ) -> CellOutcome {
        if raw_nodes.len() < 3 {
            return Err(Rejection::bare(CellResult::MalformedCluster));
        }
        if !closed {
            return Err(Rejection::bare(CellResult::OpenCell));
        }

        let config = if relaxed {
            self.config.relaxed()
        } else {
            self.config
        };

        let has_leaf = raw_nodes.iter().any(|&n| cluster.is_leaf(n));
        if has_leaf && !config.keep_cells_with_leaves {
            return Err(Rejection::bare(CellResult::Leaf));
        }

        let mut nodes = Vec::with_capacity(raw_nodes.len() * if has_leaf { 2 } else { 1 });
        for &n in raw_nodes {
            nodes.push(n);
            if config.duplicate_leaf_points && cluster.is_leaf(n) {
                nodes.push(n);
            }
        }
        let mut points: Vec<Point2<f64>> = nodes.iter().map(|n| positions[n.index()]).collect();

        let winding = Winding::from_signed_area(polygon::signed_area(&points));
        let wrong_winding = winding != config.winding;
        if wrong_winding && config.fix_winding {
            nodes.reverse();
            points.reverse();
        }

        let data = CellData::measure(cluster, &nodes, &points, closed, config.signed_area);
        let cell = Cell {
            hash: cell_hash(raw_nodes, config.opposite_winding_is_duplicate),
            nodes,
            polygon: points,
            face,
            data,
        };
        let reject = |result: CellResult, cell: Cell| Err(Rejection::with_cell(result, cell));

        if !relaxed {
            if let Some(holes) = &self.holes {
                if holes.any_inside(&cell.polygon, &cell.data.bounds_2d) {
                    return reject(CellResult::Hole, cell);
                }
            }
        }

        if !config.aspect.accepts(cell.data.is_convex) {
            return reject(CellResult::WrongAspect, cell);
        }

        if !config.points.contains(unique_count(raw_nodes)) {
            return reject(CellResult::OutsidePointsLimit, cell);
        }
        if !config.bounds_size.contains(cell.data.bounds.diagonal()) {
            return reject(CellResult::OutsideBoundsLimit, cell);
        }
        if !config.area.contains(cell.data.area) {
            return reject(CellResult::OutsideAreaLimit, cell);
        }
        if !config.perimeter.contains(cell.data.perimeter) {
            return reject(CellResult::OutsidePerimeterLimit, cell);
        }
        if !config.segment_length.is_unbounded() {
            // Measured on the walk itself; duplicated leaves add zero-length segments
            let walked: Vec<Point2<f64>> = raw_nodes.iter().map(|n| positions[n.index()]).collect();
            if !polygon::segment_lengths(&walked).all(|l| config.segment_length.contains(l)) {
                return reject(CellResult::OutsideSegmentsLimit, cell);
            }
        }
        if !config.compactness.contains(cell.data.compactness) {
            return reject(CellResult::OutsideCompactnessLimit, cell);
        }

        if wrong_winding && !config.fix_winding {
            return reject(CellResult::WrongAspect, cell);
        }

        if !relaxed && config.wrapper_tolerance > 0.0 {
            if let Some(wrapper) = self.wrapper_cell() {
                let delta = (cell.data.area.abs() - wrapper.data.area.abs()).abs();
                if delta <= config.wrapper_tolerance {
                    return reject(CellResult::WrapperCell, cell);
                }
            }
        }

        Ok(cell)
    }

    /// Register an evaluated cell's hash; `Duplicate` if already present.
    pub(crate) fn register(&self, outcome: CellOutcome) -> CellOutcome {
        match outcome {
            Ok(cell) if !self.is_unique_cell_hash(cell.hash) => {
                Err(Rejection::with_cell(CellResult::Duplicate, cell))
            }
            other => other,
        }
    }
}

fn unique_count(nodes: &[NodeId]) -> usize {
    let mut sorted = nodes.to_vec();
    sorted.sort_unstable();
    sorted.dedup();
    sorted.len()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{square_cluster, square_with_inner_tail, xy};

    fn ids(raw: &[usize]) -> Vec<NodeId> {
        raw.iter().map(|&i| NodeId::new(i)).collect()
    }

    fn constraints(config: CellConstraintsConfig) -> CellConstraints {
        CellConstraints::new(config).unwrap()
    }

    // Interior of the unit square as the half-edge walk traces it (clockwise)
    const CW_SQUARE: [usize; 4] = [1, 0, 3, 2];

    #[test]
    fn test_limit_contains() {
        let l = Limit::between(1.0, 2.0);
        assert!(l.contains(1.0));
        assert!(l.contains(2.0));
        assert!(!l.contains(2.5));
        assert!(Limit::<f64>::none().contains(f64::MAX));
        assert!(!Limit::at_least(3usize).contains(2));
        assert!(Limit::at_most(3usize).contains(2));
    }

    #[test]
    fn test_validate() {
        assert!(CellConstraintsConfig::default().validate().is_ok());
        let bad = CellConstraintsConfig::default().with_wrapper_tolerance(-1.0);
        assert!(matches!(
            CellConstraints::new(bad),
            Err(CellError::InvalidParameter { name: "wrapper_tolerance", .. })
        ));
        let bad = CellConstraintsConfig::default().with_area(Limit::between(5.0, 1.0));
        assert!(matches!(
            bad.validate(),
            Err(CellError::InvalidParameter { name: "area", .. })
        ));
    }

    #[test]
    fn test_evaluate_fixes_winding() {
        let cluster = square_cluster();
        let pos = xy(&cluster);
        let c = constraints(CellConstraintsConfig::default());
        let cell = c
            .evaluate(&cluster, &pos, FaceId::new(0), &ids(&CW_SQUARE), true, false)
            .unwrap();
        assert!(!cell.data.is_clockwise);
        assert_eq!(cell.nodes, ids(&[2, 3, 0, 1]));
        assert!((cell.data.area - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_evaluate_rejects_winding_when_not_fixing() {
        let cluster = square_cluster();
        let pos = xy(&cluster);
        let c = constraints(CellConstraintsConfig::default().reject_wrong_winding());
        let err = c
            .evaluate(&cluster, &pos, FaceId::new(0), &ids(&CW_SQUARE), true, false)
            .unwrap_err();
        assert_eq!(err.result, CellResult::WrongAspect);
        assert!(err.cell.is_some());

        let cw = constraints(
            CellConstraintsConfig::default()
                .with_winding(Winding::Clockwise)
                .reject_wrong_winding(),
        );
        assert!(cw
            .evaluate(&cluster, &pos, FaceId::new(0), &ids(&CW_SQUARE), true, false)
            .is_ok());
    }

    #[test]
    fn test_evaluate_malformed_and_open() {
        let cluster = square_cluster();
        let pos = xy(&cluster);
        let c = constraints(CellConstraintsConfig::default());
        let err = c
            .evaluate(&cluster, &pos, FaceId::new(0), &ids(&[0, 1]), true, false)
            .unwrap_err();
        assert_eq!(err.result, CellResult::MalformedCluster);
        let err = c
            .evaluate(&cluster, &pos, FaceId::new(0), &ids(&CW_SQUARE), false, false)
            .unwrap_err();
        assert_eq!(err.result, CellResult::OpenCell);
        assert!(err.cell.is_none());
    }

    #[test]
    fn test_range_order() {
        let cluster = square_cluster();
        let pos = xy(&cluster);
        let face = ids(&CW_SQUARE);
        let cases = [
            (
                CellConstraintsConfig::default().with_points(Limit::at_least(5)),
                CellResult::OutsidePointsLimit,
            ),
            (
                CellConstraintsConfig::default().with_bounds_size(Limit::at_most(1.0)),
                CellResult::OutsideBoundsLimit,
            ),
            (
                CellConstraintsConfig::default().with_area(Limit::at_least(2.0)),
                CellResult::OutsideAreaLimit,
            ),
            (
                CellConstraintsConfig::default().with_perimeter(Limit::at_most(3.0)),
                CellResult::OutsidePerimeterLimit,
            ),
            (
                CellConstraintsConfig::default().with_segment_length(Limit::at_least(1.5)),
                CellResult::OutsideSegmentsLimit,
            ),
            (
                CellConstraintsConfig::default().with_compactness(Limit::at_least(0.9)),
                CellResult::OutsideCompactnessLimit,
            ),
            (
                CellConstraintsConfig::default().with_aspect(AspectFilter::ConcaveOnly),
                CellResult::WrongAspect,
            ),
        ];
        for (config, expected) in cases {
            let c = constraints(config);
            let got = c.evaluate(&cluster, &pos, FaceId::new(0), &face, true, false);
            assert_eq!(outcome_result(&got), expected);
        }

        // Points limit is checked before area
        let c = constraints(
            CellConstraintsConfig::default()
                .with_points(Limit::at_most(3))
                .with_area(Limit::at_least(2.0)),
        );
        let got = c.evaluate(&cluster, &pos, FaceId::new(0), &face, true, false);
        assert_eq!(outcome_result(&got), CellResult::OutsidePointsLimit);
    }

    #[test]
    fn test_leaf_handling() {
        let cluster = square_with_inner_tail();
        let pos = xy(&cluster);
        // Interior walk passes 0 -> 4 -> 0
        let face = ids(&[1, 0, 4, 0, 3, 2]);

        let c = constraints(CellConstraintsConfig::default().omit_leaves());
        let got = c.evaluate(&cluster, &pos, FaceId::new(0), &face, true, false);
        assert_eq!(outcome_result(&got), CellResult::Leaf);

        let c = constraints(CellConstraintsConfig::default().with_duplicate_leaf_points(true));
        let cell = c
            .evaluate(&cluster, &pos, FaceId::new(0), &face, true, false)
            .unwrap();
        assert_eq!(cell.len(), 7);
        assert_eq!(cell.polygon.len(), 7);
        assert_eq!(cell.hash, cell_hash(&face, false));
    }

    #[test]
    fn test_segment_limit_ignores_duplicated_leaves() {
        let cluster = square_with_inner_tail();
        let pos = xy(&cluster);
        let face = ids(&[1, 0, 4, 0, 3, 2]);
        let limit = Limit::at_least(0.1);

        for duplicate in [false, true] {
            let c = constraints(
                CellConstraintsConfig::default()
                    .with_segment_length(limit)
                    .with_duplicate_leaf_points(duplicate),
            );
            let got = c.evaluate(&cluster, &pos, FaceId::new(0), &face, true, false);
            assert_eq!(outcome_result(&got), CellResult::Success, "duplicate = {duplicate}");
        }

        // The tail itself is still measured
        let c = constraints(
            CellConstraintsConfig::default()
                .with_segment_length(Limit::at_least(0.6))
                .with_duplicate_leaf_points(true),
        );
        let got = c.evaluate(&cluster, &pos, FaceId::new(0), &face, true, false);
        assert_eq!(outcome_result(&got), CellResult::OutsideSegmentsLimit);
    }

    #[test]
    fn test_enumerator_cache() {
        let cluster = Arc::new(square_cluster());
        let c = constraints(CellConstraintsConfig::default());
        assert!(c.enumerator().is_none());

        let first = c.get_or_build_enumerator(&cluster, &Projection::xy()).unwrap();
        let second = c.get_or_build_enumerator(&cluster, &Projection::xy()).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert!(first.is_built());

        let other = Arc::new(FaceEnumerator::from_projection(Arc::clone(&cluster), &Projection::xy()).unwrap());
        c.set_enumerator(Arc::clone(&other));
        let cached = c.get_or_build_enumerator(&cluster, &Projection::xy()).unwrap();
        assert!(Arc::ptr_eq(&cached, &other));
        assert!(!Arc::ptr_eq(&cached, &first));
        assert!(Arc::ptr_eq(&c.enumerator().unwrap(), &other));

        // reset keeps the cached enumerator
        c.reset();
        assert!(c.enumerator().is_some());
    }

    #[test]
    fn test_hole_rejects() {
        let cluster = square_cluster();
        let pos = xy(&cluster);
        let holes = Arc::new(ProjectedPointSet::from_2d(vec![Point2::new(0.5, 0.5)]));
        let c = constraints(CellConstraintsConfig::default()).with_holes(holes);
        let got = c.evaluate(&cluster, &pos, FaceId::new(0), &ids(&CW_SQUARE), true, false);
        assert_eq!(outcome_result(&got), CellResult::Hole);

        // Relaxed evaluation ignores holes
        let got = c.evaluate(&cluster, &pos, FaceId::new(0), &ids(&CW_SQUARE), true, true);
        assert!(got.is_ok());
    }

    #[test]
    fn test_register_duplicates() {
        let cluster = square_cluster();
        let pos = xy(&cluster);
        let c = constraints(CellConstraintsConfig::default());
        let face = ids(&CW_SQUARE);
        let first = c.register(c.evaluate(&cluster, &pos, FaceId::new(0), &face, true, false));
        assert_eq!(outcome_result(&first), CellResult::Success);
        let rotated = ids(&[3, 2, 1, 0]);
        let second = c.register(c.evaluate(&cluster, &pos, FaceId::new(0), &rotated, true, false));
        assert_eq!(outcome_result(&second), CellResult::Duplicate);

        c.reset();
        assert_eq!(c.num_unique_cells(), 0);
        assert!(c.claim_start_half_edge(HalfEdgeId::new(3)));
        assert!(!c.claim_start_half_edge(HalfEdgeId::new(3)));
        assert!(c.contains_start_half_edge(HalfEdgeId::new(3)));
    }

    #[test]
    fn test_relaxed_keeps_shape_settings() {
        let config = CellConstraintsConfig::default()
            .with_winding(Winding::Clockwise)
            .with_duplicate_leaf_points(true)
            .omit_leaves()
            .with_area(Limit::at_least(100.0));
        let relaxed = config.relaxed();
        assert_eq!(relaxed.winding, Winding::Clockwise);
        assert!(relaxed.duplicate_leaf_points);
        assert!(relaxed.keep_cells_with_leaves);
        assert!(relaxed.area.is_unbounded());
    }
}
