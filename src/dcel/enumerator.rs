//! Face enumeration over a half-edge set.
//!
//! A [`FaceEnumerator`] owns the half-edges of one projected graph. The raw
//! face table, the wrapper face and the adjacency maps are computed on first
//! use and cached, so a single enumerator can be shared behind an [`Arc`] by
//! every consumer of the same projected graph.

use std::sync::{Arc, Mutex, OnceLock, PoisonError};

use nalgebra::Point2;
use rayon::prelude::*;
use rustc_hash::{FxHashMap, FxHashSet};

use super::halfedge::{HalfEdge, HalfEdgeSet};
use crate::cells::constraints::{outcome_result, CellOutcome, Rejection};
use crate::cells::triage::{classify_bounds, TriageResult};
use crate::cells::{wrapper, Cell, CellConstraints, CellResult};
use crate::error::{CellError, Result};
use crate::geom::{polygon, Bounds2};
use crate::graph::{Cluster, FaceId, HalfEdgeId, NodeId, Projection};
use crate::progress::Progress;

/// Below this many faces, cells are built on the calling thread.
pub const PARALLEL_THRESHOLD: usize = 32;

/// One cycle of half-edges joined by `next`.
#[derive(Debug, Clone, PartialEq)]
pub struct RawFace {
    /// Origin of each half-edge, in walk order.
    pub nodes: Vec<NodeId>,
    /// The half-edges of the cycle, in walk order.
    pub half_edges: Vec<HalfEdgeId>,
    /// The walk returned to its first half-edge.
    pub closed: bool,
}

impl RawFace {
    /// Number of half-edges in the cycle.
    #[inline]
    pub fn len(&self) -> usize {
        self.half_edges.len()
    }

    /// Whether the cycle is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.half_edges.is_empty()
    }

    /// The half-edge the walk started from.
    #[inline]
    pub fn start(&self) -> HalfEdgeId {
        self.half_edges.first().copied().unwrap_or_default()
    }
}

#[derive(Debug, Default)]
struct FaceTable {
    faces: Vec<RawFace>,
    face_of: Vec<FaceId>,
    signed_areas: Vec<f64>,
}

/// Faces that share at least one edge.
///
/// Neighbor lists are sorted by face id. A face is never its own neighbor.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AdjacencyMap {
    neighbors: Vec<Vec<FaceId>>,
}

impl AdjacencyMap {
    /// Neighbors of `face`, empty for an excluded or unknown face.
    pub fn neighbors(&self, face: FaceId) -> &[FaceId] {
        self.neighbors
            .get(face.index())
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Whether `a` and `b` share an edge.
    pub fn are_adjacent(&self, a: FaceId, b: FaceId) -> bool {
        self.neighbors(a).binary_search(&b).is_ok()
    }

    /// Number of faces covered.
    pub fn len(&self) -> usize {
        self.neighbors.len()
    }

    /// Whether the map covers no face.
    pub fn is_empty(&self) -> bool {
        self.neighbors.is_empty()
    }
}

/// The face containing a seed and how its bounds relate to a filter box.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeedClassification {
    /// The smallest bounded face containing the seed.
    pub face: FaceId,
    /// Position of that face's bounds relative to the filter.
    pub triage: TriageResult,
}

/// Options for [`FaceEnumerator::enumerate_faces`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EnumerateOptions {
    /// Build cells with rayon above [`PARALLEL_THRESHOLD`] faces (default: true).
    pub parallel: bool,
    /// Emit the wrapper cell instead of rejecting its face (default: false).
    pub include_wrapper: bool,
    /// Keep rejected cells whose polygon was built (default: false).
    pub collect_failed: bool,
}

impl Default for EnumerateOptions {
    fn default() -> Self {
        Self {
            parallel: true,
            include_wrapper: false,
            collect_failed: false,
        }
    }
}

impl EnumerateOptions {
    /// Set whether to use parallel execution.
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Create options for single-threaded execution.
    pub fn sequential(mut self) -> Self {
        self.parallel = false;
        self
    }

    /// Emit the wrapper cell with the other cells.
    pub fn with_wrapper(mut self, include: bool) -> Self {
        self.include_wrapper = include;
        self
    }

    /// Keep rejected cells.
    pub fn with_failed(mut self, collect: bool) -> Self {
        self.collect_failed = collect;
        self
    }
}

/// Result of enumerating every face of a graph.
#[derive(Debug, Clone, Default)]
pub struct FaceEnumeration {
    /// Accepted cells, in face order.
    pub cells: Vec<Cell>,
    /// One result per raw face, indexed by face id.
    pub results: Vec<CellResult>,
    /// Rejected cells with a built polygon, when requested.
    pub failed: Vec<Cell>,
}

impl FaceEnumeration {
    /// Number of faces that ended with `result`.
    pub fn count(&self, result: CellResult) -> usize {
        self.results.iter().filter(|&&r| r == result).count()
    }
}

/// Signed area, snapped to zero when it is negligible against the face size.
fn snapped_area(points: &[Point2<f64>]) -> f64 {
    let area = polygon::signed_area(points);
    let diagonal = Bounds2::from_points(points).diagonal();
    if area.abs() <= 1e-12 * diagonal * diagonal {
        0.0
    } else {
        area
    }
}

/// Build an enumerator and its half-edges in one call.
///
/// # Example
/// ```
/// use std::sync::Arc;
/// use cellwalk::prelude::*;
/// use nalgebra::{Point2, Point3};
///
/// let positions = vec![
///     Point3::new(0.0, 0.0, 0.0),
///     Point3::new(1.0, 0.0, 0.0),
///     Point3::new(1.0, 1.0, 0.0),
///     Point3::new(0.0, 1.0, 0.0),
/// ];
/// let cluster = Arc::new(Cluster::from_edges(&positions, &[[0, 1], [1, 2], [2, 3], [3, 0]]).unwrap());
/// let projected: Vec<Point2<f64>> = positions.iter().map(|p| Point2::new(p.x, p.y)).collect();
///
/// let enumerator = build_enumerator(cluster, projected).unwrap();
/// let constraints = CellConstraints::new(CellConstraintsConfig::default()).unwrap();
/// let found = enumerator.enumerate_all_faces(&constraints);
///
/// assert_eq!(found.cells.len(), 1);
/// assert!((found.cells[0].data.area - 1.0).abs() < 1e-12);
/// ```
pub fn build_enumerator(
    cluster: Arc<Cluster>,
    positions: Vec<Point2<f64>>,
) -> Result<FaceEnumerator> {
    let mut enumerator = FaceEnumerator::new(cluster, positions)?;
    enumerator.build();
    Ok(enumerator)
}

/// Planar face enumerator over one projected graph.
#[derive(Debug)]
pub struct FaceEnumerator {
    cluster: Arc<Cluster>,
    positions: Vec<Point2<f64>>,
    half_edges: HalfEdgeSet,
    built: bool,
    faces: OnceLock<FaceTable>,
    wrapper: OnceLock<Option<FaceId>>,
    adjacency: Mutex<FxHashMap<Option<FaceId>, Arc<AdjacencyMap>>>,
}

impl FaceEnumerator {
    /// Create an unbuilt enumerator. `positions` holds one projected position
    /// per node.
    pub fn new(cluster: Arc<Cluster>, positions: Vec<Point2<f64>>) -> Result<Self> {
        if positions.len() != cluster.num_nodes() {
            return Err(CellError::ProjectionMismatch {
                expected: cluster.num_nodes(),
                found: positions.len(),
            });
        }
        Ok(Self {
            cluster,
            positions,
            half_edges: HalfEdgeSet::default(),
            built: false,
            faces: OnceLock::new(),
            wrapper: OnceLock::new(),
            adjacency: Mutex::new(FxHashMap::default()),
        })
    }

    /// Project the cluster's node positions and build.
    pub fn from_projection(cluster: Arc<Cluster>, projection: &Projection) -> Result<Self> {
        let positions = projection.project_cluster(&cluster);
        build_enumerator(cluster, positions)
    }

    /// Build the half-edges. Does nothing when already built or when the
    /// graph has no valid edge.
    pub fn build(&mut self) {
        if self.built {
            return;
        }
        if self.cluster.num_valid_edges() == 0 {
            log::debug!("enumerator: no valid edge, nothing to build");
            return;
        }
        self.half_edges = HalfEdgeSet::build(&self.cluster, &self.positions);
        self.faces = OnceLock::new();
        self.wrapper = OnceLock::new();
        self.adjacency
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
        self.built = true;
    }

    /// Whether half-edges exist.
    #[inline]
    pub fn is_built(&self) -> bool {
        self.built
    }

    /// The source graph.
    #[inline]
    pub fn cluster(&self) -> &Cluster {
        &self.cluster
    }

    /// Projected node positions, indexed by node.
    #[inline]
    pub fn positions(&self) -> &[Point2<f64>] {
        &self.positions
    }

    /// Projected position of one node.
    #[inline]
    pub fn position(&self, node: NodeId) -> Point2<f64> {
        self.positions[node.index()]
    }

    /// The half-edge set.
    #[inline]
    pub fn half_edges(&self) -> &HalfEdgeSet {
        &self.half_edges
    }

    /// Half-edge by index.
    #[inline]
    pub fn half_edge(&self, h: HalfEdgeId) -> &HalfEdge {
        self.half_edges.get(h)
    }

    /// Number of half-edges.
    #[inline]
    pub fn num_half_edges(&self) -> usize {
        self.half_edges.len()
    }

    /// The half-edge from `origin` to `target`.
    #[inline]
    pub fn half_edge_between(&self, origin: NodeId, target: NodeId) -> Option<HalfEdgeId> {
        self.half_edges.find(origin, target)
    }

    /// Follow `next` from `start` until the walk returns to it.
    ///
    /// The walk stops early (not closed) on an unwired half-edge, or after
    /// visiting as many half-edges as exist.
    pub fn walk_face(&self, start: HalfEdgeId) -> RawFace {
        let mut face = RawFace {
            nodes: Vec::new(),
            half_edges: Vec::new(),
            closed: false,
        };
        let mut current = start;
        for _ in 0..self.half_edges.len() {
            if !current.is_valid() {
                break;
            }
            face.nodes.push(self.half_edges.get(current).origin);
            face.half_edges.push(current);
            current = self.half_edges.next(current);
            if current == start {
                face.closed = true;
                break;
            }
        }
        face
    }

    fn face_table(&self) -> &FaceTable {
        self.faces.get_or_init(|| {
            let n = self.half_edges.len();
            let mut table = FaceTable {
                faces: Vec::new(),
                face_of: vec![FaceId::invalid(); n],
                signed_areas: Vec::new(),
            };

            for start in self.half_edges.ids() {
                if table.face_of[start.index()].is_valid() {
                    continue;
                }
                let id = FaceId::new(table.faces.len());
                let mut face = RawFace {
                    nodes: Vec::new(),
                    half_edges: Vec::new(),
                    closed: false,
                };
                let mut current = start;
                loop {
                    if !current.is_valid() {
                        break;
                    }
                    if table.face_of[current.index()].is_valid() {
                        face.closed = current == start;
                        break;
                    }
                    table.face_of[current.index()] = id;
                    face.nodes.push(self.half_edges.get(current).origin);
                    face.half_edges.push(current);
                    current = self.half_edges.next(current);
                }
                if !face.closed {
                    log::warn!("face {:?} starting at {:?} did not close", id, start);
                }

                let points = self.face_points(&face);
                table.signed_areas.push(snapped_area(&points));
                table.faces.push(face);
            }

            log::debug!(
                "walked {} face(s) over {} half-edges",
                table.faces.len(),
                n
            );
            table
        })
    }

    /// Every face of the graph, indexed by face id.
    pub fn raw_faces(&self) -> &[RawFace] {
        &self.face_table().faces
    }

    /// Number of faces.
    pub fn num_faces(&self) -> usize {
        self.face_table().faces.len()
    }

    /// One face.
    pub fn raw_face(&self, face: FaceId) -> &RawFace {
        &self.face_table().faces[face.index()]
    }

    /// The face a half-edge belongs to.
    pub fn face_of(&self, h: HalfEdgeId) -> FaceId {
        self.face_table()
            .face_of
            .get(h.index())
            .copied()
            .unwrap_or_default()
    }

    /// Shoelace signed area of a face over the projected positions.
    pub fn face_signed_area(&self, face: FaceId) -> f64 {
        self.face_table().signed_areas[face.index()]
    }

    /// The unbounded outer face: largest positive signed area, lowest id on
    /// ties. `None` when no face has positive area.
    pub fn wrapper_face_index(&self) -> Option<FaceId> {
        *self.wrapper.get_or_init(|| {
            let table = self.face_table();
            wrapper::select_wrapper(
                table
                    .faces
                    .iter()
                    .zip(&table.signed_areas)
                    .enumerate()
                    .filter(|(_, (f, _))| f.closed && f.len() >= 3)
                    .map(|(i, (_, &area))| (FaceId::new(i), area)),
            )
        })
    }

    /// The smallest bounded face containing `point`.
    ///
    /// Only closed faces with at least three nodes and negative signed area
    /// (bounded faces) are considered; the wrapper never matches.
    pub fn find_face_containing(&self, point: &Point2<f64>) -> Option<FaceId> {
        let table = self.face_table();
        let wrapper = self.wrapper_face_index();
        let mut best: Option<(FaceId, f64)> = None;

        for (i, face) in table.faces.iter().enumerate() {
            let id = FaceId::new(i);
            let area = table.signed_areas[i];
            if Some(id) == wrapper || !face.closed || face.len() < 3 || area >= 0.0 {
                continue;
            }
            if best.is_some_and(|(_, best_area)| -area >= best_area) {
                continue;
            }
            let points = self.face_points(face);
            if Bounds2::from_points(&points).contains_point(point)
                && polygon::point_in_polygon(point, &points)
            {
                best = Some((id, -area));
            }
        }
        best.map(|(id, _)| id)
    }

    fn face_points(&self, face: &RawFace) -> Vec<Point2<f64>> {
        face.nodes.iter().map(|n| self.positions[n.index()]).collect()
    }

    /// Whether a face is part of the outer boundary: the wrapper face, or,
    /// when the graph has no positive face, any closed zero-area walk.
    fn is_outer_face(&self, face: FaceId, wrapper: Option<FaceId>) -> bool {
        match wrapper {
            Some(w) => w == face,
            None => {
                let raw = self.raw_face(face);
                raw.closed && raw.len() >= 3 && self.face_signed_area(face) == 0.0
            }
        }
    }

    /// Faces sharing an edge, skipping `exclude`. Cached per exclusion.
    pub fn get_or_build_adjacency_map(&self, exclude: Option<FaceId>) -> Arc<AdjacencyMap> {
        if let Some(map) = self
            .adjacency
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&exclude)
        {
            return Arc::clone(map);
        }

        // Built outside the lock; a concurrent builder produces the same map
        let table = self.face_table();
        let mut sets: Vec<FxHashSet<FaceId>> = vec![FxHashSet::default(); table.faces.len()];
        for h in self.half_edges.ids() {
            let a = table.face_of[h.index()];
            let b = table.face_of[self.half_edges.twin(h).index()];
            if !a.is_valid() || !b.is_valid() || a == b {
                continue;
            }
            if Some(a) == exclude || Some(b) == exclude {
                continue;
            }
            sets[a.index()].insert(b);
        }
        let neighbors = sets
            .into_iter()
            .map(|s| {
                let mut v: Vec<FaceId> = s.into_iter().collect();
                v.sort_unstable();
                v
            })
            .collect();
        let map = Arc::new(AdjacencyMap { neighbors });

        let mut cache = self
            .adjacency
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        Arc::clone(cache.entry(exclude).or_insert(map))
    }

    /// Locate the face containing `seed` and classify its bounds against
    /// `filter`.
    pub fn classify_seed(&self, seed: &Point2<f64>, filter: &Bounds2) -> Option<SeedClassification> {
        let face = self.find_face_containing(seed)?;
        let bounds = Bounds2::from_points(&self.face_points(self.raw_face(face)));
        Some(SeedClassification {
            face,
            triage: classify_bounds(&bounds, filter),
        })
    }

    /// Apply the full acceptance pipeline to one face, registering the cell
    /// hash on success.
    pub fn build_cell_from_face(&self, face: FaceId, constraints: &CellConstraints) -> CellOutcome {
        let raw = self.raw_face(face);
        constraints.register(self.evaluate_face(face, raw, constraints))
    }

    /// Claim `start`, walk its face and build a cell from it.
    ///
    /// A half-edge that was already claimed yields `Duplicate`.
    pub fn build_cell_from_half_edge(
        &self,
        start: HalfEdgeId,
        constraints: &CellConstraints,
    ) -> CellOutcome {
        if !constraints.claim_start_half_edge(start) {
            return Err(Rejection::bare(CellResult::Duplicate));
        }
        let face = self.face_of(start);
        let raw = self.walk_face(start);
        constraints.register(self.evaluate_face(face, &raw, constraints))
    }

    fn evaluate_face(
        &self,
        face: FaceId,
        raw: &RawFace,
        constraints: &CellConstraints,
    ) -> CellOutcome {
        constraints.evaluate(
            &self.cluster,
            &self.positions,
            face,
            &raw.nodes,
            raw.closed,
            false,
        )
    }

    /// Enumerate every face with default options.
    pub fn enumerate_all_faces(&self, constraints: &CellConstraints) -> FaceEnumeration {
        self.enumerate_faces(constraints, &EnumerateOptions::default())
    }

    /// Enumerate every face.
    pub fn enumerate_faces(
        &self,
        constraints: &CellConstraints,
        options: &EnumerateOptions,
    ) -> FaceEnumeration {
        self.enumerate_faces_with_progress(constraints, options, &Progress::none())
    }

    /// Enumerate every face, reporting progress.
    ///
    /// Cells are evaluated independently (in parallel when enabled), then
    /// claimed and registered in face order, so the accepted set does not
    /// depend on the number of workers.
    ///
    /// Only the wrapper face is skipped as outer boundary when one exists.
    /// Tree components disconnected from it then walk zero-area faces that
    /// are evaluated like any other face and can be accepted with area 0.
    pub fn enumerate_faces_with_progress(
        &self,
        constraints: &CellConstraints,
        options: &EnumerateOptions,
        progress: &Progress,
    ) -> FaceEnumeration {
        const STAGES: usize = 3;
        const MESSAGE: &str = "Enumerating faces";

        let mut out = FaceEnumeration::default();
        if !self.built {
            return out;
        }

        progress.report_stage(0, 1, 0, STAGES, MESSAGE);
        let faces = self.raw_faces();
        let num_faces = faces.len();
        constraints.reserve(num_faces);

        let wrapper_face = self.wrapper_face_index();
        let wrapper_cell = if options.include_wrapper || constraints.config().wrapper_tolerance > 0.0 {
            constraints.get_or_build_wrapper(self)
        } else {
            None
        };
        progress.report_stage(1, 1, 0, STAGES, MESSAGE);

        let evaluate = |i: usize| -> Option<CellOutcome> {
            let id = FaceId::new(i);
            if self.is_outer_face(id, wrapper_face) {
                return None;
            }
            Some(self.evaluate_face(id, &faces[i], constraints))
        };
        let evaluated: Vec<Option<CellOutcome>> = if options.parallel && num_faces >= PARALLEL_THRESHOLD {
            (0..num_faces).into_par_iter().map(evaluate).collect()
        } else {
            (0..num_faces).map(evaluate).collect()
        };
        progress.report_stage(1, 1, 1, STAGES, MESSAGE);

        out.results = Vec::with_capacity(num_faces);
        let mut wrapper_emitted = false;
        for (i, outcome) in evaluated.into_iter().enumerate() {
            let Some(outcome) = outcome else {
                match (&wrapper_cell, options.include_wrapper && !wrapper_emitted) {
                    (Some(cell), true) => {
                        out.cells.push(Cell::clone(cell));
                        out.results.push(CellResult::Success);
                        wrapper_emitted = true;
                    }
                    _ => out.results.push(CellResult::WrapperCell),
                }
                continue;
            };

            let outcome = if constraints.claim_start_half_edge(faces[i].start()) {
                constraints.register(outcome)
            } else {
                Err(Rejection {
                    result: CellResult::Duplicate,
                    cell: outcome.ok(),
                })
            };
            let result = outcome_result(&outcome);
            if result != CellResult::Success {
                log::trace!("face {} rejected: {}", i, result);
            }
            out.results.push(result);
            match outcome {
                Ok(cell) => out.cells.push(cell),
                Err(Rejection {
                    cell: Some(cell), ..
                }) if options.collect_failed => out.failed.push(cell),
                Err(_) => {}
            }
            if i % 1024 == 0 {
                progress.report_stage(i, num_faces, 2, STAGES, MESSAGE);
            }
        }
        progress.report(STAGES * 1000, STAGES * 1000, MESSAGE);

        log::debug!(
            "enumerated {} face(s): {} cell(s) accepted",
            num_faces,
            out.cells.len()
        );
        out
    }
}
