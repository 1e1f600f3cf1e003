//! Extracted cells: node sequence, polygon, metrics and the result taxonomy.

use std::fmt;

use nalgebra::{Point2, Point3};

use crate::geom::{polygon, Bounds2, Bounds3};
use crate::graph::{Cluster, FaceId, NodeId};

/// Outcome of trying to turn one face into a cell.
///
/// Every variant other than [`CellResult::Success`] names the first check the
/// face failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum CellResult {
    /// Not evaluated.
    #[default]
    Unknown,
    /// Accepted.
    Success,
    /// Same node cycle (or start half-edge) already accepted.
    Duplicate,
    /// Visits a leaf node while leaves are not kept.
    Leaf,
    /// Contains a hole point.
    Hole,
    /// Convexity or winding does not match the configuration.
    WrongAspect,
    /// Unique node count outside the points limit.
    OutsidePointsLimit,
    /// Bounds diagonal outside the bounds limit.
    OutsideBoundsLimit,
    /// Area outside the area limit.
    OutsideAreaLimit,
    /// Perimeter outside the perimeter limit.
    OutsidePerimeterLimit,
    /// Compactness outside the compactness limit.
    OutsideCompactnessLimit,
    /// A segment length outside the segment limit.
    OutsideSegmentsLimit,
    /// The face walk did not return to its start.
    OpenCell,
    /// The face is (or matches) the unbounded outer face.
    WrapperCell,
    /// Fewer than three nodes.
    MalformedCluster,
}

impl CellResult {
    /// Whether the face was accepted.
    #[inline]
    pub fn is_success(self) -> bool {
        self == CellResult::Success
    }

    /// All variants, in declaration order.
    pub const ALL: [CellResult; 15] = [
        CellResult::Unknown,
        CellResult::Success,
        CellResult::Duplicate,
        CellResult::Leaf,
        CellResult::Hole,
        CellResult::WrongAspect,
        CellResult::OutsidePointsLimit,
        CellResult::OutsideBoundsLimit,
        CellResult::OutsideAreaLimit,
        CellResult::OutsidePerimeterLimit,
        CellResult::OutsideCompactnessLimit,
        CellResult::OutsideSegmentsLimit,
        CellResult::OpenCell,
        CellResult::WrapperCell,
        CellResult::MalformedCluster,
    ];
}

impl fmt::Display for CellResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            CellResult::Unknown => "unknown",
            CellResult::Success => "success",
            CellResult::Duplicate => "duplicate",
            CellResult::Leaf => "leaf",
            CellResult::Hole => "hole",
            CellResult::WrongAspect => "wrong aspect",
            CellResult::OutsidePointsLimit => "outside points limit",
            CellResult::OutsideBoundsLimit => "outside bounds limit",
            CellResult::OutsideAreaLimit => "outside area limit",
            CellResult::OutsidePerimeterLimit => "outside perimeter limit",
            CellResult::OutsideCompactnessLimit => "outside compactness limit",
            CellResult::OutsideSegmentsLimit => "outside segments limit",
            CellResult::OpenCell => "open cell",
            CellResult::WrapperCell => "wrapper cell",
            CellResult::MalformedCluster => "malformed cluster",
        };
        f.write_str(s)
    }
}

/// Geometric summary of a cell.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CellData {
    /// Bounds of the node positions in world space.
    pub bounds: Bounds3,
    /// Bounds of the projected polygon.
    pub bounds_2d: Bounds2,
    /// Mean node position in world space.
    pub centroid: Point3<f64>,
    /// Mean polygon vertex.
    pub centroid_2d: Point2<f64>,
    /// Polygon area; signed or absolute depending on configuration.
    pub area: f64,
    /// Closed polygon length.
    pub perimeter: f64,
    /// `4π|A|/P²`, at most 1.
    pub compactness: f64,
    /// Every turn of the polygon has the same sign.
    pub is_convex: bool,
    /// The polygon, as stored, has negative signed area.
    pub is_clockwise: bool,
    /// The face walk returned to its starting half-edge.
    pub is_closed_loop: bool,
}

impl CellData {
    /// Measure a node sequence and its projected polygon.
    pub fn measure(
        cluster: &Cluster,
        nodes: &[NodeId],
        polygon: &[Point2<f64>],
        closed: bool,
        signed_area: bool,
    ) -> Self {
        let info = polygon::PolygonInfo::compute(polygon);

        let mut bounds = Bounds3::empty();
        let mut sum = nalgebra::Vector3::zeros();
        for &n in nodes {
            let p = cluster.position(n);
            bounds.extend(&p);
            sum += p.coords;
        }
        let centroid = if nodes.is_empty() {
            Point3::origin()
        } else {
            Point3::from(sum / nodes.len() as f64)
        };

        Self {
            bounds,
            bounds_2d: Bounds2::from_points(polygon),
            centroid,
            centroid_2d: polygon::vertex_centroid(polygon).unwrap_or_else(Point2::origin),
            area: if signed_area {
                info.signed_area
            } else {
                info.signed_area.abs()
            },
            perimeter: info.perimeter,
            compactness: info.compactness,
            is_convex: info.convex,
            is_clockwise: info.signed_area < 0.0,
            is_closed_loop: closed,
        }
    }
}

/// A closed region of the planar graph.
#[derive(Debug, Clone, PartialEq)]
pub struct Cell {
    /// Node sequence around the cell. Leaf nodes may appear twice in a row
    /// when leaf duplication is enabled.
    pub nodes: Vec<NodeId>,
    /// Projected polygon, one point per entry of `nodes`.
    pub polygon: Vec<Point2<f64>>,
    /// The face this cell was built from. Invalid for the tree-walk wrapper.
    pub face: FaceId,
    /// Content hash of the node cycle.
    pub hash: u64,
    /// Metrics.
    pub data: CellData,
}

impl Cell {
    /// Number of entries in the node sequence.
    #[inline]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the node sequence is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Whether `p` lies inside the cell polygon.
    pub fn contains_point(&self, p: &Point2<f64>) -> bool {
        self.data.bounds_2d.contains_point(p) && polygon::point_in_polygon(p, &self.polygon)
    }

    /// Lengths of the polygon segments, closing segment last.
    pub fn segment_lengths(&self) -> impl Iterator<Item = f64> + '_ {
        polygon::segment_lengths(&self.polygon)
    }
}

/// Canonical form of a node cycle: the lexicographically smallest rotation
/// that starts at the minimum node.
pub fn canonical_cycle(nodes: &[NodeId]) -> Vec<NodeId> {
    let Some(&min) = nodes.iter().min() else {
        return Vec::new();
    };
    let n = nodes.len();
    let rotation = |start: usize| (0..n).map(move |i| nodes[(start + i) % n]);

    let mut best = 0;
    let mut first = true;
    for start in (0..n).filter(|&i| nodes[i] == min) {
        if first || rotation(start).lt(rotation(best)) {
            best = start;
            first = false;
        }
    }
    rotation(best).collect()
}

/// Stable hash of a node cycle, independent of its starting node.
///
/// When `ignore_direction` is set, a cycle and its reverse hash the same.
pub fn cell_hash(nodes: &[NodeId], ignore_direction: bool) -> u64 {
    let forward = canonical_cycle(nodes);
    if !ignore_direction {
        return stable_hash(&forward);
    }
    let reversed: Vec<NodeId> = nodes.iter().rev().copied().collect();
    let backward = canonical_cycle(&reversed);
    stable_hash(forward.min(backward).as_slice())
}

/// FNV-style polynomial hash with a final avalanche.
fn stable_hash(nodes: &[NodeId]) -> u64 {
    const HASH_PRIME: u64 = 1_099_511_628_211;
    const HASH_OFFSET: u64 = 14_695_981_039_346_656_037;

    if nodes.is_empty() {
        return 0;
    }
    let mut hash = HASH_OFFSET;
    for n in nodes {
        hash = hash.wrapping_mul(HASH_PRIME).wrapping_add(n.raw() as u64);
    }
    hash ^= hash >> 33;
    hash = hash.wrapping_mul(0xff51_afd7_ed55_8ccd);
    hash ^= hash >> 33;
    hash = hash.wrapping_mul(0xc4ce_b9fe_1a85_ec53);
    hash ^= hash >> 33;
    hash
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{square_cluster, xy};
    use approx::assert_relative_eq;
    use std::f64::consts::PI;

    fn ids(raw: &[usize]) -> Vec<NodeId> {
        raw.iter().map(|&i| NodeId::new(i)).collect()
    }

    #[test]
    fn test_canonical_rotation() {
        assert_eq!(canonical_cycle(&ids(&[2, 3, 0, 1])), ids(&[0, 1, 2, 3]));
        // Node 0 appears twice; the smaller continuation wins
        assert_eq!(canonical_cycle(&ids(&[0, 5, 0, 4])), ids(&[0, 4, 0, 5]));
        assert!(canonical_cycle(&[]).is_empty());
    }

    #[test]
    fn test_hash_ignores_rotation() {
        let a = cell_hash(&ids(&[1, 2, 3, 4]), false);
        let b = cell_hash(&ids(&[3, 4, 1, 2]), false);
        assert_eq!(a, b);
    }

    #[test]
    fn test_hash_direction() {
        let fwd = ids(&[1, 2, 3, 4]);
        let rev = ids(&[4, 3, 2, 1]);
        assert_ne!(cell_hash(&fwd, false), cell_hash(&rev, false));
        assert_eq!(cell_hash(&fwd, true), cell_hash(&rev, true));
    }

    #[test]
    fn test_measure_unit_square() {
        let cluster = square_cluster();
        let positions = xy(&cluster);
        let nodes = ids(&[0, 1, 2, 3]);
        let polygon: Vec<_> = nodes.iter().map(|n| positions[n.index()]).collect();

        let data = CellData::measure(&cluster, &nodes, &polygon, true, false);
        assert_relative_eq!(data.area, 1.0);
        assert_relative_eq!(data.perimeter, 4.0);
        assert_relative_eq!(data.compactness, PI / 4.0, epsilon = 1e-12);
        assert!(data.is_convex);
        assert!(!data.is_clockwise);
        assert!(data.is_closed_loop);
        assert_eq!(data.centroid, Point3::new(0.5, 0.5, 0.0));
        assert_relative_eq!(data.bounds.diagonal(), 2f64.sqrt());

        let mut reversed = polygon.clone();
        reversed.reverse();
        let data = CellData::measure(&cluster, &nodes, &reversed, true, true);
        assert_relative_eq!(data.area, -1.0);
        assert!(data.is_clockwise);
    }

    #[test]
    fn test_result_display() {
        assert_eq!(CellResult::OutsideAreaLimit.to_string(), "outside area limit");
        assert!(CellResult::Success.is_success());
        assert!(!CellResult::Duplicate.is_success());
        assert_eq!(CellResult::default(), CellResult::Unknown);
        assert_eq!(CellResult::ALL.len(), 15);
    }
}
