//! Half-edge (doubly-connected edge list) structure over a planar graph.
//!
//! # Structure
//!
//! - Each valid edge `(A, B)` becomes two **half-edges** `A→B` and `B→A`,
//!   stored next to each other so that `twin(h) == h ^ 1`
//! - The outgoing half-edges of every node are sorted by departure angle,
//!   counter-clockwise from +X
//! - `next(u→v)` is the outgoing half-edge of `v` that follows `v→u` in that
//!   angular order, wrapping around
//!
//! Following `next` from any half-edge traces one face. Faces are traced with
//! their interior on the right: bounded faces come out clockwise (negative
//! signed area) and the unbounded face of each connected component comes out
//! counter-clockwise (positive signed area). A dangling edge is walked once in
//! each direction by the face that surrounds it.

use nalgebra::Point2;
use rustc_hash::FxHashMap;

use crate::geom::polygon::direction_angle;
use crate::graph::index::{pair_key, EdgeId, HalfEdgeId, NodeId};
use crate::graph::Cluster;

/// A directed half of an undirected edge.
#[derive(Debug, Clone, Copy)]
pub struct HalfEdge {
    /// The node this half-edge leaves from.
    pub origin: NodeId,
    /// The node this half-edge points to.
    pub target: NodeId,
    /// The undirected edge this half-edge was built from.
    pub edge: EdgeId,
    /// The opposite half-edge.
    pub twin: HalfEdgeId,
    /// The following half-edge around the same face.
    pub next: HalfEdgeId,
    /// Departure angle at `origin`, in `(-π, π]`.
    pub angle: f64,
}

/// All half-edges of a graph, wired for face traversal.
#[derive(Debug, Clone, Default)]
pub struct HalfEdgeSet {
    half_edges: Vec<HalfEdge>,
    outgoing: Vec<Vec<HalfEdgeId>>,
    lookup: FxHashMap<u64, HalfEdgeId>,
}

impl HalfEdgeSet {
    /// Build the half-edge set for every valid edge of `cluster`.
    ///
    /// `positions` holds one projected position per node.
    pub fn build(cluster: &Cluster, positions: &[Point2<f64>]) -> Self {
        let num_edges = cluster.num_valid_edges();
        let mut half_edges = Vec::with_capacity(num_edges * 2);
        let mut lookup = FxHashMap::default();
        lookup.reserve(num_edges * 2);
        let mut outgoing: Vec<Vec<HalfEdgeId>> = vec![Vec::new(); cluster.num_nodes()];

        for (edge_id, edge) in cluster.valid_edges() {
            let (a, b) = (edge.start, edge.end);
            let pa = &positions[a.index()];
            let pb = &positions[b.index()];

            let ab = HalfEdgeId::new(half_edges.len());
            let ba = HalfEdgeId::new(half_edges.len() + 1);

            half_edges.push(HalfEdge {
                origin: a,
                target: b,
                edge: edge_id,
                twin: ba,
                next: HalfEdgeId::invalid(),
                angle: direction_angle(pa, pb),
            });
            half_edges.push(HalfEdge {
                origin: b,
                target: a,
                edge: edge_id,
                twin: ab,
                next: HalfEdgeId::invalid(),
                angle: direction_angle(pb, pa),
            });

            lookup.insert(pair_key(a, b), ab);
            lookup.insert(pair_key(b, a), ba);
            outgoing[a.index()].push(ab);
            outgoing[b.index()].push(ba);
        }

        // Counter-clockwise around each node; index breaks exact angle ties
        for list in &mut outgoing {
            if list.len() > 1 {
                list.sort_by(|&x, &y| {
                    half_edges[x.index()]
                        .angle
                        .total_cmp(&half_edges[y.index()].angle)
                        .then(x.cmp(&y))
                });
            }
        }

        let mut unwired = 0usize;
        for i in 0..half_edges.len() {
            let he = half_edges[i];
            let around = &outgoing[he.target.index()];
            match around.iter().position(|&h| h == he.twin) {
                Some(pos) => half_edges[i].next = around[(pos + 1) % around.len()],
                None => unwired += 1,
            }
        }
        if unwired > 0 {
            log::warn!("{} half-edge(s) could not be wired to a successor", unwired);
        }

        log::debug!(
            "built {} half-edges over {} node(s)",
            half_edges.len(),
            cluster.num_nodes()
        );

        Self {
            half_edges,
            outgoing,
            lookup,
        }
    }

    /// Number of half-edges.
    #[inline]
    pub fn len(&self) -> usize {
        self.half_edges.len()
    }

    /// Whether there are no half-edges.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.half_edges.is_empty()
    }

    /// Half-edge by index.
    #[inline]
    pub fn get(&self, h: HalfEdgeId) -> &HalfEdge {
        &self.half_edges[h.index()]
    }

    /// All half-edges.
    #[inline]
    pub fn as_slice(&self) -> &[HalfEdge] {
        &self.half_edges
    }

    /// Iterator over all half-edge ids.
    pub fn ids(&self) -> impl Iterator<Item = HalfEdgeId> {
        (0..self.half_edges.len()).map(HalfEdgeId::new)
    }

    /// The opposite half-edge.
    #[inline]
    pub fn twin(&self, h: HalfEdgeId) -> HalfEdgeId {
        self.half_edges[h.index()].twin
    }

    /// The following half-edge around the face, invalid if unwired.
    #[inline]
    pub fn next(&self, h: HalfEdgeId) -> HalfEdgeId {
        self.half_edges[h.index()].next
    }

    /// Outgoing half-edges of a node, counter-clockwise.
    #[inline]
    pub fn outgoing(&self, node: NodeId) -> &[HalfEdgeId] {
        self.outgoing
            .get(node.index())
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// The half-edge from `origin` to `target`, if the two are connected.
    #[inline]
    pub fn find(&self, origin: NodeId, target: NodeId) -> Option<HalfEdgeId> {
        self.lookup.get(&pair_key(origin, target)).copied()
    }
}
