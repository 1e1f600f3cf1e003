//! Undirected node/edge graph with 3D node positions.
//!
//! A [`Cluster`] is the input to face enumeration. Each node stores its
//! incident [`Link`]s (neighbor plus edge id) in insertion order; each edge
//! stores its two endpoints and a validity flag. Invalidated edges stay in the
//! edge arena so edge ids remain stable, but they disappear from node links
//! and are ignored by the half-edge builder.

use nalgebra::Point3;
use rustc_hash::FxHashMap;

use super::index::{pair_key, EdgeId, NodeId};
use crate::error::{CellError, Result};
use crate::geom::Bounds3;

/// One incident edge of a node, as seen from that node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Link {
    /// The node at the other end of the edge.
    pub node: NodeId,
    /// The connecting edge.
    pub edge: EdgeId,
}

/// A graph node.
#[derive(Debug, Clone)]
pub struct Node {
    /// Index of this node in the cluster.
    pub index: NodeId,
    /// World-space position.
    pub position: Point3<f64>,
    /// Incident links over valid edges.
    pub links: Vec<Link>,
}

impl Node {
    /// Number of valid incident edges.
    #[inline]
    pub fn degree(&self) -> usize {
        self.links.len()
    }

    /// A leaf has exactly one valid incident edge.
    #[inline]
    pub fn is_leaf(&self) -> bool {
        self.links.len() == 1
    }

    /// Whether the node has no valid edge.
    #[inline]
    pub fn is_isolated(&self) -> bool {
        self.links.is_empty()
    }
}

/// An undirected graph edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Edge {
    /// First endpoint.
    pub start: NodeId,
    /// Second endpoint.
    pub end: NodeId,
    /// Invalid edges are kept for index stability but otherwise ignored.
    pub valid: bool,
}

impl Edge {
    /// The endpoint that is not `node`.
    #[inline]
    pub fn other(&self, node: NodeId) -> NodeId {
        if self.start == node {
            self.end
        } else {
            self.start
        }
    }
}

/// A read-only (once built) undirected graph embedded in space.
#[derive(Debug, Clone, Default)]
pub struct Cluster {
    nodes: Vec<Node>,
    edges: Vec<Edge>,
    lookup: FxHashMap<u64, EdgeId>,
}

impl Cluster {
    /// Create an empty cluster.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty cluster with pre-allocated capacity.
    pub fn with_capacity(num_nodes: usize, num_edges: usize) -> Self {
        let mut lookup = FxHashMap::default();
        lookup.reserve(num_edges);
        Self {
            nodes: Vec::with_capacity(num_nodes),
            edges: Vec::with_capacity(num_edges),
            lookup,
        }
    }

    /// Build a cluster from node positions and undirected edge pairs.
    ///
    /// Self-loops and repeated edges (in either direction) are skipped. An
    /// endpoint outside `positions` is an error.
    ///
    /// # Example
    /// ```
    /// use cellwalk::graph::Cluster;
    /// use nalgebra::Point3;
    ///
    /// let positions = vec![
    ///     Point3::new(0.0, 0.0, 0.0),
    ///     Point3::new(1.0, 0.0, 0.0),
    ///     Point3::new(0.0, 1.0, 0.0),
    /// ];
    /// let cluster = Cluster::from_edges(&positions, &[[0, 1], [1, 2], [2, 0]]).unwrap();
    /// assert_eq!(cluster.num_nodes(), 3);
    /// assert_eq!(cluster.num_valid_edges(), 3);
    /// ```
    pub fn from_edges(positions: &[Point3<f64>], edges: &[[usize; 2]]) -> Result<Self> {
        for (ei, edge) in edges.iter().enumerate() {
            for &ni in edge {
                if ni >= positions.len() {
                    return Err(CellError::InvalidNodeIndex { edge: ei, node: ni });
                }
            }
        }

        let mut cluster = Self::with_capacity(positions.len(), edges.len());
        for &p in positions {
            cluster.add_node(p);
        }

        let mut skipped = 0usize;
        for &[a, b] in edges {
            if cluster.add_edge(NodeId::new(a), NodeId::new(b))?.is_none() {
                skipped += 1;
            }
        }

        if skipped > 0 {
            log::debug!(
                "cluster: skipped {} self-loop or duplicate edge(s) out of {}",
                skipped,
                edges.len()
            );
        }

        Ok(cluster)
    }

    /// Add a node and return its index.
    pub fn add_node(&mut self, position: Point3<f64>) -> NodeId {
        let index = NodeId::new(self.nodes.len());
        self.nodes.push(Node {
            index,
            position,
            links: Vec::new(),
        });
        index
    }

    /// Connect two nodes.
    ///
    /// Returns `Ok(None)` for a self-loop or when the nodes are already
    /// connected by a valid edge.
    pub fn add_edge(&mut self, a: NodeId, b: NodeId) -> Result<Option<EdgeId>> {
        for n in [a, b] {
            if !n.is_valid() || n.index() >= self.nodes.len() {
                return Err(CellError::InvalidNodeIndex {
                    edge: self.edges.len(),
                    node: n.index(),
                });
            }
        }
        if a == b || self.find_edge(a, b).is_some() {
            return Ok(None);
        }

        let id = EdgeId::new(self.edges.len());
        self.edges.push(Edge {
            start: a,
            end: b,
            valid: true,
        });
        self.lookup.insert(undirected_key(a, b), id);
        self.nodes[a.index()].links.push(Link { node: b, edge: id });
        self.nodes[b.index()].links.push(Link { node: a, edge: id });
        Ok(Some(id))
    }

    /// Mark an edge invalid and unlink it from both endpoints.
    ///
    /// Returns `false` if the edge does not exist or was already invalid.
    pub fn invalidate_edge(&mut self, edge: EdgeId) -> bool {
        let Some(e) = self.edges.get_mut(edge.index()) else {
            return false;
        };
        if !e.valid {
            return false;
        }
        e.valid = false;
        let (start, end) = (e.start, e.end);
        self.lookup.remove(&undirected_key(start, end));
        for n in [start, end] {
            self.nodes[n.index()].links.retain(|l| l.edge != edge);
        }
        true
    }

    /// The valid edge connecting `a` and `b`, in either direction.
    pub fn find_edge(&self, a: NodeId, b: NodeId) -> Option<EdgeId> {
        self.lookup.get(&undirected_key(a, b)).copied()
    }

    /// Number of nodes.
    #[inline]
    pub fn num_nodes(&self) -> usize {
        self.nodes.len()
    }

    /// Number of edges, including invalidated ones.
    #[inline]
    pub fn num_edges(&self) -> usize {
        self.edges.len()
    }

    /// Number of valid edges.
    pub fn num_valid_edges(&self) -> usize {
        self.edges.iter().filter(|e| e.valid).count()
    }

    /// Node by index.
    #[inline]
    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.index()]
    }

    /// Edge by index.
    #[inline]
    pub fn edge(&self, id: EdgeId) -> &Edge {
        &self.edges[id.index()]
    }

    /// Node position.
    #[inline]
    pub fn position(&self, id: NodeId) -> Point3<f64> {
        self.nodes[id.index()].position
    }

    /// All nodes.
    #[inline]
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// All edges, including invalidated ones.
    #[inline]
    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    /// Iterator over valid edges with their ids.
    pub fn valid_edges(&self) -> impl Iterator<Item = (EdgeId, &Edge)> {
        self.edges
            .iter()
            .enumerate()
            .filter(|(_, e)| e.valid)
            .map(|(i, e)| (EdgeId::new(i), e))
    }

    /// Whether a node has exactly one valid edge.
    #[inline]
    pub fn is_leaf(&self, id: NodeId) -> bool {
        self.nodes[id.index()].is_leaf()
    }

    /// Bounding box of all node positions.
    pub fn bounds(&self) -> Bounds3 {
        Bounds3::from_points(self.nodes.iter().map(|n| &n.position))
    }

    /// Mean node position, `None` for an empty cluster.
    pub fn centroid(&self) -> Option<Point3<f64>> {
        if self.nodes.is_empty() {
            return None;
        }
        let sum = self
            .nodes
            .iter()
            .fold(nalgebra::Vector3::zeros(), |acc, n| acc + n.position.coords);
        Some(Point3::from(sum / self.nodes.len() as f64))
    }
}

#[inline]
fn undirected_key(a: NodeId, b: NodeId) -> u64 {
    if a <= b {
        pair_key(a, b)
    } else {
        pair_key(b, a)
    }
}
