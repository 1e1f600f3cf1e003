//! Input graph: typed indices, the node/edge cluster and plane projection.

pub mod cluster;
pub mod index;
pub mod projection;

pub use cluster::{Cluster, Edge, Link, Node};
pub use index::{EdgeId, FaceId, HalfEdgeId, NodeId};
pub use projection::{ProjectedPointSet, Projection};
