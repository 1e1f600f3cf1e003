//! Half-edge construction and planar face enumeration.

pub mod enumerator;
pub mod halfedge;

pub use enumerator::{
    build_enumerator, AdjacencyMap, EnumerateOptions, FaceEnumeration, FaceEnumerator, RawFace,
    SeedClassification, PARALLEL_THRESHOLD,
};
pub use halfedge::{HalfEdge, HalfEdgeSet};
