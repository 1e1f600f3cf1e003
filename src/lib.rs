//! # Cellwalk
//!
//! Planar face enumeration and cell extraction for undirected graphs.
//!
//! Cellwalk projects a graph of 3D nodes onto a plane, threads a half-edge
//! structure through it and walks every face of the resulting planar
//! subdivision. Each face becomes a candidate cell that is measured and
//! filtered against a set of constraints.
//!
//! ## Features
//!
//! - **Half-edge faces**: every half-edge belongs to exactly one face
//! - **Outer face detection**: the wrapper face, or a tree tour for acyclic graphs
//! - **Constraint filtering**: winding, convexity, holes, size and shape limits
//! - **Deterministic parallelism**: faces are evaluated with rayon and
//!   deduplicated in face order
//! - **Seed triage**: pick cells by seed points and classify them against a box
//!
//! ## Quick Start
//!
//! ```
//! use std::sync::Arc;
//! use cellwalk::prelude::*;
//! use nalgebra::Point3;
//!
//! // Two unit squares side by side
//! let positions = vec![
//!     Point3::new(0.0, 0.0, 0.0),
//!     Point3::new(1.0, 0.0, 0.0),
//!     Point3::new(2.0, 0.0, 0.0),
//!     Point3::new(0.0, 1.0, 0.0),
//!     Point3::new(1.0, 1.0, 0.0),
//!     Point3::new(2.0, 1.0, 0.0),
//! ];
//! let edges = [[0, 1], [1, 2], [3, 4], [4, 5], [0, 3], [1, 4], [2, 5]];
//! let cluster = Arc::new(Cluster::from_edges(&positions, &edges).unwrap());
//!
//! let enumerator = FaceEnumerator::from_projection(cluster, &Projection::xy()).unwrap();
//! let constraints = CellConstraints::new(CellConstraintsConfig::default()).unwrap();
//! let found = enumerator.enumerate_all_faces(&constraints);
//!
//! assert_eq!(found.cells.len(), 2);
//! for cell in &found.cells {
//!     println!("cell {:?}: area={}", cell.face, cell.data.area);
//! }
//! ```
//!
//! ## Filtering
//!
//! Constraints are built from a plain config:
//!
//! ```
//! use cellwalk::prelude::*;
//!
//! let config = CellConstraintsConfig::default()
//!     .with_points(Limit::at_least(4))
//!     .with_area(Limit::between(0.5, 10.0));
//! let constraints = CellConstraints::new(config).unwrap();
//! assert_eq!(constraints.num_unique_cells(), 0);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod cells;
pub mod dcel;
pub mod error;
pub mod geom;
pub mod graph;
pub mod progress;

#[cfg(test)]
mod fixtures;

/// Prelude module for convenient imports.
///
/// This module re-exports the most commonly used types and functions:
///
/// ```
/// use cellwalk::prelude::*;
/// ```
pub mod prelude {
    pub use crate::cells::{
        find_cells_bounded, BoundedCellsOptions, Cell, CellConstraints, CellConstraintsConfig,
        CellResult, Limit, TriageResult,
    };
    pub use crate::dcel::{build_enumerator, EnumerateOptions, FaceEnumeration, FaceEnumerator};
    pub use crate::error::{CellError, Result};
    pub use crate::geom::{Bounds2, Winding};
    pub use crate::graph::{
        Cluster, EdgeId, FaceId, HalfEdgeId, NodeId, ProjectedPointSet, Projection,
    };
    pub use crate::progress::Progress;
}

// Re-export nalgebra types for convenience
pub use nalgebra;
