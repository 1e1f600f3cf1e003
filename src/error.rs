//! Error types for cellwalk.
//!
//! Per-face rejections are not errors: they are reported as
//! [`CellResult`](crate::cells::CellResult) values. This module covers input
//! that cannot be turned into a graph or an enumerator at all.

use thiserror::Error;

/// Result type alias using [`CellError`].
pub type Result<T> = std::result::Result<T, CellError>;

/// Errors that can occur while building graphs and enumerators.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CellError {
    /// An edge references a node that does not exist.
    #[error("edge {edge} references invalid node index {node}")]
    InvalidNodeIndex {
        /// The edge index in the input list.
        edge: usize,
        /// The invalid node index.
        node: usize,
    },

    /// The projected positions do not line up with the graph nodes.
    #[error("expected {expected} projected positions, found {found}")]
    ProjectionMismatch {
        /// Number of nodes in the graph.
        expected: usize,
        /// Number of positions supplied.
        found: usize,
    },

    /// The projection plane normal has zero length.
    #[error("projection normal is degenerate")]
    DegenerateProjection,

    /// Invalid parameter value.
    #[error("invalid parameter: {name} = {value} ({reason})")]
    InvalidParameter {
        /// Parameter name.
        name: &'static str,
        /// The invalid value (as string).
        value: String,
        /// Reason the value is invalid.
        reason: &'static str,
    },
}

impl CellError {
    /// Create an invalid parameter error.
    pub fn invalid_param<T: std::fmt::Display>(
        name: &'static str,
        value: T,
        reason: &'static str,
    ) -> Self {
        CellError::InvalidParameter {
            name,
            value: value.to_string(),
            reason,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = CellError::InvalidNodeIndex { edge: 3, node: 42 };
        assert_eq!(err.to_string(), "edge 3 references invalid node index 42");

        let err = CellError::ProjectionMismatch { expected: 4, found: 2 };
        assert_eq!(err.to_string(), "expected 4 projected positions, found 2");
    }

    #[test]
    fn test_invalid_param_helper() {
        let err = CellError::invalid_param("wrapper_tolerance", -1.0, "must be non-negative");
        assert_eq!(
            err.to_string(),
            "invalid parameter: wrapper_tolerance = -1 (must be non-negative)"
        );
    }
}
