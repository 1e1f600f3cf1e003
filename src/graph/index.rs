//! Index types for graph and half-edge elements.
//!
//! Every arena in the crate (nodes, edges, half-edges, faces) is addressed by
//! a dense `u32` index wrapped in its own type, so a node index can never be
//! handed to something expecting a half-edge. `u32::MAX` is reserved as the
//! "not assigned" sentinel.

use std::fmt::{self, Debug};

const INVALID: u32 = u32::MAX;

/// A type-safe node index.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
#[repr(transparent)]
pub struct NodeId(u32);

/// A type-safe edge index (undirected edge of the input graph).
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
#[repr(transparent)]
pub struct EdgeId(u32);

/// A type-safe half-edge index.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
#[repr(transparent)]
pub struct HalfEdgeId(u32);

/// A type-safe face index.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
#[repr(transparent)]
pub struct FaceId(u32);

macro_rules! impl_index_type {
    ($name:ident, $display:literal) => {
        impl $name {
            /// Create a new index from a raw value.
            #[inline]
            pub fn new(index: usize) -> Self {
                debug_assert!(index < INVALID as usize, "index {} too large", index);
                Self(index as u32)
            }

            /// Create an invalid/unassigned index.
            #[inline]
            pub const fn invalid() -> Self {
                Self(INVALID)
            }

            /// Get the raw index value.
            #[inline]
            pub fn index(self) -> usize {
                self.0 as usize
            }

            /// Get the raw `u32` value.
            #[inline]
            pub fn raw(self) -> u32 {
                self.0
            }

            /// Check if this is a valid (assigned) index.
            #[inline]
            pub fn is_valid(self) -> bool {
                self.0 != INVALID
            }
        }

        impl Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                if self.is_valid() {
                    write!(f, "{}({})", $display, self.0)
                } else {
                    write!(f, "{}(INVALID)", $display)
                }
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::invalid()
            }
        }

        impl From<usize> for $name {
            fn from(v: usize) -> Self {
                Self::new(v)
            }
        }
    };
}

impl_index_type!(NodeId, "N");
impl_index_type!(EdgeId, "E");
impl_index_type!(HalfEdgeId, "HE");
impl_index_type!(FaceId, "F");

/// Pack an ordered node pair into a single 64-bit key.
///
/// The pair is directional: `pair_key(a, b) != pair_key(b, a)` unless `a == b`.
#[inline]
pub fn pair_key(a: NodeId, b: NodeId) -> u64 {
    ((a.raw() as u64) << 32) | b.raw() as u64
}
