//! Planar geometry helpers: bounds, winding and polygon measurements.

mod bounds;
pub mod polygon;

pub use bounds::{Bounds, Bounds2, Bounds3};
pub use polygon::{
    ccw_angle, compactness, direction_angle, is_clockwise, is_convex, perimeter,
    point_in_polygon, point_segment_distance, signed_area, ConvexityTracker, PolygonInfo,
    Winding,
};
