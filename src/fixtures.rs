//! Small graphs shared by unit tests.

use nalgebra::{Point2, Point3};

use crate::graph::Cluster;

/// Drop the z coordinate of every node.
pub(crate) fn xy(cluster: &Cluster) -> Vec<Point2<f64>> {
    cluster
        .nodes()
        .iter()
        .map(|n| Point2::new(n.position.x, n.position.y))
        .collect()
}

fn cluster(points: &[(f64, f64)], edges: &[[usize; 2]]) -> Cluster {
    let positions: Vec<Point3<f64>> = points.iter().map(|&(x, y)| Point3::new(x, y, 0.0)).collect();
    Cluster::from_edges(&positions, edges).unwrap()
}

/// Unit square, nodes counter-clockwise from the origin.
pub(crate) fn square_cluster() -> Cluster {
    cluster(
        &[(0.0, 0.0), (1.0, 0.0), (1.0, 1.0), (0.0, 1.0)],
        &[[0, 1], [1, 2], [2, 3], [3, 0]],
    )
}

/// Axis-aligned square of side `size` with its lower corner at `(x, y)`.
pub(crate) fn square_at(x: f64, y: f64, size: f64) -> Cluster {
    cluster(
        &[(x, y), (x + size, y), (x + size, y + size), (x, y + size)],
        &[[0, 1], [1, 2], [2, 3], [3, 0]],
    )
}

/// Grid of `cols` x `rows` unit cells. Node `(i, j)` has index `j * (cols + 1) + i`.
pub(crate) fn grid_cluster(cols: usize, rows: usize) -> Cluster {
    let w = cols + 1;
    let mut points = Vec::with_capacity(w * (rows + 1));
    for j in 0..=rows {
        for i in 0..=cols {
            points.push((i as f64, j as f64));
        }
    }
    let mut edges = Vec::new();
    for j in 0..=rows {
        for i in 0..=cols {
            let n = j * w + i;
            if i < cols {
                edges.push([n, n + 1]);
            }
            if j < rows {
                edges.push([n, n + w]);
            }
        }
    }
    cluster(&points, &edges)
}

/// `n` nodes on the x axis joined in a chain.
pub(crate) fn path_cluster(n: usize) -> Cluster {
    let points: Vec<(f64, f64)> = (0..n).map(|i| (i as f64, 0.0)).collect();
    let edges: Vec<[usize; 2]> = (1..n).map(|i| [i - 1, i]).collect();
    cluster(&points, &edges)
}

/// Unit square with a dangling edge from node 0 to an interior leaf (node 4).
pub(crate) fn square_with_inner_tail() -> Cluster {
    cluster(
        &[(0.0, 0.0), (1.0, 0.0), (1.0, 1.0), (0.0, 1.0), (0.5, 0.25)],
        &[[0, 1], [1, 2], [2, 3], [3, 0], [0, 4]],
    )
}

/// A 4x4 square enclosing a disconnected 1x1 square.
pub(crate) fn nested_squares() -> Cluster {
    cluster(
        &[
            (0.0, 0.0),
            (4.0, 0.0),
            (4.0, 4.0),
            (0.0, 4.0),
            (1.0, 1.0),
            (2.0, 1.0),
            (2.0, 2.0),
            (1.0, 2.0),
        ],
        &[[0, 1], [1, 2], [2, 3], [3, 0], [4, 5], [5, 6], [6, 7], [7, 4]],
    )
}

/// Triangle with collinear vertices (zero area everywhere).
pub(crate) fn collinear_triangle() -> Cluster {
    cluster(
        &[(0.0, 0.0), (1.0, 0.0), (2.0, 0.0)],
        &[[0, 1], [1, 2], [2, 0]],
    )
}
