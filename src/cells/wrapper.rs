//! Detection of the unbounded outer face.
//!
//! For graphs with at least one cycle the wrapper is the face with the
//! largest positive signed area. Acyclic graphs have no such face; for those a
//! depth-first tour around the tree stands in for it, walking every reachable
//! edge once in each direction.

use nalgebra::Point2;

use super::cell::{cell_hash, Cell, CellData};
use super::constraints::CellConstraints;
use crate::dcel::FaceEnumerator;
use crate::graph::{Cluster, FaceId, NodeId};

/// Relative tolerance under which two face areas count as tied.
pub const AREA_TIE_TOLERANCE: f64 = 1e-9;

/// Pick the face with the largest positive area. Ties go to the lowest id.
///
/// `areas` yields `(face, signed_area)` in ascending face order; `None` when
/// no area is positive.
pub fn select_wrapper<It>(areas: It) -> Option<FaceId>
where
    It: IntoIterator<Item = (FaceId, f64)>,
{
    let mut best: Option<(FaceId, f64)> = None;
    for (face, area) in areas {
        if area <= 0.0 {
            continue;
        }
        match best {
            Some((_, best_area)) if area - best_area <= AREA_TIE_TOLERANCE * best_area => {}
            _ => best = Some((face, area)),
        }
    }
    best.map(|(face, _)| face)
}

/// Depth-first tour of the tree reachable from the lowest-index leaf (or the
/// first linked node).
///
/// Each node is recorded on entry and again after returning from each of its
/// children, except the final return to the start. Links are followed in
/// insertion order. `None` when no node has a link.
pub fn tree_walk(cluster: &Cluster) -> Option<Vec<NodeId>> {
    let nodes = cluster.nodes();
    let start = nodes
        .iter()
        .find(|n| n.is_leaf())
        .or_else(|| nodes.iter().find(|n| !n.is_isolated()))?
        .index;

    let mut visited = vec![false; nodes.len()];
    let mut tour = vec![start];
    // (node, index of the next link to try)
    let mut stack: Vec<(NodeId, usize)> = vec![(start, 0)];
    visited[start.index()] = true;

    while let Some(top) = stack.last_mut() {
        let (node, cursor) = *top;
        let links = &cluster.node(node).links;
        if cursor < links.len() {
            top.1 += 1;
            let child = links[cursor].node;
            if !visited[child.index()] {
                visited[child.index()] = true;
                tour.push(child);
                stack.push((child, 0));
            }
        } else {
            stack.pop();
            if let Some(&(parent, _)) = stack.last() {
                tour.push(parent);
            }
        }
    }

    if tour.len() > 1 && tour.last() == Some(&start) {
        tour.pop();
    }
    Some(tour)
}

/// Build the wrapper cell of `enumerator` with relaxed constraints.
///
/// The result is not registered in the constraints' uniqueness set. A simple
/// loop walks the same nodes for its outer and inner face, so with
/// `opposite_winding_is_duplicate` a registered wrapper would turn the only
/// interior cell into a duplicate.
pub fn build_wrapper_cell(
    enumerator: &FaceEnumerator,
    constraints: &CellConstraints,
) -> Option<Cell> {
    let cluster = enumerator.cluster();
    let positions = enumerator.positions();

    if let Some(face) = enumerator.wrapper_face_index() {
        let raw = enumerator.raw_face(face);
        return match constraints.evaluate(cluster, positions, face, &raw.nodes, raw.closed, true) {
            Ok(cell) => Some(cell),
            Err(rejection) => {
                log::warn!("wrapper face {:?} rejected: {}", face, rejection.result);
                None
            }
        };
    }

    let tour = tree_walk(cluster)?;
    log::debug!("no positive face, using a tree walk of {} entries", tour.len());
    Some(tree_cell(
        cluster,
        positions,
        &tour,
        constraints.config().duplicate_leaf_points,
    ))
}

fn tree_cell(
    cluster: &Cluster,
    positions: &[Point2<f64>],
    tour: &[NodeId],
    duplicate_leaves: bool,
) -> Cell {
    let mut nodes = Vec::with_capacity(tour.len());
    for &n in tour {
        nodes.push(n);
        if duplicate_leaves && cluster.is_leaf(n) {
            nodes.push(n);
        }
    }
    let polygon: Vec<Point2<f64>> = nodes.iter().map(|n| positions[n.index()]).collect();

    let mut data = CellData::measure(cluster, &nodes, &polygon, true, false);
    // A tree encloses nothing
    data.area = 0.0;
    data.compactness = 0.0;
    data.is_clockwise = false;

    Cell {
        hash: cell_hash(tour, false),
        nodes,
        polygon,
        face: FaceId::invalid(),
        data,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cells::CellConstraintsConfig;
    use crate::dcel::build_enumerator;
    use crate::dcel::EnumerateOptions;
    use crate::fixtures::{grid_cluster, path_cluster, square_cluster, xy};
    use approx::assert_relative_eq;
    use std::sync::Arc;

    fn ids(raw: &[usize]) -> Vec<NodeId> {
        raw.iter().map(|&i| NodeId::new(i)).collect()
    }

    #[test]
    fn test_select_wrapper() {
        let f = FaceId::new;
        assert_eq!(select_wrapper([(f(0), -1.0), (f(1), 4.0), (f(2), 2.0)]), Some(f(1)));
        assert_eq!(select_wrapper([(f(0), 0.0), (f(1), -3.0)]), None);
        // Exact tie resolves to the lower id
        assert_eq!(select_wrapper([(f(3), 5.0), (f(4), 5.0)]), Some(f(3)));
    }

    #[test]
    fn test_tree_walk_path() {
        let cluster = path_cluster(4);
        assert_eq!(tree_walk(&cluster), Some(ids(&[0, 1, 2, 3, 2, 1])));
    }

    #[test]
    fn test_tree_walk_star() {
        // Node 0 in the middle, three leaves
        let positions = vec![
            nalgebra::Point3::new(0.0, 0.0, 0.0),
            nalgebra::Point3::new(1.0, 0.0, 0.0),
            nalgebra::Point3::new(0.0, 1.0, 0.0),
            nalgebra::Point3::new(-1.0, 0.0, 0.0),
        ];
        let cluster = Cluster::from_edges(&positions, &[[0, 1], [0, 2], [0, 3]]).unwrap();
        // Starts at the lowest leaf (1)
        assert_eq!(tree_walk(&cluster), Some(ids(&[1, 0, 2, 0, 3, 0])));
    }

    #[test]
    fn test_tree_walk_empty() {
        assert_eq!(tree_walk(&Cluster::new()), None);
    }

    #[test]
    fn test_tree_fallback_cell() {
        let cluster = Arc::new(path_cluster(4));
        let positions = xy(&cluster);
        let enumerator = build_enumerator(Arc::clone(&cluster), positions).unwrap();
        assert_eq!(enumerator.wrapper_face_index(), None);

        let constraints = CellConstraints::new(CellConstraintsConfig::default()).unwrap();
        let wrapper = constraints.get_or_build_wrapper(&enumerator).unwrap();
        assert_eq!(wrapper.data.area, 0.0);
        // Three unit edges, each walked twice
        assert_relative_eq!(wrapper.data.perimeter, 6.0);
        assert!(!wrapper.face.is_valid());
        assert_eq!(constraints.num_unique_cells(), 0);

        // Cached
        let again = constraints.get_or_build_wrapper(&enumerator).unwrap();
        assert!(Arc::ptr_eq(&wrapper, &again));
    }

    #[test]
    fn test_tree_fallback_duplicates_leaves() {
        let cluster = Arc::new(path_cluster(4));
        let enumerator = build_enumerator(Arc::clone(&cluster), xy(&cluster)).unwrap();
        let constraints = CellConstraints::new(
            CellConstraintsConfig::default().with_duplicate_leaf_points(true),
        )
        .unwrap();
        let wrapper = constraints.get_or_build_wrapper(&enumerator).unwrap();
        assert_eq!(wrapper.nodes, ids(&[0, 0, 1, 2, 3, 3, 2, 1]));
        assert_relative_eq!(wrapper.data.perimeter, 6.0);
    }

    #[test]
    fn test_face_wrapper_on_grid() {
        let cluster = Arc::new(grid_cluster(2, 2));
        let enumerator = build_enumerator(Arc::clone(&cluster), xy(&cluster)).unwrap();
        let constraints = CellConstraints::new(CellConstraintsConfig::default()).unwrap();
        let wrapper = constraints.get_or_build_wrapper(&enumerator).unwrap();
        assert_relative_eq!(wrapper.data.area, 4.0);
        assert_relative_eq!(wrapper.data.perimeter, 8.0);
        assert_eq!(Some(wrapper.face), enumerator.wrapper_face_index());
    }

    #[test]
    fn test_wrapper_does_not_shadow_loop_interior() {
        let cluster = Arc::new(square_cluster());
        let enumerator = build_enumerator(Arc::clone(&cluster), xy(&cluster)).unwrap();
        let constraints = CellConstraints::new(
            CellConstraintsConfig::default().with_opposite_winding_is_duplicate(true),
        )
        .unwrap();

        let wrapper = constraints.get_or_build_wrapper(&enumerator).unwrap();
        assert_eq!(constraints.num_unique_cells(), 0);

        let found = enumerator.enumerate_faces(&constraints, &EnumerateOptions::default().with_wrapper(true));
        assert_eq!(found.cells.len(), 2);
        // Same cycle either way round
        assert_eq!(found.cells[1].hash, cell_hash(&wrapper.nodes, true));
        assert_eq!(constraints.num_unique_cells(), 1);
    }
}
