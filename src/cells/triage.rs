//! Seed-based cell selection inside a bounding filter.
//!
//! Cells are classified by how their 2D bounds sit relative to a filter box,
//! seeds claim the cells that contain them, and seeded cells can optionally
//! spread to neighboring faces.

use std::collections::VecDeque;

use nalgebra::Point2;
use rayon::prelude::*;
use rustc_hash::{FxHashMap, FxHashSet};

use super::cell::Cell;
use super::constraints::CellConstraints;
use crate::dcel::{EnumerateOptions, FaceEnumerator};
use crate::error::{CellError, Result};
use crate::geom::{polygon, Bounds2};
use crate::graph::{FaceId, ProjectedPointSet};

/// Position of a cell's bounds relative to a filter box.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TriageResult {
    /// Fully contained in the filter.
    Inside,
    /// Overlaps the filter without being contained.
    Touching,
    /// Disjoint from the filter.
    Outside,
}

/// Classify `cell` bounds against `filter`. Boundaries are inclusive.
pub fn classify_bounds(cell: &Bounds2, filter: &Bounds2) -> TriageResult {
    if filter.contains(cell) {
        TriageResult::Inside
    } else if filter.intersects(cell) {
        TriageResult::Touching
    } else {
        TriageResult::Outside
    }
}

/// Which triage categories are kept.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TriageFilter {
    /// Keep cells inside the filter (default: true).
    pub inside: bool,
    /// Keep cells touching the filter (default: true).
    pub touching: bool,
    /// Keep cells outside the filter (default: false).
    pub outside: bool,
}

impl Default for TriageFilter {
    fn default() -> Self {
        Self {
            inside: true,
            touching: true,
            outside: false,
        }
    }
}

impl TriageFilter {
    /// Keep every category.
    pub fn all() -> Self {
        Self {
            inside: true,
            touching: true,
            outside: true,
        }
    }

    /// Whether cells of this category are kept.
    #[inline]
    pub fn accepts(&self, result: TriageResult) -> bool {
        match result {
            TriageResult::Inside => self.inside,
            TriageResult::Touching => self.touching,
            TriageResult::Outside => self.outside,
        }
    }
}

/// How a cell containing several seeds picks its owner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SeedOwnership {
    /// Lowest seed index wins.
    #[default]
    SeedOrder,
    /// Seed nearest the cell centroid wins.
    Closest,
    /// Best-ranked seed by score wins.
    BestCandidate,
}

/// Score ordering for [`SeedOwnership::BestCandidate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SortDirection {
    /// Smallest score ranks first.
    #[default]
    Ascending,
    /// Largest score ranks first.
    Descending,
}

/// Per-seed scores and the direction they are ranked in.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SortRule {
    /// One score per seed.
    pub scores: Vec<f64>,
    /// Ranking direction.
    pub direction: SortDirection,
}

impl SortRule {
    /// Create a rule over `scores`.
    pub fn new(scores: Vec<f64>, direction: SortDirection) -> Self {
        Self { scores, direction }
    }

    /// Rank of every seed: `ranks[seed]` is its position in sorted order.
    /// Equal scores keep index order.
    pub fn rank_table(&self) -> Vec<usize> {
        let mut order: Vec<usize> = (0..self.scores.len()).collect();
        order.sort_by(|&a, &b| {
            let by_score = self.scores[a].total_cmp(&self.scores[b]);
            let by_score = match self.direction {
                SortDirection::Ascending => by_score,
                SortDirection::Descending => by_score.reverse(),
            };
            by_score.then(a.cmp(&b))
        });
        let mut ranks = vec![0; order.len()];
        for (rank, seed) in order.into_iter().enumerate() {
            ranks[seed] = rank;
        }
        ranks
    }
}

/// Resolves which seed owns a cell.
#[derive(Debug, Clone, PartialEq)]
pub struct SeedOwnershipHandler {
    method: SeedOwnership,
    seeds: Vec<Point2<f64>>,
    ranks: Vec<usize>,
}

impl SeedOwnershipHandler {
    /// Prepare a handler for `seeds`.
    ///
    /// [`SeedOwnership::BestCandidate`] requires a rule with one score per
    /// seed.
    pub fn new(method: SeedOwnership, seeds: &[Point2<f64>], rule: Option<&SortRule>) -> Result<Self> {
        let ranks = match (method, rule) {
            (SeedOwnership::BestCandidate, Some(rule)) => {
                if rule.scores.len() != seeds.len() {
                    return Err(CellError::invalid_param(
                        "seed_scores",
                        rule.scores.len(),
                        "must hold one score per seed",
                    ));
                }
                rule.rank_table()
            }
            (SeedOwnership::BestCandidate, None) => {
                return Err(CellError::invalid_param(
                    "seed_scores",
                    "none",
                    "best candidate ownership needs a sort rule",
                ));
            }
            _ => Vec::new(),
        };
        Ok(Self {
            method,
            seeds: seeds.to_vec(),
            ranks,
        })
    }

    /// The ownership policy.
    #[inline]
    pub fn method(&self) -> SeedOwnership {
        self.method
    }

    /// Whether every candidate must be collected, or the first is enough.
    #[inline]
    pub fn needs_all_candidates(&self) -> bool {
        self.method != SeedOwnership::SeedOrder
    }

    /// Pick the owner among `candidates` (seed indices, ascending).
    pub fn pick_winner(&self, candidates: &[usize], centroid: &Point2<f64>) -> Option<usize> {
        match self.method {
            SeedOwnership::SeedOrder => candidates.iter().copied().min(),
            SeedOwnership::Closest => candidates
                .iter()
                .map(|&s| ((self.seeds[s] - centroid).norm_squared(), s))
                .min_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)))
                .map(|(_, s)| s),
            SeedOwnership::BestCandidate => candidates.iter().copied().min_by_key(|&s| (self.ranks[s], s)),
        }
    }
}

/// How far each seed's cell spreads to neighboring faces.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SeedGrowth {
    /// Same number of steps for every seed.
    Fixed(usize),
    /// Steps per seed index; missing entries mean no growth.
    PerSeed(Vec<usize>),
}

impl Default for SeedGrowth {
    fn default() -> Self {
        SeedGrowth::Fixed(0)
    }
}

impl SeedGrowth {
    /// Growth steps for one seed.
    pub fn steps(&self, seed: usize) -> usize {
        match self {
            SeedGrowth::Fixed(n) => *n,
            SeedGrowth::PerSeed(v) => v.get(seed).copied().unwrap_or(0),
        }
    }

    /// Whether any seed can grow at all.
    pub fn has_potential_growth(&self) -> bool {
        match self {
            SeedGrowth::Fixed(n) => *n > 0,
            SeedGrowth::PerSeed(v) => v.iter().any(|&n| n > 0),
        }
    }
}

/// Options for [`find_cells_bounded`].
#[derive(Debug, Clone, PartialEq)]
pub struct BoundedCellsOptions {
    /// The filter box cells are classified against.
    pub filter: Bounds2,
    /// Categories kept in the output.
    pub triage: TriageFilter,
    /// Ownership policy for cells holding several seeds.
    pub ownership: SeedOwnership,
    /// Scores for [`SeedOwnership::BestCandidate`].
    pub sort_rule: Option<SortRule>,
    /// Spread of seeded cells to neighboring faces.
    pub seed_growth: SeedGrowth,
    /// Leave the wrapper out of the result (default: true).
    pub omit_wrapper: bool,
    /// Emit the wrapper anyway when no other cell is found (default: true).
    pub keep_wrapper_if_sole: bool,
    /// Max distance from a seed to an edge for it to claim the wrapper.
    pub wrapper_seed_distance: f64,
    /// Whether to use parallel execution (default: true).
    pub parallel: bool,
}

impl BoundedCellsOptions {
    /// Options classifying against `filter`, all else default.
    pub fn new(filter: Bounds2) -> Self {
        Self {
            filter,
            triage: TriageFilter::default(),
            ownership: SeedOwnership::SeedOrder,
            sort_rule: None,
            seed_growth: SeedGrowth::default(),
            omit_wrapper: true,
            keep_wrapper_if_sole: true,
            wrapper_seed_distance: f64::INFINITY,
            parallel: true,
        }
    }

    /// Set the kept triage categories.
    pub fn with_triage(mut self, triage: TriageFilter) -> Self {
        self.triage = triage;
        self
    }

    /// Set the ownership policy.
    pub fn with_ownership(mut self, ownership: SeedOwnership) -> Self {
        self.ownership = ownership;
        self
    }

    /// Rank seeds by score; implies [`SeedOwnership::BestCandidate`].
    pub fn with_sort_rule(mut self, rule: SortRule) -> Self {
        self.ownership = SeedOwnership::BestCandidate;
        self.sort_rule = Some(rule);
        self
    }

    /// Set seed growth.
    pub fn with_seed_growth(mut self, growth: SeedGrowth) -> Self {
        self.seed_growth = growth;
        self
    }

    /// Include the wrapper cell in the output.
    pub fn with_wrapper(mut self) -> Self {
        self.omit_wrapper = false;
        self
    }

    /// Never fall back to the wrapper when nothing else was found.
    pub fn without_sole_wrapper(mut self) -> Self {
        self.keep_wrapper_if_sole = false;
        self
    }

    /// Set the wrapper claim distance.
    pub fn with_wrapper_seed_distance(mut self, distance: f64) -> Self {
        self.wrapper_seed_distance = distance;
        self
    }

    /// Set whether to use parallel execution.
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Create options for single-threaded execution.
    pub fn sequential(mut self) -> Self {
        self.parallel = false;
        self
    }
}

/// A cell picked by a seed.
#[derive(Debug, Clone, PartialEq)]
pub struct SeededCell {
    /// The cell.
    pub cell: Cell,
    /// The owning seed.
    pub seed: usize,
    /// Position of the cell relative to the filter.
    pub triage: TriageResult,
    /// Growth steps from the nearest seeded cell; 0 for a directly seeded cell.
    pub min_depth: usize,
    /// How many times the cell was reached, directly or by growth.
    pub pick_count: usize,
}

/// Output of [`find_cells_bounded`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BoundedCells {
    /// Seeded cells in kept categories, ascending by face.
    pub cells: Vec<SeededCell>,
    /// The wrapper, when requested and claimed by a seed.
    pub wrapper: Option<SeededCell>,
}

#[derive(Debug, Clone, Copy)]
struct Expansion {
    source: usize,
    min_depth: usize,
    pick_count: usize,
}

impl Expansion {
    fn record(entry: &mut FxHashMap<FaceId, Expansion>, face: FaceId, seed: usize, depth: usize) {
        entry
            .entry(face)
            .and_modify(|e| {
                e.pick_count += 1;
                e.min_depth = e.min_depth.min(depth);
            })
            .or_insert(Expansion {
                source: seed,
                min_depth: depth,
                pick_count: 1,
            });
    }
}

/// Breadth-first spread from `start` over `adjacency`, up to `steps` hops.
fn expand_from(
    adjacency: &crate::dcel::AdjacencyMap,
    start: FaceId,
    seed: usize,
    steps: usize,
    out: &mut FxHashMap<FaceId, Expansion>,
) {
    let mut visited = FxHashSet::default();
    visited.insert(start);
    let mut queue = VecDeque::from([(start, 0usize)]);
    while let Some((face, depth)) = queue.pop_front() {
        if depth == steps {
            continue;
        }
        for &next in adjacency.neighbors(face) {
            if visited.insert(next) {
                Expansion::record(out, next, seed, depth + 1);
                queue.push_back((next, depth + 1));
            }
        }
    }
}

/// Find the cells of `enumerator` claimed by `seeds`, classified against a
/// filter box.
///
/// Every accepted cell containing at least one seed is owned by the winning
/// seed. With seed growth, owned cells spread to adjacent faces (rejected
/// faces included, the wrapper excluded). The wrapper can be claimed by seeds
/// that fall in no face but lie within `wrapper_seed_distance` of an edge.
pub fn find_cells_bounded(
    enumerator: &FaceEnumerator,
    constraints: &CellConstraints,
    seeds: &ProjectedPointSet,
    options: &BoundedCellsOptions,
) -> Result<BoundedCells> {
    let mut out = BoundedCells::default();
    if !enumerator.is_built() {
        return Ok(out);
    }

    let seed_points: Vec<Point2<f64>> = seeds.with_projected(|points, _| points.to_vec());
    let handler = SeedOwnershipHandler::new(options.ownership, &seed_points, options.sort_rule.as_ref())?;

    let enumeration = enumerator.enumerate_faces(
        constraints,
        &EnumerateOptions::default()
            .with_parallel(options.parallel)
            .with_failed(true),
    );
    let wrapper = constraints.get_or_build_wrapper(enumerator);

    let accepted = &enumeration.cells;
    let owner_of = |cell: &Cell| -> Option<usize> {
        let candidates = seeds.indices_inside(&cell.polygon, &cell.data.bounds_2d);
        handler.pick_winner(&candidates, &cell.data.centroid_2d)
    };
    let owners: Vec<Option<usize>> = if options.parallel {
        accepted.par_iter().map(owner_of).collect()
    } else {
        accepted.iter().map(owner_of).collect()
    };

    // face -> (cell, owner)
    let mut picked: FxHashMap<FaceId, (&Cell, usize)> = FxHashMap::default();
    for (cell, owner) in accepted.iter().zip(&owners) {
        if let Some(seed) = owner {
            picked.insert(cell.face, (cell, *seed));
        }
    }

    let mut expansion: FxHashMap<FaceId, Expansion> = FxHashMap::default();
    if options.seed_growth.has_potential_growth() {
        let adjacency = enumerator.get_or_build_adjacency_map(enumerator.wrapper_face_index());
        let by_face: FxHashMap<FaceId, &Cell> = accepted
            .iter()
            .chain(&enumeration.failed)
            .filter(|c| c.face.is_valid())
            .map(|c| (c.face, c))
            .collect();

        let mut initial: Vec<(FaceId, usize)> = picked.iter().map(|(&f, &(_, s))| (f, s)).collect();
        initial.sort_unstable();
        for (face, seed) in initial {
            Expansion::record(&mut expansion, face, seed, 0);
            let steps = options.seed_growth.steps(seed);
            if steps > 0 {
                expand_from(&adjacency, face, seed, steps, &mut expansion);
            }
        }

        for (face, e) in &expansion {
            if !picked.contains_key(face) {
                if let Some(&cell) = by_face.get(face) {
                    picked.insert(*face, (cell, e.source));
                }
            }
        }
    }

    let mut faces: Vec<FaceId> = picked.keys().copied().collect();
    faces.sort_unstable();
    for face in faces {
        let (cell, seed) = picked[&face];
        let triage = classify_bounds(&cell.data.bounds_2d, &options.filter);
        if !options.triage.accepts(triage) {
            continue;
        }
        let (min_depth, pick_count) = expansion
            .get(&face)
            .map_or((0, 1), |e| (e.min_depth, e.pick_count));
        out.cells.push(SeededCell {
            cell: cell.clone(),
            seed,
            triage,
            min_depth,
            pick_count,
        });
    }

    let want_wrapper = !options.omit_wrapper || (options.keep_wrapper_if_sole && out.cells.is_empty());
    if let (true, Some(wrapper)) = (want_wrapper, wrapper) {
        let triage = classify_bounds(&wrapper.data.bounds_2d, &options.filter);
        if options.triage.accepts(triage) {
            let consumed: FxHashSet<usize> = out.cells.iter().map(|c| c.seed).collect();
            let candidates: Vec<usize> = (0..seed_points.len())
                .filter(|s| !consumed.contains(s))
                // Any bounded face counts, including those rejected before a cell was built
                .filter(|&s| enumerator.find_face_containing(&seed_points[s]).is_none())
                .filter(|&s| {
                    distance_to_nearest_edge(enumerator, &seed_points[s])
                        <= options.wrapper_seed_distance
                })
                .collect();
            if let Some(seed) = handler.pick_winner(&candidates, &wrapper.data.centroid_2d) {
                out.wrapper = Some(SeededCell {
                    cell: (*wrapper).clone(),
                    seed,
                    triage,
                    min_depth: 0,
                    pick_count: 1,
                });
            }
        }
    }

    log::debug!(
        "bounded search: {} seeded cell(s), wrapper {}",
        out.cells.len(),
        if out.wrapper.is_some() { "kept" } else { "omitted" }
    );
    Ok(out)
}

fn distance_to_nearest_edge(enumerator: &FaceEnumerator, p: &Point2<f64>) -> f64 {
    enumerator
        .cluster()
        .valid_edges()
        .map(|(_, e)| {
            polygon::point_segment_distance(
                p,
                &enumerator.position(e.start),
                &enumerator.position(e.end),
            )
        })
        .fold(f64::INFINITY, f64::min)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cells::CellConstraintsConfig;
    use crate::dcel::build_enumerator;
    use crate::fixtures::{grid_cluster, path_cluster, square_at, square_with_inner_tail, xy};
    use crate::graph::Cluster;
    use std::sync::Arc;

    fn enumerator(cluster: Cluster) -> FaceEnumerator {
        let positions = xy(&cluster);
        build_enumerator(Arc::new(cluster), positions).unwrap()
    }

    fn constraints() -> CellConstraints {
        CellConstraints::new(CellConstraintsConfig::default()).unwrap()
    }

    fn bounds(x0: f64, y0: f64, x1: f64, y1: f64) -> Bounds2 {
        Bounds2::new(Point2::new(x0, y0), Point2::new(x1, y1))
    }

    #[test]
    fn test_classify_bounds() {
        let cell = bounds(0.0, 0.0, 10.0, 10.0);
        assert_eq!(classify_bounds(&cell, &bounds(5.0, 5.0, 15.0, 15.0)), TriageResult::Touching);
        assert_eq!(classify_bounds(&cell, &bounds(-5.0, -5.0, 20.0, 20.0)), TriageResult::Inside);
        assert_eq!(classify_bounds(&cell, &bounds(20.0, 20.0, 30.0, 30.0)), TriageResult::Outside);
        // Same box counts as inside
        assert_eq!(classify_bounds(&cell, &cell), TriageResult::Inside);
    }

    #[test]
    fn test_rank_table() {
        let rule = SortRule::new(vec![3.0, 1.0, 2.0, 1.0], SortDirection::Ascending);
        assert_eq!(rule.rank_table(), vec![3, 0, 2, 1]);
        let rule = SortRule::new(vec![3.0, 1.0, 2.0, 1.0], SortDirection::Descending);
        assert_eq!(rule.rank_table(), vec![0, 2, 1, 3]);
    }

    #[test]
    fn test_pick_winner_policies() {
        let seeds = vec![Point2::new(0.0, 0.0), Point2::new(1.0, 1.0), Point2::new(2.0, 2.0)];
        let centroid = Point2::new(1.9, 1.9);

        let order = SeedOwnershipHandler::new(SeedOwnership::SeedOrder, &seeds, None).unwrap();
        assert!(!order.needs_all_candidates());
        assert_eq!(order.pick_winner(&[1, 2], &centroid), Some(1));
        assert_eq!(order.pick_winner(&[], &centroid), None);

        let closest = SeedOwnershipHandler::new(SeedOwnership::Closest, &seeds, None).unwrap();
        assert_eq!(closest.pick_winner(&[0, 1, 2], &centroid), Some(2));
        // Equidistant: lower index
        assert_eq!(closest.pick_winner(&[0, 2], &Point2::new(1.0, 1.0)), Some(0));

        let rule = SortRule::new(vec![5.0, 9.0, 1.0], SortDirection::Descending);
        let best = SeedOwnershipHandler::new(SeedOwnership::BestCandidate, &seeds, Some(&rule)).unwrap();
        assert_eq!(best.pick_winner(&[0, 1, 2], &centroid), Some(1));
        assert_eq!(best.pick_winner(&[0, 2], &centroid), Some(0));
    }

    #[test]
    fn test_best_candidate_requires_scores() {
        let seeds = vec![Point2::origin()];
        assert!(SeedOwnershipHandler::new(SeedOwnership::BestCandidate, &seeds, None).is_err());
        let short = SortRule::new(vec![], SortDirection::Ascending);
        assert!(SeedOwnershipHandler::new(SeedOwnership::BestCandidate, &seeds, Some(&short)).is_err());
    }

    #[test]
    fn test_find_cells_bounded_basic() {
        let e = enumerator(grid_cluster(3, 1));
        let c = constraints();
        // Seeds in the first and last cells, one outside everything
        let seeds = ProjectedPointSet::from_2d(vec![
            Point2::new(0.5, 0.5),
            Point2::new(2.5, 0.5),
            Point2::new(10.0, 10.0),
        ]);
        let options = BoundedCellsOptions::new(bounds(0.0, 0.0, 1.5, 1.0)).sequential();
        let found = find_cells_bounded(&e, &c, &seeds, &options).unwrap();

        assert_eq!(found.cells.len(), 1);
        assert_eq!(found.cells[0].seed, 0);
        assert_eq!(found.cells[0].triage, TriageResult::Inside);
        assert!(found.wrapper.is_none());

        let c = constraints();
        let options = options.with_triage(TriageFilter::all());
        let found = find_cells_bounded(&e, &c, &seeds, &options).unwrap();
        assert_eq!(found.cells.len(), 2);
        assert_eq!(found.cells[1].seed, 1);
        assert_eq!(found.cells[1].triage, TriageResult::Outside);
    }

    #[test]
    fn test_seed_growth() {
        let e = enumerator(grid_cluster(4, 1));
        let c = constraints();
        let seeds = ProjectedPointSet::from_2d(vec![Point2::new(0.5, 0.5)]);
        let options = BoundedCellsOptions::new(bounds(-1.0, -1.0, 10.0, 10.0))
            .with_seed_growth(SeedGrowth::Fixed(2))
            .sequential();
        let found = find_cells_bounded(&e, &c, &seeds, &options).unwrap();

        assert_eq!(found.cells.len(), 3);
        let depths: Vec<usize> = found.cells.iter().map(|c| c.min_depth).collect();
        let mut sorted = depths.clone();
        sorted.sort_unstable();
        assert_eq!(sorted, vec![0, 1, 2]);
        assert!(found.cells.iter().all(|c| c.seed == 0));
    }

    #[test]
    fn test_wrapper_only_case() {
        let e = enumerator(path_cluster(4));
        let c = constraints();
        let seeds = ProjectedPointSet::from_2d(vec![Point2::new(1.5, 0.2), Point2::new(1.5, 50.0)]);
        let options = BoundedCellsOptions::new(bounds(-1.0, -1.0, 10.0, 10.0))
            .with_wrapper_seed_distance(1.0)
            .sequential();
        let found = find_cells_bounded(&e, &c, &seeds, &options).unwrap();
        assert!(found.cells.is_empty());
        let wrapper = found.wrapper.unwrap();
        assert_eq!(wrapper.seed, 0);
        assert_eq!(wrapper.cell.data.area, 0.0);

        let c = constraints();
        let found =
            find_cells_bounded(&e, &c, &seeds, &options.clone().without_sole_wrapper()).unwrap();
        assert!(found.wrapper.is_none());
    }

    #[test]
    fn test_seed_inside_face_does_not_claim_wrapper() {
        let e = enumerator(square_at(0.0, 0.0, 4.0));
        // Cells may not exceed area 1, so the square is rejected but still
        // consumes the seed inside it
        let c = CellConstraints::new(
            CellConstraintsConfig::default().with_area(crate::cells::Limit::at_most(1.0)),
        )
        .unwrap();
        let seeds = ProjectedPointSet::from_2d(vec![Point2::new(2.0, 2.0)]);
        let options = BoundedCellsOptions::new(bounds(-1.0, -1.0, 10.0, 10.0)).sequential();
        let found = find_cells_bounded(&e, &c, &seeds, &options).unwrap();
        assert!(found.cells.is_empty());
        assert!(found.wrapper.is_none());
    }

    #[test]
    fn test_seed_inside_leaf_face_does_not_claim_wrapper() {
        let e = enumerator(square_with_inner_tail());
        // The only bounded face has a leaf and is rejected without a cell
        let c = CellConstraints::new(CellConstraintsConfig::default().omit_leaves()).unwrap();
        let seeds = ProjectedPointSet::from_2d(vec![Point2::new(0.8, 0.8)]);
        let options = BoundedCellsOptions::new(bounds(-1.0, -1.0, 10.0, 10.0)).sequential();
        let found = find_cells_bounded(&e, &c, &seeds, &options).unwrap();
        assert!(found.cells.is_empty());
        assert!(found.wrapper.is_none());

        // A seed outside the square still claims it
        let c = CellConstraints::new(CellConstraintsConfig::default().omit_leaves()).unwrap();
        let seeds = ProjectedPointSet::from_2d(vec![Point2::new(0.8, 0.8), Point2::new(3.0, 0.5)]);
        let found = find_cells_bounded(&e, &c, &seeds, &options).unwrap();
        assert_eq!(found.wrapper.map(|w| w.seed), Some(1));
    }
}
