//! Cell building, filtering and seed-based selection.

pub mod cell;
pub mod constraints;
pub mod sharded;
pub mod triage;
pub mod wrapper;

pub use cell::{canonical_cycle, cell_hash, Cell, CellData, CellResult};
pub use constraints::{
    outcome_result, AspectFilter, CellConstraints, CellConstraintsConfig, CellOutcome, Limit,
    Rejection,
};
pub use sharded::{ShardedHashSet, DEFAULT_SHARDS};
pub use triage::{
    classify_bounds, find_cells_bounded, BoundedCells, BoundedCellsOptions, SeedGrowth,
    SeedOwnership, SeedOwnershipHandler, SeededCell, SortDirection, SortRule, TriageFilter,
    TriageResult,
};
pub use wrapper::{build_wrapper_cell, select_wrapper, tree_walk};
