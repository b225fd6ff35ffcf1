//! The hierarchical tree indexer.
//!
//! Pure tree algorithms (reconstruction, ordering, numbering, path and move
//! planning, copy staging) plus the service that persists indexes.

pub mod copy;
pub mod index;
pub mod moves;
pub mod path;
pub mod service;
pub mod slug;
pub mod tree;

pub use copy::CopyPlan;
pub use index::{IndexedNode, assign_indexes};
pub use moves::{MoveConflict, MoveFoldersRequest, MovePlan, plan_move};
pub use path::{PathMismatch, PathProblem, check_paths, folder_path};
pub use service::{HierarchyService, IndexUpdateSummary, IntegrityReport, RECOMPUTE_FAILED};
pub use slug::slugify;
pub use tree::{Forest, ForestNode, UnreachableNode, build_forest, compare_siblings};
