//! # dataroom-service
//!
//! The hierarchical tree indexer and the services built on it. Pure tree
//! algorithms live in [`hierarchy`]; the services orchestrate them over
//! a [`dataroom_database::TreeStore`] transaction.
//!
//! Services follow constructor injection: all dependencies are provided
//! at construction time via `Arc` references.

pub mod context;
pub mod copy;
pub mod folder;
pub mod hierarchy;
pub mod placement;

pub use context::RequestContext;
pub use copy::CopyService;
pub use folder::{FolderService, MoveResult, ReorderItem};
pub use hierarchy::{HierarchyService, IndexUpdateSummary, IntegrityReport, MoveFoldersRequest};
pub use placement::PlacementService;
