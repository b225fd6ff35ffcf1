//! Folder creation, moves and manual ordering.

pub mod service;

pub use service::{FolderService, MoveResult, ReorderItem};
