//! Dataroom folder domain entities.

pub mod model;
pub mod tree;

pub use model::{DataroomFolder, NewDataroomFolder};
pub use tree::{NodeKind, TreeNode};
