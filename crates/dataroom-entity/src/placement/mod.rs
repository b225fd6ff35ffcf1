//! Document placement entities.

pub mod model;

pub use model::{DataroomDocument, NewDataroomDocument};
