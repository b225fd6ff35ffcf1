//! Underlying documents and regular team folders.

pub mod model;

pub use model::{Document, TeamFolder};
