//! Document placements.

pub mod service;

pub use service::PlacementService;
