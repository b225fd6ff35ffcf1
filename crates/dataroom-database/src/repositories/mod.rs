//! Repository implementations for dataroom entities.
//!
//! Team-level reads and job writes go through pool-backed repositories.
//! The statements a [`crate::store::TreeTransaction`] needs are free
//! functions generic over the executor, so they run unchanged on a pool or
//! inside an open transaction.

pub mod dataroom;
pub mod document;
pub mod folder;
pub mod job;
pub mod placement;

pub use document::DocumentRepository;
pub use job::JobRepository;
