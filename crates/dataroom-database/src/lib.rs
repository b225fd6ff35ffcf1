//! # dataroom-database
//!
//! PostgreSQL connection management, repositories for dataroom entities,
//! and the transactional [`store::TreeStore`] seam the tree indexer runs
//! its reads and writes through.
//!
//! The `memory` feature adds an in-process store and job trigger used by
//! tests of the crates above.

pub mod connection;
pub mod error;
pub mod migration;
pub mod repositories;
pub mod store;
pub mod trigger;

pub use connection::DatabasePool;
pub use store::{IsolationLevel, TreeStore, TreeTransaction};
