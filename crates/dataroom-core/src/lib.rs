//! # dataroom-core
//!
//! Core crate for the dataroom tree indexer. Contains the configuration
//! schema, typed identifiers, the job trigger trait, and the unified
//! error system.
//!
//! This crate has **no** internal dependencies on other dataroom crates.

pub mod config;
pub mod error;
pub mod result;
pub mod traits;
pub mod types;

pub use error::AppError;
pub use result::AppResult;
