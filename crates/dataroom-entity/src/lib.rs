//! # dataroom-entity
//!
//! Domain entity models for the dataroom tree indexer. Every struct in this
//! crate represents a database table row or a domain value object. All
//! entities derive `Debug`, `Clone`, `Serialize`, `Deserialize`, and
//! database entities additionally derive `sqlx::FromRow`.

pub mod dataroom;
pub mod document;
pub mod folder;
pub mod job;
pub mod placement;
pub mod template;
