//! Core type definitions used across the dataroom workspace.

pub mod id;

pub use id::*;
