//! Core traits defined in `dataroom-core` and implemented by other crates.

pub mod job_trigger;

pub use job_trigger::{JobRequest, JobTrigger};
