//! Job trigger implementations.

#[cfg(feature = "memory")]
pub mod memory;
pub mod postgres;

#[cfg(feature = "memory")]
pub use memory::RecordingJobTrigger;
pub use postgres::PgJobTrigger;
