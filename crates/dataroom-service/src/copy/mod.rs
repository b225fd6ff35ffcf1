//! Dataroom duplication, templates and folder imports.

pub mod service;

pub use service::CopyService;
