//! Folder templates used to generate dataroom structures.

pub mod catalog;
pub mod model;

pub use catalog::{builtin_template, builtin_templates, DataroomTemplate};
pub use model::TemplateFolder;
