//! Template folder model.

use serde::{Deserialize, Serialize};
use validator::Validate;

/// A folder in a template, with its nested sub-folders.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct TemplateFolder {
    /// Folder name.
    #[validate(length(min = 1, max = 255))]
    pub name: String,
    /// Nested folders, created in order.
    #[serde(default)]
    #[validate(nested)]
    pub sub_folders: Vec<TemplateFolder>,
}

impl TemplateFolder {
    /// A folder without children.
    pub fn leaf(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            sub_folders: Vec::new(),
        }
    }

    /// A folder with the given children.
    pub fn with_children(name: impl Into<String>, sub_folders: Vec<TemplateFolder>) -> Self {
        Self {
            name: name.into(),
            sub_folders,
        }
    }

    /// Number of folders this template creates, including itself.
    pub fn folder_count(&self) -> usize {
        1 + self
            .sub_folders
            .iter()
            .map(TemplateFolder::folder_count)
            .sum::<usize>()
    }
}
