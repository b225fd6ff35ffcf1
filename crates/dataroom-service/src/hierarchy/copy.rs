//! Staging of generated folder trees.
//!
//! Duplication, templates and folder imports all build the complete set of
//! new rows in memory first, with identifiers and paths assigned, so the
//! rows can be inserted in one transaction.

use std::collections::HashMap;

use uuid::Uuid;

use dataroom_core::types::id::{DataroomDocumentId, DataroomFolderId, DataroomId, DocumentId, FolderId};
use dataroom_database::store::FolderSubtree;
use dataroom_entity::document::{Document, TeamFolder};
use dataroom_entity::folder::{DataroomFolder, NewDataroomFolder, NodeKind};
use dataroom_entity::placement::NewDataroomDocument;
use dataroom_entity::template::TemplateFolder;

use super::path::folder_path;
use super::slug::PathAllocator;
use super::tree::{Forest, ROOT, compare_names};

/// A folder already staged in a plan.
#[derive(Debug, Clone)]
pub struct PlannedFolder {
    /// Identifier the folder will be inserted with.
    pub id: DataroomFolderId,
    /// Path the folder will be inserted with.
    pub path: String,
}

/// New rows for one dataroom, parents always ahead of their children.
#[derive(Debug)]
pub struct CopyPlan {
    dataroom_id: DataroomId,
    paths: PathAllocator,
    /// Staged folders in pre-order.
    pub folders: Vec<NewDataroomFolder>,
    /// Staged placements.
    pub placements: Vec<NewDataroomDocument>,
}

impl CopyPlan {
    /// Start an empty plan for `dataroom_id`.
    pub fn new(dataroom_id: DataroomId) -> Self {
        Self {
            dataroom_id,
            paths: PathAllocator::new(),
            folders: Vec::new(),
            placements: Vec::new(),
        }
    }

    /// Stage a folder. Same-slug siblings get numbered paths.
    pub fn add_folder(&mut self, parent: Option<&PlannedFolder>, name: &str) -> PlannedFolder {
        let path = self
            .paths
            .claim(folder_path(parent.map(|p| p.path.as_str()), name));
        let planned = PlannedFolder {
            id: DataroomFolderId::new(),
            path: path.clone(),
        };
        self.folders.push(NewDataroomFolder {
            id: planned.id,
            dataroom_id: self.dataroom_id,
            parent_id: parent.map(|p| p.id),
            name: name.to_string(),
            path,
        });
        planned
    }

    /// Stage a placement of an existing document.
    pub fn add_placement(
        &mut self,
        document_id: DocumentId,
        folder: Option<&PlannedFolder>,
    ) -> DataroomDocumentId {
        let id = DataroomDocumentId::new();
        self.placements.push(NewDataroomDocument {
            id,
            dataroom_id: self.dataroom_id,
            document_id,
            folder_id: folder.map(|f| f.id),
        });
        id
    }

    /// Copy every reachable node of a dataroom tree.
    ///
    /// `documents` maps placement IDs of the source to the documents they
    /// point at; the copies point at the same documents.
    pub fn from_forest(
        dataroom_id: DataroomId,
        forest: &Forest,
        documents: &HashMap<Uuid, DocumentId>,
    ) -> Self {
        let mut plan = Self::new(dataroom_id);
        let mut stack: Vec<(usize, Option<PlannedFolder>)> = forest
            .children(ROOT)
            .iter()
            .rev()
            .map(|&position| (position, None))
            .collect();

        while let Some((position, parent)) = stack.pop() {
            let node = &forest.nodes[position];
            match node.kind {
                NodeKind::Folder => {
                    let planned = plan.add_folder(parent.as_ref(), &node.name);
                    for &child in node.children.iter().rev() {
                        stack.push((child, Some(planned.clone())));
                    }
                }
                NodeKind::Document => {
                    if let Some(&document_id) = documents.get(&node.id) {
                        plan.add_placement(document_id, parent.as_ref());
                    }
                }
            }
        }

        plan
    }

    /// Stage the folders of a template at the dataroom root.
    pub fn from_templates(dataroom_id: DataroomId, templates: &[TemplateFolder]) -> Self {
        let mut plan = Self::new(dataroom_id);
        let mut stack: Vec<(&TemplateFolder, Option<PlannedFolder>)> =
            templates.iter().rev().map(|t| (t, None)).collect();

        while let Some((template, parent)) = stack.pop() {
            let planned = plan.add_folder(parent.as_ref(), &template.name);
            for child in template.sub_folders.iter().rev() {
                stack.push((child, Some(planned.clone())));
            }
        }

        plan
    }

    /// Stage the contents of a team folder at the dataroom root.
    ///
    /// The team folder itself is not copied: its subfolders become root
    /// folders and its documents root placements.
    pub fn from_team_folder(dataroom_id: DataroomId, subtree: &FolderSubtree) -> Self {
        let mut child_folders: HashMap<FolderId, Vec<&TeamFolder>> = HashMap::new();
        for folder in &subtree.folders {
            if let Some(parent) = folder.parent_id {
                child_folders.entry(parent).or_default().push(folder);
            }
        }
        for children in child_folders.values_mut() {
            children.sort_by(|a, b| compare_names(&a.name, &b.name).then(a.id.cmp(&b.id)));
        }

        let mut documents_in: HashMap<FolderId, Vec<&Document>> = HashMap::new();
        for document in &subtree.documents {
            if let Some(folder) = document.folder_id {
                documents_in.entry(folder).or_default().push(document);
            }
        }

        let mut plan = Self::new(dataroom_id);
        let mut stack: Vec<(FolderId, Option<PlannedFolder>)> = vec![(subtree.root.id, None)];
        while let Some((source, planned)) = stack.pop() {
            for document in documents_in.get(&source).into_iter().flatten() {
                plan.add_placement(document.id, planned.as_ref());
            }
            let copies: Vec<_> = child_folders
                .get(&source)
                .into_iter()
                .flatten()
                .map(|child| (child.id, plan.add_folder(planned.as_ref(), &child.name)))
                .collect();
            stack.extend(copies.into_iter().rev().map(|(id, copy)| (id, Some(copy))));
        }

        plan
    }

    /// Names of staged folders whose paths are already used in the dataroom.
    pub fn conflicts_with(&self, existing: &[DataroomFolder]) -> Vec<String> {
        let taken: std::collections::HashSet<&str> =
            existing.iter().map(|f| f.path.as_str()).collect();
        let mut names: Vec<String> = self
            .folders
            .iter()
            .filter(|f| taken.contains(f.path.as_str()))
            .map(|f| f.name.clone())
            .collect();
        names.sort();
        names.dedup();
        names
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hierarchy::tree::build_forest;
    use crate::hierarchy::tree::tests::{folder, placement};
    use chrono::Utc;
    use dataroom_core::types::id::TeamId;

    #[test]
    fn test_forest_copy_keeps_shape_and_documents() {
        let outer = folder("Outer", "/outer", None, None);
        let inner = folder("Inner", "/outer/inner", Some(&outer), None);
        let first = placement("One.pdf", Some(&outer), None);
        let second = placement("Two.pdf", Some(&inner), None);

        let forest = build_forest(&[outer, inner], &[first.clone(), second.clone()]);
        let documents = [&first, &second]
            .iter()
            .map(|p| (p.id.into_uuid(), p.document_id))
            .collect();
        let plan = CopyPlan::from_forest(DataroomId::new(), &forest, &documents);

        assert_eq!(plan.folders.len(), 2);
        assert_eq!(plan.folders[0].path, "/outer");
        assert_eq!(plan.folders[1].path, "/outer/inner");
        assert_eq!(plan.folders[1].parent_id, Some(plan.folders[0].id));

        let mut copied: Vec<_> = plan.placements.iter().map(|p| p.document_id).collect();
        copied.sort();
        let mut original = vec![first.document_id, second.document_id];
        original.sort();
        assert_eq!(copied, original);
        assert!(plan.placements.iter().all(|p| p.folder_id.is_some()));
    }

    #[test]
    fn test_same_slug_siblings_get_suffixes() {
        let templates = vec![
            TemplateFolder::leaf("Reports"),
            TemplateFolder::leaf("reports"),
            TemplateFolder::with_children(
                "Legal",
                vec![TemplateFolder::leaf("NDA"), TemplateFolder::leaf("N.D.A")],
            ),
        ];
        let plan = CopyPlan::from_templates(DataroomId::new(), &templates);
        let paths: Vec<_> = plan.folders.iter().map(|f| f.path.as_str()).collect();
        assert_eq!(
            paths,
            ["/reports", "/reports-1", "/legal", "/legal/nda", "/legal/n-d-a"]
        );
    }

    #[test]
    fn test_team_folder_contents_become_root_rows() {
        let team = TeamId::new();
        let now = Utc::now();
        let root = TeamFolder {
            id: FolderId::new(),
            team_id: team,
            parent_id: None,
            name: "Board".to_string(),
            path: "/board".to_string(),
            created_at: now,
        };
        let minutes = TeamFolder {
            id: FolderId::new(),
            team_id: team,
            parent_id: Some(root.id),
            name: "Minutes".to_string(),
            path: "/board/minutes".to_string(),
            created_at: now,
        };
        let document = |name: &str, folder: FolderId| Document {
            id: DocumentId::new(),
            team_id: team,
            folder_id: Some(folder),
            name: name.to_string(),
            created_at: now,
        };
        let subtree = FolderSubtree {
            root: root.clone(),
            folders: vec![minutes.clone()],
            documents: vec![document("Charter.pdf", root.id), document("Jan.pdf", minutes.id)],
        };

        let plan = CopyPlan::from_team_folder(DataroomId::new(), &subtree);
        assert_eq!(plan.folders.len(), 1);
        assert_eq!(plan.folders[0].path, "/minutes");
        assert_eq!(plan.folders[0].parent_id, None);
        assert_eq!(plan.placements.len(), 2);
        assert_eq!(
            plan.placements.iter().filter(|p| p.folder_id.is_none()).count(),
            1
        );
    }

    #[test]
    fn test_conflicts_with_existing_paths() {
        let existing = vec![folder("Legal", "/legal", None, None)];
        let plan = CopyPlan::from_templates(
            DataroomId::new(),
            &[TemplateFolder::leaf("Legal"), TemplateFolder::leaf("Team")],
        );
        assert_eq!(plan.conflicts_with(&existing), ["Legal"]);
    }
}
