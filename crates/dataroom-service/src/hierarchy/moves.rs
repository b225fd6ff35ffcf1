//! Planning of folder moves.
//!
//! A move is computed entirely in memory against one snapshot of the
//! dataroom's folders. Nothing is written unless the whole plan is valid.

use std::collections::{BTreeSet, HashMap, HashSet};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use dataroom_core::error::AppError;
use dataroom_core::result::AppResult;
use dataroom_core::types::id::DataroomFolderId;
use dataroom_database::store::FolderRelocation;
use dataroom_entity::folder::DataroomFolder;

use super::path::folder_path;

/// Request to move folders (with their subtrees) under a new parent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MoveFoldersRequest {
    /// Folders to move, in the order they are applied.
    pub folder_ids: Vec<DataroomFolderId>,
    /// New parent, or `None` for the dataroom root.
    pub target_parent_id: Option<DataroomFolderId>,
    /// Path the caller believes the target has. Rejected when stale.
    #[serde(default)]
    pub target_path: Option<String>,
}

/// Names that would end up duplicated under the target.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Folders with these names already exist in the target: {}", .names.join(", "))]
pub struct MoveConflict {
    /// Offending names, each listed once, sorted.
    pub names: Vec<String>,
}

impl From<MoveConflict> for AppError {
    fn from(conflict: MoveConflict) -> Self {
        AppError::conflict(conflict.to_string())
    }
}

/// The rows a move rewrites.
#[derive(Debug, Clone)]
pub struct MovePlan {
    /// One entry per folder whose parent or path changes.
    pub relocations: Vec<FolderRelocation>,
    /// Number of folders moved directly.
    pub moved: usize,
    /// Path of the target folder, `"/"` for the root.
    pub target_path: String,
}

/// Compute the relocations for a move.
///
/// Moves are applied one after another: each moved folder gets the path
/// `target/slug(name)` and every folder below its old path has that prefix
/// replaced. Only the moved folders change parent, and their manual order
/// is dropped.
pub fn plan_move(folders: &[DataroomFolder], request: &MoveFoldersRequest) -> AppResult<MovePlan> {
    if request.folder_ids.is_empty() {
        return Err(AppError::validation("No folders to move"));
    }

    let by_id: HashMap<DataroomFolderId, &DataroomFolder> =
        folders.iter().map(|f| (f.id, f)).collect();

    let mut seen = HashSet::new();
    let mut moving: Vec<&DataroomFolder> = Vec::with_capacity(request.folder_ids.len());
    for id in &request.folder_ids {
        let folder = by_id
            .get(id)
            .ok_or_else(|| AppError::not_found(format!("Folder {id} not found in this dataroom")))?;
        if seen.insert(*id) {
            moving.push(folder);
        }
    }

    let target_path = match request.target_parent_id {
        None => "/".to_string(),
        Some(target_id) => {
            let target = by_id.get(&target_id).ok_or_else(|| {
                AppError::not_found(format!("Target folder {target_id} not found in this dataroom"))
            })?;
            ensure_outside_moved(target, &seen, &by_id)?;
            target.path.clone()
        }
    };

    if let Some(expected) = &request.target_path {
        if *expected != target_path {
            return Err(AppError::conflict(format!(
                "Target path '{expected}' is stale, the target is now at '{target_path}'"
            )));
        }
    }

    let mut offending = BTreeSet::new();
    let existing: HashSet<&str> = folders
        .iter()
        .filter(|f| f.parent_id == request.target_parent_id && !seen.contains(&f.id))
        .map(|f| f.name.as_str())
        .collect();
    let mut batch_names = HashSet::new();
    for folder in &moving {
        if existing.contains(folder.name.as_str()) || !batch_names.insert(folder.name.as_str()) {
            offending.insert(folder.name.clone());
        }
    }

    let mut paths: HashMap<DataroomFolderId, String> =
        folders.iter().map(|f| (f.id, f.path.clone())).collect();
    let parent_path = (target_path != "/").then_some(target_path.as_str());

    for folder in &moving {
        let old = paths.get(&folder.id).cloned().unwrap_or_default();
        let new = folder_path(parent_path, &folder.name);
        if old == new {
            continue;
        }
        let below = format!("{old}/");
        for path in paths.values_mut() {
            if *path == old {
                *path = new.clone();
            } else if let Some(rest) = path.strip_prefix(below.as_str()) {
                *path = format!("{new}/{rest}");
            }
        }
    }

    let mut holders: HashMap<&str, usize> = HashMap::with_capacity(paths.len());
    for path in paths.values() {
        *holders.entry(path.as_str()).or_default() += 1;
    }
    for folder in &moving {
        let taken = paths
            .get(&folder.id)
            .is_some_and(|p| holders.get(p.as_str()).copied().unwrap_or_default() > 1);
        if taken {
            offending.insert(folder.name.clone());
        }
    }

    if !offending.is_empty() {
        return Err(MoveConflict {
            names: offending.into_iter().collect(),
        }
        .into());
    }

    let relocations = folders
        .iter()
        .filter_map(|folder| {
            let moved = seen.contains(&folder.id);
            let path = paths.remove(&folder.id)?;
            (moved || path != folder.path).then(|| FolderRelocation {
                id: folder.id,
                parent_id: if moved {
                    request.target_parent_id
                } else {
                    folder.parent_id
                },
                path,
                moved,
            })
        })
        .collect();

    Ok(MovePlan {
        relocations,
        moved: moving.len(),
        target_path,
    })
}

/// Reject a target that is one of the moved folders or lies below one.
fn ensure_outside_moved(
    target: &DataroomFolder,
    moving: &HashSet<DataroomFolderId>,
    by_id: &HashMap<DataroomFolderId, &DataroomFolder>,
) -> AppResult<()> {
    let mut current = Some(target.id);
    let mut steps = 0;
    while let Some(id) = current {
        if moving.contains(&id) {
            return Err(AppError::validation(
                "Cannot move a folder into itself or one of its descendants",
            ));
        }
        steps += 1;
        if steps > by_id.len() {
            break;
        }
        current = by_id.get(&id).and_then(|f| f.parent_id);
    }
    Ok(())
}
