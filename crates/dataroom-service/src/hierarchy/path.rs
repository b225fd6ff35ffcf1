//! Materialized path construction and verification.

use std::collections::{HashMap, HashSet};

use serde::Serialize;

use dataroom_core::types::id::DataroomFolderId;
use dataroom_entity::folder::DataroomFolder;

use super::slug::slugify;

/// Path of a folder named `name` under a folder at `parent_path`.
///
/// `None` and `"/"` both mean the dataroom root.
pub fn folder_path(parent_path: Option<&str>, name: &str) -> String {
    match parent_path {
        None | Some("/") => format!("/{}", slugify(name)),
        Some(parent) => format!("{parent}/{}", slugify(name)),
    }
}

/// What is wrong with a stored path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PathProblem {
    /// The path does not match the one rebuilt from the parent.
    Mismatch,
    /// The parent folder does not exist.
    DanglingParent,
    /// Following parents leads back to the folder.
    Cycle,
}

/// A folder whose stored path disagrees with its parent chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PathMismatch {
    /// The offending folder.
    pub folder_id: DataroomFolderId,
    /// Path stored on the row.
    pub stored: String,
    /// Path rebuilt from the parent, when one could be built.
    pub expected: Option<String>,
    /// Kind of problem.
    pub problem: PathProblem,
}

/// Verify that every stored path can be rebuilt from the parent chain.
///
/// A path is accepted when it equals the parent's path plus the slug of the
/// folder name, optionally followed by a `-N` suffix given to same-slug
/// siblings. Checking each folder against its parent's stored path is
/// enough: by induction the whole chain is then consistent.
pub fn check_paths(folders: &[DataroomFolder]) -> Vec<PathMismatch> {
    let by_id: HashMap<DataroomFolderId, &DataroomFolder> =
        folders.iter().map(|f| (f.id, f)).collect();
    let cyclic = cyclic_folders(folders, &by_id);
    let mut problems = Vec::new();

    for folder in folders {
        let parent_path = match folder.parent_id {
            None => None,
            Some(parent_id) => match by_id.get(&parent_id) {
                Some(parent) => Some(parent.path.as_str()),
                None => {
                    problems.push(PathMismatch {
                        folder_id: folder.id,
                        stored: folder.path.clone(),
                        expected: None,
                        problem: PathProblem::DanglingParent,
                    });
                    continue;
                }
            },
        };

        if cyclic.contains(&folder.id) {
            problems.push(PathMismatch {
                folder_id: folder.id,
                stored: folder.path.clone(),
                expected: None,
                problem: PathProblem::Cycle,
            });
            continue;
        }

        let expected = folder_path(parent_path, &folder.name);
        if !matches_with_suffix(&folder.path, &expected) {
            problems.push(PathMismatch {
                folder_id: folder.id,
                stored: folder.path.clone(),
                expected: Some(expected),
                problem: PathProblem::Mismatch,
            });
        }
    }

    problems
}

fn matches_with_suffix(stored: &str, expected: &str) -> bool {
    match stored.strip_prefix(expected) {
        Some("") => true,
        Some(rest) => rest
            .strip_prefix('-')
            .is_some_and(|n| !n.is_empty() && n.bytes().all(|b| b.is_ascii_digit())),
        None => false,
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Walk {
    Visiting,
    Rooted,
    Cyclic,
}

/// Folders whose parent chain never ends, in one pass.
///
/// Each folder is walked at most once; a walk stops at the first folder
/// whose outcome is already known and hands that outcome down the chain.
fn cyclic_folders(
    folders: &[DataroomFolder],
    by_id: &HashMap<DataroomFolderId, &DataroomFolder>,
) -> HashSet<DataroomFolderId> {
    let mut state: HashMap<DataroomFolderId, Walk> = HashMap::with_capacity(folders.len());
    let mut chain = Vec::new();

    for folder in folders {
        let mut current = Some(folder.id);
        let outcome = loop {
            let Some(id) = current else {
                break Walk::Rooted;
            };
            match state.get(&id) {
                Some(Walk::Visiting) => break Walk::Cyclic,
                Some(&known) => break known,
                None => {}
            }
            let Some(row) = by_id.get(&id) else {
                break Walk::Rooted;
            };
            state.insert(id, Walk::Visiting);
            chain.push(id);
            current = row.parent_id;
        };
        for id in chain.drain(..) {
            state.insert(id, outcome);
        }
    }

    state
        .into_iter()
        .filter(|(_, walk)| *walk == Walk::Cyclic)
        .map(|(id, _)| id)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hierarchy::tree::tests::folder;

    #[test]
    fn test_folder_path_at_root_and_below() {
        assert_eq!(folder_path(None, "Q1 Reports"), "/q1-reports");
        assert_eq!(folder_path(Some("/"), "Legal"), "/legal");
        assert_eq!(folder_path(Some("/finance"), "Q1"), "/finance/q1");
    }

    #[test]
    fn test_consistent_paths_pass() {
        let finance = folder("Finance", "/finance", None, None);
        let q1 = folder("Q1", "/finance/q1", Some(&finance), None);
        let q1_again = folder("Q1", "/finance/q1-1", Some(&finance), None);
        assert!(check_paths(&[finance, q1, q1_again]).is_empty());
    }

    #[test]
    fn test_stale_descendant_path_is_flagged() {
        let finance = folder("Finance", "/finance", None, None);
        let q1 = folder("Q1", "/legal/q1", Some(&finance), None);
        let problems = check_paths(&[finance, q1.clone()]);
        assert_eq!(problems.len(), 1);
        assert_eq!(problems[0].folder_id, q1.id);
        assert_eq!(problems[0].expected.as_deref(), Some("/finance/q1"));
        assert_eq!(problems[0].problem, PathProblem::Mismatch);
    }

    #[test]
    fn test_dangling_and_cyclic_parents_are_flagged() {
        let ghost = folder("Ghost", "/ghost", None, None);
        let orphan = folder("Orphan", "/ghost/orphan", Some(&ghost), None);
        let mut a = folder("A", "/a", None, None);
        let b = folder("B", "/a/b", Some(&a), None);
        a.parent_id = Some(b.id);

        let problems = check_paths(&[orphan, a, b]);
        let kinds: Vec<_> = problems.iter().map(|p| p.problem).collect();
        assert_eq!(
            kinds,
            [PathProblem::DanglingParent, PathProblem::Cycle, PathProblem::Cycle]
        );
    }

    #[test]
    fn test_deep_chain_checks_in_one_pass() {
        let mut folders = vec![folder("n", "/n", None, None)];
        for depth in 1..5_000 {
            let parent = folders[depth - 1].clone();
            let path = format!("{}/n", parent.path);
            folders.push(folder("n", &path, Some(&parent), None));
        }
        assert!(check_paths(&folders).is_empty());

        let mut a = folder("A", "/a", None, None);
        let b = folder("B", "/a/b", Some(&a), None);
        a.parent_id = Some(b.id);
        let under_cycle = folder("Below", "/a/b/below", Some(&b), None);
        let problems = check_paths(&[under_cycle, a, b]);
        assert!(problems.iter().all(|p| p.problem == PathProblem::Cycle));
        assert_eq!(problems.len(), 3);
    }
}
