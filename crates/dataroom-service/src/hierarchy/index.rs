//! Dotted hierarchical index assignment.

use serde::Serialize;
use uuid::Uuid;

use dataroom_entity::folder::{NodeKind, TreeNode};

use super::tree::{Forest, ROOT};

/// A node with its freshly computed index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IndexedNode {
    /// Folder or placement ID.
    pub id: Uuid,
    /// Node kind.
    pub kind: NodeKind,
    /// Dotted index, e.g. `"2.1.3"`.
    pub hierarchical_index: String,
    /// Depth below the synthetic root, 1 for root-level rows.
    pub depth: usize,
}

struct Visit {
    position: usize,
    parent: usize,
    index: String,
    depth: usize,
}

/// Visit every reachable node depth first, parents before children.
fn preorder(forest: &Forest) -> Vec<Visit> {
    let mut visits = Vec::with_capacity(forest.nodes.len().saturating_sub(1));
    let mut stack: Vec<Visit> = forest
        .children(ROOT)
        .iter()
        .enumerate()
        .rev()
        .map(|(rank, &position)| Visit {
            position,
            parent: ROOT,
            index: (rank + 1).to_string(),
            depth: 1,
        })
        .collect();

    while let Some(visit) = stack.pop() {
        for (rank, &child) in forest.children(visit.position).iter().enumerate().rev() {
            stack.push(Visit {
                position: child,
                parent: visit.position,
                index: format!("{}.{}", visit.index, rank + 1),
                depth: visit.depth + 1,
            });
        }
        visits.push(visit);
    }

    visits
}

/// Number every reachable node by its rank path from the root.
///
/// The result is in depth-first pre-order. It depends only on the shape
/// and sibling order of the forest, never on previously stored indexes.
pub fn assign_indexes(forest: &Forest) -> Vec<IndexedNode> {
    preorder(forest)
        .into_iter()
        .map(|visit| {
            let node = &forest.nodes[visit.position];
            IndexedNode {
                id: node.id,
                kind: node.kind,
                hierarchical_index: visit.index,
                depth: visit.depth,
            }
        })
        .collect()
}

/// Render a forest as pre-order rows with freshly computed indexes.
pub fn to_tree_nodes(forest: &Forest) -> Vec<TreeNode> {
    preorder(forest)
        .into_iter()
        .map(|visit| {
            let node = &forest.nodes[visit.position];
            TreeNode {
                id: node.id,
                kind: node.kind,
                parent_id: (visit.parent != ROOT).then(|| forest.nodes[visit.parent].id),
                name: node.name.clone(),
                path: node.path.clone(),
                order_index: node.order_index,
                hierarchical_index: visit.index,
                depth: visit.depth,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hierarchy::tree::build_forest;
    use crate::hierarchy::tree::tests::{folder, placement};

    fn index_of(indexed: &[IndexedNode], id: Uuid) -> &str {
        indexed
            .iter()
            .find(|n| n.id == id)
            .map(|n| n.hierarchical_index.as_str())
            .unwrap()
    }

    #[test]
    fn test_root_documents_and_folders_are_numbered_together() {
        let finance = folder("Finance", "/finance", None, None);
        let legal = folder("Legal", "/legal", None, None);
        let memo = placement("Memo.pdf", None, Some(1));

        let forest = build_forest(&[legal.clone(), finance.clone()], &[memo.clone()]);
        let indexed = assign_indexes(&forest);

        assert_eq!(index_of(&indexed, memo.id.into_uuid()), "1");
        assert_eq!(index_of(&indexed, finance.id.into_uuid()), "2");
        assert_eq!(index_of(&indexed, legal.id.into_uuid()), "3");
    }

    #[test]
    fn test_manual_order_controls_child_numbering() {
        let a = folder("A", "/a", None, None);
        let x = folder("X", "/a/x", Some(&a), Some(2));
        let y = folder("Y", "/a/y", Some(&a), Some(1));

        let forest = build_forest(&[a.clone(), x.clone(), y.clone()], &[]);
        let indexed = assign_indexes(&forest);

        assert_eq!(index_of(&indexed, a.id.into_uuid()), "1");
        assert_eq!(index_of(&indexed, y.id.into_uuid()), "1.1");
        assert_eq!(index_of(&indexed, x.id.into_uuid()), "1.2");
        let order: Vec<_> = indexed.iter().map(|n| n.hierarchical_index.as_str()).collect();
        assert_eq!(order, ["1", "1.1", "1.2"]);
    }

    #[test]
    fn test_depth_matches_index_components() {
        let a = folder("A", "/a", None, None);
        let b = folder("B", "/a/b", Some(&a), None);
        let c = folder("C", "/a/b/c", Some(&b), None);
        let doc = placement("Deep.pdf", Some(&c), None);
        let top = placement("Top.pdf", None, None);

        let forest = build_forest(&[a, b, c], &[doc, top]);
        for node in assign_indexes(&forest) {
            assert_eq!(node.hierarchical_index.split('.').count(), node.depth);
        }
    }

    #[test]
    fn test_deep_chain_does_not_overflow() {
        let mut folders = vec![folder("n", "/n", None, None)];
        for depth in 1..3_000 {
            let parent = folders[depth - 1].clone();
            let path = format!("{}/n", parent.path);
            folders.push(folder("n", &path, Some(&parent), None));
        }

        let forest = build_forest(&folders, &[]);
        let indexed = assign_indexes(&forest);
        assert_eq!(indexed.len(), 3_000);
        assert_eq!(indexed.last().unwrap().depth, 3_000);
    }

    #[test]
    fn test_unreachable_rows_receive_no_index() {
        let ghost = folder("Ghost", "/ghost", None, None);
        let orphan = folder("Orphan", "/ghost/orphan", Some(&ghost), None);
        let kept = folder("Kept", "/kept", None, None);

        let forest = build_forest(&[orphan, kept.clone()], &[]);
        let indexed = assign_indexes(&forest);
        assert_eq!(indexed.len(), 1);
        assert_eq!(indexed[0].id, kept.id.into_uuid());
    }

    #[test]
    fn test_tree_rows_follow_parents() {
        let a = folder("A", "/a", None, None);
        let doc = placement("Inside.pdf", Some(&a), None);
        let top = placement("Top.pdf", None, None);

        let forest = build_forest(&[a.clone()], &[doc.clone(), top]);
        let rows = to_tree_nodes(&forest);
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].id, a.id.into_uuid());
        assert_eq!(rows[0].parent_id, None);
        assert_eq!(rows[1].id, doc.id.into_uuid());
        assert_eq!(rows[1].parent_id, Some(a.id.into_uuid()));
        assert_eq!(rows[1].hierarchical_index, "1.1");
        assert_eq!(rows[1].kind, NodeKind::Document);
        assert_eq!(rows[1].depth, 2);
        assert_eq!(rows[2].hierarchical_index, "2");
    }

    #[test]
    fn test_deep_tree_view_is_flat() {
        let mut folders = vec![folder("n", "/n", None, None)];
        for depth in 1..10_000 {
            let parent = folders[depth - 1].clone();
            folders.push(folder("n", "/n", Some(&parent), None));
        }

        let forest = build_forest(&folders, &[]);
        let rows = to_tree_nodes(&forest);
        assert_eq!(rows.len(), 10_000);
        assert_eq!(rows.last().unwrap().depth, 10_000);
        assert_eq!(
            rows.last().unwrap().parent_id,
            Some(folders[9_998].id.into_uuid())
        );

        let json = serde_json::to_string(&rows).unwrap();
        assert!(json.starts_with('['));
        drop(rows);
    }
}
