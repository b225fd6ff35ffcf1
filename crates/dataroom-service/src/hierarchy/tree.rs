//! Tree reconstruction from flat folder and placement rows.
//!
//! The tree is held in an arena: every node lives in [`Forest::nodes`] and
//! refers to its children by position. Index 0 is a synthetic root whose
//! children are the root-level folders and placements of the dataroom.

use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};

use serde::Serialize;
use uuid::Uuid;

use dataroom_entity::folder::{DataroomFolder, NodeKind};
use dataroom_entity::placement::DataroomDocument;

use super::slug::transliterate;

/// Arena position of the synthetic root.
pub const ROOT: usize = 0;

/// One folder or placement in the arena.
#[derive(Debug, Clone)]
pub struct ForestNode {
    /// Folder or placement ID (nil for the synthetic root).
    pub id: Uuid,
    /// Node kind.
    pub kind: NodeKind,
    /// Folder name or document name.
    pub name: String,
    /// Materialized path (folders only).
    pub path: Option<String>,
    /// Manual ordering override.
    pub order_index: Option<i32>,
    /// Index currently stored on the row.
    pub stored_index: Option<String>,
    /// Sorted children, as arena positions.
    pub children: Vec<usize>,
}

/// Why a row could not be attached to the tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UnreachableReason {
    /// The parent folder does not exist in this dataroom.
    MissingParent,
    /// The row sits in a parent cycle or below a row that is unreachable.
    Detached,
}

/// A row that received no position in the tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnreachableNode {
    /// Folder or placement ID.
    pub id: Uuid,
    /// Node kind.
    pub kind: NodeKind,
    /// Folder name or document name.
    pub name: String,
    /// Why it is unreachable.
    pub reason: UnreachableReason,
}

/// A dataroom tree with sorted sibling groups.
#[derive(Debug, Clone)]
pub struct Forest {
    /// Arena of nodes; position [`ROOT`] is the synthetic root.
    pub nodes: Vec<ForestNode>,
    /// Rows that could not be reached from the root.
    pub unreachable: Vec<UnreachableNode>,
}

impl Forest {
    /// Children of the node at `position`.
    pub fn children(&self, position: usize) -> &[usize] {
        &self.nodes[position].children
    }

    /// Number of real nodes reachable from the root.
    pub fn reachable_count(&self) -> usize {
        self.nodes.len() - 1 - self.unreachable.len()
    }
}

/// Total order among siblings.
///
/// Rows with an `order_index` come first, ascending. The rest follow in
/// name order. Remaining ties break by ID so the order never depends on
/// the order rows were loaded in.
pub fn compare_siblings(a: &ForestNode, b: &ForestNode) -> Ordering {
    let by_order = match (a.order_index, b.order_index) {
        (Some(x), Some(y)) => x.cmp(&y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    };

    by_order
        .then_with(|| compare_names(&a.name, &b.name))
        .then_with(|| a.id.cmp(&b.id))
        .then_with(|| a.kind.as_str().cmp(b.kind.as_str()))
}

/// Locale-style name comparison.
///
/// Names compare level by level on a collation key. The primary level
/// ignores case and accents and puts whitespace before punctuation, then
/// digits, then letters. Accents decide next, unaccented first, then case
/// with lowercase first. Byte order settles anything left.
pub fn compare_names(a: &str, b: &str) -> Ordering {
    let (left, right) = (CollationKey::new(a), CollationKey::new(b));

    left.primary
        .cmp(&right.primary)
        .then_with(|| left.secondary.cmp(&right.secondary))
        .then_with(|| left.tertiary.cmp(&right.tertiary))
        .then_with(|| a.cmp(b))
}

#[derive(Debug, Default)]
struct CollationKey {
    primary: Vec<(u8, char)>,
    secondary: Vec<u8>,
    tertiary: Vec<u8>,
}

impl CollationKey {
    fn new(name: &str) -> Self {
        let mut key = Self::default();
        for c in name.chars() {
            let case = u8::from(c.is_uppercase());
            for lower in c.to_lowercase() {
                if ('\u{300}'..='\u{36f}').contains(&lower) {
                    if let Some(accent) = key.secondary.last_mut() {
                        *accent = 1;
                    }
                    continue;
                }
                match transliterate(lower) {
                    "" => key.push((script_class(lower), lower), 0, case),
                    latin => latin.chars().for_each(|base| key.push((3, base), 1, case)),
                }
            }
        }
        key
    }

    fn push(&mut self, primary: (u8, char), accent: u8, case: u8) {
        self.primary.push(primary);
        self.secondary.push(accent);
        self.tertiary.push(case);
    }
}

fn script_class(c: char) -> u8 {
    if c.is_whitespace() {
        0
    } else if c.is_alphabetic() {
        3
    } else if c.is_numeric() {
        2
    } else {
        1
    }
}

/// Rebuild the tree of one dataroom from its rows.
pub fn build_forest(folders: &[DataroomFolder], placements: &[DataroomDocument]) -> Forest {
    let mut nodes = Vec::with_capacity(folders.len() + placements.len() + 1);
    nodes.push(ForestNode {
        id: Uuid::nil(),
        kind: NodeKind::Folder,
        name: String::new(),
        path: Some("/".to_string()),
        order_index: None,
        stored_index: None,
        children: Vec::new(),
    });

    let mut position_of: HashMap<Uuid, usize> = HashMap::with_capacity(folders.len());
    for folder in folders {
        position_of.insert(folder.id.into_uuid(), nodes.len());
        nodes.push(ForestNode {
            id: folder.id.into_uuid(),
            kind: NodeKind::Folder,
            name: folder.name.clone(),
            path: Some(folder.path.clone()),
            order_index: folder.order_index,
            stored_index: folder.hierarchical_index.clone(),
            children: Vec::new(),
        });
    }

    let mut unreachable = Vec::new();
    let mut attach = |nodes: &mut Vec<ForestNode>, child: usize, parent: Option<Uuid>| {
        match parent {
            None => nodes[ROOT].children.push(child),
            Some(parent) => match position_of.get(&parent) {
                Some(&position) => nodes[position].children.push(child),
                None => unreachable.push(unreachable_node(&nodes[child], UnreachableReason::MissingParent)),
            },
        }
    };

    for (offset, folder) in folders.iter().enumerate() {
        attach(&mut nodes, offset + 1, folder.parent_id.map(|p| p.into_uuid()));
    }

    for placement in placements {
        let position = nodes.len();
        nodes.push(ForestNode {
            id: placement.id.into_uuid(),
            kind: NodeKind::Document,
            name: placement.document_name.clone(),
            path: None,
            order_index: placement.order_index,
            stored_index: placement.hierarchical_index.clone(),
            children: Vec::new(),
        });
        attach(&mut nodes, position, placement.folder_id.map(|f| f.into_uuid()));
    }

    // Folders caught in a parent cycle, and everything under them or under a
    // folder with a missing parent, are never reached from the root.
    let mut reached = vec![false; nodes.len()];
    let mut stack = vec![ROOT];
    while let Some(position) = stack.pop() {
        reached[position] = true;
        stack.extend(nodes[position].children.iter().copied());
    }
    let reported: HashSet<Uuid> = unreachable.iter().map(|u| u.id).collect();
    for (position, node) in nodes.iter().enumerate().skip(1) {
        if !reached[position] && !reported.contains(&node.id) {
            unreachable.push(unreachable_node(node, UnreachableReason::Detached));
        }
    }

    let mut order: Vec<Vec<usize>> = nodes.iter().map(|n| n.children.clone()).collect();
    for children in &mut order {
        children.sort_by(|&a, &b| compare_siblings(&nodes[a], &nodes[b]));
    }
    for (node, children) in nodes.iter_mut().zip(order) {
        node.children = children;
    }

    Forest { nodes, unreachable }
}

fn unreachable_node(node: &ForestNode, reason: UnreachableReason) -> UnreachableNode {
    UnreachableNode {
        id: node.id,
        kind: node.kind,
        name: node.name.clone(),
        reason,
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use chrono::Utc;
    use dataroom_core::types::id::{DataroomDocumentId, DataroomFolderId, DataroomId, DocumentId};

    pub(crate) fn folder(
        name: &str,
        path: &str,
        parent: Option<&DataroomFolder>,
        order_index: Option<i32>,
    ) -> DataroomFolder {
        DataroomFolder {
            id: DataroomFolderId::new(),
            dataroom_id: DataroomId::from_uuid(Uuid::nil()),
            parent_id: parent.map(|p| p.id),
            name: name.to_string(),
            path: path.to_string(),
            order_index,
            hierarchical_index: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    pub(crate) fn placement(
        name: &str,
        folder: Option<&DataroomFolder>,
        order_index: Option<i32>,
    ) -> DataroomDocument {
        DataroomDocument {
            id: DataroomDocumentId::new(),
            dataroom_id: DataroomId::from_uuid(Uuid::nil()),
            document_id: DocumentId::new(),
            folder_id: folder.map(|f| f.id),
            order_index,
            hierarchical_index: None,
            document_name: name.to_string(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn names(forest: &Forest, position: usize) -> Vec<&str> {
        forest
            .children(position)
            .iter()
            .map(|&c| forest.nodes[c].name.as_str())
            .collect()
    }

    #[test]
    fn test_ordered_rows_precede_unordered() {
        let legal = folder("Legal", "/legal", None, None);
        let finance = folder("Finance", "/finance", None, None);
        let memo = placement("Memo.pdf", None, Some(1));

        let forest = build_forest(&[legal, finance], &[memo]);
        assert_eq!(names(&forest, ROOT), ["Memo.pdf", "Finance", "Legal"]);
        assert!(forest.unreachable.is_empty());
    }

    #[test]
    fn test_folders_and_documents_share_sibling_space() {
        let a = folder("A", "/a", None, None);
        let x = folder("X", "/a/x", Some(&a), Some(2));
        let doc = placement("Brief.pdf", Some(&a), Some(1));
        let other = placement("Zeta.pdf", Some(&a), None);

        let forest = build_forest(&[a, x], &[other, doc]);
        let a_position = forest.children(ROOT)[0];
        assert_eq!(names(&forest, a_position), ["Brief.pdf", "X", "Zeta.pdf"]);
    }

    #[test]
    fn test_name_comparison_is_locale_like() {
        assert_eq!(compare_names("apple", "Banana"), Ordering::Less);
        assert_eq!(compare_names("a", "A"), Ordering::Less);
        assert_eq!(compare_names("Report", "report"), Ordering::Greater);
        assert_eq!(compare_names("Finance", "Legal"), Ordering::Less);
        assert_eq!(compare_names("same", "same"), Ordering::Equal);
    }

    #[test]
    fn test_accents_and_punctuation_follow_collation_order() {
        assert_eq!(compare_names("Éclair", "Zebra"), Ordering::Less);
        assert_eq!(compare_names("Ärger", "Bank"), Ordering::Less);
        assert_eq!(compare_names("_Notes", "1 Intro"), Ordering::Less);
        assert_eq!(compare_names("1 Intro", "Appendix"), Ordering::Less);
        assert_eq!(compare_names("eclair", "éclair"), Ordering::Less);
        assert_eq!(compare_names("éclair", "Éclair"), Ordering::Less);
        assert_eq!(compare_names("Straße", "Strasse"), Ordering::Greater);
        assert_eq!(compare_names("Cafe\u{301}", "Cafe"), Ordering::Greater);

        let zebra = folder("Zebra", "/zebra", None, None);
        let eclair = folder("Éclair", "/eclair", None, None);
        let notes = folder("_Notes", "/notes", None, None);
        let forest = build_forest(&[zebra, eclair, notes], &[]);
        assert_eq!(names(&forest, ROOT), ["_Notes", "Éclair", "Zebra"]);
    }

    #[test]
    fn test_sort_is_independent_of_input_order() {
        let rows: Vec<DataroomFolder> = ["b", "B", "a", "a", "c"]
            .iter()
            .map(|n| folder(n, &format!("/{n}"), None, None))
            .collect();
        let mut reversed = rows.clone();
        reversed.reverse();

        let ids = |forest: &Forest| -> Vec<Uuid> {
            forest.children(ROOT).iter().map(|&c| forest.nodes[c].id).collect()
        };
        assert_eq!(ids(&build_forest(&rows, &[])), ids(&build_forest(&reversed, &[])));
    }

    #[test]
    fn test_missing_parent_and_cycles_are_unreachable() {
        let ghost = folder("Ghost", "/ghost", None, None);
        let orphan = folder("Orphan", "/ghost/orphan", Some(&ghost), None);
        let below_orphan = placement("Lost.pdf", Some(&orphan), None);

        let mut first = folder("First", "/first", None, None);
        let second = folder("Second", "/first/second", Some(&first), None);
        first.parent_id = Some(second.id);

        let forest = build_forest(&[orphan.clone(), first, second], &[below_orphan]);
        assert!(forest.children(ROOT).is_empty());
        assert_eq!(forest.unreachable.len(), 4);
        let missing: Vec<_> = forest
            .unreachable
            .iter()
            .filter(|u| u.reason == UnreachableReason::MissingParent)
            .map(|u| u.id)
            .collect();
        assert_eq!(missing, [orphan.id.into_uuid()]);
        assert_eq!(forest.reachable_count(), 0);
    }
}
