//! Folder Tree Construction
//!
//! Turns the flat, owner-scoped folder list into nested [`FolderTreeNode`]s.
//! The builder is pure: it never touches the store and tolerates malformed
//! parent links instead of failing.

use crate::models::{Folder, FolderId, FolderTreeNode};
use std::collections::HashMap;

/// Build the nested folder forest from `folders`.
///
/// `folders` should be the owner's active folders in ascending creation
/// order; roots and every child list keep that order.
///
/// - `parent_id == None` makes a root
/// - a parent missing from `folders` (deleted or foreign) demotes the folder
///   to a root
/// - folders whose parent links form a cycle are unreachable from any root;
///   they are demoted to roots after the regular roots, in input order
///
/// Every input folder appears exactly once in the output.
pub fn build_folder_tree(folders: &[Folder]) -> Vec<FolderTreeNode> {
    let index: HashMap<FolderId, usize> = folders
        .iter()
        .enumerate()
        .map(|(i, folder)| (folder.id, i))
        .collect();

    let mut children: Vec<Vec<usize>> = vec![Vec::new(); folders.len()];
    let mut roots = Vec::new();

    for (i, folder) in folders.iter().enumerate() {
        match folder.parent_id.and_then(|parent_id| index.get(&parent_id)) {
            Some(&parent) => children[parent].push(i),
            None => roots.push(i),
        }
    }

    let mut placed = vec![false; folders.len()];
    let mut tree = Vec::with_capacity(roots.len());
    for i in roots {
        assemble_into(i, folders, &children, &mut placed, &mut tree);
    }

    for i in 0..folders.len() {
        if !placed[i] {
            tracing::warn!(
                "Folder {} (owner {}) is part of a parent cycle, showing it as a root",
                folders[i].id,
                folders[i].owner_id
            );
            assemble_into(i, folders, &children, &mut placed, &mut tree);
        }
    }

    tree
}

/// A node under construction and the position of its next unvisited child
struct Frame {
    index: usize,
    next_child: usize,
    node: FolderTreeNode,
}

impl Frame {
    fn new(index: usize, folder: &Folder) -> Self {
        Self {
            index,
            next_child: 0,
            node: FolderTreeNode::from(folder),
        }
    }
}

/// Assemble the subtree rooted at `root` and push it onto `tree`.
///
/// Depth-first with an explicit stack so nesting depth is bounded by heap,
/// not by the thread's call stack.
fn assemble_into(
    root: usize,
    folders: &[Folder],
    children: &[Vec<usize>],
    placed: &mut [bool],
    tree: &mut Vec<FolderTreeNode>,
) {
    placed[root] = true;
    let mut stack = vec![Frame::new(root, &folders[root])];

    while let Some(mut frame) = stack.pop() {
        if let Some(&child) = children[frame.index].get(frame.next_child) {
            frame.next_child += 1;
            stack.push(frame);
            if !placed[child] {
                placed[child] = true;
                stack.push(Frame::new(child, &folders[child]));
            }
            continue;
        }

        match stack.last_mut() {
            Some(parent) => parent.node.children.push(frame.node),
            None => tree.push(frame.node),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};

    fn folder(id: FolderId, parent_id: Option<FolderId>) -> Folder {
        Folder {
            id,
            owner_id: 1,
            name: format!("folder-{}", id),
            parent_id,
            is_deleted: false,
            created_at: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap() + Duration::seconds(id),
        }
    }

    fn flatten(nodes: &[FolderTreeNode], out: &mut Vec<FolderId>) {
        for node in nodes {
            out.push(node.id);
            flatten(&node.children, out);
        }
    }

    fn ids(nodes: &[FolderTreeNode]) -> Vec<FolderId> {
        nodes.iter().map(|n| n.id).collect()
    }

    #[test]
    fn test_empty_input_gives_empty_forest() {
        assert!(build_folder_tree(&[]).is_empty());
    }

    #[test]
    fn test_nested_tree_keeps_input_order() {
        let folders = vec![
            folder(1, None),
            folder(2, None),
            folder(3, Some(2)),
            folder(4, Some(1)),
            folder(5, Some(2)),
            folder(6, Some(3)),
        ];

        let tree = build_folder_tree(&folders);

        assert_eq!(ids(&tree), vec![1, 2]);
        assert_eq!(ids(&tree[0].children), vec![4]);
        assert_eq!(ids(&tree[1].children), vec![3, 5]);
        assert_eq!(ids(&tree[1].children[0].children), vec![6]);
    }

    #[test]
    fn test_child_listed_before_parent_still_nests() {
        let folders = vec![folder(3, Some(1)), folder(1, None)];

        let tree = build_folder_tree(&folders);

        assert_eq!(ids(&tree), vec![1]);
        assert_eq!(ids(&tree[0].children), vec![3]);
    }

    #[test]
    fn test_orphan_becomes_root() {
        // Parent 10 was deleted, so it is not in the active list
        let folders = vec![folder(1, None), folder(11, Some(10)), folder(12, Some(11))];

        let tree = build_folder_tree(&folders);

        assert_eq!(ids(&tree), vec![1, 11]);
        assert_eq!(ids(&tree[1].children), vec![12]);
    }

    #[test]
    fn test_cycle_members_are_demoted_not_dropped() {
        let folders = vec![
            folder(1, None),
            folder(2, Some(4)),
            folder(3, Some(2)),
            folder(4, Some(3)),
            folder(5, Some(5)),
        ];

        let tree = build_folder_tree(&folders);

        let mut all = Vec::new();
        flatten(&tree, &mut all);
        all.sort_unstable();
        assert_eq!(all, vec![1, 2, 3, 4, 5]);

        // First cycle member in input order becomes the root of its loop
        assert_eq!(ids(&tree), vec![1, 2, 5]);
        assert_eq!(ids(&tree[1].children), vec![3]);
        assert_eq!(ids(&tree[1].children[0].children), vec![4]);
        assert!(tree[2].children.is_empty());
    }

    #[test]
    fn test_deep_chain_builds_without_recursion() {
        let depth: FolderId = 20_000;
        let folders: Vec<Folder> = (1..=depth)
            .map(|id| folder(id, if id == 1 { None } else { Some(id - 1) }))
            .collect();

        let tree = build_folder_tree(&folders);
        assert_eq!(ids(&tree), vec![1]);

        let mut levels = 0;
        let mut current = tree.first();
        while let Some(node) = current {
            levels += 1;
            assert!(node.children.len() <= 1);
            current = node.children.first();
        }
        assert_eq!(levels, depth);
        assert_eq!(tree[0].subtree_len(), depth as usize);
    }

    #[test]
    fn test_every_folder_appears_once() {
        let folders: Vec<Folder> = (1..=50)
            .map(|id| folder(id, if id % 5 == 1 { None } else { Some(id - 1) }))
            .collect();

        let tree = build_folder_tree(&folders);

        let mut all = Vec::new();
        flatten(&tree, &mut all);
        assert_eq!(all.len(), 50);
        assert_eq!(tree.iter().map(FolderTreeNode::subtree_len).sum::<usize>(), 50);
    }
}
