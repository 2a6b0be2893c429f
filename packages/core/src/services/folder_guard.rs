//! Parent Reference Validation
//!
//! `FolderGuard` checks that a prospective parent folder exists, belongs to
//! the owner, is not the default folder, and (for moves) does not lie inside
//! the subtree of the folder being moved.

use crate::db::FolderStore;
use crate::models::{Folder, FolderId, OwnerId};
use crate::services::error::{
    FolderServiceError, FolderServiceResult, DEFAULT_FOLDER_IS_LEAF, MOVE_INTO_OWN_SUBTREE,
    PARENT_NOT_FOUND,
};
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Arc;

/// Collect every folder reachable below `root_id` via parent links.
///
/// Breadth-first over a parent → children adjacency built from `folders`.
/// The result excludes `root_id`, contains only ids present in `folders`, and
/// is finite even when the stored links contain a cycle.
///
/// # Examples
///
/// ```rust
/// # use foldspace_core::models::Folder;
/// # use foldspace_core::services::compute_descendant_ids;
/// # use chrono::Utc;
/// let folder = |id, parent_id| Folder {
///     id,
///     owner_id: 1,
///     name: format!("f{}", id),
///     parent_id,
///     is_deleted: false,
///     created_at: Utc::now(),
/// };
/// let folders = vec![folder(1, None), folder(2, Some(1)), folder(3, Some(2))];
///
/// let mut ids: Vec<i64> = compute_descendant_ids(1, &folders).into_iter().collect();
/// ids.sort();
/// assert_eq!(ids, vec![2, 3]);
/// ```
pub fn compute_descendant_ids(root_id: FolderId, folders: &[Folder]) -> HashSet<FolderId> {
    let mut adjacency: HashMap<FolderId, Vec<FolderId>> = HashMap::new();
    for folder in folders {
        if let Some(parent_id) = folder.parent_id {
            adjacency.entry(parent_id).or_default().push(folder.id);
        }
    }

    let mut descendants = HashSet::new();
    let mut queue = VecDeque::from([root_id]);

    while let Some(current) = queue.pop_front() {
        let Some(children) = adjacency.get(&current) else {
            continue;
        };
        for &child in children {
            // A cycle through the root must not report the root as its own descendant
            if child != root_id && descendants.insert(child) {
                queue.push_back(child);
            }
        }
    }

    descendants
}

/// Validates parent references against the owner's folders
pub struct FolderGuard<S> {
    store: Arc<S>,
}

impl<S> Clone for FolderGuard<S> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
        }
    }
}

impl<S: FolderStore> FolderGuard<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Check that `parent_id` may become the parent of a folder of `owner_id`.
    ///
    /// `excluding_folder_id` names the folder being moved; when present the
    /// parent must be neither that folder nor one of its descendants.
    ///
    /// # Errors
    ///
    /// - `InvalidArgument("父文件夹不存在")` - parent absent, foreign, or deleted
    /// - `InvalidArgument("默认文件夹下不能创建子文件夹")` - parent is the default folder
    /// - `InvalidArgument("不能移动到子文件夹")` - parent lies in the moved subtree
    /// - `StoreFailure` - store read failed
    pub async fn validate_parent(
        &self,
        parent_id: Option<FolderId>,
        owner_id: OwnerId,
        excluding_folder_id: Option<FolderId>,
    ) -> FolderServiceResult<()> {
        let Some(parent_id) = parent_id else {
            return Ok(());
        };

        let parent = self
            .store
            .get_active_folder(parent_id, owner_id)
            .await?
            .ok_or_else(|| FolderServiceError::invalid_argument(PARENT_NOT_FOUND))?;

        if parent.is_default_root() {
            return Err(FolderServiceError::invalid_argument(DEFAULT_FOLDER_IS_LEAF));
        }

        if let Some(moved_id) = excluding_folder_id {
            if parent_id == moved_id {
                return Err(FolderServiceError::invalid_argument(MOVE_INTO_OWN_SUBTREE));
            }

            // Deleted folders stay in the adjacency so stale links still count
            let all_folders = self.store.list_all_folders(owner_id).await?;
            if compute_descendant_ids(moved_id, &all_folders).contains(&parent_id) {
                tracing::debug!(
                    "Rejected move of folder {} under its descendant {} (owner {})",
                    moved_id,
                    parent_id,
                    owner_id
                );
                return Err(FolderServiceError::invalid_argument(MOVE_INTO_OWN_SUBTREE));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryStore;
    use crate::models::{NoteKind, DEFAULT_FOLDER_NAME};
    use chrono::{Duration, TimeZone, Utc};

    const OWNER: OwnerId = 7;

    fn folder(id: FolderId, name: &str, parent_id: Option<FolderId>) -> Folder {
        Folder {
            id,
            owner_id: OWNER,
            name: name.to_string(),
            parent_id,
            is_deleted: false,
            created_at: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap() + Duration::seconds(id),
        }
    }

    fn sorted(ids: HashSet<FolderId>) -> Vec<FolderId> {
        let mut ids: Vec<_> = ids.into_iter().collect();
        ids.sort_unstable();
        ids
    }

    fn guard_with(folders: Vec<Folder>) -> FolderGuard<MemoryStore<NoteKind>> {
        let store = MemoryStore::<NoteKind>::new();
        for f in folders {
            store.seed_folder(f).unwrap();
        }
        FolderGuard::new(Arc::new(store))
    }

    fn default_work_sub() -> Vec<Folder> {
        vec![
            folder(1, DEFAULT_FOLDER_NAME, None),
            folder(2, "Work", None),
            folder(3, "Sub", Some(2)),
        ]
    }

    #[test]
    fn test_descendants_exclude_root_and_unrelated_branches() {
        let folders = vec![
            folder(1, "A", None),
            folder(2, "B", Some(1)),
            folder(3, "C", Some(2)),
            folder(4, "D", Some(1)),
            folder(5, "Other", None),
            folder(6, "OtherChild", Some(5)),
        ];

        assert_eq!(sorted(compute_descendant_ids(1, &folders)), vec![2, 3, 4]);
        assert_eq!(sorted(compute_descendant_ids(2, &folders)), vec![3]);
        assert!(compute_descendant_ids(3, &folders).is_empty());
    }

    #[test]
    fn test_descendants_of_unknown_root_is_empty() {
        let folders = default_work_sub();
        assert!(compute_descendant_ids(42, &folders).is_empty());
    }

    #[test]
    fn test_descendants_terminate_on_cycle() {
        // 1 -> 2 -> 3 -> 1, plus 4 hanging off 3
        let folders = vec![
            folder(1, "A", Some(3)),
            folder(2, "B", Some(1)),
            folder(3, "C", Some(2)),
            folder(4, "D", Some(3)),
        ];

        assert_eq!(sorted(compute_descendant_ids(1, &folders)), vec![2, 3, 4]);
    }

    #[test]
    fn test_descendants_ignore_dangling_parent_ids() {
        // Parent 99 is not in the input; its children are still reported
        // because they are input folders, but 99 itself never appears.
        let folders = vec![folder(5, "Orphan", Some(99)), folder(6, "Child", Some(5))];

        assert_eq!(sorted(compute_descendant_ids(99, &folders)), vec![5, 6]);
        assert_eq!(sorted(compute_descendant_ids(5, &folders)), vec![6]);
    }

    #[tokio::test]
    async fn test_root_parent_is_always_valid() {
        let guard = guard_with(Vec::new());
        guard.validate_parent(None, OWNER, None).await.unwrap();
        guard.validate_parent(None, OWNER, Some(3)).await.unwrap();
    }

    #[tokio::test]
    async fn test_missing_parent_is_invalid_argument() {
        let guard = guard_with(default_work_sub());

        let err = guard.validate_parent(Some(99), OWNER, None).await.unwrap_err();
        assert!(err.is_invalid_argument());
        assert_eq!(err.reason(), Some(PARENT_NOT_FOUND));
    }

    #[tokio::test]
    async fn test_foreign_parent_is_invalid_argument() {
        let guard = guard_with(default_work_sub());

        let err = guard.validate_parent(Some(2), OWNER + 1, None).await.unwrap_err();
        assert_eq!(err.reason(), Some(PARENT_NOT_FOUND));
    }

    #[tokio::test]
    async fn test_deleted_parent_is_invalid_argument() {
        let mut deleted = folder(2, "Work", None);
        deleted.is_deleted = true;
        let guard = guard_with(vec![deleted]);

        let err = guard.validate_parent(Some(2), OWNER, None).await.unwrap_err();
        assert_eq!(err.reason(), Some(PARENT_NOT_FOUND));
    }

    #[tokio::test]
    async fn test_default_folder_cannot_be_parent() {
        let guard = guard_with(default_work_sub());

        let err = guard.validate_parent(Some(1), OWNER, None).await.unwrap_err();
        assert_eq!(err.reason(), Some(DEFAULT_FOLDER_IS_LEAF));
    }

    #[tokio::test]
    async fn test_move_under_own_descendant_rejected() {
        let guard = guard_with(default_work_sub());

        let err = guard.validate_parent(Some(3), OWNER, Some(2)).await.unwrap_err();
        assert!(err.is_invalid_argument());
        assert_eq!(err.reason(), Some(MOVE_INTO_OWN_SUBTREE));
    }

    #[tokio::test]
    async fn test_move_under_itself_rejected() {
        let guard = guard_with(default_work_sub());

        let err = guard.validate_parent(Some(2), OWNER, Some(2)).await.unwrap_err();
        assert_eq!(err.reason(), Some(MOVE_INTO_OWN_SUBTREE));
    }

    #[tokio::test]
    async fn test_move_under_unrelated_folder_allowed() {
        let mut folders = default_work_sub();
        folders.push(folder(4, "Personal", None));
        let guard = guard_with(folders);

        guard.validate_parent(Some(4), OWNER, Some(2)).await.unwrap();
        guard.validate_parent(Some(2), OWNER, Some(4)).await.unwrap();
    }
}
