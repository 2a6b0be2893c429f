//! Folder Lifecycle Service
//!
//! `FolderService` orchestrates create / rename / move / delete of folders for
//! one item domain and serves the nested folder tree. Parent validation is
//! delegated to [`FolderGuard`], tree assembly to [`build_folder_tree`].
//!
//! # Concurrency
//!
//! Every mutation holds the owner's write lock from its first read to its
//! last write (see [`OwnerWriteLocks`]). Tree reads are not serialized.
//!
//! # Examples
//!
//! ```rust,no_run
//! use foldspace_core::db::{DatabaseService, TursoStore};
//! use foldspace_core::models::NoteKind;
//! use foldspace_core::services::NoteDomain;
//! use std::path::PathBuf;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let db = Arc::new(DatabaseService::new(PathBuf::from("./data/foldspace.db")).await?);
//!     let notes = NoteDomain::new(Arc::new(TursoStore::<NoteKind>::new(db)));
//!
//!     let work = notes.folders.create(42, "Work", None).await?;
//!     notes.folders.create(42, "Reports", Some(work.id)).await?;
//!
//!     let tree = notes.folders.get_tree(42).await?;
//!     println!("{}", serde_json::to_string_pretty(&tree)?);
//!     Ok(())
//! }
//! ```

use crate::db::FolderStore;
use crate::models::{CascadeSummary, Folder, FolderId, FolderTreeNode, NewFolder, OwnerId};
use crate::services::error::{
    FolderServiceError, FolderServiceResult, BLANK_FOLDER_NAME, FOLDER_NOT_FOUND,
};
use crate::services::folder_guard::{compute_descendant_ids, FolderGuard};
use crate::services::folder_tree::build_folder_tree;
use crate::services::now;
use crate::services::owner_locks::OwnerWriteLocks;
use std::sync::Arc;

/// Reject names that are empty after trimming
pub(crate) fn validate_folder_name(name: &str) -> FolderServiceResult<()> {
    if name.trim().is_empty() {
        return Err(FolderServiceError::invalid_argument(BLANK_FOLDER_NAME));
    }
    Ok(())
}

/// Folder hierarchy operations for one domain, backed by store `S`
pub struct FolderService<S> {
    store: Arc<S>,
    guard: FolderGuard<S>,
    write_locks: OwnerWriteLocks,
}

impl<S> Clone for FolderService<S> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            guard: self.guard.clone(),
            write_locks: self.write_locks.clone(),
        }
    }
}

impl<S: FolderStore> FolderService<S> {
    /// Service with its own write locks
    ///
    /// Use [`DomainServices::new`](crate::services::DomainServices::new) when
    /// items of the same domain are written too.
    pub fn new(store: Arc<S>) -> Self {
        Self::with_write_locks(store, OwnerWriteLocks::new())
    }

    /// Create a service sharing `write_locks` with other services of the
    /// same domain (for example the matching `ItemService`).
    pub fn with_write_locks(store: Arc<S>, write_locks: OwnerWriteLocks) -> Self {
        Self {
            guard: FolderGuard::new(store.clone()),
            store,
            write_locks,
        }
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    pub fn write_locks(&self) -> &OwnerWriteLocks {
        &self.write_locks
    }

    /// Load an active folder of the owner or fail with `NotFound("文件夹不存在")`
    async fn require_folder(
        &self,
        folder_id: FolderId,
        owner_id: OwnerId,
    ) -> FolderServiceResult<Folder> {
        self.store
            .get_active_folder(folder_id, owner_id)
            .await?
            .ok_or_else(|| FolderServiceError::not_found(FOLDER_NOT_FOUND))
    }

    /// Create a folder under `parent_id` (or at root level when `None`)
    ///
    /// # Errors
    ///
    /// - `InvalidArgument("文件夹名称不能为空")` - blank name
    /// - `InvalidArgument` - parent rejected by [`FolderGuard::validate_parent`]
    pub async fn create(
        &self,
        owner_id: OwnerId,
        name: &str,
        parent_id: Option<FolderId>,
    ) -> FolderServiceResult<Folder> {
        validate_folder_name(name)?;

        let _write = self.write_locks.acquire(owner_id).await;
        self.guard.validate_parent(parent_id, owner_id, None).await?;

        let folder = self
            .store
            .insert_folder(NewFolder {
                owner_id,
                name: name.to_string(),
                parent_id,
                created_at: now(),
            })
            .await?;

        tracing::info!(
            "Created folder {} for owner {} (parent: {:?})",
            folder.id,
            owner_id,
            parent_id
        );
        Ok(folder)
    }

    /// The owner's active folders as a nested forest
    ///
    /// Roots and children are in ascending creation order. Folders whose
    /// parent is gone are shown as roots.
    pub async fn get_tree(&self, owner_id: OwnerId) -> FolderServiceResult<Vec<FolderTreeNode>> {
        let folders = self.store.list_active_folders(owner_id).await?;
        tracing::debug!("Building folder tree for owner {} from {} folders", owner_id, folders.len());
        Ok(build_folder_tree(&folders))
    }

    pub async fn rename(
        &self,
        folder_id: FolderId,
        owner_id: OwnerId,
        new_name: &str,
    ) -> FolderServiceResult<()> {
        validate_folder_name(new_name)?;

        let _write = self.write_locks.acquire(owner_id).await;
        let mut folder = self.require_folder(folder_id, owner_id).await?;

        folder.name = new_name.to_string();
        self.store.update_folder(&folder).await?;

        tracing::info!("Renamed folder {} for owner {}", folder_id, owner_id);
        Ok(())
    }

    /// Re-parent a folder; `None` moves it to root level
    ///
    /// Moving a folder under its current parent is accepted and rewrites the
    /// same value.
    ///
    /// # Errors
    ///
    /// - `NotFound("文件夹不存在")` - folder absent, foreign, or deleted
    /// - `InvalidArgument("不能移动到子文件夹")` - target is the folder or a descendant
    /// - other `InvalidArgument`s from [`FolderGuard::validate_parent`]
    pub async fn move_folder(
        &self,
        folder_id: FolderId,
        owner_id: OwnerId,
        new_parent_id: Option<FolderId>,
    ) -> FolderServiceResult<()> {
        let _write = self.write_locks.acquire(owner_id).await;
        let mut folder = self.require_folder(folder_id, owner_id).await?;

        self.guard
            .validate_parent(new_parent_id, owner_id, Some(folder_id))
            .await?;

        folder.parent_id = new_parent_id;
        self.store.update_folder(&folder).await?;

        tracing::info!(
            "Moved folder {} of owner {} under {:?}",
            folder_id,
            owner_id,
            new_parent_id
        );
        Ok(())
    }

    /// Soft-delete a folder, its whole subtree, and every item filed in them
    ///
    /// Descendants are computed over all of the owner's folders, including
    /// ones already deleted, so items under previously orphaned branches are
    /// swept too. The folder and item updates commit atomically.
    pub async fn delete(
        &self,
        folder_id: FolderId,
        owner_id: OwnerId,
    ) -> FolderServiceResult<CascadeSummary> {
        let _write = self.write_locks.acquire(owner_id).await;
        self.require_folder(folder_id, owner_id).await?;

        let all_folders = self.store.list_all_folders(owner_id).await?;
        let mut target_ids: Vec<FolderId> = compute_descendant_ids(folder_id, &all_folders)
            .into_iter()
            .collect();
        target_ids.push(folder_id);
        target_ids.sort_unstable();

        let summary = self
            .store
            .soft_delete_cascade(owner_id, &target_ids)
            .await?;

        tracing::info!(
            "Deleted folder {} of owner {}: {} folder(s), {} item(s) marked deleted",
            folder_id,
            owner_id,
            summary.folders,
            summary.items
        );
        Ok(summary)
    }
}
