//! Owned Item Service
//!
//! Create / read / update / soft-delete / list for the items of one domain
//! (notes or chats). Filing an item into a folder requires that folder to be
//! an active folder of the same owner.

use crate::db::{FolderStore, ItemStore};
use crate::models::{
    FolderFilter, FolderId, ItemId, ItemKind, ItemUpdate, NewItem, OwnedItem, OwnerId,
};
use crate::services::error::{FolderServiceError, FolderServiceResult, FOLDER_NOT_FOUND};
use crate::services::now;
use crate::services::owner_locks::OwnerWriteLocks;
use std::marker::PhantomData;
use std::sync::Arc;

/// Item operations for domain `K`, backed by store `S`
pub struct ItemService<K, S> {
    store: Arc<S>,
    write_locks: OwnerWriteLocks,
    _kind: PhantomData<fn() -> K>,
}

impl<K, S> Clone for ItemService<K, S> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            write_locks: self.write_locks.clone(),
            _kind: PhantomData,
        }
    }
}

impl<K, S> ItemService<K, S>
where
    K: ItemKind,
    S: FolderStore + ItemStore<K>,
{
    /// Service with its own write locks
    ///
    /// Items written this way are not serialized against folder deletes;
    /// use [`DomainServices::new`](crate::services::DomainServices::new) to
    /// build the folder and item services of a domain together.
    pub fn new(store: Arc<S>) -> Self {
        Self::with_write_locks(store, OwnerWriteLocks::new())
    }

    /// Share write locks with the domain's `FolderService` so that filing an
    /// item cannot interleave with a cascading delete of its folder.
    pub fn with_write_locks(store: Arc<S>, write_locks: OwnerWriteLocks) -> Self {
        Self {
            store,
            write_locks,
            _kind: PhantomData,
        }
    }

    pub fn write_locks(&self) -> &OwnerWriteLocks {
        &self.write_locks
    }

    async fn require_folder(&self, folder_id: FolderId, owner_id: OwnerId) -> FolderServiceResult<()> {
        match self.store.get_active_folder(folder_id, owner_id).await? {
            Some(_) => Ok(()),
            None => Err(FolderServiceError::invalid_argument(FOLDER_NOT_FOUND)),
        }
    }

    async fn require_item(
        &self,
        item_id: ItemId,
        owner_id: OwnerId,
    ) -> FolderServiceResult<OwnedItem<K::Payload>> {
        self.store
            .get_active_item(item_id, owner_id)
            .await?
            .ok_or_else(|| FolderServiceError::not_found(K::ITEM_NOT_FOUND))
    }

    /// Create an item, optionally filed into `folder_id`
    ///
    /// # Errors
    ///
    /// - `InvalidArgument("文件夹不存在")` - folder absent, foreign, or deleted
    pub async fn create(
        &self,
        owner_id: OwnerId,
        folder_id: Option<FolderId>,
        payload: K::Payload,
    ) -> FolderServiceResult<OwnedItem<K::Payload>> {
        let _write = self.write_locks.acquire(owner_id).await;
        if let Some(folder_id) = folder_id {
            self.require_folder(folder_id, owner_id).await?;
        }

        let item = self
            .store
            .insert_item(NewItem {
                owner_id,
                folder_id,
                created_at: now(),
                payload,
            })
            .await?;

        tracing::info!(
            "Created {} {} for owner {} (folder: {:?})",
            K::NAME,
            item.id,
            owner_id,
            folder_id
        );
        Ok(item)
    }

    pub async fn get(
        &self,
        item_id: ItemId,
        owner_id: OwnerId,
    ) -> FolderServiceResult<OwnedItem<K::Payload>> {
        tracing::debug!("Loading {} {} for owner {}", K::NAME, item_id, owner_id);
        self.require_item(item_id, owner_id).await
    }

    /// Apply a sparse update; `update.folder_id = None` keeps the current folder
    pub async fn update(
        &self,
        item_id: ItemId,
        owner_id: OwnerId,
        update: ItemUpdate<K::Patch>,
    ) -> FolderServiceResult<OwnedItem<K::Payload>> {
        let _write = self.write_locks.acquire(owner_id).await;
        let mut item = self.require_item(item_id, owner_id).await?;

        if let Some(folder_id) = update.folder_id {
            self.require_folder(folder_id, owner_id).await?;
            item.folder_id = Some(folder_id);
        }

        K::apply_patch(&mut item.payload, update.patch);
        item.updated_at = now();
        self.store.update_item(&item).await?;

        tracing::info!("Updated {} {} for owner {}", K::NAME, item_id, owner_id);
        Ok(item)
    }

    pub async fn soft_delete(&self, item_id: ItemId, owner_id: OwnerId) -> FolderServiceResult<()> {
        let _write = self.write_locks.acquire(owner_id).await;
        let mut item = self.require_item(item_id, owner_id).await?;

        item.is_deleted = true;
        item.updated_at = now();
        self.store.update_item(&item).await?;

        tracing::info!("Deleted {} {} for owner {}", K::NAME, item_id, owner_id);
        Ok(())
    }

    /// Active items of the owner, most recently updated first
    pub async fn list(
        &self,
        owner_id: OwnerId,
        filter: FolderFilter,
    ) -> FolderServiceResult<Vec<OwnedItem<K::Payload>>> {
        let items = self.store.list_active_items(owner_id, filter).await?;
        tracing::debug!(
            "Listed {} {}(s) for owner {} ({:?})",
            items.len(),
            K::NAME,
            owner_id,
            filter
        );
        Ok(items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryStore;
    use crate::models::{ChatKind, ChatPatch, ChatPayload, NoteKind, NotePatch, NotePayload};
    use crate::services::{DomainServices, FolderService};

    const OWNER: OwnerId = 3;

    fn note(title: &str) -> NotePayload {
        NotePayload {
            title: title.to_string(),
            content: format!("{} body", title),
            cover_url: None,
        }
    }

    fn services() -> (
        FolderService<MemoryStore<NoteKind>>,
        ItemService<NoteKind, MemoryStore<NoteKind>>,
    ) {
        let domain =
            DomainServices::<NoteKind, _>::new(Arc::new(MemoryStore::<NoteKind>::new()));
        (domain.folders, domain.items)
    }

    #[tokio::test]
    async fn test_create_and_get() {
        let (folders, notes) = services();
        let folder = folders.create(OWNER, "Work", None).await.unwrap();

        let created = notes
            .create(OWNER, Some(folder.id), note("Plan"))
            .await
            .unwrap();
        assert_eq!(created.created_at, created.updated_at);

        let loaded = notes.get(created.id, OWNER).await.unwrap();
        assert_eq!(loaded, created);
    }

    #[tokio::test]
    async fn test_create_into_missing_folder_rejected() {
        let (_, notes) = services();

        let err = notes.create(OWNER, Some(404), note("Lost")).await.unwrap_err();
        assert!(err.is_invalid_argument());
        assert_eq!(err.reason(), Some(FOLDER_NOT_FOUND));
    }

    #[tokio::test]
    async fn test_create_into_deleted_folder_rejected() {
        let (folders, notes) = services();
        let folder = folders.create(OWNER, "Gone", None).await.unwrap();
        folders.delete(folder.id, OWNER).await.unwrap();

        let err = notes
            .create(OWNER, Some(folder.id), note("Late"))
            .await
            .unwrap_err();
        assert_eq!(err.reason(), Some(FOLDER_NOT_FOUND));
    }

    #[tokio::test]
    async fn test_get_foreign_item_is_not_found() {
        let (_, notes) = services();
        let created = notes.create(OWNER, None, note("Private")).await.unwrap();

        let err = notes.get(created.id, OWNER + 1).await.unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(err.reason(), Some("笔记不存在"));
    }

    #[tokio::test]
    async fn test_update_patches_payload_and_keeps_folder() {
        let (folders, notes) = services();
        let folder = folders.create(OWNER, "Work", None).await.unwrap();
        let created = notes
            .create(OWNER, Some(folder.id), note("Draft"))
            .await
            .unwrap();

        let updated = notes
            .update(
                created.id,
                OWNER,
                ItemUpdate {
                    folder_id: None,
                    patch: NotePatch {
                        title: Some("Final".to_string()),
                        ..Default::default()
                    },
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.folder_id, Some(folder.id));
        assert_eq!(updated.payload.title, "Final");
        assert_eq!(updated.payload.content, "Draft body");
        assert!(updated.updated_at >= created.updated_at);
        assert_eq!(notes.get(created.id, OWNER).await.unwrap(), updated);
    }

    #[tokio::test]
    async fn test_update_refiles_into_other_folder() {
        let (folders, notes) = services();
        let from = folders.create(OWNER, "From", None).await.unwrap();
        let to = folders.create(OWNER, "To", None).await.unwrap();
        let created = notes.create(OWNER, Some(from.id), note("Move me")).await.unwrap();

        let updated = notes
            .update(
                created.id,
                OWNER,
                ItemUpdate {
                    folder_id: Some(to.id),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.folder_id, Some(to.id));

        let err = notes
            .update(
                created.id,
                OWNER,
                ItemUpdate {
                    folder_id: Some(999),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert_eq!(err.reason(), Some(FOLDER_NOT_FOUND));
        assert_eq!(notes.get(created.id, OWNER).await.unwrap().folder_id, Some(to.id));
    }

    #[tokio::test]
    async fn test_soft_delete_hides_item() {
        let (_, notes) = services();
        let created = notes.create(OWNER, None, note("Bye")).await.unwrap();

        notes.soft_delete(created.id, OWNER).await.unwrap();

        assert!(notes.get(created.id, OWNER).await.unwrap_err().is_not_found());
        assert!(notes.list(OWNER, FolderFilter::All).await.unwrap().is_empty());
        assert!(notes
            .soft_delete(created.id, OWNER)
            .await
            .unwrap_err()
            .is_not_found());
    }

    #[tokio::test]
    async fn test_list_filters_and_orders_by_update() {
        let (folders, notes) = services();
        let folder = folders.create(OWNER, "Work", None).await.unwrap();

        let first = notes.create(OWNER, Some(folder.id), note("first")).await.unwrap();
        let unfiled = notes.create(OWNER, None, note("loose")).await.unwrap();
        let second = notes.create(OWNER, Some(folder.id), note("second")).await.unwrap();
        notes.create(OWNER + 1, None, note("foreign")).await.unwrap();

        // Touch the first note so it becomes the most recent
        tokio::time::sleep(std::time::Duration::from_millis(2)).await;
        notes
            .update(first.id, OWNER, ItemUpdate::default())
            .await
            .unwrap();

        let in_folder: Vec<_> = notes
            .list(OWNER, FolderFilter::Folder(folder.id))
            .await
            .unwrap()
            .into_iter()
            .map(|n| n.id)
            .collect();
        assert_eq!(in_folder, vec![first.id, second.id]);

        let loose: Vec<_> = notes
            .list(OWNER, FolderFilter::Unfiled)
            .await
            .unwrap()
            .into_iter()
            .map(|n| n.id)
            .collect();
        assert_eq!(loose, vec![unfiled.id]);

        assert_eq!(notes.list(OWNER, FolderFilter::All).await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_chat_domain_uses_chat_reason() {
        let store = Arc::new(MemoryStore::<ChatKind>::new());
        let chats = ItemService::<ChatKind, _>::new(store);

        let chat = chats
            .create(
                OWNER,
                None,
                ChatPayload {
                    title: "Standup".to_string(),
                },
            )
            .await
            .unwrap();
        let renamed = chats
            .update(
                chat.id,
                OWNER,
                ItemUpdate {
                    folder_id: None,
                    patch: ChatPatch {
                        title: Some("Retro".to_string()),
                    },
                },
            )
            .await
            .unwrap();
        assert_eq!(renamed.payload.title, "Retro");

        let err = chats.get(999, OWNER).await.unwrap_err();
        assert_eq!(err.reason(), Some("对话不存在"));
    }
}
