//! In-process store for tests and tooling
//!
//! `MemoryStore<K>` keeps folders, items and chat messages in `Vec`s behind
//! one mutex. Every port call takes the lock once, so the two bulk updates of
//! `soft_delete_cascade` are observed together or not at all.

use crate::db::folder_store::{FolderStore, ItemStore, MessageStore};
use crate::models::{
    CascadeSummary, ChatKind, ChatMessage, Folder, FolderFilter, FolderId, ItemId, ItemKind,
    MessageId, NewChatMessage, NewFolder, NewItem, OwnedItem, OwnerId,
};
use anyhow::Result;
use async_trait::async_trait;
use std::collections::HashSet;
use std::marker::PhantomData;
use std::sync::{Arc, Mutex, MutexGuard};

struct Tables<P> {
    folders: Vec<Folder>,
    items: Vec<OwnedItem<P>>,
    messages: Vec<ChatMessage>,
    next_folder_id: FolderId,
    next_item_id: ItemId,
    next_message_id: MessageId,
}

/// Store backed by process memory; clones share the same data
pub struct MemoryStore<K: ItemKind> {
    tables: Arc<Mutex<Tables<K::Payload>>>,
    _kind: PhantomData<fn() -> K>,
}

impl<K: ItemKind> Clone for MemoryStore<K> {
    fn clone(&self) -> Self {
        Self {
            tables: self.tables.clone(),
            _kind: PhantomData,
        }
    }
}

impl<K: ItemKind> Default for MemoryStore<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: ItemKind> MemoryStore<K> {
    pub fn new() -> Self {
        Self {
            tables: Arc::new(Mutex::new(Tables {
                folders: Vec::new(),
                items: Vec::new(),
                messages: Vec::new(),
                next_folder_id: 1,
                next_item_id: 1,
                next_message_id: 1,
            })),
            _kind: PhantomData,
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, Tables<K::Payload>>> {
        self.tables
            .lock()
            .map_err(|e| anyhow::anyhow!("Memory store lock poisoned: {}", e))
    }

    /// Raw folder record, deleted or not (test inspection)
    pub fn folder_snapshot(&self, id: FolderId) -> Result<Option<Folder>> {
        Ok(self.lock()?.folders.iter().find(|f| f.id == id).cloned())
    }

    /// Raw item record, deleted or not (test inspection)
    pub fn item_snapshot(&self, id: ItemId) -> Result<Option<OwnedItem<K::Payload>>> {
        Ok(self.lock()?.items.iter().find(|i| i.id == id).cloned())
    }

    /// Insert a folder record verbatim, bypassing service validation
    ///
    /// Lets tests seed states the services never produce (orphans, cycles).
    pub fn seed_folder(&self, folder: Folder) -> Result<()> {
        let mut tables = self.lock()?;
        tables.next_folder_id = tables.next_folder_id.max(folder.id + 1);
        tables.folders.retain(|f| f.id != folder.id);
        tables.folders.push(folder);
        Ok(())
    }
}

#[async_trait]
impl<K: ItemKind> FolderStore for MemoryStore<K> {
    async fn get_active_folder(
        &self,
        id: FolderId,
        owner_id: OwnerId,
    ) -> Result<Option<Folder>> {
        Ok(self
            .lock()?
            .folders
            .iter()
            .find(|f| f.id == id && f.owner_id == owner_id && !f.is_deleted)
            .cloned())
    }

    async fn list_active_folders(&self, owner_id: OwnerId) -> Result<Vec<Folder>> {
        let mut folders: Vec<Folder> = self
            .lock()?
            .folders
            .iter()
            .filter(|f| f.owner_id == owner_id && !f.is_deleted)
            .cloned()
            .collect();
        folders.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(folders)
    }

    async fn list_all_folders(&self, owner_id: OwnerId) -> Result<Vec<Folder>> {
        let mut folders: Vec<Folder> = self
            .lock()?
            .folders
            .iter()
            .filter(|f| f.owner_id == owner_id)
            .cloned()
            .collect();
        folders.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(folders)
    }

    async fn insert_folder(&self, folder: NewFolder) -> Result<Folder> {
        let mut tables = self.lock()?;
        let id = tables.next_folder_id;
        tables.next_folder_id += 1;

        let record = Folder {
            id,
            owner_id: folder.owner_id,
            name: folder.name,
            parent_id: folder.parent_id,
            is_deleted: false,
            created_at: folder.created_at,
        };
        tables.folders.push(record.clone());
        Ok(record)
    }

    async fn update_folder(&self, folder: &Folder) -> Result<()> {
        let mut tables = self.lock()?;
        let stored = tables
            .folders
            .iter_mut()
            .find(|f| f.id == folder.id && f.owner_id == folder.owner_id)
            .ok_or_else(|| {
                anyhow::anyhow!(
                    "Folder {} of owner {} disappeared before update",
                    folder.id,
                    folder.owner_id
                )
            })?;

        stored.name = folder.name.clone();
        stored.parent_id = folder.parent_id;
        Ok(())
    }

    async fn soft_delete_cascade(
        &self,
        owner_id: OwnerId,
        folder_ids: &[FolderId],
    ) -> Result<CascadeSummary> {
        let targets: HashSet<FolderId> = folder_ids.iter().copied().collect();
        let mut tables = self.lock()?;
        let mut summary = CascadeSummary::default();

        for folder in tables
            .folders
            .iter_mut()
            .filter(|f| f.owner_id == owner_id && !f.is_deleted && targets.contains(&f.id))
        {
            folder.is_deleted = true;
            summary.folders += 1;
        }

        for item in tables.items.iter_mut().filter(|i| {
            i.owner_id == owner_id
                && !i.is_deleted
                && i.folder_id.is_some_and(|id| targets.contains(&id))
        }) {
            item.is_deleted = true;
            summary.items += 1;
        }

        Ok(summary)
    }
}

#[async_trait]
impl<K: ItemKind> ItemStore<K> for MemoryStore<K> {
    async fn insert_item(&self, item: NewItem<K::Payload>) -> Result<OwnedItem<K::Payload>> {
        let mut tables = self.lock()?;
        let id = tables.next_item_id;
        tables.next_item_id += 1;

        let record = OwnedItem {
            id,
            owner_id: item.owner_id,
            folder_id: item.folder_id,
            is_deleted: false,
            created_at: item.created_at,
            updated_at: item.created_at,
            payload: item.payload,
        };
        tables.items.push(record.clone());
        Ok(record)
    }

    async fn get_active_item(
        &self,
        id: ItemId,
        owner_id: OwnerId,
    ) -> Result<Option<OwnedItem<K::Payload>>> {
        Ok(self
            .lock()?
            .items
            .iter()
            .find(|i| i.id == id && i.owner_id == owner_id && !i.is_deleted)
            .cloned())
    }

    async fn update_item(&self, item: &OwnedItem<K::Payload>) -> Result<()> {
        let mut tables = self.lock()?;
        let stored = tables
            .items
            .iter_mut()
            .find(|i| i.id == item.id && i.owner_id == item.owner_id)
            .ok_or_else(|| {
                anyhow::anyhow!(
                    "{} {} of owner {} disappeared before update",
                    K::NAME,
                    item.id,
                    item.owner_id
                )
            })?;

        stored.folder_id = item.folder_id;
        stored.is_deleted = item.is_deleted;
        stored.updated_at = item.updated_at;
        stored.payload = item.payload.clone();
        Ok(())
    }

    async fn list_active_items(
        &self,
        owner_id: OwnerId,
        filter: FolderFilter,
    ) -> Result<Vec<OwnedItem<K::Payload>>> {
        let mut items: Vec<OwnedItem<K::Payload>> = self
            .lock()?
            .items
            .iter()
            .filter(|i| i.owner_id == owner_id && !i.is_deleted)
            .filter(|i| match filter {
                FolderFilter::All => true,
                FolderFilter::Unfiled => i.folder_id.is_none(),
                FolderFilter::Folder(folder_id) => i.folder_id == Some(folder_id),
            })
            .cloned()
            .collect();
        items.sort_by(|a, b| b.updated_at.cmp(&a.updated_at).then(b.id.cmp(&a.id)));
        Ok(items)
    }
}

#[async_trait]
impl MessageStore for MemoryStore<ChatKind> {
    async fn insert_message(&self, message: NewChatMessage) -> Result<ChatMessage> {
        let mut tables = self.lock()?;
        let id = tables.next_message_id;
        tables.next_message_id += 1;

        let record = ChatMessage {
            id,
            owner_id: message.owner_id,
            chat_id: message.chat_id,
            role: message.role,
            content: message.content,
            created_at: message.created_at,
        };
        tables.messages.push(record.clone());
        Ok(record)
    }

    async fn list_messages(&self, chat_id: ItemId, owner_id: OwnerId) -> Result<Vec<ChatMessage>> {
        let mut messages: Vec<ChatMessage> = self
            .lock()?
            .messages
            .iter()
            .filter(|m| m.chat_id == chat_id && m.owner_id == owner_id)
            .cloned()
            .collect();
        messages.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(messages)
    }

    async fn delete_messages(&self, chat_id: ItemId, owner_id: OwnerId) -> Result<u64> {
        let mut tables = self.lock()?;
        let before = tables.messages.len();
        tables
            .messages
            .retain(|m| !(m.chat_id == chat_id && m.owner_id == owner_id));
        Ok((before - tables.messages.len()) as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{NoteKind, NotePayload};
    use chrono::Utc;

    fn new_folder(owner_id: OwnerId, name: &str, parent_id: Option<FolderId>) -> NewFolder {
        NewFolder {
            owner_id,
            name: name.to_string(),
            parent_id,
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_reads_are_owner_scoped() {
        let store = MemoryStore::<NoteKind>::new();
        let folder = store.insert_folder(new_folder(1, "Work", None)).await.unwrap();

        assert!(store.get_active_folder(folder.id, 1).await.unwrap().is_some());
        assert!(store.get_active_folder(folder.id, 2).await.unwrap().is_none());
        assert!(store.list_active_folders(2).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_cascade_skips_other_owners_and_counts_rows() {
        let store = MemoryStore::<NoteKind>::new();
        let mine = store.insert_folder(new_folder(1, "Mine", None)).await.unwrap();

        let filed = store
            .insert_item(NewItem {
                owner_id: 1,
                folder_id: Some(mine.id),
                created_at: Utc::now(),
                payload: NotePayload {
                    title: "a".to_string(),
                    ..Default::default()
                },
            })
            .await
            .unwrap();

        // Another owner's item that happens to reference the same folder id
        let foreign = store
            .insert_item(NewItem {
                owner_id: 2,
                folder_id: Some(mine.id),
                created_at: Utc::now(),
                payload: NotePayload::default(),
            })
            .await
            .unwrap();

        let summary = store.soft_delete_cascade(1, &[mine.id]).await.unwrap();
        assert_eq!(summary, CascadeSummary { folders: 1, items: 1 });

        assert!(store.item_snapshot(filed.id).unwrap().unwrap().is_deleted);
        assert!(!store.item_snapshot(foreign.id).unwrap().unwrap().is_deleted);
        assert!(store.folder_snapshot(mine.id).unwrap().unwrap().is_deleted);

        // Deleted folders still show up in the unfiltered listing
        assert_eq!(store.list_all_folders(1).await.unwrap().len(), 1);
        assert!(store.list_active_folders(1).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_update_missing_item_fails() {
        let store = MemoryStore::<NoteKind>::new();
        let item = store
            .insert_item(NewItem {
                owner_id: 1,
                folder_id: None,
                created_at: Utc::now(),
                payload: NotePayload::default(),
            })
            .await
            .unwrap();

        let foreign = OwnedItem {
            owner_id: 2,
            is_deleted: true,
            ..item.clone()
        };
        let err = store.update_item(&foreign).await.unwrap_err();
        assert!(err.to_string().contains("disappeared before update"));
        assert!(!store.item_snapshot(item.id).unwrap().unwrap().is_deleted);
    }

    #[tokio::test]
    async fn test_seed_folder_advances_id_sequence() {
        let store = MemoryStore::<NoteKind>::new();
        store
            .seed_folder(Folder {
                id: 10,
                owner_id: 1,
                name: "Seeded".to_string(),
                parent_id: Some(99),
                is_deleted: false,
                created_at: Utc::now(),
            })
            .unwrap();

        let next = store.insert_folder(new_folder(1, "Next", None)).await.unwrap();
        assert_eq!(next.id, 11);
    }
}
