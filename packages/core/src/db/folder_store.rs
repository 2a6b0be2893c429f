//! Store Ports - Database Abstraction Layer
//!
//! `FolderStore` and `ItemStore` abstract the persistence operations the
//! folder and item services need. Two implementations exist: `TursoStore`
//! (libsql) and `MemoryStore` (in-process, for tests and tooling).
//!
//! # Design Decisions
//!
//! 1. **Async-First**: All methods are async so embedded and networked
//!    backends fit the same port
//! 2. **Owner-Scoped**: Every read and write carries the owner id; no method
//!    can reach another owner's rows
//! 3. **Error Handling**: Uses `anyhow::Result`; the service layer wraps
//!    failures unchanged as `FolderServiceError::StoreFailure`
//! 4. **Atomic Cascade**: The folder and item bulk updates of a cascading
//!    delete are one port call so the backend can run them in one transaction

use crate::models::{
    CascadeSummary, ChatMessage, Folder, FolderFilter, FolderId, ItemId, ItemKind, NewChatMessage,
    NewFolder, NewItem, OwnedItem, OwnerId,
};
use anyhow::Result;
use async_trait::async_trait;

/// Persistence of folder records for one item domain
///
/// # Thread Safety
///
/// Implementations must be `Send + Sync`; services share them through `Arc`.
#[async_trait]
pub trait FolderStore: Send + Sync {
    /// Point read scoped to `(id, owner_id, is_deleted = false)`
    ///
    /// Returns `Ok(None)` when the folder is absent, owned by someone else,
    /// or already deleted.
    async fn get_active_folder(&self, id: FolderId, owner_id: OwnerId)
        -> Result<Option<Folder>>;

    /// All non-deleted folders of the owner, `created_at` ascending (ties by id)
    async fn list_active_folders(&self, owner_id: OwnerId) -> Result<Vec<Folder>>;

    /// All folders of the owner regardless of deletion state
    ///
    /// Used for descendant computation, which must still see folders whose
    /// ancestors were deleted earlier.
    async fn list_all_folders(&self, owner_id: OwnerId) -> Result<Vec<Folder>>;

    /// Insert a folder with `is_deleted = false`, returning it with its generated id
    async fn insert_folder(&self, folder: NewFolder) -> Result<Folder>;

    /// Persist `name` and `parent_id` of an existing folder
    async fn update_folder(&self, folder: &Folder) -> Result<()>;

    /// Soft-delete `folder_ids` and every item of the owner filed in them
    ///
    /// Both bulk updates commit together or not at all.
    async fn soft_delete_cascade(
        &self,
        owner_id: OwnerId,
        folder_ids: &[FolderId],
    ) -> Result<CascadeSummary>;
}

/// Persistence of owned items (notes or chats) of kind `K`
#[async_trait]
pub trait ItemStore<K: ItemKind>: Send + Sync {
    async fn insert_item(&self, item: NewItem<K::Payload>) -> Result<OwnedItem<K::Payload>>;

    /// Point read scoped to `(id, owner_id, is_deleted = false)`
    async fn get_active_item(
        &self,
        id: ItemId,
        owner_id: OwnerId,
    ) -> Result<Option<OwnedItem<K::Payload>>>;

    /// Persist folder, deletion flag, `updated_at` and payload of an item
    async fn update_item(&self, item: &OwnedItem<K::Payload>) -> Result<()>;

    /// Active items of the owner matching `filter`, most recently updated first
    async fn list_active_items(
        &self,
        owner_id: OwnerId,
        filter: FolderFilter,
    ) -> Result<Vec<OwnedItem<K::Payload>>>;
}

/// Persistence of chat messages
///
/// Messages carry no deletion flag; `delete_messages` removes the rows.
#[async_trait]
pub trait MessageStore: Send + Sync {
    async fn insert_message(&self, message: NewChatMessage) -> Result<ChatMessage>;

    /// Messages of the owner's chat, `created_at` ascending (ties by id)
    async fn list_messages(&self, chat_id: ItemId, owner_id: OwnerId) -> Result<Vec<ChatMessage>>;

    /// Remove every message of the owner's chat, returning how many were removed
    async fn delete_messages(&self, chat_id: ItemId, owner_id: OwnerId) -> Result<u64>;
}
