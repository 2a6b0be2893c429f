//! Domain Service Bundles
//!
//! `DomainServices` builds the folder and item services of one domain over a
//! single store and a single set of [`OwnerWriteLocks`], so item writes and
//! folder mutations of an owner never interleave.

use crate::db::{FolderStore, ItemStore, MessageStore};
use crate::models::{ChatKind, ItemKind};
use crate::services::folder_service::FolderService;
use crate::services::item_service::ItemService;
use crate::services::message_service::MessageService;
use crate::services::owner_locks::OwnerWriteLocks;
use std::sync::Arc;

/// Folder and item services of domain `K` sharing one lock registry
pub struct DomainServices<K, S> {
    pub folders: FolderService<S>,
    pub items: ItemService<K, S>,
}

impl<K, S> Clone for DomainServices<K, S> {
    fn clone(&self) -> Self {
        Self {
            folders: self.folders.clone(),
            items: self.items.clone(),
        }
    }
}

impl<K, S> DomainServices<K, S>
where
    K: ItemKind,
    S: FolderStore + ItemStore<K>,
{
    pub fn new(store: Arc<S>) -> Self {
        let write_locks = OwnerWriteLocks::new();
        Self {
            folders: FolderService::with_write_locks(store.clone(), write_locks.clone()),
            items: ItemService::with_write_locks(store, write_locks),
        }
    }

    pub fn write_locks(&self) -> &OwnerWriteLocks {
        self.folders.write_locks()
    }
}

impl<S> DomainServices<ChatKind, S>
where
    S: FolderStore + ItemStore<ChatKind> + MessageStore,
{
    /// Message service over this domain's chats and write locks
    pub fn messages(&self) -> MessageService<S> {
        MessageService::with_write_locks(self.folders.store().clone(), self.write_locks().clone())
    }
}
