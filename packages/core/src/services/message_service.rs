//! Chat Message Service
//!
//! Appends turns to a chat and reads them back in conversation order. Every
//! operation first resolves the chat as an active chat of the owner, so a
//! deleted or foreign chat reports `NotFound("对话不存在")`.

use crate::db::{ItemStore, MessageStore};
use crate::models::{Chat, ChatKind, ChatMessage, ItemId, ItemKind, NewChatMessage, OwnerId};
use crate::services::error::{
    FolderServiceError, FolderServiceResult, BLANK_MESSAGE_CONTENT, BLANK_MESSAGE_ROLE,
};
use crate::services::now;
use crate::services::owner_locks::OwnerWriteLocks;
use std::sync::Arc;

/// Message operations for chats stored in `S`
pub struct MessageService<S> {
    store: Arc<S>,
    write_locks: OwnerWriteLocks,
}

impl<S> Clone for MessageService<S> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            write_locks: self.write_locks.clone(),
        }
    }
}

impl<S> MessageService<S>
where
    S: ItemStore<ChatKind> + MessageStore,
{
    pub fn new(store: Arc<S>) -> Self {
        Self::with_write_locks(store, OwnerWriteLocks::new())
    }

    pub fn with_write_locks(store: Arc<S>, write_locks: OwnerWriteLocks) -> Self {
        Self { store, write_locks }
    }

    async fn require_chat(&self, chat_id: ItemId, owner_id: OwnerId) -> FolderServiceResult<Chat> {
        self.store
            .get_active_item(chat_id, owner_id)
            .await?
            .ok_or_else(|| FolderServiceError::not_found(ChatKind::ITEM_NOT_FOUND))
    }

    /// Append a message to the owner's chat and bump the chat's `updated_at`
    ///
    /// # Errors
    ///
    /// - `InvalidArgument("角色不能为空")` / `InvalidArgument("内容不能为空")` - blank field
    /// - `NotFound("对话不存在")` - chat absent, foreign, or deleted
    pub async fn create_message(
        &self,
        owner_id: OwnerId,
        chat_id: ItemId,
        role: &str,
        content: &str,
    ) -> FolderServiceResult<ChatMessage> {
        if role.trim().is_empty() {
            return Err(FolderServiceError::invalid_argument(BLANK_MESSAGE_ROLE));
        }
        if content.trim().is_empty() {
            return Err(FolderServiceError::invalid_argument(BLANK_MESSAGE_CONTENT));
        }

        let _write = self.write_locks.acquire(owner_id).await;
        let mut chat = self.require_chat(chat_id, owner_id).await?;

        let message = self
            .store
            .insert_message(NewChatMessage {
                owner_id,
                chat_id,
                role: role.to_string(),
                content: content.to_string(),
                created_at: now(),
            })
            .await?;

        chat.updated_at = message.created_at;
        self.store.update_item(&chat).await?;

        tracing::info!(
            "Added {} message {} to chat {} of owner {}",
            message.role,
            message.id,
            chat_id,
            owner_id
        );
        Ok(message)
    }

    /// Messages of the owner's chat, oldest first
    pub async fn list_messages(
        &self,
        chat_id: ItemId,
        owner_id: OwnerId,
    ) -> FolderServiceResult<Vec<ChatMessage>> {
        self.require_chat(chat_id, owner_id).await?;
        let messages = self.store.list_messages(chat_id, owner_id).await?;
        tracing::debug!(
            "Listed {} message(s) of chat {} for owner {}",
            messages.len(),
            chat_id,
            owner_id
        );
        Ok(messages)
    }

    /// Remove every message of the owner's chat; the chat itself stays
    pub async fn delete_messages(
        &self,
        chat_id: ItemId,
        owner_id: OwnerId,
    ) -> FolderServiceResult<u64> {
        let _write = self.write_locks.acquire(owner_id).await;
        self.require_chat(chat_id, owner_id).await?;

        let removed = self.store.delete_messages(chat_id, owner_id).await?;
        tracing::info!(
            "Removed {} message(s) from chat {} of owner {}",
            removed,
            chat_id,
            owner_id
        );
        Ok(removed)
    }
}
