//! Owned Item Model
//!
//! Notes and chats are the leaf entities filed into folders. Both share the
//! same envelope ([`OwnedItem`]) and differ only in their payload, which is
//! stored as a JSON `properties` column. An [`ItemKind`] names one domain and
//! the tables its folders and items live in.

use super::folder::{FolderId, OwnerId};
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt::Debug;

/// Item row identifier
pub type ItemId = i64;

/// A domain of folder-organized items (notes or chats).
///
/// Each kind owns a folder table and an item table; the generic folder and
/// item services are instantiated once per kind.
pub trait ItemKind: Send + Sync + 'static {
    /// Payload persisted in the item's `properties` column
    type Payload: Serialize + DeserializeOwned + Clone + Debug + PartialEq + Send + Sync;

    /// Sparse update applied by `ItemService::update`
    type Patch: Default + Debug + Send + Sync;

    /// Short domain name used in logs
    const NAME: &'static str;

    const FOLDER_TABLE: &'static str;

    const ITEM_TABLE: &'static str;

    /// Reason reported when an item lookup fails
    const ITEM_NOT_FOUND: &'static str;

    /// Merge the set fields of `patch` into `payload`
    fn apply_patch(payload: &mut Self::Payload, patch: Self::Patch);
}

/// A note or chat owned by a user, optionally filed into a folder.
///
/// `folder_id = None` means "unfiled"; unfiled items do not point at the
/// default folder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OwnedItem<P> {
    pub id: ItemId,
    pub owner_id: OwnerId,
    pub folder_id: Option<FolderId>,
    pub is_deleted: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub payload: P,
}

/// Insert parameters for an item
#[derive(Debug, Clone, PartialEq)]
pub struct NewItem<P> {
    pub owner_id: OwnerId,
    pub folder_id: Option<FolderId>,
    pub created_at: DateTime<Utc>,
    pub payload: P,
}

/// Sparse item update.
///
/// `folder_id: Some(id)` re-files the item; `None` leaves its folder unchanged.
#[derive(Debug, Default)]
pub struct ItemUpdate<Patch> {
    pub folder_id: Option<FolderId>,
    pub patch: Patch,
}

/// Folder scope for item listings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FolderFilter {
    /// Every active item of the owner
    #[default]
    All,
    /// Items with no folder
    Unfiled,
    /// Items filed directly in the given folder
    Folder(FolderId),
}

/// Note payload
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotePayload {
    pub title: String,
    #[serde(default)]
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cover_url: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct NotePatch {
    pub title: Option<String>,
    pub content: Option<String>,
    pub cover_url: Option<String>,
}

/// Chat conversation payload
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ChatPayload {
    pub title: String,
}

#[derive(Debug, Clone, Default)]
pub struct ChatPatch {
    pub title: Option<String>,
}

/// Notes domain (`note_folder` / `note` tables)
#[derive(Debug, Clone, Copy, Default)]
pub struct NoteKind;

impl ItemKind for NoteKind {
    type Payload = NotePayload;
    type Patch = NotePatch;

    const NAME: &'static str = "note";
    const FOLDER_TABLE: &'static str = "note_folder";
    const ITEM_TABLE: &'static str = "note";
    const ITEM_NOT_FOUND: &'static str = "笔记不存在";

    fn apply_patch(payload: &mut NotePayload, patch: NotePatch) {
        if let Some(title) = patch.title {
            payload.title = title;
        }
        if let Some(content) = patch.content {
            payload.content = content;
        }
        if let Some(cover_url) = patch.cover_url {
            payload.cover_url = Some(cover_url);
        }
    }
}

/// Chats domain (`chat_folder` / `chat` tables)
#[derive(Debug, Clone, Copy, Default)]
pub struct ChatKind;

impl ItemKind for ChatKind {
    type Payload = ChatPayload;
    type Patch = ChatPatch;

    const NAME: &'static str = "chat";
    const FOLDER_TABLE: &'static str = "chat_folder";
    const ITEM_TABLE: &'static str = "chat";
    const ITEM_NOT_FOUND: &'static str = "对话不存在";

    fn apply_patch(payload: &mut ChatPayload, patch: ChatPatch) {
        if let Some(title) = patch.title {
            payload.title = title;
        }
    }
}

pub type Note = OwnedItem<NotePayload>;
pub type Chat = OwnedItem<ChatPayload>;
