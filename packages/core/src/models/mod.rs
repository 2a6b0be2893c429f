//! Data Models
//!
//! This module contains the core data structures used throughout FolderSpace:
//!
//! - `Folder` / `FolderTreeNode` - Flat folder records and their nested view
//! - `OwnedItem` - Notes and chats filed into folders
//! - `ItemKind` - Marker types naming a domain (notes, chats) and its tables
//! - `ChatMessage` - Turns of a chat conversation

mod folder;
mod item;
mod message;

pub use folder::{
    CascadeSummary, Folder, FolderId, FolderTreeNode, NewFolder, OwnerId, DEFAULT_FOLDER_NAME,
};
pub use item::{
    Chat, ChatKind, ChatPatch, ChatPayload, FolderFilter, ItemId, ItemKind, ItemUpdate, NewItem,
    Note, NoteKind, NotePatch, NotePayload, OwnedItem,
};
pub use message::{ChatMessage, MessageId, NewChatMessage, CHAT_MESSAGE_TABLE};
