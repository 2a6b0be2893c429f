//! Business Services Layer
//!
//! This module contains the folder and item services:
//!
//! - `FolderService` - Folder create / rename / move / cascading delete and tree view
//! - `ItemService` - Note and chat lifecycle within those folders
//! - `MessageService` - Messages of a chat conversation
//! - `DomainServices` - A domain's folder and item services on shared locks
//! - `FolderGuard` - Parent reference validation
//! - `OwnerWriteLocks` - Per-owner serialization of folder mutations
//!
//! Services are generic over the store so the same code serves the note and
//! chat domains (and `MemoryStore` in tests). The aliases below name the
//! libsql-backed instantiations; `NoteDomain::new` / `ChatDomain::new` are
//! the usual entry points.

pub mod domain;
pub mod error;
pub mod folder_guard;
pub mod folder_service;
pub mod folder_tree;
pub mod item_service;
pub mod message_service;
pub mod owner_locks;

pub use domain::DomainServices;
pub use error::{FolderServiceError, FolderServiceResult};
pub use folder_guard::{compute_descendant_ids, FolderGuard};
pub use folder_service::FolderService;
pub use folder_tree::build_folder_tree;
pub use item_service::ItemService;
pub use message_service::MessageService;
pub use owner_locks::OwnerWriteLocks;

use crate::db::TursoStore;
use crate::models::{ChatKind, NoteKind};
use chrono::{DateTime, SubsecRound, Utc};

pub type NoteFolderService = FolderService<TursoStore<NoteKind>>;
pub type ChatFolderService = FolderService<TursoStore<ChatKind>>;
pub type NoteService = ItemService<NoteKind, TursoStore<NoteKind>>;
pub type ChatService = ItemService<ChatKind, TursoStore<ChatKind>>;
pub type ChatMessageService = MessageService<TursoStore<ChatKind>>;
pub type NoteDomain = DomainServices<NoteKind, TursoStore<NoteKind>>;
pub type ChatDomain = DomainServices<ChatKind, TursoStore<ChatKind>>;

/// Current time at the microsecond precision the stores persist
pub(crate) fn now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(6)
}
