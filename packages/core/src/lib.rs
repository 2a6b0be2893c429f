//! FolderSpace Core Business Logic Layer
//!
//! This crate provides hierarchical folder management for notes and chat
//! conversations: folder creation with parent validation, tree
//! reconstruction from flat storage, cycle-safe re-parenting, and cascading
//! soft-delete of a folder subtree together with the items filed in it. Chats
//! additionally carry their conversation messages.
//!
//! # Architecture
//!
//! - **One generic core**: notes and chats share `FolderService` / `ItemService`,
//!   parameterized by an `ItemKind` naming the domain's tables
//! - **Owner-scoped**: every operation takes the already-resolved owner id
//! - **Soft delete only**: rows are flagged, never removed
//! - **libsql/Turso**: Embedded SQLite-compatible database; payloads stored as JSON `properties`
//!
//! # Modules
//!
//! - [`models`] - Data structures (Folder, FolderTreeNode, OwnedItem, ItemKind, ChatMessage)
//! - [`services`] - Business services (DomainServices, FolderService, ItemService, MessageService)
//! - [`db`] - Database layer with libsql integration and store ports
//! - [`config`] - Store configuration from defaults or environment

pub mod config;
pub mod db;
pub mod models;
pub mod services;

// Re-export commonly used types
pub use config::StoreConfig;
pub use models::*;
pub use services::*;
