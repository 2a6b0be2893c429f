//! Database Layer
//!
//! This module handles all persistence for folders and the items filed in them:
//!
//! - Database initialization and connection management (libsql)
//! - The `FolderStore` / `ItemStore` / `MessageStore` ports the services depend on
//! - `TursoStore`, the libsql implementation of both ports
//! - `MemoryStore`, an in-process implementation for tests and tooling
//!
//! # Architecture
//!
//! Each item domain (notes, chats) owns a folder table and an item table in
//! the same database file. Folder and item rows are never removed; deletion
//! sets `is_deleted`. Chat messages live in one shared `chat_message` table.
//! Every statement is scoped by `user_id`.

mod database;
mod error;
mod folder_store;
mod memory_store;
mod turso_store;

pub use database::DatabaseService;
pub use error::DatabaseError;
pub use folder_store::{FolderStore, ItemStore, MessageStore};
pub use memory_store::MemoryStore;
pub use turso_store::TursoStore;
