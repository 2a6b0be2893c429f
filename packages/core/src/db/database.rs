//! Database Connection Management
//!
//! This module opens the libsql database and creates the folder and item
//! tables for every item domain (notes, chats), plus the chat message table.
//!
//! # Architecture
//!
//! - **Path-agnostic**: Accepts any valid PathBuf
//! - **Two tables per domain**: `<domain>_folder` and `<domain>`
//! - **Soft delete only**: rows carry `is_deleted`, nothing is ever removed
//! - **WAL mode**: Write-Ahead Logging so readers never block the cascade writer
//!
//! # Database Connection Patterns
//!
//! Use `connect_with_timeout()` in async functions. It applies the configured
//! busy timeout so concurrent writers wait instead of failing immediately with
//! `SQLITE_BUSY`.
//!
//! ```no_run
//! # use foldspace_core::db::DatabaseService;
//! # use std::path::PathBuf;
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let db = DatabaseService::new(PathBuf::from("./data/foldspace.db")).await?;
//! let conn = db.connect_with_timeout().await?;
//! # Ok(())
//! # }
//! ```

use crate::config::StoreConfig;
use crate::db::error::DatabaseError;
use crate::models::{ChatKind, ItemKind, NoteKind, CHAT_MESSAGE_TABLE};
use libsql::{Builder, Database};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// (folder table, item table) for every domain the schema serves
const DOMAIN_TABLES: [(&str, &str); 2] = [
    (NoteKind::FOLDER_TABLE, NoteKind::ITEM_TABLE),
    (ChatKind::FOLDER_TABLE, ChatKind::ITEM_TABLE),
];

/// Database service for managing the libsql connection and schema
#[derive(Debug, Clone)]
pub struct DatabaseService {
    /// libsql database handle (wrapped in Arc for sharing)
    pub db: Arc<Database>,

    /// Path to the database file
    pub db_path: PathBuf,

    busy_timeout: Duration,
}

impl DatabaseService {
    /// Open (or create) the database at `db_path` with default settings
    ///
    /// This will:
    /// 1. Ensure the parent directory exists (create if needed)
    /// 2. Open/create the database file
    /// 3. Create folder and item tables (CREATE TABLE IF NOT EXISTS)
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the directory cannot be created, the
    /// connection fails, or schema initialization fails.
    pub async fn new(db_path: PathBuf) -> Result<Self, DatabaseError> {
        Self::from_config(&StoreConfig::new(db_path)).await
    }

    /// Open the database described by `config`
    pub async fn from_config(config: &StoreConfig) -> Result<Self, DatabaseError> {
        let db_path = config.database_path.clone();

        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    if e.kind() == std::io::ErrorKind::PermissionDenied {
                        DatabaseError::permission_denied(db_path.clone())
                    } else {
                        DatabaseError::DirectoryCreationFailed(e)
                    }
                })?;
            }
        }

        let db = Builder::new_local(&db_path)
            .build()
            .await
            .map_err(|e| DatabaseError::connection_failed(db_path.clone(), e))?;

        let service = Self {
            db: Arc::new(db),
            db_path,
            busy_timeout: config.busy_timeout,
        };

        service.initialize_schema().await?;
        tracing::debug!("Opened folder database at {}", service.db_path.display());

        Ok(service)
    }

    /// Execute a PRAGMA statement
    ///
    /// PRAGMA statements return rows, so they go through query() rather than execute().
    async fn execute_pragma(
        &self,
        conn: &libsql::Connection,
        pragma: &str,
    ) -> Result<(), DatabaseError> {
        let mut stmt = conn.prepare(pragma).await.map_err(|e| {
            DatabaseError::sql_execution(format!("Failed to execute '{}': {}", pragma, e))
        })?;
        let _ = stmt.query(()).await.map_err(|e| {
            DatabaseError::sql_execution(format!("Failed to execute '{}': {}", pragma, e))
        })?;
        Ok(())
    }

    /// Create tables and indexes for every domain (idempotent)
    async fn initialize_schema(&self) -> Result<(), DatabaseError> {
        let conn = self.connect_with_timeout().await?;

        self.execute_pragma(&conn, "PRAGMA journal_mode = WAL")
            .await?;

        for (folder_table, item_table) in DOMAIN_TABLES {
            Self::create_domain_tables(&conn, folder_table, item_table).await?;
        }
        Self::create_message_table(&conn).await?;

        Ok(())
    }

    async fn create_message_table(conn: &libsql::Connection) -> Result<(), DatabaseError> {
        let statements = [
            format!(
                "CREATE TABLE IF NOT EXISTS {CHAT_MESSAGE_TABLE} (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    user_id INTEGER NOT NULL,
                    chat_id INTEGER NOT NULL,
                    role TEXT NOT NULL,
                    content TEXT NOT NULL,
                    created_at TEXT NOT NULL
                )"
            ),
            format!(
                "CREATE INDEX IF NOT EXISTS idx_{CHAT_MESSAGE_TABLE}_chat
                 ON {CHAT_MESSAGE_TABLE}(user_id, chat_id, created_at)"
            ),
        ];

        for sql in &statements {
            conn.execute(sql, ()).await.map_err(|e| {
                DatabaseError::initialization_failed(format!(
                    "Failed to create schema for {}: {}",
                    CHAT_MESSAGE_TABLE, e
                ))
            })?;
        }

        Ok(())
    }

    async fn create_domain_tables(
        conn: &libsql::Connection,
        folder_table: &str,
        item_table: &str,
    ) -> Result<(), DatabaseError> {
        // No foreign key on parent_id / folder_id: parents may be soft-deleted
        // independently and orphans must stay readable.
        let statements = [
            format!(
                "CREATE TABLE IF NOT EXISTS {folder_table} (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    user_id INTEGER NOT NULL,
                    name TEXT NOT NULL,
                    parent_id INTEGER,
                    is_deleted INTEGER NOT NULL DEFAULT 0,
                    created_at TEXT NOT NULL
                )"
            ),
            format!(
                "CREATE INDEX IF NOT EXISTS idx_{folder_table}_owner
                 ON {folder_table}(user_id, is_deleted, created_at)"
            ),
            format!(
                "CREATE TABLE IF NOT EXISTS {item_table} (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    user_id INTEGER NOT NULL,
                    folder_id INTEGER,
                    is_deleted INTEGER NOT NULL DEFAULT 0,
                    created_at TEXT NOT NULL,
                    updated_at TEXT NOT NULL,
                    properties TEXT NOT NULL DEFAULT '{{}}'
                )"
            ),
            format!(
                "CREATE INDEX IF NOT EXISTS idx_{item_table}_owner_folder
                 ON {item_table}(user_id, folder_id)"
            ),
        ];

        for sql in &statements {
            conn.execute(sql, ()).await.map_err(|e| {
                DatabaseError::initialization_failed(format!(
                    "Failed to create schema for {}: {}",
                    folder_table, e
                ))
            })?;
        }

        Ok(())
    }

    /// Get a raw connection handle.
    ///
    /// Prefer `connect_with_timeout()` in async code.
    pub fn connect(&self) -> Result<libsql::Connection, DatabaseError> {
        self.db.connect().map_err(DatabaseError::LibsqlError)
    }

    /// Get a connection with the configured busy timeout applied
    pub async fn connect_with_timeout(&self) -> Result<libsql::Connection, DatabaseError> {
        let conn = self.connect()?;

        self.execute_pragma(
            &conn,
            &format!("PRAGMA busy_timeout = {}", self.busy_timeout.as_millis()),
        )
        .await?;

        Ok(conn)
    }

    pub fn busy_timeout(&self) -> Duration {
        self.busy_timeout
    }
}
