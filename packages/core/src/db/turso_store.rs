//! TursoStore - Store Ports for the libsql Backend
//!
//! `TursoStore<K>` implements [`FolderStore`] and [`ItemStore<K>`] over the
//! `K::FOLDER_TABLE` / `K::ITEM_TABLE` tables created by `DatabaseService`.
//! One instance serves one domain; notes and chats share the database file.
//! `TursoStore<ChatKind>` also implements [`MessageStore`] over `chat_message`.
//!
//! # Row Conversion
//!
//! Timestamps are stored as fixed-width RFC3339 strings (microseconds, `Z`)
//! so that `ORDER BY created_at` is chronological. Item payloads live in the
//! JSON `properties` column.
//!
//! # Examples
//!
//! ```rust,no_run
//! use foldspace_core::db::{DatabaseService, FolderStore, TursoStore};
//! use foldspace_core::models::NoteKind;
//! use std::path::PathBuf;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let db = Arc::new(DatabaseService::new(PathBuf::from("./data/test.db")).await?);
//!     let store: TursoStore<NoteKind> = TursoStore::new(db);
//!
//!     let folders = store.list_active_folders(42).await?;
//!     println!("{} folders", folders.len());
//!     Ok(())
//! }
//! ```

use crate::db::folder_store::{FolderStore, ItemStore, MessageStore};
use crate::db::{DatabaseError, DatabaseService};
use crate::models::{
    CascadeSummary, ChatKind, ChatMessage, Folder, FolderFilter, FolderId, ItemId, ItemKind,
    NewChatMessage, NewFolder, NewItem, OwnedItem, OwnerId, CHAT_MESSAGE_TABLE,
};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, SecondsFormat, Utc};
use libsql::params;
use libsql::{Row, Value};
use std::marker::PhantomData;
use std::sync::Arc;

const FOLDER_COLUMNS: &str = "id, user_id, name, parent_id, is_deleted, created_at";
const ITEM_COLUMNS: &str = "id, user_id, folder_id, is_deleted, created_at, updated_at, properties";
const MESSAGE_COLUMNS: &str = "id, user_id, chat_id, role, content, created_at";

/// Folder ids bound per bulk UPDATE of a cascade
pub(crate) const CASCADE_CHUNK_SIZE: usize = 500;

/// libsql-backed folder and item store for the domain `K`
pub struct TursoStore<K> {
    db: Arc<DatabaseService>,
    _kind: PhantomData<fn() -> K>,
}

impl<K> Clone for TursoStore<K> {
    fn clone(&self) -> Self {
        Self {
            db: self.db.clone(),
            _kind: PhantomData,
        }
    }
}

/// Format a timestamp for storage (sortable as text)
pub(crate) fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Parse timestamp from database - handles both SQLite and RFC3339 formats
///
/// SQLite CURRENT_TIMESTAMP returns: "YYYY-MM-DD HH:MM:SS"; rows written by
/// this store use RFC3339.
pub(crate) fn parse_timestamp(s: &str) -> Result<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }

    if let Ok(naive) = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S") {
        return Ok(naive.and_utc());
    }

    Err(anyhow::anyhow!(
        "Unable to parse timestamp '{}' as RFC3339 or SQLite format",
        s
    ))
}

/// `?, ?, ?` for an IN list of `count` values
fn placeholders(count: usize) -> String {
    vec!["?"; count].join(", ")
}

impl<K: ItemKind> TursoStore<K> {
    pub fn new(db: Arc<DatabaseService>) -> Self {
        Self {
            db,
            _kind: PhantomData,
        }
    }

    /// Convert a row selected with `FOLDER_COLUMNS` to a Folder
    fn row_to_folder(row: &Row) -> Result<Folder> {
        let id: i64 = row.get(0).context("Failed to get id")?;
        let owner_id: i64 = row.get(1).context("Failed to get user_id")?;
        let name: String = row.get(2).context("Failed to get name")?;
        let parent_id: Option<i64> = row.get(3).context("Failed to get parent_id")?;
        let is_deleted: i64 = row.get(4).context("Failed to get is_deleted")?;
        let created_at_str: String = row.get(5).context("Failed to get created_at")?;

        let created_at = parse_timestamp(&created_at_str)
            .map_err(|e| DatabaseError::invalid_row(K::FOLDER_TABLE, e.to_string()))?;

        Ok(Folder {
            id,
            owner_id,
            name,
            parent_id,
            is_deleted: is_deleted != 0,
            created_at,
        })
    }

    /// Convert a row selected with `ITEM_COLUMNS` to an OwnedItem
    fn row_to_item(row: &Row) -> Result<OwnedItem<K::Payload>> {
        let id: i64 = row.get(0).context("Failed to get id")?;
        let owner_id: i64 = row.get(1).context("Failed to get user_id")?;
        let folder_id: Option<i64> = row.get(2).context("Failed to get folder_id")?;
        let is_deleted: i64 = row.get(3).context("Failed to get is_deleted")?;
        let created_at_str: String = row.get(4).context("Failed to get created_at")?;
        let updated_at_str: String = row.get(5).context("Failed to get updated_at")?;
        let properties_json: String = row.get(6).context("Failed to get properties")?;

        let payload: K::Payload = serde_json::from_str(&properties_json).map_err(|e| {
            DatabaseError::invalid_row(K::ITEM_TABLE, format!("item {}: {}", id, e))
        })?;

        Ok(OwnedItem {
            id,
            owner_id,
            folder_id,
            is_deleted: is_deleted != 0,
            created_at: parse_timestamp(&created_at_str)?,
            updated_at: parse_timestamp(&updated_at_str)?,
            payload,
        })
    }

    async fn query_folders(&self, sql: &str, owner_id: OwnerId) -> Result<Vec<Folder>> {
        let conn = self.db.connect_with_timeout().await?;
        let mut rows = conn
            .query(sql, params![owner_id])
            .await
            .map_err(|e| DatabaseError::sql_execution(format!("Failed to list folders: {}", e)))?;

        let mut folders = Vec::new();
        while let Some(row) = rows.next().await? {
            folders.push(Self::row_to_folder(&row)?);
        }
        Ok(folders)
    }

    /// Both bulk updates of a cascade, run inside the caller's transaction
    ///
    /// Ids are bound in chunks of `CASCADE_CHUNK_SIZE` to stay below the
    /// SQLite host-parameter limit on large subtrees.
    async fn cascade_statements(
        conn: &libsql::Connection,
        owner_id: OwnerId,
        folder_ids: &[FolderId],
    ) -> Result<CascadeSummary> {
        let mut summary = CascadeSummary::default();

        for chunk in folder_ids.chunks(CASCADE_CHUNK_SIZE) {
            summary.folders += Self::mark_deleted(conn, K::FOLDER_TABLE, "id", owner_id, chunk)
                .await
                .map_err(|e| {
                    DatabaseError::sql_execution(format!("Failed to soft-delete folders: {}", e))
                })?;
        }

        for chunk in folder_ids.chunks(CASCADE_CHUNK_SIZE) {
            summary.items += Self::mark_deleted(conn, K::ITEM_TABLE, "folder_id", owner_id, chunk)
                .await
                .map_err(|e| {
                    DatabaseError::sql_execution(format!("Failed to soft-delete items: {}", e))
                })?;
        }

        Ok(summary)
    }

    /// `UPDATE table SET is_deleted = 1` for active rows of the owner whose
    /// `column` is one of `ids`
    async fn mark_deleted(
        conn: &libsql::Connection,
        table: &str,
        column: &str,
        owner_id: OwnerId,
        ids: &[FolderId],
    ) -> std::result::Result<u64, libsql::Error> {
        let mut bindings = Vec::with_capacity(ids.len() + 1);
        bindings.push(Value::Integer(owner_id));
        bindings.extend(ids.iter().map(|id| Value::Integer(*id)));

        conn.execute(
            &format!(
                "UPDATE {} SET is_deleted = 1 WHERE user_id = ? AND is_deleted = 0 AND {} IN ({})",
                table,
                column,
                placeholders(ids.len())
            ),
            params::Params::Positional(bindings),
        )
        .await
    }
}

#[async_trait]
impl<K: ItemKind> FolderStore for TursoStore<K> {
    async fn get_active_folder(
        &self,
        id: FolderId,
        owner_id: OwnerId,
    ) -> Result<Option<Folder>> {
        let conn = self.db.connect_with_timeout().await?;
        let sql = format!(
            "SELECT {} FROM {} WHERE id = ? AND user_id = ? AND is_deleted = 0",
            FOLDER_COLUMNS,
            K::FOLDER_TABLE
        );

        let mut rows = conn
            .query(&sql, params![id, owner_id])
            .await
            .map_err(|e| DatabaseError::sql_execution(format!("Failed to get folder: {}", e)))?;

        match rows.next().await? {
            Some(row) => Ok(Some(Self::row_to_folder(&row)?)),
            None => Ok(None),
        }
    }

    async fn list_active_folders(&self, owner_id: OwnerId) -> Result<Vec<Folder>> {
        let sql = format!(
            "SELECT {} FROM {} WHERE user_id = ? AND is_deleted = 0 ORDER BY created_at ASC, id ASC",
            FOLDER_COLUMNS,
            K::FOLDER_TABLE
        );
        self.query_folders(&sql, owner_id).await
    }

    async fn list_all_folders(&self, owner_id: OwnerId) -> Result<Vec<Folder>> {
        let sql = format!(
            "SELECT {} FROM {} WHERE user_id = ? ORDER BY created_at ASC, id ASC",
            FOLDER_COLUMNS,
            K::FOLDER_TABLE
        );
        self.query_folders(&sql, owner_id).await
    }

    async fn insert_folder(&self, folder: NewFolder) -> Result<Folder> {
        let conn = self.db.connect_with_timeout().await?;
        let created_at = format_timestamp(&folder.created_at);

        conn.execute(
            &format!(
                "INSERT INTO {} (user_id, name, parent_id, is_deleted, created_at) VALUES (?, ?, ?, 0, ?)",
                K::FOLDER_TABLE
            ),
            params![
                folder.owner_id,
                folder.name.as_str(),
                folder.parent_id,
                created_at.as_str()
            ],
        )
        .await
        .map_err(|e| DatabaseError::sql_execution(format!("Failed to insert folder: {}", e)))?;

        Ok(Folder {
            id: conn.last_insert_rowid(),
            owner_id: folder.owner_id,
            name: folder.name,
            parent_id: folder.parent_id,
            is_deleted: false,
            created_at: folder.created_at,
        })
    }

    async fn update_folder(&self, folder: &Folder) -> Result<()> {
        let conn = self.db.connect_with_timeout().await?;

        let rows_affected = conn
            .execute(
                &format!(
                    "UPDATE {} SET name = ?, parent_id = ? WHERE id = ? AND user_id = ?",
                    K::FOLDER_TABLE
                ),
                params![
                    folder.name.as_str(),
                    folder.parent_id,
                    folder.id,
                    folder.owner_id
                ],
            )
            .await
            .map_err(|e| DatabaseError::sql_execution(format!("Failed to update folder: {}", e)))?;

        if rows_affected == 0 {
            return Err(DatabaseError::sql_execution(format!(
                "Folder {} of owner {} disappeared before update",
                folder.id, folder.owner_id
            ))
            .into());
        }

        Ok(())
    }

    async fn soft_delete_cascade(
        &self,
        owner_id: OwnerId,
        folder_ids: &[FolderId],
    ) -> Result<CascadeSummary> {
        if folder_ids.is_empty() {
            return Ok(CascadeSummary::default());
        }

        let conn = self.db.connect_with_timeout().await?;

        // Both updates commit together; readers never see a half-applied cascade
        conn.execute("BEGIN IMMEDIATE", ()).await.map_err(|e| {
            DatabaseError::sql_execution(format!("Failed to begin transaction: {}", e))
        })?;

        let summary = match Self::cascade_statements(&conn, owner_id, folder_ids).await {
            Ok(summary) => summary,
            Err(e) => {
                let _rollback = conn.execute("ROLLBACK", ()).await;
                return Err(e.context(DatabaseError::transaction_failed(format!(
                    "cascading delete of {} folder(s) in {}",
                    folder_ids.len(),
                    K::FOLDER_TABLE
                ))));
            }
        };

        if let Err(e) = conn.execute("COMMIT", ()).await {
            let _rollback = conn.execute("ROLLBACK", ()).await;
            return Err(DatabaseError::transaction_failed(format!(
                "Failed to commit cascading delete: {}",
                e
            ))
            .into());
        }

        Ok(summary)
    }
}

#[async_trait]
impl<K: ItemKind> ItemStore<K> for TursoStore<K> {
    async fn insert_item(&self, item: NewItem<K::Payload>) -> Result<OwnedItem<K::Payload>> {
        let conn = self.db.connect_with_timeout().await?;
        let created_at = format_timestamp(&item.created_at);
        let properties = serde_json::to_string(&item.payload)
            .context("Failed to serialize item payload")?;

        conn.execute(
            &format!(
                "INSERT INTO {} (user_id, folder_id, is_deleted, created_at, updated_at, properties)
                 VALUES (?, ?, 0, ?, ?, ?)",
                K::ITEM_TABLE
            ),
            params![
                item.owner_id,
                item.folder_id,
                created_at.as_str(),
                created_at.as_str(),
                properties.as_str()
            ],
        )
        .await
        .map_err(|e| DatabaseError::sql_execution(format!("Failed to insert item: {}", e)))?;

        Ok(OwnedItem {
            id: conn.last_insert_rowid(),
            owner_id: item.owner_id,
            folder_id: item.folder_id,
            is_deleted: false,
            created_at: item.created_at,
            updated_at: item.created_at,
            payload: item.payload,
        })
    }

    async fn get_active_item(
        &self,
        id: ItemId,
        owner_id: OwnerId,
    ) -> Result<Option<OwnedItem<K::Payload>>> {
        let conn = self.db.connect_with_timeout().await?;
        let sql = format!(
            "SELECT {} FROM {} WHERE id = ? AND user_id = ? AND is_deleted = 0",
            ITEM_COLUMNS,
            K::ITEM_TABLE
        );

        let mut rows = conn
            .query(&sql, params![id, owner_id])
            .await
            .map_err(|e| DatabaseError::sql_execution(format!("Failed to get item: {}", e)))?;

        match rows.next().await? {
            Some(row) => Ok(Some(Self::row_to_item(&row)?)),
            None => Ok(None),
        }
    }

    async fn update_item(&self, item: &OwnedItem<K::Payload>) -> Result<()> {
        let conn = self.db.connect_with_timeout().await?;
        let updated_at = format_timestamp(&item.updated_at);
        let properties = serde_json::to_string(&item.payload)
            .context("Failed to serialize item payload")?;

        let rows_affected = conn
            .execute(
                &format!(
                    "UPDATE {} SET folder_id = ?, is_deleted = ?, updated_at = ?, properties = ?
                     WHERE id = ? AND user_id = ?",
                    K::ITEM_TABLE
                ),
                params![
                    item.folder_id,
                    i64::from(item.is_deleted),
                    updated_at.as_str(),
                    properties.as_str(),
                    item.id,
                    item.owner_id
                ],
            )
            .await
            .map_err(|e| DatabaseError::sql_execution(format!("Failed to update item: {}", e)))?;

        if rows_affected == 0 {
            return Err(DatabaseError::sql_execution(format!(
                "{} {} of owner {} disappeared before update",
                K::NAME,
                item.id,
                item.owner_id
            ))
            .into());
        }

        Ok(())
    }

    async fn list_active_items(
        &self,
        owner_id: OwnerId,
        filter: FolderFilter,
    ) -> Result<Vec<OwnedItem<K::Payload>>> {
        let conn = self.db.connect_with_timeout().await?;

        let mut bindings = vec![Value::Integer(owner_id)];
        let folder_clause = match filter {
            FolderFilter::All => "",
            FolderFilter::Unfiled => " AND folder_id IS NULL",
            FolderFilter::Folder(folder_id) => {
                bindings.push(Value::Integer(folder_id));
                " AND folder_id = ?"
            }
        };

        let sql = format!(
            "SELECT {} FROM {} WHERE user_id = ? AND is_deleted = 0{} ORDER BY updated_at DESC, id DESC",
            ITEM_COLUMNS,
            K::ITEM_TABLE,
            folder_clause
        );

        let mut rows = conn
            .query(&sql, params::Params::Positional(bindings))
            .await
            .map_err(|e| DatabaseError::sql_execution(format!("Failed to list items: {}", e)))?;

        let mut items = Vec::new();
        while let Some(row) = rows.next().await? {
            items.push(Self::row_to_item(&row)?);
        }
        Ok(items)
    }
}

/// Convert a row selected with `MESSAGE_COLUMNS` to a ChatMessage
fn row_to_message(row: &Row) -> Result<ChatMessage> {
    let id: i64 = row.get(0).context("Failed to get id")?;
    let owner_id: i64 = row.get(1).context("Failed to get user_id")?;
    let chat_id: i64 = row.get(2).context("Failed to get chat_id")?;
    let role: String = row.get(3).context("Failed to get role")?;
    let content: String = row.get(4).context("Failed to get content")?;
    let created_at_str: String = row.get(5).context("Failed to get created_at")?;

    let created_at = parse_timestamp(&created_at_str)
        .map_err(|e| DatabaseError::invalid_row(CHAT_MESSAGE_TABLE, e.to_string()))?;

    Ok(ChatMessage {
        id,
        owner_id,
        chat_id,
        role,
        content,
        created_at,
    })
}

#[async_trait]
impl MessageStore for TursoStore<ChatKind> {
    async fn insert_message(&self, message: NewChatMessage) -> Result<ChatMessage> {
        let conn = self.db.connect_with_timeout().await?;
        let created_at = format_timestamp(&message.created_at);

        conn.execute(
            &format!(
                "INSERT INTO {} (user_id, chat_id, role, content, created_at) VALUES (?, ?, ?, ?, ?)",
                CHAT_MESSAGE_TABLE
            ),
            params![
                message.owner_id,
                message.chat_id,
                message.role.as_str(),
                message.content.as_str(),
                created_at.as_str()
            ],
        )
        .await
        .map_err(|e| DatabaseError::sql_execution(format!("Failed to insert message: {}", e)))?;

        Ok(ChatMessage {
            id: conn.last_insert_rowid(),
            owner_id: message.owner_id,
            chat_id: message.chat_id,
            role: message.role,
            content: message.content,
            created_at: message.created_at,
        })
    }

    async fn list_messages(&self, chat_id: ItemId, owner_id: OwnerId) -> Result<Vec<ChatMessage>> {
        let conn = self.db.connect_with_timeout().await?;
        let sql = format!(
            "SELECT {} FROM {} WHERE chat_id = ? AND user_id = ? ORDER BY created_at ASC, id ASC",
            MESSAGE_COLUMNS, CHAT_MESSAGE_TABLE
        );

        let mut rows = conn
            .query(&sql, params![chat_id, owner_id])
            .await
            .map_err(|e| DatabaseError::sql_execution(format!("Failed to list messages: {}", e)))?;

        let mut messages = Vec::new();
        while let Some(row) = rows.next().await? {
            messages.push(row_to_message(&row)?);
        }
        Ok(messages)
    }

    async fn delete_messages(&self, chat_id: ItemId, owner_id: OwnerId) -> Result<u64> {
        let conn = self.db.connect_with_timeout().await?;

        let removed = conn
            .execute(
                &format!(
                    "DELETE FROM {} WHERE chat_id = ? AND user_id = ?",
                    CHAT_MESSAGE_TABLE
                ),
                params![chat_id, owner_id],
            )
            .await
            .map_err(|e| {
                DatabaseError::sql_execution(format!("Failed to delete messages: {}", e))
            })?;

        Ok(removed)
    }
}
