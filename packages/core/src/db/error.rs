//! Database Error Types
//!
//! Errors raised while opening the libsql database, creating the folder and
//! item tables, and executing the statements behind the store ports.

use std::path::PathBuf;
use thiserror::Error;

/// Database operation errors
#[derive(Error, Debug)]
pub enum DatabaseError {
    /// Failed to open the database file
    #[error("Failed to connect to database at {path}: {source}")]
    ConnectionFailed {
        path: PathBuf,
        source: libsql::Error,
    },

    /// Failed to create tables or indexes
    #[error("Failed to initialize database schema: {0}")]
    InitializationFailed(String),

    /// Permission denied when creating the database directory
    #[error("Permission denied for database path: {path}")]
    PermissionDenied { path: PathBuf },

    /// Failed to create parent directory
    #[error("Failed to create parent directory for database: {0}")]
    DirectoryCreationFailed(#[from] std::io::Error),

    /// libsql operation error
    #[error("Database operation failed: {0}")]
    LibsqlError(#[from] libsql::Error),

    /// SQL execution error with context
    #[error("SQL execution failed: {context}")]
    SqlExecutionError { context: String },

    /// A multi-statement transaction was rolled back
    #[error("Transaction rolled back: {context}")]
    TransactionFailed { context: String },

    /// A stored row could not be decoded into a model
    #[error("Invalid row in {table}: {context}")]
    InvalidRow { table: String, context: String },
}

impl DatabaseError {
    pub fn connection_failed(path: PathBuf, source: libsql::Error) -> Self {
        Self::ConnectionFailed { path, source }
    }

    pub fn initialization_failed(msg: impl Into<String>) -> Self {
        Self::InitializationFailed(msg.into())
    }

    pub fn permission_denied(path: PathBuf) -> Self {
        Self::PermissionDenied { path }
    }

    /// Create a SQL execution error with context
    pub fn sql_execution(context: impl Into<String>) -> Self {
        Self::SqlExecutionError {
            context: context.into(),
        }
    }

    pub fn transaction_failed(context: impl Into<String>) -> Self {
        Self::TransactionFailed {
            context: context.into(),
        }
    }

    pub fn invalid_row(table: impl Into<String>, context: impl Into<String>) -> Self {
        Self::InvalidRow {
            table: table.into(),
            context: context.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages_carry_context() {
        let err = DatabaseError::sql_execution("Failed to insert folder: disk full");
        assert_eq!(
            err.to_string(),
            "SQL execution failed: Failed to insert folder: disk full"
        );

        let err = DatabaseError::invalid_row("note_folder", "bad created_at");
        assert_eq!(err.to_string(), "Invalid row in note_folder: bad created_at");
    }

    #[test]
    fn test_io_error_converts_to_directory_failure() {
        let io = std::io::Error::new(std::io::ErrorKind::Other, "read-only fs");
        let err: DatabaseError = io.into();
        assert!(matches!(err, DatabaseError::DirectoryCreationFailed(_)));
    }
}
