//! Service Layer Error Types
//!
//! Errors returned by folder and item services. Two typed kinds carry a
//! human-readable reason (`NotFound`, `InvalidArgument`); everything the store
//! raises is passed through unchanged as `StoreFailure`.

use thiserror::Error;

/// Folder absent, owned by someone else, or deleted
pub const FOLDER_NOT_FOUND: &str = "文件夹不存在";

/// Parent reference does not resolve to an active folder of the owner
pub const PARENT_NOT_FOUND: &str = "父文件夹不存在";

pub const DEFAULT_FOLDER_IS_LEAF: &str = "默认文件夹下不能创建子文件夹";

/// Target parent is the moved folder itself or one of its descendants
pub const MOVE_INTO_OWN_SUBTREE: &str = "不能移动到子文件夹";

pub const BLANK_FOLDER_NAME: &str = "文件夹名称不能为空";

pub const BLANK_MESSAGE_ROLE: &str = "角色不能为空";

pub const BLANK_MESSAGE_CONTENT: &str = "内容不能为空";

/// Service operation errors
#[derive(Error, Debug)]
pub enum FolderServiceError {
    /// Entity absent, not owned by the caller, or soft-deleted
    #[error("Not found: {0}")]
    NotFound(String),

    /// Request violates a hierarchy or validation rule
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Store operation failed
    #[error("Store operation failed: {0}")]
    StoreFailure(#[from] anyhow::Error),
}

impl FolderServiceError {
    pub fn not_found(reason: impl Into<String>) -> Self {
        Self::NotFound(reason.into())
    }

    pub fn invalid_argument(reason: impl Into<String>) -> Self {
        Self::InvalidArgument(reason.into())
    }

    /// Human-readable reason of a typed failure (`None` for store failures)
    pub fn reason(&self) -> Option<&str> {
        match self {
            Self::NotFound(reason) | Self::InvalidArgument(reason) => Some(reason.as_str()),
            Self::StoreFailure(_) => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }

    pub fn is_invalid_argument(&self) -> bool {
        matches!(self, Self::InvalidArgument(_))
    }
}

pub type FolderServiceResult<T> = Result<T, FolderServiceError>;
