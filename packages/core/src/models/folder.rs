//! Folder Model
//!
//! Folders organize owned items (notes, chats) into per-owner hierarchies.
//! The stored shape is flat (`parent_id` references); the nested view is
//! produced on demand as [`FolderTreeNode`] values.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Owner (user) identity every folder and item is scoped to
pub type OwnerId = i64;

/// Folder row identifier
pub type FolderId = i64;

/// Reserved name of the per-owner default ("unfiled") root folder
pub const DEFAULT_FOLDER_NAME: &str = "未分类";

/// A persisted folder record.
///
/// # Default Folder
///
/// The default folder is identified structurally: a root folder
/// (`parent_id = None`) named [`DEFAULT_FOLDER_NAME`]. There is no dedicated
/// flag column, so a user folder renamed to that name at root level becomes
/// indistinguishable from the default one.
///
/// # Examples
///
/// ```rust
/// # use foldspace_core::models::{Folder, DEFAULT_FOLDER_NAME};
/// # use chrono::Utc;
/// let folder = Folder {
///     id: 1,
///     owner_id: 7,
///     name: DEFAULT_FOLDER_NAME.to_string(),
///     parent_id: None,
///     is_deleted: false,
///     created_at: Utc::now(),
/// };
/// assert!(folder.is_default_root());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Folder {
    pub id: FolderId,

    /// Owning user
    pub owner_id: OwnerId,

    pub name: String,

    /// Parent folder (None for root folders)
    pub parent_id: Option<FolderId>,

    /// Soft-delete flag, only ever transitions false -> true
    pub is_deleted: bool,

    pub created_at: DateTime<Utc>,
}

impl Folder {
    /// Whether this folder is the owner's default root folder
    pub fn is_default_root(&self) -> bool {
        self.parent_id.is_none() && self.name == DEFAULT_FOLDER_NAME
    }

    pub fn is_root(&self) -> bool {
        self.parent_id.is_none()
    }
}

/// Insert parameters for a folder (id and timestamps are assigned by the store)
#[derive(Debug, Clone, PartialEq)]
pub struct NewFolder {
    pub owner_id: OwnerId,
    pub name: String,
    pub parent_id: Option<FolderId>,
    pub created_at: DateTime<Utc>,
}

/// Nested view of a folder and its active subfolders.
///
/// Built fresh on every tree query; carries no persistent identity of its own.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FolderTreeNode {
    pub id: FolderId,
    pub name: String,
    pub parent_id: Option<FolderId>,
    pub created_at: DateTime<Utc>,

    /// Child folders in ascending creation order
    #[serde(default)]
    pub children: Vec<FolderTreeNode>,
}

impl FolderTreeNode {
    /// Total number of nodes in this subtree, including `self`
    pub fn subtree_len(&self) -> usize {
        let mut count = 0;
        let mut pending = vec![self];
        while let Some(node) = pending.pop() {
            count += 1;
            pending.extend(node.children.iter());
        }
        count
    }
}

// Releases nested children from a flat work list so deep trees do not
// overflow the stack
impl Drop for FolderTreeNode {
    fn drop(&mut self) {
        let mut pending = std::mem::take(&mut self.children);
        while let Some(mut node) = pending.pop() {
            pending.append(&mut node.children);
        }
    }
}

impl From<&Folder> for FolderTreeNode {
    fn from(folder: &Folder) -> Self {
        Self {
            id: folder.id,
            name: folder.name.clone(),
            parent_id: folder.parent_id,
            created_at: folder.created_at,
            children: Vec::new(),
        }
    }
}

/// Rows touched by a cascading soft-delete
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CascadeSummary {
    /// Folders marked deleted (the target plus its descendants)
    pub folders: u64,

    /// Items marked deleted because they were filed in one of those folders
    pub items: u64,
}
