//! Chat Message Model
//!
//! Messages are the turns of a chat conversation. They belong to exactly one
//! chat and are listed oldest first.

use super::folder::OwnerId;
use super::item::ItemId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Message row identifier
pub type MessageId = i64;

/// Table holding the messages of every chat
pub const CHAT_MESSAGE_TABLE: &str = "chat_message";

/// One turn of a chat conversation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    pub id: MessageId,
    pub owner_id: OwnerId,
    pub chat_id: ItemId,

    /// Speaker of the turn, e.g. `user` or `assistant`
    pub role: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

/// Insert parameters for a message
#[derive(Debug, Clone, PartialEq)]
pub struct NewChatMessage {
    pub owner_id: OwnerId,
    pub chat_id: ItemId,
    pub role: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
}
