use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::Tag;

/// Placeholder written over the text of a soft-deleted message
pub const DELETED_MESSAGE_TEXT: &str = "This message has been deleted";

/// Upper bound on message text length, in bytes
pub const MAX_MESSAGE_LENGTH: usize = 10_000;

/// Reserved extension point for emoji-style reactions. Always empty at
/// creation and never mutated by any store operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reaction {
    pub reaction: String,
    pub user_ids: Vec<String>,
}

/// Message entity: the persisted unit of a conversation. Owned exclusively
/// by the store after creation; `text` is only ever rewritten by the
/// soft-delete transition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub id: String,
    pub conversation_id: String,
    pub sender_id: String,
    pub text: String,
    pub tags: Vec<Tag>,
    /// Identity ids of users who liked this message, in like order.
    /// Semantically a set: never contains duplicates.
    pub likes: Vec<String>,
    /// Derived from `likes` when a view is assembled, so it cannot drift
    pub likes_count: i64,
    pub resolved: bool,
    /// One-way flag; no operation ever clears it
    pub deleted: bool,
    pub reactions: Vec<Reaction>,
    pub created: String, // ISO 8601 timestamp
}

impl Message {
    /// Create a new message with store defaults applied
    pub fn new(
        conversation_id: String,
        text: String,
        sender_id: String,
        tags: Vec<Tag>,
    ) -> Self {
        let now = chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Micros, true);

        Self {
            id: Uuid::new_v4().to_string(),
            conversation_id,
            sender_id,
            text,
            tags,
            likes: Vec::new(),
            likes_count: 0,
            resolved: false,
            deleted: false,
            reactions: Vec::new(),
            created: now,
        }
    }

    /// Validate message text
    pub fn validate_content(text: &str) -> Result<(), String> {
        let len = text.len();
        if len == 0 {
            return Err("Message text cannot be empty".to_string());
        }
        if len > MAX_MESSAGE_LENGTH {
            return Err(format!(
                "Message text too long: {} bytes (max {})",
                len, MAX_MESSAGE_LENGTH
            ));
        }
        Ok(())
    }
}

// ========== DTOs (Data Transfer Objects) ==========

/// Payload for creating a message; the sender identity arrives separately
/// from the authenticated caller context
#[derive(Debug, Clone, Deserialize)]
pub struct CreateMessageRequest {
    pub conversation_id: String,
    pub text: String,
    pub tags: Option<Vec<Tag>>,
}
