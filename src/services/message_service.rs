use std::sync::Arc;
use std::time::Duration;

use crate::{
    database::Database,
    domain::ports::MessageRepository,
    errors::{StoreError, StoreResult},
    models::{
        CreateMessageRequest, Message, MessageSummary, Tag, TaggedMessageGroup,
        DELETED_MESSAGE_TEXT,
    },
};

/// Transient write conflicts on the likes set are retried this many times
/// before the operation fails
const MAX_WRITE_RETRIES: u32 = 3;

/// The message store: sole mutator and reader of message documents.
///
/// Holds no state beyond the persistence handle, so it is cheap to clone
/// and safe to share across request-handling tasks. Permission checks
/// happen upstream; callers hand in a conversation id and an authenticated
/// sender identity.
#[derive(Clone)]
pub struct MessageService {
    repository: Arc<dyn MessageRepository>,
}

impl MessageService {
    pub fn new(db: Database) -> Self {
        Self {
            repository: Arc::new(db),
        }
    }

    pub fn with_repository(repository: Arc<dyn MessageRepository>) -> Self {
        Self { repository }
    }

    /// Create a message in a conversation
    /// Validates the payload before any persistence access
    pub async fn create(
        &self,
        request: CreateMessageRequest,
        sender_id: &str,
    ) -> StoreResult<Message> {
        if request.conversation_id.trim().is_empty() {
            return Err(StoreError::Validation(
                "conversation_id is required".to_string(),
            ));
        }
        Message::validate_content(&request.text).map_err(StoreError::Validation)?;

        let message = Message::new(
            request.conversation_id,
            request.text,
            sender_id.to_string(),
            request.tags.unwrap_or_default(),
        );

        self.repository.insert_message(&message).await?;

        // Return the stored view so persisted tag reference ids are present
        self.get_message(&message.id).await
    }

    /// Get a message by id. Deleted messages are returned with their
    /// scrubbed placeholder text, not filtered out.
    pub async fn get_message(&self, message_id: &str) -> StoreResult<Message> {
        self.repository
            .get_message_by_id(message_id)
            .await?
            .ok_or_else(|| StoreError::NotFound(format!("Message {} not found", message_id)))
    }

    /// List a conversation's messages, newest first, capped at `limit`.
    /// Deleted messages appear with placeholder text.
    pub async fn list_conversation_messages(
        &self,
        conversation_id: &str,
        limit: i64,
    ) -> StoreResult<Vec<Message>> {
        if limit <= 0 {
            return Err(StoreError::Validation(
                "limit must be a positive integer".to_string(),
            ));
        }
        self.repository.list_messages(conversation_id, limit).await
    }

    /// Replace a message's entire tag list. A replace, not a merge: tags
    /// absent from the new list are discarded.
    pub async fn update_tags(&self, message_id: &str, tags: Vec<Tag>) -> StoreResult<Message> {
        let found = self.repository.replace_message_tags(message_id, &tags).await?;
        if !found {
            return Err(StoreError::NotFound(
                "Could not update tags on message".to_string(),
            ));
        }
        self.get_message(message_id).await
    }

    /// Add a user to a message's likes set. Idempotent: repeated likes by
    /// the same user never duplicate or inflate the count.
    pub async fn like(&self, message_id: &str, user_id: &str) -> StoreResult<Message> {
        self.apply_like_change(message_id, user_id, true).await
    }

    /// Remove a user from a message's likes set. A no-op when the user
    /// never liked the message.
    pub async fn unlike(&self, message_id: &str, user_id: &str) -> StoreResult<Message> {
        self.apply_like_change(message_id, user_id, false).await
    }

    /// Mark a message resolved. Idempotent.
    pub async fn resolve(&self, message_id: &str) -> StoreResult<Message> {
        self.apply_resolved(message_id, true).await
    }

    /// Clear a message's resolved flag. Idempotent.
    pub async fn unresolve(&self, message_id: &str) -> StoreResult<Message> {
        self.apply_resolved(message_id, false).await
    }

    /// Soft-delete a message: flips the one-way deleted flag and replaces
    /// the text with a fixed placeholder. Likes, tags, resolved state and
    /// audit fields are untouched. Safe to call more than once.
    pub async fn delete(&self, message_id: &str) -> StoreResult<Message> {
        let found = self
            .repository
            .mark_deleted(message_id, DELETED_MESSAGE_TEXT)
            .await?;
        if !found {
            return Err(StoreError::NotFound(format!(
                "Message {} not found",
                message_id
            )));
        }
        self.get_message(message_id).await
    }

    /// Group non-deleted messages from the given conversations by the
    /// distinct combination of query tag ids each message carries.
    ///
    /// The grouping key is the exact intersection of a message's tags with
    /// the query's tag ids: messages matching a strict subset or superset
    /// land in different groups. `limit` caps the matched messages fed into
    /// grouping, which also bounds the number of groups.
    pub async fn get_messages_by_tags(
        &self,
        conversation_ids: &[String],
        tags: &[Tag],
        limit: i64,
    ) -> StoreResult<Vec<TaggedMessageGroup>> {
        if limit <= 0 {
            return Err(StoreError::Validation(
                "limit must be a positive integer".to_string(),
            ));
        }
        if conversation_ids.is_empty() || tags.is_empty() {
            return Ok(Vec::new());
        }

        let mut query_tag_ids: Vec<String> = tags.iter().map(|tag| tag.id.clone()).collect();
        query_tag_ids.sort();
        query_tag_ids.dedup();

        let messages = self
            .repository
            .find_tagged_messages(conversation_ids, &query_tag_ids, limit)
            .await?;

        let mut groups: Vec<TaggedMessageGroup> = Vec::new();
        for message in messages {
            let mut combination: Vec<String> = message
                .tags
                .iter()
                .filter(|tag| query_tag_ids.binary_search(&tag.id).is_ok())
                .map(|tag| tag.id.clone())
                .collect();
            combination.sort();
            combination.dedup();
            if combination.is_empty() {
                continue;
            }

            let summary = MessageSummary {
                sender_id: message.sender_id.clone(),
                message: message.text.clone(),
                tags: message.tags.clone(),
            };

            // Groups keep first-seen order; messages within a group keep
            // creation order
            match groups
                .iter_mut()
                .find(|group| group.tag_combination == combination)
            {
                Some(group) => group.messages.push(summary),
                None => groups.push(TaggedMessageGroup {
                    tag_combination: combination.clone(),
                    messages: vec![summary],
                    tag_id: combination,
                }),
            }
        }

        Ok(groups)
    }

    async fn apply_resolved(&self, message_id: &str, resolved: bool) -> StoreResult<Message> {
        let found = self.repository.set_resolved(message_id, resolved).await?;
        if !found {
            return Err(StoreError::NotFound(format!(
                "Message {} not found",
                message_id
            )));
        }
        self.get_message(message_id).await
    }

    /// Shared like/unlike path with bounded retry on transient conflicts
    async fn apply_like_change(
        &self,
        message_id: &str,
        user_id: &str,
        add: bool,
    ) -> StoreResult<Message> {
        let mut attempts = 0;
        let found = loop {
            let result = if add {
                self.repository.insert_like(message_id, user_id).await
            } else {
                self.repository.remove_like(message_id, user_id).await
            };

            match result {
                Ok(found) => break found,
                Err(StoreError::Conflict(reason)) if attempts < MAX_WRITE_RETRIES => {
                    attempts += 1;
                    tracing::debug!(
                        "Like update contended on message {} (attempt {}): {}",
                        message_id,
                        attempts,
                        reason
                    );
                    tokio::time::sleep(Duration::from_millis(10 * u64::from(attempts))).await;
                }
                Err(StoreError::Conflict(_)) => {
                    return Err(StoreError::Internal(format!(
                        "Could not update likes on message {} after {} attempts",
                        message_id,
                        attempts + 1
                    )));
                }
                Err(err) => return Err(err),
            }
        };

        if !found {
            return Err(StoreError::NotFound(format!(
                "Message {} not found",
                message_id
            )));
        }
        self.get_message(message_id).await
    }
}
