use sqlx::Row;
use uuid::Uuid;

use crate::database::Database;
use crate::errors::{StoreError, StoreResult};
use crate::models::{Message, Tag, TagType};

impl Database {
    // Message operations

    /// Insert a message row together with its initial tag list
    pub async fn insert_message(&self, message: &Message) -> StoreResult<()> {
        let mut tx = self.pool().begin().await?;

        sqlx::query(
            "INSERT INTO messages (id, conversation_id, sender_id, text, resolved, deleted, created)
             VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&message.id)
        .bind(&message.conversation_id)
        .bind(&message.sender_id)
        .bind(&message.text)
        .bind(message.resolved)
        .bind(message.deleted)
        .bind(&message.created)
        .execute(&mut *tx)
        .await?;

        insert_tag_rows(&mut tx, &message.id, &message.tags).await?;

        tx.commit().await?;

        tracing::info!(
            "Message created: id={}, conversation_id={}",
            message.id,
            message.conversation_id
        );
        Ok(())
    }

    /// Fetch one message with its likes set and tag list assembled
    pub async fn get_message_by_id(&self, message_id: &str) -> StoreResult<Option<Message>> {
        let row = sqlx::query(
            "SELECT id, conversation_id, sender_id, text, resolved, deleted, created
             FROM messages
             WHERE id = ?",
        )
        .bind(message_id)
        .fetch_optional(self.pool())
        .await?;

        match row {
            Some(row) => Ok(Some(self.assemble_message(row).await?)),
            None => Ok(None),
        }
    }

    /// List a conversation's messages, newest first
    pub async fn list_messages(
        &self,
        conversation_id: &str,
        limit: i64,
    ) -> StoreResult<Vec<Message>> {
        let rows = sqlx::query(
            "SELECT id, conversation_id, sender_id, text, resolved, deleted, created
             FROM messages
             WHERE conversation_id = ?
             ORDER BY created DESC
             LIMIT ?",
        )
        .bind(conversation_id)
        .bind(limit)
        .fetch_all(self.pool())
        .await?;

        let mut messages = Vec::with_capacity(rows.len());
        for row in rows {
            messages.push(self.assemble_message(row).await?);
        }

        Ok(messages)
    }

    /// Replace a message's entire tag list inside one transaction.
    /// Returns false when the message does not exist.
    pub async fn replace_message_tags(
        &self,
        message_id: &str,
        tags: &[Tag],
    ) -> StoreResult<bool> {
        let mut tx = self.pool().begin().await?;

        let exists = sqlx::query("SELECT id FROM messages WHERE id = ?")
            .bind(message_id)
            .fetch_optional(&mut *tx)
            .await?;
        if exists.is_none() {
            return Ok(false);
        }

        sqlx::query("DELETE FROM message_tags WHERE message_id = ?")
            .bind(message_id)
            .execute(&mut *tx)
            .await?;

        insert_tag_rows(&mut tx, message_id, tags).await?;

        tx.commit().await?;

        tracing::info!(
            "Replaced tags on message {}: {} tags",
            message_id,
            tags.len()
        );
        Ok(true)
    }

    /// Add a user to a message's likes set (idempotent, atomic set-add).
    /// Returns false when the message does not exist.
    pub async fn insert_like(&self, message_id: &str, user_id: &str) -> StoreResult<bool> {
        if !self.message_exists(message_id).await? {
            return Ok(false);
        }

        let now = chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Micros, true);

        // INSERT OR IGNORE keeps the set semantics: the unique constraint on
        // (message_id, user_id) makes a repeated like a no-op
        let result = sqlx::query(
            "INSERT OR IGNORE INTO message_likes (message_id, user_id, liked_at)
             VALUES (?, ?, ?)",
        )
        .bind(message_id)
        .bind(user_id)
        .bind(&now)
        .execute(self.pool())
        .await;

        match result {
            Ok(outcome) => {
                if outcome.rows_affected() == 0 {
                    tracing::debug!(
                        "User {} already likes message {} (idempotent)",
                        user_id,
                        message_id
                    );
                } else {
                    tracing::debug!("User {} liked message {}", user_id, message_id);
                }
                Ok(true)
            }
            Err(e) => {
                // Databases without INSERT OR IGNORE report a unique
                // constraint violation instead; treat it as the same no-op
                if e.to_string().contains("UNIQUE") || e.to_string().contains("duplicate") {
                    tracing::debug!(
                        "User {} already likes message {} (idempotent)",
                        user_id,
                        message_id
                    );
                    Ok(true)
                } else {
                    Err(StoreError::from(e))
                }
            }
        }
    }

    /// Remove a user from a message's likes set (idempotent, atomic
    /// set-remove). Returns false when the message does not exist.
    pub async fn remove_like(&self, message_id: &str, user_id: &str) -> StoreResult<bool> {
        if !self.message_exists(message_id).await? {
            return Ok(false);
        }

        sqlx::query("DELETE FROM message_likes WHERE message_id = ? AND user_id = ?")
            .bind(message_id)
            .bind(user_id)
            .execute(self.pool())
            .await?;

        tracing::debug!("User {} unliked message {}", user_id, message_id);
        Ok(true)
    }

    /// Set the resolved flag. Returns false when the message does not exist.
    pub async fn set_resolved(&self, message_id: &str, resolved: bool) -> StoreResult<bool> {
        let result = sqlx::query("UPDATE messages SET resolved = ? WHERE id = ?")
            .bind(resolved)
            .bind(message_id)
            .execute(self.pool())
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Soft-delete: flip the one-way deleted flag and scrub the text in a
    /// single statement. Returns false when the message does not exist.
    pub async fn mark_deleted(&self, message_id: &str, placeholder: &str) -> StoreResult<bool> {
        let result = sqlx::query("UPDATE messages SET deleted = ?, text = ? WHERE id = ?")
            .bind(true)
            .bind(placeholder)
            .bind(message_id)
            .execute(self.pool())
            .await?;

        if result.rows_affected() > 0 {
            tracing::info!("Message soft-deleted: id={}", message_id);
            Ok(true)
        } else {
            Ok(false)
        }
    }

    /// Fetch non-deleted messages in any of the given conversations that
    /// carry at least one of the given tag ids, in creation order, capped
    /// at `limit` messages
    pub async fn find_tagged_messages(
        &self,
        conversation_ids: &[String],
        tag_ids: &[String],
        limit: i64,
    ) -> StoreResult<Vec<Message>> {
        if conversation_ids.is_empty() || tag_ids.is_empty() {
            return Ok(Vec::new());
        }

        let conversation_placeholders = conversation_ids
            .iter()
            .map(|_| "?")
            .collect::<Vec<_>>()
            .join(", ");
        let tag_placeholders = tag_ids.iter().map(|_| "?").collect::<Vec<_>>().join(", ");

        let query = format!(
            "SELECT DISTINCT m.id, m.conversation_id, m.sender_id, m.text, m.resolved, m.deleted, m.created
             FROM messages m
             INNER JOIN message_tags mt ON m.id = mt.message_id
             WHERE m.deleted = ?
             AND m.conversation_id IN ({})
             AND mt.tag_id IN ({})
             ORDER BY m.created
             LIMIT ?",
            conversation_placeholders, tag_placeholders
        );

        let mut query_builder = sqlx::query(&query).bind(false);
        for conversation_id in conversation_ids {
            query_builder = query_builder.bind(conversation_id);
        }
        for tag_id in tag_ids {
            query_builder = query_builder.bind(tag_id);
        }
        query_builder = query_builder.bind(limit);

        let rows = query_builder.fetch_all(self.pool()).await?;

        let mut messages = Vec::with_capacity(rows.len());
        for row in rows {
            messages.push(self.assemble_message(row).await?);
        }

        Ok(messages)
    }

    async fn message_exists(&self, message_id: &str) -> StoreResult<bool> {
        let row = sqlx::query("SELECT id FROM messages WHERE id = ?")
            .bind(message_id)
            .fetch_optional(self.pool())
            .await?;
        Ok(row.is_some())
    }

    async fn assemble_message(&self, row: sqlx::any::AnyRow) -> StoreResult<Message> {
        let id: String = row.try_get("id")?;
        let likes = self.get_message_likes(&id).await?;
        let tags = self.get_message_tags(&id).await?;
        let likes_count = likes.len() as i64;

        Ok(Message {
            id,
            conversation_id: row.try_get("conversation_id")?,
            sender_id: row.try_get("sender_id")?,
            text: row.try_get("text")?,
            tags,
            likes,
            likes_count,
            resolved: row.try_get::<i32, _>("resolved")? != 0,
            deleted: row.try_get::<i32, _>("deleted")? != 0,
            reactions: Vec::new(),
            created: row.try_get("created")?,
        })
    }

    async fn get_message_likes(&self, message_id: &str) -> StoreResult<Vec<String>> {
        let rows = sqlx::query(
            "SELECT user_id FROM message_likes WHERE message_id = ? ORDER BY seq",
        )
        .bind(message_id)
        .fetch_all(self.pool())
        .await?;

        let mut likes = Vec::with_capacity(rows.len());
        for row in rows {
            likes.push(row.try_get("user_id")?);
        }
        Ok(likes)
    }

    async fn get_message_tags(&self, message_id: &str) -> StoreResult<Vec<Tag>> {
        let rows = sqlx::query(
            "SELECT tag_id, tag_type, reference_id
             FROM message_tags
             WHERE message_id = ?
             ORDER BY position",
        )
        .bind(message_id)
        .fetch_all(self.pool())
        .await?;

        let mut tags = Vec::with_capacity(rows.len());
        for row in rows {
            let tag_type_str: String = row.try_get("tag_type")?;
            tags.push(Tag {
                id: row.try_get("tag_id")?,
                tag_type: TagType::from(tag_type_str),
                reference_id: row.try_get("reference_id").ok(),
            });
        }
        Ok(tags)
    }
}

async fn insert_tag_rows(
    tx: &mut sqlx::Transaction<'_, sqlx::Any>,
    message_id: &str,
    tags: &[Tag],
) -> StoreResult<()> {
    for (position, tag) in tags.iter().enumerate() {
        // reference_id is assigned at persist time, never taken from callers
        let reference_id = Uuid::new_v4().to_string();
        sqlx::query(
            "INSERT INTO message_tags (message_id, position, tag_id, tag_type, reference_id)
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(message_id)
        .bind(position as i64)
        .bind(&tag.id)
        .bind(tag.tag_type.as_str())
        .bind(&reference_id)
        .execute(&mut **tx)
        .await?;
    }
    Ok(())
}

// Repository trait implementation
#[async_trait::async_trait]
impl crate::domain::ports::message_repository::MessageRepository for Database {
    async fn insert_message(&self, message: &Message) -> StoreResult<()> {
        self.insert_message(message).await
    }

    async fn get_message_by_id(&self, message_id: &str) -> StoreResult<Option<Message>> {
        self.get_message_by_id(message_id).await
    }

    async fn list_messages(
        &self,
        conversation_id: &str,
        limit: i64,
    ) -> StoreResult<Vec<Message>> {
        self.list_messages(conversation_id, limit).await
    }

    async fn replace_message_tags(&self, message_id: &str, tags: &[Tag]) -> StoreResult<bool> {
        self.replace_message_tags(message_id, tags).await
    }

    async fn insert_like(&self, message_id: &str, user_id: &str) -> StoreResult<bool> {
        self.insert_like(message_id, user_id).await
    }

    async fn remove_like(&self, message_id: &str, user_id: &str) -> StoreResult<bool> {
        self.remove_like(message_id, user_id).await
    }

    async fn set_resolved(&self, message_id: &str, resolved: bool) -> StoreResult<bool> {
        self.set_resolved(message_id, resolved).await
    }

    async fn mark_deleted(&self, message_id: &str, placeholder: &str) -> StoreResult<bool> {
        self.mark_deleted(message_id, placeholder).await
    }

    async fn find_tagged_messages(
        &self,
        conversation_ids: &[String],
        tag_ids: &[String],
        limit: i64,
    ) -> StoreResult<Vec<Message>> {
        self.find_tagged_messages(conversation_ids, tag_ids, limit)
            .await
    }
}
