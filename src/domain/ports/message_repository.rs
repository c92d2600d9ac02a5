use crate::errors::StoreResult;
use crate::models::{Message, Tag};

/// Persistence seam for message documents. Every mutation is applied
/// atomically against the document identified by id; the `bool` results
/// report whether the target message existed.
#[async_trait::async_trait]
pub trait MessageRepository: Send + Sync {
    async fn insert_message(&self, message: &Message) -> StoreResult<()>;

    async fn get_message_by_id(&self, message_id: &str) -> StoreResult<Option<Message>>;

    async fn list_messages(
        &self,
        conversation_id: &str,
        limit: i64,
    ) -> StoreResult<Vec<Message>>;

    async fn replace_message_tags(&self, message_id: &str, tags: &[Tag]) -> StoreResult<bool>;

    async fn insert_like(&self, message_id: &str, user_id: &str) -> StoreResult<bool>;

    async fn remove_like(&self, message_id: &str, user_id: &str) -> StoreResult<bool>;

    async fn set_resolved(&self, message_id: &str, resolved: bool) -> StoreResult<bool>;

    async fn mark_deleted(&self, message_id: &str, placeholder: &str) -> StoreResult<bool>;

    async fn find_tagged_messages(
        &self,
        conversation_ids: &[String],
        tag_ids: &[String],
        limit: i64,
    ) -> StoreResult<Vec<Message>>;
}
