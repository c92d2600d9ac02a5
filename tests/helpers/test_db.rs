#![allow(dead_code)]
use chatstore::database::Database;
use chatstore::models::{CreateMessageRequest, Message, Tag};
use chatstore::services::MessageService;

pub async fn setup_test_db() -> Database {
    // Install drivers for AnyPool (required for tests)
    sqlx::any::install_default_drivers();

    // Use file-based SQLite for tests (unique UUID per test for parallel execution)
    use uuid::Uuid;
    let temp_file = format!("test_{}.db", Uuid::new_v4());
    let db_url = format!("sqlite://{}?mode=rwc", temp_file);

    let db = Database::connect(&db_url)
        .await
        .expect("Failed to connect to test database");

    // Create the schema manually (mirrors migrations/sqlite)
    setup_schema(&db).await;

    db
}

pub async fn setup_test_service() -> MessageService {
    MessageService::new(setup_test_db().await)
}

async fn setup_schema(db: &Database) {
    let pool = db.pool();

    sqlx::query(
        "CREATE TABLE messages (
            id TEXT PRIMARY KEY,
            conversation_id TEXT NOT NULL,
            sender_id TEXT NOT NULL,
            text TEXT NOT NULL,
            resolved INTEGER NOT NULL DEFAULT 0,
            deleted INTEGER NOT NULL DEFAULT 0,
            created TEXT NOT NULL
        )",
    )
    .execute(pool)
    .await
    .expect("Failed to create messages table");

    sqlx::query("CREATE INDEX idx_messages_conversation ON messages(conversation_id, created)")
        .execute(pool)
        .await
        .ok();

    sqlx::query(
        "CREATE TABLE message_likes (
            seq INTEGER PRIMARY KEY AUTOINCREMENT,
            message_id TEXT NOT NULL,
            user_id TEXT NOT NULL,
            liked_at TEXT NOT NULL,
            UNIQUE(message_id, user_id),
            FOREIGN KEY (message_id) REFERENCES messages(id) ON DELETE CASCADE
        )",
    )
    .execute(pool)
    .await
    .expect("Failed to create message_likes table");

    sqlx::query("CREATE INDEX idx_message_likes_message ON message_likes(message_id)")
        .execute(pool)
        .await
        .ok();

    sqlx::query(
        "CREATE TABLE message_tags (
            message_id TEXT NOT NULL,
            position INTEGER NOT NULL,
            tag_id TEXT NOT NULL,
            tag_type TEXT NOT NULL DEFAULT 'subTopic',
            reference_id TEXT NOT NULL,
            PRIMARY KEY (message_id, position),
            FOREIGN KEY (message_id) REFERENCES messages(id) ON DELETE CASCADE
        )",
    )
    .execute(pool)
    .await
    .expect("Failed to create message_tags table");

    sqlx::query("CREATE INDEX idx_message_tags_tag ON message_tags(tag_id)")
        .execute(pool)
        .await
        .ok();
}

/// Create a test message in the given conversation
pub async fn create_test_message(
    service: &MessageService,
    conversation_id: &str,
    sender_id: &str,
    text: &str,
    tags: Vec<Tag>,
) -> Message {
    let tags = if tags.is_empty() { None } else { Some(tags) };
    service
        .create(
            CreateMessageRequest {
                conversation_id: conversation_id.to_string(),
                text: text.to_string(),
                tags,
            },
            sender_id,
        )
        .await
        .expect("Failed to create test message")
}

/// Build a sub-topic tag with the given label
pub fn tag(id: &str) -> Tag {
    Tag::new(id)
}
