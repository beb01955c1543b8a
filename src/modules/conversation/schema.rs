use serde::Serialize;
use sqlx::prelude::FromRow;

/// Conversation metadata. The id is the deterministic sorted-join key of the
/// two participant ids, so either side can derive it without coordination.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct ConversationEntity {
    pub id: String,
    pub last_message: Option<String>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}
