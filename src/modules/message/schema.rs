use serde::{Deserialize, Serialize};
use sqlx::prelude::FromRow;
use uuid::Uuid;

/// A single entry of the append-only conversation log. Messages are never
/// edited or deleted once written.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct MessageEntity {
    pub id: Uuid,
    pub conversation_id: String,
    pub sender_id: Uuid,
    pub text: String,
    pub created_at: chrono::DateTime<chrono::Utc>,
}
