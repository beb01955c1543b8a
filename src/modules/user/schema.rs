use serde::Serialize;
use sqlx::prelude::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct UserEntity {
    pub id: Uuid,
    pub email: String,
    pub username: String,
    /// Normalized copy used only for prefix search.
    pub lowercase_username: String,
    pub created_at: chrono::DateTime<chrono::Utc>,
}
