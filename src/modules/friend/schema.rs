use serde::{Deserialize, Serialize};
use sqlx::prelude::{FromRow, Type};
use uuid::Uuid;

#[derive(Debug, PartialEq, Eq, Clone, Copy, Type, Serialize, Deserialize)]
#[sqlx(type_name = "friend_request_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum RequestStatus {
    Pending,
    Accepted,
    Rejected,
}

/// A friend request is never deleted; once it leaves `pending` it stays as
/// an audit record in its terminal state.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct FriendRequestEntity {
    pub id: Uuid,
    pub from_user_id: Uuid,
    /// Sender's username as it was when the request was created. Not
    /// re-resolved later.
    pub from_username: String,
    pub to_user_id: Uuid,
    pub status: RequestStatus,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

/// One direction of a friendship, stored under the owning user. An accepted
/// request produces exactly two of these, both carrying the same
/// conversation id. The peer snapshot fields are copied at acceptance time
/// and intentionally go stale if the peer later changes their profile.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct FriendEdgeEntity {
    pub user_id: Uuid,
    pub friend_id: Uuid,
    pub friend_username: String,
    pub friend_email: String,
    pub conversation_id: String,
    pub created_at: chrono::DateTime<chrono::Utc>,
}
