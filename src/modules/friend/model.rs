use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use crate::modules::friend::schema::{FriendEdgeEntity, FriendRequestEntity};

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct FriendRequestBody {
    pub recipient_id: Uuid,
}

/// Result of an accepted request: the terminal request row plus the edge
/// written under the responder.
#[derive(Debug, Clone)]
pub struct AcceptedFriendship {
    pub request: FriendRequestEntity,
    pub edge: FriendEdgeEntity,
}
