use uuid::Uuid;

use crate::api::error;
use crate::modules::friend::model::AcceptedFriendship;
use crate::modules::friend::schema::{FriendEdgeEntity, FriendRequestEntity};
use crate::modules::user::schema::UserEntity;

#[async_trait::async_trait]
pub trait FriendEdgeRepository {
    async fn find_edge(
        &self,
        user_id: &Uuid,
        friend_id: &Uuid,
    ) -> Result<Option<FriendEdgeEntity>, error::SystemError>;

    async fn find_edges(
        &self,
        user_id: &Uuid,
    ) -> Result<Vec<FriendEdgeEntity>, error::SystemError>;

    /// The edge a user holds into a conversation, if any. Used as the
    /// party-to-conversation authorization check.
    async fn find_edge_for_conversation(
        &self,
        user_id: &Uuid,
        conversation_id: &str,
    ) -> Result<Option<FriendEdgeEntity>, error::SystemError>;
}

#[async_trait::async_trait]
pub trait FriendRequestRepository {
    /// The pending request for an ordered (sender, receiver) pair, if any.
    async fn find_pending_request(
        &self,
        sender_id: &Uuid,
        receiver_id: &Uuid,
    ) -> Result<Option<FriendRequestEntity>, error::SystemError>;

    async fn find_request_by_id(
        &self,
        request_id: &Uuid,
    ) -> Result<Option<FriendRequestEntity>, error::SystemError>;

    async fn find_pending_to_user(
        &self,
        user_id: &Uuid,
    ) -> Result<Vec<FriendRequestEntity>, error::SystemError>;

    /// Snapshots the sender's username at creation time. Inserting a second
    /// pending request for the same ordered pair conflicts.
    async fn create_request(
        &self,
        sender: &UserEntity,
        receiver_id: &Uuid,
    ) -> Result<FriendRequestEntity, error::SystemError>;

    /// Guarded transition to `rejected`; returns false when the request was
    /// no longer pending.
    async fn mark_rejected(&self, request_id: &Uuid) -> Result<bool, error::SystemError>;
}

#[async_trait::async_trait]
pub trait FriendRepo: FriendEdgeRepository + FriendRequestRepository + Send + Sync {
    /// Accepts a request in a single transaction: checks the responder is
    /// the addressee and the request still pending, marks it accepted
    /// (together with a reciprocal pending request, if one exists), ensures
    /// the conversation row and writes both edges with profile snapshots
    /// taken at response time.
    async fn accept_request_atomic(
        &self,
        request_id: &Uuid,
        responder_id: &Uuid,
    ) -> Result<AcceptedFriendship, error::SystemError>;
}
