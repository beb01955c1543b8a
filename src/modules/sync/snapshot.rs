/// Snapshot Source
///
/// Session actors load initial snapshots thông qua trait này thay vì gọi
/// services trực tiếp, nhờ đó session có thể được test với stub source.
use uuid::Uuid;

use crate::api::error;
use crate::modules::friend::handle::FriendSvc;
use crate::modules::message::handle::MessageSvc;

use super::message::{ServerMessage, WatchQuery};

#[async_trait::async_trait]
pub trait SnapshotSource: Send + Sync {
    /// Load full snapshot cho một query, relative với user đã authenticate.
    /// Trả về Forbidden khi user không được phép xem query đó.
    async fn load(
        &self,
        user_id: Uuid,
        query: &WatchQuery,
    ) -> Result<ServerMessage, error::SystemError>;
}

/// Snapshot source thật, backed bởi friend và message services. Authorization
/// (user phải là party của conversation) do chính services kiểm tra.
pub struct SnapshotLoader {
    friend_service: FriendSvc,
    message_service: MessageSvc,
}

impl SnapshotLoader {
    pub fn new(friend_service: FriendSvc, message_service: MessageSvc) -> Self {
        Self { friend_service, message_service }
    }
}

#[async_trait::async_trait]
impl SnapshotSource for SnapshotLoader {
    async fn load(
        &self,
        user_id: Uuid,
        query: &WatchQuery,
    ) -> Result<ServerMessage, error::SystemError> {
        match query {
            WatchQuery::IncomingRequests => {
                let requests = self.friend_service.get_incoming_requests(user_id).await?;
                Ok(ServerMessage::RequestSnapshot { requests })
            }

            WatchQuery::FriendList => {
                let friends = self.friend_service.get_edges(user_id).await?;
                Ok(ServerMessage::FriendSnapshot { friends })
            }

            WatchQuery::Conversation { conversation_id } => {
                let messages = self
                    .message_service
                    .get_messages(user_id, conversation_id, None)
                    .await?;
                Ok(ServerMessage::MessageSnapshot {
                    conversation_id: conversation_id.clone(),
                    messages,
                })
            }
        }
    }
}
