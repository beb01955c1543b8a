use std::sync::Arc;

use actix::Addr;
use uuid::Uuid;

use crate::{
    api::error,
    modules::{
        conversation::repository::ConversationRepository,
        friend::repository::FriendEdgeRepository,
        message::{model::InsertMessage, repository::MessageRepository, schema::MessageEntity},
        sync::{
            events::PublishSnapshot,
            message::ServerMessage,
            server::{SyncServer, WatchKey},
        },
    },
};

/// Upper bound on a history read; also the size of pushed snapshots.
pub const HISTORY_LIMIT: i64 = 100;

#[derive(Clone)]
pub struct MessageService<M, C, F>
where
    M: MessageRepository + Send + Sync,
    C: ConversationRepository + Send + Sync,
    F: FriendEdgeRepository + Send + Sync,
{
    message_repo: Arc<M>,
    conversation_repo: Arc<C>,
    friend_repo: Arc<F>,
    sync: Option<Addr<SyncServer>>,
}

impl<M, C, F> MessageService<M, C, F>
where
    M: MessageRepository + Send + Sync,
    C: ConversationRepository + Send + Sync,
    F: FriendEdgeRepository + Send + Sync,
{
    pub fn with_dependencies(
        message_repo: Arc<M>,
        conversation_repo: Arc<C>,
        friend_repo: Arc<F>,
        sync: Option<Addr<SyncServer>>,
    ) -> Self {
        MessageService { message_repo, conversation_repo, friend_repo, sync }
    }

    pub async fn send_message(
        &self,
        sender_id: Uuid,
        conversation_id: &str,
        text: String,
    ) -> Result<MessageEntity, error::SystemError> {
        let text = text.trim().to_string();
        if text.is_empty() {
            return Err(error::SystemError::bad_request("Message text cannot be empty"));
        }

        self.authorize(&sender_id, conversation_id).await?;

        let message = self
            .message_repo
            .create(&InsertMessage {
                conversation_id: conversation_id.to_string(),
                sender_id,
                text,
            })
            .await?;

        // denormalized preview; a failure here must not undo the append
        if let Err(e) = self
            .conversation_repo
            .touch_last_message(conversation_id, &message.text)
            .await
        {
            log::warn!("Failed to update last message for {}: {}", conversation_id, e);
        }

        self.publish_messages(conversation_id).await;

        Ok(message)
    }

    pub async fn get_messages(
        &self,
        user_id: Uuid,
        conversation_id: &str,
        limit: Option<i64>,
    ) -> Result<Vec<MessageEntity>, error::SystemError> {
        self.authorize(&user_id, conversation_id).await?;

        let limit = match limit {
            Some(l) if l <= 0 => {
                return Err(error::SystemError::bad_request("Limit must be a positive number"))
            }
            Some(l) => l.min(HISTORY_LIMIT),
            None => HISTORY_LIMIT,
        };
        self.message_repo.find_recent(conversation_id, limit).await
    }

    /// Only users holding a friend edge into the conversation may read or
    /// write it.
    async fn authorize(
        &self,
        user_id: &Uuid,
        conversation_id: &str,
    ) -> Result<(), error::SystemError> {
        self.friend_repo
            .find_edge_for_conversation(user_id, conversation_id)
            .await?
            .map(|_| ())
            .ok_or_else(|| {
                error::SystemError::forbidden("You are not a party to this conversation")
            })
    }

    async fn publish_messages(&self, conversation_id: &str) {
        let Some(sync) = &self.sync else {
            return;
        };
        match self.message_repo.find_recent(conversation_id, HISTORY_LIMIT).await {
            Ok(messages) => sync.do_send(PublishSnapshot {
                key: WatchKey::Conversation(conversation_id.to_string()),
                message: ServerMessage::MessageSnapshot {
                    conversation_id: conversation_id.to_string(),
                    messages,
                },
            }),
            Err(e) => {
                log::warn!("Failed to load message snapshot for {}: {}", conversation_id, e)
            }
        }
    }
}
