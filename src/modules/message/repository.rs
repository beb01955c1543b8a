use crate::{
    api::error,
    modules::message::{model::InsertMessage, schema::MessageEntity},
};

#[async_trait::async_trait]
pub trait MessageRepository {
    async fn create(&self, message: &InsertMessage) -> Result<MessageEntity, error::SystemError>;

    /// The `limit` most recent messages of a conversation, returned oldest
    /// first so the caller can render them top to bottom.
    async fn find_recent(
        &self,
        conversation_id: &str,
        limit: i64,
    ) -> Result<Vec<MessageEntity>, error::SystemError>;
}
