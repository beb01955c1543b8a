use crate::{api::error, modules::conversation::schema::ConversationEntity};

#[async_trait::async_trait]
pub trait ConversationRepository {
    async fn find_by_id(
        &self,
        conversation_id: &str,
    ) -> Result<Option<ConversationEntity>, error::SystemError>;

    /// Idempotent: initializes empty metadata when absent, leaves existing
    /// metadata untouched.
    async fn ensure(&self, conversation_id: &str) -> Result<(), error::SystemError>;

    /// Upserts the denormalized last-message fields.
    async fn touch_last_message(
        &self,
        conversation_id: &str,
        text: &str,
    ) -> Result<(), error::SystemError>;
}
