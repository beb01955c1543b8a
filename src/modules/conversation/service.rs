use std::sync::Arc;
use uuid::Uuid;

use crate::{
    api::error,
    modules::conversation::{
        model::conversation_key, repository::ConversationRepository, schema::ConversationEntity,
    },
};

#[derive(Clone)]
pub struct ConversationService<C>
where
    C: ConversationRepository + Send + Sync,
{
    repo: Arc<C>,
}

impl<C> ConversationService<C>
where
    C: ConversationRepository + Send + Sync,
{
    pub fn with_dependencies(repo: Arc<C>) -> Self {
        ConversationService { repo }
    }

    /// Derives the conversation id for the pair and makes sure its metadata
    /// row exists. Re-resolving always yields the same id and never creates
    /// a second conversation.
    pub async fn resolve(
        &self,
        user_id: Uuid,
        peer_id: Uuid,
    ) -> Result<String, error::SystemError> {
        let id = conversation_key(&user_id, &peer_id);
        self.repo.ensure(&id).await?;
        Ok(id)
    }

    pub async fn get(
        &self,
        conversation_id: &str,
    ) -> Result<ConversationEntity, error::SystemError> {
        self.repo
            .find_by_id(conversation_id)
            .await?
            .ok_or_else(|| error::SystemError::not_found("Conversation not found"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test::MemoryConversationRepo;

    #[tokio::test]
    async fn test_resolve_is_idempotent_and_symmetric() {
        let repo = Arc::new(MemoryConversationRepo::new());
        let svc = ConversationService::with_dependencies(repo.clone());

        let a = Uuid::now_v7();
        let b = Uuid::now_v7();

        let id1 = svc.resolve(a, b).await.unwrap();
        let id2 = svc.resolve(b, a).await.unwrap();
        assert_eq!(id1, id2);

        // existing metadata is left untouched by a later resolve
        repo.touch_last_message(&id1, "hello").await.unwrap();
        svc.resolve(a, b).await.unwrap();
        let conv = svc.get(&id1).await.unwrap();
        assert_eq!(conv.last_message.as_deref(), Some("hello"));
    }

    #[tokio::test]
    async fn test_get_absent_conversation_is_not_found() {
        let repo = Arc::new(MemoryConversationRepo::new());
        let svc = ConversationService::with_dependencies(repo);

        let err = svc.get("missing").await.unwrap_err();
        assert!(matches!(err, error::SystemError::NotFound(_)));
    }
}
