use crate::{
    api::error,
    modules::conversation::{repository::ConversationRepository, schema::ConversationEntity},
};

#[derive(Clone)]
pub struct ConversationRepositoryPg {
    pool: sqlx::PgPool,
}

impl ConversationRepositoryPg {
    pub fn new(pool: sqlx::PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl ConversationRepository for ConversationRepositoryPg {
    async fn find_by_id(
        &self,
        conversation_id: &str,
    ) -> Result<Option<ConversationEntity>, error::SystemError> {
        let conversation =
            sqlx::query_as::<_, ConversationEntity>("SELECT * FROM conversations WHERE id = $1")
                .bind(conversation_id)
                .fetch_optional(&self.pool)
                .await?;

        Ok(conversation)
    }

    async fn ensure(&self, conversation_id: &str) -> Result<(), error::SystemError> {
        sqlx::query("INSERT INTO conversations (id) VALUES ($1) ON CONFLICT (id) DO NOTHING")
            .bind(conversation_id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn touch_last_message(
        &self,
        conversation_id: &str,
        text: &str,
    ) -> Result<(), error::SystemError> {
        sqlx::query(
            r#"
            INSERT INTO conversations (id, last_message, updated_at)
            VALUES ($1, $2, NOW())
            ON CONFLICT (id) DO UPDATE
            SET last_message = EXCLUDED.last_message,
                updated_at = EXCLUDED.updated_at
            "#,
        )
        .bind(conversation_id)
        .bind(text)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
