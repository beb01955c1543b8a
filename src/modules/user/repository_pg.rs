use uuid::Uuid;

use crate::{
    api::error,
    modules::user::{model::InsertProfile, repository::UserRepository, schema::UserEntity},
};

/// LIKE pattern matching the term literally as a prefix. Backslash must be
/// escaped first, or a trailing backslash in the term escapes the appended
/// wildcard.
fn like_prefix_pattern(term: &str) -> String {
    let escaped = term.replace('\\', "\\\\").replace('%', "\\%").replace('_', "\\_");
    format!("{}%", escaped)
}

#[derive(Clone)]
pub struct UserRepositoryPg {
    pool: sqlx::PgPool,
}

impl UserRepositoryPg {
    pub fn new(pool: sqlx::PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl UserRepository for UserRepositoryPg {
    async fn find_by_id(&self, id: &Uuid) -> Result<Option<UserEntity>, error::SystemError> {
        let user = sqlx::query_as::<_, UserEntity>("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn create(&self, profile: &InsertProfile) -> Result<UserEntity, error::SystemError> {
        let user = sqlx::query_as::<_, UserEntity>(
            r#"
            INSERT INTO users (id, email, username, lowercase_username)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(profile.id)
        .bind(&profile.email)
        .bind(&profile.username)
        .bind(&profile.lowercase_username)
        .fetch_one(&self.pool)
        .await?;
        Ok(user)
    }

    async fn search_prefix(
        &self,
        term: &str,
        exclude_id: &Uuid,
        limit: i64,
    ) -> Result<Vec<UserEntity>, error::SystemError> {
        let pattern = like_prefix_pattern(term);
        let users = sqlx::query_as::<_, UserEntity>(
            r#"
            SELECT * FROM users
            WHERE lowercase_username LIKE $1
              AND id <> $2
            ORDER BY lowercase_username
            LIMIT $3
            "#,
        )
        .bind(&pattern)
        .bind(exclude_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(users)
    }
}
