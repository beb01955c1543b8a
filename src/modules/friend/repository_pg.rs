use uuid::Uuid;

use crate::{
    api::error,
    modules::{
        conversation::model::conversation_key,
        friend::{
            model::AcceptedFriendship,
            repository::{FriendEdgeRepository, FriendRepo, FriendRequestRepository},
            schema::{FriendEdgeEntity, FriendRequestEntity, RequestStatus},
        },
        user::schema::UserEntity,
    },
};

#[derive(Clone)]
pub struct FriendRepositoryPg {
    pool: sqlx::PgPool,
}

impl FriendRepositoryPg {
    pub fn new(pool: sqlx::PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl FriendEdgeRepository for FriendRepositoryPg {
    async fn find_edge(
        &self,
        user_id: &Uuid,
        friend_id: &Uuid,
    ) -> Result<Option<FriendEdgeEntity>, error::SystemError> {
        let edge = sqlx::query_as::<_, FriendEdgeEntity>(
            "SELECT * FROM friend_edges WHERE user_id = $1 AND friend_id = $2",
        )
        .bind(user_id)
        .bind(friend_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(edge)
    }

    async fn find_edges(
        &self,
        user_id: &Uuid,
    ) -> Result<Vec<FriendEdgeEntity>, error::SystemError> {
        let edges = sqlx::query_as::<_, FriendEdgeEntity>(
            "SELECT * FROM friend_edges WHERE user_id = $1 ORDER BY created_at",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(edges)
    }

    async fn find_edge_for_conversation(
        &self,
        user_id: &Uuid,
        conversation_id: &str,
    ) -> Result<Option<FriendEdgeEntity>, error::SystemError> {
        let edge = sqlx::query_as::<_, FriendEdgeEntity>(
            "SELECT * FROM friend_edges WHERE user_id = $1 AND conversation_id = $2",
        )
        .bind(user_id)
        .bind(conversation_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(edge)
    }
}

#[async_trait::async_trait]
impl FriendRequestRepository for FriendRepositoryPg {
    async fn find_pending_request(
        &self,
        sender_id: &Uuid,
        receiver_id: &Uuid,
    ) -> Result<Option<FriendRequestEntity>, error::SystemError> {
        let request = sqlx::query_as::<_, FriendRequestEntity>(
            r#"
            SELECT *
            FROM friend_requests
            WHERE from_user_id = $1 AND to_user_id = $2 AND status = 'pending'
            "#,
        )
        .bind(sender_id)
        .bind(receiver_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(request)
    }

    async fn find_request_by_id(
        &self,
        request_id: &Uuid,
    ) -> Result<Option<FriendRequestEntity>, error::SystemError> {
        let request =
            sqlx::query_as::<_, FriendRequestEntity>("SELECT * FROM friend_requests WHERE id = $1")
                .bind(request_id)
                .fetch_optional(&self.pool)
                .await?;

        Ok(request)
    }

    async fn find_pending_to_user(
        &self,
        user_id: &Uuid,
    ) -> Result<Vec<FriendRequestEntity>, error::SystemError> {
        let requests = sqlx::query_as::<_, FriendRequestEntity>(
            r#"
            SELECT *
            FROM friend_requests
            WHERE to_user_id = $1 AND status = 'pending'
            ORDER BY created_at
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(requests)
    }

    async fn create_request(
        &self,
        sender: &UserEntity,
        receiver_id: &Uuid,
    ) -> Result<FriendRequestEntity, error::SystemError> {
        // the partial unique index on (from, to) WHERE pending turns a
        // concurrent duplicate into a 23505 conflict
        let request = sqlx::query_as::<_, FriendRequestEntity>(
            r#"
            INSERT INTO friend_requests (id, from_user_id, from_username, to_user_id)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(Uuid::now_v7())
        .bind(sender.id)
        .bind(&sender.username)
        .bind(receiver_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(request)
    }

    async fn mark_rejected(&self, request_id: &Uuid) -> Result<bool, error::SystemError> {
        let rows = sqlx::query(
            "UPDATE friend_requests SET status = 'rejected' WHERE id = $1 AND status = 'pending'",
        )
        .bind(request_id)
        .execute(&self.pool)
        .await?
        .rows_affected();

        Ok(rows > 0)
    }
}

#[async_trait::async_trait]
impl FriendRepo for FriendRepositoryPg {
    async fn accept_request_atomic(
        &self,
        request_id: &Uuid,
        responder_id: &Uuid,
    ) -> Result<AcceptedFriendship, error::SystemError> {
        let mut tx = self.pool.begin().await?;

        let request = sqlx::query_as::<_, FriendRequestEntity>(
            "SELECT * FROM friend_requests WHERE id = $1 FOR UPDATE",
        )
        .bind(request_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| error::SystemError::not_found("Friend request not found"))?;

        if request.to_user_id != *responder_id {
            tx.rollback().await?;
            return Err(error::SystemError::forbidden(
                "You are not allowed to accept this friend request",
            ));
        }

        if request.status != RequestStatus::Pending {
            tx.rollback().await?;
            return Err(error::SystemError::conflict(
                "Friend request already responded to",
            ));
        }

        let request = sqlx::query_as::<_, FriendRequestEntity>(
            "UPDATE friend_requests SET status = 'accepted' WHERE id = $1 RETURNING *",
        )
        .bind(request_id)
        .fetch_one(&mut *tx)
        .await?;

        // a reciprocal pending request is resolved by the same acceptance
        sqlx::query(
            r#"
            UPDATE friend_requests SET status = 'accepted'
            WHERE from_user_id = $1 AND to_user_id = $2 AND status = 'pending'
            "#,
        )
        .bind(request.to_user_id)
        .bind(request.from_user_id)
        .execute(&mut *tx)
        .await?;

        // peer snapshots are taken now, at response time, not from the
        // request-time snapshot
        let from_user =
            sqlx::query_as::<_, UserEntity>("SELECT * FROM users WHERE id = $1")
                .bind(request.from_user_id)
                .fetch_optional(&mut *tx)
                .await?
                .ok_or_else(|| error::SystemError::not_found("Sender profile not found"))?;

        let to_user =
            sqlx::query_as::<_, UserEntity>("SELECT * FROM users WHERE id = $1")
                .bind(request.to_user_id)
                .fetch_optional(&mut *tx)
                .await?
                .ok_or_else(|| error::SystemError::not_found("Recipient profile not found"))?;

        let conversation_id = conversation_key(&request.from_user_id, &request.to_user_id);

        sqlx::query("INSERT INTO conversations (id) VALUES ($1) ON CONFLICT (id) DO NOTHING")
            .bind(&conversation_id)
            .execute(&mut *tx)
            .await?;

        sqlx::query(
            r#"
            INSERT INTO friend_edges
                (user_id, friend_id, friend_username, friend_email, conversation_id)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT DO NOTHING
            "#,
        )
        .bind(from_user.id)
        .bind(to_user.id)
        .bind(&to_user.username)
        .bind(&to_user.email)
        .bind(&conversation_id)
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r#"
            INSERT INTO friend_edges
                (user_id, friend_id, friend_username, friend_email, conversation_id)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT DO NOTHING
            "#,
        )
        .bind(to_user.id)
        .bind(from_user.id)
        .bind(&from_user.username)
        .bind(&from_user.email)
        .bind(&conversation_id)
        .execute(&mut *tx)
        .await?;

        let edge = sqlx::query_as::<_, FriendEdgeEntity>(
            "SELECT * FROM friend_edges WHERE user_id = $1 AND friend_id = $2",
        )
        .bind(to_user.id)
        .bind(from_user.id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(AcceptedFriendship { request, edge })
    }
}
