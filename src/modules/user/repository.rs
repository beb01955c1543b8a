use uuid::Uuid;

use crate::{
    api::error, modules::user::model::InsertProfile, modules::user::schema::UserEntity,
};

#[async_trait::async_trait]
pub trait UserRepository {
    async fn find_by_id(&self, id: &Uuid) -> Result<Option<UserEntity>, error::SystemError>;

    /// Fails with a conflict when the id is already registered.
    async fn create(&self, profile: &InsertProfile) -> Result<UserEntity, error::SystemError>;

    /// Prefix match on the normalized username, excluding one id.
    async fn search_prefix(
        &self,
        term: &str,
        exclude_id: &Uuid,
        limit: i64,
    ) -> Result<Vec<UserEntity>, error::SystemError>;
}
