use log::info;
use std::sync::Arc;
use uuid::Uuid;

use crate::api::error;
use crate::configs::RedisCache;

use crate::modules::user::model::{InsertProfile, UserResponse};
use crate::modules::user::repository::UserRepository;

const SEARCH_LIMIT: i64 = 50;
const PROFILE_CACHE_TTL: usize = 3600;

#[derive(Clone)]
pub struct UserService {
    repo: Arc<dyn UserRepository + Send + Sync>,
    cache: Option<Arc<RedisCache>>,
}

impl UserService {
    pub fn with_dependencies(
        repo: Arc<dyn UserRepository + Send + Sync>,
        cache: Option<Arc<RedisCache>>,
    ) -> Self {
        info!("UserService initialized with dependencies");
        UserService { repo, cache }
    }

    /// Registers a profile under the authenticated user's id. The id comes
    /// from the session claims, never from the request body.
    pub async fn create_profile(
        &self,
        id: Uuid,
        email: String,
        username: String,
    ) -> Result<UserResponse, error::SystemError> {
        let profile = InsertProfile {
            id,
            email,
            lowercase_username: username.to_lowercase(),
            username,
        };

        // uniqueness is enforced by the primary key; a duplicate id surfaces
        // as a conflict from the insert itself
        let entity = self.repo.create(&profile).await?;
        Ok(UserResponse::from(entity))
    }

    pub async fn get_profile(
        &self,
        id: Uuid,
    ) -> Result<Option<UserResponse>, error::SystemError> {
        if let Some(cache) = &self.cache {
            let key = format!("user:{}", id);
            if let Some(cached_user) = cache.get::<UserResponse>(&key).await? {
                info!("User {} found in cache", id);
                return Ok(Some(cached_user));
            }
        }

        let Some(entity) = self.repo.find_by_id(&id).await? else {
            return Ok(None);
        };

        let response = UserResponse::from(entity);
        if let Some(cache) = &self.cache {
            let key = format!("user:{}", id);
            cache.set(&key, &response, PROFILE_CACHE_TTL).await?;
            info!("User {} cached", id);
        }
        Ok(Some(response))
    }

    /// Prefix search over normalized usernames. An empty term yields an
    /// empty result rather than a full scan.
    pub async fn search(
        &self,
        term: &str,
        exclude_id: Uuid,
    ) -> Result<Vec<UserResponse>, error::SystemError> {
        let term = term.trim().to_lowercase();
        if term.is_empty() {
            return Ok(Vec::new());
        }

        let users = self.repo.search_prefix(&term, &exclude_id, SEARCH_LIMIT).await?;
        Ok(users.into_iter().map(UserResponse::from).collect())
    }
}
