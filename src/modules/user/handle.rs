use actix_web::{get, post, web, HttpRequest};
use uuid::Uuid;

use crate::{
    api::{error, success},
    middlewares::get_claims,
    modules::user::{model, service::UserService},
    utils::{ValidatedJson, ValidatedQuery},
};

#[post("/profile")]
pub async fn create_profile(
    user_service: web::Data<UserService>,
    body: ValidatedJson<model::CreateProfileBody>,
    req: HttpRequest,
) -> Result<success::Success<model::UserResponse>, error::Error> {
    let id = get_claims(&req)?.sub;
    let profile =
        user_service.create_profile(id, body.0.email, body.0.username).await?;

    Ok(success::Success::created(Some(profile)).message("Profile created successfully"))
}

#[get("/profile")]
pub async fn get_profile(
    user_service: web::Data<UserService>,
    req: HttpRequest,
) -> Result<success::Success<model::UserResponse>, error::Error> {
    let id = get_claims(&req)?.sub;
    let user = user_service
        .get_profile(id)
        .await?
        .ok_or_else(|| error::Error::not_found("Profile not found"))?;
    Ok(success::Success::ok(Some(user)).message("Profile retrieved successfully"))
}

#[get("/search")]
pub async fn search_users(
    user_service: web::Data<UserService>,
    query: ValidatedQuery<model::SearchQuery>,
    req: HttpRequest,
) -> Result<success::Success<Vec<model::UserResponse>>, error::Error> {
    let caller = get_claims(&req)?.sub;
    let users = user_service.search(&query.0.term, caller).await?;
    Ok(success::Success::ok(Some(users)).message("Search completed successfully"))
}

#[get("/{id:[0-9a-fA-F-]{36}}")]
pub async fn get_user(
    user_service: web::Data<UserService>,
    user_id: web::Path<Uuid>,
) -> Result<success::Success<model::UserResponse>, error::Error> {
    let user = user_service
        .get_profile(user_id.into_inner())
        .await?
        .ok_or_else(|| error::Error::not_found("User not found"))?;
    Ok(success::Success::ok(Some(user)).message("User retrieved successfully"))
}
