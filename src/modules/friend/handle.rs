use actix_web::{get, post, web, HttpRequest};
use uuid::Uuid;

use crate::{
    api::{error, success},
    middlewares::get_claims,
    modules::{
        friend::{
            model::FriendRequestBody,
            repository_pg::FriendRepositoryPg,
            schema::{FriendEdgeEntity, FriendRequestEntity},
            service::FriendService,
        },
        user::repository_pg::UserRepositoryPg,
    },
    utils::ValidatedJson,
};

pub type FriendSvc = FriendService<FriendRepositoryPg, UserRepositoryPg>;

#[get("")]
pub async fn get_friends(
    friend_service: web::Data<FriendSvc>,
    req: HttpRequest,
) -> Result<success::Success<Vec<FriendEdgeEntity>>, error::Error> {
    let user_id = get_claims(&req)?.sub;
    let friends = friend_service.get_edges(user_id).await?;
    Ok(success::Success::ok(Some(friends)).message("Friends retrieved successfully"))
}

#[get("/requests")]
pub async fn get_incoming_requests(
    friend_service: web::Data<FriendSvc>,
    req: HttpRequest,
) -> Result<success::Success<Vec<FriendRequestEntity>>, error::Error> {
    let user_id = get_claims(&req)?.sub;
    let requests = friend_service.get_incoming_requests(user_id).await?;
    Ok(success::Success::ok(Some(requests)).message("Friend requests retrieved successfully"))
}

#[post("/requests")]
pub async fn send_request(
    friend_service: web::Data<FriendSvc>,
    body: ValidatedJson<FriendRequestBody>,
    req: HttpRequest,
) -> Result<success::Success<FriendRequestEntity>, error::Error> {
    let sender_id = get_claims(&req)?.sub;
    let request = friend_service.send_request(sender_id, body.0.recipient_id).await?;

    Ok(success::Success::created(Some(request)).message("Friend request sent successfully"))
}

#[post("/requests/{id}/accept")]
pub async fn accept_request(
    friend_service: web::Data<FriendSvc>,
    request_id: web::Path<Uuid>,
    req: HttpRequest,
) -> Result<success::Success<FriendEdgeEntity>, error::Error> {
    let responder_id = get_claims(&req)?.sub;
    let edge = friend_service
        .accept_request(responder_id, request_id.into_inner())
        .await?;

    Ok(success::Success::ok(Some(edge)).message("Friend request accepted successfully"))
}

#[post("/requests/{id}/decline")]
pub async fn decline_request(
    friend_service: web::Data<FriendSvc>,
    request_id: web::Path<Uuid>,
    req: HttpRequest,
) -> Result<success::Success<()>, error::Error> {
    let responder_id = get_claims(&req)?.sub;
    friend_service
        .decline_request(responder_id, request_id.into_inner())
        .await?;

    Ok(success::Success::ok(None).message("Friend request declined successfully"))
}
