use actix_web::{get, web, HttpRequest};

use crate::{
    api::{error, success},
    middlewares::get_claims,
    modules::conversation::{
        model::{ResolveQuery, ResolveResponse},
        repository_pg::ConversationRepositoryPg,
        schema::ConversationEntity,
        service::ConversationService,
    },
    utils::ValidatedQuery,
};

pub type ConversationSvc = ConversationService<ConversationRepositoryPg>;

#[get("/resolve")]
pub async fn resolve_conversation(
    conversation_service: web::Data<ConversationSvc>,
    query: ValidatedQuery<ResolveQuery>,
    req: HttpRequest,
) -> Result<success::Success<ResolveResponse>, error::Error> {
    let user_id = get_claims(&req)?.sub;
    let conversation_id = conversation_service.resolve(user_id, query.0.peer_id).await?;

    Ok(success::Success::ok(Some(ResolveResponse { conversation_id }))
        .message("Conversation resolved successfully"))
}

#[get("/{conversation_id}")]
pub async fn get_conversation(
    conversation_service: web::Data<ConversationSvc>,
    conversation_id: web::Path<String>,
) -> Result<success::Success<ConversationEntity>, error::Error> {
    let conversation = conversation_service.get(&conversation_id).await?;
    Ok(success::Success::ok(Some(conversation)).message("Conversation retrieved successfully"))
}
