use actix_web::{get, post, web, HttpRequest};

use crate::{
    api::{error, success},
    middlewares::get_claims,
    modules::{
        conversation::repository_pg::ConversationRepositoryPg,
        friend::repository_pg::FriendRepositoryPg,
        message::{
            model::{MessagesQuery, SendMessageBody},
            repository_pg::MessageRepositoryPg,
            schema::MessageEntity,
            service::MessageService,
        },
    },
    utils::ValidatedJson,
};

pub type MessageSvc =
    MessageService<MessageRepositoryPg, ConversationRepositoryPg, FriendRepositoryPg>;

#[post("/{conversation_id}/messages")]
pub async fn send_message(
    message_service: web::Data<MessageSvc>,
    conversation_id: web::Path<String>,
    body: ValidatedJson<SendMessageBody>,
    req: HttpRequest,
) -> Result<success::Success<MessageEntity>, error::Error> {
    let sender_id = get_claims(&req)?.sub;
    let message = message_service
        .send_message(sender_id, &conversation_id, body.0.text)
        .await?;

    Ok(success::Success::created(Some(message)).message("Message sent successfully"))
}

#[get("/{conversation_id}/messages")]
pub async fn get_messages(
    message_service: web::Data<MessageSvc>,
    conversation_id: web::Path<String>,
    query: web::Query<MessagesQuery>,
    req: HttpRequest,
) -> Result<success::Success<Vec<MessageEntity>>, error::Error> {
    let user_id = get_claims(&req)?.sub;
    let messages = message_service
        .get_messages(user_id, &conversation_id, query.limit)
        .await?;

    Ok(success::Success::ok(Some(messages)).message("Messages retrieved successfully"))
}
