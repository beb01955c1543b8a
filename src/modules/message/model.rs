use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

pub struct InsertMessage {
    pub conversation_id: String,
    pub sender_id: Uuid,
    pub text: String,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct SendMessageBody {
    #[validate(length(min = 1, message = "Message text cannot be empty"))]
    pub text: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MessagesQuery {
    pub limit: Option<i64>,
}
