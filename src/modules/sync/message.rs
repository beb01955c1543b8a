/// Sync Message Protocol
///
/// Module này định nghĩa các message types được trao đổi giữa client và server
/// thông qua WebSocket connection. Mọi delivery là full snapshot của result
/// set, không phải incremental diff.
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::modules::friend::schema::{FriendEdgeEntity, FriendRequestEntity};
use crate::modules::message::schema::MessageEntity;

/// Query mà client muốn theo dõi. Luôn relative với user đã authenticate,
/// client không thể chỉ định user khác.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "target", rename_all = "camelCase")]
pub enum WatchQuery {
    /// Pending friend requests gửi đến user
    IncomingRequests,

    /// Danh sách friend edges của user
    FriendList,

    /// Message log của một conversation
    #[serde(rename_all = "camelCase")]
    Conversation { conversation_id: String },
}

/// Messages được gửi từ client đến server
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ClientMessage {
    /// Xác thực WebSocket connection với JWT token
    #[serde(rename_all = "camelCase")]
    Auth { token: String },

    /// Đăng ký nhận snapshots cho một query
    #[serde(rename_all = "camelCase")]
    Subscribe { query: WatchQuery },

    /// Hủy đăng ký một query
    #[serde(rename_all = "camelCase")]
    Cancel { query: WatchQuery },

    /// Ping để giữ connection alive
    Ping,
}

/// Messages được gửi từ server đến client
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ServerMessage {
    /// Xác thực thành công
    #[serde(rename_all = "camelCase")]
    AuthSuccess { user_id: Uuid },

    /// Xác thực thất bại
    #[serde(rename_all = "camelCase")]
    AuthFailed { reason: String },

    /// Full snapshot của pending friend requests
    #[serde(rename_all = "camelCase")]
    RequestSnapshot { requests: Vec<FriendRequestEntity> },

    /// Full snapshot của friend list
    #[serde(rename_all = "camelCase")]
    FriendSnapshot { friends: Vec<FriendEdgeEntity> },

    /// Full snapshot của message window trong conversation
    #[serde(rename_all = "camelCase")]
    MessageSnapshot { conversation_id: String, messages: Vec<MessageEntity> },

    /// Subscription không thể thiết lập, client cần subscribe lại
    #[serde(rename_all = "camelCase")]
    SubscriptionLost { query: WatchQuery, reason: String },

    /// Pong response cho Ping
    Pong,

    /// Lỗi xảy ra
    #[serde(rename_all = "camelCase")]
    Error { message: String },
}
