/// Sync Actor Events
///
/// Module này định nghĩa các messages được trao đổi giữa các actors
/// trong sync system (giữa Session actors và Server actor).
use actix::prelude::*;
use uuid::Uuid;

use super::message::ServerMessage;
use super::server::WatchKey;
use super::session::SyncSession;

/// Event: Client connected đến sync server
#[derive(Message)]
#[rtype(result = "()")]
pub struct Connect {
    /// Unique session ID
    pub id: Uuid,
    /// Address của session actor để có thể gửi messages
    pub addr: Addr<SyncSession>,
}

/// Event: Client disconnected khỏi sync server
#[derive(Message)]
#[rtype(result = "()")]
pub struct Disconnect {
    /// Session ID cần disconnect
    pub id: Uuid,
}

/// Event: User đã xác thực thành công
#[derive(Message)]
#[rtype(result = "Result<Uuid, String>")]
pub struct Authenticate {
    /// Session ID đang authenticate
    pub session_id: Uuid,
    /// User ID sau khi authenticate
    pub user_id: Uuid,
}

/// Event: Session đăng ký theo dõi một watch key
#[derive(Message)]
#[rtype(result = "()")]
pub struct Watch {
    pub session_id: Uuid,
    pub key: WatchKey,
}

/// Event: Session hủy theo dõi một watch key
#[derive(Message)]
#[rtype(result = "()")]
pub struct Unwatch {
    pub session_id: Uuid,
    pub key: WatchKey,
}

/// Event: Data thay đổi, fan-out snapshot tới tất cả watchers của key
#[derive(Message, Clone)]
#[rtype(result = "()")]
pub struct PublishSnapshot {
    pub key: WatchKey,
    pub message: ServerMessage,
}

/// Event: Lấy danh sách session IDs đang watch một key
#[derive(Message)]
#[rtype(result = "Vec<Uuid>")]
pub struct GetWatchers {
    pub key: WatchKey,
}
