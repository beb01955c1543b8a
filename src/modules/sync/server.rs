/// Sync Server Actor
///
/// Server actor chịu trách nhiệm quản lý tất cả WebSocket connections,
/// user sessions, và watch registrations. Khi data thay đổi, nó fan-out
/// snapshot tới tất cả sessions đang watch key tương ứng.
use actix::prelude::*;
use std::collections::{HashMap, HashSet};
use uuid::Uuid;

use super::events::*;
use super::message::ServerMessage;
use super::session::SyncSession;

/// Server-side identity của một subscription. Session subscribe bằng
/// subscriber-relative query; server resolve thành key tuyệt đối để hai
/// users khác nhau với cùng query không bao giờ chia sẻ key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum WatchKey {
    /// Pending requests gửi đến user
    IncomingRequests(Uuid),
    /// Friend edges của user
    FriendEdges(Uuid),
    /// Message log của conversation
    Conversation(String),
}

/// Sync server quản lý tất cả client sessions và watch registrations
pub struct SyncServer {
    /// Map: session_id -> session actor address
    sessions: HashMap<Uuid, Addr<SyncSession>>,

    /// Map: user_id -> set of session_ids
    /// Hỗ trợ multi-device: một user có thể có nhiều sessions
    users: HashMap<Uuid, HashSet<Uuid>>,

    /// Map: watch key -> set of session_ids đang watch
    watches: HashMap<WatchKey, HashSet<Uuid>>,
}

impl SyncServer {
    /// Tạo sync server mới với state rỗng
    pub fn new() -> Self {
        Self { sessions: HashMap::new(), users: HashMap::new(), watches: HashMap::new() }
    }

    /// Gửi message tới một session cụ thể
    fn send_to_session(&self, session_id: &Uuid, message: ServerMessage) {
        if let Some(session_addr) = self.sessions.get(session_id) {
            session_addr.do_send(message);
        }
    }
}

impl Actor for SyncServer {
    type Context = Context<Self>;

    fn started(&mut self, _ctx: &mut Self::Context) {
        tracing::info!("Sync server started");
    }

    fn stopped(&mut self, _ctx: &mut Self::Context) {
        tracing::info!("Sync server stopped");
    }
}

/// Handler: Client mới connected
impl Handler<Connect> for SyncServer {
    type Result = ();

    fn handle(&mut self, msg: Connect, _: &mut Context<Self>) {
        tracing::debug!("New sync session connected: {}", msg.id);

        self.sessions.insert(msg.id, msg.addr);
    }
}

/// Handler: Client disconnected
impl Handler<Disconnect> for SyncServer {
    type Result = ();

    fn handle(&mut self, msg: Disconnect, _: &mut Context<Self>) {
        tracing::debug!("Sync session disconnected: {}", msg.id);

        self.sessions.remove(&msg.id);

        // Xóa session khỏi user map
        let mut user_to_remove: Option<Uuid> = None;
        for (&user_id, sessions) in self.users.iter_mut() {
            if sessions.remove(&msg.id) {
                if sessions.is_empty() {
                    user_to_remove = Some(user_id);
                }
                break;
            }
        }
        if let Some(user_id) = user_to_remove {
            self.users.remove(&user_id);
            tracing::info!("User {} fully disconnected (no more sessions)", user_id);
        }

        // Mọi watch của session cũng chết cùng connection
        for watchers in self.watches.values_mut() {
            watchers.remove(&msg.id);
        }
        self.watches.retain(|_, watchers| !watchers.is_empty());
    }
}

/// Handler: Authenticate user
impl Handler<Authenticate> for SyncServer {
    type Result = Result<Uuid, String>;

    fn handle(&mut self, msg: Authenticate, _: &mut Context<Self>) -> Self::Result {
        tracing::info!("User {} authenticated on session {}", msg.user_id, msg.session_id);

        let sessions = self.users.entry(msg.user_id).or_default();
        sessions.insert(msg.session_id);

        Ok(msg.user_id)
    }
}

/// Handler: Đăng ký watch
impl Handler<Watch> for SyncServer {
    type Result = ();

    fn handle(&mut self, msg: Watch, _: &mut Context<Self>) {
        tracing::debug!("Session {} watching {:?}", msg.session_id, msg.key);

        self.watches.entry(msg.key).or_default().insert(msg.session_id);
    }
}

/// Handler: Hủy watch
impl Handler<Unwatch> for SyncServer {
    type Result = ();

    fn handle(&mut self, msg: Unwatch, _: &mut Context<Self>) {
        if let Some(watchers) = self.watches.get_mut(&msg.key) {
            watchers.remove(&msg.session_id);
            if watchers.is_empty() {
                self.watches.remove(&msg.key);
            }
        }

        tracing::debug!("Session {} stopped watching {:?}", msg.session_id, msg.key);
    }
}

/// Handler: Fan-out snapshot tới tất cả watchers của key
impl Handler<PublishSnapshot> for SyncServer {
    type Result = ();

    fn handle(&mut self, msg: PublishSnapshot, _: &mut Context<Self>) {
        let Some(watchers) = self.watches.get(&msg.key) else {
            tracing::debug!("No watchers for {:?}, snapshot dropped", msg.key);
            return;
        };

        for session_id in watchers {
            self.send_to_session(session_id, msg.message.clone());
        }

        tracing::debug!("Snapshot for {:?} sent to {} session(s)", msg.key, watchers.len());
    }
}

/// Handler: Lấy watchers của một key
impl Handler<GetWatchers> for SyncServer {
    type Result = Vec<Uuid>;

    fn handle(&mut self, msg: GetWatchers, _: &mut Context<Self>) -> Self::Result {
        self.watches.get(&msg.key).map(|w| w.iter().copied().collect()).unwrap_or_default()
    }
}

/// Implement Message trait cho ServerMessage để có thể send tới sessions
impl Message for ServerMessage {
    type Result = ();
}

impl Default for SyncServer {
    fn default() -> Self {
        Self::new()
    }
}
