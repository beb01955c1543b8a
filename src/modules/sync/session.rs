/// Sync Session Actor
///
/// Mỗi WebSocket connection có một Session actor riêng.
/// Session actor quản lý state (auth, user_id) và gửi snapshots tới client
/// thông qua mpsc channel được bridge từ handler.rs.
///
/// Async operations (snapshot loads) sử dụng `ctx.spawn()` + `into_actor()`.
use std::sync::Arc;
use std::time::Duration;

use actix::prelude::*;
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::api::error;
use crate::utils::Claims;
use crate::ENV;

use super::events::*;
use super::message::{ClientMessage, ServerMessage, WatchQuery};
use super::server::{SyncServer, WatchKey};
use super::snapshot::SnapshotSource;

/// Số lần thử load initial snapshot trước khi báo SubscriptionLost
const SNAPSHOT_ATTEMPTS: u64 = 3;

/// Base delay giữa các lần thử, nhân với attempt number
const SNAPSHOT_RETRY_BASE_MS: u64 = 100;

/// Resolve subscriber-relative query thành server-side watch key
fn watch_key(user_id: Uuid, query: &WatchQuery) -> WatchKey {
    match query {
        WatchQuery::IncomingRequests => WatchKey::IncomingRequests(user_id),
        WatchQuery::FriendList => WatchKey::FriendEdges(user_id),
        WatchQuery::Conversation { conversation_id } => {
            WatchKey::Conversation(conversation_id.clone())
        }
    }
}

/// Serialize và gửi ServerMessage qua outbound channel
fn send_json(tx: &mpsc::UnboundedSender<String>, msg: &ServerMessage) {
    match serde_json::to_string(msg) {
        Ok(json) => {
            let _ = tx.send(json);
        }
        Err(e) => {
            tracing::error!("Không thể serialize ServerMessage: {}", e);
        }
    }
}

/// Sync session cho một client
pub struct SyncSession {
    /// Unique session ID
    pub id: Uuid,

    /// User ID sau khi authenticate (None nếu chưa auth)
    pub user_id: Option<Uuid>,

    /// Address của sync server actor
    pub server: Addr<SyncServer>,

    /// Channel gửi JSON messages tới client (bridge → handler.rs → WebSocket)
    pub tx: mpsc::UnboundedSender<String>,

    /// Snapshot source để load initial snapshots (None trong test environment)
    pub source: Option<Arc<dyn SnapshotSource>>,
}

impl SyncSession {
    /// Tạo session mới với outbound channel và snapshot source
    pub fn new(
        server: Addr<SyncServer>,
        tx: mpsc::UnboundedSender<String>,
        source: Arc<dyn SnapshotSource>,
    ) -> Self {
        Self { id: Uuid::now_v7(), user_id: None, server, tx, source: Some(source) }
    }

    /// Gửi ServerMessage tới client thông qua channel
    fn send_to_client(&self, msg: &ServerMessage) {
        send_json(&self.tx, msg);
    }

    /// Gửi error message tới client
    fn send_error(&self, message: &str) {
        self.send_to_client(&ServerMessage::Error { message: message.to_string() });
    }

    /// Kiểm tra user đã authenticate chưa, trả về user_id nếu có
    fn require_auth(&self) -> Option<Uuid> {
        if self.user_id.is_none() {
            self.send_error("Bạn cần xác thực trước khi thực hiện thao tác này");
            tracing::warn!("Session {} chưa authenticate, từ chối request", self.id);
        }
        self.user_id
    }

    /// Xử lý message từ client - dispatch tới handler tương ứng
    fn handle_client_message(&mut self, msg: &ClientMessage, ctx: &mut Context<Self>) {
        match msg {
            ClientMessage::Auth { token } => {
                self.handle_auth(token);
            }

            ClientMessage::Subscribe { query } => {
                self.handle_subscribe(query.clone(), ctx);
            }

            ClientMessage::Cancel { query } => {
                self.handle_cancel(query);
            }

            ClientMessage::Ping => {
                self.send_to_client(&ServerMessage::Pong);
            }
        }
    }

    /// Xử lý authentication - verify JWT token và liên kết user với session
    fn handle_auth(&mut self, token: &str) {
        if self.user_id.is_some() {
            self.send_error("Session đã được xác thực");
            return;
        }

        let claims = match Claims::decode(token, ENV.jwt_secret.as_ref()) {
            Ok(claims) => claims,
            Err(e) => {
                tracing::warn!("JWT verification thất bại (session {}): {}", self.id, e);
                self.send_to_client(&ServerMessage::AuthFailed {
                    reason: "Token không hợp lệ hoặc đã hết hạn".to_string(),
                });
                return;
            }
        };

        let user_id = claims.sub;
        self.user_id = Some(user_id);

        self.server.do_send(Authenticate { session_id: self.id, user_id });
        self.send_to_client(&ServerMessage::AuthSuccess { user_id });

        tracing::info!("User {} đã authenticate thành công trên session {}", user_id, self.id);
    }

    /// Xử lý subscribe - đăng ký watch rồi load initial snapshot với retry.
    /// Watch được đăng ký trước khi load để không bỏ lỡ update nào giữa
    /// initial snapshot và live deliveries.
    fn handle_subscribe(&self, query: WatchQuery, ctx: &mut Context<Self>) {
        let Some(user_id) = self.require_auth() else {
            return;
        };

        let Some(source) = self.source.clone() else {
            self.send_error("Snapshot source không khả dụng");
            return;
        };

        let key = watch_key(user_id, &query);
        let server = self.server.clone();
        let tx = self.tx.clone();
        let session_id = self.id;

        server.do_send(Watch { session_id, key: key.clone() });

        ctx.spawn(
            async move {
                for attempt in 1..=SNAPSHOT_ATTEMPTS {
                    match source.load(user_id, &query).await {
                        Ok(snapshot) => {
                            send_json(&tx, &snapshot);
                            tracing::debug!(
                                "Initial snapshot delivered cho session {} ({:?})",
                                session_id,
                                query
                            );
                            return;
                        }

                        // Authorization failure không retry được
                        Err(error::SystemError::Forbidden(msg)) => {
                            server.do_send(Unwatch { session_id, key });
                            send_json(&tx, &ServerMessage::Error { message: msg.into_owned() });
                            return;
                        }

                        Err(e) => {
                            tracing::warn!(
                                "Snapshot load thất bại (session {}, attempt {}/{}): {}",
                                session_id,
                                attempt,
                                SNAPSHOT_ATTEMPTS,
                                e
                            );
                            if attempt < SNAPSHOT_ATTEMPTS {
                                tokio::time::sleep(Duration::from_millis(
                                    SNAPSHOT_RETRY_BASE_MS * attempt,
                                ))
                                .await;
                            }
                        }
                    }
                }

                // Hết attempts, hủy watch và yêu cầu client subscribe lại
                server.do_send(Unwatch { session_id, key });
                send_json(
                    &tx,
                    &ServerMessage::SubscriptionLost {
                        query,
                        reason: "Initial snapshot load failed".to_string(),
                    },
                );
            }
            .into_actor(self),
        );
    }

    /// Xử lý cancel - hủy watch registration
    fn handle_cancel(&self, query: &WatchQuery) {
        let Some(user_id) = self.require_auth() else {
            return;
        };

        self.server.do_send(Unwatch { session_id: self.id, key: watch_key(user_id, query) });
        tracing::debug!("Session {} cancelled {:?}", self.id, query);
    }
}

impl Actor for SyncSession {
    type Context = Context<Self>;

    fn started(&mut self, ctx: &mut Self::Context) {
        tracing::debug!("Sync session started: {}", self.id);

        self.server.do_send(Connect { id: self.id, addr: ctx.address() });
    }

    fn stopped(&mut self, _ctx: &mut Self::Context) {
        tracing::debug!("Sync session stopped: {}", self.id);

        self.server.do_send(Disconnect { id: self.id });
    }
}

/// Implement Message trait cho ClientMessage để có thể send qua actors
impl Message for ClientMessage {
    type Result = ();
}

/// Handler: Nhận ClientMessage từ handler.rs
impl Handler<ClientMessage> for SyncSession {
    type Result = ();

    fn handle(&mut self, msg: ClientMessage, ctx: &mut Context<Self>) {
        self.handle_client_message(&msg, ctx);
    }
}

/// Handler: Nhận ServerMessage từ server actor → serialize → gửi tới client
impl Handler<ServerMessage> for SyncSession {
    type Result = ();

    fn handle(&mut self, msg: ServerMessage, _ctx: &mut Context<Self>) {
        self.send_to_client(&msg);
    }
}
