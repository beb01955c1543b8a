/// Sync Module
///
/// Module này cung cấp push-based synchronization cho clients thông qua
/// WebSocket protocol. Client subscribe vào các queries (friend requests,
/// friend list, conversation) và nhận full snapshot mỗi khi data thay đổi.
///
/// - Message protocol (ClientMessage & ServerMessage)
/// - Sync Server actor (quản lý connections và watches)
/// - Sync Session actor (xử lý từng connection)
/// - Snapshot source (load snapshot data từ services)
/// - HTTP handler (upgrade HTTP thành WebSocket)
pub mod events;
pub mod handler;
pub mod message;
pub mod server;
pub mod session;
pub mod snapshot;
