use std::sync::Arc;

use actix::Addr;
use uuid::Uuid;

use crate::{
    api::error,
    modules::{
        friend::{
            repository::FriendRepo,
            schema::{FriendEdgeEntity, FriendRequestEntity, RequestStatus},
        },
        sync::{
            events::PublishSnapshot,
            message::ServerMessage,
            server::{SyncServer, WatchKey},
        },
        user::repository::UserRepository,
    },
};

#[derive(Clone)]
pub struct FriendService<R, U>
where
    R: FriendRepo + Send + Sync,
    U: UserRepository + Send + Sync,
{
    friend_repo: Arc<R>,
    user_repo: Arc<U>,
    /// Sync engine address; None when running without the push layer
    /// (tests).
    sync: Option<Addr<SyncServer>>,
}

impl<R, U> FriendService<R, U>
where
    R: FriendRepo + Send + Sync,
    U: UserRepository + Send + Sync,
{
    pub fn with_dependencies(
        friend_repo: Arc<R>,
        user_repo: Arc<U>,
        sync: Option<Addr<SyncServer>>,
    ) -> Self {
        FriendService { friend_repo, user_repo, sync }
    }

    pub async fn get_edges(
        &self,
        user_id: Uuid,
    ) -> Result<Vec<FriendEdgeEntity>, error::SystemError> {
        self.friend_repo.find_edges(&user_id).await
    }

    pub async fn get_incoming_requests(
        &self,
        user_id: Uuid,
    ) -> Result<Vec<FriendRequestEntity>, error::SystemError> {
        self.friend_repo.find_pending_to_user(&user_id).await
    }

    pub async fn send_request(
        &self,
        sender_id: Uuid,
        recipient_id: Uuid,
    ) -> Result<FriendRequestEntity, error::SystemError> {
        if recipient_id == sender_id {
            return Err(error::SystemError::bad_request(
                "Cannot send a friend request to yourself",
            ));
        }

        let sender = self
            .user_repo
            .find_by_id(&sender_id)
            .await?
            .ok_or_else(|| error::SystemError::not_found("Sender profile not found"))?;

        if self.user_repo.find_by_id(&recipient_id).await?.is_none() {
            return Err(error::SystemError::not_found("Recipient user not found"));
        }

        if self.friend_repo.find_edge(&sender_id, &recipient_id).await?.is_some() {
            return Err(error::SystemError::conflict("Users are already friends"));
        }

        // only the same ordered pair is blocked; a reciprocal pending
        // request from the recipient is allowed to coexist
        if self
            .friend_repo
            .find_pending_request(&sender_id, &recipient_id)
            .await?
            .is_some()
        {
            return Err(error::SystemError::conflict("Friend request already pending"));
        }

        let request = self.friend_repo.create_request(&sender, &recipient_id).await?;

        self.publish_pending(recipient_id).await;

        Ok(request)
    }

    pub async fn accept_request(
        &self,
        responder_id: Uuid,
        request_id: Uuid,
    ) -> Result<FriendEdgeEntity, error::SystemError> {
        let accepted =
            self.friend_repo.accept_request_atomic(&request_id, &responder_id).await?;

        // both parties' pending sets may have changed: the acceptance itself
        // on the responder's side, and a reciprocal request settled by the
        // same transaction on the sender's side
        self.publish_pending(accepted.request.to_user_id).await;
        self.publish_pending(accepted.request.from_user_id).await;
        self.publish_edges(accepted.request.from_user_id).await;
        self.publish_edges(accepted.request.to_user_id).await;

        Ok(accepted.edge)
    }

    pub async fn decline_request(
        &self,
        responder_id: Uuid,
        request_id: Uuid,
    ) -> Result<(), error::SystemError> {
        let request = self
            .friend_repo
            .find_request_by_id(&request_id)
            .await?
            .ok_or_else(|| error::SystemError::not_found("Friend request not found"))?;

        if request.to_user_id != responder_id {
            return Err(error::SystemError::forbidden(
                "You are not allowed to decline this friend request",
            ));
        }

        if request.status != RequestStatus::Pending {
            return Err(error::SystemError::conflict("Friend request already responded to"));
        }

        if !self.friend_repo.mark_rejected(&request_id).await? {
            // lost the race against a concurrent respond
            return Err(error::SystemError::conflict("Friend request already responded to"));
        }

        self.publish_pending(responder_id).await;

        Ok(())
    }

    fn publish(&self, key: WatchKey, message: ServerMessage) {
        if let Some(sync) = &self.sync {
            sync.do_send(PublishSnapshot { key, message });
        }
    }

    /// Snapshot deliveries are best-effort from the mutating call's point of
    /// view; a failed snapshot load is logged, never surfaced to the caller.
    async fn publish_pending(&self, user_id: Uuid) {
        if self.sync.is_none() {
            return;
        }
        match self.friend_repo.find_pending_to_user(&user_id).await {
            Ok(requests) => self.publish(
                WatchKey::IncomingRequests(user_id),
                ServerMessage::RequestSnapshot { requests },
            ),
            Err(e) => log::warn!("Failed to load request snapshot for {}: {}", user_id, e),
        }
    }

    async fn publish_edges(&self, user_id: Uuid) {
        if self.sync.is_none() {
            return;
        }
        match self.friend_repo.find_edges(&user_id).await {
            Ok(friends) => self.publish(
                WatchKey::FriendEdges(user_id),
                ServerMessage::FriendSnapshot { friends },
            ),
            Err(e) => log::warn!("Failed to load friend snapshot for {}: {}", user_id, e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix::Actor;
    use std::time::Duration;
    use tokio::sync::mpsc;

    use crate::modules::conversation::model::conversation_key;
    use crate::modules::sync::{
        events::{Authenticate, Watch},
        session::SyncSession,
    };
    use crate::test::TestStore;

    type Svc = FriendService<crate::test::MemoryFriendRepo, crate::test::MemoryUserRepo>;

    fn service(store: &TestStore) -> Svc {
        FriendService::with_dependencies(store.friend_repo(), store.user_repo(), None)
    }

    async fn settle() {
        tokio::time::sleep(Duration::from_millis(20)).await;
    }

    #[tokio::test]
    async fn test_send_request_to_self_is_rejected() {
        let store = TestStore::new();
        let alice = store.add_user("alice", "alice@example.com");
        let svc = service(&store);

        let err = svc.send_request(alice.id, alice.id).await.unwrap_err();
        assert!(matches!(err, error::SystemError::BadRequest(_)));
    }

    #[tokio::test]
    async fn test_send_request_to_unknown_recipient_is_not_found() {
        let store = TestStore::new();
        let alice = store.add_user("alice", "alice@example.com");
        let svc = service(&store);

        let err = svc.send_request(alice.id, Uuid::now_v7()).await.unwrap_err();
        assert!(matches!(err, error::SystemError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_duplicate_pending_request_conflicts() {
        let store = TestStore::new();
        let alice = store.add_user("alice", "alice@example.com");
        let bob = store.add_user("bob", "bob@example.com");
        let svc = service(&store);

        svc.send_request(alice.id, bob.id).await.unwrap();
        let err = svc.send_request(alice.id, bob.id).await.unwrap_err();
        assert!(matches!(err, error::SystemError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_mutual_pending_requests_are_allowed() {
        let store = TestStore::new();
        let alice = store.add_user("alice", "alice@example.com");
        let bob = store.add_user("bob", "bob@example.com");
        let svc = service(&store);

        svc.send_request(alice.id, bob.id).await.unwrap();
        // the reverse ordered pair is a different pair; not a duplicate
        svc.send_request(bob.id, alice.id).await.unwrap();

        assert_eq!(svc.get_incoming_requests(bob.id).await.unwrap().len(), 1);
        assert_eq!(svc.get_incoming_requests(alice.id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_accept_creates_symmetric_edges_with_shared_conversation() {
        let store = TestStore::new();
        let alice = store.add_user("alice", "alice@example.com");
        let bob = store.add_user("bob", "bob@example.com");
        let svc = service(&store);

        let request = svc.send_request(alice.id, bob.id).await.unwrap();
        assert_eq!(request.from_username, "alice");

        let edge = svc.accept_request(bob.id, request.id).await.unwrap();
        assert_eq!(edge.user_id, bob.id);
        assert_eq!(edge.friend_id, alice.id);

        let expected = conversation_key(&alice.id, &bob.id);
        assert_eq!(edge.conversation_id, expected);

        let alice_edges = svc.get_edges(alice.id).await.unwrap();
        let bob_edges = svc.get_edges(bob.id).await.unwrap();
        assert_eq!(alice_edges.len(), 1);
        assert_eq!(bob_edges.len(), 1);
        assert_eq!(alice_edges[0].conversation_id, expected);
        assert_eq!(bob_edges[0].conversation_id, expected);
        assert_eq!(alice_edges[0].friend_username, "bob");

        // conversation metadata row was initialized exactly once
        assert!(store.conversations.lock().unwrap().contains_key(&expected));

        // the accepted request stays around as an audit record
        let kept = store.requests.lock().unwrap()[0].clone();
        assert_eq!(kept.status, RequestStatus::Accepted);
    }

    #[tokio::test]
    async fn test_accept_by_non_addressee_is_forbidden() {
        let store = TestStore::new();
        let alice = store.add_user("alice", "alice@example.com");
        let bob = store.add_user("bob", "bob@example.com");
        let eve = store.add_user("eve", "eve@example.com");
        let svc = service(&store);

        let request = svc.send_request(alice.id, bob.id).await.unwrap();
        let err = svc.accept_request(eve.id, request.id).await.unwrap_err();
        assert!(matches!(err, error::SystemError::Forbidden(_)));
    }

    #[tokio::test]
    async fn test_responding_twice_is_rejected_without_new_edges() {
        let store = TestStore::new();
        let alice = store.add_user("alice", "alice@example.com");
        let bob = store.add_user("bob", "bob@example.com");
        let svc = service(&store);

        let request = svc.send_request(alice.id, bob.id).await.unwrap();
        svc.accept_request(bob.id, request.id).await.unwrap();

        let err = svc.accept_request(bob.id, request.id).await.unwrap_err();
        assert!(matches!(err, error::SystemError::Conflict(_)));
        assert_eq!(store.edges.lock().unwrap().len(), 2);

        let err = svc.decline_request(bob.id, request.id).await.unwrap_err();
        assert!(matches!(err, error::SystemError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_reject_then_resend_succeeds() {
        let store = TestStore::new();
        let alice = store.add_user("alice", "alice@example.com");
        let bob = store.add_user("bob", "bob@example.com");
        let svc = service(&store);

        let request = svc.send_request(alice.id, bob.id).await.unwrap();
        svc.decline_request(bob.id, request.id).await.unwrap();

        assert!(svc.get_incoming_requests(bob.id).await.unwrap().is_empty());
        assert!(store.edges.lock().unwrap().is_empty());

        // a fresh request for the same pair is allowed again
        svc.send_request(alice.id, bob.id).await.unwrap();
    }

    #[tokio::test]
    async fn test_accept_resolves_reciprocal_pending_request() {
        let store = TestStore::new();
        let alice = store.add_user("alice", "alice@example.com");
        let bob = store.add_user("bob", "bob@example.com");
        let svc = service(&store);

        let forward = svc.send_request(alice.id, bob.id).await.unwrap();
        let reverse = svc.send_request(bob.id, alice.id).await.unwrap();

        svc.accept_request(bob.id, forward.id).await.unwrap();

        // the reverse request was settled by the same acceptance
        assert!(svc.get_incoming_requests(alice.id).await.unwrap().is_empty());
        let err = svc.accept_request(alice.id, reverse.id).await.unwrap_err();
        assert!(matches!(err, error::SystemError::Conflict(_)));
        assert_eq!(store.edges.lock().unwrap().len(), 2);
    }

    #[actix_web::test]
    async fn test_accept_notifies_reciprocal_sender_watch() {
        let store = TestStore::new();
        let alice = store.add_user("alice", "alice@example.com");
        let bob = store.add_user("bob", "bob@example.com");

        let server = SyncServer::new().start();
        let svc = FriendService::with_dependencies(
            store.friend_repo(),
            store.user_repo(),
            Some(server.clone()),
        );

        let (tx, mut rx) = mpsc::unbounded_channel();
        let session = SyncSession {
            id: Uuid::now_v7(),
            user_id: Some(alice.id),
            server: server.clone(),
            tx,
            source: None,
        };
        let session_id = session.id;
        let _addr = session.start();
        settle().await;

        server
            .send(Authenticate { session_id, user_id: alice.id })
            .await
            .unwrap()
            .unwrap();
        server
            .send(Watch { session_id, key: WatchKey::IncomingRequests(alice.id) })
            .await
            .unwrap();

        let forward = svc.send_request(alice.id, bob.id).await.unwrap();
        let reverse = svc.send_request(bob.id, alice.id).await.unwrap();
        settle().await;

        let delivered = rx.try_recv().unwrap();
        assert!(delivered.contains("\"type\":\"requestSnapshot\""));
        assert!(delivered.contains(&reverse.id.to_string()));

        // bob accepts the forward request; the reverse one is settled by the
        // same transaction, so alice's incoming-requests watch must see it go
        svc.accept_request(bob.id, forward.id).await.unwrap();
        settle().await;

        let delivered = rx.try_recv().unwrap();
        assert!(delivered.contains("\"type\":\"requestSnapshot\""));
        assert!(delivered.contains("\"requests\":[]"));
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_edge_snapshot_is_taken_at_response_time() {
        let store = TestStore::new();
        let alice = store.add_user("alice", "alice@example.com");
        let bob = store.add_user("bob", "bob@example.com");
        let svc = service(&store);

        let request = svc.send_request(alice.id, bob.id).await.unwrap();

        // sender renames between request and response
        store.rename_user(&alice.id, "alice_renamed");

        let edge = svc.accept_request(bob.id, request.id).await.unwrap();
        assert_eq!(edge.friend_username, "alice_renamed");

        // while the request keeps its creation-time snapshot
        let kept = store.requests.lock().unwrap()[0].clone();
        assert_eq!(kept.from_username, "alice");
    }

    #[tokio::test]
    async fn test_request_to_existing_friend_conflicts() {
        let store = TestStore::new();
        let alice = store.add_user("alice", "alice@example.com");
        let bob = store.add_user("bob", "bob@example.com");
        let svc = service(&store);

        let request = svc.send_request(alice.id, bob.id).await.unwrap();
        svc.accept_request(bob.id, request.id).await.unwrap();

        let err = svc.send_request(alice.id, bob.id).await.unwrap_err();
        assert!(matches!(err, error::SystemError::Conflict(_)));
    }
}
