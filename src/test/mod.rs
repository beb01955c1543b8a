//! In-memory repository implementations backing the service test suites.
//! They mirror the constraint behavior of the Postgres repositories (primary
//! keys, the pending-pair index, guarded status transitions) over plain maps.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use uuid::Uuid;

use crate::api::error;
use crate::modules::conversation::model::conversation_key;
use crate::modules::conversation::repository::ConversationRepository;
use crate::modules::conversation::schema::ConversationEntity;
use crate::modules::friend::model::AcceptedFriendship;
use crate::modules::friend::repository::{
    FriendEdgeRepository, FriendRepo, FriendRequestRepository,
};
use crate::modules::friend::schema::{FriendEdgeEntity, FriendRequestEntity, RequestStatus};
use crate::modules::message::model::InsertMessage;
use crate::modules::message::repository::MessageRepository;
use crate::modules::message::schema::MessageEntity;
use crate::modules::user::model::InsertProfile;
use crate::modules::user::repository::UserRepository;
use crate::modules::user::schema::UserEntity;

/// Shared backing store. Repos created from the same store see each other's
/// writes, the way the Postgres repos share one database.
#[derive(Clone)]
pub struct TestStore {
    pub users: Arc<Mutex<HashMap<Uuid, UserEntity>>>,
    pub requests: Arc<Mutex<Vec<FriendRequestEntity>>>,
    pub edges: Arc<Mutex<Vec<FriendEdgeEntity>>>,
    pub conversations: Arc<Mutex<HashMap<String, ConversationEntity>>>,
    pub messages: Arc<Mutex<Vec<MessageEntity>>>,
    fail_touch: Arc<AtomicBool>,
}

impl TestStore {
    pub fn new() -> Self {
        Self {
            users: Arc::new(Mutex::new(HashMap::new())),
            requests: Arc::new(Mutex::new(Vec::new())),
            edges: Arc::new(Mutex::new(Vec::new())),
            conversations: Arc::new(Mutex::new(HashMap::new())),
            messages: Arc::new(Mutex::new(Vec::new())),
            fail_touch: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn user_repo(&self) -> Arc<MemoryUserRepo> {
        Arc::new(MemoryUserRepo { users: self.users.clone() })
    }

    pub fn friend_repo(&self) -> Arc<MemoryFriendRepo> {
        Arc::new(MemoryFriendRepo { store: self.clone() })
    }

    pub fn conversation_repo(&self) -> Arc<MemoryConversationRepo> {
        Arc::new(MemoryConversationRepo {
            conversations: self.conversations.clone(),
            fail_touch: self.fail_touch.clone(),
        })
    }

    pub fn message_repo(&self) -> Arc<MemoryMessageRepo> {
        Arc::new(MemoryMessageRepo { messages: self.messages.clone() })
    }

    pub fn add_user(&self, username: &str, email: &str) -> UserEntity {
        let user = UserEntity {
            id: Uuid::now_v7(),
            email: email.to_string(),
            username: username.to_string(),
            lowercase_username: username.to_lowercase(),
            created_at: chrono::Utc::now(),
        };
        self.users.lock().unwrap().insert(user.id, user.clone());
        user
    }

    pub fn rename_user(&self, id: &Uuid, username: &str) {
        let mut users = self.users.lock().unwrap();
        let user = users.get_mut(id).expect("user not in store");
        user.username = username.to_string();
        user.lowercase_username = username.to_lowercase();
    }

    /// Writes an established friendship directly: both edges plus the
    /// conversation row, as an accepted request would have left them.
    pub fn add_friendship(&self, a: &Uuid, b: &Uuid) -> String {
        let conversation_id = conversation_key(a, b);
        let users = self.users.lock().unwrap();
        let user_a = users.get(a).expect("user not in store").clone();
        let user_b = users.get(b).expect("user not in store").clone();
        drop(users);

        let now = chrono::Utc::now();
        let mut edges = self.edges.lock().unwrap();
        edges.push(FriendEdgeEntity {
            user_id: user_a.id,
            friend_id: user_b.id,
            friend_username: user_b.username.clone(),
            friend_email: user_b.email.clone(),
            conversation_id: conversation_id.clone(),
            created_at: now,
        });
        edges.push(FriendEdgeEntity {
            user_id: user_b.id,
            friend_id: user_a.id,
            friend_username: user_a.username.clone(),
            friend_email: user_a.email.clone(),
            conversation_id: conversation_id.clone(),
            created_at: now,
        });

        self.conversations.lock().unwrap().insert(
            conversation_id.clone(),
            ConversationEntity { id: conversation_id.clone(), last_message: None, updated_at: now },
        );

        conversation_id
    }

    /// Makes the next `touch_last_message` calls fail.
    pub fn fail_touch(&self) {
        self.fail_touch.store(true, Ordering::SeqCst);
    }
}

pub struct MemoryUserRepo {
    users: Arc<Mutex<HashMap<Uuid, UserEntity>>>,
}

impl MemoryUserRepo {
    pub fn new() -> Self {
        Self { users: Arc::new(Mutex::new(HashMap::new())) }
    }

    pub fn get(&self, id: &Uuid) -> Option<UserEntity> {
        self.users.lock().unwrap().get(id).cloned()
    }
}

#[async_trait::async_trait]
impl UserRepository for MemoryUserRepo {
    async fn find_by_id(&self, id: &Uuid) -> Result<Option<UserEntity>, error::SystemError> {
        Ok(self.users.lock().unwrap().get(id).cloned())
    }

    async fn create(&self, profile: &InsertProfile) -> Result<UserEntity, error::SystemError> {
        let mut users = self.users.lock().unwrap();
        if users.contains_key(&profile.id) {
            return Err(error::SystemError::conflict("Profile already exists"));
        }

        let user = UserEntity {
            id: profile.id,
            email: profile.email.clone(),
            username: profile.username.clone(),
            lowercase_username: profile.lowercase_username.clone(),
            created_at: chrono::Utc::now(),
        };
        users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn search_prefix(
        &self,
        term: &str,
        exclude_id: &Uuid,
        limit: i64,
    ) -> Result<Vec<UserEntity>, error::SystemError> {
        let users = self.users.lock().unwrap();
        let mut matches: Vec<UserEntity> = users
            .values()
            .filter(|u| u.lowercase_username.starts_with(term) && u.id != *exclude_id)
            .cloned()
            .collect();
        matches.sort_by(|a, b| a.lowercase_username.cmp(&b.lowercase_username));
        matches.truncate(limit as usize);
        Ok(matches)
    }
}

pub struct MemoryFriendRepo {
    store: TestStore,
}

#[async_trait::async_trait]
impl FriendEdgeRepository for MemoryFriendRepo {
    async fn find_edge(
        &self,
        user_id: &Uuid,
        friend_id: &Uuid,
    ) -> Result<Option<FriendEdgeEntity>, error::SystemError> {
        Ok(self
            .store
            .edges
            .lock()
            .unwrap()
            .iter()
            .find(|e| e.user_id == *user_id && e.friend_id == *friend_id)
            .cloned())
    }

    async fn find_edges(
        &self,
        user_id: &Uuid,
    ) -> Result<Vec<FriendEdgeEntity>, error::SystemError> {
        Ok(self
            .store
            .edges
            .lock()
            .unwrap()
            .iter()
            .filter(|e| e.user_id == *user_id)
            .cloned()
            .collect())
    }

    async fn find_edge_for_conversation(
        &self,
        user_id: &Uuid,
        conversation_id: &str,
    ) -> Result<Option<FriendEdgeEntity>, error::SystemError> {
        Ok(self
            .store
            .edges
            .lock()
            .unwrap()
            .iter()
            .find(|e| e.user_id == *user_id && e.conversation_id == conversation_id)
            .cloned())
    }
}

#[async_trait::async_trait]
impl FriendRequestRepository for MemoryFriendRepo {
    async fn find_pending_request(
        &self,
        sender_id: &Uuid,
        receiver_id: &Uuid,
    ) -> Result<Option<FriendRequestEntity>, error::SystemError> {
        Ok(self
            .store
            .requests
            .lock()
            .unwrap()
            .iter()
            .find(|r| {
                r.from_user_id == *sender_id
                    && r.to_user_id == *receiver_id
                    && r.status == RequestStatus::Pending
            })
            .cloned())
    }

    async fn find_request_by_id(
        &self,
        request_id: &Uuid,
    ) -> Result<Option<FriendRequestEntity>, error::SystemError> {
        Ok(self
            .store
            .requests
            .lock()
            .unwrap()
            .iter()
            .find(|r| r.id == *request_id)
            .cloned())
    }

    async fn find_pending_to_user(
        &self,
        user_id: &Uuid,
    ) -> Result<Vec<FriendRequestEntity>, error::SystemError> {
        Ok(self
            .store
            .requests
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.to_user_id == *user_id && r.status == RequestStatus::Pending)
            .cloned()
            .collect())
    }

    async fn create_request(
        &self,
        sender: &UserEntity,
        receiver_id: &Uuid,
    ) -> Result<FriendRequestEntity, error::SystemError> {
        let mut requests = self.store.requests.lock().unwrap();
        // same rule as the partial unique index
        if requests.iter().any(|r| {
            r.from_user_id == sender.id
                && r.to_user_id == *receiver_id
                && r.status == RequestStatus::Pending
        }) {
            return Err(error::SystemError::conflict("Friend request already pending"));
        }

        let request = FriendRequestEntity {
            id: Uuid::now_v7(),
            from_user_id: sender.id,
            from_username: sender.username.clone(),
            to_user_id: *receiver_id,
            status: RequestStatus::Pending,
            created_at: chrono::Utc::now(),
        };
        requests.push(request.clone());
        Ok(request)
    }

    async fn mark_rejected(&self, request_id: &Uuid) -> Result<bool, error::SystemError> {
        let mut requests = self.store.requests.lock().unwrap();
        match requests
            .iter_mut()
            .find(|r| r.id == *request_id && r.status == RequestStatus::Pending)
        {
            Some(request) => {
                request.status = RequestStatus::Rejected;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

#[async_trait::async_trait]
impl FriendRepo for MemoryFriendRepo {
    async fn accept_request_atomic(
        &self,
        request_id: &Uuid,
        responder_id: &Uuid,
    ) -> Result<AcceptedFriendship, error::SystemError> {
        let mut requests = self.store.requests.lock().unwrap();

        let request = requests
            .iter()
            .find(|r| r.id == *request_id)
            .cloned()
            .ok_or_else(|| error::SystemError::not_found("Friend request not found"))?;

        if request.to_user_id != *responder_id {
            return Err(error::SystemError::forbidden(
                "You are not allowed to accept this friend request",
            ));
        }
        if request.status != RequestStatus::Pending {
            return Err(error::SystemError::conflict("Friend request already responded to"));
        }

        let mut accepted_request = request.clone();
        accepted_request.status = RequestStatus::Accepted;
        for r in requests.iter_mut() {
            if r.id == *request_id {
                r.status = RequestStatus::Accepted;
            }
            // reciprocal pending request settles with the same acceptance
            if r.from_user_id == request.to_user_id
                && r.to_user_id == request.from_user_id
                && r.status == RequestStatus::Pending
            {
                r.status = RequestStatus::Accepted;
            }
        }
        drop(requests);

        let users = self.store.users.lock().unwrap();
        let from_user = users
            .get(&request.from_user_id)
            .cloned()
            .ok_or_else(|| error::SystemError::not_found("Sender profile not found"))?;
        let to_user = users
            .get(&request.to_user_id)
            .cloned()
            .ok_or_else(|| error::SystemError::not_found("Recipient profile not found"))?;
        drop(users);

        let conversation_id = conversation_key(&request.from_user_id, &request.to_user_id);
        let now = chrono::Utc::now();

        self.store
            .conversations
            .lock()
            .unwrap()
            .entry(conversation_id.clone())
            .or_insert_with(|| ConversationEntity {
                id: conversation_id.clone(),
                last_message: None,
                updated_at: now,
            });

        let mut edges = self.store.edges.lock().unwrap();
        let mut insert_edge = |owner: &UserEntity, peer: &UserEntity| {
            if !edges.iter().any(|e| e.user_id == owner.id && e.friend_id == peer.id) {
                edges.push(FriendEdgeEntity {
                    user_id: owner.id,
                    friend_id: peer.id,
                    friend_username: peer.username.clone(),
                    friend_email: peer.email.clone(),
                    conversation_id: conversation_id.clone(),
                    created_at: now,
                });
            }
        };
        insert_edge(&from_user, &to_user);
        insert_edge(&to_user, &from_user);

        let edge = edges
            .iter()
            .find(|e| e.user_id == to_user.id && e.friend_id == from_user.id)
            .cloned()
            .expect("responder edge just inserted");

        Ok(AcceptedFriendship { request: accepted_request, edge })
    }
}

pub struct MemoryConversationRepo {
    conversations: Arc<Mutex<HashMap<String, ConversationEntity>>>,
    fail_touch: Arc<AtomicBool>,
}

impl MemoryConversationRepo {
    pub fn new() -> Self {
        Self {
            conversations: Arc::new(Mutex::new(HashMap::new())),
            fail_touch: Arc::new(AtomicBool::new(false)),
        }
    }
}

#[async_trait::async_trait]
impl ConversationRepository for MemoryConversationRepo {
    async fn find_by_id(
        &self,
        conversation_id: &str,
    ) -> Result<Option<ConversationEntity>, error::SystemError> {
        Ok(self.conversations.lock().unwrap().get(conversation_id).cloned())
    }

    async fn ensure(&self, conversation_id: &str) -> Result<(), error::SystemError> {
        self.conversations
            .lock()
            .unwrap()
            .entry(conversation_id.to_string())
            .or_insert_with(|| ConversationEntity {
                id: conversation_id.to_string(),
                last_message: None,
                updated_at: chrono::Utc::now(),
            });
        Ok(())
    }

    async fn touch_last_message(
        &self,
        conversation_id: &str,
        text: &str,
    ) -> Result<(), error::SystemError> {
        if self.fail_touch.load(Ordering::SeqCst) {
            return Err(error::SystemError::DatabaseError("injected failure".into()));
        }

        let mut conversations = self.conversations.lock().unwrap();
        let now = chrono::Utc::now();
        conversations
            .entry(conversation_id.to_string())
            .and_modify(|c| {
                c.last_message = Some(text.to_string());
                c.updated_at = now;
            })
            .or_insert_with(|| ConversationEntity {
                id: conversation_id.to_string(),
                last_message: Some(text.to_string()),
                updated_at: now,
            });
        Ok(())
    }
}

pub struct MemoryMessageRepo {
    messages: Arc<Mutex<Vec<MessageEntity>>>,
}

#[async_trait::async_trait]
impl MessageRepository for MemoryMessageRepo {
    async fn create(&self, message: &InsertMessage) -> Result<MessageEntity, error::SystemError> {
        let entity = MessageEntity {
            id: Uuid::now_v7(),
            conversation_id: message.conversation_id.clone(),
            sender_id: message.sender_id,
            text: message.text.clone(),
            created_at: chrono::Utc::now(),
        };
        self.messages.lock().unwrap().push(entity.clone());
        Ok(entity)
    }

    async fn find_recent(
        &self,
        conversation_id: &str,
        limit: i64,
    ) -> Result<Vec<MessageEntity>, error::SystemError> {
        let messages = self.messages.lock().unwrap();
        let in_conversation: Vec<MessageEntity> = messages
            .iter()
            .filter(|m| m.conversation_id == conversation_id)
            .cloned()
            .collect();

        let skip = in_conversation.len().saturating_sub(limit as usize);
        Ok(in_conversation.into_iter().skip(skip).collect())
    }
}
