//! Realtime engine facade.
//!
//! Owns the connection pool, room registry, and the three operation
//! components, and dispatches decoded client events. The WebSocket
//! transport itself lives in the API crate; this facade is
//! transport-agnostic so the whole engine runs in tests without a
//! socket.

use std::sync::Arc;

use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use tracing::{debug, error};

use campushub_auth::JwtDecoder;
use campushub_cache::provider::CacheManager;
use campushub_core::config::{PresenceConfig, RealtimeConfig};
use campushub_core::error::AppError;
use campushub_core::types::ConnectionId;
use campushub_database::store::{ConversationStore, MessageStore, UserDirectory};

use crate::connection::{ConnectionHandle, ConnectionPool};
use crate::event::{ClientEvent, ServerEvent};
use crate::message::FanoutEngine;
use crate::presence::{PresenceStore, PresenceSweeper};
use crate::room::RoomRegistry;
use crate::session::SessionManager;
use crate::typing::TypingBroadcaster;

/// The assembled realtime core.
pub struct RealtimeEngine {
    pool: Arc<ConnectionPool>,
    rooms: Arc<RoomRegistry>,
    presence: PresenceStore,
    sessions: SessionManager,
    fanout: FanoutEngine,
    typing: TypingBroadcaster,
    users: Arc<dyn UserDirectory>,
    config: RealtimeConfig,
    shutdown: broadcast::Sender<()>,
}

impl RealtimeEngine {
    /// Wires up the engine from its collaborators.
    pub fn new(
        cache: Arc<CacheManager>,
        presence_config: PresenceConfig,
        realtime_config: RealtimeConfig,
        decoder: JwtDecoder,
        users: Arc<dyn UserDirectory>,
        conversations: Arc<dyn ConversationStore>,
        messages: Arc<dyn MessageStore>,
    ) -> Self {
        let pool = Arc::new(ConnectionPool::new());
        let rooms = Arc::new(RoomRegistry::new());
        let presence = PresenceStore::new(cache, presence_config);
        let (shutdown, _) = broadcast::channel(1);

        let sessions = SessionManager::new(
            pool.clone(),
            rooms.clone(),
            presence.clone(),
            decoder,
            users.clone(),
            conversations.clone(),
            messages.clone(),
            realtime_config.clone(),
        );
        let fanout = FanoutEngine::new(
            pool.clone(),
            rooms.clone(),
            presence.clone(),
            conversations,
            messages,
            realtime_config.clone(),
        );
        let typing = TypingBroadcaster::new(pool.clone(), rooms.clone(), presence.clone());

        Self {
            pool,
            rooms,
            presence,
            sessions,
            fanout,
            typing,
            users,
            config: realtime_config,
            shutdown,
        }
    }

    /// Registers a freshly accepted transport connection.
    ///
    /// Returns the handle and the receiving end of its outbound queue;
    /// the transport layer forwards received events onto the socket.
    pub fn register_connection(&self) -> (Arc<ConnectionHandle>, mpsc::Receiver<ServerEvent>) {
        let (tx, rx) = mpsc::channel(self.config.channel_buffer_size);
        let handle = Arc::new(ConnectionHandle::new(tx));
        self.pool.add(handle.clone());
        debug!(conn_id = %handle.id, "Connection registered");
        (handle, rx)
    }

    /// Handles one decoded client event for one connection.
    ///
    /// Every operation error becomes a single `error` acknowledgment;
    /// nothing here terminates the connection's handling loop. Returns
    /// the acknowledgment to deliver to the caller, if any.
    pub async fn handle_event(
        &self,
        conn_id: ConnectionId,
        event: ClientEvent,
    ) -> Option<ServerEvent> {
        if !matches!(event, ClientEvent::Connect { .. }) {
            self.touch(conn_id).await;
        }

        let outcome = match event {
            ClientEvent::Connect { token } => {
                self.sessions.connect(conn_id, &token).await.map(Some)
            }
            ClientEvent::JoinConversation { conversation_id } => {
                self.sessions.join_room(conn_id, conversation_id).await.map(Some)
            }
            ClientEvent::LeaveConversation { conversation_id } => {
                self.sessions.leave_room(conn_id, conversation_id).await.map(Some)
            }
            ClientEvent::SendMessage {
                conversation_id,
                content,
            } => self
                .fanout
                .send_message(conn_id, conversation_id, &content)
                .await
                .map(Some),
            ClientEvent::TypingStart { conversation_id } => self
                .typing
                .start_typing(conn_id, conversation_id)
                .await
                .map(|()| None),
            ClientEvent::TypingStop { conversation_id } => self
                .typing
                .stop_typing(conn_id, conversation_id)
                .await
                .map(|()| None),
        };

        match outcome {
            Ok(ack) => ack,
            Err(err) => Some(self.error_ack(conn_id, err)),
        }
    }

    /// Tears down a connection on socket close or transport error.
    pub async fn disconnect(&self, conn_id: ConnectionId) {
        if let Err(err) = self.sessions.disconnect(conn_id).await {
            error!(%conn_id, error = %err, "Disconnect teardown failed");
        }
    }

    /// Spawns the presence reconciliation sweeper. It stops on
    /// [`RealtimeEngine::shutdown`].
    pub fn spawn_sweeper(&self) -> JoinHandle<()> {
        let sweeper = PresenceSweeper::new(
            self.presence.clone(),
            self.pool.clone(),
            self.rooms.clone(),
            self.users.clone(),
        );
        let shutdown = self.shutdown.subscribe();
        tokio::spawn(sweeper.run(shutdown))
    }

    /// Signals every background task to stop.
    pub fn shutdown(&self) {
        let _ = self.shutdown.send(());
    }

    /// The live connection pool.
    pub fn pool(&self) -> &Arc<ConnectionPool> {
        &self.pool
    }

    /// The room registry.
    pub fn rooms(&self) -> &Arc<RoomRegistry> {
        &self.rooms
    }

    /// The presence store.
    pub fn presence(&self) -> &PresenceStore {
        &self.presence
    }

    /// The fan-out engine, shared with the HTTP message routes.
    pub fn fanout(&self) -> &FanoutEngine {
        &self.fanout
    }

    /// The typing broadcaster.
    pub fn typing(&self) -> &TypingBroadcaster {
        &self.typing
    }

    /// Best-effort activity refresh of the connection's session TTLs.
    async fn touch(&self, conn_id: ConnectionId) {
        let Some(identity) = self.pool.get(conn_id).and_then(|h| h.identity().cloned()) else {
            return;
        };
        if let Err(err) = self.presence.touch_session(identity.session_id).await {
            debug!(%conn_id, error = %err, "Session touch failed");
        }
    }

    fn error_ack(&self, conn_id: ConnectionId, err: AppError) -> ServerEvent {
        debug!(%conn_id, kind = %err.kind, message = %err.message, "Operation failed");
        ServerEvent::error(err.message)
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use campushub_auth::JwtEncoder;
    use campushub_cache::memory::MemoryCacheProvider;
    use campushub_core::config::{AuthConfig, MemoryCacheConfig};
    use campushub_core::types::UserId;
    use campushub_database::memory::{
        MemoryConversationStore, MemoryMessageStore, MemoryUserDirectory,
    };
    use campushub_entity::presence::UserStatus;
    use campushub_entity::user::User;

    use super::*;
    use crate::room::names;

    struct Harness {
        engine: RealtimeEngine,
        encoder: JwtEncoder,
        users: Arc<MemoryUserDirectory>,
        conversations: Arc<MemoryConversationStore>,
        messages: Arc<MemoryMessageStore>,
    }

    impl Harness {
        fn new() -> Self {
            let auth_config = AuthConfig {
                jwt_secret: "test-secret".to_string(),
                leeway_seconds: 5,
            };
            let users = Arc::new(MemoryUserDirectory::new());
            let conversations = Arc::new(MemoryConversationStore::new());
            let messages = Arc::new(MemoryMessageStore::new(conversations.clone()));

            let provider = MemoryCacheProvider::new(&MemoryCacheConfig::default());
            let cache = Arc::new(CacheManager::from_provider(Arc::new(provider)));

            let engine = RealtimeEngine::new(
                cache,
                PresenceConfig::default(),
                RealtimeConfig::default(),
                JwtDecoder::new(&auth_config),
                users.clone(),
                conversations.clone(),
                messages.clone(),
            );
            Self {
                engine,
                encoder: JwtEncoder::new(&auth_config),
                users,
                conversations,
                messages,
            }
        }

        fn register_user(&self, username: &str) -> User {
            let user = User {
                id: UserId::new(),
                username: username.to_string(),
                avatar_ref: None,
            };
            self.users.add(user.clone());
            user
        }

        fn token_for(&self, user: &User) -> String {
            self.encoder
                .encode(user.id, &user.username, None, 3600)
                .unwrap()
        }

        /// Registers and authenticates a connection for the user.
        async fn connect(
            &self,
            user: &User,
        ) -> (Arc<ConnectionHandle>, mpsc::Receiver<ServerEvent>) {
            let (handle, rx) = self.engine.register_connection();
            let ack = self
                .engine
                .handle_event(
                    handle.id,
                    ClientEvent::Connect {
                        token: self.token_for(user),
                    },
                )
                .await;
            assert!(
                matches!(ack, Some(ServerEvent::ConnectionStatus { .. })),
                "connect should ack with connection_status, got {ack:?}"
            );
            (handle, rx)
        }
    }

    fn drain(rx: &mut mpsc::Receiver<ServerEvent>) -> Vec<ServerEvent> {
        let mut events = Vec::new();
        while let Ok(event) = rx.try_recv() {
            events.push(event);
        }
        events
    }

    #[tokio::test]
    async fn test_connect_with_invalid_token_fails() {
        let harness = Harness::new();
        let (handle, _rx) = harness.engine.register_connection();

        let ack = harness
            .engine
            .handle_event(
                handle.id,
                ClientEvent::Connect {
                    token: "garbage".to_string(),
                },
            )
            .await;
        assert!(matches!(ack, Some(ServerEvent::Error { .. })));
        assert!(handle.identity().is_none());
    }

    #[tokio::test]
    async fn test_connect_for_deleted_user_fails() {
        let harness = Harness::new();
        let ghost = User {
            id: UserId::new(),
            username: "ghost".to_string(),
            avatar_ref: None,
        };
        let (handle, _rx) = harness.engine.register_connection();

        let ack = harness
            .engine
            .handle_event(
                handle.id,
                ClientEvent::Connect {
                    token: harness.token_for(&ghost),
                },
            )
            .await;
        assert!(matches!(ack, Some(ServerEvent::Error { .. })));
        assert!(!harness.engine.presence().is_user_online(ghost.id).await.unwrap());
    }

    #[tokio::test]
    async fn test_multi_tab_offline_broadcast_exactly_once() {
        let harness = Harness::new();
        let alice = harness.register_user("alice");
        let observer = harness.register_user("observer");

        // The observer watches alice's contacts channel.
        let (observer_conn, mut observer_rx) = harness.connect(&observer).await;
        harness
            .engine
            .rooms()
            .join(observer_conn.id, &names::contacts_room(alice.id));

        let (first_tab, _rx1) = harness.connect(&alice).await;
        assert!(harness.engine.presence().is_user_online(alice.id).await.unwrap());

        let online_events: Vec<_> = drain(&mut observer_rx)
            .into_iter()
            .filter(|e| matches!(
                e,
                ServerEvent::UserStatusChange { change } if change.status == UserStatus::Online
            ))
            .collect();
        assert_eq!(online_events.len(), 1, "first session broadcasts online once");

        // Second tab: still online, no further online broadcast.
        let (second_tab, _rx2) = harness.connect(&alice).await;
        assert!(drain(&mut observer_rx).is_empty());

        harness.engine.disconnect(first_tab.id).await;
        assert!(harness.engine.presence().is_user_online(alice.id).await.unwrap());
        assert!(drain(&mut observer_rx).is_empty(), "no offline while a tab remains");

        harness.engine.disconnect(second_tab.id).await;
        assert!(!harness.engine.presence().is_user_online(alice.id).await.unwrap());
        let offline_events: Vec<_> = drain(&mut observer_rx)
            .into_iter()
            .filter(|e| matches!(
                e,
                ServerEvent::UserStatusChange { change } if change.status == UserStatus::Offline
            ))
            .collect();
        assert_eq!(offline_events.len(), 1, "offline broadcast exactly once");
    }

    #[tokio::test]
    async fn test_unauthorized_join_mutates_nothing() {
        let harness = Harness::new();
        let alice = harness.register_user("alice");
        let bob = harness.register_user("bob");
        let carol = harness.register_user("carol");
        let conversation = harness
            .conversations
            .find_or_create(alice.id, bob.id)
            .await
            .unwrap();

        let (carol_conn, _rx) = harness.connect(&carol).await;
        let ack = harness
            .engine
            .handle_event(
                carol_conn.id,
                ClientEvent::JoinConversation {
                    conversation_id: conversation.id,
                },
            )
            .await;

        assert!(matches!(ack, Some(ServerEvent::Error { .. })));
        let room = names::conversation_room(conversation.id);
        assert_eq!(harness.engine.rooms().member_count(&room), 0);
        assert!(harness
            .engine
            .presence()
            .conversation_users(conversation.id)
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn test_join_then_leave_room_symmetry() {
        let harness = Harness::new();
        let alice = harness.register_user("alice");
        let bob = harness.register_user("bob");
        let conversation = harness
            .conversations
            .find_or_create(alice.id, bob.id)
            .await
            .unwrap();

        let (conn, _rx) = harness.connect(&alice).await;
        let ack = harness
            .engine
            .handle_event(
                conn.id,
                ClientEvent::JoinConversation {
                    conversation_id: conversation.id,
                },
            )
            .await;
        assert!(matches!(ack, Some(ServerEvent::JoinedConversation { .. })));

        let room = names::conversation_room(conversation.id);
        assert!(harness.engine.rooms().is_member(conn.id, &room));
        assert_eq!(
            harness
                .engine
                .presence()
                .conversation_users(conversation.id)
                .await
                .unwrap(),
            vec![alice.id]
        );

        let ack = harness
            .engine
            .handle_event(
                conn.id,
                ClientEvent::LeaveConversation {
                    conversation_id: conversation.id,
                },
            )
            .await;
        assert!(matches!(ack, Some(ServerEvent::LeftConversation { .. })));
        assert!(!harness.engine.rooms().is_member(conn.id, &room));
        assert!(harness
            .engine
            .presence()
            .conversation_users(conversation.id)
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn test_leave_room_without_membership_is_noop_ack() {
        let harness = Harness::new();
        let alice = harness.register_user("alice");
        let (conn, _rx) = harness.connect(&alice).await;

        let ack = harness
            .engine
            .handle_event(
                conn.id,
                ClientEvent::LeaveConversation {
                    conversation_id: campushub_core::types::ConversationId::new(),
                },
            )
            .await;
        assert!(matches!(ack, Some(ServerEvent::LeftConversation { .. })));
    }

    #[tokio::test]
    async fn test_send_message_broadcasts_to_room() {
        let harness = Harness::new();
        let alice = harness.register_user("alice");
        let bob = harness.register_user("bob");
        let conversation = harness
            .conversations
            .find_or_create(alice.id, bob.id)
            .await
            .unwrap();

        let (alice_conn, mut alice_rx) = harness.connect(&alice).await;
        let (bob_conn, mut bob_rx) = harness.connect(&bob).await;
        for conn in [alice_conn.id, bob_conn.id] {
            harness
                .engine
                .handle_event(
                    conn,
                    ClientEvent::JoinConversation {
                        conversation_id: conversation.id,
                    },
                )
                .await;
        }

        let ack = harness
            .engine
            .handle_event(
                alice_conn.id,
                ClientEvent::SendMessage {
                    conversation_id: conversation.id,
                    content: "  hello bob  ".to_string(),
                },
            )
            .await;
        assert!(matches!(ack, Some(ServerEvent::MessageSent { .. })));

        let bob_events = drain(&mut bob_rx);
        let received = bob_events.iter().find_map(|e| match e {
            ServerEvent::NewMessage { message, sender } => Some((message, sender)),
            _ => None,
        });
        let (message, sender) = received.expect("bob should receive the room broadcast");
        assert_eq!(message.content, "hello bob");
        assert_eq!(sender.username, "alice");
        assert!(message.is_read_by(alice.id));

        // Sender also gets the room copy but never a notification.
        let alice_events = drain(&mut alice_rx);
        assert!(alice_events
            .iter()
            .any(|e| matches!(e, ServerEvent::NewMessage { .. })));
        assert!(!alice_events
            .iter()
            .any(|e| matches!(e, ServerEvent::NewMessageNotification { .. })));
    }

    #[tokio::test]
    async fn test_online_participant_outside_room_gets_notification() {
        let harness = Harness::new();
        let alice = harness.register_user("alice");
        let bob = harness.register_user("bob");
        let conversation = harness
            .conversations
            .find_or_create(alice.id, bob.id)
            .await
            .unwrap();

        let (alice_conn, _alice_rx) = harness.connect(&alice).await;
        harness
            .engine
            .handle_event(
                alice_conn.id,
                ClientEvent::JoinConversation {
                    conversation_id: conversation.id,
                },
            )
            .await;

        // Bob is online but never joined the conversation room.
        let (_bob_conn, mut bob_rx) = harness.connect(&bob).await;

        harness
            .engine
            .handle_event(
                alice_conn.id,
                ClientEvent::SendMessage {
                    conversation_id: conversation.id,
                    content: "ping".to_string(),
                },
            )
            .await;

        let bob_events = drain(&mut bob_rx);
        let notification = bob_events.iter().find_map(|e| match e {
            ServerEvent::NewMessageNotification {
                message,
                conversation_id,
                sender,
            } => Some((message, conversation_id, sender)),
            _ => None,
        });
        let (message, conversation_id, sender) =
            notification.expect("bob should be notified on his personal channel");
        assert_eq!(message.content, "ping");
        assert_eq!(*conversation_id, conversation.id);
        assert_eq!(sender.id, alice.id);
        assert!(!bob_events
            .iter()
            .any(|e| matches!(e, ServerEvent::NewMessage { .. })));
    }

    #[tokio::test]
    async fn test_send_empty_content_rejected() {
        let harness = Harness::new();
        let alice = harness.register_user("alice");
        let bob = harness.register_user("bob");
        let conversation = harness
            .conversations
            .find_or_create(alice.id, bob.id)
            .await
            .unwrap();
        let (conn, _rx) = harness.connect(&alice).await;

        let ack = harness
            .engine
            .handle_event(
                conn.id,
                ClientEvent::SendMessage {
                    conversation_id: conversation.id,
                    content: "   ".to_string(),
                },
            )
            .await;
        assert!(matches!(ack, Some(ServerEvent::Error { .. })));
        assert!(harness
            .messages
            .list(conversation.id, 10, 0)
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn test_send_clears_typing_flag() {
        let harness = Harness::new();
        let alice = harness.register_user("alice");
        let bob = harness.register_user("bob");
        let conversation = harness
            .conversations
            .find_or_create(alice.id, bob.id)
            .await
            .unwrap();
        let (conn, _rx) = harness.connect(&alice).await;

        harness
            .engine
            .handle_event(
                conn.id,
                ClientEvent::TypingStart {
                    conversation_id: conversation.id,
                },
            )
            .await;
        assert_eq!(
            harness
                .engine
                .typing()
                .typing_users(conversation.id)
                .await
                .unwrap(),
            vec![alice.id]
        );

        harness
            .engine
            .handle_event(
                conn.id,
                ClientEvent::SendMessage {
                    conversation_id: conversation.id,
                    content: "done typing".to_string(),
                },
            )
            .await;
        assert!(harness
            .engine
            .typing()
            .typing_users(conversation.id)
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn test_typing_broadcast_excludes_sender() {
        let harness = Harness::new();
        let alice = harness.register_user("alice");
        let bob = harness.register_user("bob");
        let conversation = harness
            .conversations
            .find_or_create(alice.id, bob.id)
            .await
            .unwrap();

        let (alice_conn, mut alice_rx) = harness.connect(&alice).await;
        let (bob_conn, mut bob_rx) = harness.connect(&bob).await;
        for conn in [alice_conn.id, bob_conn.id] {
            harness
                .engine
                .handle_event(
                    conn,
                    ClientEvent::JoinConversation {
                        conversation_id: conversation.id,
                    },
                )
                .await;
        }
        drain(&mut alice_rx);
        drain(&mut bob_rx);

        let ack = harness
            .engine
            .handle_event(
                alice_conn.id,
                ClientEvent::TypingStart {
                    conversation_id: conversation.id,
                },
            )
            .await;
        assert!(ack.is_none(), "typing has no direct acknowledgment");

        let bob_events = drain(&mut bob_rx);
        assert!(bob_events.iter().any(|e| matches!(
            e,
            ServerEvent::UserTyping { user_id, typing: true, .. } if *user_id == alice.id
        )));
        assert!(drain(&mut alice_rx).is_empty(), "typist does not hear themself");
    }

    #[tokio::test]
    async fn test_offline_send_then_read_scenario() {
        let harness = Harness::new();
        let alice = harness.register_user("alice");
        let bob = harness.register_user("bob");
        let conversation = harness
            .conversations
            .find_or_create(alice.id, bob.id)
            .await
            .unwrap();

        // Alice sends while bob is offline.
        let (alice_conn, _alice_rx) = harness.connect(&alice).await;
        harness
            .engine
            .handle_event(
                alice_conn.id,
                ClientEvent::SendMessage {
                    conversation_id: conversation.id,
                    content: "hello".to_string(),
                },
            )
            .await;

        // Bob comes online and opens the conversation, which marks it
        // read.
        let (bob_conn, _bob_rx) = harness.connect(&bob).await;
        let ack = harness
            .engine
            .handle_event(
                bob_conn.id,
                ClientEvent::JoinConversation {
                    conversation_id: conversation.id,
                },
            )
            .await;
        assert!(matches!(ack, Some(ServerEvent::JoinedConversation { .. })));

        let page = harness
            .engine
            .fanout()
            .messages(conversation.id, 0, 50)
            .await
            .unwrap();
        assert_eq!(page.len(), 1);
        assert_eq!(page[0].content, "hello");
        assert!(page[0].is_read_by(alice.id));
        assert!(page[0].is_read_by(bob.id));
    }

    #[tokio::test]
    async fn test_messages_delivered_chronologically() {
        let harness = Harness::new();
        let alice = harness.register_user("alice");
        let bob = harness.register_user("bob");
        let conversation = harness
            .conversations
            .find_or_create(alice.id, bob.id)
            .await
            .unwrap();
        let (conn, _rx) = harness.connect(&alice).await;

        for content in ["first", "second", "third"] {
            harness
                .engine
                .handle_event(
                    conn.id,
                    ClientEvent::SendMessage {
                        conversation_id: conversation.id,
                        content: content.to_string(),
                    },
                )
                .await;
        }

        let page = harness
            .engine
            .fanout()
            .messages(conversation.id, 0, 50)
            .await
            .unwrap();
        let contents: Vec<_> = page.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, vec!["first", "second", "third"]);
    }

    #[tokio::test]
    async fn test_operations_require_authentication() {
        let harness = Harness::new();
        let (conn, _rx) = harness.engine.register_connection();
        let conversation_id = campushub_core::types::ConversationId::new();

        for event in [
            ClientEvent::JoinConversation { conversation_id },
            ClientEvent::SendMessage {
                conversation_id,
                content: "hi".to_string(),
            },
            ClientEvent::TypingStart { conversation_id },
        ] {
            let ack = harness.engine.handle_event(conn.id, event).await;
            assert!(matches!(ack, Some(ServerEvent::Error { .. })));
        }
    }

    #[tokio::test]
    async fn test_typing_flag_expires_without_stop() {
        let harness = Harness::new();
        let alice = harness.register_user("alice");
        let conversation_id = campushub_core::types::ConversationId::new();
        let (conn, _rx) = harness.connect(&alice).await;
        let identity = conn.identity().unwrap().clone();

        harness
            .engine
            .presence()
            .raw_set_typing_with_ttl(conversation_id, identity.user_id, Duration::from_millis(50))
            .await
            .unwrap();
        assert!(!harness
            .engine
            .typing()
            .typing_users(conversation_id)
            .await
            .unwrap()
            .is_empty());

        tokio::time::sleep(Duration::from_millis(80)).await;
        assert!(harness
            .engine
            .typing()
            .typing_users(conversation_id)
            .await
            .unwrap()
            .is_empty());
    }
}
