//! Presence store wrapper with the fixed key conventions.
//!
//! The shared store is the source of truth for all ephemeral state:
//! session records, online flags, room membership, typing indicators.
//! Every mutation here is a single-key or single-set operation; the
//! store guarantees atomicity per operation, no multi-key transactions.

use std::sync::Arc;

use tracing::{debug, warn};

use campushub_cache::keys;
use campushub_cache::provider::CacheManager;
use campushub_core::config::PresenceConfig;
use campushub_core::result::AppResult;
use campushub_core::traits::cache::CacheProvider;
use campushub_core::types::{ConversationId, MessageId, SessionId, UserId};
use campushub_entity::message::Message;
use campushub_entity::session::SessionRecord;

/// Presence and session bookkeeping over the shared key/value store.
#[derive(Debug, Clone)]
pub struct PresenceStore {
    cache: Arc<CacheManager>,
    config: PresenceConfig,
}

impl PresenceStore {
    /// Creates a presence store over the given cache backend.
    pub fn new(cache: Arc<CacheManager>, config: PresenceConfig) -> Self {
        Self { cache, config }
    }

    /// The configured TTLs.
    pub fn config(&self) -> &PresenceConfig {
        &self.config
    }

    /// Registers a session and marks its user online.
    ///
    /// Idempotent per session; refreshes every TTL involved. Returns
    /// `true` if this transition took the user from offline to online
    /// (the caller broadcasts the status change on that edge only).
    pub async fn set_user_online(&self, record: &SessionRecord) -> AppResult<bool> {
        let ttl = self.config.session_ttl();
        let was_online = self.cache.exists(&keys::user_online(record.user_id)).await?;

        self.cache
            .set_json(&keys::session(record.id), record, ttl)
            .await?;
        self.cache
            .set_add(
                &keys::user_sessions(record.user_id),
                &record.id.to_string(),
                ttl,
            )
            .await?;
        self.cache
            .set(&keys::user_online(record.user_id), "1", ttl)
            .await?;

        debug!(user_id = %record.user_id, session_id = %record.id, "Session registered");
        Ok(!was_online)
    }

    /// Tears down a session.
    ///
    /// Returns the session record and whether the user went fully
    /// offline. The empty-set check after removal is check-then-act:
    /// two concurrent last-session disconnects can double-emit or miss
    /// the offline transition. Double-emit is harmless; a miss is healed
    /// by the sweeper and by TTL expiry of the online flag.
    pub async fn set_user_offline(
        &self,
        session_id: SessionId,
    ) -> AppResult<Option<(SessionRecord, bool)>> {
        let Some(record) = self.session(session_id).await? else {
            return Ok(None);
        };

        self.cache.delete(&keys::session(session_id)).await?;
        self.cache
            .set_remove(&keys::user_sessions(record.user_id), &session_id.to_string())
            .await?;

        let remaining = self
            .cache
            .set_len(&keys::user_sessions(record.user_id))
            .await?;
        let went_offline = remaining == 0;
        if went_offline {
            self.cache.delete(&keys::user_online(record.user_id)).await?;
        }

        debug!(
            user_id = %record.user_id,
            session_id = %session_id,
            remaining,
            "Session torn down"
        );
        Ok(Some((record, went_offline)))
    }

    /// Whether at least one live session exists for the user.
    pub async fn is_user_online(&self, user_id: UserId) -> AppResult<bool> {
        self.cache.exists(&keys::user_online(user_id)).await
    }

    /// Loads one session record.
    pub async fn session(&self, session_id: SessionId) -> AppResult<Option<SessionRecord>> {
        match self.cache.get_json(&keys::session(session_id)).await {
            Ok(record) => Ok(record),
            Err(err) if err.kind == campushub_core::error::ErrorKind::Serialization => {
                // Corrupt payload. Drop it rather than failing every
                // read that touches it.
                warn!(session_id = %session_id, "Dropping corrupt session record");
                self.cache.delete(&keys::session(session_id)).await?;
                Ok(None)
            }
            Err(err) => Err(err),
        }
    }

    /// Persists an updated session record, refreshing its TTL.
    pub async fn save_session(&self, record: &SessionRecord) -> AppResult<()> {
        self.cache
            .set_json(&keys::session(record.id), record, self.config.session_ttl())
            .await
    }

    /// All live session records for a user.
    ///
    /// Self-healing: session ids whose record has expired or gone
    /// corrupt are removed from the user's session set as they are
    /// encountered.
    pub async fn user_sessions(&self, user_id: UserId) -> AppResult<Vec<SessionRecord>> {
        let members = self.cache.set_members(&keys::user_sessions(user_id)).await?;
        let mut sessions = Vec::with_capacity(members.len());
        for member in members {
            let Ok(session_id) = member.parse::<SessionId>() else {
                self.cache
                    .set_remove(&keys::user_sessions(user_id), &member)
                    .await?;
                continue;
            };
            match self.session(session_id).await? {
                Some(record) => sessions.push(record),
                None => {
                    self.cache
                        .set_remove(&keys::user_sessions(user_id), &member)
                        .await?;
                }
            }
        }
        Ok(sessions)
    }

    /// Number of session ids currently tracked for a user.
    pub async fn user_session_count(&self, user_id: UserId) -> AppResult<u64> {
        self.cache.set_len(&keys::user_sessions(user_id)).await
    }

    /// Refreshes the TTLs of a session and its user's presence keys.
    pub async fn touch_session(&self, session_id: SessionId) -> AppResult<()> {
        let Some(mut record) = self.session(session_id).await? else {
            return Ok(());
        };
        record.touch();
        let ttl = self.config.session_ttl();
        self.cache
            .set_json(&keys::session(session_id), &record, ttl)
            .await?;
        self.cache
            .expire(&keys::user_sessions(record.user_id), ttl)
            .await?;
        self.cache
            .expire(&keys::user_online(record.user_id), ttl)
            .await?;
        Ok(())
    }

    /// Records a session's presence in a conversation room.
    pub async fn add_user_to_conversation(
        &self,
        conversation_id: ConversationId,
        user_id: UserId,
        session_id: SessionId,
    ) -> AppResult<()> {
        let ttl = self.config.room_ttl();
        self.cache
            .set_add(&keys::room_users(conversation_id), &user_id.to_string(), ttl)
            .await?;
        self.cache
            .set_add(
                &keys::room_sessions(conversation_id),
                &session_id.to_string(),
                ttl,
            )
            .await?;
        Ok(())
    }

    /// Removes a session from a conversation room.
    ///
    /// The user stays in the room's participant set while any of their
    /// other sessions remains joined; the last session leaving drops
    /// them.
    pub async fn remove_user_from_conversation(
        &self,
        conversation_id: ConversationId,
        user_id: UserId,
        session_id: SessionId,
    ) -> AppResult<()> {
        self.cache
            .set_remove(
                &keys::room_sessions(conversation_id),
                &session_id.to_string(),
            )
            .await?;

        let still_present = self
            .user_sessions(user_id)
            .await?
            .iter()
            .any(|s| s.id != session_id && s.is_in_room(conversation_id));
        if !still_present {
            self.cache
                .set_remove(&keys::room_users(conversation_id), &user_id.to_string())
                .await?;
        }
        Ok(())
    }

    /// User ids currently present in a conversation room.
    pub async fn conversation_users(
        &self,
        conversation_id: ConversationId,
    ) -> AppResult<Vec<UserId>> {
        let members = self.cache.set_members(&keys::room_users(conversation_id)).await?;
        Ok(members.iter().filter_map(|m| m.parse().ok()).collect())
    }

    /// Sets or clears a typing flag. The flag's TTL is the only required
    /// expiry mechanism; a crashed client's indicator clears on its own.
    pub async fn set_typing(
        &self,
        conversation_id: ConversationId,
        user_id: UserId,
        typing: bool,
    ) -> AppResult<()> {
        let key = keys::typing(conversation_id, user_id);
        if typing {
            self.cache.set(&key, "1", self.config.typing_ttl()).await
        } else {
            self.cache.delete(&key).await
        }
    }

    /// Users currently typing in a conversation, recovered from the key
    /// format.
    pub async fn typing_users(&self, conversation_id: ConversationId) -> AppResult<Vec<UserId>> {
        let found = self
            .cache
            .scan_keys(&keys::typing_pattern(conversation_id))
            .await?;
        Ok(found.iter().filter_map(|k| keys::parse_typing_user(k)).collect())
    }

    /// Caches a hydrated message for read-through lookups.
    pub async fn cache_message(&self, message: &Message) -> AppResult<()> {
        self.cache
            .set_json(
                &keys::message(message.id),
                message,
                self.config.message_cache_ttl(),
            )
            .await
    }

    /// Loads a cached message, if still present.
    pub async fn cached_message(&self, message_id: MessageId) -> AppResult<Option<Message>> {
        self.cache.get_json(&keys::message(message_id)).await
    }

    /// User ids with an online flag set, for the reconciliation sweep.
    pub async fn online_user_ids(&self) -> AppResult<Vec<UserId>> {
        let found = self.cache.scan_keys(keys::user_online_pattern()).await?;
        Ok(found.iter().filter_map(|k| keys::parse_user_online(k)).collect())
    }

    /// Clears a stale online flag. Used by the sweeper after observing
    /// an empty session set.
    pub async fn clear_online_flag(&self, user_id: UserId) -> AppResult<()> {
        self.cache.delete(&keys::user_online(user_id)).await
    }

    /// Checks store reachability.
    pub async fn health_check(&self) -> AppResult<bool> {
        self.cache.health_check().await
    }

    #[cfg(test)]
    pub(crate) fn cache(&self) -> &CacheManager {
        &self.cache
    }

    #[cfg(test)]
    pub(crate) async fn raw_set_typing_with_ttl(
        &self,
        conversation_id: ConversationId,
        user_id: UserId,
        ttl: std::time::Duration,
    ) -> AppResult<()> {
        self.cache
            .set(&keys::typing(conversation_id, user_id), "1", ttl)
            .await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use campushub_cache::memory::MemoryCacheProvider;
    use campushub_core::config::{MemoryCacheConfig, PresenceConfig};
    use campushub_core::types::ConnectionId;

    use super::*;

    fn store_with_ttls(session_ttl: u64, typing_ttl: u64) -> PresenceStore {
        let provider = MemoryCacheProvider::new(&MemoryCacheConfig::default());
        let cache = Arc::new(CacheManager::from_provider(Arc::new(provider)));
        PresenceStore::new(
            cache,
            PresenceConfig {
                session_ttl_seconds: session_ttl,
                room_ttl_seconds: session_ttl,
                typing_ttl_seconds: typing_ttl,
                message_cache_ttl_seconds: session_ttl,
                sweep_interval_seconds: 60,
            },
        )
    }

    fn record_for(user_id: UserId) -> SessionRecord {
        SessionRecord::new(ConnectionId::new(), user_id, "mika".to_string(), None)
    }

    #[tokio::test]
    async fn test_first_session_reports_came_online() {
        let store = store_with_ttls(60, 10);
        let user = UserId::new();

        let first = record_for(user);
        assert!(store.set_user_online(&first).await.unwrap());
        assert!(store.is_user_online(user).await.unwrap());

        let second = record_for(user);
        assert!(!store.set_user_online(&second).await.unwrap());
        assert_eq!(store.user_session_count(user).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_offline_only_after_last_session() {
        let store = store_with_ttls(60, 10);
        let user = UserId::new();
        let first = record_for(user);
        let second = record_for(user);
        store.set_user_online(&first).await.unwrap();
        store.set_user_online(&second).await.unwrap();

        let (_, went_offline) = store
            .set_user_offline(first.id)
            .await
            .unwrap()
            .expect("session should exist");
        assert!(!went_offline);
        assert!(store.is_user_online(user).await.unwrap());

        let (_, went_offline) = store
            .set_user_offline(second.id)
            .await
            .unwrap()
            .expect("session should exist");
        assert!(went_offline);
        assert!(!store.is_user_online(user).await.unwrap());
    }

    #[tokio::test]
    async fn test_offline_unknown_session_is_noop() {
        let store = store_with_ttls(60, 10);
        assert!(store.set_user_offline(SessionId::new()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_user_sessions_self_heals_stale_ids() {
        let store = store_with_ttls(60, 10);
        let user = UserId::new();
        let live = record_for(user);
        store.set_user_online(&live).await.unwrap();

        // A session id whose record expired leaves a dangling set member.
        store
            .cache
            .set_add(
                &keys::user_sessions(user),
                &SessionId::new().to_string(),
                Duration::from_secs(60),
            )
            .await
            .unwrap();
        assert_eq!(store.user_session_count(user).await.unwrap(), 2);

        let sessions = store.user_sessions(user).await.unwrap();
        assert_eq!(sessions.len(), 1);
        assert_eq!(sessions[0].id, live.id);
        assert_eq!(store.user_session_count(user).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_room_membership_follows_last_session() {
        let store = store_with_ttls(60, 10);
        let user = UserId::new();
        let conv = ConversationId::new();

        let mut first = record_for(user);
        first.join_room(conv);
        let mut second = record_for(user);
        second.join_room(conv);
        store.set_user_online(&first).await.unwrap();
        store.set_user_online(&second).await.unwrap();

        store.add_user_to_conversation(conv, user, first.id).await.unwrap();
        store.add_user_to_conversation(conv, user, second.id).await.unwrap();

        store
            .remove_user_from_conversation(conv, user, first.id)
            .await
            .unwrap();
        assert!(store.conversation_users(conv).await.unwrap().contains(&user));

        // Second session leaves the room as well.
        second.leave_room(conv);
        store.save_session(&second).await.unwrap();
        store
            .remove_user_from_conversation(conv, user, second.id)
            .await
            .unwrap();
        assert!(store.conversation_users(conv).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_typing_flag_expires() {
        let store = store_with_ttls(60, 1);
        let user = UserId::new();
        let conv = ConversationId::new();

        store
            .raw_set_typing_with_ttl(conv, user, Duration::from_millis(50))
            .await
            .unwrap();
        assert_eq!(store.typing_users(conv).await.unwrap(), vec![user]);

        tokio::time::sleep(Duration::from_millis(80)).await;
        assert!(store.typing_users(conv).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_set_typing_clear() {
        let store = store_with_ttls(60, 10);
        let user = UserId::new();
        let conv = ConversationId::new();

        store.set_typing(conv, user, true).await.unwrap();
        assert_eq!(store.typing_users(conv).await.unwrap(), vec![user]);
        store.set_typing(conv, user, false).await.unwrap();
        assert!(store.typing_users(conv).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_message_cache_roundtrip() {
        use campushub_entity::message::Message;
        use chrono::Utc;

        let store = store_with_ttls(60, 10);
        let message = Message {
            id: MessageId::new(),
            conversation_id: ConversationId::new(),
            sender_id: UserId::new(),
            content: "hello".to_string(),
            attachment_ref: None,
            read_by: vec![],
            created_at: Utc::now(),
            edited_at: None,
        };

        store.cache_message(&message).await.unwrap();
        let cached = store.cached_message(message.id).await.unwrap().unwrap();
        assert_eq!(cached.content, "hello");
        assert!(store.cached_message(MessageId::new()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_online_flag_scan() {
        let store = store_with_ttls(60, 10);
        let user = UserId::new();
        store.set_user_online(&record_for(user)).await.unwrap();

        let online = store.online_user_ids().await.unwrap();
        assert_eq!(online, vec![user]);

        store.clear_online_flag(user).await.unwrap();
        assert!(store.online_user_ids().await.unwrap().is_empty());
    }
}
