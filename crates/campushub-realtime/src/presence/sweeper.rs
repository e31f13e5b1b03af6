//! Periodic presence reconciliation.
//!
//! TTL expiry is a correctness backstop, not just memory cleanup: the
//! documented last-session disconnect race can leave an online flag with
//! no backing sessions, and nothing else observes that transition. The
//! sweep finds such flags, clears them, and emits the missed offline
//! broadcast.

use std::sync::Arc;

use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use campushub_core::types::UserId;
use campushub_database::store::UserDirectory;
use campushub_entity::presence::{StatusChange, UserStatus};

use crate::connection::ConnectionPool;
use crate::event::ServerEvent;
use crate::presence::PresenceStore;
use crate::room::{RoomRegistry, names};

/// Background task reconciling online flags against session sets.
pub struct PresenceSweeper {
    presence: PresenceStore,
    pool: Arc<ConnectionPool>,
    rooms: Arc<RoomRegistry>,
    users: Arc<dyn UserDirectory>,
}

impl PresenceSweeper {
    /// Creates a sweeper over the given presence state.
    pub fn new(
        presence: PresenceStore,
        pool: Arc<ConnectionPool>,
        rooms: Arc<RoomRegistry>,
        users: Arc<dyn UserDirectory>,
    ) -> Self {
        Self {
            presence,
            pool,
            rooms,
            users,
        }
    }

    /// Runs the sweep loop until shutdown is signalled.
    pub async fn run(self, mut shutdown: broadcast::Receiver<()>) {
        let mut interval = tokio::time::interval(self.presence.config().sweep_interval());
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        info!("Presence sweeper started");

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    match self.sweep_once().await {
                        Ok(0) => {}
                        Ok(swept) => debug!(swept, "Presence sweep cleared stale online flags"),
                        Err(err) => warn!(error = %err, "Presence sweep failed"),
                    }
                }
                _ = shutdown.recv() => {
                    info!("Presence sweeper stopping");
                    break;
                }
            }
        }
    }

    /// One reconciliation pass. Returns the number of stale online flags
    /// cleared.
    pub async fn sweep_once(&self) -> campushub_core::result::AppResult<usize> {
        let mut swept = 0;
        for user_id in self.presence.online_user_ids().await? {
            // user_sessions self-heals dangling ids, so an empty result
            // means no live session backs the flag.
            let sessions = self.presence.user_sessions(user_id).await?;
            if !sessions.is_empty() {
                continue;
            }
            self.presence.clear_online_flag(user_id).await?;
            self.emit_offline(user_id).await;
            swept += 1;
        }
        Ok(swept)
    }

    /// Best-effort offline broadcast for a swept user.
    async fn emit_offline(&self, user_id: UserId) {
        let username = match self.users.by_id(user_id).await {
            Ok(Some(user)) => user.username,
            Ok(None) => {
                debug!(%user_id, "Swept flag for unknown user, skipping broadcast");
                return;
            }
            Err(err) => {
                warn!(%user_id, error = %err, "User lookup failed during sweep");
                return;
            }
        };

        let event = ServerEvent::UserStatusChange {
            change: StatusChange {
                user_id,
                username,
                status: UserStatus::Offline,
                timestamp: chrono::Utc::now(),
            },
        };
        self.rooms
            .emit_to_room(&self.pool, &names::contacts_room(user_id), &event);
    }
}
