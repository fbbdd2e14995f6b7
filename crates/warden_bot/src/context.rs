//! Shared runtime state.

use crate::BotConfig;
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, instrument, warn};
use warden_cache::{SweepHandle, TtlCache};
use warden_core::{ChatId, UserId};
use warden_moderation::{MetricsSnapshot, QuarantineService};
use warden_social::ChatPlatform;
use warden_store::MembershipStore;

/// Body of `GET /health`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HealthReport {
    /// `ok`, or `degraded` when the store is unreachable
    pub status: &'static str,
    /// Seconds since start-up
    pub uptime_secs: u64,
    /// Live entries across all caches
    pub cache_entries: usize,
    /// Whether the store answered a ping
    pub store_reachable: bool,
    /// Follow-ups waiting to fire
    pub pending_follow_ups: usize,
}

/// Everything the router, poller and health API share.
///
/// Holds the store, the platform client, the quarantine service and the
/// admin lookup cache. Quarantine and trigger lookups are cached inside the
/// service.
pub struct ServiceContext {
    config: BotConfig,
    store: Arc<dyn MembershipStore>,
    platform: Arc<dyn ChatPlatform>,
    service: QuarantineService,
    admins: TtlCache<(ChatId, UserId), bool>,
    started_at: Instant,
}

impl ServiceContext {
    /// Build caches and the quarantine service from `config`.
    pub fn new(
        config: BotConfig,
        store: Arc<dyn MembershipStore>,
        platform: Arc<dyn ChatPlatform>,
    ) -> Self {
        let quarantines = TtlCache::new("quarantine", config.cache().ttl_config());
        let admins = TtlCache::new("admin", config.cache().admin_config());
        let service = QuarantineService::new(
            Arc::clone(&store),
            Arc::clone(&platform),
            quarantines,
            config.moderation(),
        );
        Self {
            config,
            store,
            platform,
            service,
            admins,
            started_at: Instant::now(),
        }
    }

    /// Active configuration.
    pub fn config(&self) -> &BotConfig {
        &self.config
    }

    /// Backing store.
    pub fn store(&self) -> &Arc<dyn MembershipStore> {
        &self.store
    }

    /// Platform client.
    pub fn platform(&self) -> &Arc<dyn ChatPlatform> {
        &self.platform
    }

    /// Quarantine state machine.
    pub fn service(&self) -> &QuarantineService {
        &self.service
    }

    /// Start the background sweep of every cache.
    ///
    /// Sweeps stop when the returned handles are dropped.
    pub fn spawn_sweepers(&self) -> Vec<SweepHandle> {
        vec![
            self.service.cache().spawn_sweeper(),
            self.service.trigger_cache().spawn_sweeper(),
            self.admins.spawn_sweeper(),
        ]
    }

    /// Whether `user` may moderate `chat`.
    ///
    /// Answers are cached for the admin TTL. A failed lookup counts as
    /// "not an admin" and is not cached.
    #[instrument(skip(self))]
    pub async fn is_admin(&self, chat: ChatId, user: UserId) -> bool {
        if let Some(admin) = self.admins.get(&(chat, user)) {
            return admin;
        }
        match self.platform.get_membership_status(chat, user).await {
            Ok(status) => {
                let admin = status.status().is_admin();
                self.admins.set((chat, user), admin);
                debug!(admin, "Admin status resolved");
                admin
            }
            Err(e) => {
                warn!(error = %e, "Admin lookup failed");
                false
            }
        }
    }

    /// Drop every cached admin answer for `chat`.
    pub fn forget_admins(&self, chat: ChatId) {
        for key in self.admins.stats().keys() {
            if key.0 == chat {
                self.admins.delete(key);
            }
        }
    }

    /// Current health, pinging the store.
    pub async fn health(&self) -> HealthReport {
        let store_reachable = match self.store.ping().await {
            Ok(()) => true,
            Err(e) => {
                warn!(error = %e, "Store ping failed");
                false
            }
        };
        HealthReport {
            status: if store_reachable { "ok" } else { "degraded" },
            uptime_secs: self.started_at.elapsed().as_secs(),
            cache_entries: self.service.cache().len()
                + self.service.trigger_cache().len()
                + self.admins.len(),
            store_reachable,
            pending_follow_ups: self.service.dispatcher().pending_count(),
        }
    }

    /// Moderation counters.
    pub fn metrics(&self) -> MetricsSnapshot {
        self.service.metrics().snapshot()
    }

    /// Cancel every pending follow-up, for shutdown.
    pub fn shutdown(&self) -> usize {
        self.service.dispatcher().cancel_all()
    }
}
