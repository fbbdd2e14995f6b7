//! Concurrent removal of a user from managed groups.

use crate::ModerationMetrics;
use futures::future::join_all;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, instrument, warn};
use warden_core::{ChatId, UserId};
use warden_error::{WardenError, WardenErrorKind};
use warden_social::ChatPlatform;
use warden_store::{GroupFilter, MembershipStore};

/// Result of one per-group eviction attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EvictionOutcome {
    /// Member removed; restoration scheduled
    Evicted,
    /// Bot lacks the rights to remove members there
    NotPermitted,
    /// Platform call failed for another reason
    Failed,
}

impl EvictionOutcome {
    /// Whether the member was removed.
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Evicted)
    }
}

/// Removes a user from managed groups, then lifts the removal after a delay.
///
/// Removal is not a permanent ban: each successful removal is followed by a
/// detached restoration after `restore_delay`, so the user may rejoin
/// manually later.
#[derive(Clone)]
pub struct GroupEvictor {
    store: Arc<dyn MembershipStore>,
    platform: Arc<dyn ChatPlatform>,
    restore_delay: Duration,
    metrics: ModerationMetrics,
}

impl GroupEvictor {
    /// Create an evictor.
    pub fn new(
        store: Arc<dyn MembershipStore>,
        platform: Arc<dyn ChatPlatform>,
        restore_delay: Duration,
        metrics: ModerationMetrics,
    ) -> Self {
        Self {
            store,
            platform,
            restore_delay,
            metrics,
        }
    }

    /// Remove `user` from every bot-administered group except `home`.
    ///
    /// All per-group attempts run concurrently and are awaited to completion;
    /// one group's failure neither aborts nor delays the others. Returns the
    /// number of groups the user was removed from. A store failure while
    /// listing groups yields 0.
    #[instrument(skip(self), fields(targets, evicted))]
    pub async fn evict_from_all_except(&self, user: UserId, home: ChatId) -> usize {
        let groups = match self.store.query_groups(GroupFilter::BotAdmin).await {
            Ok(groups) => groups,
            Err(e) => {
                self.metrics.record_store_error();
                error!(error = %e, "Could not list managed groups; nothing evicted");
                return 0;
            }
        };

        let targets: Vec<ChatId> = groups
            .iter()
            .map(|g| *g.chat_id())
            .filter(|chat| *chat != home)
            .collect();
        tracing::Span::current().record("targets", targets.len());

        let outcomes = join_all(targets.iter().map(|chat| self.attempt(*chat, user))).await;
        let evicted = outcomes.iter().filter(|o| o.is_success()).count();

        tracing::Span::current().record("evicted", evicted);
        info!(
            attempted = targets.len(),
            evicted, "Eviction fan-out complete"
        );
        evicted
    }

    /// Remove `user` from one group.
    ///
    /// Same capability check and restoration as the fan-out. Returns whether
    /// the user was removed.
    #[instrument(skip(self))]
    pub async fn evict_from_one(&self, chat: ChatId, user: UserId) -> bool {
        self.attempt(chat, user).await.is_success()
    }

    async fn attempt(&self, chat: ChatId, user: UserId) -> EvictionOutcome {
        let outcome = self.try_remove(chat, user).await;
        if outcome.is_success() {
            self.metrics.record_eviction_success();
            self.schedule_restore(chat, user);
        } else {
            self.metrics.record_eviction_failure();
        }
        outcome
    }

    async fn try_remove(&self, chat: ChatId, user: UserId) -> EvictionOutcome {
        let bot = self.platform.bot_id();
        match self.platform.get_membership_status(chat, bot).await {
            Ok(status) if status.can_evict() => {}
            Ok(status) => {
                warn!(%chat, %user, status = %status.status(), "Bot cannot remove members here");
                return EvictionOutcome::NotPermitted;
            }
            Err(e) => return classify_failure(chat, user, "membership check", &e),
        }

        match self.platform.remove_member(chat, user).await {
            Ok(()) => {
                info!(%chat, %user, "Removed member");
                EvictionOutcome::Evicted
            }
            Err(e) => classify_failure(chat, user, "removal", &e),
        }
    }

    fn schedule_restore(&self, chat: ChatId, user: UserId) {
        let platform = Arc::clone(&self.platform);
        let metrics = self.metrics.clone();
        let delay = self.restore_delay;
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            match platform.restore_member(chat, user).await {
                Ok(()) => debug!(%chat, %user, "Lifted removal"),
                Err(e) => {
                    metrics.record_restoration_failure();
                    error!(%chat, %user, error = %e, "Could not lift removal");
                }
            }
        });
    }
}

fn classify_failure(chat: ChatId, user: UserId, step: &str, e: &WardenError) -> EvictionOutcome {
    let denied = matches!(e.kind(), WardenErrorKind::Platform(p) if p.is_permission_denied());
    if denied {
        warn!(%chat, %user, step, error = %e, "Eviction not permitted");
        return EvictionOutcome::NotPermitted;
    }
    error!(%chat, %user, step, error = %e, "Eviction failed");
    EvictionOutcome::Failed
}
