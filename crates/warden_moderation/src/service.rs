//! Quarantine state machine.

use crate::{FollowUpDispatcher, FollowUpKey, GroupEvictor, ModerationConfig, ModerationMetrics};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, instrument, warn};
use warden_cache::TtlCache;
use warden_core::{
    ChatId, DisplayName, MessageId, QuarantineRecord, QuarantineState, TriggerConfig, UserId,
};
use warden_error::WardenResult;
use warden_social::ChatPlatform;
use warden_store::MembershipStore;

/// Result of an explicit quarantine trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuarantineOutcome {
    /// User entered quarantine in `group`
    Quarantined {
        /// New home group
        group: ChatId,
        /// Groups the user was removed from
        evicted: usize,
    },
    /// Quarantine moved from `from` to `to`
    Transferred {
        /// Previous home group
        from: ChatId,
        /// New home group
        to: ChatId,
        /// Groups the user was removed from, `from` included
        evicted: usize,
    },
    /// Already quarantined in this group; nothing changed
    AlreadyQuarantined {
        /// Unchanged home group
        group: ChatId,
    },
    /// The store failed; nothing changed
    Unavailable,
}

impl QuarantineOutcome {
    /// Groups the user was removed from.
    pub fn evicted(&self) -> usize {
        match self {
            Self::Quarantined { evicted, .. } | Self::Transferred { evicted, .. } => *evicted,
            Self::AlreadyQuarantined { .. } | Self::Unavailable => 0,
        }
    }
}

/// Result of a new member arriving in a group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinOutcome {
    /// Not quarantined, and the group has no trigger
    Ignored,
    /// Quarantined in this very group already
    AlreadyHome,
    /// Quarantined elsewhere; removed from the group they joined
    EvictedFromJoined {
        /// The user's home group
        home: ChatId,
        /// Whether the removal succeeded
        evicted: bool,
    },
    /// Joined a quarantine group and entered quarantine there
    Quarantined(QuarantineOutcome),
}

/// Result of an explicit release.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReleaseOutcome {
    /// Quarantine ended
    Released {
        /// Home group at the time of release
        group: ChatId,
        /// Pending follow-ups cancelled
        cancelled_follow_ups: usize,
    },
    /// No active quarantine; nothing changed
    NotQuarantined,
    /// The store failed; nothing changed
    Unavailable,
}

/// Drives each user's quarantine lifecycle.
///
/// States are `Free`, `Quarantined(group)` and `Released`. Every store
/// mutation is followed by invalidating the user's cache entry. Store and
/// platform failures are logged and turned into neutral outcomes instead of
/// errors.
///
/// Group triggers are cached per group, absence included, with the same TTL
/// as quarantine lookups. Whoever writes a trigger must call
/// [`QuarantineService::invalidate_trigger`].
#[derive(Clone)]
pub struct QuarantineService {
    store: Arc<dyn MembershipStore>,
    cache: TtlCache<UserId, QuarantineRecord>,
    triggers: TtlCache<ChatId, Option<TriggerConfig>>,
    evictor: GroupEvictor,
    dispatcher: FollowUpDispatcher,
    metrics: ModerationMetrics,
}

impl QuarantineService {
    /// Wire the state machine to its collaborators.
    ///
    /// The evictor and dispatcher are built here and share `metrics`.
    pub fn new(
        store: Arc<dyn MembershipStore>,
        platform: Arc<dyn ChatPlatform>,
        cache: TtlCache<UserId, QuarantineRecord>,
        config: &ModerationConfig,
    ) -> Self {
        let metrics = ModerationMetrics::new();
        let evictor = GroupEvictor::new(
            Arc::clone(&store),
            Arc::clone(&platform),
            config.restore_delay(),
            metrics.clone(),
        );
        let dispatcher = FollowUpDispatcher::new(platform, metrics.clone());
        let triggers = TtlCache::new("trigger", cache.config().clone());
        Self {
            store,
            cache,
            triggers,
            evictor,
            dispatcher,
            metrics,
        }
    }

    /// Quarantine lookup cache.
    pub fn cache(&self) -> &TtlCache<UserId, QuarantineRecord> {
        &self.cache
    }

    /// Per-group trigger cache.
    pub fn trigger_cache(&self) -> &TtlCache<ChatId, Option<TriggerConfig>> {
        &self.triggers
    }

    /// Eviction orchestrator.
    pub fn evictor(&self) -> &GroupEvictor {
        &self.evictor
    }

    /// Follow-up dispatcher.
    pub fn dispatcher(&self) -> &FollowUpDispatcher {
        &self.dispatcher
    }

    /// Shared metrics.
    pub fn metrics(&self) -> &ModerationMetrics {
        &self.metrics
    }

    /// Active quarantine of `user`, if any.
    ///
    /// Cache first, then the store. Only active quarantines are cached;
    /// a miss always reaches the store so releases show up at once. A store
    /// failure is reported as "not quarantined".
    #[instrument(skip(self))]
    pub async fn check_quarantine(&self, user: UserId) -> Option<QuarantineRecord> {
        if let Some(record) = self.cache.get(&user) {
            debug!("Quarantine cache hit");
            return Some(record);
        }

        match self.store.get_quarantine(user).await {
            Ok(Some(record)) if *record.is_quarantined() => {
                self.cache.set(user, record.clone());
                Some(record)
            }
            Ok(_) => None,
            Err(e) => {
                self.metrics.record_store_error();
                error!(error = %e, "Quarantine lookup failed; treating as not quarantined");
                None
            }
        }
    }

    /// Drop the cached record for `user`.
    pub fn invalidate(&self, user: UserId) {
        self.cache.delete(&user);
    }

    /// Trigger configured for `group`, cache first.
    ///
    /// A missing trigger is cached too, since most groups have none. Store
    /// failures are returned and not cached.
    #[instrument(skip(self))]
    pub async fn trigger(&self, group: ChatId) -> WardenResult<Option<TriggerConfig>> {
        if let Some(trigger) = self.triggers.get(&group) {
            debug!("Trigger cache hit");
            return Ok(trigger);
        }
        let trigger = self.store.get_trigger(group).await?;
        self.triggers.set(group, trigger.clone());
        Ok(trigger)
    }

    /// Drop the cached trigger for `group`.
    pub fn invalidate_trigger(&self, group: ChatId) {
        self.triggers.delete(&group);
    }

    /// Explicit quarantine marker for `user` in `group`.
    ///
    /// - Free or released: quarantine in `group` and evict from all others.
    /// - Quarantined in `group`: no change, no eviction.
    /// - Quarantined elsewhere: transfer to `group` and evict from all others,
    ///   the previous home included.
    ///
    /// On entry or transfer the group's follow-up, if configured, is
    /// scheduled, replying to `reply_to`.
    #[instrument(skip(self, display), fields(outcome))]
    pub async fn quarantine(
        &self,
        user: UserId,
        display: DisplayName,
        group: ChatId,
        reply_to: Option<MessageId>,
    ) -> QuarantineOutcome {
        let existing = match self.store.get_quarantine(user).await {
            Ok(existing) => existing,
            Err(e) => {
                self.metrics.record_store_error();
                error!(error = %e, "Could not load quarantine record");
                return QuarantineOutcome::Unavailable;
            }
        };

        let previous = QuarantineState::of(existing.as_ref());
        if previous == QuarantineState::Quarantined(group) {
            debug!("Already quarantined here");
            return QuarantineOutcome::AlreadyQuarantined { group };
        }

        let record = match existing {
            Some(mut record) => {
                record.transfer_to(group);
                record.set_display(display);
                record
            }
            None => QuarantineRecord::new(user, group, display),
        };

        if let Err(e) = self.store.upsert_quarantine(&record).await {
            self.metrics.record_store_error();
            error!(error = %e, "Could not persist quarantine; nothing evicted");
            return QuarantineOutcome::Unavailable;
        }
        self.invalidate(user);

        self.schedule_trigger_follow_up(user, group, reply_to).await;

        let evicted = self.evictor.evict_from_all_except(user, group).await;
        let outcome = match previous.home_group() {
            Some(from) => {
                self.metrics.record_transfer();
                info!(%from, to = %group, evicted, "Quarantine transferred");
                QuarantineOutcome::Transferred {
                    from,
                    to: group,
                    evicted,
                }
            }
            None => {
                self.metrics.record_quarantine();
                info!(evicted, "User quarantined");
                QuarantineOutcome::Quarantined { group, evicted }
            }
        };
        tracing::Span::current().record("outcome", tracing::field::debug(&outcome));
        outcome
    }

    /// A new member `user` arrived in `group`.
    ///
    /// A user quarantined elsewhere is removed from `group` and keeps their
    /// home group. A free user joining a group with a trigger is quarantined
    /// there. Anything else is ignored.
    #[instrument(skip(self, display))]
    pub async fn handle_join(
        &self,
        user: UserId,
        display: DisplayName,
        group: ChatId,
        join_message: Option<MessageId>,
    ) -> JoinOutcome {
        if let Some(record) = self.check_quarantine(user).await {
            let home = *record.current_group_id();
            if home == group {
                debug!("Rejoined home group");
                return JoinOutcome::AlreadyHome;
            }

            let evicted = self.evictor.evict_from_one(group, user).await;
            self.metrics.record_join_eviction();
            warn!(%home, evicted, "Quarantined user joined another group");
            return JoinOutcome::EvictedFromJoined { home, evicted };
        }

        match self.trigger(group).await {
            Ok(Some(_)) => {
                let outcome = self.quarantine(user, display, group, join_message).await;
                JoinOutcome::Quarantined(outcome)
            }
            Ok(None) => JoinOutcome::Ignored,
            Err(e) => {
                self.metrics.record_store_error();
                error!(error = %e, "Could not load trigger; join ignored");
                JoinOutcome::Ignored
            }
        }
    }

    /// Explicit release marker for `user`.
    ///
    /// Ends an active quarantine and cancels the user's pending follow-ups.
    /// Without an active quarantine nothing is written.
    #[instrument(skip(self))]
    pub async fn release(&self, user: UserId) -> ReleaseOutcome {
        let mut record = match self.store.get_quarantine(user).await {
            Ok(Some(record)) if *record.is_quarantined() => record,
            Ok(_) => {
                debug!("Release requested for user not in quarantine");
                return ReleaseOutcome::NotQuarantined;
            }
            Err(e) => {
                self.metrics.record_store_error();
                error!(error = %e, "Could not load quarantine record");
                return ReleaseOutcome::Unavailable;
            }
        };

        let group = *record.current_group_id();
        record.release();
        if let Err(e) = self.store.upsert_quarantine(&record).await {
            self.metrics.record_store_error();
            error!(error = %e, "Could not persist release");
            return ReleaseOutcome::Unavailable;
        }
        self.invalidate(user);

        let cancelled_follow_ups = self.dispatcher.cancel_user(user);
        self.metrics.record_release();
        info!(%group, cancelled_follow_ups, "Quarantine released");
        ReleaseOutcome::Released {
            group,
            cancelled_follow_ups,
        }
    }

    async fn schedule_trigger_follow_up(
        &self,
        user: UserId,
        group: ChatId,
        reply_to: Option<MessageId>,
    ) {
        let trigger: TriggerConfig = match self.trigger(group).await {
            Ok(Some(trigger)) => trigger,
            Ok(None) => return,
            Err(e) => {
                self.metrics.record_store_error();
                warn!(error = %e, "Could not load trigger; no follow-up");
                return;
            }
        };

        self.dispatcher.schedule_follow_up(
            FollowUpKey::new(user, group, trigger.name().clone()),
            trigger.follow_up(),
            reply_to,
            Duration::from_secs(u64::from(*trigger.delay_seconds())),
        );
    }
}
