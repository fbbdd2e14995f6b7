//! Delayed follow-up messages with preserved formatting.

use crate::ModerationMetrics;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, instrument, warn};
use warden_core::{ChatId, EncodedMessage, MessageId, UserId, render_html};
use warden_social::{ChatPlatform, ParseMode, SendOptions};

/// Shortest delay a follow-up may be scheduled with.
pub const MIN_FOLLOW_UP_DELAY: Duration = Duration::from_secs(1);

/// Identity of a pending follow-up.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FollowUpKey {
    /// User the follow-up concerns
    pub user: UserId,
    /// Group the follow-up is sent to
    pub group: ChatId,
    /// Name of the trigger that scheduled it
    pub trigger: String,
}

impl FollowUpKey {
    /// Create a key.
    pub fn new(user: UserId, group: ChatId, trigger: impl Into<String>) -> Self {
        Self {
            user,
            group,
            trigger: trigger.into(),
        }
    }
}

/// How a follow-up send ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryOutcome {
    /// Sent with the original span list
    Sent,
    /// Sent as HTML after the span list was rejected
    Fallback,
    /// Neither attempt succeeded
    Failed,
}

struct Pending {
    id: u64,
    handle: JoinHandle<()>,
}

/// Schedules one-shot follow-up messages.
///
/// Each follow-up runs on its own detached task, so the caller returns as
/// soon as the timer is started. Timers live only in memory and are lost on
/// restart. Scheduling again under the same [`FollowUpKey`] replaces the
/// pending timer.
#[derive(Clone)]
pub struct FollowUpDispatcher {
    platform: Arc<dyn ChatPlatform>,
    pending: Arc<Mutex<HashMap<FollowUpKey, Pending>>>,
    next_id: Arc<AtomicU64>,
    metrics: ModerationMetrics,
}

impl FollowUpDispatcher {
    /// Create a dispatcher sending through `platform`.
    pub fn new(platform: Arc<dyn ChatPlatform>, metrics: ModerationMetrics) -> Self {
        Self {
            platform,
            pending: Arc::new(Mutex::new(HashMap::new())),
            next_id: Arc::new(AtomicU64::new(0)),
            metrics,
        }
    }

    /// Send `message` to `key.group` after `delay`.
    ///
    /// Delays under [`MIN_FOLLOW_UP_DELAY`] are raised to it. The message's
    /// spans are sent exactly as stored.
    #[instrument(skip(self, message), fields(user = %key.user, group = %key.group, trigger = %key.trigger))]
    pub fn schedule_follow_up(
        &self,
        key: FollowUpKey,
        message: EncodedMessage,
        reply_to: Option<MessageId>,
        delay: Duration,
    ) {
        let delay = delay.max(MIN_FOLLOW_UP_DELAY);
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);

        // Held across the spawn so the task cannot deregister before it is
        // registered.
        let mut pending = self.pending.lock();

        let platform = Arc::clone(&self.platform);
        let registry = Arc::clone(&self.pending);
        let metrics = self.metrics.clone();
        let task_key = key.clone();
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            deliver(platform.as_ref(), &metrics, task_key.group, &message, reply_to).await;

            let mut pending = registry.lock();
            if pending.get(&task_key).is_some_and(|p| p.id == id) {
                pending.remove(&task_key);
            }
        });

        if let Some(old) = pending.insert(key, Pending { id, handle }) {
            old.handle.abort();
            self.metrics.record_follow_up_cancelled();
            debug!("Replaced pending follow-up");
        }
        self.metrics.record_follow_up_scheduled();
        info!(?delay, "Follow-up scheduled");
    }

    /// Cancel one pending follow-up. Returns whether one was pending.
    pub fn cancel(&self, key: &FollowUpKey) -> bool {
        let removed = self.pending.lock().remove(key);
        match removed {
            Some(p) => {
                p.handle.abort();
                self.metrics.record_follow_up_cancelled();
                debug!(user = %key.user, group = %key.group, "Follow-up cancelled");
                true
            }
            None => false,
        }
    }

    /// Cancel every pending follow-up for `user`. Returns how many.
    pub fn cancel_user(&self, user: UserId) -> usize {
        let mut pending = self.pending.lock();
        let keys: Vec<FollowUpKey> = pending.keys().filter(|k| k.user == user).cloned().collect();
        for key in &keys {
            if let Some(p) = pending.remove(key) {
                p.handle.abort();
                self.metrics.record_follow_up_cancelled();
            }
        }
        if !keys.is_empty() {
            debug!(%user, count = keys.len(), "Cancelled user's follow-ups");
        }
        keys.len()
    }

    /// Abort every pending follow-up.
    pub fn cancel_all(&self) -> usize {
        let drained: Vec<Pending> = self.pending.lock().drain().map(|(_, p)| p).collect();
        for p in &drained {
            p.handle.abort();
        }
        drained.len()
    }

    /// Number of follow-ups waiting to fire.
    pub fn pending_count(&self) -> usize {
        self.pending.lock().len()
    }

    /// Whether a follow-up is pending under `key`.
    pub fn is_pending(&self, key: &FollowUpKey) -> bool {
        self.pending.lock().contains_key(key)
    }
}

/// Send a stored message, falling back to HTML if its spans are rejected.
///
/// Failures are logged and counted, never returned.
pub async fn deliver(
    platform: &dyn ChatPlatform,
    metrics: &ModerationMetrics,
    chat: ChatId,
    message: &EncodedMessage,
    reply_to: Option<MessageId>,
) -> DeliveryOutcome {
    let mut options = SendOptions {
        reply_to,
        ..SendOptions::default()
    };
    if !message.entities.is_empty() {
        options.entities = Some(message.entities.clone());
    }

    let first = match platform.send_message(chat, &message.text, &options).await {
        Ok(id) => {
            metrics.record_follow_up_sent();
            debug!(%chat, message_id = %id, "Follow-up sent");
            return DeliveryOutcome::Sent;
        }
        Err(e) => e,
    };
    warn!(%chat, error = %first, "Follow-up rejected; retrying as HTML");

    let fallback = SendOptions {
        entities: None,
        parse_mode: Some(ParseMode::Html),
        reply_to,
    };
    let html = render_html(&message.text, &message.entities);
    match platform.send_message(chat, &html, &fallback).await {
        Ok(id) => {
            metrics.record_follow_up_fallback();
            info!(%chat, message_id = %id, "Follow-up sent through HTML fallback");
            DeliveryOutcome::Fallback
        }
        Err(e) => {
            metrics.record_follow_up_failure();
            error!(%chat, error = %e, "Follow-up dropped after fallback failed");
            DeliveryOutcome::Failed
        }
    }
}
