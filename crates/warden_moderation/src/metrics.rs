//! Counters for moderation activity.

use serde::Serialize;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// Metrics collector for moderation operations.
///
/// Cheap to clone; clones share counters.
#[derive(Debug, Clone, Default)]
pub struct ModerationMetrics {
    inner: Arc<MetricsInner>,
}

#[derive(Debug, Default)]
struct MetricsInner {
    // State machine transitions
    quarantines: AtomicU64,
    transfers: AtomicU64,
    releases: AtomicU64,
    join_evictions: AtomicU64,

    // Eviction attempts
    evictions_succeeded: AtomicU64,
    evictions_failed: AtomicU64,
    restorations_failed: AtomicU64,

    // Follow-ups
    follow_ups_scheduled: AtomicU64,
    follow_ups_sent: AtomicU64,
    follow_ups_fallback: AtomicU64,
    follow_ups_failed: AtomicU64,
    follow_ups_cancelled: AtomicU64,

    store_errors: AtomicU64,
}

macro_rules! counters {
    ($($record:ident / $get:ident => $field:ident),* $(,)?) => {
        impl ModerationMetrics {
            $(
                #[doc = concat!("Increments `", stringify!($field), "`.")]
                pub fn $record(&self) {
                    self.inner.$field.fetch_add(1, Ordering::Relaxed);
                }

                #[doc = concat!("Current `", stringify!($field), "`.")]
                pub fn $get(&self) -> u64 {
                    self.inner.$field.load(Ordering::Relaxed)
                }
            )*
        }
    };
}

counters! {
    record_quarantine / quarantines => quarantines,
    record_transfer / transfers => transfers,
    record_release / releases => releases,
    record_join_eviction / join_evictions => join_evictions,
    record_eviction_success / evictions_succeeded => evictions_succeeded,
    record_eviction_failure / evictions_failed => evictions_failed,
    record_restoration_failure / restorations_failed => restorations_failed,
    record_follow_up_scheduled / follow_ups_scheduled => follow_ups_scheduled,
    record_follow_up_sent / follow_ups_sent => follow_ups_sent,
    record_follow_up_fallback / follow_ups_fallback => follow_ups_fallback,
    record_follow_up_failure / follow_ups_failed => follow_ups_failed,
    record_follow_up_cancelled / follow_ups_cancelled => follow_ups_cancelled,
    record_store_error / store_errors => store_errors,
}

impl ModerationMetrics {
    /// Creates a new metrics collector.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a serializable snapshot of current metrics.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            quarantines: self.quarantines(),
            transfers: self.transfers(),
            releases: self.releases(),
            join_evictions: self.join_evictions(),
            evictions: EvictionSnapshot {
                succeeded: self.evictions_succeeded(),
                failed: self.evictions_failed(),
                restorations_failed: self.restorations_failed(),
            },
            follow_ups: FollowUpSnapshot {
                scheduled: self.follow_ups_scheduled(),
                sent: self.follow_ups_sent(),
                fallback: self.follow_ups_fallback(),
                failed: self.follow_ups_failed(),
                cancelled: self.follow_ups_cancelled(),
            },
            store_errors: self.store_errors(),
        }
    }
}

/// Serializable snapshot of all moderation metrics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    /// Users put into quarantine (new or re-triggered)
    pub quarantines: u64,
    /// Quarantines moved to another group
    pub transfers: u64,
    /// Quarantines released
    pub releases: u64,
    /// Quarantined users removed from a group they joined
    pub join_evictions: u64,
    /// Per-group eviction attempts
    pub evictions: EvictionSnapshot,
    /// Delayed follow-up messages
    pub follow_ups: FollowUpSnapshot,
    /// Store calls that failed
    pub store_errors: u64,
}

/// Eviction attempt counters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EvictionSnapshot {
    /// Attempts that removed the member
    pub succeeded: u64,
    /// Attempts that did not
    pub failed: u64,
    /// Removals whose later restoration failed
    pub restorations_failed: u64,
}

/// Follow-up message counters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FollowUpSnapshot {
    /// Timers started
    pub scheduled: u64,
    /// Sent with their original formatting
    pub sent: u64,
    /// Sent through the HTML fallback
    pub fallback: u64,
    /// Not sent at all
    pub failed: u64,
    /// Cancelled or replaced before firing
    pub cancelled: u64,
}
