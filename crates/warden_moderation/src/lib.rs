//! Quarantine moderation engine for the warden bot.
//!
//! When a user trips a quarantine marker, the engine records the quarantine
//! against one home group, removes the user from every other managed group
//! concurrently, and schedules the group's formatted follow-up message.
//!
//! # Components
//!
//! - [`QuarantineService`] - per-user state machine, cache-first lookups
//! - [`GroupEvictor`] - concurrent per-group removal with partial-failure counting
//! - [`FollowUpDispatcher`] - keyed, detached one-shot timers with HTML fallback
//! - [`ModerationMetrics`] - counters for all of the above
//!
//! # Failure policy
//!
//! Store and platform failures never escape as errors. They are logged,
//! counted, and turned into neutral outcomes such as
//! [`QuarantineOutcome::Unavailable`] or an eviction count of zero.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod dispatcher;
mod evictor;
mod metrics;
mod service;

pub use config::{ModerationConfig, ModerationConfigBuilder};
pub use dispatcher::{
    DeliveryOutcome, FollowUpDispatcher, FollowUpKey, MIN_FOLLOW_UP_DELAY, deliver,
};
pub use evictor::{EvictionOutcome, GroupEvictor};
pub use metrics::{EvictionSnapshot, FollowUpSnapshot, MetricsSnapshot, ModerationMetrics};
pub use service::{JoinOutcome, QuarantineOutcome, QuarantineService, ReleaseOutcome};
