//! Warden: quarantine moderation for Telegram group networks.
//!
//! When an administrator marks a member, or the member joins a quarantine
//! group, warden records the quarantine, removes the member from every other
//! managed group, and later posts the group's formatted follow-up message.
//!
//! This crate is the facade over the workspace:
//! - [`warden_moderation`]: the quarantine state machine, evictor and dispatcher
//! - [`warden_bot`]: configuration, update routing, polling, health API
//! - [`warden_social`]: the chat platform abstraction and Telegram client
//! - [`warden_store`]: membership storage
//! - [`warden_cache`]: TTL caches
//! - [`warden_core`]: records, identifiers and the entity codec
//!
//! The `warden` binary is built from [`cli`] and [`observability`].

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod cli;
pub mod observability;

pub use warden_bot::{BotConfig, BotServer, EventRouter, ServiceContext};
pub use warden_cache::{TtlCache, TtlCacheConfig};
pub use warden_core::{
    ChatId, DisplayName, EncodedMessage, FormattingSpan, GroupRecord, MessageId,
    QuarantineRecord, TriggerConfig, UserId, encode, render_html,
};
pub use warden_error::{WardenError, WardenErrorKind, WardenResult};
pub use warden_moderation::{
    FollowUpDispatcher, GroupEvictor, ModerationConfig, QuarantineOutcome, QuarantineService,
};
pub use warden_social::{ChatPlatform, TelegramClient};
pub use warden_store::{FileStore, InMemoryStore, MembershipStore};
