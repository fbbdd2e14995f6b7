//! Bot runtime for the warden quarantine moderator.
//!
//! Wires the moderation engine to the chat platform:
//! - [`BotConfig`]: layered configuration (bundled, user, explicit, env)
//! - [`ServiceContext`]: store, platform, quarantine service and caches
//! - [`EventRouter`]: joins and admin commands into quarantine operations
//! - [`Poller`]: long-poll loop with backoff and shutdown
//! - [`create_router`]: `/health` and `/metrics` over axum
//! - [`BotServer`]: start-up and shutdown of all of the above

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod api;
mod config;
mod context;
mod poller;
mod router;
mod server;

pub use api::{create_router, serve};
pub use config::{
    BotConfig, CacheSection, HttpSection, LogFormat, LoggingSection, StoreSection,
    TelegramSection,
};
pub use context::{HealthReport, ServiceContext};
pub use poller::{POLL_BACKOFF, Poller, UpdateSource};
pub use router::{
    DEFAULT_TRIGGER_NAME, EventRouter, REGISTER_COMMAND, RouteOutcome, SET_TRIGGER_COMMAND,
};
pub use server::BotServer;
