//! Core data types for the warden moderation bot.
//!
//! This crate provides the records shared by the store, the platform client
//! and the moderation engine, plus the rich-text entity codec that lets
//! formatted messages survive storage and delayed replay.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod codec;
mod entity;
mod group;
mod html;
mod ids;
mod quarantine;
mod trigger;

pub use codec::{EncodedMessage, encode, utf16_len};
pub use entity::{FormattingSpan, FormattingSpanBuilder, RawEntity, RawUser, SpanKind, UserRef};
pub use group::{GroupKind, GroupRecord};
pub use html::{escape_html, render_html};
pub use ids::{ChatId, MessageId, UserId};
pub use quarantine::{DisplayName, QuarantineRecord, QuarantineState};
pub use trigger::{TriggerConfig, TriggerConfigBuilder};
