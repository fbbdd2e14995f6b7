//! Chat platform integration for the warden moderation bot.
//!
//! # Platform abstraction
//!
//! - [`ChatPlatform`] - membership lookup, removal, restoration and sending
//! - [`MemberStatus`] - a member's status plus the restrict right
//! - [`SendOptions`] - explicit spans, markup dialect and reply target
//!
//! # Telegram
//!
//! [`TelegramClient`] implements [`ChatPlatform`] over the Bot API with
//! `reqwest`, and also exposes the long-poll `getUpdates` call together with
//! the [`Update`] payload types the bot consumes.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod platform;
mod telegram;

pub use platform::{ChatPlatform, MemberStatus, MembershipKind, ParseMode, SendOptions};
pub use telegram::{
    ApiResponse, Chat, ChatMember, ChatMemberUpdated, Message, ResponseParameters,
    TELEGRAM_API_URL, TelegramClient, Update, User,
};
