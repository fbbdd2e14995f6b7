//! Telegram Bot API integration.

mod client;
mod types;

pub use client::{TELEGRAM_API_URL, TelegramClient};
pub use types::{
    ApiResponse, Chat, ChatMember, ChatMemberUpdated, Message, ResponseParameters, Update, User,
};
