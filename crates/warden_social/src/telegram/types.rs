//! Bot API payload types.
//!
//! Only the fields the bot reads are modelled; serde ignores the rest.

use crate::MembershipKind;
use serde::{Deserialize, Serialize};
use warden_core::{ChatId, DisplayName, GroupKind, MessageId, RawEntity, UserId};

/// Envelope around every Bot API response.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiResponse<T> {
    /// Whether the call succeeded
    pub ok: bool,
    /// Payload on success
    pub result: Option<T>,
    /// Error code on failure
    #[serde(default)]
    pub error_code: Option<i64>,
    /// Error description on failure
    #[serde(default)]
    pub description: Option<String>,
    /// Extra failure details
    #[serde(default)]
    pub parameters: Option<ResponseParameters>,
}

/// Extra information attached to some failures.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ResponseParameters {
    /// Seconds to wait before retrying after a flood limit
    #[serde(default)]
    pub retry_after: Option<u64>,
    /// New id of a group migrated to a supergroup
    #[serde(default)]
    pub migrate_to_chat_id: Option<i64>,
}

/// A platform user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// User id
    pub id: UserId,
    /// Whether the user is a bot
    #[serde(default)]
    pub is_bot: bool,
    /// First name
    pub first_name: String,
    /// Last name
    #[serde(default)]
    pub last_name: Option<String>,
    /// Username without the `@`
    #[serde(default)]
    pub username: Option<String>,
}

impl User {
    /// Name fields as stored on quarantine records.
    pub fn display_name(&self) -> DisplayName {
        DisplayName {
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
            username: self.username.clone(),
        }
    }
}

/// A chat.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chat {
    /// Chat id
    pub id: ChatId,
    /// Chat type
    #[serde(rename = "type")]
    pub kind: GroupKind,
    /// Title, for groups and channels
    #[serde(default)]
    pub title: Option<String>,
}

impl Chat {
    /// Whether the chat is a group or supergroup.
    pub fn is_group(&self) -> bool {
        matches!(self.kind, GroupKind::Group | GroupKind::Supergroup)
    }
}

/// A message.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Message {
    /// Id within the chat
    pub message_id: MessageId,
    /// Sender; absent for channel posts
    #[serde(default)]
    pub from: Option<User>,
    /// Chat the message belongs to
    pub chat: Chat,
    /// Unix time the message was sent
    pub date: i64,
    /// Text, for text messages
    #[serde(default)]
    pub text: Option<String>,
    /// Formatting of `text`
    #[serde(default)]
    pub entities: Option<Vec<RawEntity>>,
    /// Caption, for media messages
    #[serde(default)]
    pub caption: Option<String>,
    /// Formatting of `caption`
    #[serde(default)]
    pub caption_entities: Option<Vec<RawEntity>>,
    /// Users who just joined
    #[serde(default)]
    pub new_chat_members: Option<Vec<User>>,
    /// Message this one replies to
    #[serde(default)]
    pub reply_to_message: Option<Box<Message>>,
}

impl Message {
    /// Text or caption, with the entities that format it.
    pub fn content(&self) -> Option<(&str, Option<&[RawEntity]>)> {
        if let Some(text) = &self.text {
            return Some((text, self.entities.as_deref()));
        }
        self.caption
            .as_deref()
            .map(|caption| (caption, self.caption_entities.as_deref()))
    }
}

/// Membership entry of one user in one chat.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ChatMember {
    /// Membership status
    pub status: MembershipKind,
    /// The member
    pub user: User,
    /// Restrict right, present for administrators
    #[serde(default)]
    pub can_restrict_members: bool,
}

/// A change in a chat member's status.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ChatMemberUpdated {
    /// Chat where the change happened
    pub chat: Chat,
    /// Who made the change
    pub from: User,
    /// Unix time of the change
    pub date: i64,
    /// Status before
    pub old_chat_member: ChatMember,
    /// Status after
    pub new_chat_member: ChatMember,
}

/// One incoming update.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Update {
    /// Monotonic update id
    pub update_id: i64,
    /// New message
    #[serde(default)]
    pub message: Option<Message>,
    /// The bot's own membership changed
    #[serde(default)]
    pub my_chat_member: Option<ChatMemberUpdated>,
}
