//! Chat platform abstraction.
//!
//! The moderation engine talks to the chat platform only through
//! [`ChatPlatform`]. Implementations handle transport, authentication and
//! error mapping. A missing right is reported as
//! [`PlatformErrorKind::PermissionDenied`](warden_error::PlatformErrorKind::PermissionDenied)
//! so callers can treat it as an expected per-group outcome.

use async_trait::async_trait;
use derive_getters::Getters;
use serde::{Deserialize, Serialize};
use warden_core::{ChatId, FormattingSpan, MessageId, UserId};
use warden_error::WardenResult;

/// A user's membership status in a chat.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::EnumString,
    strum::Display,
    strum::AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum MembershipKind {
    /// Chat owner
    Creator,
    /// Administrator
    Administrator,
    /// Regular member
    Member,
    /// Member with restrictions
    Restricted,
    /// Not a member
    Left,
    /// Banned
    Kicked,
}

impl MembershipKind {
    /// Whether the user is currently in the chat.
    pub fn is_present(&self) -> bool {
        matches!(
            self,
            Self::Creator | Self::Administrator | Self::Member | Self::Restricted
        )
    }

    /// Whether the user has any administrative role.
    pub fn is_admin(&self) -> bool {
        matches!(self, Self::Creator | Self::Administrator)
    }
}

/// Membership status plus the one right eviction depends on.
///
/// # Examples
///
/// ```
/// use warden_social::{MemberStatus, MembershipKind};
///
/// assert!(MemberStatus::new(MembershipKind::Administrator, true).can_evict());
/// assert!(!MemberStatus::new(MembershipKind::Administrator, false).can_evict());
/// assert!(MemberStatus::new(MembershipKind::Creator, false).can_evict());
/// assert!(!MemberStatus::new(MembershipKind::Member, true).can_evict());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Getters)]
pub struct MemberStatus {
    status: MembershipKind,
    can_restrict_members: bool,
}

impl MemberStatus {
    /// Create a status.
    pub fn new(status: MembershipKind, can_restrict_members: bool) -> Self {
        Self {
            status,
            can_restrict_members,
        }
    }

    /// Whether this member may remove other members.
    ///
    /// Creators hold every right implicitly; administrators need the
    /// restrict-members right.
    pub fn can_evict(&self) -> bool {
        match self.status {
            MembershipKind::Creator => true,
            MembershipKind::Administrator => self.can_restrict_members,
            _ => false,
        }
    }
}

/// Markup dialect for messages sent without an explicit span list.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display, strum::AsRefStr,
)]
pub enum ParseMode {
    /// Telegram HTML subset
    #[serde(rename = "HTML")]
    #[strum(serialize = "HTML")]
    Html,
    /// MarkdownV2
    #[serde(rename = "MarkdownV2")]
    #[strum(serialize = "MarkdownV2")]
    MarkdownV2,
}

/// Options for [`ChatPlatform::send_message`].
///
/// Explicit `entities` and a `parse_mode` are mutually exclusive on the
/// platform; when both are set the entities win.
///
/// # Examples
///
/// ```
/// use warden_social::{ParseMode, SendOptions};
/// use warden_core::MessageId;
///
/// let options = SendOptions::default()
///     .with_parse_mode(ParseMode::Html)
///     .with_reply_to(MessageId(12));
/// assert_eq!(options.reply_to, Some(MessageId(12)));
/// assert!(options.entities.is_none());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, derive_setters::Setters)]
#[setters(prefix = "with_", strip_option)]
pub struct SendOptions {
    /// Formatting spans, in the text's UTF-16 offsets
    pub entities: Option<Vec<FormattingSpan>>,
    /// Markup dialect of the text
    pub parse_mode: Option<ParseMode>,
    /// Message to reply to
    pub reply_to: Option<MessageId>,
}

/// Chat platform operations used by the moderation engine.
///
/// # Tracing
///
/// Implementations should instrument each call with the chat and user ids
/// and log API failures with their platform error description.
#[async_trait]
pub trait ChatPlatform: Send + Sync {
    /// The bot's own user id.
    fn bot_id(&self) -> UserId;

    /// Membership status of `user` in `chat`.
    async fn get_membership_status(&self, chat: ChatId, user: UserId)
    -> WardenResult<MemberStatus>;

    /// Remove `user` from `chat`.
    async fn remove_member(&self, chat: ChatId, user: UserId) -> WardenResult<()>;

    /// Lift the removal so `user` may rejoin `chat`. Does not re-add them.
    async fn restore_member(&self, chat: ChatId, user: UserId) -> WardenResult<()>;

    /// Send `text` to `chat`, returning the new message's id.
    async fn send_message(
        &self,
        chat: ChatId,
        text: &str,
        options: &SendOptions,
    ) -> WardenResult<MessageId>;
}
