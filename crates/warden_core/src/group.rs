//! Managed group records.

use crate::ChatId;
use chrono::{DateTime, Utc};
use derive_getters::Getters;
use serde::{Deserialize, Serialize};

/// Chat type as reported by the platform.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    Serialize,
    Deserialize,
    strum::EnumString,
    strum::Display,
    strum::AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum GroupKind {
    /// One-to-one chat
    Private,
    /// Basic group
    Group,
    /// Supergroup
    #[default]
    Supergroup,
    /// Broadcast channel
    Channel,
}

/// A group the bot has administrative visibility into.
///
/// Created or refreshed whenever the bot's own membership changes, or when
/// an administrator registers the group explicitly.
///
/// # Examples
///
/// ```
/// use warden_core::{ChatId, GroupKind, GroupRecord};
///
/// let group = GroupRecord::new(ChatId(-100), "Lobby", GroupKind::Supergroup, true);
/// assert!(*group.is_bot_admin());
/// assert_eq!(group.title(), "Lobby");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Getters)]
pub struct GroupRecord {
    chat_id: ChatId,
    title: String,
    #[serde(rename = "type")]
    kind: GroupKind,
    is_bot_admin: bool,
    last_updated: DateTime<Utc>,
}

impl GroupRecord {
    /// Record stamped with the current time.
    pub fn new(chat_id: ChatId, title: impl Into<String>, kind: GroupKind, is_bot_admin: bool) -> Self {
        Self {
            chat_id,
            title: title.into(),
            kind,
            is_bot_admin,
            last_updated: Utc::now(),
        }
    }
}
