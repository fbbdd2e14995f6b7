//! Membership store trait definition.

use warden_core::{ChatId, GroupRecord, QuarantineRecord, TriggerConfig, UserId};
use warden_error::WardenResult;

/// Which managed groups a query returns.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, strum::Display, strum::EnumString,
)]
#[strum(serialize_all = "snake_case")]
pub enum GroupFilter {
    /// Every known group
    #[default]
    All,
    /// Groups where the bot holds administrative rights
    BotAdmin,
}

impl GroupFilter {
    /// Whether `group` passes the filter.
    pub fn matches(&self, group: &GroupRecord) -> bool {
        match self {
            Self::All => true,
            Self::BotAdmin => *group.is_bot_admin(),
        }
    }
}

/// Trait for persisted group, quarantine and trigger records.
///
/// A missing record is `Ok(None)`, never an error. Errors mean the store
/// itself failed; callers in the moderation layer log them and degrade.
/// Implementations provide their own concurrency control.
#[async_trait::async_trait]
pub trait MembershipStore: Send + Sync {
    /// Quarantine record for a user.
    async fn get_quarantine(&self, user: UserId) -> WardenResult<Option<QuarantineRecord>>;

    /// Create or replace the record for `record.user_id()`.
    ///
    /// Quarantine records are never deleted, only marked released.
    async fn upsert_quarantine(&self, record: &QuarantineRecord) -> WardenResult<()>;

    /// Record for a managed group.
    async fn get_group(&self, chat: ChatId) -> WardenResult<Option<GroupRecord>>;

    /// Create or replace the record for `record.chat_id()`.
    async fn upsert_group(&self, record: &GroupRecord) -> WardenResult<()>;

    /// Forget a group. Returns whether a record existed.
    async fn delete_group(&self, chat: ChatId) -> WardenResult<bool>;

    /// Managed groups passing `filter`, ordered by chat id.
    async fn query_groups(&self, filter: GroupFilter) -> WardenResult<Vec<GroupRecord>>;

    /// Quarantine trigger for a group.
    async fn get_trigger(&self, chat: ChatId) -> WardenResult<Option<TriggerConfig>>;

    /// Create or replace the trigger for `trigger.group_id()`.
    async fn upsert_trigger(&self, trigger: &TriggerConfig) -> WardenResult<()>;

    /// Remove a group's trigger. Returns whether one existed.
    async fn delete_trigger(&self, chat: ChatId) -> WardenResult<bool>;

    /// Check the store is reachable.
    async fn ping(&self) -> WardenResult<()>;
}
