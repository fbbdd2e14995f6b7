//! Mock chat platform and fixtures for moderation tests.

#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use warden_cache::{TtlCache, TtlCacheConfig};
use warden_core::{
    ChatId, DisplayName, EncodedMessage, GroupKind, GroupRecord, MessageId, TriggerConfig, UserId,
};
use warden_error::{PlatformError, PlatformErrorKind, WardenResult};
use warden_moderation::{ModerationConfig, QuarantineService};
use warden_social::{ChatPlatform, MemberStatus, MembershipKind, SendOptions};
use warden_store::{InMemoryStore, MembershipStore};

/// The mock bot's own id.
pub const BOT: UserId = UserId(999);

/// One recorded platform call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Status(ChatId, UserId),
    Remove(ChatId, UserId),
    Restore(ChatId, UserId),
    Send {
        chat: ChatId,
        text: String,
        options: SendOptions,
    },
}

/// Mock platform with per-group failure injection.
#[derive(Default)]
pub struct MockPlatform {
    calls: Mutex<Vec<Call>>,
    not_admin: HashSet<ChatId>,
    deny_removal: HashSet<ChatId>,
    fail_status: HashSet<ChatId>,
    reject_entities: bool,
    reject_sends: bool,
    latency: Option<Duration>,
}

impl MockPlatform {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bot is a plain member in `chat`.
    pub fn with_not_admin(mut self, chat: i64) -> Self {
        self.not_admin.insert(ChatId(chat));
        self
    }

    /// Removal in `chat` fails for lack of rights.
    pub fn with_denied_removal(mut self, chat: i64) -> Self {
        self.deny_removal.insert(ChatId(chat));
        self
    }

    /// Status lookup in `chat` fails with a transport error.
    pub fn with_status_failure(mut self, chat: i64) -> Self {
        self.fail_status.insert(ChatId(chat));
        self
    }

    /// Sends carrying explicit entities fail.
    pub fn rejecting_entities(mut self) -> Self {
        self.reject_entities = true;
        self
    }

    /// Every send fails.
    pub fn rejecting_sends(mut self) -> Self {
        self.reject_sends = true;
        self
    }

    /// Each removal takes `latency`.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn clear(&self) {
        self.calls.lock().unwrap().clear();
    }

    /// Groups removed from, sorted.
    pub fn removed(&self) -> Vec<ChatId> {
        let mut chats: Vec<ChatId> = self
            .calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Remove(chat, _) => Some(chat),
                _ => None,
            })
            .collect();
        chats.sort();
        chats
    }

    /// Groups restored in, sorted.
    pub fn restored(&self) -> Vec<ChatId> {
        let mut chats: Vec<ChatId> = self
            .calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Restore(chat, _) => Some(chat),
                _ => None,
            })
            .collect();
        chats.sort();
        chats
    }

    /// Send attempts, in order.
    pub fn sends(&self) -> Vec<(ChatId, String, SendOptions)> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Send {
                    chat,
                    text,
                    options,
                } => Some((chat, text, options)),
                _ => None,
            })
            .collect()
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl ChatPlatform for MockPlatform {
    fn bot_id(&self) -> UserId {
        BOT
    }

    async fn get_membership_status(
        &self,
        chat: ChatId,
        user: UserId,
    ) -> WardenResult<MemberStatus> {
        self.record(Call::Status(chat, user));
        if self.fail_status.contains(&chat) {
            return Err(PlatformError::new(PlatformErrorKind::Http("connection reset".into())).into());
        }
        if self.not_admin.contains(&chat) {
            return Ok(MemberStatus::new(MembershipKind::Member, false));
        }
        Ok(MemberStatus::new(MembershipKind::Administrator, true))
    }

    async fn remove_member(&self, chat: ChatId, user: UserId) -> WardenResult<()> {
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
        if self.deny_removal.contains(&chat) {
            return Err(PlatformError::new(PlatformErrorKind::PermissionDenied(
                "not enough rights to restrict/unrestrict chat member".into(),
            ))
            .into());
        }
        self.record(Call::Remove(chat, user));
        Ok(())
    }

    async fn restore_member(&self, chat: ChatId, user: UserId) -> WardenResult<()> {
        self.record(Call::Restore(chat, user));
        Ok(())
    }

    async fn send_message(
        &self,
        chat: ChatId,
        text: &str,
        options: &SendOptions,
    ) -> WardenResult<MessageId> {
        self.record(Call::Send {
            chat,
            text: text.to_string(),
            options: options.clone(),
        });
        if self.reject_sends || (self.reject_entities && options.entities.is_some()) {
            return Err(PlatformError::new(PlatformErrorKind::Api {
                code: 400,
                description: "Bad Request: can't parse entities".into(),
            })
            .into());
        }
        Ok(MessageId(500))
    }
}

pub fn user() -> UserId {
    UserId(42)
}

pub fn display() -> DisplayName {
    DisplayName::new("Quinn").with_username("quinn")
}

/// Register managed groups as `(chat id, bot is admin)`.
pub async fn seed_groups(store: &InMemoryStore, groups: &[(i64, bool)]) {
    for (id, admin) in groups {
        store
            .upsert_group(&GroupRecord::new(
                ChatId(*id),
                format!("group {}", id),
                GroupKind::Supergroup,
                *admin,
            ))
            .await
            .unwrap();
    }
}

/// Configure a follow-up trigger for `group`.
pub async fn seed_trigger(store: &InMemoryStore, group: i64, delay_seconds: u32, message: EncodedMessage) {
    store
        .upsert_trigger(&TriggerConfig::from_encoded(
            ChatId(group),
            "welcome",
            delay_seconds,
            message,
        ))
        .await
        .unwrap();
}

/// Service over a fresh in-memory store and `platform`.
pub fn service(
    platform: MockPlatform,
) -> (Arc<InMemoryStore>, Arc<MockPlatform>, QuarantineService) {
    let store = Arc::new(InMemoryStore::new());
    let platform = Arc::new(platform);
    let cache = TtlCache::new("quarantine", TtlCacheConfig::default());
    let config = ModerationConfig::default().with_restore_delay_secs(5);
    let service = QuarantineService::new(store.clone(), platform.clone(), cache, &config);
    (store, platform, service)
}
