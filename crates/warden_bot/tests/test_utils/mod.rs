//! Mock platform and update builders for bot runtime tests.

#![allow(dead_code)]

use async_trait::async_trait;
use serde_json::{Value, json};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use warden_bot::{BotConfig, ServiceContext};
use warden_core::{ChatId, MessageId, UserId};
use warden_error::{PlatformError, PlatformErrorKind, WardenResult};
use warden_social::{ChatPlatform, MemberStatus, MembershipKind, SendOptions, Update};
use warden_store::InMemoryStore;

/// The mock bot's own id.
pub const BOT: i64 = 999;

/// Admin used by command tests.
pub const ADMIN: i64 = 1;

/// Member targeted by command tests.
pub const MEMBER: i64 = 42;

/// Mock platform where the bot can evict everywhere and [`ADMIN`] is an
/// administrator everywhere.
#[derive(Default)]
pub struct MockPlatform {
    statuses: Mutex<HashMap<(ChatId, UserId), MemberStatus>>,
    sent: Mutex<Vec<(ChatId, String, SendOptions)>>,
    removed: Mutex<Vec<(ChatId, UserId)>>,
    status_lookups: Mutex<usize>,
    offline: bool,
}

impl MockPlatform {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every status lookup fails.
    pub fn offline() -> Self {
        Self {
            offline: true,
            ..Self::default()
        }
    }

    /// Override one member's status.
    pub fn set_status(&self, chat: i64, user: i64, status: MemberStatus) {
        self.statuses
            .lock()
            .unwrap()
            .insert((ChatId(chat), UserId(user)), status);
    }

    pub fn sent(&self) -> Vec<(ChatId, String, SendOptions)> {
        self.sent.lock().unwrap().clone()
    }

    /// Texts sent, in order.
    pub fn texts(&self) -> Vec<String> {
        self.sent().into_iter().map(|(_, text, _)| text).collect()
    }

    pub fn removed(&self) -> Vec<(ChatId, UserId)> {
        self.removed.lock().unwrap().clone()
    }

    pub fn status_lookups(&self) -> usize {
        *self.status_lookups.lock().unwrap()
    }
}

#[async_trait]
impl ChatPlatform for MockPlatform {
    fn bot_id(&self) -> UserId {
        UserId(BOT)
    }

    async fn get_membership_status(
        &self,
        chat: ChatId,
        user: UserId,
    ) -> WardenResult<MemberStatus> {
        *self.status_lookups.lock().unwrap() += 1;
        if self.offline {
            return Err(PlatformError::new(PlatformErrorKind::Http("offline".into())).into());
        }
        if let Some(status) = self.statuses.lock().unwrap().get(&(chat, user)) {
            return Ok(*status);
        }
        let status = match user.0 {
            BOT | ADMIN => MemberStatus::new(MembershipKind::Administrator, true),
            _ => MemberStatus::new(MembershipKind::Member, false),
        };
        Ok(status)
    }

    async fn remove_member(&self, chat: ChatId, user: UserId) -> WardenResult<()> {
        self.removed.lock().unwrap().push((chat, user));
        Ok(())
    }

    async fn restore_member(&self, _chat: ChatId, _user: UserId) -> WardenResult<()> {
        Ok(())
    }

    async fn send_message(
        &self,
        chat: ChatId,
        text: &str,
        options: &SendOptions,
    ) -> WardenResult<MessageId> {
        self.sent
            .lock()
            .unwrap()
            .push((chat, text.to_string(), options.clone()));
        Ok(MessageId(1000))
    }
}

/// Runtime context over a fresh in-memory store.
pub fn context(
    platform: MockPlatform,
) -> (Arc<InMemoryStore>, Arc<MockPlatform>, Arc<ServiceContext>) {
    let store = Arc::new(InMemoryStore::new());
    let platform = Arc::new(platform);
    let config = BotConfig::default().with_token("123:test");
    let ctx = Arc::new(ServiceContext::new(config, store.clone(), platform.clone()));
    (store, platform, ctx)
}

pub fn user(id: i64, first_name: &str) -> Value {
    json!({"id": id, "is_bot": false, "first_name": first_name, "username": first_name.to_lowercase()})
}

pub fn group(id: i64) -> Value {
    json!({"id": id, "type": "supergroup", "title": format!("Group {}", id)})
}

/// A message from `from` in `chat`; `extra` fields are merged in.
pub fn message(id: i64, chat: i64, from: Value, extra: Value) -> Value {
    let mut message = json!({
        "message_id": id,
        "from": from,
        "chat": group(chat),
        "date": 1_700_000_000
    });
    if let (Some(target), Some(fields)) = (message.as_object_mut(), extra.as_object()) {
        for (key, value) in fields {
            target.insert(key.clone(), value.clone());
        }
    }
    message
}

/// `text` by [`ADMIN`] in `chat`, replying to a message by [`MEMBER`].
pub fn admin_reply(chat: i64, text: &str) -> Update {
    let target = message(10, chat, user(MEMBER, "Quinn"), json!({"text": "spam"}));
    update(json!({
        "update_id": 1,
        "message": message(11, chat, user(ADMIN, "Ada"), json!({"text": text, "reply_to_message": target}))
    }))
}

/// [`MEMBER`] joining `chat`.
pub fn join(chat: i64) -> Update {
    update(json!({
        "update_id": 1,
        "message": message(12, chat, user(MEMBER, "Quinn"), json!({"new_chat_members": [user(MEMBER, "Quinn")]}))
    }))
}

pub fn update(value: Value) -> Update {
    serde_json::from_value(value).unwrap()
}
