//! Tests for routing platform updates into quarantine operations.

mod test_utils;

use serde_json::json;
use test_utils::{
    ADMIN, BOT, MEMBER, MockPlatform, admin_reply, context, join, message, update, user,
};
use warden_bot::{DEFAULT_TRIGGER_NAME, EventRouter, RouteOutcome};
use warden_core::{
    ChatId, EncodedMessage, FormattingSpan, GroupKind, GroupRecord, MessageId, SpanKind,
    TriggerConfig, UserId,
};
use warden_moderation::{JoinOutcome, QuarantineOutcome, ReleaseOutcome};
use warden_social::{MemberStatus, MembershipKind};
use warden_store::{InMemoryStore, MembershipStore};

const A: i64 = -1;
const B: i64 = -2;

async fn register(store: &InMemoryStore, chat: i64) {
    store
        .upsert_group(&GroupRecord::new(
            ChatId(chat),
            "group",
            GroupKind::Supergroup,
            true,
        ))
        .await
        .unwrap();
}

async fn trigger(store: &InMemoryStore, chat: i64, name: &str) {
    let message = EncodedMessage {
        text: "Welcome".to_string(),
        entities: Vec::new(),
    };
    store
        .upsert_trigger(&TriggerConfig::from_encoded(ChatId(chat), name, 60, message))
        .await
        .unwrap();
}

#[tokio::test]
async fn test_join_in_quarantine_group_quarantines() {
    let (store, platform, ctx) = context(MockPlatform::new());
    register(&store, A).await;
    register(&store, B).await;
    trigger(&store, A, "#q").await;
    let router = EventRouter::new(ctx.clone());

    let outcome = router.route(join(A)).await;

    assert_eq!(
        outcome,
        RouteOutcome::Joined(vec![JoinOutcome::Quarantined(
            QuarantineOutcome::Quarantined {
                group: ChatId(A),
                evicted: 1
            }
        )])
    );
    assert_eq!(platform.removed(), vec![(ChatId(B), UserId(MEMBER))]);
    let record = store.get_quarantine(UserId(MEMBER)).await.unwrap().unwrap();
    assert_eq!(record.display().username.as_deref(), Some("quinn"));
}

#[tokio::test]
async fn test_bots_joining_are_skipped() {
    let (store, _platform, ctx) = context(MockPlatform::new());
    trigger(&store, A, "#q").await;
    let router = EventRouter::new(ctx);

    let bot = json!({"id": BOT, "is_bot": true, "first_name": "warden"});
    let outcome = router
        .route(update(json!({
            "update_id": 3,
            "message": message(5, A, bot.clone(), json!({"new_chat_members": [bot]}))
        })))
        .await;

    assert_eq!(outcome, RouteOutcome::Joined(Vec::new()));
}

#[tokio::test]
async fn test_admin_quarantine_command_replies_with_count() {
    let (store, platform, ctx) = context(MockPlatform::new());
    register(&store, A).await;
    register(&store, B).await;
    let router = EventRouter::new(ctx);

    let outcome = router.route(admin_reply(A, "/quarantine@warden_bot")).await;

    assert_eq!(
        outcome,
        RouteOutcome::Quarantine(QuarantineOutcome::Quarantined {
            group: ChatId(A),
            evicted: 1
        })
    );
    let sent = platform.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].0, ChatId(A));
    assert_eq!(
        sent[0].1,
        "Quinn (@quinn) quarantined; removed from 1 other groups."
    );
    assert_eq!(sent[0].2.reply_to, Some(MessageId(11)));
}

#[tokio::test]
async fn test_trigger_name_reply_is_a_quarantine_marker() {
    let (store, _platform, ctx) = context(MockPlatform::new());
    register(&store, A).await;
    trigger(&store, A, "#q").await;
    let router = EventRouter::new(ctx);

    let outcome = router.route(admin_reply(A, " #q ")).await;

    assert!(matches!(outcome, RouteOutcome::Quarantine(_)));
    assert!(
        store
            .get_quarantine(UserId(MEMBER))
            .await
            .unwrap()
            .is_some()
    );
}

#[tokio::test]
async fn test_non_admin_commands_are_ignored() {
    let (store, platform, ctx) = context(MockPlatform::new());
    register(&store, A).await;
    let router = EventRouter::new(ctx);

    let target = message(10, A, user(7, "Ivy"), json!({"text": "hi"}));
    let outcome = router
        .route(update(json!({
            "update_id": 4,
            "message": message(11, A, user(8, "Eve"), json!({"text": "/quarantine", "reply_to_message": target}))
        })))
        .await;

    assert_eq!(outcome, RouteOutcome::Ignored);
    assert!(platform.sent().is_empty());
    assert!(store.get_quarantine(UserId(7)).await.unwrap().is_none());
}

#[tokio::test]
async fn test_command_without_reply_gets_usage() {
    let (_store, platform, ctx) = context(MockPlatform::new());
    let router = EventRouter::new(ctx);

    let outcome = router
        .route(update(json!({
            "update_id": 5,
            "message": message(11, A, user(ADMIN, "Ada"), json!({"text": "/release"}))
        })))
        .await;

    assert_eq!(outcome, RouteOutcome::Rejected(ChatId(A)));
    assert!(platform.texts()[0].starts_with("Reply to the member's message"));
}

#[tokio::test]
async fn test_release_command() {
    let (store, platform, ctx) = context(MockPlatform::new());
    register(&store, A).await;
    let router = EventRouter::new(ctx);

    assert_eq!(
        router.route(admin_reply(A, "/release")).await,
        RouteOutcome::Release(ReleaseOutcome::NotQuarantined)
    );
    router.route(admin_reply(A, "/quarantine")).await;
    assert!(matches!(
        router.route(admin_reply(A, "/release")).await,
        RouteOutcome::Release(ReleaseOutcome::Released { .. })
    ));

    let texts = platform.texts();
    assert_eq!(texts[0], "Quinn (@quinn) is not currently quarantined.");
    assert_eq!(texts[2], "Quinn (@quinn) released.");
}

#[tokio::test]
async fn test_admin_checks_are_cached() {
    let (store, platform, ctx) = context(MockPlatform::new());
    register(&store, A).await;
    let router = EventRouter::new(ctx);

    router.route(admin_reply(A, "/release")).await;
    let lookups = platform.status_lookups();
    router.route(admin_reply(A, "/release")).await;

    assert_eq!(platform.status_lookups(), lookups);
}

#[tokio::test]
async fn test_register_records_bot_rights() {
    let (store, platform, ctx) = context(MockPlatform::new());
    platform.set_status(B, BOT, MemberStatus::new(MembershipKind::Administrator, false));
    let router = EventRouter::new(ctx);

    let register = |chat| {
        update(json!({
            "update_id": 6,
            "message": message(11, chat, user(ADMIN, "Ada"), json!({"text": "/register"}))
        }))
    };

    assert_eq!(
        router.route(register(A)).await,
        RouteOutcome::Registered {
            chat: ChatId(A),
            bot_is_admin: true
        }
    );
    assert_eq!(
        router.route(register(B)).await,
        RouteOutcome::Registered {
            chat: ChatId(B),
            bot_is_admin: false
        }
    );

    let group = store.get_group(ChatId(A)).await.unwrap().unwrap();
    assert_eq!(group.title(), "Group -1");
    assert!(*group.is_bot_admin());
    assert!(!*store.get_group(ChatId(B)).await.unwrap().unwrap().is_bot_admin());
}

#[tokio::test]
async fn test_settrigger_stores_replied_message_with_entities() {
    let (store, platform, ctx) = context(MockPlatform::new());
    let router = EventRouter::new(ctx);

    let template = message(
        20,
        A,
        user(ADMIN, "Ada"),
        json!({
            "text": "Read the rules",
            "entities": [{"type": "bold", "offset": 9, "length": 5}]
        }),
    );
    let outcome = router
        .route(update(json!({
            "update_id": 7,
            "message": message(21, A, user(ADMIN, "Ada"), json!({"text": "/settrigger 30", "reply_to_message": template}))
        })))
        .await;

    assert_eq!(outcome, RouteOutcome::TriggerSet(ChatId(A)));
    let stored = store.get_trigger(ChatId(A)).await.unwrap().unwrap();
    assert_eq!(stored.name(), DEFAULT_TRIGGER_NAME);
    assert_eq!(*stored.delay_seconds(), 30);
    assert_eq!(stored.second_message_text(), "Read the rules");
    assert_eq!(
        stored.second_message_entities(),
        &vec![FormattingSpan::new(SpanKind::Bold, 9, 5)]
    );
    assert!(platform.texts()[0].contains("follow-up after 30s"));
}

#[tokio::test]
async fn test_settrigger_rejects_bad_arguments() {
    let (store, _platform, ctx) = context(MockPlatform::new());
    let router = EventRouter::new(ctx);

    let template = message(20, A, user(ADMIN, "Ada"), json!({"text": "hi"}));
    for text in ["/settrigger soon", "/settrigger 0"] {
        let outcome = router
            .route(update(json!({
                "update_id": 8,
                "message": message(21, A, user(ADMIN, "Ada"), json!({"text": text, "reply_to_message": template.clone()}))
            })))
            .await;
        assert_eq!(outcome, RouteOutcome::Rejected(ChatId(A)), "{}", text);
    }
    assert!(store.get_trigger(ChatId(A)).await.unwrap().is_none());
}

#[tokio::test]
async fn test_bot_membership_changes_update_group_record() {
    let (store, _platform, ctx) = context(MockPlatform::new());
    let router = EventRouter::new(ctx.clone());
    let bot = json!({"id": BOT, "is_bot": true, "first_name": "warden"});

    let change = |old: &str, new: serde_json::Value| {
        update(json!({
            "update_id": 9,
            "my_chat_member": {
                "chat": {"id": A, "type": "supergroup", "title": "Lobby"},
                "from": user(ADMIN, "Ada"),
                "date": 1_700_000_000,
                "old_chat_member": {"status": old, "user": bot.clone()},
                "new_chat_member": new
            }
        }))
    };

    let promoted = json!({"status": "administrator", "user": bot.clone(), "can_restrict_members": true});
    assert_eq!(
        router.route(change("member", promoted)).await,
        RouteOutcome::BotMembership {
            chat: ChatId(A),
            present: true
        }
    );
    let group = store.get_group(ChatId(A)).await.unwrap().unwrap();
    assert_eq!(group.title(), "Lobby");
    assert!(*group.is_bot_admin());

    let left = json!({"status": "left", "user": bot.clone()});
    router.route(change("administrator", left)).await;
    assert!(store.get_group(ChatId(A)).await.unwrap().is_none());
}

#[tokio::test]
async fn test_trigger_lookups_are_cached_until_settrigger() {
    let (store, _platform, ctx) = context(MockPlatform::new());
    register(&store, A).await;
    let router = EventRouter::new(ctx.clone());

    assert_eq!(router.route(admin_reply(A, "#rules")).await, RouteOutcome::Ignored);
    assert_eq!(ctx.service().trigger_cache().get(&ChatId(A)), Some(None));

    // Written behind the router's back: the cached absence still answers.
    trigger(&store, A, "#rules").await;
    assert_eq!(router.route(admin_reply(A, "#rules")).await, RouteOutcome::Ignored);

    let template = message(20, A, user(ADMIN, "Ada"), json!({"text": "Welcome"}));
    let outcome = router
        .route(update(json!({
            "update_id": 11,
            "message": message(21, A, user(ADMIN, "Ada"), json!({"text": "/settrigger 30 #rules", "reply_to_message": template}))
        })))
        .await;
    assert_eq!(outcome, RouteOutcome::TriggerSet(ChatId(A)));
    assert!(ctx.service().trigger_cache().get(&ChatId(A)).is_none());

    assert!(matches!(
        router.route(admin_reply(A, "#rules")).await,
        RouteOutcome::Quarantine(QuarantineOutcome::Quarantined { .. })
    ));
}

#[tokio::test]
async fn test_private_chats_are_ignored() {
    let (_store, platform, ctx) = context(MockPlatform::new());
    let router = EventRouter::new(ctx);

    let outcome = router
        .route(update(json!({
            "update_id": 10,
            "message": {
                "message_id": 1,
                "from": user(ADMIN, "Ada"),
                "chat": {"id": ADMIN, "type": "private"},
                "date": 1_700_000_000,
                "text": "/register"
            }
        })))
        .await;

    assert_eq!(outcome, RouteOutcome::Ignored);
    assert_eq!(platform.status_lookups(), 0);
}
