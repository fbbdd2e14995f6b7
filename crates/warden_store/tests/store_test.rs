//! Tests for the in-memory and file-backed membership stores.

use tempfile::TempDir;
use warden_core::{
    ChatId, DisplayName, EncodedMessage, FormattingSpan, GroupKind, GroupRecord,
    QuarantineRecord, SpanKind, TriggerConfig, UserId,
};
use warden_error::{StoreErrorKind, WardenErrorKind};
use warden_store::{FileStore, GroupFilter, InMemoryStore, MembershipStore};

fn group(id: i64, admin: bool) -> GroupRecord {
    GroupRecord::new(ChatId(id), format!("group {}", id), GroupKind::Supergroup, admin)
}

fn trigger(group_id: i64) -> TriggerConfig {
    TriggerConfig::from_encoded(
        ChatId(group_id),
        "welcome",
        15,
        EncodedMessage {
            text: "Please read the rules".to_string(),
            entities: vec![FormattingSpan::new(SpanKind::Bold, 16, 5)],
        },
    )
}

#[tokio::test]
async fn test_missing_records_are_none() {
    let store = InMemoryStore::new();
    assert!(store.get_quarantine(UserId(1)).await.unwrap().is_none());
    assert!(store.get_group(ChatId(-1)).await.unwrap().is_none());
    assert!(store.get_trigger(ChatId(-1)).await.unwrap().is_none());
    assert!(!store.delete_group(ChatId(-1)).await.unwrap());
}

#[tokio::test]
async fn test_quarantine_upsert_replaces_by_user() {
    let store = InMemoryStore::new();
    let mut record = QuarantineRecord::new(UserId(5), ChatId(-1), DisplayName::new("Eve"));
    store.upsert_quarantine(&record).await.unwrap();

    record.transfer_to(ChatId(-2));
    store.upsert_quarantine(&record).await.unwrap();

    let loaded = store.get_quarantine(UserId(5)).await.unwrap().unwrap();
    assert_eq!(*loaded.current_group_id(), ChatId(-2));
    assert_eq!(store.snapshot().quarantines.len(), 1);
    assert_eq!(store.mutation_count(), 2);
}

#[tokio::test]
async fn test_query_groups_filters_and_orders() {
    let store = InMemoryStore::new();
    for (id, admin) in [(-3, true), (-1, true), (-2, false)] {
        store.upsert_group(&group(id, admin)).await.unwrap();
    }

    let all: Vec<_> = store
        .query_groups(GroupFilter::All)
        .await
        .unwrap()
        .iter()
        .map(|g| *g.chat_id())
        .collect();
    assert_eq!(all, vec![ChatId(-3), ChatId(-2), ChatId(-1)]);

    let admin = store.query_groups(GroupFilter::BotAdmin).await.unwrap();
    assert_eq!(admin.len(), 2);
    assert!(admin.iter().all(|g| *g.is_bot_admin()));
}

#[tokio::test]
async fn test_offline_store_fails_every_call() {
    let store = InMemoryStore::new();
    store.set_available(false);

    let err = store.get_quarantine(UserId(1)).await.unwrap_err();
    assert!(matches!(
        err.kind(),
        WardenErrorKind::Store(e) if matches!(e.kind, StoreErrorKind::Unavailable(_))
    ));
    assert!(store.upsert_group(&group(-1, true)).await.is_err());
    assert!(store.ping().await.is_err());
    assert_eq!(store.mutation_count(), 0);

    store.set_available(true);
    assert!(store.ping().await.is_ok());
}

#[tokio::test]
async fn test_file_store_survives_reopen() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("state").join("warden.json");

    {
        let store = FileStore::open(&path).await.unwrap();
        assert!(store.ping().await.is_ok());
        store.upsert_group(&group(-10, true)).await.unwrap();
        store.upsert_trigger(&trigger(-10)).await.unwrap();
        store
            .upsert_quarantine(&QuarantineRecord::new(
                UserId(3),
                ChatId(-10),
                DisplayName::new("Kai"),
            ))
            .await
            .unwrap();
    }

    let reopened = FileStore::open(&path).await.unwrap();
    assert_eq!(reopened.path(), path.as_path());
    assert!(reopened.get_group(ChatId(-10)).await.unwrap().is_some());
    assert_eq!(
        reopened.get_trigger(ChatId(-10)).await.unwrap(),
        Some(trigger(-10)),
        "entities come back verbatim"
    );
    assert!(
        *reopened
            .get_quarantine(UserId(3))
            .await
            .unwrap()
            .unwrap()
            .is_quarantined()
    );

    assert!(reopened.delete_trigger(ChatId(-10)).await.unwrap());
    let again = FileStore::open(&path).await.unwrap();
    assert!(again.get_trigger(ChatId(-10)).await.unwrap().is_none());
}

#[tokio::test]
async fn test_file_store_rejects_corrupt_snapshot() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("warden.json");
    std::fs::write(&path, b"{not json").unwrap();

    let err = FileStore::open(&path).await.err().unwrap();
    assert!(matches!(
        err.kind(),
        WardenErrorKind::Store(e) if matches!(e.kind, StoreErrorKind::Serialization(_))
    ));
}

#[tokio::test]
async fn test_failed_file_write_leaves_records_unchanged() {
    let temp_dir = TempDir::new().unwrap();
    let state_dir = temp_dir.path().join("state");
    let path = state_dir.join("warden.json");

    let store = FileStore::open(&path).await.unwrap();
    let active = QuarantineRecord::new(UserId(3), ChatId(-10), DisplayName::new("Kai"));
    store.upsert_quarantine(&active).await.unwrap();
    store.upsert_group(&group(-10, true)).await.unwrap();

    // A plain file where the state directory was makes every write fail.
    std::fs::remove_dir_all(&state_dir).unwrap();
    std::fs::write(&state_dir, b"not a directory").unwrap();

    let mut released = active.clone();
    released.release();
    let err = store.upsert_quarantine(&released).await.unwrap_err();
    assert!(matches!(
        err.kind(),
        WardenErrorKind::Store(e) if matches!(e.kind, StoreErrorKind::Unavailable(_))
    ));
    assert_eq!(store.get_quarantine(UserId(3)).await.unwrap(), Some(active.clone()));

    let fresh = QuarantineRecord::new(UserId(4), ChatId(-10), DisplayName::new("Lee"));
    assert!(store.upsert_quarantine(&fresh).await.is_err());
    assert!(store.get_quarantine(UserId(4)).await.unwrap().is_none());

    assert!(store.delete_group(ChatId(-10)).await.is_err());
    assert!(store.get_group(ChatId(-10)).await.unwrap().is_some());

    assert!(store.upsert_trigger(&trigger(-10)).await.is_err());
    assert!(store.get_trigger(ChatId(-10)).await.unwrap().is_none());

    // Once the directory is back the same write goes through.
    std::fs::remove_file(&state_dir).unwrap();
    store.upsert_quarantine(&released).await.unwrap();
    let reopened = FileStore::open(&path).await.unwrap();
    assert!(
        !*reopened
            .get_quarantine(UserId(3))
            .await
            .unwrap()
            .unwrap()
            .is_quarantined()
    );
    assert!(reopened.get_group(ChatId(-10)).await.unwrap().is_some());
}
