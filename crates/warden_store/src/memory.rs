//! In-process membership store.

use crate::{GroupFilter, MembershipStore};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use warden_core::{ChatId, GroupRecord, QuarantineRecord, TriggerConfig, UserId};
use warden_error::{StoreError, StoreErrorKind, WardenResult};

/// Every record held by a store, in a serializable form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreSnapshot {
    /// Quarantine records
    #[serde(default)]
    pub quarantines: Vec<QuarantineRecord>,
    /// Managed groups
    #[serde(default)]
    pub groups: Vec<GroupRecord>,
    /// Group triggers
    #[serde(default)]
    pub triggers: Vec<TriggerConfig>,
}

#[derive(Default)]
struct Tables {
    quarantines: HashMap<UserId, QuarantineRecord>,
    groups: HashMap<ChatId, GroupRecord>,
    triggers: HashMap<ChatId, TriggerConfig>,
}

/// Membership store held in process memory.
///
/// Records are lost when the process exits unless wrapped by
/// [`crate::FileStore`]. The store can be switched offline with
/// [`InMemoryStore::set_available`], after which every call fails with
/// [`StoreErrorKind::Unavailable`].
///
/// # Example
///
/// ```
/// use warden_store::{GroupFilter, InMemoryStore, MembershipStore};
/// use warden_core::{ChatId, GroupKind, GroupRecord};
///
/// # tokio_test::block_on(async {
/// let store = InMemoryStore::new();
/// store.upsert_group(&GroupRecord::new(ChatId(-1), "A", GroupKind::Supergroup, true)).await?;
/// store.upsert_group(&GroupRecord::new(ChatId(-2), "B", GroupKind::Group, false)).await?;
///
/// let admin = store.query_groups(GroupFilter::BotAdmin).await?;
/// assert_eq!(admin.len(), 1);
/// # Ok::<(), warden_error::WardenError>(())
/// # }).unwrap();
/// ```
pub struct InMemoryStore {
    tables: RwLock<Tables>,
    available: AtomicBool,
    mutations: AtomicU64,
}

impl InMemoryStore {
    /// Empty, available store.
    pub fn new() -> Self {
        Self {
            tables: RwLock::new(Tables::default()),
            available: AtomicBool::new(true),
            mutations: AtomicU64::new(0),
        }
    }

    /// Store preloaded with a snapshot.
    pub fn from_snapshot(snapshot: StoreSnapshot) -> Self {
        let store = Self::new();
        {
            let mut tables = store.tables.write();
            for record in snapshot.quarantines {
                tables.quarantines.insert(*record.user_id(), record);
            }
            for record in snapshot.groups {
                tables.groups.insert(*record.chat_id(), record);
            }
            for trigger in snapshot.triggers {
                tables.triggers.insert(*trigger.group_id(), trigger);
            }
        }
        store
    }

    /// Copy of every record, each table ordered by key.
    pub fn snapshot(&self) -> StoreSnapshot {
        let tables = self.tables.read();
        let mut snapshot = StoreSnapshot {
            quarantines: tables.quarantines.values().cloned().collect(),
            groups: tables.groups.values().cloned().collect(),
            triggers: tables.triggers.values().cloned().collect(),
        };
        snapshot.quarantines.sort_by_key(|r| *r.user_id());
        snapshot.groups.sort_by_key(|r| *r.chat_id());
        snapshot.triggers.sort_by_key(|t| *t.group_id());
        snapshot
    }

    /// Take the store online or offline.
    pub fn set_available(&self, available: bool) {
        tracing::info!(available, "In-memory store availability changed");
        self.available.store(available, Ordering::SeqCst);
    }

    /// Number of successful writes since creation.
    pub fn mutation_count(&self) -> u64 {
        self.mutations.load(Ordering::SeqCst)
    }

    #[track_caller]
    fn check_available(&self) -> WardenResult<()> {
        if self.available.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(StoreError::new(StoreErrorKind::Unavailable(
                "in-memory store is offline".to_string(),
            ))
            .into())
        }
    }

    fn mutate<T>(&self, f: impl FnOnce(&mut Tables) -> T) -> WardenResult<T> {
        self.check_available()?;
        let result = f(&mut self.tables.write());
        self.mutations.fetch_add(1, Ordering::SeqCst);
        Ok(result)
    }

    fn read<T>(&self, f: impl FnOnce(&Tables) -> T) -> WardenResult<T> {
        self.check_available()?;
        Ok(f(&self.tables.read()))
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl MembershipStore for InMemoryStore {
    async fn get_quarantine(&self, user: UserId) -> WardenResult<Option<QuarantineRecord>> {
        self.read(|t| t.quarantines.get(&user).cloned())
    }

    #[tracing::instrument(skip(self, record), fields(user = %record.user_id()))]
    async fn upsert_quarantine(&self, record: &QuarantineRecord) -> WardenResult<()> {
        self.mutate(|t| {
            t.quarantines.insert(*record.user_id(), record.clone());
        })
    }

    async fn get_group(&self, chat: ChatId) -> WardenResult<Option<GroupRecord>> {
        self.read(|t| t.groups.get(&chat).cloned())
    }

    #[tracing::instrument(skip(self, record), fields(chat = %record.chat_id()))]
    async fn upsert_group(&self, record: &GroupRecord) -> WardenResult<()> {
        self.mutate(|t| {
            t.groups.insert(*record.chat_id(), record.clone());
        })
    }

    #[tracing::instrument(skip(self))]
    async fn delete_group(&self, chat: ChatId) -> WardenResult<bool> {
        self.mutate(|t| t.groups.remove(&chat).is_some())
    }

    async fn query_groups(&self, filter: GroupFilter) -> WardenResult<Vec<GroupRecord>> {
        let mut groups = self.read(|t| {
            t.groups
                .values()
                .filter(|g| filter.matches(g))
                .cloned()
                .collect::<Vec<_>>()
        })?;
        groups.sort_by_key(|g| *g.chat_id());
        Ok(groups)
    }

    async fn get_trigger(&self, chat: ChatId) -> WardenResult<Option<TriggerConfig>> {
        self.read(|t| t.triggers.get(&chat).cloned())
    }

    #[tracing::instrument(skip(self, trigger), fields(chat = %trigger.group_id()))]
    async fn upsert_trigger(&self, trigger: &TriggerConfig) -> WardenResult<()> {
        self.mutate(|t| {
            t.triggers.insert(*trigger.group_id(), trigger.clone());
        })
    }

    #[tracing::instrument(skip(self))]
    async fn delete_trigger(&self, chat: ChatId) -> WardenResult<bool> {
        self.mutate(|t| t.triggers.remove(&chat).is_some())
    }

    async fn ping(&self) -> WardenResult<()> {
        self.check_available()
    }
}
