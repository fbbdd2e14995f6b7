//! JSON snapshot store on the local filesystem.

use crate::{GroupFilter, InMemoryStore, MembershipStore, StoreSnapshot};
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;
use warden_core::{ChatId, GroupRecord, QuarantineRecord, TriggerConfig, UserId};
use warden_error::{StoreError, StoreErrorKind, WardenResult};

/// Membership store persisted as a single JSON document.
///
/// Reads are served from memory. A write is applied to a staged copy of the
/// tables, the staged snapshot is persisted, and only then is the change
/// committed to memory; a failed write leaves the store as it was. The
/// document goes to a temporary sibling file first and is then renamed over
/// the original, so a crash never leaves a half-written file. Writes are
/// serialized.
pub struct FileStore {
    path: PathBuf,
    memory: InMemoryStore,
    write_lock: Mutex<()>,
}

impl FileStore {
    /// Open the store at `path`, loading it if the file exists.
    ///
    /// # Errors
    ///
    /// Returns [`StoreErrorKind::Unavailable`] if the file exists but cannot
    /// be read, and [`StoreErrorKind::Serialization`] if it is not a valid
    /// snapshot.
    #[tracing::instrument(skip(path), fields(file))]
    pub async fn open(path: impl Into<PathBuf>) -> WardenResult<Self> {
        let path = path.into();
        tracing::Span::current().record("file", tracing::field::display(path.display()));

        let snapshot = match tokio::fs::read(&path).await {
            Ok(bytes) => serde_json::from_slice::<StoreSnapshot>(&bytes).map_err(|e| {
                StoreError::new(StoreErrorKind::Serialization(format!(
                    "{}: {}",
                    path.display(),
                    e
                )))
            })?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!("No snapshot yet, starting empty");
                StoreSnapshot::default()
            }
            Err(e) => {
                return Err(StoreError::new(StoreErrorKind::Unavailable(format!(
                    "{}: {}",
                    path.display(),
                    e
                )))
                .into());
            }
        };

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await.map_err(|e| {
                StoreError::new(StoreErrorKind::Unavailable(format!(
                    "{}: {}",
                    parent.display(),
                    e
                )))
            })?;
        }

        tracing::info!(
            quarantines = snapshot.quarantines.len(),
            groups = snapshot.groups.len(),
            triggers = snapshot.triggers.len(),
            "Opened file store"
        );

        Ok(Self {
            path,
            memory: InMemoryStore::from_snapshot(snapshot),
            write_lock: Mutex::new(()),
        })
    }

    /// Location of the snapshot file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Copy of the committed tables to apply a write to.
    fn stage(&self) -> InMemoryStore {
        InMemoryStore::from_snapshot(self.memory.snapshot())
    }

    async fn persist(&self, snapshot: &StoreSnapshot) -> WardenResult<()> {
        let json = serde_json::to_vec_pretty(snapshot)
            .map_err(|e| StoreError::new(StoreErrorKind::Serialization(e.to_string())))?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await.map_err(|e| {
                StoreError::new(StoreErrorKind::Unavailable(format!(
                    "{}: {}",
                    parent.display(),
                    e
                )))
            })?;
        }

        let temp_path = self.path.with_extension("tmp");
        tokio::fs::write(&temp_path, &json).await.map_err(|e| {
            StoreError::new(StoreErrorKind::Unavailable(format!(
                "{}: {}",
                temp_path.display(),
                e
            )))
        })?;
        tokio::fs::rename(&temp_path, &self.path).await.map_err(|e| {
            StoreError::new(StoreErrorKind::Unavailable(format!(
                "rename {} to {}: {}",
                temp_path.display(),
                self.path.display(),
                e
            )))
        })?;

        tracing::debug!(path = %self.path.display(), bytes = json.len(), "Persisted store snapshot");
        Ok(())
    }
}

#[async_trait::async_trait]
impl MembershipStore for FileStore {
    async fn get_quarantine(&self, user: UserId) -> WardenResult<Option<QuarantineRecord>> {
        self.memory.get_quarantine(user).await
    }

    async fn upsert_quarantine(&self, record: &QuarantineRecord) -> WardenResult<()> {
        let _guard = self.write_lock.lock().await;
        let staged = self.stage();
        staged.upsert_quarantine(record).await?;
        self.persist(&staged.snapshot()).await?;
        self.memory.upsert_quarantine(record).await
    }

    async fn get_group(&self, chat: ChatId) -> WardenResult<Option<GroupRecord>> {
        self.memory.get_group(chat).await
    }

    async fn upsert_group(&self, record: &GroupRecord) -> WardenResult<()> {
        let _guard = self.write_lock.lock().await;
        let staged = self.stage();
        staged.upsert_group(record).await?;
        self.persist(&staged.snapshot()).await?;
        self.memory.upsert_group(record).await
    }

    async fn delete_group(&self, chat: ChatId) -> WardenResult<bool> {
        let _guard = self.write_lock.lock().await;
        let staged = self.stage();
        if !staged.delete_group(chat).await? {
            return Ok(false);
        }
        self.persist(&staged.snapshot()).await?;
        self.memory.delete_group(chat).await
    }

    async fn query_groups(&self, filter: GroupFilter) -> WardenResult<Vec<GroupRecord>> {
        self.memory.query_groups(filter).await
    }

    async fn get_trigger(&self, chat: ChatId) -> WardenResult<Option<TriggerConfig>> {
        self.memory.get_trigger(chat).await
    }

    async fn upsert_trigger(&self, trigger: &TriggerConfig) -> WardenResult<()> {
        let _guard = self.write_lock.lock().await;
        let staged = self.stage();
        staged.upsert_trigger(trigger).await?;
        self.persist(&staged.snapshot()).await?;
        self.memory.upsert_trigger(trigger).await
    }

    async fn delete_trigger(&self, chat: ChatId) -> WardenResult<bool> {
        let _guard = self.write_lock.lock().await;
        let staged = self.stage();
        if !staged.delete_trigger(chat).await? {
            return Ok(false);
        }
        self.persist(&staged.snapshot()).await?;
        self.memory.delete_trigger(chat).await
    }

    async fn ping(&self) -> WardenResult<()> {
        let parent = self
            .path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        if tokio::fs::try_exists(parent).await.unwrap_or(false) {
            Ok(())
        } else {
            Err(StoreError::new(StoreErrorKind::Unavailable(format!(
                "{} does not exist",
                parent.display()
            )))
            .into())
        }
    }
}
