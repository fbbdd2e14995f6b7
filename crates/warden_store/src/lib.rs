//! Membership store for the warden moderation bot.
//!
//! The moderation engine treats persistence as an external collaborator with
//! typed CRUD and query operations over three record kinds: per-user
//! [`QuarantineRecord`](warden_core::QuarantineRecord)s, managed
//! [`GroupRecord`](warden_core::GroupRecord)s and per-group
//! [`TriggerConfig`](warden_core::TriggerConfig)s.
//!
//! # Backends
//!
//! - [`InMemoryStore`]: process memory, with an availability switch for
//!   exercising degraded paths
//! - [`FileStore`]: in-memory reads plus an atomically rewritten JSON snapshot
//!
//! # Example
//!
//! ```rust
//! use warden_store::{InMemoryStore, MembershipStore};
//! use warden_core::{ChatId, DisplayName, QuarantineRecord, UserId};
//!
//! # tokio_test::block_on(async {
//! let store = InMemoryStore::new();
//! assert!(store.get_quarantine(UserId(1)).await?.is_none());
//!
//! let record = QuarantineRecord::new(UserId(1), ChatId(-5), DisplayName::new("Ann"));
//! store.upsert_quarantine(&record).await?;
//! assert_eq!(store.get_quarantine(UserId(1)).await?, Some(record));
//! # Ok::<(), warden_error::WardenError>(())
//! # }).unwrap();
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod file;
mod memory;
mod store;

pub use file::FileStore;
pub use memory::{InMemoryStore, StoreSnapshot};
pub use store::{GroupFilter, MembershipStore};
