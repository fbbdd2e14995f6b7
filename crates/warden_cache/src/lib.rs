//! Time-to-live caching for moderation lookups.
//!
//! This crate provides the in-process cache that sits in front of the
//! membership store, so that high-frequency membership events do not
//! repeatedly hit the backing store.

#![warn(missing_docs)]

mod cache;
mod sweeper;

pub use cache::{CacheEntry, CacheStats, TtlCache, TtlCacheConfig, TtlCacheConfigBuilder};
pub use sweeper::SweepHandle;
