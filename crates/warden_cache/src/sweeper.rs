//! Background purge of expired cache entries.

use crate::TtlCache;
use std::fmt::Debug;
use std::hash::Hash;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio::time::{MissedTickBehavior, interval_at};
use tracing::{debug, info};

/// Handle to a running sweep task.
///
/// The sweep stops when the handle is dropped, when [`SweepHandle::stop`] is
/// called, or when every clone of the cache has been dropped.
#[derive(Debug)]
pub struct SweepHandle {
    handle: JoinHandle<()>,
}

impl SweepHandle {
    /// Stop the sweep task.
    pub fn stop(self) {
        drop(self);
    }

    /// Whether the sweep task has exited.
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

impl Drop for SweepHandle {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

impl<K, V> TtlCache<K, V>
where
    K: Eq + Hash + Clone + Debug + Send + 'static,
    V: Clone + Send + 'static,
{
    /// Spawn the periodic sweep on the current tokio runtime.
    ///
    /// Every `sweep_interval` the task purges all expired entries, bounding
    /// growth from keys that are never read again. The task holds only a weak
    /// reference to the cache.
    pub fn spawn_sweeper(&self) -> SweepHandle
    where
        K: Sync,
        V: Sync,
    {
        let period = self.inner.config.sweep_interval();
        let name = self.inner.name;
        let weak = Arc::downgrade(&self.inner);

        info!(cache = name, ?period, "Starting cache sweeper");

        let handle = tokio::spawn(async move {
            let mut ticker = interval_at(tokio::time::Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                let Some(inner) = weak.upgrade() else {
                    debug!(cache = name, "Cache dropped, stopping sweeper");
                    break;
                };
                let removed = inner.purge_expired();
                if removed > 0 {
                    debug!(cache = name, removed, "Sweep removed expired entries");
                }
            }
        });

        SweepHandle { handle }
    }
}
