//! Long-poll update loop.

use crate::EventRouter;
use async_trait::async_trait;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, error, info, instrument};
use warden_error::WardenResult;
use warden_social::{TelegramClient, Update};

/// Wait after a failed poll before trying again.
pub const POLL_BACKOFF: Duration = Duration::from_secs(5);

/// Source of inbound updates.
#[async_trait]
pub trait UpdateSource: Send + Sync {
    /// Updates with id at least `offset`, waiting up to `timeout`.
    async fn fetch(&self, offset: i64, timeout: Duration) -> WardenResult<Vec<Update>>;
}

#[async_trait]
impl UpdateSource for TelegramClient {
    async fn fetch(&self, offset: i64, timeout: Duration) -> WardenResult<Vec<Update>> {
        self.get_updates(offset, timeout).await
    }
}

/// Pulls updates and hands them to the router one at a time.
///
/// Errors never stop the loop; it waits [`POLL_BACKOFF`] and polls again.
/// Only the shutdown signal ends it.
pub struct Poller<S> {
    source: S,
    router: EventRouter,
    timeout: Duration,
    offset: i64,
}

impl<S: UpdateSource> Poller<S> {
    /// Create a poller starting from the oldest unconfirmed update.
    pub fn new(source: S, router: EventRouter, timeout: Duration) -> Self {
        Self {
            source,
            router,
            timeout,
            offset: 0,
        }
    }

    /// Next offset to request.
    pub fn offset(&self) -> i64 {
        self.offset
    }

    /// Poll until `shutdown` turns true. Returns the number of updates routed.
    #[instrument(skip_all)]
    pub async fn run(mut self, mut shutdown: watch::Receiver<bool>) -> u64 {
        info!(timeout = ?self.timeout, "Polling for updates");
        let mut routed = 0;

        loop {
            if *shutdown.borrow() {
                break;
            }

            let batch = tokio::select! {
                _ = shutdown.changed() => break,
                batch = self.source.fetch(self.offset, self.timeout) => batch,
            };

            match batch {
                Ok(updates) => {
                    for update in updates {
                        self.offset = self.offset.max(update.update_id + 1);
                        let outcome = self.router.route(update).await;
                        debug!(?outcome, "Update routed");
                        routed += 1;
                    }
                }
                Err(e) => {
                    error!(error = %e, backoff = ?POLL_BACKOFF, "Polling failed");
                    tokio::select! {
                        _ = shutdown.changed() => break,
                        _ = tokio::time::sleep(POLL_BACKOFF) => {}
                    }
                }
            }
        }

        info!(routed, offset = self.offset, "Polling stopped");
        routed
    }
}
