use crate::{BotConfig, EventRouter, Poller, ServiceContext, serve};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{error, info, instrument};
use warden_error::WardenResult;
use warden_social::TelegramClient;
use warden_store::{FileStore, InMemoryStore, MembershipStore};

/// Bot server that wires the store, platform client, poller and health API.
pub struct BotServer {
    config: BotConfig,
}

impl BotServer {
    /// Creates a new bot server.
    pub fn new(config: BotConfig) -> Self {
        Self { config }
    }

    /// Open the configured store: a snapshot file if a path is set,
    /// otherwise memory only.
    pub async fn open_store(config: &BotConfig) -> WardenResult<Arc<dyn MembershipStore>> {
        match config.store().path() {
            Some(path) => {
                let store = FileStore::open(path).await?;
                info!(path = %path.display(), "Using file store");
                Ok(Arc::new(store))
            }
            None => {
                info!("Using in-memory store; state is lost on restart");
                Ok(Arc::new(InMemoryStore::new()))
            }
        }
    }

    /// Run until `shutdown` turns true.
    ///
    /// Fails only at start-up: an unreadable store, a rejected token or an
    /// unusable bind address.
    #[instrument(skip_all)]
    pub async fn run(self, shutdown: watch::Receiver<bool>) -> WardenResult<()> {
        info!("Starting warden");

        let store = Self::open_store(&self.config).await?;
        let telegram = self.config.telegram();
        let client = TelegramClient::connect(telegram.api_url(), telegram.token()).await?;
        let poll_timeout = telegram.poll_timeout();

        let bind = if *self.config.http().enabled() {
            Some(self.config.bind_addr()?)
        } else {
            None
        };

        let platform = Arc::new(client.clone());
        let ctx = Arc::new(ServiceContext::new(self.config, store, platform));
        let _sweepers = ctx.spawn_sweepers();

        let api = bind.map(|addr| {
            let ctx = Arc::clone(&ctx);
            let shutdown = shutdown.clone();
            tokio::spawn(async move {
                if let Err(e) = serve(addr, ctx, shutdown).await {
                    error!(error = %e, "Health API stopped");
                }
            })
        });

        let router = EventRouter::new(Arc::clone(&ctx));
        let routed = Poller::new(client, router, poll_timeout).run(shutdown).await;

        if let Some(api) = api {
            if let Err(e) = api.await {
                error!(error = %e, "Health API task failed");
            }
        }
        let cancelled = ctx.shutdown();
        info!(routed, cancelled_follow_ups = cancelled, "Warden stopped");
        Ok(())
    }
}
