// SPDX-FileCopyrightText: 2026 Banter Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `banter serve` command implementation.
//!
//! Wires the full pipeline: SQLite storage, the Anthropic reply provider,
//! the listing cache, the quota limiter, the billing webhook ingestor,
//! the worker pool, and the HTTP gateway. All service handles are
//! constructed here and injected — no ambient globals.
//!
//! Shutdown order follows the queue-first rule: stop leasing, let
//! in-flight jobs finish within the grace deadline, force-terminate
//! stragglers, then close the database.

use std::sync::Arc;
use std::time::Duration;

use banter_anthropic::AnthropicProvider;
use banter_billing::WebhookIngestor;
use banter_cache::ListingCache;
use banter_config::model::BanterConfig;
use banter_core::{BanterError, ReplyProvider};
use banter_gateway::{AuthConfig, GatewayState, ServerConfig};
use banter_queue::{JobQueue, WorkerPool};
use banter_quota::RateLimiter;
use banter_storage::queries::jobs;
use banter_storage::Database;
use tracing::{error, info, warn};

use crate::shutdown;

/// Runs the `banter serve` command.
pub async fn run_serve(config: BanterConfig) -> Result<(), BanterError> {
    init_tracing(&config.server.log_level);

    info!("starting banter serve");

    // Fail-closed: refuse to start the gateway with no auth configured.
    if config.server.bearer_token.is_none() {
        return Err(BanterError::Config(
            "gateway requires authentication; set server.bearer_token \
             (or BANTER_SERVER_BEARER_TOKEN)"
                .to_string(),
        ));
    }

    // Storage (migrations run on open).
    let db = Database::open(&config.storage.database_path).await?;

    // Crash recovery: jobs left active by a previous run lease again.
    let requeued = jobs::requeue_stale_active(&db).await?;
    if requeued > 0 {
        info!(count = requeued, "re-queued jobs left active by a previous run");
    }

    // AI reply provider.
    let provider = AnthropicProvider::new(&config.provider).map_err(|e| {
        error!(error = %e, "failed to initialize reply provider");
        eprintln!(
            "error: Anthropic API key required. Set provider.api_key or ANTHROPIC_API_KEY."
        );
        e
    })?;
    let provider: Arc<dyn ReplyProvider> = Arc::new(provider);

    // Shared service handles.
    let cache = Arc::new(ListingCache::new(Duration::from_secs(
        config.cache.listing_ttl_secs,
    )));
    let queue = JobQueue::new(db.clone());
    let limiter = Arc::new(RateLimiter::new(
        db.clone(),
        config.quota.daily_prompt_limit,
    ));

    let ingestor = match config.billing.webhook_secret {
        Some(ref secret) => Some(Arc::new(WebhookIngestor::new(db.clone(), secret.clone()))),
        None => {
            info!("billing webhook disabled (no billing.webhook_secret configured)");
            None
        }
    };

    // Worker pool.
    let pool = Arc::new(WorkerPool::new(
        db.clone(),
        provider,
        cache.clone(),
        config.queue.clone(),
        Duration::from_secs(config.provider.timeout_secs),
    ));

    // Signal-driven cancellation shared by gateway and workers.
    let cancel = shutdown::install_signal_handler();
    let mut workers = pool.spawn(cancel.clone());

    // Gateway.
    let state = GatewayState {
        db: db.clone(),
        cache,
        queue,
        limiter,
        ingestor,
        auth: AuthConfig {
            bearer_token: config.server.bearer_token.clone(),
        },
    };
    let server_config = ServerConfig {
        host: config.server.host.clone(),
        port: config.server.port,
    };
    let server_result = banter_gateway::start_server(&server_config, state, cancel.clone()).await;
    if server_result.is_err() {
        // Server failed to start or crashed; take the workers down too.
        cancel.cancel();
    }

    // Drain: workers stop leasing on cancel and finish in-flight jobs;
    // after the grace deadline any stragglers are aborted.
    let grace = Duration::from_secs(config.server.shutdown_grace_secs);
    let drained = tokio::time::timeout(grace, async {
        while workers.join_next().await.is_some() {}
    })
    .await;
    match drained {
        Ok(()) => info!("worker pool drained"),
        Err(_) => {
            warn!(
                grace_secs = config.server.shutdown_grace_secs,
                "grace deadline reached, aborting remaining workers"
            );
            workers.shutdown().await;
        }
    }

    db.close().await?;
    server_result?;

    info!("banter serve shutdown complete");
    Ok(())
}

/// Initializes the tracing subscriber with the given log level.
fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("banter={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(false)
        .init();
}
