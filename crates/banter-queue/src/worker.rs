// SPDX-FileCopyrightText: 2026 Banter Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Bounded worker pool consuming the generation job queue.
//!
//! Each worker loops: lease the oldest due job, take a throughput token,
//! call the AI collaborator, append the reply, delete the job. Recoverable
//! failures (provider errors, timeouts) re-queue with backoff until the
//! attempt cap parks the job in the dead set. Any other processing error
//! purges the entire queue before being surfaced — the poison-job
//! fail-safe.
//!
//! Workers stop leasing when the cancellation token fires; in-flight jobs
//! finish naturally. The binary enforces the forced-termination grace
//! deadline on top.

use std::sync::Arc;
use std::time::Duration;

use banter_cache::ListingCache;
use banter_config::model::QueueConfig;
use banter_core::types::{Job, Sender};
use banter_core::{BanterError, ReplyProvider};
use banter_storage::queries::chatrooms;
use banter_storage::queries::jobs::{self, FailOutcome};
use banter_storage::Database;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::Throttle;

/// Bounded pool of queue consumers.
pub struct WorkerPool {
    db: Database,
    provider: Arc<dyn ReplyProvider>,
    cache: Arc<ListingCache>,
    config: QueueConfig,
    provider_timeout: Duration,
    throttle: Arc<Throttle>,
}

impl WorkerPool {
    pub fn new(
        db: Database,
        provider: Arc<dyn ReplyProvider>,
        cache: Arc<ListingCache>,
        config: QueueConfig,
        provider_timeout: Duration,
    ) -> Self {
        let throttle = Arc::new(Throttle::per_second(config.starts_per_sec));
        Self {
            db,
            provider,
            cache,
            config,
            provider_timeout,
            throttle,
        }
    }

    /// Spawn the configured number of workers. The returned set joins
    /// when every worker has observed cancellation and drained.
    pub fn spawn(self: &Arc<Self>, cancel: CancellationToken) -> JoinSet<()> {
        let mut workers = JoinSet::new();
        for worker_id in 0..self.config.concurrency {
            let pool = Arc::clone(self);
            let cancel = cancel.clone();
            workers.spawn(async move {
                pool.worker_loop(worker_id, cancel).await;
            });
        }
        info!(
            concurrency = self.config.concurrency,
            starts_per_sec = self.config.starts_per_sec,
            "worker pool started"
        );
        workers
    }

    async fn worker_loop(&self, worker_id: usize, cancel: CancellationToken) {
        loop {
            if cancel.is_cancelled() {
                debug!(worker_id, "worker shutting down");
                break;
            }

            match jobs::lease(&self.db).await {
                Ok(Some(job)) => {
                    // The throughput cap applies to job starts, not polls.
                    self.throttle.acquire().await;
                    self.run_job(worker_id, job).await;
                }
                Ok(None) => {
                    let idle = Duration::from_millis(self.config.poll_interval_ms);
                    tokio::select! {
                        _ = tokio::time::sleep(idle) => {}
                        _ = cancel.cancelled() => {}
                    }
                }
                Err(e) => {
                    error!(worker_id, error = %e, "failed to lease job");
                    let idle = Duration::from_millis(self.config.poll_interval_ms);
                    tokio::select! {
                        _ = tokio::time::sleep(idle) => {}
                        _ = cancel.cancelled() => {}
                    }
                }
            }
        }
    }

    async fn run_job(&self, worker_id: usize, job: Job) {
        debug!(
            worker_id,
            job_id = job.id,
            chatroom_id = job.chatroom_id.as_str(),
            attempts = job.attempts,
            "processing generation job"
        );

        match self.process(&job).await {
            Ok(()) => {
                if let Err(e) = jobs::complete(&self.db, job.id).await {
                    error!(job_id = job.id, error = %e, "failed to discard completed job");
                } else {
                    info!(
                        job_id = job.id,
                        chatroom_id = job.chatroom_id.as_str(),
                        "generation job completed"
                    );
                }
            }
            Err(err) if err.is_retryable() => {
                warn!(job_id = job.id, error = %err, "generation job failed");
                match jobs::fail(
                    &self.db,
                    job.id,
                    &err.to_string(),
                    self.config.max_attempts,
                    self.config.backoff_base_ms,
                    self.config.dead_set_cap,
                )
                .await
                {
                    Ok(FailOutcome::Retried { attempts, delay_ms }) => {
                        debug!(job_id = job.id, attempts, delay_ms, "job re-queued with backoff");
                    }
                    Ok(FailOutcome::Dead { attempts }) => {
                        warn!(job_id = job.id, attempts, "job moved to dead set");
                    }
                    Err(e) => {
                        error!(job_id = job.id, error = %e, "failed to record job failure");
                    }
                }
            }
            Err(err) => {
                // Poison-job fail-safe: a non-recoverable processing error
                // drops every job in every state before being surfaced.
                error!(
                    job_id = job.id,
                    error = %err,
                    "non-recoverable job error, purging queue"
                );
                match jobs::purge_all(&self.db).await {
                    Ok(purged) => {
                        warn!(purged, "queue purged after non-recoverable job error");
                    }
                    Err(e) => error!(error = %e, "queue purge failed"),
                }
            }
        }
    }

    /// One processing attempt: generate, append, invalidate the listing.
    async fn process(&self, job: &Job) -> Result<(), BanterError> {
        let reply = tokio::time::timeout(
            self.provider_timeout,
            self.provider.generate_reply(&job.content),
        )
        .await
        .map_err(|_| BanterError::Timeout {
            duration: self.provider_timeout,
        })??;

        chatrooms::append_message(&self.db, &job.user_id, &job.chatroom_id, Sender::Ai, &reply)
            .await?;
        self.cache.invalidate(&job.user_id);
        Ok(())
    }
}
