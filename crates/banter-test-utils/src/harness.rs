// SPDX-FileCopyrightText: 2026 Banter Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test harness for end-to-end integration testing.
//!
//! `TestHarness` assembles the complete pipeline around a temp SQLite
//! database: cache, producer queue handle, quota limiter, webhook
//! ingestor, and a worker pool wired to a [`MockProvider`]. Its
//! `send_message()` mirrors the gateway's send pipeline (gate, append,
//! enqueue, invalidate); workers run only when a test starts them, which
//! is what makes the asynchronous decoupling observable.

use std::sync::Arc;
use std::time::Duration;

use banter_billing::{signature, IngestOutcome, WebhookIngestor};
use banter_cache::ListingCache;
use banter_config::model::QueueConfig;
use banter_core::types::{Chatroom, JobPayload, Sender};
use banter_core::BanterError;
use banter_queue::{JobQueue, WorkerPool};
use banter_quota::RateLimiter;
use banter_storage::queries::{chatrooms, jobs};
use banter_storage::Database;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

use crate::mock_provider::{MockProvider, ScriptedReply};

/// Builder for creating test environments with configurable options.
pub struct TestHarnessBuilder {
    script: Vec<ScriptedReply>,
    backoff_base_ms: i64,
    max_attempts: i64,
    dead_set_cap: i64,
    concurrency: usize,
    daily_limit: i64,
    cache_ttl: Duration,
    webhook_secret: String,
}

impl TestHarnessBuilder {
    fn new() -> Self {
        Self {
            script: Vec::new(),
            // Fast backoff so retry tests complete in milliseconds; the
            // doubling schedule is what matters, not the base.
            backoff_base_ms: 20,
            max_attempts: 3,
            dead_set_cap: 100,
            concurrency: 2,
            daily_limit: 5,
            cache_ttl: Duration::from_secs(600),
            webhook_secret: "whsec_test".to_string(),
        }
    }

    /// Script provider replies, in order.
    pub fn with_replies(mut self, replies: Vec<String>) -> Self {
        self.script = replies.into_iter().map(Ok).collect();
        self
    }

    /// Script mixed replies and transient failures.
    pub fn with_script(mut self, script: Vec<ScriptedReply>) -> Self {
        self.script = script;
        self
    }

    /// Override the retry backoff base.
    pub fn with_backoff_base_ms(mut self, base_ms: i64) -> Self {
        self.backoff_base_ms = base_ms;
        self
    }

    /// Override the retry attempt cap.
    pub fn with_max_attempts(mut self, max_attempts: i64) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    /// Override the dead set bound.
    pub fn with_dead_set_cap(mut self, cap: i64) -> Self {
        self.dead_set_cap = cap;
        self
    }

    /// Override the daily prompt limit.
    pub fn with_daily_limit(mut self, limit: i64) -> Self {
        self.daily_limit = limit;
        self
    }

    /// Override the listing cache TTL.
    pub fn with_cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl = ttl;
        self
    }

    /// Build the test harness, creating all subsystems on a temp database.
    pub async fn build(self) -> Result<TestHarness, BanterError> {
        let temp_dir = tempfile::TempDir::new().map_err(|e| BanterError::Storage {
            source: e.into(),
        })?;
        let db_path = temp_dir.path().join("test.db");
        let db = Database::open(&db_path.to_string_lossy()).await?;

        let provider = Arc::new(MockProvider::with_script(self.script));
        let cache = Arc::new(ListingCache::new(self.cache_ttl));
        let queue = JobQueue::new(db.clone());
        let limiter = Arc::new(RateLimiter::new(db.clone(), self.daily_limit));
        let ingestor = Arc::new(WebhookIngestor::new(
            db.clone(),
            self.webhook_secret.clone(),
        ));

        let queue_config = QueueConfig {
            concurrency: self.concurrency,
            backoff_base_ms: self.backoff_base_ms,
            max_attempts: self.max_attempts,
            dead_set_cap: self.dead_set_cap,
            poll_interval_ms: 10,
            ..QueueConfig::default()
        };
        let pool = Arc::new(WorkerPool::new(
            db.clone(),
            provider.clone(),
            cache.clone(),
            queue_config,
            Duration::from_secs(5),
        ));

        Ok(TestHarness {
            provider,
            db,
            cache,
            queue,
            limiter,
            ingestor,
            pool,
            webhook_secret: self.webhook_secret,
            _temp_dir: temp_dir,
        })
    }
}

/// A complete test environment with mock provider and temp storage.
pub struct TestHarness {
    /// The scriptable mock provider.
    pub provider: Arc<MockProvider>,
    /// Single-writer database (temp file, cleaned up on drop).
    pub db: Database,
    /// Chatroom listing cache.
    pub cache: Arc<ListingCache>,
    /// Producer-side queue handle.
    pub queue: JobQueue,
    /// Daily prompt quota gate.
    pub limiter: Arc<RateLimiter>,
    /// Billing webhook ingestor.
    pub ingestor: Arc<WebhookIngestor>,
    /// Worker pool (idle until a test starts it).
    pub pool: Arc<WorkerPool>,
    /// Shared secret the harness signs webhook payloads with.
    pub webhook_secret: String,
    _temp_dir: tempfile::TempDir,
}

impl TestHarness {
    /// Create a new builder for configuring the test harness.
    pub fn builder() -> TestHarnessBuilder {
        TestHarnessBuilder::new()
    }

    /// Create a chatroom for a user, invalidating their listing.
    pub async fn create_chatroom(
        &self,
        user_id: &str,
        title: Option<&str>,
    ) -> Result<Chatroom, BanterError> {
        let chatroom = chatrooms::create_chatroom(&self.db, user_id, title).await?;
        self.cache.invalidate(user_id);
        Ok(chatroom)
    }

    /// Drive the gateway's send pipeline: quota gate, append the user
    /// message, enqueue the generation job, invalidate the listing.
    ///
    /// Returns the appended message id and the queued job id.
    pub async fn send_message(
        &self,
        user_id: &str,
        chatroom_id: &str,
        content: &str,
    ) -> Result<(String, i64), BanterError> {
        self.limiter.check(user_id).await?;

        let message =
            chatrooms::append_message(&self.db, user_id, chatroom_id, Sender::User, content)
                .await?;
        let job_id = self
            .queue
            .enqueue(&JobPayload {
                chatroom_id: chatroom_id.to_string(),
                user_id: user_id.to_string(),
                content: content.to_string(),
            })
            .await?;
        self.cache.invalidate(user_id);

        Ok((message.id, job_id))
    }

    /// Start the worker pool; returns the cancellation token and join set.
    pub fn start_workers(&self) -> (CancellationToken, JoinSet<()>) {
        let cancel = CancellationToken::new();
        let workers = self.pool.spawn(cancel.clone());
        (cancel, workers)
    }

    /// Run workers until the queue is empty (or the timeout passes), then
    /// stop them.
    pub async fn run_workers_until_drained(&self, timeout: Duration) {
        let (cancel, mut workers) = self.start_workers();

        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            let remaining = jobs::count_all(&self.db).await.unwrap_or(i64::MAX);
            if remaining == 0 {
                break;
            }
            if tokio::time::Instant::now() >= deadline {
                cancel.cancel();
                while workers.join_next().await.is_some() {}
                panic!("queue did not drain within {timeout:?}");
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }

        cancel.cancel();
        while workers.join_next().await.is_some() {}
    }

    /// Sign and deliver a webhook payload through the ingestor.
    pub async fn deliver_webhook(&self, payload: &[u8]) -> Result<IngestOutcome, BanterError> {
        let header = self.sign_webhook(payload);
        self.ingestor.ingest(payload, &header).await
    }

    /// Compute a valid signature header for a payload.
    pub fn sign_webhook(&self, payload: &[u8]) -> String {
        signature::sign(
            &self.webhook_secret,
            chrono::Utc::now().timestamp(),
            payload,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn builder_creates_working_environment() {
        let harness = TestHarness::builder().build().await.unwrap();
        let room = harness.create_chatroom("user-1", None).await.unwrap();
        assert_eq!(room.title, "New Chat");
    }

    #[tokio::test]
    async fn send_message_persists_and_enqueues() {
        let harness = TestHarness::builder().build().await.unwrap();
        let room = harness.create_chatroom("user-1", None).await.unwrap();

        let (message_id, job_id) = harness
            .send_message("user-1", &room.id, "hello")
            .await
            .unwrap();
        assert!(!message_id.is_empty());
        assert!(job_id > 0);

        let messages = chatrooms::list_messages(&harness.db, &room.id)
            .await
            .unwrap();
        assert_eq!(messages.len(), 1);
        assert_eq!(jobs::count_all(&harness.db).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn temp_db_is_unique_per_harness() {
        let h1 = TestHarness::builder().build().await.unwrap();
        let h2 = TestHarness::builder().build().await.unwrap();

        h1.create_chatroom("user-1", None).await.unwrap();
        let rooms1 = chatrooms::list_summaries(&h1.db, "user-1").await.unwrap();
        let rooms2 = chatrooms::list_summaries(&h2.db, "user-1").await.unwrap();
        assert_eq!(rooms1.len(), 1);
        assert!(rooms2.is_empty());
    }
}
