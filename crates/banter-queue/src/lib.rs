// SPDX-FileCopyrightText: 2026 Banter Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Durable generation job queue and bounded worker pool.
//!
//! Producers push jobs through [`JobQueue::enqueue`], which persists the
//! job before returning — the HTTP request never waits for generation.
//! A [`WorkerPool`] of bounded concurrency leases jobs, calls the AI
//! collaborator, appends the reply, and commits the result, subject to a
//! shared token-bucket throughput cap.

pub mod throttle;
pub mod worker;

pub use throttle::Throttle;
pub use worker::WorkerPool;

use banter_core::types::JobPayload;
use banter_core::BanterError;
use banter_storage::queries::jobs;
use banter_storage::Database;

/// Producer-side handle to the durable job queue.
#[derive(Clone)]
pub struct JobQueue {
    db: Database,
}

impl JobQueue {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Durably persist a generation job and return its id.
    ///
    /// The job row is committed before this returns; workers pick it up
    /// independently.
    pub async fn enqueue(&self, payload: &JobPayload) -> Result<i64, BanterError> {
        jobs::enqueue(&self.db, payload).await
    }
}
