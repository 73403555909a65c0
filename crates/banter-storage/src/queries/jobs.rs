// SPDX-FileCopyrightText: 2026 Banter Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Durable generation job queue.
//!
//! Jobs are persisted before `enqueue` returns, leased atomically, and
//! deleted on completion. Recoverable failures re-queue with exponential
//! backoff until the attempt cap, then land in the bounded dead set
//! (oldest evicted first).

use banter_core::BanterError;
use chrono::{Duration, Utc};
use rusqlite::params;

use crate::database::Database;
use crate::models::{Job, JobPayload, JobState};
use crate::queries::{now_rfc3339, parse_enum};

/// What happened to a job that failed an attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailOutcome {
    /// Re-queued; leasable again after `delay_ms`.
    Retried { attempts: i64, delay_ms: i64 },
    /// Attempt cap reached; parked in the dead set.
    Dead { attempts: i64 },
}

/// Backoff delay for a job that has now failed `attempts` times:
/// `base_ms`, then doubling (base, 2*base, 4*base, ...).
pub fn backoff_delay_ms(base_ms: i64, attempts: i64) -> i64 {
    let doublings = (attempts - 1).clamp(0, 32) as u32;
    base_ms.saturating_mul(1_i64 << doublings)
}

/// Durably persist a new waiting job. Returns the job id.
///
/// The row is committed before this returns, which is what lets the
/// send-message request complete without waiting for generation.
pub async fn enqueue(db: &Database, payload: &JobPayload) -> Result<i64, BanterError> {
    let payload = payload.clone();
    let next_run_at = now_rfc3339();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO jobs (chatroom_id, user_id, content, state, next_run_at)
                 VALUES (?1, ?2, ?3, 'waiting', ?4)",
                params![payload.chatroom_id, payload.user_id, payload.content, next_run_at],
            )?;
            Ok(conn.last_insert_rowid())
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Lease the oldest due waiting job, marking it active.
///
/// Select and mark happen in one transaction, so two workers can never
/// lease the same job. Returns `None` when nothing is due.
pub async fn lease(db: &Database) -> Result<Option<Job>, BanterError> {
    db.connection()
        .call(move |conn| {
            let tx = conn.transaction()?;

            let result = {
                let mut stmt = tx.prepare(
                    "SELECT id, chatroom_id, user_id, content, state, attempts,
                            next_run_at, last_error, created_at, updated_at
                     FROM jobs
                     WHERE state = 'waiting'
                       AND next_run_at <= strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
                     ORDER BY id ASC
                     LIMIT 1",
                )?;
                stmt.query_row([], |row| {
                    let state: String = row.get(4)?;
                    Ok(Job {
                        id: row.get(0)?,
                        chatroom_id: row.get(1)?,
                        user_id: row.get(2)?,
                        content: row.get(3)?,
                        state: parse_enum::<JobState>(4, &state)?,
                        attempts: row.get(5)?,
                        next_run_at: row.get(6)?,
                        last_error: row.get(7)?,
                        created_at: row.get(8)?,
                        updated_at: row.get(9)?,
                    })
                })
            };

            match result {
                Ok(job) => {
                    tx.execute(
                        "UPDATE jobs SET state = 'active',
                         updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
                         WHERE id = ?1",
                        params![job.id],
                    )?;
                    tx.commit()?;

                    Ok(Some(Job {
                        state: JobState::Active,
                        ..job
                    }))
                }
                Err(rusqlite::Error::QueryReturnedNoRows) => {
                    tx.commit()?;
                    Ok(None)
                }
                Err(e) => Err(e.into()),
            }
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Acknowledge successful processing. Completed jobs are discarded.
pub async fn complete(db: &Database, id: i64) -> Result<(), BanterError> {
    db.connection()
        .call(move |conn| {
            conn.execute("DELETE FROM jobs WHERE id = ?1", params![id])?;
            Ok(())
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Record a failed attempt.
///
/// Below the attempt cap the job returns to `waiting` with an exponential
/// backoff delay; at the cap it moves to the dead set, which is trimmed
/// to `dead_set_cap` rows by evicting the oldest.
pub async fn fail(
    db: &Database,
    id: i64,
    error: &str,
    max_attempts: i64,
    backoff_base_ms: i64,
    dead_set_cap: i64,
) -> Result<FailOutcome, BanterError> {
    let error = error.to_string();
    db.connection()
        .call(move |conn| {
            let tx = conn.transaction()?;

            let attempts: i64 = tx.query_row(
                "SELECT attempts FROM jobs WHERE id = ?1",
                params![id],
                |row| row.get(0),
            )?;
            let new_attempts = attempts + 1;

            let outcome = if new_attempts >= max_attempts {
                tx.execute(
                    "UPDATE jobs SET state = 'dead', attempts = ?1, last_error = ?2,
                     updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
                     WHERE id = ?3",
                    params![new_attempts, error, id],
                )?;
                // Bound the dead set, oldest first.
                tx.execute(
                    "DELETE FROM jobs WHERE state = 'dead' AND id NOT IN
                     (SELECT id FROM jobs WHERE state = 'dead' ORDER BY id DESC LIMIT ?1)",
                    params![dead_set_cap],
                )?;
                FailOutcome::Dead {
                    attempts: new_attempts,
                }
            } else {
                let delay_ms = backoff_delay_ms(backoff_base_ms, new_attempts);
                let next_run_at = (Utc::now() + Duration::milliseconds(delay_ms))
                    .to_rfc3339_opts(chrono::SecondsFormat::Millis, true);
                tx.execute(
                    "UPDATE jobs SET state = 'waiting', attempts = ?1, last_error = ?2,
                     next_run_at = ?3,
                     updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
                     WHERE id = ?4",
                    params![new_attempts, error, next_run_at, id],
                )?;
                FailOutcome::Retried {
                    attempts: new_attempts,
                    delay_ms,
                }
            };

            tx.commit()?;
            Ok(outcome)
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Drop every job in every state. Returns the number of rows removed.
///
/// This is the queue's blunt fail-safe against a poison job stalling the
/// pipeline; callers escalate to it only on non-recoverable processing
/// errors.
pub async fn purge_all(db: &Database) -> Result<usize, BanterError> {
    db.connection()
        .call(|conn| {
            let purged = conn.execute("DELETE FROM jobs", [])?;
            Ok(purged)
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Return jobs left `active` by a crash to `waiting` so they lease again.
pub async fn requeue_stale_active(db: &Database) -> Result<usize, BanterError> {
    db.connection()
        .call(|conn| {
            let requeued = conn.execute(
                "UPDATE jobs SET state = 'waiting',
                 updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
                 WHERE state = 'active'",
                [],
            )?;
            Ok(requeued)
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Fetch a job by id.
pub async fn get_job(db: &Database, id: i64) -> Result<Option<Job>, BanterError> {
    db.connection()
        .call(move |conn| {
            let result = conn.query_row(
                "SELECT id, chatroom_id, user_id, content, state, attempts,
                        next_run_at, last_error, created_at, updated_at
                 FROM jobs WHERE id = ?1",
                params![id],
                |row| {
                    let state: String = row.get(4)?;
                    Ok(Job {
                        id: row.get(0)?,
                        chatroom_id: row.get(1)?,
                        user_id: row.get(2)?,
                        content: row.get(3)?,
                        state: parse_enum::<JobState>(4, &state)?,
                        attempts: row.get(5)?,
                        next_run_at: row.get(6)?,
                        last_error: row.get(7)?,
                        created_at: row.get(8)?,
                        updated_at: row.get(9)?,
                    })
                },
            );
            match result {
                Ok(job) => Ok(Some(job)),
                Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                Err(e) => Err(e.into()),
            }
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Count jobs in the given state.
pub async fn count_in_state(db: &Database, state: JobState) -> Result<i64, BanterError> {
    let state = state.to_string();
    db.connection()
        .call(move |conn| {
            let count = conn.query_row(
                "SELECT COUNT(*) FROM jobs WHERE state = ?1",
                params![state],
                |row| row.get(0),
            )?;
            Ok(count)
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Count all jobs regardless of state.
pub async fn count_all(db: &Database) -> Result<i64, BanterError> {
    db.connection()
        .call(|conn| {
            let count = conn.query_row("SELECT COUNT(*) FROM jobs", [], |row| row.get(0))?;
            Ok(count)
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Dead jobs, oldest first.
pub async fn dead_jobs(db: &Database) -> Result<Vec<Job>, BanterError> {
    db.connection()
        .call(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, chatroom_id, user_id, content, state, attempts,
                        next_run_at, last_error, created_at, updated_at
                 FROM jobs WHERE state = 'dead'
                 ORDER BY id ASC",
            )?;
            let rows = stmt.query_map([], |row| {
                let state: String = row.get(4)?;
                Ok(Job {
                    id: row.get(0)?,
                    chatroom_id: row.get(1)?,
                    user_id: row.get(2)?,
                    content: row.get(3)?,
                    state: parse_enum::<JobState>(4, &state)?,
                    attempts: row.get(5)?,
                    next_run_at: row.get(6)?,
                    last_error: row.get(7)?,
                    created_at: row.get(8)?,
                    updated_at: row.get(9)?,
                })
            })?;
            let mut jobs = Vec::new();
            for row in rows {
                jobs.push(row?);
            }
            Ok(jobs)
        })
        .await
        .map_err(crate::database::map_tr_err)
}
