// SPDX-FileCopyrightText: 2026 Banter Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite persistence layer for the Banter chat backend.
//!
//! Provides WAL-mode SQLite storage with embedded migrations, a
//! single-writer concurrency model via `tokio-rusqlite`, and typed query
//! modules for chatrooms and messages, the durable generation job queue,
//! subscriptions, per-user rate counters, and processed webhook events.
//!
//! The single-writer model is load-bearing: the quota counter's
//! check-and-increment and the queue's lease transaction are atomic
//! because every write funnels through one background thread.

pub mod database;
pub mod migrations;
pub mod models;
pub mod queries;

pub use database::Database;
pub use models::*;
