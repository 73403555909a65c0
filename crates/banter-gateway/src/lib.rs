// SPDX-FileCopyrightText: 2026 Banter Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP gateway for the Banter chat backend, built on axum.
//!
//! Exposes the chatroom API (create/list/get/send), the subscription
//! status endpoint, the billing webhook, and an unauthenticated health
//! probe. Send-message enqueues a generation job and returns immediately;
//! replies arrive asynchronously via the worker pool.

pub mod auth;
pub mod error;
pub mod handlers;
pub mod server;

pub use auth::AuthConfig;
pub use server::{start_server, GatewayState, ServerConfig};
