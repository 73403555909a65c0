// SPDX-FileCopyrightText: 2026 Banter Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Anthropic Messages API implementation of [`ReplyProvider`].
//!
//! One HTTP attempt per call: the job queue owns retry policy, so the
//! client surfaces failures as retryable errors instead of retrying
//! internally.

pub mod client;
pub mod types;

pub use client::AnthropicProvider;
