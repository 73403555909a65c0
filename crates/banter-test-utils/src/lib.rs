// SPDX-FileCopyrightText: 2026 Banter Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for Banter integration tests.
//!
//! Provides [`TestHarness`], which assembles the full pipeline (temp
//! SQLite, cache, queue, limiter, ingestor) around a scriptable
//! [`MockProvider`], so e2e tests run without network access.

pub mod harness;
pub mod mock_provider;

pub use harness::{TestHarness, TestHarnessBuilder};
pub use mock_provider::MockProvider;
