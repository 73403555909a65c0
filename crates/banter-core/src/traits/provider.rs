// SPDX-FileCopyrightText: 2026 Banter Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Seam for the AI collaborator: text in, text out, or failure.

use async_trait::async_trait;

use crate::error::BanterError;

/// Generates assistant replies for queued jobs.
///
/// The pipeline treats the provider as a black box. Failures should be
/// reported as [`BanterError::ExternalService`] (or [`BanterError::Timeout`]
/// by the caller's deadline) so the queue applies its backoff policy.
#[async_trait]
pub trait ReplyProvider: Send + Sync {
    /// Generate a reply for the given prompt text.
    async fn generate_reply(&self, prompt: &str) -> Result<String, BanterError>;
}
