// SPDX-FileCopyrightText: 2026 Banter Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Banter chat backend.

use thiserror::Error;

/// The primary error type used across all Banter crates.
///
/// The gateway owns the single translation from these variants to HTTP
/// statuses; everything below the gateway just propagates them.
#[derive(Debug, Error)]
pub enum BanterError {
    /// Malformed input (bad request body, empty content, invalid ids).
    #[error("validation error: {0}")]
    Validation(String),

    /// A referenced resource does not exist or is not visible to the caller.
    #[error("{resource} not found")]
    NotFound { resource: String },

    /// Missing or invalid credentials.
    #[error("authentication error: {0}")]
    Auth(String),

    /// The caller's daily prompt quota is exhausted.
    #[error("rate limit exceeded: {message}")]
    RateLimitExceeded { message: String },

    /// A call to an external collaborator (AI provider, payment provider)
    /// failed. Retryable when encountered inside a queued job.
    #[error("external service error: {message}")]
    ExternalService {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Webhook signature verification failed. Never retryable: the
    /// delivery must not be reprocessed as-is.
    #[error("signature verification failed: {0}")]
    Signature(String),

    /// Storage backend errors (connection, query failure, serialization).
    #[error("storage error: {source}")]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Configuration errors (missing secrets, invalid values).
    #[error("configuration error: {0}")]
    Config(String),

    /// Operation timed out. Retryable when encountered inside a queued job.
    #[error("operation timed out after {duration:?}")]
    Timeout { duration: std::time::Duration },

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl BanterError {
    /// Whether a queued job failing with this error should be re-queued
    /// with backoff rather than escalated.
    ///
    /// Collaborator failures and timeouts are transient; everything else
    /// (missing chatroom, storage fault) trips the queue's fail-safe.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            BanterError::ExternalService { .. } | BanterError::Timeout { .. }
        )
    }

    /// Shorthand for a `NotFound` with the given resource label.
    pub fn not_found(resource: impl Into<String>) -> Self {
        BanterError::NotFound {
            resource: resource.into(),
        }
    }
}
