// SPDX-FileCopyrightText: 2026 Banter Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the Banter chat backend.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use serde::{Deserialize, Serialize};

/// Top-level Banter configuration.
///
/// Loaded from TOML files following XDG hierarchy, with environment
/// variable overrides. All sections are optional and default to sensible
/// values; secrets (provider API key, webhook secret) must be supplied
/// before `serve` will start.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct BanterConfig {
    /// HTTP server settings.
    #[serde(default)]
    pub server: ServerConfig,

    /// Storage backend settings.
    #[serde(default)]
    pub storage: StorageConfig,

    /// AI provider settings.
    #[serde(default)]
    pub provider: ProviderConfig,

    /// Generation job queue and worker pool settings.
    #[serde(default)]
    pub queue: QueueConfig,

    /// Chatroom listing cache settings.
    #[serde(default)]
    pub cache: CacheConfig,

    /// Daily prompt quota settings.
    #[serde(default)]
    pub quota: QuotaConfig,

    /// Billing webhook settings.
    #[serde(default)]
    pub billing: BillingConfig,
}

/// HTTP server configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    /// Host address to bind.
    #[serde(default = "default_host")]
    pub host: String,

    /// Port to bind.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Bearer token for API auth. `None` rejects all requests (fail-closed).
    #[serde(default)]
    pub bearer_token: Option<String>,

    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Seconds to wait for in-flight work before forcing shutdown.
    #[serde(default = "default_shutdown_grace_secs")]
    pub shutdown_grace_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            bearer_token: None,
            log_level: default_log_level(),
            shutdown_grace_secs: default_shutdown_grace_secs(),
        }
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_shutdown_grace_secs() -> u64 {
    5
}

/// Storage backend configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_database_path")]
    pub database_path: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
        }
    }
}

fn default_database_path() -> String {
    "banter.db".to_string()
}

/// AI provider configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ProviderConfig {
    /// Provider API key. `None` requires the environment variable.
    #[serde(default)]
    pub api_key: Option<String>,

    /// Model to use for reply generation.
    #[serde(default = "default_model")]
    pub model: String,

    /// Maximum tokens to generate per reply.
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// Provider API version string.
    #[serde(default = "default_api_version")]
    pub api_version: String,

    /// Per-call deadline. A timeout counts as a recoverable job failure.
    #[serde(default = "default_provider_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: default_model(),
            max_tokens: default_max_tokens(),
            api_version: default_api_version(),
            timeout_secs: default_provider_timeout_secs(),
        }
    }
}

fn default_model() -> String {
    "claude-sonnet-4-20250514".to_string()
}

fn default_max_tokens() -> u32 {
    1024
}

fn default_api_version() -> String {
    "2023-06-01".to_string()
}

fn default_provider_timeout_secs() -> u64 {
    60
}

/// Generation queue and worker pool configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct QueueConfig {
    /// Maximum jobs leased/executing at once.
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,

    /// Maximum job starts per second across all workers.
    #[serde(default = "default_starts_per_sec")]
    pub starts_per_sec: u32,

    /// Attempts before a job is moved to the dead set.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: i64,

    /// Base retry delay in milliseconds; doubles each attempt.
    #[serde(default = "default_backoff_base_ms")]
    pub backoff_base_ms: i64,

    /// Maximum dead jobs retained; oldest evicted first.
    #[serde(default = "default_dead_set_cap")]
    pub dead_set_cap: i64,

    /// How long an idle worker sleeps before re-polling the queue.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            concurrency: default_concurrency(),
            starts_per_sec: default_starts_per_sec(),
            max_attempts: default_max_attempts(),
            backoff_base_ms: default_backoff_base_ms(),
            dead_set_cap: default_dead_set_cap(),
            poll_interval_ms: default_poll_interval_ms(),
        }
    }
}

fn default_concurrency() -> usize {
    5
}

fn default_starts_per_sec() -> u32 {
    30
}

fn default_max_attempts() -> i64 {
    3
}

fn default_backoff_base_ms() -> i64 {
    2000
}

fn default_dead_set_cap() -> i64 {
    100
}

fn default_poll_interval_ms() -> u64 {
    250
}

/// Chatroom listing cache configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct CacheConfig {
    /// Time-to-live for cached chatroom listings, in seconds.
    #[serde(default = "default_listing_ttl_secs")]
    pub listing_ttl_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            listing_ttl_secs: default_listing_ttl_secs(),
        }
    }
}

fn default_listing_ttl_secs() -> u64 {
    600
}

/// Daily prompt quota configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct QuotaConfig {
    /// Prompts per UTC calendar day for non-pro users.
    #[serde(default = "default_daily_prompt_limit")]
    pub daily_prompt_limit: i64,
}

impl Default for QuotaConfig {
    fn default() -> Self {
        Self {
            daily_prompt_limit: default_daily_prompt_limit(),
        }
    }
}

fn default_daily_prompt_limit() -> i64 {
    5
}

/// Billing webhook configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct BillingConfig {
    /// Shared secret for webhook signature verification.
    /// `None` disables the webhook endpoint.
    #[serde(default)]
    pub webhook_secret: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_reference_tuning() {
        let config = BanterConfig::default();
        assert_eq!(config.queue.concurrency, 5);
        assert_eq!(config.queue.starts_per_sec, 30);
        assert_eq!(config.queue.max_attempts, 3);
        assert_eq!(config.queue.backoff_base_ms, 2000);
        assert_eq!(config.queue.dead_set_cap, 100);
        assert_eq!(config.cache.listing_ttl_secs, 600);
        assert_eq!(config.quota.daily_prompt_limit, 5);
        assert_eq!(config.server.shutdown_grace_secs, 5);
    }

    #[test]
    fn secrets_default_to_none() {
        let config = BanterConfig::default();
        assert!(config.server.bearer_token.is_none());
        assert!(config.provider.api_key.is_none());
        assert!(config.billing.webhook_secret.is_none());
    }
}
