// SPDX-FileCopyrightText: 2026 Banter Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Validates semantic constraints that cannot be expressed via serde
//! attributes, such as non-empty paths and positive tuning parameters.

use crate::diagnostic::ConfigError;
use crate::model::BanterConfig;

/// Validate a deserialized configuration for semantic correctness.
///
/// Returns `Ok(())` if all validations pass, or `Err(Vec<ConfigError>)`
/// with all collected validation errors (does not fail fast).
pub fn validate_config(config: &BanterConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    if config.server.host.trim().is_empty() {
        errors.push(ConfigError::Validation {
            message: "server.host must not be empty".to_string(),
        });
    }

    if config.storage.database_path.trim().is_empty() {
        errors.push(ConfigError::Validation {
            message: "storage.database_path must not be empty".to_string(),
        });
    }

    if config.queue.concurrency == 0 {
        errors.push(ConfigError::Validation {
            message: "queue.concurrency must be at least 1".to_string(),
        });
    }

    if config.queue.starts_per_sec == 0 {
        errors.push(ConfigError::Validation {
            message: "queue.starts_per_sec must be at least 1".to_string(),
        });
    }

    if config.queue.max_attempts < 1 {
        errors.push(ConfigError::Validation {
            message: format!(
                "queue.max_attempts must be at least 1, got {}",
                config.queue.max_attempts
            ),
        });
    }

    if config.queue.backoff_base_ms < 1 {
        errors.push(ConfigError::Validation {
            message: format!(
                "queue.backoff_base_ms must be positive, got {}",
                config.queue.backoff_base_ms
            ),
        });
    }

    if config.queue.dead_set_cap < 0 {
        errors.push(ConfigError::Validation {
            message: format!(
                "queue.dead_set_cap must be non-negative, got {}",
                config.queue.dead_set_cap
            ),
        });
    }

    if config.cache.listing_ttl_secs == 0 {
        errors.push(ConfigError::Validation {
            message: "cache.listing_ttl_secs must be at least 1".to_string(),
        });
    }

    if config.quota.daily_prompt_limit < 1 {
        errors.push(ConfigError::Validation {
            message: format!(
                "quota.daily_prompt_limit must be at least 1, got {}",
                config.quota.daily_prompt_limit
            ),
        });
    }

    if let Some(ref secret) = config.billing.webhook_secret {
        if secret.trim().is_empty() {
            errors.push(ConfigError::Validation {
                message: "billing.webhook_secret must not be empty when set".to_string(),
            });
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
