// SPDX-FileCopyrightText: 2026 Banter Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Integration tests for the Banter configuration system.

use banter_config::model::BanterConfig;
use banter_config::{load_and_validate_str, load_config_from_str};

/// Valid TOML with all known fields deserializes successfully.
#[test]
fn valid_toml_deserializes_into_banter_config() {
    let toml = r#"
[server]
host = "0.0.0.0"
port = 9090
bearer_token = "secret-token"
log_level = "debug"
shutdown_grace_secs = 10

[storage]
database_path = "/tmp/test.db"

[provider]
api_key = "sk-ant-123"
model = "claude-sonnet-4-20250514"
max_tokens = 512
timeout_secs = 30

[queue]
concurrency = 2
starts_per_sec = 10
max_attempts = 5
backoff_base_ms = 100
dead_set_cap = 20
poll_interval_ms = 50

[cache]
listing_ttl_secs = 60

[quota]
daily_prompt_limit = 3

[billing]
webhook_secret = "whsec_test"
"#;

    let config = load_config_from_str(toml).expect("valid TOML should deserialize");
    assert_eq!(config.server.host, "0.0.0.0");
    assert_eq!(config.server.port, 9090);
    assert_eq!(config.server.bearer_token.as_deref(), Some("secret-token"));
    assert_eq!(config.server.log_level, "debug");
    assert_eq!(config.server.shutdown_grace_secs, 10);
    assert_eq!(config.storage.database_path, "/tmp/test.db");
    assert_eq!(config.provider.api_key.as_deref(), Some("sk-ant-123"));
    assert_eq!(config.provider.max_tokens, 512);
    assert_eq!(config.queue.concurrency, 2);
    assert_eq!(config.queue.starts_per_sec, 10);
    assert_eq!(config.queue.max_attempts, 5);
    assert_eq!(config.queue.backoff_base_ms, 100);
    assert_eq!(config.queue.dead_set_cap, 20);
    assert_eq!(config.cache.listing_ttl_secs, 60);
    assert_eq!(config.quota.daily_prompt_limit, 3);
    assert_eq!(config.billing.webhook_secret.as_deref(), Some("whsec_test"));
}

/// Unknown field in [server] section produces an error.
#[test]
fn unknown_field_in_server_produces_error() {
    let toml = r#"
[server]
hots = "127.0.0.1"
"#;

    let err = load_config_from_str(toml).expect_err("should reject unknown field");
    let err_str = format!("{err}");
    assert!(
        err_str.contains("unknown field") || err_str.contains("hots"),
        "error should mention unknown field or the bad key, got: {err_str}"
    );
}

/// Missing optional sections use defaults without error.
#[test]
fn missing_optional_sections_use_defaults() {
    let config = load_config_from_str("").expect("empty TOML should use defaults");

    assert_eq!(config.server.host, "127.0.0.1");
    assert_eq!(config.server.port, 8080);
    assert_eq!(config.server.log_level, "info");
    assert_eq!(config.storage.database_path, "banter.db");
    assert!(config.provider.api_key.is_none());
    assert_eq!(config.queue.concurrency, 5);
    assert_eq!(config.queue.starts_per_sec, 30);
    assert_eq!(config.queue.backoff_base_ms, 2000);
    assert_eq!(config.cache.listing_ttl_secs, 600);
    assert_eq!(config.quota.daily_prompt_limit, 5);
    assert!(config.billing.webhook_secret.is_none());
}

/// Later merge layers override earlier ones (dotted-pair simulates env).
#[test]
fn later_layer_overrides_toml_value() {
    use figment::{
        providers::{Format, Serialized, Toml},
        Figment,
    };

    let toml_content = r#"
[server]
port = 8080
"#;

    let config: BanterConfig = Figment::new()
        .merge(Serialized::defaults(BanterConfig::default()))
        .merge(Toml::string(toml_content))
        .merge(("server.port", 9999))
        .extract()
        .expect("merge should succeed");

    assert_eq!(config.server.port, 9999);
}

/// Validation rejects semantically invalid values after deserialization.
#[test]
fn load_and_validate_str_rejects_zero_concurrency() {
    let toml = r#"
[queue]
concurrency = 0
"#;

    let errors = load_and_validate_str(toml).expect_err("zero concurrency should fail");
    assert!(errors
        .iter()
        .any(|e| e.to_string().contains("queue.concurrency")));
}

/// Validation passes for a default configuration.
#[test]
fn load_and_validate_str_accepts_defaults() {
    let config = load_and_validate_str("").expect("defaults should validate");
    assert_eq!(config.quota.daily_prompt_limit, 5);
}
