// SPDX-FileCopyrightText: 2026 Banter Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP client for the Anthropic Messages API.
//!
//! Handles request construction, authentication headers, and error body
//! parsing. Deliberately single-attempt: a failure becomes a retryable
//! job error and the queue schedules the backoff.

use std::time::Duration;

use async_trait::async_trait;
use banter_config::model::ProviderConfig;
use banter_core::{BanterError, ReplyProvider};
use reqwest::header::{HeaderMap, HeaderValue};
use tracing::debug;

use crate::types::{ApiErrorResponse, ChatMessage, MessageRequest, MessageResponse};

/// Base URL for the Anthropic Messages API.
const API_BASE_URL: &str = "https://api.anthropic.com/v1/messages";

/// Reply provider backed by the Anthropic Messages API.
#[derive(Debug, Clone)]
pub struct AnthropicProvider {
    client: reqwest::Client,
    model: String,
    max_tokens: u32,
    timeout: Duration,
    base_url: String,
}

impl AnthropicProvider {
    /// Creates a provider from configuration.
    ///
    /// The API key comes from `provider.api_key` or the `ANTHROPIC_API_KEY`
    /// environment variable; its absence is a configuration error.
    pub fn new(config: &ProviderConfig) -> Result<Self, BanterError> {
        let api_key = config
            .api_key
            .clone()
            .or_else(|| std::env::var("ANTHROPIC_API_KEY").ok())
            .ok_or_else(|| {
                BanterError::Config(
                    "provider.api_key or ANTHROPIC_API_KEY is required".to_string(),
                )
            })?;

        let mut headers = HeaderMap::new();
        headers.insert(
            "x-api-key",
            HeaderValue::from_str(&api_key).map_err(|e| {
                BanterError::Config(format!("invalid API key header value: {e}"))
            })?,
        );
        headers.insert(
            "anthropic-version",
            HeaderValue::from_str(&config.api_version).map_err(|e| {
                BanterError::Config(format!("invalid API version header value: {e}"))
            })?,
        );
        headers.insert("content-type", HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| BanterError::ExternalService {
                message: format!("failed to build HTTP client: {e}"),
                source: Some(Box::new(e)),
            })?;

        Ok(Self {
            client,
            model: config.model.clone(),
            max_tokens: config.max_tokens,
            timeout: Duration::from_secs(config.timeout_secs),
            base_url: API_BASE_URL.to_string(),
        })
    }

    /// Overrides the base URL (for testing with wiremock).
    #[cfg(test)]
    pub fn with_base_url(mut self, url: String) -> Self {
        self.base_url = url;
        self
    }

    async fn complete(&self, prompt: &str) -> Result<String, BanterError> {
        let request = MessageRequest {
            model: self.model.clone(),
            max_tokens: self.max_tokens,
            messages: vec![ChatMessage {
                role: "user".to_string(),
                content: prompt.to_string(),
            }],
        };

        let response = self
            .client
            .post(&self.base_url)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    BanterError::Timeout {
                        duration: self.timeout,
                    }
                } else {
                    BanterError::ExternalService {
                        message: format!("HTTP request failed: {e}"),
                        source: Some(Box::new(e)),
                    }
                }
            })?;

        let status = response.status();
        debug!(status = %status, "provider response received");

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = if let Ok(api_err) = serde_json::from_str::<ApiErrorResponse>(&body) {
                format!(
                    "Anthropic API error ({}): {}",
                    api_err.error.type_, api_err.error.message
                )
            } else {
                format!("API returned {status}: {body}")
            };
            return Err(BanterError::ExternalService {
                message,
                source: None,
            });
        }

        let parsed: MessageResponse =
            response
                .json()
                .await
                .map_err(|e| BanterError::ExternalService {
                    message: format!("malformed API response: {e}"),
                    source: Some(Box::new(e)),
                })?;

        let text: String = parsed
            .content
            .iter()
            .filter(|block| block.kind == "text")
            .map(|block| block.text.as_str())
            .collect();

        if text.is_empty() {
            return Err(BanterError::ExternalService {
                message: "API response contained no text content".to_string(),
                source: None,
            });
        }

        Ok(text)
    }
}

#[async_trait]
impl ReplyProvider for AnthropicProvider {
    async fn generate_reply(&self, prompt: &str) -> Result<String, BanterError> {
        self.complete(prompt).await
    }
}
