// SPDX-FileCopyrightText: 2026 Banter Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Centralized translation from [`BanterError`] to HTTP responses.
//!
//! Every handler returns `Result<_, ApiError>`; this is the single place
//! where error kinds map to status codes and JSON bodies.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use banter_core::BanterError;
use serde::Serialize;
use tracing::{error, warn};

/// JSON error body sent to clients.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Error description.
    pub error: String,
}

/// Wrapper making [`BanterError`] an axum response.
#[derive(Debug)]
pub struct ApiError(pub BanterError);

impl From<BanterError> for ApiError {
    fn from(err: BanterError) -> Self {
        ApiError(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            BanterError::Validation(_) | BanterError::Signature(_) => StatusCode::BAD_REQUEST,
            BanterError::Auth(_) => StatusCode::UNAUTHORIZED,
            BanterError::NotFound { .. } => StatusCode::NOT_FOUND,
            BanterError::RateLimitExceeded { .. } => StatusCode::TOO_MANY_REQUESTS,
            BanterError::ExternalService { .. } => StatusCode::BAD_GATEWAY,
            BanterError::Timeout { .. } => StatusCode::GATEWAY_TIMEOUT,
            BanterError::Storage { .. }
            | BanterError::Config(_)
            | BanterError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        if status.is_server_error() {
            error!(status = %status, error = %self.0, "request failed");
        } else {
            warn!(status = %status, error = %self.0, "request rejected");
        }

        (
            status,
            Json(ErrorResponse {
                error: self.0.to_string(),
            }),
        )
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status_of(err: BanterError) -> StatusCode {
        ApiError(err).into_response().status()
    }

    #[test]
    fn taxonomy_maps_to_expected_statuses() {
        assert_eq!(
            status_of(BanterError::Validation("bad".into())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_of(BanterError::not_found("chatroom")),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            status_of(BanterError::Auth("missing token".into())),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            status_of(BanterError::RateLimitExceeded {
                message: "limit".into()
            }),
            StatusCode::TOO_MANY_REQUESTS
        );
        assert_eq!(
            status_of(BanterError::Signature("mismatch".into())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_of(BanterError::ExternalService {
                message: "upstream".into(),
                source: None
            }),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            status_of(BanterError::Timeout {
                duration: std::time::Duration::from_secs(60)
            }),
            StatusCode::GATEWAY_TIMEOUT
        );
        assert_eq!(
            status_of(BanterError::Internal("boom".into())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
