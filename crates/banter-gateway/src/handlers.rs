// SPDX-FileCopyrightText: 2026 Banter Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP request handlers for the gateway REST API.

use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use banter_billing::IngestOutcome;
use banter_core::types::{Chatroom, ChatroomSummary, JobPayload, Message, Sender};
use banter_core::BanterError;
use banter_storage::queries::{chatrooms, subscriptions};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::auth::caller_id;
use crate::error::ApiError;
use crate::server::GatewayState;

/// Request body for POST /v1/chatrooms.
#[derive(Debug, Deserialize)]
pub struct CreateChatroomRequest {
    /// Chatroom title; defaults to "New Chat".
    #[serde(default)]
    pub title: Option<String>,
}

/// Response body for GET /v1/chatrooms.
#[derive(Debug, Serialize)]
pub struct ChatroomListResponse {
    pub chatrooms: Vec<ChatroomSummary>,
}

/// Response body for GET /v1/chatrooms/{id}.
#[derive(Debug, Serialize)]
pub struct ChatroomDetailResponse {
    #[serde(flatten)]
    pub chatroom: Chatroom,
    pub messages: Vec<Message>,
}

/// Request body for POST /v1/chatrooms/{id}/messages.
#[derive(Debug, Deserialize)]
pub struct SendMessageRequest {
    pub content: String,
}

/// Response body for POST /v1/chatrooms/{id}/messages.
///
/// Acknowledges the accepted message and the queued generation job; the
/// AI reply lands in the chatroom asynchronously.
#[derive(Debug, Serialize)]
pub struct SendMessageResponse {
    pub message_id: String,
    pub job_id: i64,
}

/// Response body for GET /v1/subscription.
#[derive(Debug, Serialize)]
pub struct SubscriptionStatusResponse {
    pub plan: String,
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_period_end: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cancel_at_period_end: Option<bool>,
}

/// Response body for the billing webhook.
#[derive(Debug, Serialize)]
pub struct WebhookAck {
    pub received: bool,
}

/// Response body for GET /health.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

/// POST /v1/chatrooms
pub async fn post_chatrooms(
    State(state): State<GatewayState>,
    headers: HeaderMap,
    Json(body): Json<CreateChatroomRequest>,
) -> Result<(StatusCode, Json<Chatroom>), ApiError> {
    let user_id = caller_id(&headers)?;

    let chatroom =
        chatrooms::create_chatroom(&state.db, &user_id, body.title.as_deref()).await?;
    // A new chatroom changes the listing; drop the cached copy.
    state.cache.invalidate(&user_id);

    Ok((StatusCode::CREATED, Json(chatroom)))
}

/// GET /v1/chatrooms
///
/// Reads through the listing cache; only a miss touches the store.
pub async fn get_chatrooms(
    State(state): State<GatewayState>,
    headers: HeaderMap,
) -> Result<Json<ChatroomListResponse>, ApiError> {
    let user_id = caller_id(&headers)?;

    let db = state.db.clone();
    let loader_user = user_id.clone();
    let summaries = state
        .cache
        .get_or_load(&user_id, || async move {
            chatrooms::list_summaries(&db, &loader_user).await
        })
        .await?;

    Ok(Json(ChatroomListResponse {
        chatrooms: summaries,
    }))
}

/// GET /v1/chatrooms/{id}
pub async fn get_chatroom(
    State(state): State<GatewayState>,
    headers: HeaderMap,
    Path(chatroom_id): Path<String>,
) -> Result<Json<ChatroomDetailResponse>, ApiError> {
    let user_id = caller_id(&headers)?;

    let chatroom = chatrooms::get_chatroom(&state.db, &user_id, &chatroom_id)
        .await?
        .ok_or_else(|| BanterError::not_found("chatroom"))?;
    let messages = chatrooms::list_messages(&state.db, &chatroom_id).await?;

    Ok(Json(ChatroomDetailResponse { chatroom, messages }))
}

/// POST /v1/chatrooms/{id}/messages
///
/// The decoupling point of the pipeline: the quota gate runs first, the
/// user message is appended, a generation job is durably enqueued, and
/// the request returns without waiting for the AI collaborator.
pub async fn post_message(
    State(state): State<GatewayState>,
    headers: HeaderMap,
    Path(chatroom_id): Path<String>,
    Json(body): Json<SendMessageRequest>,
) -> Result<(StatusCode, Json<SendMessageResponse>), ApiError> {
    let user_id = caller_id(&headers)?;

    if body.content.trim().is_empty() {
        return Err(BanterError::Validation("content must not be empty".to_string()).into());
    }

    // Quota gate: rejects with RateLimitExceeded before anything mutates.
    state.limiter.check(&user_id).await?;

    let message = chatrooms::append_message(
        &state.db,
        &user_id,
        &chatroom_id,
        Sender::User,
        &body.content,
    )
    .await?;

    let job_id = state
        .queue
        .enqueue(&JobPayload {
            chatroom_id: chatroom_id.clone(),
            user_id: user_id.clone(),
            content: body.content,
        })
        .await?;

    // The append bumped the listing order.
    state.cache.invalidate(&user_id);

    debug!(
        chatroom_id = chatroom_id.as_str(),
        job_id, "message accepted, generation queued"
    );

    Ok((
        StatusCode::ACCEPTED,
        Json(SendMessageResponse {
            message_id: message.id,
            job_id,
        }),
    ))
}

/// GET /v1/subscription
pub async fn get_subscription_status(
    State(state): State<GatewayState>,
    headers: HeaderMap,
) -> Result<Json<SubscriptionStatusResponse>, ApiError> {
    let user_id = caller_id(&headers)?;

    let response = match subscriptions::get_subscription(&state.db, &user_id).await? {
        Some(sub) => SubscriptionStatusResponse {
            plan: sub.plan.to_string(),
            status: sub.status.to_string(),
            current_period_end: Some(sub.current_period_end),
            cancel_at_period_end: Some(sub.cancel_at_period_end),
        },
        // Users without a subscription record are on the basic plan.
        None => SubscriptionStatusResponse {
            plan: "basic".to_string(),
            status: "none".to_string(),
            current_period_end: None,
            cancel_at_period_end: None,
        },
    };

    Ok(Json(response))
}

/// POST /webhooks/billing
///
/// Takes the raw request bytes: verification is byte-exact and any JSON
/// parsing happens only after the signature checks out.
pub async fn post_billing_webhook(
    State(state): State<GatewayState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<WebhookAck>, ApiError> {
    let Some(ref ingestor) = state.ingestor else {
        return Err(BanterError::Config(
            "billing webhook is not configured".to_string(),
        )
        .into());
    };

    let signature = headers
        .get("x-billing-signature")
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| BanterError::Signature("missing signature header".to_string()))?;

    let outcome = ingestor.ingest(&body, signature).await?;
    if outcome == IngestOutcome::Duplicate {
        debug!("duplicate billing delivery acknowledged");
    }

    Ok(Json(WebhookAck { received: true }))
}

/// GET /health (unauthenticated)
pub async fn get_public_health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}
