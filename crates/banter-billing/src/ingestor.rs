// SPDX-FileCopyrightText: 2026 Banter Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Idempotent state machine applying billing events to subscriptions.
//!
//! Processing order: verify the signature against the raw bytes, parse,
//! skip already-processed event ids, apply absolute-valued updates, then
//! record the event id. A failed apply is not recorded, so the provider's
//! re-delivery gets another chance; concurrent duplicates both apply
//! absolute values and converge.

use banter_core::BanterError;
use banter_storage::queries::{subscriptions, webhook_events};
use banter_storage::Database;
use chrono::{Duration, Utc};
use tracing::{debug, info, warn};

use crate::event::{BillingEvent, EventKind};
use crate::signature;

/// Days added to "now" as the period-end approximation. The provider's
/// authoritative billing period is not fetched; see DESIGN.md.
const PERIOD_END_APPROX_DAYS: i64 = 30;

/// What the ingestor did with a delivery.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IngestOutcome {
    /// The event mutated subscription state.
    Processed(EventKind),
    /// The event id was seen before; nothing was applied.
    Duplicate,
    /// The event kind (or checkout mode) is not one we react to.
    Ignored,
}

/// Applies verified billing events to subscription records.
pub struct WebhookIngestor {
    db: Database,
    secret: String,
}

impl WebhookIngestor {
    pub fn new(db: Database, secret: String) -> Self {
        Self { db, secret }
    }

    /// Verify and apply one webhook delivery.
    ///
    /// `payload` must be the raw request bytes; verification is
    /// byte-exact. Returns [`BanterError::Signature`] before any state is
    /// touched when the signature does not check out.
    pub async fn ingest(
        &self,
        payload: &[u8],
        signature_header: &str,
    ) -> Result<IngestOutcome, BanterError> {
        signature::verify(&self.secret, signature_header, payload)?;

        let event: BillingEvent = serde_json::from_slice(payload)
            .map_err(|e| BanterError::Validation(format!("malformed billing event: {e}")))?;

        if event.kind == EventKind::Other {
            debug!(event_id = event.id.as_str(), "ignoring unhandled event kind");
            return Ok(IngestOutcome::Ignored);
        }

        if webhook_events::is_processed(&self.db, &event.id).await? {
            info!(event_id = event.id.as_str(), "duplicate delivery skipped");
            return Ok(IngestOutcome::Duplicate);
        }

        let outcome = self.apply(&event).await?;

        if matches!(outcome, IngestOutcome::Processed(_)) {
            webhook_events::mark_processed(&self.db, &event.id, event.kind.as_str()).await?;
        }
        Ok(outcome)
    }

    async fn apply(&self, event: &BillingEvent) -> Result<IngestOutcome, BanterError> {
        let object = &event.data.object;
        let user_id = object.metadata.user_id.as_str();
        let period_end = (Utc::now() + Duration::days(PERIOD_END_APPROX_DAYS))
            .to_rfc3339_opts(chrono::SecondsFormat::Millis, true);

        match event.kind {
            EventKind::CheckoutCompleted => {
                if object.mode.as_deref() != Some("subscription") {
                    debug!(
                        event_id = event.id.as_str(),
                        mode = object.mode.as_deref().unwrap_or("none"),
                        "checkout completed outside subscription mode, ignoring"
                    );
                    return Ok(IngestOutcome::Ignored);
                }
                subscriptions::upsert_pro(
                    &self.db,
                    user_id,
                    object.status,
                    &period_end,
                    object.cancel_at_period_end,
                )
                .await?;
                info!(
                    event_id = event.id.as_str(),
                    user_id = user_id,
                    status = %object.status,
                    "checkout completed, subscription upserted"
                );
            }
            EventKind::SubscriptionUpdated => {
                let updated = subscriptions::update_status(
                    &self.db,
                    user_id,
                    object.status,
                    &period_end,
                    object.cancel_at_period_end,
                )
                .await?;
                if !updated {
                    warn!(
                        event_id = event.id.as_str(),
                        user_id = user_id,
                        "subscription update for unknown user"
                    );
                    return Err(BanterError::not_found("subscription"));
                }
                info!(
                    event_id = event.id.as_str(),
                    user_id = user_id,
                    status = %object.status,
                    "subscription updated"
                );
            }
            EventKind::SubscriptionDeleted => {
                let updated = subscriptions::mark_canceled(&self.db, user_id).await?;
                if !updated {
                    warn!(
                        event_id = event.id.as_str(),
                        user_id = user_id,
                        "subscription deletion for unknown user"
                    );
                    return Err(BanterError::not_found("subscription"));
                }
                info!(
                    event_id = event.id.as_str(),
                    user_id = user_id,
                    "subscription canceled"
                );
            }
            EventKind::Other => unreachable!("filtered before apply"),
        }

        Ok(IngestOutcome::Processed(event.kind))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use banter_core::types::{Plan, SubscriptionStatus};
    use tempfile::tempdir;

    const SECRET: &str = "whsec_test";

    async fn setup() -> (WebhookIngestor, Database, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("test.db");
        let db = Database::open(db_path.to_str().unwrap()).await.unwrap();
        let ingestor = WebhookIngestor::new(db.clone(), SECRET.to_string());
        (ingestor, db, dir)
    }

    fn checkout_payload(event_id: &str, user_id: &str) -> Vec<u8> {
        format!(
            r#"{{
                "id": "{event_id}",
                "type": "checkout.session.completed",
                "data": {{
                    "object": {{
                        "mode": "subscription",
                        "metadata": {{"user_id": "{user_id}"}},
                        "status": "active",
                        "cancel_at_period_end": false
                    }}
                }}
            }}"#
        )
        .into_bytes()
    }

    fn signed(payload: &[u8]) -> String {
        signature::sign(SECRET, Utc::now().timestamp(), payload)
    }

    #[tokio::test]
    async fn checkout_upserts_pro_subscription() {
        let (ingestor, db, _dir) = setup().await;

        let payload = checkout_payload("evt_1", "user-1");
        let outcome = ingestor.ingest(&payload, &signed(&payload)).await.unwrap();
        assert_eq!(
            outcome,
            IngestOutcome::Processed(EventKind::CheckoutCompleted)
        );

        let sub = subscriptions::get_subscription(&db, "user-1")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(sub.plan, Plan::Pro);
        assert_eq!(sub.status, SubscriptionStatus::Active);
        assert!(!sub.cancel_at_period_end);

        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn duplicate_delivery_is_skipped_with_identical_state() {
        let (ingestor, db, _dir) = setup().await;

        let payload = checkout_payload("evt_1", "user-1");
        ingestor.ingest(&payload, &signed(&payload)).await.unwrap();
        let first = subscriptions::get_subscription(&db, "user-1")
            .await
            .unwrap()
            .unwrap();

        let outcome = ingestor.ingest(&payload, &signed(&payload)).await.unwrap();
        assert_eq!(outcome, IngestOutcome::Duplicate);

        let second = subscriptions::get_subscription(&db, "user-1")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(first, second);

        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn invalid_signature_touches_nothing() {
        let (ingestor, db, _dir) = setup().await;

        let payload = checkout_payload("evt_1", "user-1");
        let header = signature::sign("whsec_wrong", Utc::now().timestamp(), &payload);
        let err = ingestor.ingest(&payload, &header).await.unwrap_err();
        assert!(matches!(err, BanterError::Signature(_)));

        assert!(subscriptions::get_subscription(&db, "user-1")
            .await
            .unwrap()
            .is_none());
        assert!(!webhook_events::is_processed(&db, "evt_1").await.unwrap());

        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn non_subscription_checkout_is_ignored() {
        let (ingestor, db, _dir) = setup().await;

        let payload = br#"{
            "id": "evt_pay",
            "type": "checkout.session.completed",
            "data": {
                "object": {
                    "mode": "payment",
                    "metadata": {"user_id": "user-1"},
                    "status": "active"
                }
            }
        }"#;
        let outcome = ingestor.ingest(payload, &signed(payload)).await.unwrap();
        assert_eq!(outcome, IngestOutcome::Ignored);
        assert!(subscriptions::get_subscription(&db, "user-1")
            .await
            .unwrap()
            .is_none());

        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn update_event_changes_status_and_flags() {
        let (ingestor, db, _dir) = setup().await;

        let payload = checkout_payload("evt_1", "user-1");
        ingestor.ingest(&payload, &signed(&payload)).await.unwrap();

        let update = br#"{
            "id": "evt_2",
            "type": "customer.subscription.updated",
            "data": {
                "object": {
                    "metadata": {"user_id": "user-1"},
                    "status": "past_due",
                    "cancel_at_period_end": true
                }
            }
        }"#;
        let outcome = ingestor.ingest(update, &signed(update)).await.unwrap();
        assert_eq!(
            outcome,
            IngestOutcome::Processed(EventKind::SubscriptionUpdated)
        );

        let sub = subscriptions::get_subscription(&db, "user-1")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(sub.status, SubscriptionStatus::PastDue);
        assert!(sub.cancel_at_period_end);
        assert_eq!(sub.plan, Plan::Pro);

        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn delete_event_cancels_but_keeps_plan() {
        let (ingestor, db, _dir) = setup().await;

        let payload = checkout_payload("evt_1", "user-1");
        ingestor.ingest(&payload, &signed(&payload)).await.unwrap();

        let delete = br#"{
            "id": "evt_3",
            "type": "customer.subscription.deleted",
            "data": {
                "object": {
                    "metadata": {"user_id": "user-1"},
                    "status": "canceled"
                }
            }
        }"#;
        ingestor.ingest(delete, &signed(delete)).await.unwrap();

        let sub = subscriptions::get_subscription(&db, "user-1")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(sub.status, SubscriptionStatus::Canceled);
        assert_eq!(sub.plan, Plan::Pro);

        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn malformed_event_is_validation_error() {
        let (ingestor, db, _dir) = setup().await;

        let payload = b"{\"id\": 42}";
        let err = ingestor.ingest(payload, &signed(payload)).await.unwrap_err();
        assert!(matches!(err, BanterError::Validation(_)));

        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn failed_apply_is_not_marked_processed() {
        let (ingestor, db, _dir) = setup().await;

        // Update for a user with no subscription row fails...
        let update = br#"{
            "id": "evt_4",
            "type": "customer.subscription.updated",
            "data": {
                "object": {
                    "metadata": {"user_id": "user-1"},
                    "status": "active"
                }
            }
        }"#;
        let err = ingestor.ingest(update, &signed(update)).await.unwrap_err();
        assert!(matches!(err, BanterError::NotFound { .. }));
        // ...and stays unrecorded so a later re-delivery can succeed.
        assert!(!webhook_events::is_processed(&db, "evt_4").await.unwrap());

        db.close().await.unwrap();
    }
}
