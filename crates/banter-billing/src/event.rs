// SPDX-FileCopyrightText: 2026 Banter Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Billing event shapes as delivered by the payment provider.

use banter_core::types::SubscriptionStatus;
use serde::Deserialize;

/// Event kinds the state machine reacts to. Anything else is
/// acknowledged and ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum EventKind {
    #[serde(rename = "checkout.session.completed")]
    CheckoutCompleted,
    #[serde(rename = "customer.subscription.updated")]
    SubscriptionUpdated,
    #[serde(rename = "customer.subscription.deleted")]
    SubscriptionDeleted,
    #[serde(other)]
    Other,
}

impl EventKind {
    /// The provider's wire name, used for the processed-event audit trail.
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::CheckoutCompleted => "checkout.session.completed",
            EventKind::SubscriptionUpdated => "customer.subscription.updated",
            EventKind::SubscriptionDeleted => "customer.subscription.deleted",
            EventKind::Other => "other",
        }
    }
}

/// A verified billing event.
#[derive(Debug, Clone, Deserialize)]
pub struct BillingEvent {
    /// Provider-assigned event id, unique per delivery attempt chain.
    pub id: String,
    #[serde(rename = "type")]
    pub kind: EventKind,
    pub data: EventData,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EventData {
    pub object: EventObject,
}

/// The subscription-ish object carried by the event.
#[derive(Debug, Clone, Deserialize)]
pub struct EventObject {
    /// Checkout mode; subscription upserts only apply to "subscription".
    #[serde(default)]
    pub mode: Option<String>,
    pub metadata: EventMetadata,
    pub status: SubscriptionStatus,
    #[serde(default)]
    pub cancel_at_period_end: bool,
}

/// Metadata the checkout flow attaches so events map back to a user.
#[derive(Debug, Clone, Deserialize)]
pub struct EventMetadata {
    pub user_id: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn checkout_event_deserializes() {
        let json = r#"{
            "id": "evt_123",
            "type": "checkout.session.completed",
            "data": {
                "object": {
                    "mode": "subscription",
                    "metadata": {"user_id": "user-1"},
                    "status": "active",
                    "cancel_at_period_end": false
                }
            }
        }"#;
        let event: BillingEvent = serde_json::from_str(json).unwrap();
        assert_eq!(event.id, "evt_123");
        assert_eq!(event.kind, EventKind::CheckoutCompleted);
        assert_eq!(event.data.object.mode.as_deref(), Some("subscription"));
        assert_eq!(event.data.object.metadata.user_id, "user-1");
        assert_eq!(event.data.object.status, SubscriptionStatus::Active);
    }

    #[test]
    fn unknown_kind_maps_to_other() {
        let json = r#"{
            "id": "evt_9",
            "type": "invoice.paid",
            "data": {
                "object": {
                    "metadata": {"user_id": "user-1"},
                    "status": "active"
                }
            }
        }"#;
        let event: BillingEvent = serde_json::from_str(json).unwrap();
        assert_eq!(event.kind, EventKind::Other);
    }

    #[test]
    fn cancel_flag_defaults_to_false() {
        let json = r#"{
            "id": "evt_5",
            "type": "customer.subscription.updated",
            "data": {
                "object": {
                    "metadata": {"user_id": "user-1"},
                    "status": "past_due"
                }
            }
        }"#;
        let event: BillingEvent = serde_json::from_str(json).unwrap();
        assert!(!event.data.object.cancel_at_period_end);
        assert_eq!(event.data.object.status, SubscriptionStatus::PastDue);
    }
}
