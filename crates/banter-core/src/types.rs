// SPDX-FileCopyrightText: 2026 Banter Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Common domain types shared across the Banter crates.
//!
//! These are the canonical persisted shapes; `banter-storage` re-exports
//! them for use in its query modules. Timestamps are RFC 3339 strings in
//! UTC, which sort lexicographically in SQL.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Who authored a chat message.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    User,
    Ai,
}

/// Subscription plan tiers.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Plan {
    Basic,
    Pro,
}

/// Subscription status as reported by the payment provider.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionStatus {
    Active,
    PastDue,
    Unpaid,
    Canceled,
    Incomplete,
    IncompleteExpired,
    Trialing,
}

impl SubscriptionStatus {
    /// Whether this status counts as active for quota purposes.
    ///
    /// Only `active` and `trialing` subscriptions exempt a pro user from
    /// the daily prompt cap.
    pub fn is_active_for_quota(&self) -> bool {
        matches!(
            self,
            SubscriptionStatus::Active | SubscriptionStatus::Trialing
        )
    }
}

/// Lifecycle states of a generation job.
///
/// Completed jobs are deleted rather than stored, so there is no
/// `completed` variant on disk.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum JobState {
    Waiting,
    Active,
    Dead,
}

/// A chat message inside a chatroom. Append-only, ordered by insertion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: String,
    pub chatroom_id: String,
    pub sender: Sender,
    pub content: String,
    pub created_at: String,
}

/// A chatroom owned by exactly one user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chatroom {
    pub id: String,
    pub user_id: String,
    pub title: String,
    pub created_at: String,
    /// Bumped on every message append; drives listing order.
    pub updated_at: String,
}

/// A chatroom listing entry: everything except the message bodies.
///
/// This is the shape serialized into the listing cache.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatroomSummary {
    pub id: String,
    pub title: String,
    pub created_at: String,
    pub updated_at: String,
}

/// Payload of a generation job: which chatroom to answer, for whom,
/// and the prompt text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobPayload {
    pub chatroom_id: String,
    pub user_id: String,
    pub content: String,
}

/// A durable generation job with its retry bookkeeping.
#[derive(Debug, Clone, PartialEq)]
pub struct Job {
    pub id: i64,
    pub chatroom_id: String,
    pub user_id: String,
    pub content: String,
    pub state: JobState,
    pub attempts: i64,
    /// The job is not leasable before this instant (backoff scheduling).
    pub next_run_at: String,
    pub last_error: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

/// One subscription per user, driven by the billing webhook.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Subscription {
    pub user_id: String,
    pub plan: Plan,
    pub status: SubscriptionStatus,
    pub current_period_end: String,
    pub cancel_at_period_end: bool,
    pub created_at: String,
    pub updated_at: String,
}

/// Per-user daily prompt counter.
#[derive(Debug, Clone, PartialEq)]
pub struct RateCounter {
    pub user_id: String,
    pub daily_count: i64,
    /// UTC calendar day (`%Y-%m-%d`) the counter last ticked on.
    pub last_counted_date: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn sender_round_trips_through_strings() {
        assert_eq!(Sender::User.to_string(), "user");
        assert_eq!(Sender::Ai.to_string(), "ai");
        assert_eq!(Sender::from_str("ai").unwrap(), Sender::Ai);
    }

    #[test]
    fn subscription_status_snake_case_strings() {
        assert_eq!(SubscriptionStatus::PastDue.to_string(), "past_due");
        assert_eq!(
            SubscriptionStatus::from_str("incomplete_expired").unwrap(),
            SubscriptionStatus::IncompleteExpired
        );
    }

    #[test]
    fn only_active_and_trialing_count_for_quota() {
        assert!(SubscriptionStatus::Active.is_active_for_quota());
        assert!(SubscriptionStatus::Trialing.is_active_for_quota());
        assert!(!SubscriptionStatus::PastDue.is_active_for_quota());
        assert!(!SubscriptionStatus::Canceled.is_active_for_quota());
        assert!(!SubscriptionStatus::Unpaid.is_active_for_quota());
    }

    #[test]
    fn chatroom_summary_serializes_without_messages() {
        let summary = ChatroomSummary {
            id: "room-1".to_string(),
            title: "New Chat".to_string(),
            created_at: "2026-01-01T00:00:00.000Z".to_string(),
            updated_at: "2026-01-02T00:00:00.000Z".to_string(),
        };
        let json = serde_json::to_string(&summary).unwrap();
        assert!(json.contains("\"title\":\"New Chat\""));
        assert!(!json.contains("messages"));
    }

    #[test]
    fn subscription_status_deserializes_from_provider_strings() {
        let status: SubscriptionStatus = serde_json::from_str("\"past_due\"").unwrap();
        assert_eq!(status, SubscriptionStatus::PastDue);
    }
}
