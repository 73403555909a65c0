// SPDX-FileCopyrightText: 2026 Banter Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Daily prompt quota gate, consulted before a message enters the pipeline.
//!
//! Pro users with a quota-active subscription (status `active` or
//! `trialing`) pass unconditionally. Everyone else is counted against a
//! per-user daily cap; the day boundary is the UTC calendar day. The
//! counter's check-and-increment is atomic in storage, so concurrent
//! sends from one user cannot sneak past the cap.

use banter_core::types::Plan;
use banter_core::BanterError;
use banter_storage::queries::{quota, subscriptions};
use banter_storage::Database;
use chrono::Utc;
use tracing::debug;

/// Outcome of a successful quota check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuotaDecision {
    /// Pro subscription in a quota-active status; no counting applies.
    Unlimited,
    /// Counted against the daily cap; `used` includes this prompt.
    Counted { used: i64, remaining: i64 },
}

/// Per-user daily prompt gate.
pub struct RateLimiter {
    db: Database,
    daily_limit: i64,
}

impl RateLimiter {
    pub fn new(db: Database, daily_limit: i64) -> Self {
        Self { db, daily_limit }
    }

    /// Admit or reject one prompt for `user_id`.
    ///
    /// Returns [`BanterError::RateLimitExceeded`] when the daily cap is
    /// reached; the stored counter is not mutated in that case.
    pub async fn check(&self, user_id: &str) -> Result<QuotaDecision, BanterError> {
        if let Some(sub) = subscriptions::get_subscription(&self.db, user_id).await? {
            if sub.plan == Plan::Pro && sub.status.is_active_for_quota() {
                debug!(user_id = user_id, "pro subscription, quota bypassed");
                return Ok(QuotaDecision::Unlimited);
            }
        }

        let today = Utc::now().format("%Y-%m-%d").to_string();
        match quota::check_and_increment(&self.db, user_id, &today, self.daily_limit).await? {
            Some(used) => {
                debug!(
                    user_id = user_id,
                    used = used,
                    limit = self.daily_limit,
                    "prompt counted against daily quota"
                );
                Ok(QuotaDecision::Counted {
                    used,
                    remaining: self.daily_limit - used,
                })
            }
            None => Err(BanterError::RateLimitExceeded {
                message: format!(
                    "daily limit of {} prompts reached; upgrade to pro for unlimited access",
                    self.daily_limit
                ),
            }),
        }
    }
}
