// SPDX-FileCopyrightText: 2026 Banter Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Subscription record operations, driven by the billing webhook.
//!
//! All writes assign absolute values, so re-applying the same event
//! converges to the same row.

use banter_core::BanterError;
use rusqlite::params;

use crate::database::Database;
use crate::models::{Plan, Subscription, SubscriptionStatus};
use crate::queries::{now_rfc3339, parse_enum};

/// Fetch a user's subscription, if one exists.
pub async fn get_subscription(
    db: &Database,
    user_id: &str,
) -> Result<Option<Subscription>, BanterError> {
    let user_id = user_id.to_string();
    db.connection()
        .call(move |conn| {
            let result = conn.query_row(
                "SELECT user_id, plan, status, current_period_end, cancel_at_period_end,
                        created_at, updated_at
                 FROM subscriptions WHERE user_id = ?1",
                params![user_id],
                |row| {
                    let plan: String = row.get(1)?;
                    let status: String = row.get(2)?;
                    Ok(Subscription {
                        user_id: row.get(0)?,
                        plan: parse_enum::<Plan>(1, &plan)?,
                        status: parse_enum::<SubscriptionStatus>(2, &status)?,
                        current_period_end: row.get(3)?,
                        cancel_at_period_end: row.get::<_, i64>(4)? != 0,
                        created_at: row.get(5)?,
                        updated_at: row.get(6)?,
                    })
                },
            );
            match result {
                Ok(sub) => Ok(Some(sub)),
                Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                Err(e) => Err(e.into()),
            }
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Upsert a pro subscription after a completed checkout.
///
/// Inserts the row if the user has none, otherwise overwrites plan,
/// status, period end, and cancel flag with the event's values.
pub async fn upsert_pro(
    db: &Database,
    user_id: &str,
    status: SubscriptionStatus,
    current_period_end: &str,
    cancel_at_period_end: bool,
) -> Result<(), BanterError> {
    let user_id = user_id.to_string();
    let status = status.to_string();
    let current_period_end = current_period_end.to_string();
    let now = now_rfc3339();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO subscriptions
                     (user_id, plan, status, current_period_end, cancel_at_period_end,
                      created_at, updated_at)
                 VALUES (?1, 'pro', ?2, ?3, ?4, ?5, ?5)
                 ON CONFLICT(user_id) DO UPDATE SET
                     plan = 'pro',
                     status = excluded.status,
                     current_period_end = excluded.current_period_end,
                     cancel_at_period_end = excluded.cancel_at_period_end,
                     updated_at = excluded.updated_at",
                params![
                    user_id,
                    status,
                    current_period_end,
                    cancel_at_period_end as i64,
                    now,
                ],
            )?;
            Ok(())
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Update status, period end, and cancel flag for an existing subscription.
///
/// Returns `false` when the user has no subscription row.
pub async fn update_status(
    db: &Database,
    user_id: &str,
    status: SubscriptionStatus,
    current_period_end: &str,
    cancel_at_period_end: bool,
) -> Result<bool, BanterError> {
    let user_id = user_id.to_string();
    let status = status.to_string();
    let current_period_end = current_period_end.to_string();
    db.connection()
        .call(move |conn| {
            let updated = conn.execute(
                "UPDATE subscriptions SET status = ?1, current_period_end = ?2,
                     cancel_at_period_end = ?3,
                     updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
                 WHERE user_id = ?4",
                params![status, current_period_end, cancel_at_period_end as i64, user_id],
            )?;
            Ok(updated > 0)
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Mark a subscription canceled. The plan is left unchanged.
///
/// Returns `false` when the user has no subscription row.
pub async fn mark_canceled(db: &Database, user_id: &str) -> Result<bool, BanterError> {
    let user_id = user_id.to_string();
    db.connection()
        .call(move |conn| {
            let updated = conn.execute(
                "UPDATE subscriptions SET status = 'canceled',
                     updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
                 WHERE user_id = ?1",
                params![user_id],
            )?;
            Ok(updated > 0)
        })
        .await
        .map_err(crate::database::map_tr_err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    async fn setup_db() -> (Database, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("test.db");
        let db = Database::open(db_path.to_str().unwrap()).await.unwrap();
        (db, dir)
    }

    #[tokio::test]
    async fn upsert_creates_then_overwrites() {
        let (db, _dir) = setup_db().await;

        upsert_pro(&db, "user-1", SubscriptionStatus::Active, "2026-09-06T00:00:00.000Z", false)
            .await
            .unwrap();
        let sub = get_subscription(&db, "user-1").await.unwrap().unwrap();
        assert_eq!(sub.plan, Plan::Pro);
        assert_eq!(sub.status, SubscriptionStatus::Active);
        assert!(!sub.cancel_at_period_end);

        upsert_pro(&db, "user-1", SubscriptionStatus::Trialing, "2026-10-06T00:00:00.000Z", true)
            .await
            .unwrap();
        let sub = get_subscription(&db, "user-1").await.unwrap().unwrap();
        assert_eq!(sub.status, SubscriptionStatus::Trialing);
        assert_eq!(sub.current_period_end, "2026-10-06T00:00:00.000Z");
        assert!(sub.cancel_at_period_end);

        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn upsert_is_idempotent() {
        let (db, _dir) = setup_db().await;

        let apply = || {
            upsert_pro(
                &db,
                "user-1",
                SubscriptionStatus::Active,
                "2026-09-06T00:00:00.000Z",
                false,
            )
        };
        apply().await.unwrap();
        let first = get_subscription(&db, "user-1").await.unwrap().unwrap();
        apply().await.unwrap();
        let second = get_subscription(&db, "user-1").await.unwrap().unwrap();

        assert_eq!(first.plan, second.plan);
        assert_eq!(first.status, second.status);
        assert_eq!(first.current_period_end, second.current_period_end);
        assert_eq!(first.cancel_at_period_end, second.cancel_at_period_end);
        assert_eq!(first.created_at, second.created_at);

        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn update_status_requires_existing_row() {
        let (db, _dir) = setup_db().await;

        let updated = update_status(
            &db,
            "user-1",
            SubscriptionStatus::PastDue,
            "2026-09-06T00:00:00.000Z",
            false,
        )
        .await
        .unwrap();
        assert!(!updated);

        upsert_pro(&db, "user-1", SubscriptionStatus::Active, "2026-09-06T00:00:00.000Z", false)
            .await
            .unwrap();
        let updated = update_status(
            &db,
            "user-1",
            SubscriptionStatus::PastDue,
            "2026-09-06T00:00:00.000Z",
            true,
        )
        .await
        .unwrap();
        assert!(updated);

        let sub = get_subscription(&db, "user-1").await.unwrap().unwrap();
        assert_eq!(sub.status, SubscriptionStatus::PastDue);
        assert!(sub.cancel_at_period_end);

        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn mark_canceled_keeps_plan() {
        let (db, _dir) = setup_db().await;

        upsert_pro(&db, "user-1", SubscriptionStatus::Active, "2026-09-06T00:00:00.000Z", false)
            .await
            .unwrap();
        assert!(mark_canceled(&db, "user-1").await.unwrap());

        let sub = get_subscription(&db, "user-1").await.unwrap().unwrap();
        assert_eq!(sub.status, SubscriptionStatus::Canceled);
        assert_eq!(sub.plan, Plan::Pro);

        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn missing_subscription_is_none() {
        let (db, _dir) = setup_db().await;
        assert!(get_subscription(&db, "nobody").await.unwrap().is_none());
        db.close().await.unwrap();
    }
}
