// SPDX-FileCopyrightText: 2026 Banter Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-user daily prompt counters.
//!
//! The reset/check/increment sequence runs as one transaction on the
//! single-writer connection, so concurrent sends from the same user can
//! never both observe the pre-increment count.

use banter_core::BanterError;
use rusqlite::params;

use crate::database::Database;
use crate::models::RateCounter;

/// Atomically check and increment a user's counter for `today`.
///
/// If the stored date differs from `today`, the count resets to zero
/// first. When the count has already reached `daily_limit` the counter is
/// left untouched and `Ok(None)` is returned; otherwise the incremented
/// count is returned.
pub async fn check_and_increment(
    db: &Database,
    user_id: &str,
    today: &str,
    daily_limit: i64,
) -> Result<Option<i64>, BanterError> {
    let user_id = user_id.to_string();
    let today = today.to_string();
    db.connection()
        .call(move |conn| {
            let tx = conn.transaction()?;

            let existing = tx.query_row(
                "SELECT daily_count, last_counted_date FROM rate_counters WHERE user_id = ?1",
                params![user_id],
                |row| Ok((row.get::<_, i64>(0)?, row.get::<_, String>(1)?)),
            );

            let current = match existing {
                Ok((count, date)) if date == today => count,
                Ok(_) => 0, // stored date is stale; counter resets
                Err(rusqlite::Error::QueryReturnedNoRows) => 0,
                Err(e) => return Err(e.into()),
            };

            if current >= daily_limit {
                tx.commit()?;
                return Ok(None);
            }

            let new_count = current + 1;
            tx.execute(
                "INSERT INTO rate_counters (user_id, daily_count, last_counted_date)
                 VALUES (?1, ?2, ?3)
                 ON CONFLICT(user_id) DO UPDATE SET
                     daily_count = excluded.daily_count,
                     last_counted_date = excluded.last_counted_date",
                params![user_id, new_count, today],
            )?;
            tx.commit()?;
            Ok(Some(new_count))
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Fetch a user's counter, if one exists.
pub async fn get_counter(
    db: &Database,
    user_id: &str,
) -> Result<Option<RateCounter>, BanterError> {
    let user_id = user_id.to_string();
    db.connection()
        .call(move |conn| {
            let result = conn.query_row(
                "SELECT user_id, daily_count, last_counted_date
                 FROM rate_counters WHERE user_id = ?1",
                params![user_id],
                |row| {
                    Ok(RateCounter {
                        user_id: row.get(0)?,
                        daily_count: row.get(1)?,
                        last_counted_date: row.get(2)?,
                    })
                },
            );
            match result {
                Ok(counter) => Ok(Some(counter)),
                Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                Err(e) => Err(e.into()),
            }
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Overwrite a user's counter. Used to seed state in tests.
pub async fn set_counter(
    db: &Database,
    user_id: &str,
    daily_count: i64,
    last_counted_date: &str,
) -> Result<(), BanterError> {
    let user_id = user_id.to_string();
    let last_counted_date = last_counted_date.to_string();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO rate_counters (user_id, daily_count, last_counted_date)
                 VALUES (?1, ?2, ?3)
                 ON CONFLICT(user_id) DO UPDATE SET
                     daily_count = excluded.daily_count,
                     last_counted_date = excluded.last_counted_date",
                params![user_id, daily_count, last_counted_date],
            )?;
            Ok(())
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
    async fn first_prompt_creates_counter_at_one() {
        let (db, _dir) = setup_db().await;

        let count = check_and_increment(&db, "user-1", "2026-08-07", 5)
            .await
            .unwrap();
        assert_eq!(count, Some(1));

        let counter = get_counter(&db, "user-1").await.unwrap().unwrap();
        assert_eq!(counter.daily_count, 1);
        assert_eq!(counter.last_counted_date, "2026-08-07");

        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn cap_is_reached_at_limit_and_state_untouched() {
        let (db, _dir) = setup_db().await;

        set_counter(&db, "user-1", 4, "2026-08-07").await.unwrap();

        // Fifth prompt of the day is allowed.
        let count = check_and_increment(&db, "user-1", "2026-08-07", 5)
            .await
            .unwrap();
        assert_eq!(count, Some(5));

        // Sixth is rejected and the counter does not move.
        let rejected = check_and_increment(&db, "user-1", "2026-08-07", 5)
            .await
            .unwrap();
        assert_eq!(rejected, None);
        let counter = get_counter(&db, "user-1").await.unwrap().unwrap();
        assert_eq!(counter.daily_count, 5);

        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn stale_date_resets_count() {
        let (db, _dir) = setup_db().await;

        set_counter(&db, "user-1", 5, "2026-08-06").await.unwrap();

        let count = check_and_increment(&db, "user-1", "2026-08-07", 5)
            .await
            .unwrap();
        assert_eq!(count, Some(1));

        let counter = get_counter(&db, "user-1").await.unwrap().unwrap();
        assert_eq!(counter.daily_count, 1);
        assert_eq!(counter.last_counted_date, "2026-08-07");

        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn concurrent_increments_never_exceed_limit() {
        let (db, _dir) = setup_db().await;

        let mut handles = Vec::new();
        for _ in 0..20 {
            let db = db.clone();
            handles.push(tokio::spawn(async move {
                check_and_increment(&db, "user-1", "2026-08-07", 5).await
            }));
        }

        let mut allowed = 0;
        for handle in handles {
            if handle.await.unwrap().unwrap().is_some() {
                allowed += 1;
            }
        }
        assert_eq!(allowed, 5, "exactly the cap should be admitted");

        let counter = get_counter(&db, "user-1").await.unwrap().unwrap();
        assert_eq!(counter.daily_count, 5);

        db.close().await.unwrap();
    }
}
