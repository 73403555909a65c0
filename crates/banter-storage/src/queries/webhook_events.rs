// SPDX-FileCopyrightText: 2026 Banter Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Processed billing event ids.
//!
//! The handlers themselves are idempotent, but recording event ids keeps
//! the audit trail dedup-correct and lets re-deliveries be skipped.

use banter_core::BanterError;
use rusqlite::params;

use crate::database::Database;

/// Whether an event id has already been processed.
pub async fn is_processed(db: &Database, event_id: &str) -> Result<bool, BanterError> {
    let event_id = event_id.to_string();
    db.connection()
        .call(move |conn| {
            let count: i64 = conn.query_row(
                "SELECT COUNT(*) FROM webhook_events WHERE event_id = ?1",
                params![event_id],
                |row| row.get(0),
            )?;
            Ok(count > 0)
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Record an event id as processed. Returns `false` if it was already
/// recorded.
pub async fn mark_processed(
    db: &Database,
    event_id: &str,
    kind: &str,
) -> Result<bool, BanterError> {
    let event_id = event_id.to_string();
    let kind = kind.to_string();
    db.connection()
        .call(move |conn| {
            let inserted = conn.execute(
                "INSERT OR IGNORE INTO webhook_events (event_id, kind) VALUES (?1, ?2)",
                params![event_id, kind],
            )?;
            Ok(inserted > 0)
        })
        .await
        .map_err(crate::database::map_tr_err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn mark_and_detect_duplicate() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("test.db");
        let db = Database::open(db_path.to_str().unwrap()).await.unwrap();

        assert!(!is_processed(&db, "evt_1").await.unwrap());
        assert!(mark_processed(&db, "evt_1", "checkout.session.completed")
            .await
            .unwrap());
        assert!(is_processed(&db, "evt_1").await.unwrap());

        // Second mark is a no-op.
        assert!(!mark_processed(&db, "evt_1", "checkout.session.completed")
            .await
            .unwrap());

        db.close().await.unwrap();
    }
}
