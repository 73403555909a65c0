// SPDX-FileCopyrightText: 2026 Banter Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Chatroom and message operations.
//!
//! Message appends run as one transaction (insert + `updated_at` bump) on
//! the single-writer connection, so concurrent producers and workers
//! cannot lose each other's appends.

use banter_core::BanterError;
use rusqlite::params;

use crate::database::Database;
use crate::models::{Chatroom, ChatroomSummary, Message, Sender};
use crate::queries::{now_rfc3339, parse_enum};

/// Create a chatroom for the given user. `title` defaults to "New Chat".
pub async fn create_chatroom(
    db: &Database,
    user_id: &str,
    title: Option<&str>,
) -> Result<Chatroom, BanterError> {
    let chatroom = Chatroom {
        id: uuid::Uuid::new_v4().to_string(),
        user_id: user_id.to_string(),
        title: title.unwrap_or("New Chat").to_string(),
        created_at: now_rfc3339(),
        updated_at: now_rfc3339(),
    };

    let row = chatroom.clone();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO chatrooms (id, user_id, title, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![row.id, row.user_id, row.title, row.created_at, row.updated_at],
            )?;
            Ok(())
        })
        .await
        .map_err(crate::database::map_tr_err)?;

    Ok(chatroom)
}

/// List a user's chatrooms, most recently updated first, without message
/// bodies. This is the shape the listing cache stores.
pub async fn list_summaries(
    db: &Database,
    user_id: &str,
) -> Result<Vec<ChatroomSummary>, BanterError> {
    let user_id = user_id.to_string();
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT id, title, created_at, updated_at
                 FROM chatrooms WHERE user_id = ?1
                 ORDER BY updated_at DESC",
            )?;
            let rows = stmt.query_map(params![user_id], |row| {
                Ok(ChatroomSummary {
                    id: row.get(0)?,
                    title: row.get(1)?,
                    created_at: row.get(2)?,
                    updated_at: row.get(3)?,
                })
            })?;
            let mut summaries = Vec::new();
            for row in rows {
                summaries.push(row?);
            }
            Ok(summaries)
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Fetch a single chatroom, enforcing ownership in the query itself.
pub async fn get_chatroom(
    db: &Database,
    user_id: &str,
    chatroom_id: &str,
) -> Result<Option<Chatroom>, BanterError> {
    let user_id = user_id.to_string();
    let chatroom_id = chatroom_id.to_string();
    db.connection()
        .call(move |conn| {
            let result = conn.query_row(
                "SELECT id, user_id, title, created_at, updated_at
                 FROM chatrooms WHERE id = ?1 AND user_id = ?2",
                params![chatroom_id, user_id],
                |row| {
                    Ok(Chatroom {
                        id: row.get(0)?,
                        user_id: row.get(1)?,
                        title: row.get(2)?,
                        created_at: row.get(3)?,
                        updated_at: row.get(4)?,
                    })
                },
            );
            match result {
                Ok(chatroom) => Ok(Some(chatroom)),
                Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                Err(e) => Err(e.into()),
            }
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Messages of a chatroom in insertion order (rowid, not timestamp).
pub async fn list_messages(
    db: &Database,
    chatroom_id: &str,
) -> Result<Vec<Message>, BanterError> {
    let chatroom_id = chatroom_id.to_string();
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT id, chatroom_id, sender, content, created_at
                 FROM messages WHERE chatroom_id = ?1
                 ORDER BY rowid ASC",
            )?;
            let rows = stmt.query_map(params![chatroom_id], |row| {
                let sender: String = row.get(2)?;
                Ok(Message {
                    id: row.get(0)?,
                    chatroom_id: row.get(1)?,
                    sender: parse_enum::<Sender>(2, &sender)?,
                    content: row.get(3)?,
                    created_at: row.get(4)?,
                })
            })?;
            let mut messages = Vec::new();
            for row in rows {
                messages.push(row?);
            }
            Ok(messages)
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Append a message to a chatroom the user owns, bumping `updated_at`.
///
/// Insert and bump happen in one transaction; returns `NotFound` when the
/// chatroom does not exist or belongs to someone else.
pub async fn append_message(
    db: &Database,
    user_id: &str,
    chatroom_id: &str,
    sender: Sender,
    content: &str,
) -> Result<Message, BanterError> {
    let message = Message {
        id: uuid::Uuid::new_v4().to_string(),
        chatroom_id: chatroom_id.to_string(),
        sender,
        content: content.to_string(),
        created_at: now_rfc3339(),
    };

    let row = message.clone();
    let user_id = user_id.to_string();
    let appended = db
        .connection()
        .call(move |conn| {
            let tx = conn.transaction()?;

            let owned: i64 = tx.query_row(
                "SELECT COUNT(*) FROM chatrooms WHERE id = ?1 AND user_id = ?2",
                params![row.chatroom_id, user_id],
                |r| r.get(0),
            )?;
            if owned == 0 {
                tx.commit()?;
                return Ok(false);
            }

            tx.execute(
                "INSERT INTO messages (id, chatroom_id, sender, content, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    row.id,
                    row.chatroom_id,
                    row.sender.to_string(),
                    row.content,
                    row.created_at,
                ],
            )?;
            tx.execute(
                "UPDATE chatrooms
                 SET updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
                 WHERE id = ?1",
                params![row.chatroom_id],
            )?;
            tx.commit()?;
            Ok(true)
        })
        .await
        .map_err(crate::database::map_tr_err)?;

    if appended {
        Ok(message)
    } else {
        Err(BanterError::not_found("chatroom"))
    }
}
