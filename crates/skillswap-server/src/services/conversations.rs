//! Direct messages and the per-peer conversation list.

use chrono::{DateTime, Utc};
use skillswap_shared::{Conversation, Message, User};
use uuid::Uuid;

use crate::db::users::require_user;
use crate::error::AppError;
use crate::routes::AppState;

type MessageRow = (
    Uuid,          // id
    Uuid,          // sender_id
    Uuid,          // receiver_id
    String,        // content
    DateTime<Utc>, // created_at
    bool,          // is_read
);

/// Build a message from a row exchanged between `a` and `b`.
fn row_to_message(row: MessageRow, a: &User, b: &User) -> Message {
    let (sender, receiver) = if row.1 == a.id { (a, b) } else { (b, a) };
    Message {
        id: row.0,
        sender: sender.clone(),
        receiver: receiver.clone(),
        content: row.3,
        created_at: row.4,
        is_read: row.5,
    }
}

pub async fn send_message(
    state: &AppState,
    sender_id: Uuid,
    receiver_id: Uuid,
    content: &str,
) -> Result<Message, AppError> {
    let receiver = require_user(&state.db, &state.media, receiver_id).await?;

    if content.trim().is_empty() {
        return Err(AppError::InvalidOperation(
            "Message content is required".to_string(),
        ));
    }

    let sender = require_user(&state.db, &state.media, sender_id).await?;
    let id = Uuid::new_v4();
    let now = Utc::now();

    sqlx::query(
        r#"
        INSERT INTO messages (id, sender_id, receiver_id, content, created_at, is_read)
        VALUES (?, ?, ?, ?, ?, 0)
        "#,
    )
    .bind(id)
    .bind(sender_id)
    .bind(receiver_id)
    .bind(content)
    .bind(now)
    .execute(&state.db)
    .await?;

    tracing::debug!(message_id = %id, from = %sender_id, to = %receiver_id, "Message sent");

    Ok(Message {
        id,
        sender,
        receiver,
        content: content.to_string(),
        created_at: now,
        is_read: false,
    })
}

/// All messages between `viewer` and `peer_id`, oldest first. Everything the
/// peer sent to the viewer is marked read in the same transaction.
pub async fn get_messages(
    state: &AppState,
    viewer: Uuid,
    peer_id: Uuid,
) -> Result<Vec<Message>, AppError> {
    let peer = require_user(&state.db, &state.media, peer_id).await?;
    let me = require_user(&state.db, &state.media, viewer).await?;

    let mut tx = state.db.begin().await?;

    let marked = sqlx::query(
        "UPDATE messages SET is_read = 1 WHERE sender_id = ? AND receiver_id = ? AND is_read = 0",
    )
    .bind(peer_id)
    .bind(viewer)
    .execute(&mut *tx)
    .await?
    .rows_affected();

    let rows: Vec<MessageRow> = sqlx::query_as(
        r#"
        SELECT id, sender_id, receiver_id, content, created_at, is_read
        FROM messages
        WHERE (sender_id = ?1 AND receiver_id = ?2)
           OR (sender_id = ?2 AND receiver_id = ?1)
        ORDER BY created_at ASC, rowid ASC
        "#,
    )
    .bind(viewer)
    .bind(peer_id)
    .fetch_all(&mut *tx)
    .await?;

    tx.commit().await?;

    if marked > 0 {
        tracing::debug!(%viewer, peer = %peer_id, marked, "Marked messages read");
    }

    Ok(rows
        .into_iter()
        .map(|row| row_to_message(row, &me, &peer))
        .collect())
}

/// One entry per peer `user_id` has exchanged messages with, most recent
/// conversation first.
pub async fn list_conversations(
    state: &AppState,
    user_id: Uuid,
) -> Result<Vec<Conversation>, AppError> {
    let me = require_user(&state.db, &state.media, user_id).await?;

    let peers: Vec<(Uuid,)> = sqlx::query_as(
        r#"
        SELECT DISTINCT CASE WHEN sender_id = ?1 THEN receiver_id ELSE sender_id END
        FROM messages
        WHERE sender_id = ?1 OR receiver_id = ?1
        "#,
    )
    .bind(user_id)
    .fetch_all(&state.db)
    .await?;

    let mut conversations = Vec::with_capacity(peers.len());

    for (peer_id,) in peers {
        let last: Option<MessageRow> = sqlx::query_as(
            r#"
            SELECT id, sender_id, receiver_id, content, created_at, is_read
            FROM messages
            WHERE (sender_id = ?1 AND receiver_id = ?2)
               OR (sender_id = ?2 AND receiver_id = ?1)
            ORDER BY created_at DESC, rowid DESC
            LIMIT 1
            "#,
        )
        .bind(user_id)
        .bind(peer_id)
        .fetch_optional(&state.db)
        .await?;

        let Some(last) = last else {
            continue;
        };

        let (unread_count,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM messages WHERE sender_id = ? AND receiver_id = ? AND is_read = 0",
        )
        .bind(peer_id)
        .bind(user_id)
        .fetch_one(&state.db)
        .await?;

        let peer = require_user(&state.db, &state.media, peer_id).await?;

        conversations.push(Conversation {
            last_message: row_to_message(last, &me, &peer),
            user: peer,
            unread_count,
        });
    }

    conversations.sort_by(|a, b| b.last_message.created_at.cmp(&a.last_message.created_at));

    Ok(conversations)
}
