//! Connection lifecycle between two users.
//!
//! A connection is created `pending` by the requester and answered by the
//! recipient. Lookups treat the pair as unordered: `(a, b)` and `(b, a)` are
//! the same relationship, and only one record may exist for it regardless of
//! status. The store enforces this with a unique index, so two concurrent
//! requests cannot both succeed.

use chrono::{DateTime, Utc};
use skillswap_shared::api::{ConnectionStatusResponse, RespondConnectionResponse};
use skillswap_shared::{Connection, ConnectionAction, ConnectionStatus, RelationshipStatus, User};
use sqlx::SqliteExecutor;
use uuid::Uuid;

use crate::db::users::{require_user, user_exists};
use crate::error::{is_unique_violation, AppError};
use crate::routes::AppState;

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ConnectionRecord {
    pub id: Uuid,
    pub from_user_id: Uuid,
    pub to_user_id: Uuid,
    pub status: ConnectionStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ConnectionRecord {
    pub fn other_user_id(&self, user_id: Uuid) -> Uuid {
        if self.from_user_id == user_id {
            self.to_user_id
        } else {
            self.from_user_id
        }
    }
}

/// Any connection between `a` and `b`, in either direction.
pub async fn find_between<'e, E>(
    executor: E,
    a: Uuid,
    b: Uuid,
) -> Result<Option<ConnectionRecord>, sqlx::Error>
where
    E: SqliteExecutor<'e>,
{
    sqlx::query_as(
        r#"
        SELECT id, from_user_id, to_user_id, status, created_at, updated_at
        FROM connections
        WHERE (from_user_id = ?1 AND to_user_id = ?2)
           OR (from_user_id = ?2 AND to_user_id = ?1)
        LIMIT 1
        "#,
    )
    .bind(a)
    .bind(b)
    .fetch_optional(executor)
    .await
}

async fn hydrate(state: &AppState, record: ConnectionRecord) -> Result<Connection, AppError> {
    let from_user = require_user(&state.db, &state.media, record.from_user_id).await?;
    let to_user = require_user(&state.db, &state.media, record.to_user_id).await?;

    Ok(Connection {
        id: record.id,
        from_user,
        to_user,
        status: record.status,
        created_at: record.created_at,
        updated_at: record.updated_at,
    })
}

pub async fn send_request(
    state: &AppState,
    requester: Uuid,
    target_id: Uuid,
) -> Result<Connection, AppError> {
    if !user_exists(&state.db, target_id).await? {
        return Err(AppError::not_found("User"));
    }

    if requester == target_id {
        return Err(AppError::InvalidOperation(
            "Cannot connect with yourself".to_string(),
        ));
    }

    if find_between(&state.db, requester, target_id).await?.is_some() {
        return Err(AppError::Conflict(
            "Connection request already exists".to_string(),
        ));
    }

    let now = Utc::now();
    let record = ConnectionRecord {
        id: Uuid::new_v4(),
        from_user_id: requester,
        to_user_id: target_id,
        status: ConnectionStatus::Pending,
        created_at: now,
        updated_at: now,
    };

    let inserted = sqlx::query(
        r#"
        INSERT INTO connections (id, from_user_id, to_user_id, status, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(record.id)
    .bind(record.from_user_id)
    .bind(record.to_user_id)
    .bind(record.status)
    .bind(record.created_at)
    .bind(record.updated_at)
    .execute(&state.db)
    .await;

    match inserted {
        Ok(_) => {}
        // Lost a race with a concurrent request for the same pair.
        Err(e) if is_unique_violation(&e) => {
            return Err(AppError::Conflict(
                "Connection request already exists".to_string(),
            ));
        }
        Err(e) => return Err(e.into()),
    }

    tracing::info!(
        connection_id = %record.id,
        from = %requester,
        to = %target_id,
        "Connection requested"
    );

    hydrate(state, record).await
}

/// Accept or reject a request addressed to `responder`.
pub async fn respond(
    state: &AppState,
    responder: Uuid,
    connection_id: Uuid,
    action: &str,
) -> Result<RespondConnectionResponse, AppError> {
    let record: Option<ConnectionRecord> = sqlx::query_as(
        r#"
        SELECT id, from_user_id, to_user_id, status, created_at, updated_at
        FROM connections
        WHERE id = ? AND to_user_id = ?
        "#,
    )
    .bind(connection_id)
    .bind(responder)
    .fetch_optional(&state.db)
    .await?;

    let mut record = record.ok_or_else(|| AppError::not_found("Connection request"))?;

    let action: ConnectionAction = action
        .parse()
        .map_err(|_| AppError::InvalidOperation("Invalid action".to_string()))?;

    record.status = action.resulting_status();
    record.updated_at = Utc::now();

    sqlx::query("UPDATE connections SET status = ?, updated_at = ? WHERE id = ?")
        .bind(record.status)
        .bind(record.updated_at)
        .bind(record.id)
        .execute(&state.db)
        .await?;

    tracing::info!(
        connection_id = %record.id,
        status = %record.status,
        "Connection request answered"
    );

    let connection = hydrate(state, record).await?;
    let sender_name = connection.from_user.full_name();
    let accepter_name = connection.to_user.full_name();

    Ok(RespondConnectionResponse {
        message: format!(
            "You {} connection request from {}",
            action.past_tense(),
            sender_name
        ),
        sender_name,
        accepter_name,
        connection,
    })
}

/// Relationship between `viewer` and `other_id` as seen by `viewer`.
pub async fn get_status(
    state: &AppState,
    viewer: Uuid,
    other_id: Uuid,
) -> Result<ConnectionStatusResponse, AppError> {
    if !user_exists(&state.db, other_id).await? {
        return Err(AppError::not_found("User"));
    }

    let Some(record) = find_between(&state.db, viewer, other_id).await? else {
        return Ok(ConnectionStatusResponse {
            status: RelationshipStatus::None,
            is_sender: None,
            connection: None,
        });
    };

    let is_sender = record.from_user_id == viewer;
    let status = record.status.into();
    let connection = hydrate(state, record).await?;

    Ok(ConnectionStatusResponse {
        status,
        is_sender: Some(is_sender),
        connection: Some(connection),
    })
}

/// Pending requests addressed to `user_id`, newest first.
pub async fn list_pending(state: &AppState, user_id: Uuid) -> Result<Vec<Connection>, AppError> {
    let records: Vec<ConnectionRecord> = sqlx::query_as(
        r#"
        SELECT id, from_user_id, to_user_id, status, created_at, updated_at
        FROM connections
        WHERE to_user_id = ? AND status = ?
        ORDER BY created_at DESC
        "#,
    )
    .bind(user_id)
    .bind(ConnectionStatus::Pending)
    .fetch_all(&state.db)
    .await?;

    let mut connections = Vec::with_capacity(records.len());
    for record in records {
        connections.push(hydrate(state, record).await?);
    }
    Ok(connections)
}

/// Users joined to `user_id` by an accepted connection, in either direction.
pub async fn list_connected(state: &AppState, user_id: Uuid) -> Result<Vec<User>, AppError> {
    let records: Vec<ConnectionRecord> = sqlx::query_as(
        r#"
        SELECT id, from_user_id, to_user_id, status, created_at, updated_at
        FROM connections
        WHERE status = ?2 AND (from_user_id = ?1 OR to_user_id = ?1)
        ORDER BY updated_at DESC
        "#,
    )
    .bind(user_id)
    .bind(ConnectionStatus::Accepted)
    .fetch_all(&state.db)
    .await?;

    let mut users = Vec::with_capacity(records.len());
    for record in records {
        let other = record.other_user_id(user_id);
        users.push(require_user(&state.db, &state.media, other).await?);
    }
    Ok(users)
}

/// Delete the accepted connection between `user_id` and `other_id`.
/// Returns the other user.
pub async fn disconnect(state: &AppState, user_id: Uuid, other_id: Uuid) -> Result<User, AppError> {
    let other = require_user(&state.db, &state.media, other_id).await?;

    let record = find_between(&state.db, user_id, other_id)
        .await?
        .filter(|record| record.status == ConnectionStatus::Accepted)
        .ok_or_else(|| AppError::NotFound("No active connection found".to_string()))?;

    sqlx::query("DELETE FROM connections WHERE id = ?")
        .bind(record.id)
        .execute(&state.db)
        .await?;

    tracing::info!(connection_id = %record.id, %user_id, %other_id, "Connection removed");

    Ok(other)
}
