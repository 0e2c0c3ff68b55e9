use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use chrono::{DateTime, Utc};
use skillswap_shared::api::{
    MessageResponse, RingtoneResponse, DEFAULT_RINGTONE_NAME, RINGTONE_FILE_FIELD,
};
use skillswap_shared::Ringtone;
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::config::MAX_RINGTONE_BYTES;
use crate::error::AppError;
use crate::extract::ApiMultipart;
use crate::forms::FormData;
use crate::media::{MediaKind, MediaStore};
use crate::routes::AppState;

type RingtoneRow = (
    Uuid,          // id
    String,        // name
    String,        // audio_file
    bool,          // is_active
    DateTime<Utc>, // created_at
);

fn row_to_ringtone(media: &MediaStore, row: RingtoneRow) -> Ringtone {
    Ringtone {
        id: row.0,
        name: row.1,
        audio_file: media.url(&row.2),
        is_active: row.3,
        created_at: row.4,
    }
}

async fn find_ringtone(
    state: &AppState,
    ringtone_id: Uuid,
    user_id: Uuid,
) -> Result<RingtoneRow, AppError> {
    let row: Option<RingtoneRow> = sqlx::query_as(
        r#"
        SELECT id, name, audio_file, is_active, created_at
        FROM ringtones
        WHERE id = ? AND user_id = ?
        "#,
    )
    .bind(ringtone_id)
    .bind(user_id)
    .fetch_optional(&state.db)
    .await?;

    row.ok_or_else(|| AppError::not_found("Ringtone"))
}

/// GET /api/v1/ringtones
pub async fn list_ringtones(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<Vec<Ringtone>>, AppError> {
    let rows: Vec<RingtoneRow> = sqlx::query_as(
        r#"
        SELECT id, name, audio_file, is_active, created_at
        FROM ringtones
        WHERE user_id = ?
        ORDER BY created_at DESC, rowid DESC
        "#,
    )
    .bind(user.id)
    .fetch_all(&state.db)
    .await?;

    Ok(Json(
        rows.into_iter()
            .map(|row| row_to_ringtone(&state.media, row))
            .collect(),
    ))
}

/// POST /api/v1/ringtones/upload
///
/// A new upload becomes the active ringtone.
pub async fn upload_ringtone(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    ApiMultipart(multipart): ApiMultipart,
) -> Result<(StatusCode, Json<RingtoneResponse>), AppError> {
    let form = FormData::read(multipart).await?;

    let file = form
        .first_file(RINGTONE_FILE_FIELD)
        .filter(|f| !f.is_empty())
        .ok_or_else(|| AppError::InvalidOperation("No audio file provided".to_string()))?;

    if !file
        .content_type
        .as_deref()
        .is_some_and(|ct| ct.starts_with("audio/"))
    {
        return Err(AppError::PayloadInvalid(
            "Invalid file type. Only audio files are allowed.".to_string(),
        ));
    }

    if file.len() > MAX_RINGTONE_BYTES {
        return Err(AppError::PayloadInvalid(
            "File too large. Maximum size is 5MB.".to_string(),
        ));
    }

    let name = form
        .text("name")
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .unwrap_or(DEFAULT_RINGTONE_NAME)
        .to_string();

    let path = state
        .media
        .save(MediaKind::Ringtone, file.file_name.as_deref(), &file.bytes)
        .await?;

    let row: RingtoneRow = (Uuid::new_v4(), name, path, true, Utc::now());

    let saved = async {
        let mut tx = state.db.begin().await?;

        sqlx::query("UPDATE ringtones SET is_active = 0 WHERE user_id = ?")
            .bind(user.id)
            .execute(&mut *tx)
            .await?;

        sqlx::query(
            r#"
            INSERT INTO ringtones (id, user_id, name, audio_file, is_active, created_at)
            VALUES (?, ?, ?, ?, 1, ?)
            "#,
        )
        .bind(row.0)
        .bind(user.id)
        .bind(&row.1)
        .bind(&row.2)
        .bind(row.4)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok::<(), AppError>(())
    }
    .await;

    if let Err(e) = saved {
        state.media.remove(&row.2).await;
        return Err(e);
    }

    tracing::info!(ringtone_id = %row.0, user_id = %user.id, "Ringtone uploaded");

    Ok((
        StatusCode::CREATED,
        Json(RingtoneResponse {
            message: "Ringtone uploaded and activated successfully".to_string(),
            ringtone: row_to_ringtone(&state.media, row),
        }),
    ))
}

/// DELETE /api/v1/ringtones/:id
pub async fn delete_ringtone(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(ringtone_id): Path<Uuid>,
) -> Result<Json<MessageResponse>, AppError> {
    let (id, _, audio_file, _, _) = find_ringtone(&state, ringtone_id, user.id).await?;

    sqlx::query("DELETE FROM ringtones WHERE id = ?")
        .bind(id)
        .execute(&state.db)
        .await?;

    state.media.remove(&audio_file).await;

    Ok(Json(MessageResponse {
        message: "Ringtone deleted successfully".to_string(),
    }))
}

/// POST /api/v1/ringtones/:id/activate
pub async fn activate_ringtone(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(ringtone_id): Path<Uuid>,
) -> Result<Json<RingtoneResponse>, AppError> {
    let mut tx = state.db.begin().await?;

    // Deactivate first so the one-active index never sees two rows.
    sqlx::query("UPDATE ringtones SET is_active = 0 WHERE user_id = ?")
        .bind(user.id)
        .execute(&mut *tx)
        .await?;

    let activated = sqlx::query("UPDATE ringtones SET is_active = 1 WHERE id = ? AND user_id = ?")
        .bind(ringtone_id)
        .bind(user.id)
        .execute(&mut *tx)
        .await?
        .rows_affected();

    if activated == 0 {
        tx.rollback().await?;
        return Err(AppError::not_found("Ringtone"));
    }

    tx.commit().await?;

    let row = find_ringtone(&state, ringtone_id, user.id).await?;

    Ok(Json(RingtoneResponse {
        message: "Ringtone activated successfully".to_string(),
        ringtone: row_to_ringtone(&state.media, row),
    }))
}

/// GET /api/v1/ringtones/active
pub async fn active_ringtone(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<Ringtone>, AppError> {
    let row: Option<RingtoneRow> = sqlx::query_as(
        r#"
        SELECT id, name, audio_file, is_active, created_at
        FROM ringtones
        WHERE user_id = ? AND is_active = 1
        "#,
    )
    .bind(user.id)
    .fetch_optional(&state.db)
    .await?;

    let row = row.ok_or_else(|| AppError::NotFound("No active ringtone set".to_string()))?;

    Ok(Json(row_to_ringtone(&state.media, row)))
}
