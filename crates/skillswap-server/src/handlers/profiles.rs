use axum::{extract::State, http::StatusCode, Extension, Json};
use chrono::{DateTime, Utc};
use skillswap_shared::api::ProfileRequest;
use skillswap_shared::Profile;
use sqlx::types::Json as DbJson;
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::db::users::require_user;
use crate::error::AppError;
use crate::extract::ApiJson;
use crate::routes::AppState;

#[derive(Debug, sqlx::FromRow)]
struct ProfileRow {
    id: Uuid,
    user_id: Uuid,
    skills: DbJson<Vec<String>>,
    wanted_skills: DbJson<Vec<String>>,
    availability: DbJson<Vec<String>>,
    time_slots: DbJson<Vec<String>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

async fn row_to_profile(state: &AppState, row: ProfileRow) -> Result<Profile, AppError> {
    let user = require_user(&state.db, &state.media, row.user_id).await?;
    Ok(Profile {
        id: row.id,
        user,
        skills: row.skills.0,
        wanted_skills: row.wanted_skills.0,
        availability: row.availability.0,
        time_slots: row.time_slots.0,
        created_at: row.created_at,
        updated_at: row.updated_at,
    })
}

async fn find_profile(state: &AppState, user_id: Uuid) -> Result<Option<ProfileRow>, AppError> {
    let row = sqlx::query_as(
        r#"
        SELECT id, user_id, skills, wanted_skills, availability, time_slots, created_at, updated_at
        FROM profiles
        WHERE user_id = ?
        "#,
    )
    .bind(user_id)
    .fetch_optional(&state.db)
    .await?;

    Ok(row)
}

/// GET /api/v1/profile
pub async fn get_profile(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<Profile>, AppError> {
    let row = find_profile(&state, user.id)
        .await?
        .ok_or_else(|| AppError::not_found("Profile"))?;

    Ok(Json(row_to_profile(&state, row).await?))
}

/// POST /api/v1/profile
pub async fn create_profile(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    ApiJson(req): ApiJson<ProfileRequest>,
) -> Result<(StatusCode, Json<Profile>), AppError> {
    if find_profile(&state, user.id).await?.is_some() {
        return Err(AppError::Conflict(
            "Profile already exists. Use PUT to update.".to_string(),
        ));
    }

    let now = Utc::now();
    let row = ProfileRow {
        id: Uuid::new_v4(),
        user_id: user.id,
        skills: DbJson(req.skills.unwrap_or_default()),
        wanted_skills: DbJson(req.wanted_skills.unwrap_or_default()),
        availability: DbJson(req.availability.unwrap_or_default()),
        time_slots: DbJson(req.time_slots.unwrap_or_default()),
        created_at: now,
        updated_at: now,
    };

    sqlx::query(
        r#"
        INSERT INTO profiles (id, user_id, skills, wanted_skills, availability, time_slots,
                              created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(row.id)
    .bind(row.user_id)
    .bind(&row.skills)
    .bind(&row.wanted_skills)
    .bind(&row.availability)
    .bind(&row.time_slots)
    .bind(row.created_at)
    .bind(row.updated_at)
    .execute(&state.db)
    .await
    .map_err(|e| {
        if crate::error::is_unique_violation(&e) {
            AppError::Conflict("Profile already exists. Use PUT to update.".to_string())
        } else {
            AppError::Database(e)
        }
    })?;

    Ok((StatusCode::CREATED, Json(row_to_profile(&state, row).await?)))
}

/// PUT /api/v1/profile
pub async fn update_profile(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    ApiJson(req): ApiJson<ProfileRequest>,
) -> Result<Json<Profile>, AppError> {
    let mut row = find_profile(&state, user.id)
        .await?
        .ok_or_else(|| AppError::not_found("Profile"))?;

    if let Some(skills) = req.skills {
        row.skills = DbJson(skills);
    }
    if let Some(wanted_skills) = req.wanted_skills {
        row.wanted_skills = DbJson(wanted_skills);
    }
    if let Some(availability) = req.availability {
        row.availability = DbJson(availability);
    }
    if let Some(time_slots) = req.time_slots {
        row.time_slots = DbJson(time_slots);
    }
    row.updated_at = Utc::now();

    sqlx::query(
        r#"
        UPDATE profiles
        SET skills = ?, wanted_skills = ?, availability = ?, time_slots = ?, updated_at = ?
        WHERE id = ?
        "#,
    )
    .bind(&row.skills)
    .bind(&row.wanted_skills)
    .bind(&row.availability)
    .bind(&row.time_slots)
    .bind(row.updated_at)
    .bind(row.id)
    .execute(&state.db)
    .await?;

    Ok(Json(row_to_profile(&state, row).await?))
}

/// GET /api/v1/profiles
pub async fn list_profiles(
    State(state): State<AppState>,
    Extension(_user): Extension<AuthUser>,
) -> Result<Json<Vec<Profile>>, AppError> {
    let rows: Vec<ProfileRow> = sqlx::query_as(
        r#"
        SELECT id, user_id, skills, wanted_skills, availability, time_slots, created_at, updated_at
        FROM profiles
        ORDER BY created_at DESC, rowid DESC
        "#,
    )
    .fetch_all(&state.db)
    .await?;

    let mut profiles = Vec::with_capacity(rows.len());
    for row in rows {
        profiles.push(row_to_profile(&state, row).await?);
    }

    Ok(Json(profiles))
}
