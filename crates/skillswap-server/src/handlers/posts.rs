use std::collections::HashMap;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use chrono::{DateTime, Utc};
use skillswap_shared::api::{POST_IMAGES_FIELD, POST_LIST_FIELDS, POST_VIDEOS_FIELD};
use skillswap_shared::{Post, PostImage, PostVideo, User};
use sqlx::types::Json as DbJson;
use sqlx::{Sqlite, Transaction};
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::db::users::require_user;
use crate::error::AppError;
use crate::extract::ApiMultipart;
use crate::forms::FormData;
use crate::media::MediaKind;
use crate::routes::AppState;

#[derive(Debug, sqlx::FromRow)]
struct PostRow {
    id: Uuid,
    user_id: Uuid,
    skills: DbJson<Vec<String>>,
    wanted_skills: DbJson<Vec<String>>,
    availability: DbJson<Vec<String>>,
    time_slots: DbJson<Vec<String>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl PostRow {
    fn list_mut(&mut self, field: &str) -> Option<&mut DbJson<Vec<String>>> {
        match field {
            "skills" => Some(&mut self.skills),
            "wanted_skills" => Some(&mut self.wanted_skills),
            "availability" => Some(&mut self.availability),
            "time_slots" => Some(&mut self.time_slots),
            _ => None,
        }
    }
}

type MediaRow = (
    Uuid,          // id
    String,        // kind
    String,        // path
    DateTime<Utc>, // uploaded_at
);

const IMAGE: &str = "image";
const VIDEO: &str = "video";

/// Attach users and media to post rows, preserving row order.
async fn hydrate_posts(state: &AppState, rows: Vec<PostRow>) -> Result<Vec<Post>, AppError> {
    let mut users: HashMap<Uuid, User> = HashMap::new();
    let mut posts = Vec::with_capacity(rows.len());

    for row in rows {
        if !users.contains_key(&row.user_id) {
            let user = require_user(&state.db, &state.media, row.user_id).await?;
            users.insert(row.user_id, user);
        }
        let user = users[&row.user_id].clone();

        let media: Vec<MediaRow> = sqlx::query_as(
            r#"
            SELECT id, kind, path, uploaded_at
            FROM post_media
            WHERE post_id = ?
            ORDER BY position ASC
            "#,
        )
        .bind(row.id)
        .fetch_all(&state.db)
        .await?;

        let mut images = Vec::new();
        let mut videos = Vec::new();
        for (id, kind, path, uploaded_at) in media {
            let url = state.media.url(&path);
            if kind == VIDEO {
                videos.push(PostVideo { id, video: url, uploaded_at });
            } else {
                images.push(PostImage { id, image: url, uploaded_at });
            }
        }

        posts.push(Post {
            id: row.id,
            user,
            skills: row.skills.0,
            wanted_skills: row.wanted_skills.0,
            availability: row.availability.0,
            time_slots: row.time_slots.0,
            images,
            videos,
            created_at: row.created_at,
            updated_at: row.updated_at,
        });
    }

    Ok(posts)
}

async fn find_own_post(state: &AppState, post_id: Uuid, user_id: Uuid) -> Result<PostRow, AppError> {
    let row: Option<PostRow> = sqlx::query_as(
        r#"
        SELECT id, user_id, skills, wanted_skills, availability, time_slots, created_at, updated_at
        FROM posts
        WHERE id = ? AND user_id = ?
        "#,
    )
    .bind(post_id)
    .bind(user_id)
    .fetch_optional(&state.db)
    .await?;

    row.ok_or_else(|| AppError::not_found("Post"))
}

async fn hydrate_one(state: &AppState, row: PostRow) -> Result<Post, AppError> {
    hydrate_posts(state, vec![row])
        .await?
        .pop()
        .ok_or_else(|| AppError::not_found("Post"))
}

/// Media written to the store for one request, not yet recorded in the
/// database.
type StoredMedia = Vec<(&'static str, String)>;

/// Write the form's image and video files to the media store in upload
/// order. If any write fails, the files already written are removed.
async fn store_uploads(state: &AppState, form: &FormData) -> Result<StoredMedia, AppError> {
    let mut stored = Vec::new();
    let uploads = form
        .files(POST_IMAGES_FIELD)
        .map(|f| (IMAGE, MediaKind::PostImage, f))
        .chain(form.files(POST_VIDEOS_FIELD).map(|f| (VIDEO, MediaKind::PostVideo, f)))
        .filter(|(_, _, f)| !f.is_empty());

    for (kind, media_kind, file) in uploads {
        match state
            .media
            .save(media_kind, file.file_name.as_deref(), &file.bytes)
            .await
        {
            Ok(path) => stored.push((kind, path)),
            Err(e) => {
                discard(state, &stored).await;
                return Err(e);
            }
        }
    }

    Ok(stored)
}

async fn discard(state: &AppState, stored: &StoredMedia) {
    for (_, path) in stored {
        state.media.remove(path).await;
    }
}

/// Record `stored` against `post_id`, after any attachments it already has.
async fn insert_media(
    tx: &mut Transaction<'_, Sqlite>,
    post_id: Uuid,
    stored: &StoredMedia,
) -> Result<(), AppError> {
    let (next_position,): (i64,) =
        sqlx::query_as("SELECT COALESCE(MAX(position) + 1, 0) FROM post_media WHERE post_id = ?")
            .bind(post_id)
            .fetch_one(&mut **tx)
            .await?;

    let now = Utc::now();
    for (offset, (kind, path)) in stored.iter().enumerate() {
        sqlx::query(
            r#"
            INSERT INTO post_media (id, post_id, kind, path, position, uploaded_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(post_id)
        .bind(*kind)
        .bind(path)
        .bind(next_position + offset as i64)
        .bind(now)
        .execute(&mut **tx)
        .await?;
    }

    Ok(())
}

/// GET /api/v1/posts
pub async fn list_my_posts(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<Vec<Post>>, AppError> {
    let rows: Vec<PostRow> = sqlx::query_as(
        r#"
        SELECT id, user_id, skills, wanted_skills, availability, time_slots, created_at, updated_at
        FROM posts
        WHERE user_id = ?
        ORDER BY created_at DESC, rowid DESC
        "#,
    )
    .bind(user.id)
    .fetch_all(&state.db)
    .await?;

    Ok(Json(hydrate_posts(&state, rows).await?))
}

/// GET /api/v1/posts/all
pub async fn list_all_posts(
    State(state): State<AppState>,
    Extension(_user): Extension<AuthUser>,
) -> Result<Json<Vec<Post>>, AppError> {
    let rows: Vec<PostRow> = sqlx::query_as(
        r#"
        SELECT id, user_id, skills, wanted_skills, availability, time_slots, created_at, updated_at
        FROM posts
        ORDER BY created_at DESC, rowid DESC
        "#,
    )
    .fetch_all(&state.db)
    .await?;

    Ok(Json(hydrate_posts(&state, rows).await?))
}

/// POST /api/v1/posts
pub async fn create_post(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    ApiMultipart(multipart): ApiMultipart,
) -> Result<(StatusCode, Json<Post>), AppError> {
    let form = FormData::read(multipart).await?;

    let now = Utc::now();
    let mut row = PostRow {
        id: Uuid::new_v4(),
        user_id: user.id,
        skills: DbJson(Vec::new()),
        wanted_skills: DbJson(Vec::new()),
        availability: DbJson(Vec::new()),
        time_slots: DbJson(Vec::new()),
        created_at: now,
        updated_at: now,
    };
    for field in POST_LIST_FIELDS {
        if let (Some(values), Some(slot)) = (form.json_list(field)?, row.list_mut(field)) {
            *slot = DbJson(values);
        }
    }

    let stored = store_uploads(&state, &form).await?;

    let saved = async {
        let mut tx = state.db.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO posts (id, user_id, skills, wanted_skills, availability, time_slots,
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
        .execute(&mut *tx)
        .await?;

        insert_media(&mut tx, row.id, &stored).await?;
        tx.commit().await?;
        Ok::<(), AppError>(())
    }
    .await;

    if let Err(e) = saved {
        discard(&state, &stored).await;
        return Err(e);
    }

    tracing::info!(post_id = %row.id, user_id = %user.id, attached = stored.len(), "Post created");

    Ok((StatusCode::CREATED, Json(hydrate_one(&state, row).await?)))
}

/// GET /api/v1/posts/:id
pub async fn get_post(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(post_id): Path<Uuid>,
) -> Result<Json<Post>, AppError> {
    let row = find_own_post(&state, post_id, user.id).await?;
    Ok(Json(hydrate_one(&state, row).await?))
}

/// PUT /api/v1/posts/:id
pub async fn update_post(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(post_id): Path<Uuid>,
    ApiMultipart(multipart): ApiMultipart,
) -> Result<Json<Post>, AppError> {
    let mut row = find_own_post(&state, post_id, user.id).await?;
    let form = FormData::read(multipart).await?;

    // Only the list fields present in the form are replaced.
    for field in POST_LIST_FIELDS {
        if let (Some(values), Some(slot)) = (form.json_list(field)?, row.list_mut(field)) {
            *slot = DbJson(values);
        }
    }
    row.updated_at = Utc::now();

    let stored = store_uploads(&state, &form).await?;

    let saved = async {
        let mut tx = state.db.begin().await?;

        sqlx::query(
            r#"
            UPDATE posts
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
        .execute(&mut *tx)
        .await?;

        insert_media(&mut tx, row.id, &stored).await?;
        tx.commit().await?;
        Ok::<(), AppError>(())
    }
    .await;

    if let Err(e) = saved {
        discard(&state, &stored).await;
        return Err(e);
    }

    Ok(Json(hydrate_one(&state, row).await?))
}

/// DELETE /api/v1/posts/:id
pub async fn delete_post(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(post_id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    let row = find_own_post(&state, post_id, user.id).await?;

    let mut tx = state.db.begin().await?;

    let files: Vec<(String,)> = sqlx::query_as("SELECT path FROM post_media WHERE post_id = ?")
        .bind(row.id)
        .fetch_all(&mut *tx)
        .await?;

    sqlx::query("DELETE FROM post_media WHERE post_id = ?")
        .bind(row.id)
        .execute(&mut *tx)
        .await?;
    sqlx::query("DELETE FROM posts WHERE id = ?")
        .bind(row.id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;

    for (path,) in &files {
        state.media.remove(path).await;
    }

    tracing::info!(post_id = %row.id, "Post deleted");

    Ok(StatusCode::NO_CONTENT)
}
