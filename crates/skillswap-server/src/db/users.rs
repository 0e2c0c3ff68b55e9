use skillswap_shared::User;
use sqlx::SqliteExecutor;
use uuid::Uuid;

use crate::error::AppError;
use crate::media::MediaStore;

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct UserRow {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub phone_number: Option<String>,
    /// Path relative to the media root.
    pub profile_image: Option<String>,
}

impl UserRow {
    pub fn into_user(self, media: &MediaStore) -> User {
        User {
            id: self.id,
            username: self.username,
            email: self.email,
            first_name: self.first_name,
            last_name: self.last_name,
            phone_number: self.phone_number,
            profile_image: self.profile_image.as_deref().map(|p| media.url(p)),
        }
    }
}

pub async fn find_user<'e, E>(executor: E, user_id: Uuid) -> Result<Option<UserRow>, sqlx::Error>
where
    E: SqliteExecutor<'e>,
{
    sqlx::query_as(
        r#"
        SELECT id, username, email, first_name, last_name, phone_number, profile_image
        FROM users
        WHERE id = ?
        "#,
    )
    .bind(user_id)
    .fetch_optional(executor)
    .await
}

/// Load a user or fail with `NotFound("User not found")`.
pub async fn require_user<'e, E>(
    executor: E,
    media: &MediaStore,
    user_id: Uuid,
) -> Result<User, AppError>
where
    E: SqliteExecutor<'e>,
{
    find_user(executor, user_id)
        .await?
        .map(|row| row.into_user(media))
        .ok_or_else(|| AppError::not_found("User"))
}

pub async fn user_exists<'e, E>(executor: E, user_id: Uuid) -> Result<bool, sqlx::Error>
where
    E: SqliteExecutor<'e>,
{
    let row: Option<(Uuid,)> = sqlx::query_as("SELECT id FROM users WHERE id = ?")
        .bind(user_id)
        .fetch_optional(executor)
        .await?;

    Ok(row.is_some())
}
