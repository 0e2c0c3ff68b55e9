use std::sync::OnceLock;

use axum::{extract::State, http::StatusCode, Extension, Json};
use chrono::Utc;
use regex::Regex;
use skillswap_shared::api::{
    ChangePasswordRequest, LoginRequest, LoginResponse, MessageResponse, SignupRequest,
    SignupResponse, UserUpdateResponse,
};
use skillswap_shared::User;
use uuid::Uuid;

use crate::auth::{create_access_token, hash_password, verify_password, AuthUser};
use crate::db::users::{find_user, require_user};
use crate::error::{is_unique_violation, AppError};
use crate::extract::{ApiJson, ApiMultipart};
use crate::forms::FormData;
use crate::media::MediaKind;
use crate::routes::AppState;

const MIN_PASSWORD_LEN: usize = 8;

fn email_regex() -> &'static Regex {
    static EMAIL: OnceLock<Regex> = OnceLock::new();
    EMAIL.get_or_init(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("email pattern compiles"))
}

fn username_regex() -> &'static Regex {
    static USERNAME: OnceLock<Regex> = OnceLock::new();
    USERNAME.get_or_init(|| Regex::new(r"^[\w.@+-]{1,150}$").expect("username pattern compiles"))
}

fn issue_token(state: &AppState, user: &User) -> Result<String, AppError> {
    create_access_token(
        user.id,
        &user.email,
        &state.config.jwt_secret,
        state.config.jwt_expires_in,
    )
}

/// POST /api/v1/auth/signup
pub async fn signup(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<SignupRequest>,
) -> Result<(StatusCode, Json<SignupResponse>), AppError> {
    // Validate input
    if req.email.trim().is_empty()
        || req.username.trim().is_empty()
        || req.password.is_empty()
        || req.first_name.trim().is_empty()
        || req.last_name.trim().is_empty()
    {
        return Err(AppError::InvalidOperation("All fields are required".to_string()));
    }

    let email = req.email.trim().to_lowercase();
    if !email_regex().is_match(&email) {
        return Err(AppError::InvalidOperation("Enter a valid email address".to_string()));
    }

    let username = req.username.trim();
    if !username_regex().is_match(username) {
        return Err(AppError::InvalidOperation(
            "Username may only contain letters, digits and @/./+/-/_".to_string(),
        ));
    }

    if req.password.len() < MIN_PASSWORD_LEN {
        return Err(AppError::InvalidOperation(format!(
            "Password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }

    // Check uniqueness
    let existing: Option<(Uuid,)> = sqlx::query_as("SELECT id FROM users WHERE email = ?")
        .bind(&email)
        .fetch_optional(&state.db)
        .await?;
    if existing.is_some() {
        return Err(AppError::Conflict("Email already registered".to_string()));
    }

    let existing: Option<(Uuid,)> = sqlx::query_as("SELECT id FROM users WHERE username = ?")
        .bind(username)
        .fetch_optional(&state.db)
        .await?;
    if existing.is_some() {
        return Err(AppError::Conflict("Username already taken".to_string()));
    }

    // Hash password and create user
    let password_hash = hash_password(&req.password)?;
    let phone_number = req
        .phone_number
        .map(|p| p.trim().to_string())
        .filter(|p| !p.is_empty());
    let user = User {
        id: Uuid::new_v4(),
        username: username.to_string(),
        email,
        first_name: req.first_name.trim().to_string(),
        last_name: req.last_name.trim().to_string(),
        phone_number,
        profile_image: None,
    };
    let now = Utc::now();

    sqlx::query(
        r#"
        INSERT INTO users (id, email, username, password_hash, first_name, last_name,
                           phone_number, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(user.id)
    .bind(&user.email)
    .bind(&user.username)
    .bind(&password_hash)
    .bind(&user.first_name)
    .bind(&user.last_name)
    .bind(&user.phone_number)
    .bind(now)
    .bind(now)
    .execute(&state.db)
    .await
    .map_err(|e| {
        if is_unique_violation(&e) {
            AppError::Conflict("Email or username already registered".to_string())
        } else {
            AppError::Database(e)
        }
    })?;

    tracing::info!(user_id = %user.id, "User signed up");

    let token = issue_token(&state, &user)?;

    Ok((
        StatusCode::CREATED,
        Json(SignupResponse {
            message: "User created successfully".to_string(),
            token,
            user,
        }),
    ))
}

/// POST /api/v1/auth/login
pub async fn login(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<LoginRequest>,
) -> Result<Json<LoginResponse>, AppError> {
    if req.email.trim().is_empty() || req.password.is_empty() {
        return Err(AppError::InvalidOperation(
            "Please provide both email and password".to_string(),
        ));
    }

    // Find user by email
    let row: Option<(Uuid, String)> =
        sqlx::query_as("SELECT id, password_hash FROM users WHERE email = ?")
            .bind(req.email.trim().to_lowercase())
            .fetch_optional(&state.db)
            .await?;

    let (user_id, password_hash) = row.ok_or(AppError::Unauthorized)?;

    // Verify password
    if !verify_password(&req.password, &password_hash)? {
        tracing::debug!(%user_id, "Login with wrong password");
        return Err(AppError::Unauthorized);
    }

    // Update last login
    sqlx::query("UPDATE users SET last_login_at = ? WHERE id = ?")
        .bind(Utc::now())
        .bind(user_id)
        .execute(&state.db)
        .await?;

    let user = require_user(&state.db, &state.media, user_id).await?;

    let profile: Option<(Uuid,)> = sqlx::query_as("SELECT id FROM profiles WHERE user_id = ?")
        .bind(user_id)
        .fetch_optional(&state.db)
        .await?;

    let token = issue_token(&state, &user)?;

    Ok(Json(LoginResponse {
        token,
        user,
        has_profile: profile.is_some(),
    }))
}

/// GET /api/v1/auth/me
pub async fn me(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<User>, AppError> {
    let user = require_user(&state.db, &state.media, user.id).await?;
    Ok(Json(user))
}

/// POST /api/v1/auth/change-password
pub async fn change_password(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    ApiJson(req): ApiJson<ChangePasswordRequest>,
) -> Result<Json<MessageResponse>, AppError> {
    if req.old_password.is_empty() || req.new_password.is_empty() {
        return Err(AppError::InvalidOperation(
            "Please provide both old and new password".to_string(),
        ));
    }

    let (password_hash,): (String,) =
        sqlx::query_as("SELECT password_hash FROM users WHERE id = ?")
            .bind(user.id)
            .fetch_optional(&state.db)
            .await?
            .ok_or_else(|| AppError::not_found("User"))?;

    if !verify_password(&req.old_password, &password_hash)? {
        return Err(AppError::InvalidOperation(
            "Current password is incorrect".to_string(),
        ));
    }

    if req.new_password.len() < MIN_PASSWORD_LEN {
        return Err(AppError::InvalidOperation(format!(
            "Password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }

    sqlx::query("UPDATE users SET password_hash = ?, updated_at = ? WHERE id = ?")
        .bind(hash_password(&req.new_password)?)
        .bind(Utc::now())
        .bind(user.id)
        .execute(&state.db)
        .await?;

    tracing::info!(user_id = %user.id, "Password changed");

    Ok(Json(MessageResponse {
        message: "Password updated successfully".to_string(),
    }))
}

/// POST /api/v1/auth/update-profile
pub async fn update_profile_image(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    ApiMultipart(multipart): ApiMultipart,
) -> Result<Json<UserUpdateResponse>, AppError> {
    let form = FormData::read(multipart).await?;

    let file = form
        .first_file("profile_image")
        .filter(|f| !f.is_empty())
        .ok_or_else(|| AppError::InvalidOperation("Please provide an image".to_string()))?;

    if let Some(content_type) = &file.content_type {
        if !content_type.starts_with("image/") {
            return Err(AppError::PayloadInvalid("File must be an image".to_string()));
        }
    }

    let previous = find_user(&state.db, user.id)
        .await?
        .ok_or_else(|| AppError::not_found("User"))?
        .profile_image;

    let path = state
        .media
        .save(MediaKind::ProfileImage, file.file_name.as_deref(), &file.bytes)
        .await?;

    let updated = sqlx::query("UPDATE users SET profile_image = ?, updated_at = ? WHERE id = ?")
        .bind(&path)
        .bind(Utc::now())
        .bind(user.id)
        .execute(&state.db)
        .await;

    if let Err(e) = updated {
        state.media.remove(&path).await;
        return Err(e.into());
    }

    if let Some(previous) = previous {
        state.media.remove(&previous).await;
    }

    tracing::info!(user_id = %user.id, path = %path, "Profile image updated");

    let user = require_user(&state.db, &state.media, user.id).await?;

    Ok(Json(UserUpdateResponse {
        message: "Profile image updated successfully".to_string(),
        user,
    }))
}

/// DELETE /api/v1/auth/account
///
/// Removes the account and everything it owns in one transaction, children
/// before parents. Uploaded files are deleted once the rows are gone.
pub async fn delete_account(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<MessageResponse>, AppError> {
    let mut tx = state.db.begin().await?;

    let mut files: Vec<String> = Vec::new();

    let profile_image: Option<(Option<String>,)> =
        sqlx::query_as("SELECT profile_image FROM users WHERE id = ?")
            .bind(user.id)
            .fetch_optional(&mut *tx)
            .await?;
    files.extend(profile_image.and_then(|(p,)| p));

    let post_files: Vec<(String,)> = sqlx::query_as(
        "SELECT m.path FROM post_media m JOIN posts p ON p.id = m.post_id WHERE p.user_id = ?",
    )
    .bind(user.id)
    .fetch_all(&mut *tx)
    .await?;
    files.extend(post_files.into_iter().map(|(p,)| p));

    let ringtone_files: Vec<(String,)> =
        sqlx::query_as("SELECT audio_file FROM ringtones WHERE user_id = ?")
            .bind(user.id)
            .fetch_all(&mut *tx)
            .await?;
    files.extend(ringtone_files.into_iter().map(|(p,)| p));

    sqlx::query("DELETE FROM post_media WHERE post_id IN (SELECT id FROM posts WHERE user_id = ?)")
        .bind(user.id)
        .execute(&mut *tx)
        .await?;

    for statement in [
        "DELETE FROM posts WHERE user_id = ?1",
        "DELETE FROM profiles WHERE user_id = ?1",
        "DELETE FROM messages WHERE sender_id = ?1 OR receiver_id = ?1",
        "DELETE FROM connections WHERE from_user_id = ?1 OR to_user_id = ?1",
        "DELETE FROM ringtones WHERE user_id = ?1",
        "DELETE FROM users WHERE id = ?1",
    ] {
        sqlx::query(statement)
            .bind(user.id)
            .execute(&mut *tx)
            .await?;
    }

    tx.commit().await?;

    for file in &files {
        state.media.remove(file).await;
    }

    tracing::info!(user_id = %user.id, files = files.len(), "Account deleted");

    Ok(Json(MessageResponse {
        message: "Account deleted successfully".to_string(),
    }))
}
