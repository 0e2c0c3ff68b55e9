use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use uuid::Uuid;

use crate::{db::users::user_exists, error::AppError, routes::AppState};

use super::jwt::verify_access_token;

#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: Uuid,
    pub email: String,
}

/// Verify a bearer token and check that its user still exists; tokens of
/// deleted accounts stop working immediately.
pub async fn authenticate_token(state: &AppState, token: &str) -> Result<AuthUser, AppError> {
    let claims = verify_access_token(token, &state.config.jwt_secret)?;

    if !user_exists(&state.db, claims.sub).await? {
        tracing::debug!(user_id = %claims.sub, "Token for unknown user");
        return Err(AppError::Unauthorized);
    }

    Ok(AuthUser {
        id: claims.sub,
        email: claims.email,
    })
}

pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let auth_header = request
        .headers()
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .ok_or(AppError::Unauthorized)?;

    let token = auth_header
        .strip_prefix("Bearer ")
        .ok_or(AppError::Unauthorized)?;

    let auth_user = authenticate_token(&state, token).await?;

    request.extensions_mut().insert(auth_user);

    Ok(next.run(request).await)
}
