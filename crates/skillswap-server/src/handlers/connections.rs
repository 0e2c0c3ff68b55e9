use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use skillswap_shared::api::{
    ConnectionStatusResponse, DisconnectResponse, RespondConnectionRequest,
    RespondConnectionResponse, SendConnectionRequest,
};
use skillswap_shared::{Connection, User};
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::error::AppError;
use crate::extract::ApiJson;
use crate::routes::AppState;
use crate::services::connections;

/// POST /api/v1/connections/send
pub async fn send_request(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    ApiJson(req): ApiJson<SendConnectionRequest>,
) -> Result<(StatusCode, Json<Connection>), AppError> {
    let connection = connections::send_request(&state, user.id, req.to_user_id).await?;
    Ok((StatusCode::CREATED, Json(connection)))
}

/// POST /api/v1/connections/:id/respond
pub async fn respond(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(connection_id): Path<Uuid>,
    ApiJson(req): ApiJson<RespondConnectionRequest>,
) -> Result<Json<RespondConnectionResponse>, AppError> {
    let response = connections::respond(&state, user.id, connection_id, &req.action).await?;
    Ok(Json(response))
}

/// GET /api/v1/connections/status/:user_id
pub async fn get_status(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(other_id): Path<Uuid>,
) -> Result<Json<ConnectionStatusResponse>, AppError> {
    Ok(Json(connections::get_status(&state, user.id, other_id).await?))
}

/// GET /api/v1/connections/pending
pub async fn list_pending(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<Vec<Connection>>, AppError> {
    Ok(Json(connections::list_pending(&state, user.id).await?))
}

/// GET /api/v1/connections/connected
pub async fn list_connected(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<Vec<User>>, AppError> {
    Ok(Json(connections::list_connected(&state, user.id).await?))
}

/// DELETE /api/v1/connections/disconnect/:user_id
pub async fn disconnect(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(other_id): Path<Uuid>,
) -> Result<Json<DisconnectResponse>, AppError> {
    let other = connections::disconnect(&state, user.id, other_id).await?;
    let user_name = other.full_name();

    Ok(Json(DisconnectResponse {
        message: format!("Successfully disconnected from {user_name}"),
        user_name,
    }))
}
