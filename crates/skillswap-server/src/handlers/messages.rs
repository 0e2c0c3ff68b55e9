use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use skillswap_shared::api::SendMessageRequest;
use skillswap_shared::{Conversation, Message};
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::error::AppError;
use crate::extract::ApiJson;
use crate::routes::AppState;
use crate::services::conversations;

/// GET /api/v1/conversations
pub async fn list_conversations(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<Vec<Conversation>>, AppError> {
    let conversations = conversations::list_conversations(&state, user.id).await?;
    Ok(Json(conversations))
}

/// GET /api/v1/conversation/:user_id
pub async fn get_messages(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(peer_id): Path<Uuid>,
) -> Result<Json<Vec<Message>>, AppError> {
    let messages = conversations::get_messages(&state, user.id, peer_id).await?;
    Ok(Json(messages))
}

/// POST /api/v1/send
pub async fn send_message(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    ApiJson(req): ApiJson<SendMessageRequest>,
) -> Result<(StatusCode, Json<Message>), AppError> {
    let message = conversations::send_message(&state, user.id, req.receiver_id, &req.content).await?;
    Ok((StatusCode::CREATED, Json(message)))
}
