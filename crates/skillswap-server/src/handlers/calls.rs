use axum::{
    extract::{
        ws::{rejection::WebSocketUpgradeRejection, Message, WebSocket},
        Path, Query, State, WebSocketUpgrade,
    },
    response::Response,
};
use futures_util::{SinkExt, StreamExt};
use serde::Deserialize;
use uuid::Uuid;

use crate::auth::authenticate_token;
use crate::error::AppError;
use crate::routes::AppState;

#[derive(Debug, Deserialize)]
pub struct CallSocketQuery {
    #[serde(default)]
    pub token: Option<String>,
}

/// GET /ws/call/:user_id?token=...
///
/// Browsers cannot set headers on a WebSocket handshake, so the access token
/// travels in the query string. It must belong to the user named in the path.
pub async fn call_socket(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
    Query(query): Query<CallSocketQuery>,
    ws: Result<WebSocketUpgrade, WebSocketUpgradeRejection>,
) -> Result<Response, AppError> {
    let token = query.token.as_deref().ok_or(AppError::Unauthorized)?;
    let auth_user = authenticate_token(&state, token).await?;

    if auth_user.id != user_id {
        tracing::debug!(%user_id, token_user = %auth_user.id, "Call socket for another user");
        return Err(AppError::Forbidden);
    }

    // Upgrade headers are checked only once the caller is authenticated.
    let ws = ws.map_err(|rejection| AppError::PayloadInvalid(rejection.body_text()))?;

    Ok(ws.on_upgrade(move |socket| run_call_socket(state, user_id, socket)))
}

async fn run_call_socket(state: AppState, user_id: Uuid, socket: WebSocket) {
    let mut registration = state.hub.register(user_id);
    let (mut sender, mut receiver) = socket.split();

    let mut outbound = tokio::spawn(async move {
        while let Some(envelope) = registration.recv().await {
            let text = match serde_json::to_string(&envelope) {
                Ok(text) => text,
                Err(e) => {
                    tracing::warn!(error = %e, "Failed to encode signaling frame");
                    continue;
                }
            };
            if sender.send(Message::Text(text)).await.is_err() {
                break;
            }
        }
    });

    tracing::info!(%user_id, "Call socket connected");

    loop {
        tokio::select! {
            frame = receiver.next() => match frame {
                Some(Ok(Message::Text(text))) => {
                    state.hub.relay_text(user_id, &text);
                }
                Some(Ok(Message::Close(_))) | None => break,
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    tracing::debug!(%user_id, error = %e, "Call socket read failed");
                    break;
                }
            },
            _ = &mut outbound => break,
        }
    }

    // Dropping the task drops the registration and leaves the group.
    outbound.abort();
    tracing::info!(%user_id, "Call socket disconnected");
}
