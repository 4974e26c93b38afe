use axum::{
    extract::{
        Path, Query, State,
        ws::{Message as WsMessage, WebSocket, WebSocketUpgrade},
    },
    response::Response,
};
use futures_util::{SinkExt, StreamExt};
use serde::Deserialize;
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, info, instrument, warn};

use academy_core::AppError;
use academy_models::UserId;

use crate::middleware::auth::AuthUser;
use crate::modules::chat::model::{HistoryEntry, IncomingFrame, OutgoingFrame, room_name};
use crate::modules::chat::service::ChatService;
use crate::modules::users::service::UserService;
use crate::state::AppState;

/// Browsers cannot set headers on a WebSocket handshake, so the token rides
/// in the query string.
#[derive(Debug, Default, Deserialize)]
pub struct ChatQuery {
    pub token: Option<String>,
    pub access_token: Option<String>,
}

impl ChatQuery {
    fn token(self) -> Option<String> {
        self.token
            .or(self.access_token)
            .filter(|t| !t.trim().is_empty())
    }
}

/// Authenticates the caller and upgrades to a socket shared with `peer_id`.
#[instrument(skip(state, query, ws))]
pub async fn chat_socket(
    State(state): State<AppState>,
    Path(peer_id): Path<UserId>,
    Query(query): Query<ChatQuery>,
    ws: WebSocketUpgrade,
) -> Result<Response, AppError> {
    let token = query.token().ok_or_else(|| {
        AppError::unauthorized("Authentication credentials were not provided.")
    })?;
    let user_id = AuthUser::from_token(&state, &token).await?.user_id()?;

    UserService::get_user(&state.db, peer_id).await?;

    Ok(ws.on_upgrade(move |socket| run_session(state, socket, user_id, peer_id)))
}

async fn run_session(state: AppState, socket: WebSocket, user_id: UserId, peer_id: UserId) {
    let room = room_name(user_id, peer_id);
    let (mut outgoing, mut incoming) = socket.split();

    match ChatService::history(&state.db, user_id, peer_id).await {
        Ok(messages) => {
            for message in messages {
                let Ok(text) = serde_json::to_string(&HistoryEntry::from(message)) else {
                    continue;
                };
                if outgoing.send(WsMessage::Text(text.into())).await.is_err() {
                    return;
                }
            }
        }
        Err(e) => warn!(room = %room, error = %e.message(), "Failed to load chat history"),
    }

    let (sender, mut receiver) = state.chat_rooms.join(&room);
    info!(room = %room, user_id = %user_id, "Chat socket connected");

    let forward_room = room.clone();
    let mut forward = tokio::spawn(async move {
        loop {
            match receiver.recv().await {
                Ok(frame) => {
                    let Ok(text) = serde_json::to_string(&frame) else {
                        continue;
                    };
                    if outgoing.send(WsMessage::Text(text.into())).await.is_err() {
                        break;
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    warn!(room = %forward_room, skipped, "Chat socket lagged behind its room");
                }
                Err(RecvError::Closed) => break,
            }
        }
    });

    let db = state.db.clone();
    let read_room = room.clone();
    let mut read = tokio::spawn(async move {
        while let Some(Ok(message)) = incoming.next().await {
            let text = match message {
                WsMessage::Text(text) => text,
                WsMessage::Close(_) => break,
                _ => continue,
            };

            let frame = match serde_json::from_str::<IncomingFrame>(text.as_str()) {
                Ok(frame) => frame,
                Err(e) => {
                    warn!(room = %read_room, error = %e, "Ignoring malformed chat frame");
                    continue;
                }
            };

            if let Err(e) = ChatService::save_message(&db, user_id, peer_id, &frame.message).await
            {
                warn!(room = %read_room, error = %e.message(), "Failed to store chat message");
                continue;
            }

            let _ = sender.send(OutgoingFrame {
                message: frame.message,
                sender_id: user_id,
            });
        }
    });

    tokio::select! {
        _ = &mut forward => read.abort(),
        _ = &mut read => forward.abort(),
    }
    let _ = forward.await;
    let _ = read.await;

    state.chat_rooms.leave(&room);
    debug!(room = %room, user_id = %user_id, "Chat socket closed");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_falls_back_to_access_token() {
        let query = ChatQuery {
            token: None,
            access_token: Some("abc".to_string()),
        };
        assert_eq!(query.token().as_deref(), Some("abc"));

        let query = ChatQuery {
            token: Some("first".to_string()),
            access_token: Some("second".to_string()),
        };
        assert_eq!(query.token().as_deref(), Some("first"));

        let query = ChatQuery {
            token: Some("  ".to_string()),
            access_token: None,
        };
        assert_eq!(query.token(), None);
    }
}
