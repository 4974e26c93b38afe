use axum::{Router, routing::get};

use crate::state::AppState;

use super::controller::chat_socket;

/// Mounted at the root, outside `/api`.
pub fn init_chat_router() -> Router<AppState> {
    Router::new().route("/ws/chat/{peer_id}", get(chat_socket))
}
