use axum::{
    Router,
    routing::{get, post},
};

use crate::state::AppState;

use super::controller::{
    complete_attempt, create_attempt, delete_attempt, get_attempt, get_attempts,
};

pub fn init_quiz_attempts_router() -> Router<AppState> {
    Router::new()
        .route("/", get(get_attempts).post(create_attempt))
        .route("/{id}", get(get_attempt).delete(delete_attempt))
        .route("/{id}/complete", post(complete_attempt))
}
