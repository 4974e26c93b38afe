use axum::{Router, routing::get};

use crate::modules::quiz_attempts::controller::{create_quiz_attempt, get_quiz_attempts};
use crate::state::AppState;

use super::controller::{create_quiz, delete_quiz, get_quiz, get_quizzes, update_quiz};

pub fn init_quizzes_router() -> Router<AppState> {
    Router::new()
        .route("/", get(get_quizzes).post(create_quiz))
        .route(
            "/{id}",
            get(get_quiz)
                .put(update_quiz)
                .patch(update_quiz)
                .delete(delete_quiz),
        )
        .route(
            "/{id}/attempts",
            get(get_quiz_attempts).post(create_quiz_attempt),
        )
}
