use axum::{Router, routing::get};

use crate::modules::quizzes::controller::{create_lesson_quiz, get_lesson_quizzes};
use crate::state::AppState;

use super::controller::{create_lesson, delete_lesson, get_lesson, get_lessons, update_lesson};

pub fn init_lessons_router() -> Router<AppState> {
    Router::new()
        .route("/", get(get_lessons).post(create_lesson))
        .route(
            "/{id}",
            get(get_lesson)
                .put(update_lesson)
                .patch(update_lesson)
                .delete(delete_lesson),
        )
        .route(
            "/{id}/quizzes",
            get(get_lesson_quizzes).post(create_lesson_quiz),
        )
}
