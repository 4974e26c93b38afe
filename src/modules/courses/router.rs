use axum::{Router, routing::get};

use crate::modules::enrollments::controller::{create_course_enrollment, get_course_enrollments};
use crate::modules::lessons::controller::{create_course_lesson, get_course_lessons};
use crate::modules::reviews::controller::{create_course_review, get_course_reviews};
use crate::state::AppState;

use super::controller::{create_course, delete_course, get_course, get_courses, update_course};

pub fn init_courses_router() -> Router<AppState> {
    Router::new()
        .route("/", get(get_courses).post(create_course))
        .route(
            "/{id}",
            get(get_course)
                .put(update_course)
                .patch(update_course)
                .delete(delete_course),
        )
        .route(
            "/{id}/lessons",
            get(get_course_lessons).post(create_course_lesson),
        )
        .route(
            "/{id}/enrollments",
            get(get_course_enrollments).post(create_course_enrollment),
        )
        .route(
            "/{id}/reviews",
            get(get_course_reviews).post(create_course_review),
        )
}
