use axum::{
    Router,
    routing::{get, post},
};

use crate::modules::bookmarks::controller::get_student_bookmarks;
use crate::state::AppState;

use super::controller::{
    create_enrollment, delete_enrollment, drop_enrollment, get_enrollment, get_enrollments,
    get_student_enrollments, my_enrollments, update_enrollment,
};

pub fn init_enrollments_router() -> Router<AppState> {
    Router::new()
        .route("/", get(get_enrollments).post(create_enrollment))
        .route("/my_enrollments", get(my_enrollments))
        .route(
            "/{id}",
            get(get_enrollment)
                .put(update_enrollment)
                .patch(update_enrollment)
                .delete(delete_enrollment),
        )
        .route("/{id}/drop", post(drop_enrollment))
}

/// `/students/{id}/...` views scoped to one student.
pub fn init_students_router() -> Router<AppState> {
    Router::new()
        .route("/{id}/enrollments", get(get_student_enrollments))
        .route("/{id}/bookmarks", get(get_student_bookmarks))
}
