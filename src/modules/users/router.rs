use axum::{
    Router,
    routing::{get, post, put},
};

use crate::state::AppState;

use super::controller::{children_courses, get_user, get_users, link_child, update_user};

pub fn init_users_router() -> Router<AppState> {
    Router::new()
        .route("/", get(get_users))
        .route("/link-child", post(link_child))
        .route("/parent/children-courses", get(children_courses))
        .route("/{id}", get(get_user))
        .route("/{id}/update", put(update_user))
}
