use axum::{Router, routing::get};

use crate::state::AppState;

use super::controller::{create_bookmark, delete_bookmark, get_bookmark, get_bookmarks};

pub fn init_bookmarks_router() -> Router<AppState> {
    Router::new()
        .route("/", get(get_bookmarks).post(create_bookmark))
        .route("/{id}", get(get_bookmark).delete(delete_bookmark))
}
