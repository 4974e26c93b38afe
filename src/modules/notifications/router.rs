use axum::{
    Router,
    routing::{get, post},
};

use crate::state::AppState;

use super::controller::{
    bulk_notify, delete_notification, get_notification, get_notifications, get_preferences,
    mark_all_read, mark_read, patch_preferences, unread_count, update_preferences,
};

pub fn init_notifications_router() -> Router<AppState> {
    Router::new()
        .route("/", get(get_notifications))
        .route("/unread_count", get(unread_count))
        .route("/mark_all_read", post(mark_all_read))
        .route("/bulk", post(bulk_notify))
        .route(
            "/{id}",
            get(get_notification).delete(delete_notification),
        )
        .route("/{id}/mark_read", post(mark_read))
}

pub fn init_preferences_router() -> Router<AppState> {
    Router::new().route(
        "/",
        get(get_preferences)
            .put(update_preferences)
            .patch(patch_preferences),
    )
}
