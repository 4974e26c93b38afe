use axum::{Router, routing::get};

use crate::state::AppState;

use super::controller::{get_certificate, get_certificates, issue_certificate};

pub fn init_certificates_router() -> Router<AppState> {
    Router::new()
        .route("/", get(get_certificates).post(issue_certificate))
        .route("/{id}", get(get_certificate))
}
