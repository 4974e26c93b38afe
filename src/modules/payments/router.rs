use axum::{
    Router,
    routing::{get, post},
};

use crate::state::AppState;

use super::controller::{
    get_payment, get_payments, initialize_payment, payment_callback, verify_payment,
};
use super::webhook::paystack_webhook;

pub fn init_payments_router() -> Router<AppState> {
    Router::new()
        .route("/", get(get_payments))
        .route("/initialize", post(initialize_payment))
        .route("/verify", post(verify_payment))
        .route("/callback", get(payment_callback))
        .route("/callback/", get(payment_callback))
        .route("/webhook", post(paystack_webhook))
        .route("/webhook/", post(paystack_webhook))
        .route("/{id}", get(get_payment))
}
