use axum::{
    Router,
    routing::{delete, post},
};

use crate::state::AppState;

use super::controller::{
    check_email_exists, delete_account, forget_password, login, logout, refresh_token, register,
    resend_otp, reset_password, verify_otp,
};

pub fn init_auth_router() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/verify-otp", post(verify_otp))
        .route("/resend-otp", post(resend_otp))
        .route("/login", post(login))
        .route("/forget-password", post(forget_password))
        .route("/reset-password", post(reset_password))
        .route("/check-email-exists", post(check_email_exists))
        .route("/delete-account", delete(delete_account))
        .route("/logout", post(logout))
        .route("/token/refresh", post(refresh_token))
}
