//! Per-IP rate limiting backed by a `governor` keyed limiter.

use std::net::{IpAddr, Ipv4Addr};
use std::sync::Arc;

use anyhow::anyhow;
use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
};

use academy_config::rate_limit::KeyedLimiter;
use academy_core::AppError;

use crate::security_event;
use crate::utils::request::client_ip;

pub async fn rate_limit_middleware(
    State(limiter): State<Arc<KeyedLimiter>>,
    req: Request,
    next: Next,
) -> Response {
    let ip = client_ip(req.headers(), req.extensions())
        .unwrap_or(IpAddr::V4(Ipv4Addr::UNSPECIFIED));

    if limiter.check_key(&ip).is_err() {
        security_event!("rate_limited", ip = %ip, path = %req.uri().path());
        return AppError::new(StatusCode::TOO_MANY_REQUESTS, anyhow!("Too many requests"))
            .into_response();
    }

    next.run(req).await
}
