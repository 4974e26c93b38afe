use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use opentelemetry::{KeyValue, global, trace::TraceError};
use opentelemetry_otlp::WithExportConfig;
use opentelemetry_sdk::{
    Resource,
    propagation::TraceContextPropagator,
    runtime,
    trace::{RandomIdGenerator, Sampler, Tracer},
};
use opentelemetry_semantic_conventions::resource::{SERVICE_NAME, SERVICE_VERSION};
use std::time::Instant;
use tracing::{Level, error, info, warn};
use tracing_subscriber::{EnvFilter, Layer, Registry, layer::SubscriberExt, util::SubscriberInitExt};

use academy_auth::verify_token;
use academy_config::LogFormat;

use crate::state::AppState;
use crate::utils::request::{bearer_token, client_ip};

const LOG_DIR: &str = "storage/logs";

/// `GET /api/courses | Status: 200 | Duration: 0.01s`
pub fn format_request_line(method: &str, path: &str, status: u16, secs: f64) -> String {
    format!(
        "{} {} | Status: {} | Duration: {:.2}s",
        method, path, status, secs
    )
}

pub fn level_for_status(status: u16) -> Level {
    match status {
        500..=599 => Level::ERROR,
        400..=499 => Level::WARN,
        _ => Level::INFO,
    }
}

/// Logs one line per request with the caller's identity and client address.
pub async fn logging_middleware(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Response {
    let start = Instant::now();
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    let request_id = uuid::Uuid::new_v4().to_string();

    let ip = client_ip(req.headers(), req.extensions())
        .map(|ip| ip.to_string())
        .unwrap_or_else(|| "unknown".to_string());
    let user_id = bearer_token(req.headers())
        .and_then(|token| verify_token(token, &state.jwt_config).ok())
        .map(|claims| claims.sub)
        .unwrap_or_else(|| "Anonymous".to_string());
    let user_display = if user_id == "Anonymous" {
        ip.clone()
    } else {
        user_id.clone()
    };

    let response = next.run(req).await;
    let status = response.status().as_u16();
    let line = format_request_line(
        method.as_str(),
        &path,
        status,
        start.elapsed().as_secs_f64(),
    );

    match level_for_status(status) {
        Level::ERROR => error!(
            request_id = %request_id,
            tenant_id = "N/A",
            user_id = %user_id,
            user_display = %user_display,
            ip = %ip,
            "{}", line
        ),
        Level::WARN => warn!(
            request_id = %request_id,
            tenant_id = "N/A",
            user_id = %user_id,
            user_display = %user_display,
            ip = %ip,
            "{}", line
        ),
        _ => info!(
            request_id = %request_id,
            tenant_id = "N/A",
            user_id = %user_id,
            user_display = %user_display,
            ip = %ip,
            "{}", line
        ),
    }

    response
}

fn init_tracer(endpoint: String) -> Result<Tracer, TraceError> {
    global::set_text_map_propagator(TraceContextPropagator::new());

    let resource = Resource::new(vec![
        KeyValue::new(SERVICE_NAME, env!("CARGO_PKG_NAME")),
        KeyValue::new(SERVICE_VERSION, env!("CARGO_PKG_VERSION")),
        KeyValue::new(
            "environment",
            std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string()),
        ),
    ]);

    opentelemetry_otlp::new_pipeline()
        .tracing()
        .with_exporter(
            opentelemetry_otlp::new_exporter()
                .tonic()
                .with_endpoint(endpoint),
        )
        .with_trace_config(
            opentelemetry_sdk::trace::Config::default()
                .with_sampler(Sampler::AlwaysOn)
                .with_id_generator(RandomIdGenerator::default())
                .with_resource(resource),
        )
        .install_batch(runtime::Tokio)
}

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

/// Console output (compact or JSON), daily error and JSON files under
/// `storage/logs`, and an OTLP exporter when `OTEL_EXPORTER_OTLP_ENDPOINT`
/// is set.
pub fn init_tracing(log_format: LogFormat) {
    use tracing_appender::rolling::{RollingFileAppender, Rotation};
    use tracing_subscriber::fmt;

    let console_filter = || {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!(
                "{}=info,academy_cache=info,tower_http=warn,sqlx=warn",
                env!("CARGO_CRATE_NAME")
            ))
        })
    };

    let mut layers: Vec<BoxedLayer> = Vec::new();

    layers.push(match log_format {
        LogFormat::Json => fmt::layer()
            .json()
            .with_current_span(true)
            .with_filter(console_filter())
            .boxed(),
        LogFormat::Text => fmt::layer()
            .with_target(false)
            .with_file(true)
            .with_line_number(true)
            .compact()
            .with_filter(console_filter())
            .boxed(),
    });

    match std::fs::create_dir_all(LOG_DIR) {
        Ok(()) => {
            let error_appender = RollingFileAppender::new(Rotation::DAILY, LOG_DIR, "academy.log");
            layers.push(
                fmt::layer()
                    .with_writer(error_appender)
                    .with_target(false)
                    .with_file(true)
                    .with_line_number(true)
                    .with_ansi(false)
                    .with_filter(EnvFilter::new("error"))
                    .boxed(),
            );

            let json_appender = RollingFileAppender::new(Rotation::DAILY, LOG_DIR, "academy.json");
            layers.push(
                fmt::layer()
                    .json()
                    .with_writer(json_appender)
                    .with_current_span(true)
                    .with_span_list(true)
                    .with_filter(EnvFilter::new("info"))
                    .boxed(),
            );
        }
        Err(e) => eprintln!("Failed to create {}: {}. File logging disabled.", LOG_DIR, e),
    }

    let otel_status = match std::env::var("OTEL_EXPORTER_OTLP_ENDPOINT") {
        Ok(endpoint) => match init_tracer(endpoint) {
            Ok(tracer) => {
                layers.push(tracing_opentelemetry::layer().with_tracer(tracer).boxed());
                Ok(())
            }
            Err(e) => Err(e.to_string()),
        },
        Err(_) => Err("OTEL_EXPORTER_OTLP_ENDPOINT not set".to_string()),
    };

    tracing_subscriber::registry().with(layers).init();

    match otel_status {
        Ok(()) => info!("Tracing initialized with OpenTelemetry export"),
        Err(reason) => info!(reason = %reason, "Tracing initialized without OpenTelemetry"),
    }
}

pub async fn shutdown_tracer() {
    global::shutdown_tracer_provider();
}
