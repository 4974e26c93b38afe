use std::net::SocketAddr;

use academy::logging::{init_tracing, shutdown_tracer};
use academy::metrics::{init_metrics, metrics_app};
use academy::modules::notifications::tasks::spawn_cleanup;
use academy::router::init_router;
use academy::state::init_app_state;
use academy_config::AppConfig;
use anyhow::Context;
use dotenvy::dotenv;
use tracing::{error, info};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    init_tracing(AppConfig::from_env().log_format);

    if let Some(handle) = init_metrics() {
        let metrics_port: u16 = std::env::var("METRICS_PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(9090);
        tokio::spawn(async move {
            let addr = SocketAddr::from(([0, 0, 0, 0], metrics_port));
            match tokio::net::TcpListener::bind(addr).await {
                Ok(listener) => {
                    info!(port = metrics_port, "Metrics server listening");
                    if let Err(e) = axum::serve(listener, metrics_app(handle)).await {
                        error!(error = %e, "Metrics server stopped");
                    }
                }
                Err(e) => error!(error = %e, port = metrics_port, "Failed to bind metrics port"),
            }
        });
    }

    let state = init_app_state()
        .await
        .context("failed to initialize application state")?;
    let port = state.app_config.port;

    spawn_cleanup(state.db.clone());

    let app = init_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind port {}", port))?;

    info!("Server running on http://localhost:{}", port);
    info!("Swagger UI available at http://localhost:{}/swagger-ui", port);
    info!("Scalar UI available at http://localhost:{}/scalar", port);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for shutdown signal");
        }
        info!("Shutting down");
    })
    .await?;

    shutdown_tracer().await;
    Ok(())
}
