//! Blog RS Server
//!
//! HTTP server exposing the post API and health endpoints.

use std::sync::Arc;
use std::time::Duration;

use axum::{http::HeaderName, routing::get, Router};
use tower::ServiceBuilder;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use blog_api::{ApiConfig, AppState};
use blog_core::config::{AppConfig, LogConfig};
use blog_db::{Database, DatabaseConfig};

mod health;

use health::{HealthChecker, HealthConfig};

const DEFAULT_LOG_FILTER: &str = "info,blog_server=debug,blog_api=debug,tower_http=debug";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let loaded = AppConfig::load();
    let config = loaded.as_ref().cloned().unwrap_or_default();

    init_tracing(&config.log);
    if let Err(e) = &loaded {
        tracing::warn!(error = %e, "failed to load configuration, using defaults");
    }

    info!(
        version = env!("CARGO_PKG_VERSION"),
        host = %config.server.host,
        port = config.server.port,
        "starting Blog RS"
    );

    let api_config = ApiConfig::from_settings(&config.api)?;
    let db = connect_database(&config).await;

    let mut health_checker = HealthChecker::new(HealthConfig::default());
    if let Some(ref db) = db {
        health_checker = health_checker.with_database(db.clone());
    }

    let app = build_router(
        AppState::new(api_config, db.clone()),
        Arc::new(health_checker),
        Duration::from_secs(config.server.request_timeout_seconds),
    );

    let addr = config.server_addr();
    info!(%addr, "listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    if let Some(db) = db {
        db.close().await;
    }
    info!("server shutdown complete");
    Ok(())
}

/// Initialize tracing/logging
fn init_tracing(log: &LogConfig) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(log.filter.as_deref().unwrap_or(DEFAULT_LOG_FILTER))
    });

    let registry = tracing_subscriber::registry().with(filter);
    if log.json {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_current_span(false))
            .init();
    } else {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(true)
                    .with_file(true)
                    .with_line_number(true),
            )
            .init();
    }
}

/// Connect and migrate; the server keeps running without a database
async fn connect_database(config: &AppConfig) -> Option<Database> {
    let db = match Database::connect(&DatabaseConfig::from(&config.database)).await {
        Ok(db) => {
            info!("connected to database");
            db
        }
        Err(e) => {
            tracing::warn!(error = %e, "failed to connect to database, running without it");
            return None;
        }
    };

    if config.database.run_migrations {
        if let Err(e) = db.migrate().await {
            tracing::error!(error = %e, "failed to apply migrations");
            return Some(db);
        }
    }

    match db.verify_schema().await {
        Ok(missing) if missing.is_empty() => info!("all declared indexes present"),
        Ok(missing) => tracing::warn!(?missing, "schema is missing declared indexes"),
        Err(e) => tracing::warn!(error = %e, "could not inspect schema"),
    }

    Some(db)
}

/// Build the application router
fn build_router(state: AppState, health: Arc<HealthChecker>, request_timeout: Duration) -> Router {
    let health_routes = Router::new()
        .route("/health", get(health::readiness))
        .route("/health/live", get(health::liveness))
        .route("/health/ready", get(health::readiness))
        .with_state(health);

    Router::new()
        .merge(health_routes)
        .merge(blog_api::router().with_state(state))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(TimeoutLayer::new(request_timeout))
                .layer(CompressionLayer::new())
                .layer(
                    CorsLayer::new()
                        .allow_origin(Any)
                        .allow_methods(Any)
                        .allow_headers(Any)
                        .expose_headers([HeaderName::from_static(blog_api::QUERY_COUNT_HEADER)]),
                ),
        )
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("received Ctrl+C, initiating graceful shutdown");
        }
        _ = terminate => {
            info!("received SIGTERM, initiating graceful shutdown");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    fn test_app() -> Router {
        build_router(
            AppState::without_database(),
            Arc::new(HealthChecker::new(HealthConfig::default())),
            Duration::from_secs(5),
        )
    }

    async fn status_of(uri: &str) -> StatusCode {
        test_app()
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap()
            .status()
    }

    #[tokio::test]
    async fn test_liveness_endpoint() {
        assert_eq!(status_of("/health/live").await, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_readiness_without_database() {
        assert_eq!(status_of("/health/ready").await, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(status_of("/health").await, StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn test_api_routes_are_mounted() {
        assert_eq!(status_of("/api").await, StatusCode::OK);
        assert_eq!(status_of("/api/posts").await, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(status_of("/api/posts/nope").await, StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_default_filter_parses() {
        let _ = EnvFilter::new(DEFAULT_LOG_FILTER);
    }
}
