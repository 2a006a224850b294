use std::sync::Arc;

use anyhow::Context;
use axum::Router;
use axum::http::StatusCode;
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::services::ServeDir;
use tower_http::timeout::TimeoutLayer;

use crate::api::{self, AppState};
use crate::config::LifeCostConfig;
use crate::config::expand_path;

pub fn app(config: &LifeCostConfig, state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let mut app = Router::new().nest("/api", api::router(state));
    if let Some(dir) = &config.server.static_dir {
        app = app.fallback_service(ServeDir::new(expand_path(dir)));
    }

    let timeout =
        TimeoutLayer::with_status_code(StatusCode::REQUEST_TIMEOUT, config.server_timeout());
    app.layer(timeout)
        .layer(RequestBodyLimitLayer::new(config.server.max_body_bytes))
        .layer(cors)
}

pub async fn run(config: &LifeCostConfig, state: Arc<AppState>) -> anyhow::Result<()> {
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    tracing::info!("Web server running at http://{addr}");

    axum::serve(listener, app(config, state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Web server failed")
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %err, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutting down");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::CityStore;
    use axum::body::Body;
    use axum::http::Request;
    use tempfile::TempDir;
    use tower::ServiceExt;

    #[tokio::test]
    async fn test_static_fallback_and_body_limit() {
        let dir = TempDir::new().unwrap();
        let site = dir.path().join("site");
        std::fs::create_dir(&site).unwrap();
        std::fs::write(site.join("index.html"), "<h1>globe</h1>").unwrap();

        let mut config = LifeCostConfig::default();
        config.apply_defaults();
        config.server.static_dir = Some(site.to_string_lossy().into_owned());
        config.server.max_body_bytes = 16;

        let store = CityStore::open(dir.path().join("store")).unwrap();
        let app = app(&config, Arc::new(AppState::new(store, None)));

        let response = app
            .clone()
            .oneshot(Request::builder().uri("/index.html").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/selection")
                    .header("content-type", "application/json")
                    .header("content-length", "76")
                    .body(Body::from(format!("{{\"city\": \"{}\"}}", "x".repeat(64))))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    }
}
