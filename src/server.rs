use crate::pipeline::Pipeline;
use crate::types::EarthquakeQuery;
use axum::{
    extract::Query,
    http::{header, Method, StatusCode},
    response::{IntoResponse, Json},
    routing::get,
    Extension, Router,
};
use hyper::Server;
use std::net::SocketAddr;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tracing::info;

const NO_CACHE: &str = "no-cache, no-store, must-revalidate";

/// Health check endpoint
async fn health(Extension(pipeline): Extension<Arc<Pipeline>>) -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "service": "quake_scraper",
        "version": env!("CARGO_PKG_VERSION"),
        "sources": pipeline.source_names(),
    }))
}

/// Latest earthquakes, optionally narrowed by province, magnitude and count.
/// Always 200: source failures show up as `status: false` in the body.
async fn earthquakes(
    Extension(pipeline): Extension<Arc<Pipeline>>,
    Query(query): Query<EarthquakeQuery>,
) -> impl IntoResponse {
    let response = pipeline.get_latest_with(&query).await;
    ([(header::CACHE_CONTROL, NO_CACHE)], Json(response))
}

/// Prometheus text exposition
async fn metrics_handler() -> impl IntoResponse {
    match crate::metrics::render() {
        Some(body) => (StatusCode::OK, body),
        None => (
            StatusCode::SERVICE_UNAVAILABLE,
            "metrics recorder not installed".to_string(),
        ),
    }
}

/// Create the HTTP router with all routes
pub fn create_server(pipeline: Arc<Pipeline>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET])
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health))
        .route("/api/earthquakes", get(earthquakes))
        .route("/metrics", get(metrics_handler))
        .layer(Extension(pipeline))
        .layer(ServiceBuilder::new().layer(cors))
}

/// Start the HTTP server on the specified port
pub async fn start_server(pipeline: Arc<Pipeline>, port: u16) -> Result<(), hyper::Error> {
    let app = create_server(pipeline);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    info!("Listening on {}", addr);

    println!("🚀 HTTP server running on http://localhost:{port}");
    println!("💚 Health check: http://localhost:{port}/health");
    println!("🌍 Earthquakes:  http://localhost:{port}/api/earthquakes");
    println!("📈 Metrics:      http://localhost:{port}/metrics");

    Server::bind(&addr).serve(app.into_make_service()).await
}
