//! Adapters and the HTTP endpoint exercised against a local axum server.

use axum::extract::Query;
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse};
use axum::routing::get;
use axum::{Json, Router};
use quake_scraper::apis::{AfadAdapter, KandilliAdapter};
use quake_scraper::config::PipelineConfig;
use quake_scraper::error::QuakeError;
use quake_scraper::pipeline::Pipeline;
use quake_scraper::server::create_server;
use quake_scraper::types::{EarthquakeResponse, SourceAdapter};
use serde_json::json;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

async fn spawn(app: Router) -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::Server::from_tcp(listener)
            .unwrap()
            .serve(app.into_make_service())
            .await
            .unwrap();
    });
    format!("http://{}", addr)
}

#[allow(clippy::too_many_arguments)]
fn listing_line(date: &str, time: &str, lat: &str, lon: &str, depth: &str, md: &str, ml: &str, mw: &str, loc: &str) -> String {
    format!("{date} {time}  {lat:<7}   {lon:<7}{depth:>11}{md:>9}{ml:>5}{mw:>5}   {loc:<50}İlksel")
}

fn kandilli_page() -> String {
    let lines = [
        listing_line("2023.11.05", "14:02:11", "39.2041", "28.1712", "5.1", "-.-", "3.1", "-.-", "SINDIRGI (BALIKESIR)"),
        listing_line("2023.11.05", "11:45:30", "36.8512", "28.2744", "11.0", "3.0", "-.-", "-.-", "MARMARIS ACIKLARI (MUGLA)"),
        listing_line("2023.11.05", "09:10:00", "38.1000", "38.2000", "9.0", "-.-", "8.2", "-.-", "PUTURGE (MALATYA)"),
    ];
    format!(
        "<html><head><title>Son Depremler</title></head><body><pre>\n\
RECENT EARTHQUAKES IN TURKEY\n\
KOERI REGIONAL EARTHQUAKE-TSUNAMI MONITORING CENTER\n\
(QUICK EPICENTER DETERMINATIONS)\n\
\n\
Date       Time      Latit(N)  Long(E)   Depth(km)     MAG.   Region\n\
                                                   MD   ML   Mw\n\
---------- --------  --------  -------   ----------    ------------    --------------\n\
{}\n</pre></body></html>",
        lines.join("\n")
    )
}

fn config_for(base: &str, primary: &str, secondary: &str) -> PipelineConfig {
    PipelineConfig {
        primary_url: format!("{}{}", base, primary),
        secondary_url: format!("{}{}", base, secondary),
        timeout_ms: 2_000,
        ..PipelineConfig::default()
    }
}

async fn afad_events(Query(params): Query<HashMap<String, String>>) -> impl IntoResponse {
    if params.get("orderby").map(String::as_str) != Some("timedesc") {
        return (StatusCode::BAD_REQUEST, Json(json!({"error": "missing orderby"})));
    }
    (
        StatusCode::OK,
        Json(json!([
            {
                "eventID": "611001",
                "date": "2023-11-05T14:02:11",
                "latitude": "39.2041",
                "longitude": "28.1712",
                "depth": "5.1",
                "magnitude": "3.1",
                "location": "Sındırgı (Balıkesir)",
                "province": "Balıkesir"
            },
            {
                "eventID": "611002",
                "date": "2023-11-05T11:45:30",
                "latitude": "36.8512",
                "longitude": "28.2744",
                "depth": "11.0",
                "magnitude": "3.0",
                "location": "Marmaris Açıkları (Muğla)"
            }
        ])),
    )
}

fn upstream() -> Router {
    Router::new()
        .route("/afad", get(afad_events))
        .route("/afad-object", get(|| async { Json(json!({"error": "maintenance"})) }))
        .route("/afad-500", get(|| async { StatusCode::INTERNAL_SERVER_ERROR }))
        .route(
            "/afad-slow",
            get(|| async {
                tokio::time::sleep(Duration::from_secs(3)).await;
                Json(json!([]))
            }),
        )
        .route("/kandilli", get(|| async { Html(kandilli_page()) }))
        .route(
            "/kandilli-empty",
            get(|| async { Html("<html><body>bakim</body></html>") }),
        )
}

#[tokio::test]
async fn test_afad_adapter_fetches_and_maps() {
    let base = spawn(upstream()).await;
    let adapter = AfadAdapter::new(config_for(&base, "/afad", "/kandilli")).unwrap();

    let records = adapter.fetch().await.unwrap();
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].id, "afad-611001");
    assert_eq!(records[0].location, "Sındırgı");
    assert_eq!(records[1].province.as_deref(), Some("Muğla"));
}

#[tokio::test]
async fn test_afad_non_array_body_is_unavailable() {
    let base = spawn(upstream()).await;
    let adapter = AfadAdapter::new(config_for(&base, "/afad-object", "/kandilli")).unwrap();

    let err = adapter.fetch().await.unwrap_err();
    assert!(matches!(err, QuakeError::SourceUnavailable { source_name: "afad", .. }));
}

#[tokio::test]
async fn test_afad_error_status_and_timeout_are_unavailable() {
    let base = spawn(upstream()).await;

    let adapter = AfadAdapter::new(config_for(&base, "/afad-500", "/kandilli")).unwrap();
    assert!(matches!(
        adapter.fetch().await,
        Err(QuakeError::SourceUnavailable { .. })
    ));

    let mut config = config_for(&base, "/afad-slow", "/kandilli");
    config.timeout_ms = 200;
    let adapter = AfadAdapter::new(config).unwrap();
    assert!(matches!(
        adapter.fetch().await,
        Err(QuakeError::SourceUnavailable { .. })
    ));
}

#[tokio::test]
async fn test_kandilli_adapter_parses_listing() {
    let base = spawn(upstream()).await;
    let adapter = KandilliAdapter::new(config_for(&base, "/afad", "/kandilli")).unwrap();

    let records = adapter.fetch().await.unwrap();
    // The M8.2 line is rejected outright.
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].magnitude, 3.1);
    assert_eq!(records[1].magnitude, 3.0);
    assert_eq!(records[1].province.as_deref(), Some("MUGLA"));
}

#[tokio::test]
async fn test_kandilli_page_without_listing_is_unavailable() {
    let base = spawn(upstream()).await;
    let adapter = KandilliAdapter::new(config_for(&base, "/afad", "/kandilli-empty")).unwrap();

    let err = adapter.fetch().await.unwrap_err();
    assert!(matches!(err, QuakeError::SourceUnavailable { source_name: "kandilli", .. }));
}

#[tokio::test]
async fn test_pipeline_falls_through_on_non_array_primary() {
    let base = spawn(upstream()).await;
    let pipeline = Pipeline::new(config_for(&base, "/afad-object", "/kandilli")).unwrap();

    let response = pipeline.get_latest_earthquakes().await;
    assert!(response.status);
    assert!(response.message.contains("kandilli"));
    assert_eq!(response.count, 2);
    assert!(response.result.iter().all(|r| r.id.starts_with("kandilli-")));
}

#[tokio::test]
async fn test_earthquakes_endpoint() {
    let base = spawn(upstream()).await;
    let pipeline = Pipeline::new(config_for(&base, "/afad", "/kandilli")).unwrap();
    let api = spawn(create_server(Arc::new(pipeline))).await;

    let response = reqwest::get(format!("{}/api/earthquakes?province=mugla", api))
        .await
        .unwrap();
    assert_eq!(response.status(), reqwest::StatusCode::OK);
    assert_eq!(
        response.headers()["cache-control"],
        "no-cache, no-store, must-revalidate"
    );

    let body: EarthquakeResponse = response.json().await.unwrap();
    assert!(body.status);
    assert_eq!(body.count, 1);
    assert_eq!(body.result[0].id, "afad-611002");

    let raw: serde_json::Value = reqwest::get(format!("{}/api/earthquakes?limit=1", api))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(raw["count"], 1);
    assert_eq!(raw["result"][0]["date"], "05.11.23");
    assert_eq!(raw["result"][0]["time"], "14:02:11");
    assert!(raw["result"][0].get("source").is_none());
}

#[tokio::test]
async fn test_health_lists_sources() {
    let pipeline = Pipeline::new(PipelineConfig::default()).unwrap();
    let api = spawn(create_server(Arc::new(pipeline))).await;

    let body: serde_json::Value = reqwest::get(format!("{}/health", api))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["sources"], json!(["afad", "kandilli"]));
}
