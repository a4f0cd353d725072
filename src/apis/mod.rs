pub mod afad;
pub mod fallback;
pub mod kandilli;

pub use afad::AfadAdapter;
pub use fallback::fallback_records;
pub use kandilli::KandilliAdapter;

use crate::error::{QuakeError, Result};
use crate::metrics::SourcesMetrics;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Build the HTTP client shared by one adapter. The timeout bounds the whole
/// request, body included.
pub(crate) fn build_client(timeout: Duration) -> Result<reqwest::Client> {
    let client = reqwest::Client::builder()
        .timeout(timeout)
        .user_agent(concat!("quake_scraper/", env!("CARGO_PKG_VERSION")))
        .build()?;
    Ok(client)
}

/// Send a prepared request and return the body text.
///
/// Transport errors, timeouts and non-success statuses all become
/// `SourceUnavailable` so the pipeline can move on to the next source.
pub(crate) async fn fetch_text(
    source: &'static str,
    request: reqwest::RequestBuilder,
) -> Result<String> {
    let started = Instant::now();

    let response = request.send().await.map_err(|e| {
        let kind = if e.is_timeout() { "timeout" } else { "transport" };
        warn!(source = source, error = %e, "source request failed");
        SourcesMetrics::record_request_error(source, kind);
        QuakeError::unavailable(source, format!("request failed: {}", e))
    })?;

    let status = response.status();
    if !status.is_success() {
        warn!(source = source, status = status.as_u16(), "source returned error status");
        SourcesMetrics::record_request_error(source, "status");
        return Err(QuakeError::unavailable(
            source,
            format!("HTTP status {}", status.as_u16()),
        ));
    }

    let body = response.text().await.map_err(|e| {
        let kind = if e.is_timeout() { "timeout" } else { "body" };
        warn!(source = source, error = %e, "failed to read source body");
        SourcesMetrics::record_request_error(source, kind);
        QuakeError::unavailable(source, format!("reading body failed: {}", e))
    })?;

    let elapsed = started.elapsed().as_secs_f64();
    debug!(source = source, bytes = body.len(), elapsed, "source responded");
    SourcesMetrics::record_request_success(source, elapsed, body.len());
    Ok(body)
}

/// Lenient float parse: invalid or non-finite input becomes 0.
pub(crate) fn parse_number(raw: &str) -> f64 {
    raw.trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .unwrap_or(0.0)
}
