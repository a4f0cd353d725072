//! Sources Phase Metrics
//!
//! Health and latency of the upstream earthquake feeds.

use crate::metrics::{phase_metric, MetricDoc, MetricType, PhaseMetrics};

/// Metrics collection for the Sources phase
pub struct SourcesMetrics;

impl SourcesMetrics {
    /// Record a successful source request
    pub fn record_request_success(source: &'static str, duration_secs: f64, payload_bytes: usize) {
        ::metrics::counter!(phase_metric!(counter, "sources", "requests_success"), "source" => source)
            .increment(1);
        ::metrics::histogram!(
            phase_metric!(histogram, "sources", "request_duration_seconds"),
            "source" => source
        )
        .record(duration_secs);
        ::metrics::histogram!(phase_metric!(histogram, "sources", "payload_bytes"), "source" => source)
            .record(payload_bytes as f64);
    }

    /// Record a failed source request
    pub fn record_request_error(source: &'static str, error_type: &'static str) {
        ::metrics::counter!(
            phase_metric!(counter, "sources", "requests_error"),
            "source" => source,
            "error_type" => error_type
        )
        .increment(1);
    }
}

impl PhaseMetrics for SourcesMetrics {
    fn register_metrics() {
        use metrics::{counter, histogram};

        // Pre-register so series show up on /metrics before first use
        let _ = counter!(phase_metric!(counter, "sources", "requests_success"));
        let _ = counter!(phase_metric!(counter, "sources", "requests_error"));
        let _ = histogram!(phase_metric!(
            histogram,
            "sources",
            "request_duration_seconds"
        ));
        let _ = histogram!(phase_metric!(histogram, "sources", "payload_bytes"));
    }

    fn phase_name() -> &'static str {
        "sources"
    }

    fn metrics_documentation() -> Vec<MetricDoc> {
        vec![
            MetricDoc {
                name: phase_metric!(counter, "sources", "requests_success"),
                metric_type: MetricType::Counter,
                help: "Total number of successful requests to earthquake sources",
            },
            MetricDoc {
                name: phase_metric!(counter, "sources", "requests_error"),
                metric_type: MetricType::Counter,
                help: "Total number of failed requests to earthquake sources",
            },
            MetricDoc {
                name: phase_metric!(histogram, "sources", "request_duration_seconds"),
                metric_type: MetricType::Histogram,
                help: "Duration of requests to earthquake sources in seconds",
            },
            MetricDoc {
                name: phase_metric!(histogram, "sources", "payload_bytes"),
                metric_type: MetricType::Histogram,
                help: "Size of payloads received from earthquake sources in bytes",
            },
        ]
    }
}
