//! Pipeline Phase Metrics
//!
//! Aggregation outcomes: which source served a run, dedup volume, fallbacks.

use crate::metrics::{phase_metric, MetricDoc, MetricType, PhaseMetrics};

/// Metrics collection for the aggregation pipeline
pub struct PipelineMetrics;

impl PipelineMetrics {
    /// Record a finished pipeline run
    pub fn record_run(origin: &'static str, records: usize, duplicates: usize, duration_secs: f64) {
        ::metrics::counter!(phase_metric!(counter, "pipeline", "runs"), "origin" => origin)
            .increment(1);
        ::metrics::counter!(phase_metric!(counter, "pipeline", "duplicates_removed"))
            .increment(duplicates as u64);
        ::metrics::gauge!(phase_metric!(gauge, "pipeline", "records_returned")).set(records as f64);
        ::metrics::histogram!(phase_metric!(histogram, "pipeline", "duration_seconds"))
            .record(duration_secs);
        ::metrics::gauge!(phase_metric!(gauge, "pipeline", "last_run_timestamp_seconds"))
            .set(chrono::Utc::now().timestamp() as f64);
    }

    /// Record that every live source failed and sample data was served
    pub fn record_fallback() {
        ::metrics::counter!(phase_metric!(counter, "pipeline", "fallbacks")).increment(1);
    }
}

impl PhaseMetrics for PipelineMetrics {
    fn register_metrics() {
        use metrics::{counter, gauge, histogram};

        let _ = counter!(phase_metric!(counter, "pipeline", "runs"));
        let _ = counter!(phase_metric!(counter, "pipeline", "duplicates_removed"));
        let _ = counter!(phase_metric!(counter, "pipeline", "fallbacks"));
        let _ = gauge!(phase_metric!(gauge, "pipeline", "records_returned"));
        let _ = gauge!(phase_metric!(gauge, "pipeline", "last_run_timestamp_seconds"));
        let _ = histogram!(phase_metric!(histogram, "pipeline", "duration_seconds"));
    }

    fn phase_name() -> &'static str {
        "pipeline"
    }

    fn metrics_documentation() -> Vec<MetricDoc> {
        vec![
            MetricDoc {
                name: phase_metric!(counter, "pipeline", "runs"),
                metric_type: MetricType::Counter,
                help: "Total pipeline runs, labeled by the source that served them",
            },
            MetricDoc {
                name: phase_metric!(counter, "pipeline", "duplicates_removed"),
                metric_type: MetricType::Counter,
                help: "Total records dropped by deduplication",
            },
            MetricDoc {
                name: phase_metric!(counter, "pipeline", "fallbacks"),
                metric_type: MetricType::Counter,
                help: "Runs that served the static sample data set",
            },
            MetricDoc {
                name: phase_metric!(gauge, "pipeline", "records_returned"),
                metric_type: MetricType::Gauge,
                help: "Records returned by the most recent run",
            },
            MetricDoc {
                name: phase_metric!(gauge, "pipeline", "last_run_timestamp_seconds"),
                metric_type: MetricType::Gauge,
                help: "Unix timestamp of the most recent run",
            },
            MetricDoc {
                name: phase_metric!(histogram, "pipeline", "duration_seconds"),
                metric_type: MetricType::Histogram,
                help: "Wall-clock duration of a pipeline run in seconds",
            },
        ]
    }
}
