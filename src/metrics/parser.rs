//! Parser Phase Metrics
//!
//! Row-level outcomes while turning source payloads into records.

use crate::metrics::{phase_metric, MetricDoc, MetricType, PhaseMetrics};

/// Metrics collection for the Parser phase
pub struct ParserMetrics;

impl ParserMetrics {
    /// Record a parsed payload and how many records it produced
    pub fn record_parse_success(source: &'static str, records_produced: usize, duration_secs: f64) {
        ::metrics::counter!(phase_metric!(counter, "parser", "records_produced"), "source" => source)
            .increment(records_produced as u64);
        ::metrics::histogram!(phase_metric!(histogram, "parser", "duration_seconds"), "source" => source)
            .record(duration_secs);
    }

    /// Record a discarded row (`reason` is a short static label)
    pub fn record_discarded(source: &'static str, reason: &'static str) {
        ::metrics::counter!(
            phase_metric!(counter, "parser", "records_discarded"),
            "source" => source,
            "reason" => reason
        )
        .increment(1);
    }

    /// Record a magnitude that was clamped to the ceiling
    pub fn record_clamped(source: &'static str) {
        ::metrics::counter!(phase_metric!(counter, "parser", "magnitudes_clamped"), "source" => source)
            .increment(1);
    }
}

impl PhaseMetrics for ParserMetrics {
    fn register_metrics() {
        use metrics::{counter, histogram};

        let _ = counter!(phase_metric!(counter, "parser", "records_produced"));
        let _ = counter!(phase_metric!(counter, "parser", "records_discarded"));
        let _ = counter!(phase_metric!(counter, "parser", "magnitudes_clamped"));
        let _ = histogram!(phase_metric!(histogram, "parser", "duration_seconds"));
    }

    fn phase_name() -> &'static str {
        "parser"
    }

    fn metrics_documentation() -> Vec<MetricDoc> {
        vec![
            MetricDoc {
                name: phase_metric!(counter, "parser", "records_produced"),
                metric_type: MetricType::Counter,
                help: "Total number of records produced from source payloads",
            },
            MetricDoc {
                name: phase_metric!(counter, "parser", "records_discarded"),
                metric_type: MetricType::Counter,
                help: "Total number of malformed or implausible rows discarded",
            },
            MetricDoc {
                name: phase_metric!(counter, "parser", "magnitudes_clamped"),
                metric_type: MetricType::Counter,
                help: "Total number of magnitudes clamped to the ceiling",
            },
            MetricDoc {
                name: phase_metric!(histogram, "parser", "duration_seconds"),
                metric_type: MetricType::Histogram,
                help: "Time spent parsing one source payload in seconds",
            },
        ]
    }
}
