//! Metrics and observability utilities
//!
//! Prometheus metrics through the `metrics` facade with standardized
//! naming conventions. The recorder itself is installed by the binary.

use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram, Unit};
use std::time::Instant;

/// Metrics prefix for all DocIntel metrics
pub const METRICS_PREFIX: &str = "docintel";

/// Histogram buckets for model-bound latency (in seconds)
pub const MODEL_BUCKETS: &[f64] = &[
    0.100,  // 100ms
    0.250,  // 250ms
    0.500,  // 500ms
    1.000,  // 1s
    2.500,  // 2.5s
    5.000,  // 5s
    10.00,  // 10s
    30.00,  // 30s
    60.00,  // 60s
];

/// Register all metric descriptions
pub fn register_metrics() {
    // Request metrics
    describe_counter!(
        format!("{}_requests_total", METRICS_PREFIX),
        Unit::Count,
        "Total number of HTTP requests"
    );

    describe_histogram!(
        format!("{}_request_duration_seconds", METRICS_PREFIX),
        Unit::Seconds,
        "HTTP request latency in seconds"
    );

    // Workflow metrics
    describe_counter!(
        format!("{}_workflow_runs_total", METRICS_PREFIX),
        Unit::Count,
        "Analysis workflow runs by outcome"
    );

    describe_histogram!(
        format!("{}_task_duration_seconds", METRICS_PREFIX),
        Unit::Seconds,
        "Workflow task latency in seconds"
    );

    // Model metrics
    describe_counter!(
        format!("{}_generation_requests_total", METRICS_PREFIX),
        Unit::Count,
        "Total generation calls by provider and status"
    );

    describe_histogram!(
        format!("{}_generation_duration_seconds", METRICS_PREFIX),
        Unit::Seconds,
        "Generation latency in seconds"
    );

    // Retrieval metrics
    describe_counter!(
        format!("{}_retrieval_queries_total", METRICS_PREFIX),
        Unit::Count,
        "Total retrieval index queries"
    );

    describe_histogram!(
        format!("{}_retrieval_duration_seconds", METRICS_PREFIX),
        Unit::Seconds,
        "Retrieval latency in seconds"
    );

    // Ingestion metrics
    describe_counter!(
        format!("{}_documents_ingested_total", METRICS_PREFIX),
        Unit::Count,
        "Total documents loaded"
    );

    describe_counter!(
        format!("{}_chunks_created_total", METRICS_PREFIX),
        Unit::Count,
        "Total chunks created"
    );

    describe_gauge!(
        format!("{}_index_passages", METRICS_PREFIX),
        Unit::Count,
        "Passages in the active retrieval index"
    );

    tracing::info!("Metrics registered");
}

/// Helper to record request metrics
pub struct RequestMetrics {
    start: Instant,
    endpoint: String,
    method: String,
}

impl RequestMetrics {
    /// Start tracking a request
    pub fn start(method: &str, endpoint: &str) -> Self {
        Self {
            start: Instant::now(),
            endpoint: endpoint.to_string(),
            method: method.to_string(),
        }
    }

    /// Record request completion
    pub fn finish(self, status: u16) {
        let duration = self.start.elapsed().as_secs_f64();

        counter!(
            format!("{}_requests_total", METRICS_PREFIX),
            "method" => self.method.clone(),
            "endpoint" => self.endpoint.clone(),
            "status" => status.to_string()
        )
        .increment(1);

        histogram!(
            format!("{}_request_duration_seconds", METRICS_PREFIX),
            "method" => self.method,
            "endpoint" => self.endpoint
        )
        .record(duration);
    }
}

/// Helper to record one workflow run
pub fn record_workflow_run(success: bool) {
    let outcome = if success { "completed" } else { "aborted" };
    counter!(
        format!("{}_workflow_runs_total", METRICS_PREFIX),
        "outcome" => outcome
    )
    .increment(1);
}

/// Helper to record one workflow task
pub fn record_task(duration_secs: f64, task: &str, success: bool) {
    let status = if success { "success" } else { "error" };
    histogram!(
        format!("{}_task_duration_seconds", METRICS_PREFIX),
        "task" => task.to_string(),
        "status" => status
    )
    .record(duration_secs);
}

/// Helper to record generation metrics
pub fn record_generation(duration_secs: f64, provider: &str, model: &str, success: bool) {
    let status = if success { "success" } else { "error" };

    counter!(
        format!("{}_generation_requests_total", METRICS_PREFIX),
        "provider" => provider.to_string(),
        "model" => model.to_string(),
        "status" => status
    )
    .increment(1);

    if success {
        histogram!(
            format!("{}_generation_duration_seconds", METRICS_PREFIX),
            "provider" => provider.to_string()
        )
        .record(duration_secs);
    }
}

/// Helper to record retrieval metrics
pub fn record_retrieval(duration_secs: f64, result_count: usize) {
    counter!(format!("{}_retrieval_queries_total", METRICS_PREFIX)).increment(1);
    histogram!(format!("{}_retrieval_duration_seconds", METRICS_PREFIX)).record(duration_secs);
    tracing::trace!(result_count, "Retrieval recorded");
}

/// Helper to record ingestion metrics
pub fn record_ingestion(documents: usize, chunks_created: usize) {
    counter!(format!("{}_documents_ingested_total", METRICS_PREFIX)).increment(documents as u64);
    counter!(format!("{}_chunks_created_total", METRICS_PREFIX)).increment(chunks_created as u64);
}

/// Helper to publish the active index size
pub fn record_index_size(passages: usize) {
    gauge!(format!("{}_index_passages", METRICS_PREFIX)).set(passages as f64);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_model_buckets_sorted() {
        let mut prev = 0.0;
        for &bucket in MODEL_BUCKETS {
            assert!(bucket > prev);
            prev = bucket;
        }
    }

    #[test]
    fn test_helpers_without_recorder() {
        let metrics = RequestMetrics::start("POST", "/api/analysis");
        metrics.finish(200);
        record_workflow_run(true);
        record_task(0.5, "summarize", true);
        record_generation(0.5, "mock", "mock-generation", false);
        record_retrieval(0.01, 3);
        record_ingestion(2, 10);
        record_index_size(10);
        // Just verify it runs without panic
    }
}
