//! Prometheus metrics for uploads and placeholder routes.
//!
//! This module provides:
//! - Upload counters (received, failed by kind, bytes stored)
//! - Upload save latency
//! - Hits on routes that were declared without a handler

use std::time::Instant;

use metrics::{counter, describe_counter, describe_histogram, histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use tracing::debug;

use crate::error::AppError;

// === Metric Name Constants ===

/// Uploads received counter metric name.
pub const METRIC_UPLOADS_RECEIVED: &str = "uploads_received_total";
/// Uploads failed counter metric name.
pub const METRIC_UPLOADS_FAILED: &str = "uploads_failed_total";
/// Uploaded bytes counter metric name.
pub const METRIC_UPLOAD_BYTES: &str = "upload_bytes_total";
/// Upload save latency metric name.
pub const METRIC_UPLOAD_SAVE_LATENCY: &str = "upload_save_latency_ms";
/// Unimplemented route hits counter metric name.
pub const METRIC_UNIMPLEMENTED_HITS: &str = "unimplemented_route_hits_total";

/// Initialize all metric descriptions.
/// Call this once at startup to register metrics with descriptions.
pub fn init_metrics() {
    describe_histogram!(
        METRIC_UPLOAD_SAVE_LATENCY,
        "Time to write an upload to disk in milliseconds"
    );

    describe_counter!(METRIC_UPLOADS_RECEIVED, "Total number of upload requests");
    describe_counter!(
        METRIC_UPLOADS_FAILED,
        "Total number of rejected or failed uploads"
    );
    describe_counter!(METRIC_UPLOAD_BYTES, "Total bytes written by uploads");
    describe_counter!(
        METRIC_UNIMPLEMENTED_HITS,
        "Total requests matched to routes without a handler"
    );

    debug!("Metrics initialized");
}

/// Install the Prometheus recorder and describe all metrics.
pub fn install_recorder() -> Result<PrometheusHandle, AppError> {
    let handle = PrometheusBuilder::new()
        .install_recorder()
        .map_err(|e| AppError::Metrics(e.to_string()))?;
    init_metrics();
    Ok(handle)
}

/// Increment uploads received counter.
pub fn inc_uploads_received() {
    counter!(METRIC_UPLOADS_RECEIVED).increment(1);
}

/// Increment uploads failed counter.
pub fn inc_uploads_failed(kind: &'static str) {
    counter!(METRIC_UPLOADS_FAILED, "kind" => kind).increment(1);
}

/// Add to the uploaded bytes counter.
pub fn add_upload_bytes(bytes: u64) {
    counter!(METRIC_UPLOAD_BYTES).increment(bytes);
}

/// Increment unimplemented route hits.
pub fn inc_unimplemented_hits(route: &str) {
    counter!(METRIC_UNIMPLEMENTED_HITS, "route" => route.to_string()).increment(1);
}

/// RAII guard for timing operations.
/// Automatically records latency when dropped.
pub struct LatencyTimer {
    start: Instant,
    metric_name: &'static str,
}

impl LatencyTimer {
    /// Create a new latency timer for the given metric.
    pub fn new(metric_name: &'static str) -> Self {
        Self {
            start: Instant::now(),
            metric_name,
        }
    }

    /// Get elapsed time in milliseconds (without recording).
    pub fn elapsed_ms(&self) -> f64 {
        self.start.elapsed().as_secs_f64() * 1000.0
    }
}

impl Drop for LatencyTimer {
    fn drop(&mut self) {
        histogram!(self.metric_name).record(self.elapsed_ms());
    }
}

/// Create a latency timer for saving an upload.
pub fn timer_upload_save() -> LatencyTimer {
    LatencyTimer::new(METRIC_UPLOAD_SAVE_LATENCY)
}
