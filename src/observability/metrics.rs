//! Metrics collection and exposition.
//!
//! # Metrics
//! - `http_requests_total` (counter): completed requests by method, route, code
//! - `http_errors_total` (counter): completed requests with status >= 400
//! - `http_login_errors_total` (counter): failed login attempts
//! - `http_request_duration_seconds` (histogram): latency distribution
//! - `process_*` (gauges): sampled on every render
//!
//! # Design Decisions
//! - The registry is an owned recorder, not the global one, so every
//!   `HttpMetrics` (and every test) has independent state
//! - Updates go through the `metrics` macros against that recorder; storage
//!   is atomic, so concurrent requests need no extra locking

use std::sync::Arc;

use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram};
use metrics_exporter_prometheus::{
    BuildError, Matcher, PrometheusBuilder, PrometheusHandle, PrometheusRecorder,
};
use thiserror::Error;

use crate::config::MetricsConfig;
use crate::observability::process::ProcessSnapshot;

pub const REQUESTS_TOTAL: &str = "http_requests_total";
pub const ERRORS_TOTAL: &str = "http_errors_total";
pub const LOGIN_ERRORS_TOTAL: &str = "http_login_errors_total";
pub const REQUEST_DURATION: &str = "http_request_duration_seconds";

/// Histogram bucket upper bounds, in seconds.
pub const DURATION_BUCKETS: [f64; 9] = [0.1, 0.3, 0.5, 0.7, 1.0, 3.0, 5.0, 7.0, 10.0];

/// Content type of the exposition returned by [`HttpMetrics::render`].
pub const CONTENT_TYPE: &str = "text/plain; version=0.0.4";

#[derive(Debug, Error)]
pub enum MetricsError {
    #[error("invalid metrics configuration: {0}")]
    Build(#[from] BuildError),
}

/// Request metrics registry shared by the pipeline and handlers.
#[derive(Clone)]
pub struct HttpMetrics {
    inner: Arc<Inner>,
}

struct Inner {
    recorder: PrometheusRecorder,
    handle: PrometheusHandle,
}

impl HttpMetrics {
    pub fn new(config: &MetricsConfig) -> Result<Self, MetricsError> {
        let recorder = PrometheusBuilder::new()
            .add_global_label("app", config.app_label.clone())
            .add_global_label("environment", config.environment.clone())
            .set_buckets_for_metric(Matcher::Full(REQUEST_DURATION.to_string()), &DURATION_BUCKETS)?
            .build_recorder();
        let handle = recorder.handle();

        let metrics = Self {
            inner: Arc::new(Inner { recorder, handle }),
        };
        metrics.describe();
        Ok(metrics)
    }

    fn with_recorder<T>(&self, f: impl FnOnce() -> T) -> T {
        metrics::with_local_recorder(&self.inner.recorder, f)
    }

    fn describe(&self) {
        self.with_recorder(|| {
            describe_histogram!(REQUEST_DURATION, "Duration of HTTP requests in seconds");
            describe_counter!(REQUESTS_TOTAL, "Total number of HTTP requests");
            describe_counter!(ERRORS_TOTAL, "Total number of HTTP errors");
            describe_counter!(LOGIN_ERRORS_TOTAL, "Total number of failed login attempts");
            describe_gauge!(
                "process_start_time_seconds",
                "Start time of the process since unix epoch in seconds"
            );
            describe_gauge!("process_resident_memory_bytes", "Resident memory size in bytes");
            describe_gauge!("process_virtual_memory_bytes", "Virtual memory size in bytes");
            describe_gauge!("process_open_fds", "Number of open file descriptors");
            describe_gauge!(
                "process_cpu_seconds_total",
                "Total user and system CPU time spent in seconds"
            );

            // Unlabeled, so it is exported as 0 before the first failure.
            counter!(LOGIN_ERRORS_TOTAL).absolute(0);
        });
    }

    pub fn observe_duration(&self, method: &str, route: &str, code: u16, seconds: f64) {
        self.with_recorder(|| {
            histogram!(
                REQUEST_DURATION,
                "method" => method.to_owned(),
                "route" => route.to_owned(),
                "code" => code.to_string()
            )
            .record(seconds);
        });
    }

    pub fn inc_request(&self, method: &str, route: &str, code: u16) {
        self.with_recorder(|| {
            counter!(
                REQUESTS_TOTAL,
                "method" => method.to_owned(),
                "route" => route.to_owned(),
                "code" => code.to_string()
            )
            .increment(1);
        });
    }

    pub fn inc_error(&self, method: &str, route: &str, code: u16) {
        self.with_recorder(|| {
            counter!(
                ERRORS_TOTAL,
                "method" => method.to_owned(),
                "route" => route.to_owned(),
                "code" => code.to_string()
            )
            .increment(1);
        });
    }

    pub fn inc_login_error(&self) {
        self.with_recorder(|| counter!(LOGIN_ERRORS_TOTAL).increment(1));
    }

    /// Record the outcome of one completed request.
    pub fn record_request(&self, method: &str, route: &str, code: u16, seconds: f64) {
        self.observe_duration(method, route, code, seconds);
        self.inc_request(method, route, code);
        if code >= 400 {
            self.inc_error(method, route, code);
        }
    }

    /// Prometheus text exposition of every series, process metrics included.
    pub fn render(&self) -> String {
        let process = ProcessSnapshot::collect();
        self.with_recorder(|| {
            gauge!("process_start_time_seconds").set(process.start_time_seconds);
            if let Some(bytes) = process.resident_memory_bytes {
                gauge!("process_resident_memory_bytes").set(bytes as f64);
            }
            if let Some(bytes) = process.virtual_memory_bytes {
                gauge!("process_virtual_memory_bytes").set(bytes as f64);
            }
            if let Some(fds) = process.open_fds {
                gauge!("process_open_fds").set(fds as f64);
            }
            if let Some(seconds) = process.cpu_seconds_total {
                gauge!("process_cpu_seconds_total").set(seconds);
            }
        });
        self.inner.handle.render()
    }
}

/// Sum of every sample of `name` in an exposition, across label sets.
pub fn sample_sum(exposition: &str, name: &str) -> f64 {
    exposition
        .lines()
        .filter(|line| !line.starts_with('#'))
        .filter(|line| {
            let series = line.split(['{', ' ']).next().unwrap_or_default();
            series == name
        })
        .filter_map(|line| line.rsplit(' ').next()?.parse::<f64>().ok())
        .sum()
}
