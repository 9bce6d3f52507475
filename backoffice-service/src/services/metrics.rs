//! Prometheus metrics for backoffice-service.
//!
//! Domain counters live in the `prometheus` default registry. HTTP request
//! metrics come from the shared middleware through the `metrics` facade and
//! are rendered by the installed exporter recorder.

use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use once_cell::sync::Lazy;
use prometheus::{
    register_counter_vec, register_histogram_vec, CounterVec, HistogramVec, TextEncoder,
};
use std::sync::OnceLock;

/// Database query duration histogram.
pub static DB_QUERY_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    register_histogram_vec!(
        "backoffice_db_query_duration_seconds",
        "Database query duration in seconds",
        &["operation"],
        vec![0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0]
    )
    .expect("Failed to register db_query_duration")
});

/// Purchase-order state changes by target state.
pub static ORDER_TRANSITIONS_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "backoffice_order_transitions_total",
        "Purchase order state transitions",
        &["to_state"] // paid, cancelled
    )
    .expect("Failed to register order_transitions_total")
});

/// Invoices issued, by origin.
pub static INVOICES_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "backoffice_invoices_total",
        "Total number of invoices issued",
        &["source"] // purchase_order, direct
    )
    .expect("Failed to register invoices_total")
});

/// Appointment booking attempts by outcome.
pub static APPOINTMENTS_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "backoffice_appointments_total",
        "Appointment booking attempts by outcome",
        &["outcome"] // booked, moved, slot_full, duplicate
    )
    .expect("Failed to register appointments_total")
});

/// Requests refused by the permission check.
pub static PERMISSION_DENIALS_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "backoffice_permission_denials_total",
        "Requests denied for missing permission",
        &["code"]
    )
    .expect("Failed to register permission_denials_total")
});

static HTTP_METRICS: OnceLock<Option<PrometheusHandle>> = OnceLock::new();

/// Initialize all metrics. Safe to call more than once.
pub fn init_metrics() {
    HTTP_METRICS.get_or_init(|| match PrometheusBuilder::new().install_recorder() {
        Ok(handle) => Some(handle),
        Err(e) => {
            tracing::warn!(error = %e, "HTTP metrics recorder not installed");
            None
        }
    });
    Lazy::force(&DB_QUERY_DURATION);
    Lazy::force(&ORDER_TRANSITIONS_TOTAL);
    Lazy::force(&INVOICES_TOTAL);
    Lazy::force(&APPOINTMENTS_TOTAL);
    Lazy::force(&PERMISSION_DENIALS_TOTAL);
}

/// Get metrics in Prometheus text format.
pub fn get_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut text = encoder
        .encode_to_string(&metric_families)
        .unwrap_or_default();
    if let Some(handle) = HTTP_METRICS.get().and_then(Option::as_ref) {
        text.push_str(&handle.render());
    }
    text
}
