// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Prometheus metrics for the webhook certificate syncer.
//!
//! All metrics use the namespace prefix `webhook_certs_`.
//!
//! # Metrics Categories
//!
//! - **Reconciliation Metrics** - Reconciliation outcomes and durations per webhook configuration kind
//! - **Certificate Metrics** - Provisioned certificates and CA bundle updates
//! - **Error Metrics** - Errors by kind and category
//!
//! # Example
//!
//! ```rust,no_run
//! use webhook_certs::metrics::record_reconciliation_success;
//!
//! record_reconciliation_success("MutatingWebhookConfiguration", std::time::Duration::from_secs(1));
//! ```

use prometheus::{CounterVec, Encoder, HistogramOpts, HistogramVec, Opts, Registry, TextEncoder};
use std::sync::LazyLock;
use std::time::Duration;

// ============================================================================
// Metric Name Constants
// ============================================================================

/// Namespace prefix for all metrics (prometheus-safe)
const METRICS_NAMESPACE: &str = "webhook_certs";

// ============================================================================
// Global Metrics Registry
// ============================================================================

/// Global Prometheus metrics registry
///
/// All metrics are registered in this registry and exposed via `/metrics` endpoint.
pub static METRICS_REGISTRY: LazyLock<Registry> = LazyLock::new(Registry::new);

// ============================================================================
// Reconciliation Metrics
// ============================================================================

/// Total number of reconciliations by kind and status
///
/// Labels:
/// - `kind`: `MutatingWebhookConfiguration` or `ValidatingWebhookConfiguration`
/// - `status`: Outcome (`updated`, `unchanged`, `error`)
pub static RECONCILIATION_TOTAL: LazyLock<CounterVec> = LazyLock::new(|| {
    let opts = Opts::new(
        format!("{METRICS_NAMESPACE}_reconciliations_total"),
        "Total number of reconciliations by kind and status",
    );
    let counter = CounterVec::new(opts, &["kind", "status"]).unwrap();
    METRICS_REGISTRY
        .register(Box::new(counter.clone()))
        .unwrap();
    counter
});

/// Duration of reconciliations in seconds
pub static RECONCILIATION_DURATION_SECONDS: LazyLock<HistogramVec> = LazyLock::new(|| {
    let opts = HistogramOpts::new(
        format!("{METRICS_NAMESPACE}_reconciliation_duration_seconds"),
        "Duration of reconciliations in seconds by kind",
    )
    .buckets(vec![0.001, 0.01, 0.1, 0.5, 1.0, 2.0, 5.0, 10.0, 30.0]);
    let histogram = HistogramVec::new(opts, &["kind"]).unwrap();
    METRICS_REGISTRY
        .register(Box::new(histogram.clone()))
        .unwrap();
    histogram
});

// ============================================================================
// Certificate Metrics
// ============================================================================

/// Total number of serving certificates provisioned and written to secrets
pub static CERTIFICATES_PROVISIONED_TOTAL: LazyLock<CounterVec> = LazyLock::new(|| {
    let opts = Opts::new(
        format!("{METRICS_NAMESPACE}_certificates_provisioned_total"),
        "Total number of serving certificates provisioned by kind",
    );
    let counter = CounterVec::new(opts, &["kind"]).unwrap();
    METRICS_REGISTRY
        .register(Box::new(counter.clone()))
        .unwrap();
    counter
});

/// Total number of webhook entries whose CA bundle received a new CA
pub static CA_BUNDLES_UPDATED_TOTAL: LazyLock<CounterVec> = LazyLock::new(|| {
    let opts = Opts::new(
        format!("{METRICS_NAMESPACE}_ca_bundles_updated_total"),
        "Total number of CA bundle merges by kind",
    );
    let counter = CounterVec::new(opts, &["kind"]).unwrap();
    METRICS_REGISTRY
        .register(Box::new(counter.clone()))
        .unwrap();
    counter
});

// ============================================================================
// Error Metrics
// ============================================================================

/// Total number of errors by kind and error category
///
/// Labels:
/// - `kind`: Webhook configuration kind
/// - `error_type`: Category reported by `SyncError::metric_label`
pub static ERRORS_TOTAL: LazyLock<CounterVec> = LazyLock::new(|| {
    let opts = Opts::new(
        format!("{METRICS_NAMESPACE}_errors_total"),
        "Total number of errors by kind and error category",
    );
    let counter = CounterVec::new(opts, &["kind", "error_type"]).unwrap();
    METRICS_REGISTRY
        .register(Box::new(counter.clone()))
        .unwrap();
    counter
});

// ============================================================================
// Helper Functions
// ============================================================================

fn record_reconciliation(kind: &str, status: &str, duration: Duration) {
    RECONCILIATION_TOTAL.with_label_values(&[kind, status]).inc();
    RECONCILIATION_DURATION_SECONDS
        .with_label_values(&[kind])
        .observe(duration.as_secs_f64());
}

/// Record a reconciliation that wrote an updated configuration
pub fn record_reconciliation_success(kind: &str, duration: Duration) {
    record_reconciliation(kind, "updated", duration);
}

/// Record a reconciliation that left the configuration untouched
pub fn record_reconciliation_unchanged(kind: &str, duration: Duration) {
    record_reconciliation(kind, "unchanged", duration);
}

/// Record a failed reconciliation
///
/// # Arguments
/// * `kind` - Webhook configuration kind
/// * `duration` - Duration of the reconciliation before failure
pub fn record_reconciliation_error(kind: &str, duration: Duration) {
    record_reconciliation(kind, "error", duration);
}

/// Record a provisioned serving certificate
pub fn record_certificate_provisioned(kind: &str) {
    CERTIFICATES_PROVISIONED_TOTAL
        .with_label_values(&[kind])
        .inc();
}

/// Record a CA appended to a webhook's CA bundle
pub fn record_ca_bundle_updated(kind: &str) {
    CA_BUNDLES_UPDATED_TOTAL.with_label_values(&[kind]).inc();
}

/// Record an error
///
/// # Arguments
/// * `kind` - Webhook configuration kind
/// * `error_type` - Category of error (e.g., `api_error`, `ambiguous_client_config`)
pub fn record_error(kind: &str, error_type: &str) {
    ERRORS_TOTAL.with_label_values(&[kind, error_type]).inc();
}

/// Gather and encode all metrics in Prometheus text format
///
/// # Errors
/// Returns error if encoding fails
pub fn gather_metrics() -> Result<String, prometheus::Error> {
    let encoder = TextEncoder::new();
    let metric_families = METRICS_REGISTRY.gather();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer)?;
    String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(format!("UTF-8 error: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_reconciliation_success() {
        let kind = "TestKindSuccess";
        record_reconciliation_success(kind, Duration::from_millis(500));

        let counter = RECONCILIATION_TOTAL.with_label_values(&[kind, "updated"]);
        assert!(counter.get() > 0.0);

        let histogram = RECONCILIATION_DURATION_SECONDS.with_label_values(&[kind]);
        assert!(histogram.get_sample_count() > 0);
    }

    #[test]
    fn test_record_reconciliation_unchanged_and_error() {
        let kind = "TestKindMixed";
        record_reconciliation_unchanged(kind, Duration::from_millis(10));
        record_reconciliation_error(kind, Duration::from_millis(20));

        assert!(RECONCILIATION_TOTAL.with_label_values(&[kind, "unchanged"]).get() > 0.0);
        assert!(RECONCILIATION_TOTAL.with_label_values(&[kind, "error"]).get() > 0.0);
        let histogram = RECONCILIATION_DURATION_SECONDS.with_label_values(&[kind]);
        assert!(histogram.get_sample_count() >= 2);
    }

    #[test]
    fn test_certificate_counters() {
        let kind = "TestKindCerts";
        record_certificate_provisioned(kind);
        record_ca_bundle_updated(kind);
        record_ca_bundle_updated(kind);

        assert!(CERTIFICATES_PROVISIONED_TOTAL.with_label_values(&[kind]).get() >= 1.0);
        assert!(CA_BUNDLES_UPDATED_TOTAL.with_label_values(&[kind]).get() >= 2.0);
    }

    #[test]
    fn test_record_error() {
        record_error("TestKindErrors", "api_error");
        let counter = ERRORS_TOTAL.with_label_values(&["TestKindErrors", "api_error"]);
        assert!(counter.get() > 0.0);
    }

    #[test]
    fn test_gather_metrics() {
        record_reconciliation_success("GatherTest", Duration::from_millis(100));

        let metrics_text = gather_metrics().unwrap();
        assert!(
            metrics_text.contains("webhook_certs"),
            "Metrics should contain namespace prefix"
        );
        assert!(
            metrics_text.contains("reconciliations_total"),
            "Metrics should contain reconciliation counter"
        );
    }
}
