// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Global constants for the webhook certificate controller.
//!
//! This module contains all numeric and string constants used throughout the codebase.
//! Constants are organized by category for easy maintenance.

// ============================================================================
// API Constants
// ============================================================================

/// API group/version of the webhook configuration resources
pub const ADMISSION_API_VERSION: &str = "admissionregistration.k8s.io/v1";

/// Kind name for `MutatingWebhookConfiguration`
pub const KIND_MUTATING_WEBHOOK_CONFIGURATION: &str = "MutatingWebhookConfiguration";

/// Kind name for `ValidatingWebhookConfiguration`
pub const KIND_VALIDATING_WEBHOOK_CONFIGURATION: &str = "ValidatingWebhookConfiguration";

// ============================================================================
// Annotation Constants
// ============================================================================

/// Annotation prefix declaring where a webhook's certificate material lives.
///
/// Format: `secret.certprovisioner.kubernetes.io/<webhook-name>: <namespace>/<secret-name>`
pub const SECRET_CERT_ANNOTATION_PREFIX: &str = "secret.certprovisioner.kubernetes.io/";

// ============================================================================
// Secret Layout Constants
// ============================================================================

/// Secret key holding the PEM-encoded CA certificate
pub const CA_CERT_KEY: &str = "ca-cert.pem";

/// Secret key holding the PEM-encoded serving certificate
pub const SERVER_CERT_KEY: &str = "cert.pem";

/// Secret key holding the PEM-encoded serving private key
pub const SERVER_KEY_KEY: &str = "key.pem";

/// Label applied to secrets created by this controller
pub const MANAGED_BY_LABEL: &str = "app.kubernetes.io/managed-by";

/// Value of [`MANAGED_BY_LABEL`]
pub const MANAGED_BY_VALUE: &str = "webhook-certs";

// ============================================================================
// Certificate Constants
// ============================================================================

/// Common name of the self-signed CA generated per webhook
pub const SELF_SIGNED_CA_COMMON_NAME: &str = "webhook-cert-ca";

/// Default validity of provisioned serving certificates (1 year)
pub const DEFAULT_CERT_VALIDITY_DAYS: i64 = 365;

/// Fraction of certificate lifetime after which x509 validation asks for rotation
pub const ROTATION_THRESHOLD: f64 = 0.80;

// ============================================================================
// Controller Constants
// ============================================================================

/// Requeue interval after a successful sync (5 minutes)
pub const DEFAULT_REQUEUE_SECS: u64 = 300;

/// Requeue duration for controller errors (30 seconds)
pub const ERROR_REQUEUE_DURATION_SECS: u64 = 30;

// ============================================================================
// Runtime Constants
// ============================================================================

/// Number of worker threads for Tokio runtime
pub const TOKIO_WORKER_THREADS: usize = 4;

// ============================================================================
// Metrics Server Constants
// ============================================================================

/// Port for Prometheus metrics HTTP server
pub const METRICS_SERVER_PORT: u16 = 8080;

/// Path for Prometheus metrics endpoint
pub const METRICS_SERVER_PATH: &str = "/metrics";

/// Bind address for metrics HTTP server
pub const METRICS_SERVER_BIND_ADDRESS: &str = "0.0.0.0";
