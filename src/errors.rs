// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Error types for webhook certificate synchronization.
//!
//! This module provides specialized error types for:
//! - Resolving webhook configurations into a uniform element
//! - Reading and writing certificate material in secrets
//! - Provisioning certificates
//! - Persisting the updated webhook configuration
//!
//! Every error aborts the current sync pass. [`SyncError::RecordNotFound`] is the
//! only variant the sync loop handles itself (it triggers provisioning).

use thiserror::Error;

/// Errors raised while provisioning certificate material.
#[derive(Error, Debug, Clone)]
pub enum ProvisionError {
    /// Key generation failed
    #[error("key generation failed: {0}")]
    KeyGenerationFailed(String),

    /// Certificate generation or signing failed
    #[error("certificate generation failed: {0}")]
    CertificateGenerationFailed(String),

    /// Common name cannot be used as a subject alternative name
    #[error("invalid common name '{common_name}': {reason}")]
    InvalidCommonName {
        /// The rejected common name
        common_name: String,
        /// Why it was rejected
        reason: String,
    },
}

/// Errors that can occur during a sync pass over one webhook configuration.
#[derive(Error, Debug)]
pub enum SyncError {
    /// The object is neither a mutating nor a validating webhook configuration
    #[error("unsupported type: {kind}, only MutatingWebhookConfiguration and ValidatingWebhookConfiguration are supported")]
    UnsupportedType {
        /// Kind (or `apiVersion/kind`) of the rejected object
        kind: String,
    },

    /// The object claims a supported kind but cannot be decoded as it
    #[error("failed to decode {kind}: {source}")]
    InvalidObject {
        /// Kind the object claimed
        kind: String,
        /// Decoding failure
        #[source]
        source: serde_json::Error,
    },

    /// Downcast to the wrong webhook configuration variant
    #[error("expected a {expected} webhook configuration, found {found}")]
    WrongVariant {
        /// Requested variant
        expected: &'static str,
        /// Actual variant
        found: &'static str,
    },

    /// Webhook has both or neither of `service` and `url` set
    #[error("webhook '{webhook}' must set exactly one of service and url in its clientConfig: {reason}")]
    AmbiguousClientConfig {
        /// Webhook entry name
        webhook: String,
        /// Which rule was violated
        reason: &'static str,
    },

    /// Webhook url could not be parsed into a host
    #[error("webhook '{webhook}' has an invalid url '{url}': {reason}")]
    InvalidUrl {
        /// Webhook entry name
        webhook: String,
        /// The url as declared
        url: String,
        /// Parse failure
        reason: String,
    },

    /// Webhook is not covered by any secret annotation
    #[error("failed to find the secret name by the webhook name: '{webhook}'")]
    NotFoundInPolicy {
        /// Webhook entry name
        webhook: String,
    },

    /// Annotation value is not of the form `namespace/name`
    #[error("annotation '{annotation}' has value '{value}', expected '<namespace>/<name>'")]
    InvalidSecretReference {
        /// Full annotation key
        annotation: String,
        /// Offending value
        value: String,
    },

    /// The secret holding the webhook's certificate material does not exist
    #[error("secret {namespace}/{name} not found")]
    RecordNotFound {
        /// Secret namespace
        namespace: String,
        /// Secret name
        name: String,
    },

    /// The secret exists but lacks one of the required keys
    #[error("failed to find required key '{key}' in secret {namespace}/{name}")]
    MalformedRecord {
        /// Secret namespace
        namespace: String,
        /// Secret name
        name: String,
        /// Missing data key
        key: &'static str,
    },

    /// Certificate provisioning failed
    #[error("failed to provision certificate for '{common_name}': {source}")]
    Provisioning {
        /// Common name requested
        common_name: String,
        /// Underlying provisioner error
        #[source]
        source: ProvisionError,
    },

    /// Kubernetes API error, surfaced verbatim
    #[error(transparent)]
    Store(#[from] kube::Error),
}

impl SyncError {
    /// Short, stable label for metrics.
    #[must_use]
    pub fn metric_label(&self) -> &'static str {
        match self {
            Self::UnsupportedType { .. } => "unsupported_type",
            Self::InvalidObject { .. } => "invalid_object",
            Self::WrongVariant { .. } => "wrong_variant",
            Self::AmbiguousClientConfig { .. } => "ambiguous_client_config",
            Self::InvalidUrl { .. } => "invalid_url",
            Self::NotFoundInPolicy { .. } => "not_found_in_policy",
            Self::InvalidSecretReference { .. } => "invalid_secret_reference",
            Self::RecordNotFound { .. } => "record_not_found",
            Self::MalformedRecord { .. } => "malformed_record",
            Self::Provisioning { .. } => "provisioning_error",
            Self::Store(_) => "api_error",
        }
    }
}

/// Result alias used across the sync core.
pub type Result<T, E = SyncError> = std::result::Result<T, E>;

#[cfg(test)]
#[path = "errors_tests.rs"]
mod errors_tests;
