// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Command-line configuration for the controller.
//!
//! Every flag can also be set through its `WEBHOOK_CERTS_*` environment
//! variable. Logging is configured separately through `RUST_LOG` and
//! `RUST_LOG_FORMAT`.

use crate::constants::{
    DEFAULT_CERT_VALIDITY_DAYS, DEFAULT_REQUEUE_SECS, ERROR_REQUEUE_DURATION_SECS,
    METRICS_SERVER_BIND_ADDRESS, METRICS_SERVER_PORT, TOKIO_WORKER_THREADS,
};
use crate::validity::{AcceptAll, CertValidator, X509Validator};
use clap::{Parser, ValueEnum};
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;

/// Policy applied to certificate material already stored in a secret.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum CertValidation {
    /// Accept any stored material
    #[default]
    None,
    /// Parse the stored PEM and re-provision expired, near-expiry or mismatched material
    X509,
}

impl CertValidation {
    /// Build the validator for this policy.
    #[must_use]
    pub fn validator(self) -> Arc<dyn CertValidator> {
        match self {
            Self::None => Arc::new(AcceptAll),
            Self::X509 => Arc::new(X509Validator::default()),
        }
    }
}

/// Keeps admission webhook serving certificates and CA bundles in sync
#[derive(Parser, Debug, Clone)]
#[command(name = "webhook-certs", version, about, long_about = None)]
pub struct Args {
    /// Seconds between periodic re-syncs of a healthy configuration
    #[arg(long, env = "WEBHOOK_CERTS_REQUEUE_INTERVAL_SECS", default_value_t = DEFAULT_REQUEUE_SECS)]
    pub requeue_interval_secs: u64,

    /// Seconds before retrying a failed sync
    #[arg(long, env = "WEBHOOK_CERTS_ERROR_REQUEUE_SECS", default_value_t = ERROR_REQUEUE_DURATION_SECS)]
    pub error_requeue_secs: u64,

    /// Address the metrics server binds to
    #[arg(long, env = "WEBHOOK_CERTS_METRICS_BIND_ADDRESS", default_value = METRICS_SERVER_BIND_ADDRESS)]
    pub metrics_bind_address: IpAddr,

    /// Port the metrics server listens on
    #[arg(long, env = "WEBHOOK_CERTS_METRICS_PORT", default_value_t = METRICS_SERVER_PORT)]
    pub metrics_port: u16,

    /// Validity policy for stored certificate material
    #[arg(long, env = "WEBHOOK_CERTS_CERT_VALIDATION", value_enum, default_value_t = CertValidation::None)]
    pub cert_validation: CertValidation,

    /// Lifetime in days of provisioned certificates
    #[arg(
        long,
        env = "WEBHOOK_CERTS_CERT_VALIDITY_DAYS",
        default_value_t = DEFAULT_CERT_VALIDITY_DAYS,
        value_parser = clap::value_parser!(i64).range(1..)
    )]
    pub cert_validity_days: i64,

    /// Tokio worker threads
    #[arg(long, env = "WEBHOOK_CERTS_WORKER_THREADS", default_value_t = TOKIO_WORKER_THREADS)]
    pub worker_threads: usize,
}

impl Args {
    /// Requeue delay after a successful sync.
    #[must_use]
    pub fn requeue_interval(&self) -> Duration {
        Duration::from_secs(self.requeue_interval_secs)
    }

    /// Requeue delay after a failed sync.
    #[must_use]
    pub fn error_requeue(&self) -> Duration {
        Duration::from_secs(self.error_requeue_secs)
    }

    /// Socket address of the metrics server.
    #[must_use]
    pub fn metrics_addr(&self) -> SocketAddr {
        SocketAddr::new(self.metrics_bind_address, self.metrics_port)
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod config_tests;
