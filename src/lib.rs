// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! # webhook-certs - Admission Webhook Certificate Syncer for Kubernetes
//!
//! A Kubernetes controller that keeps the serving certificates of admission
//! webhooks and the CA bundles in their configurations in sync.
//!
//! ## Overview
//!
//! A `MutatingWebhookConfiguration` or `ValidatingWebhookConfiguration` opts a
//! webhook in by naming a secret in an annotation:
//!
//! ```yaml
//! metadata:
//!   annotations:
//!     secret.certprovisioner.kubernetes.io/my-webhook: my-namespace/my-webhook-certs
//! ```
//!
//! For every annotated webhook the controller makes sure the secret holds a CA,
//! a serving certificate and its key (`ca-cert.pem`, `cert.pem`, `key.pem`),
//! provisioning them when missing, and appends the CA to the webhook's
//! `clientConfig.caBundle`.
//!
//! ## Modules
//!
//! - [`element`] - Uniform view over both webhook configuration kinds
//! - [`certs`] - Certificate material and its secret layout
//! - [`certs_handler`] - Per-configuration read/write of certificate material
//! - [`provisioner`] - Self-signed certificate provisioning
//! - [`validity`] - Policies deciding when stored material is re-provisioned
//! - [`reconcilers`] - The sync algorithm
//! - [`secret_store`] / [`resource_client`] - Kubernetes API adapters
//! - [`config`] / [`context`] - Command-line configuration and controller context
//! - [`metrics`] - Prometheus metrics
//!
//! ## Example
//!
//! ```rust
//! use webhook_certs::provisioner::service_to_common_name;
//!
//! assert_eq!(service_to_common_name("payments", "validator"), "validator.payments.svc");
//! ```

pub mod certs;
pub mod certs_handler;
pub mod config;
pub mod constants;
pub mod context;
pub mod element;
pub mod errors;
pub mod metrics;
pub mod provisioner;
pub mod reconcilers;
pub mod resource_client;
pub mod secret_store;
pub mod validity;

#[cfg(test)]
mod test_support;
