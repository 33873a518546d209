// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Reconciliation logic for admission webhook configurations.
//!
//! Both `MutatingWebhookConfiguration` and `ValidatingWebhookConfiguration`
//! are reconciled by the same algorithm, written once against
//! [`WebhookConfigElement`](crate::element::WebhookConfigElement).
//!
//! # Reconciliation Architecture
//!
//! 1. **Watch** - Monitor webhook configurations and the secrets they own
//! 2. **Reconcile** - Ensure every annotated webhook has certificate material
//! 3. **Update** - Merge each CA into its webhook's `caBundle` and persist
//!
//! # Example: Running a Sync Pass
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use webhook_certs::certs_handler::SecretCertsHandlerFactory;
//! use webhook_certs::element::WebhookConfigElement;
//! use webhook_certs::provisioner::SelfSignedCertProvisioner;
//! use webhook_certs::reconcilers::WebhookCertSyncer;
//! use webhook_certs::resource_client::KubeResourceClient;
//! use webhook_certs::secret_store::KubeSecretStore;
//! use webhook_certs::validity::AcceptAll;
//!
//! async fn sync_once(client: kube::Client, element: WebhookConfigElement) -> anyhow::Result<()> {
//!     let factory = SecretCertsHandlerFactory::new(
//!         Arc::new(KubeSecretStore::new(client.clone())),
//!         SelfSignedCertProvisioner::factory(365),
//!         Arc::new(AcceptAll),
//!     );
//!     let syncer = WebhookCertSyncer::new(
//!         Arc::new(factory),
//!         Arc::new(KubeResourceClient::new(client)),
//!     );
//!     syncer.sync(&element).await?;
//!     Ok(())
//! }
//! ```

pub mod webhook_config;


pub use webhook_config::{
    merge_ca_bundle, reconcile_webhook_config, SyncOutcome, WebhookCertSyncer,
};
