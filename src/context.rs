// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Shared context for the webhook configuration controllers.
//!
//! Both controllers receive an `Arc<Context>` holding the Kubernetes client,
//! the syncer wired to the cluster, and the parsed command-line arguments.

use crate::certs_handler::SecretCertsHandlerFactory;
use crate::config::Args;
use crate::provisioner::SelfSignedCertProvisioner;
use crate::reconcilers::WebhookCertSyncer;
use crate::resource_client::KubeResourceClient;
use crate::secret_store::KubeSecretStore;
use kube::Client;
use std::sync::Arc;

/// Shared context passed to all controllers.
#[derive(Clone)]
pub struct Context {
    /// Kubernetes client for API operations
    pub client: Client,

    /// Sync engine backed by the cluster's secrets and webhook configurations
    pub syncer: WebhookCertSyncer,

    /// Parsed command-line arguments
    pub args: Args,
}

impl Context {
    /// Wire the cluster-backed collaborators into a context.
    #[must_use]
    pub fn new(client: Client, args: Args) -> Self {
        let handler_factory = SecretCertsHandlerFactory::new(
            Arc::new(KubeSecretStore::new(client.clone())),
            SelfSignedCertProvisioner::factory(args.cert_validity_days),
            args.cert_validation.validator(),
        );
        let syncer = WebhookCertSyncer::new(
            Arc::new(handler_factory),
            Arc::new(KubeResourceClient::new(client.clone())),
        );

        Self {
            client,
            syncer,
            args,
        }
    }
}
