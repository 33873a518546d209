// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Persistence of updated webhook configurations.

use crate::element::{WebhookConfigElement, WebhookKind};
use crate::errors::Result;
use async_trait::async_trait;
use k8s_openapi::api::admissionregistration::v1::{
    MutatingWebhookConfiguration, ValidatingWebhookConfiguration,
};
use kube::api::PostParams;
use kube::{Api, Client, ResourceExt};
use tracing::debug;

/// Writes a webhook configuration back to the cluster.
#[async_trait]
pub trait ResourceClient: Send + Sync {
    /// Replace the stored configuration with `element`.
    ///
    /// Conflicts (stale `resourceVersion`) are surfaced as errors, not merged.
    async fn update(&self, element: &WebhookConfigElement) -> Result<()>;
}

/// [`ResourceClient`] backed by the Kubernetes API.
#[derive(Clone)]
pub struct KubeResourceClient {
    client: Client,
}

impl KubeResourceClient {
    /// Create a resource client using `client`.
    #[must_use]
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ResourceClient for KubeResourceClient {
    async fn update(&self, element: &WebhookConfigElement) -> Result<()> {
        let pp = PostParams::default();
        match element.kind() {
            WebhookKind::Mutating => {
                let config = element.as_mutating()?;
                let api: Api<MutatingWebhookConfiguration> = Api::all(self.client.clone());
                api.replace(&config.name_any(), &pp, config).await?;
            }
            WebhookKind::Validating => {
                let config = element.as_validating()?;
                let api: Api<ValidatingWebhookConfiguration> = Api::all(self.client.clone());
                api.replace(&config.name_any(), &pp, config).await?;
            }
        }
        debug!(
            kind = %element.kind(),
            name = %element.name(),
            "Replaced webhook configuration"
        );
        Ok(())
    }
}
