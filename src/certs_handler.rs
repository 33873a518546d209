// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Per-configuration certificate handling.
//!
//! A [`CertsHandler`] is built for one webhook configuration by a
//! [`CertsHandlerFactory`]. It maps each webhook name to the secret declared in
//! the configuration's annotations:
//!
//! ```yaml
//! metadata:
//!   annotations:
//!     secret.certprovisioner.kubernetes.io/webhook-1: namespace-bar/secret-foo
//! ```
//!
//! Webhooks without such an annotation are skipped. For the others the handler
//! reads the stored material, or provisions and stores new material on demand.

use crate::certs::{
    certs_to_data, certs_to_secret, secret_to_certs, secrets_from_annotations, CertMaterial,
    SecretRef,
};
use crate::element::{WebhookConfigElement, WebhookKind};
use crate::errors::{Result, SyncError};
use crate::metrics;
use crate::provisioner::{service_to_common_name, ProvisionerFactory};
use crate::secret_store::SecretStore;
use crate::validity::CertValidator;
use async_trait::async_trait;
use k8s_openapi::api::admissionregistration::v1::WebhookClientConfig;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::OwnerReference;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, info};

/// Certificate operations for the webhooks of one configuration.
#[async_trait]
pub trait CertsHandler: Send + Sync {
    /// `true` if the webhook is not managed and must be left alone.
    fn skip(&self, webhook: &str) -> bool;

    /// Read the stored certificate material of a webhook.
    ///
    /// # Errors
    ///
    /// - [`SyncError::NotFoundInPolicy`] if the webhook is not annotated
    /// - [`SyncError::RecordNotFound`] if the secret does not exist yet
    /// - [`SyncError::MalformedRecord`] if the secret lacks a required key
    async fn read(&self, webhook: &str) -> Result<CertMaterial>;

    /// Provision fresh material for a webhook and store it, creating the
    /// secret if needed. Returns the material that was written.
    ///
    /// # Errors
    ///
    /// - [`SyncError::NotFoundInPolicy`] if the webhook is not annotated
    /// - [`SyncError::AmbiguousClientConfig`] if the webhook sets both or neither of service and url
    /// - [`SyncError::Provisioning`] and [`SyncError::Store`] verbatim
    async fn write(&self, webhook: &str) -> Result<CertMaterial>;

    /// `true` if stored material can keep serving.
    fn is_valid(&self, certs: &CertMaterial) -> bool;
}

/// Builds a [`CertsHandler`] for a webhook configuration.
pub trait CertsHandlerFactory: Send + Sync {
    /// Create the handler for `element`.
    ///
    /// A configuration without annotations gets a handler that skips every
    /// webhook.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::InvalidSecretReference`] for a malformed annotation value.
    fn new_handler(&self, element: &WebhookConfigElement) -> Result<Box<dyn CertsHandler>>;
}

/// Factory for handlers that keep certificate material in secrets.
#[derive(Clone)]
pub struct SecretCertsHandlerFactory {
    store: Arc<dyn SecretStore>,
    provisioner_factory: ProvisionerFactory,
    validator: Arc<dyn CertValidator>,
}

impl SecretCertsHandlerFactory {
    /// Create a factory.
    #[must_use]
    pub fn new(
        store: Arc<dyn SecretStore>,
        provisioner_factory: ProvisionerFactory,
        validator: Arc<dyn CertValidator>,
    ) -> Self {
        Self {
            store,
            provisioner_factory,
            validator,
        }
    }
}

impl CertsHandlerFactory for SecretCertsHandlerFactory {
    fn new_handler(&self, element: &WebhookConfigElement) -> Result<Box<dyn CertsHandler>> {
        let webhook_to_secret = match element.annotations() {
            Some(annotations) => secrets_from_annotations(annotations)?,
            None => BTreeMap::new(),
        };

        let client_configs = element
            .entries()
            .into_iter()
            .filter(|entry| webhook_to_secret.contains_key(entry.name))
            .map(|entry| (entry.name.to_string(), entry.client_config.clone()))
            .collect();

        debug!(
            kind = %element.kind(),
            name = %element.name(),
            managed_webhooks = webhook_to_secret.len(),
            "Built certificate handler"
        );

        Ok(Box::new(SecretCertsHandler {
            store: self.store.clone(),
            provisioner_factory: self.provisioner_factory.clone(),
            validator: self.validator.clone(),
            kind: element.kind(),
            webhook_to_secret,
            client_configs,
            owner: element.owner_reference(),
        }))
    }
}

/// [`CertsHandler`] storing material in the annotated secrets.
pub struct SecretCertsHandler {
    store: Arc<dyn SecretStore>,
    provisioner_factory: ProvisionerFactory,
    validator: Arc<dyn CertValidator>,
    kind: WebhookKind,
    webhook_to_secret: BTreeMap<String, SecretRef>,
    // Snapshot of each managed webhook's client config, used to derive the common name.
    client_configs: BTreeMap<String, WebhookClientConfig>,
    owner: Option<OwnerReference>,
}

impl SecretCertsHandler {
    fn secret_ref(&self, webhook: &str) -> Result<&SecretRef> {
        self.webhook_to_secret
            .get(webhook)
            .ok_or_else(|| SyncError::NotFoundInPolicy {
                webhook: webhook.to_string(),
            })
    }

    fn common_name(&self, webhook: &str) -> Result<String> {
        let default_config = WebhookClientConfig::default();
        let config = self.client_configs.get(webhook).unwrap_or(&default_config);
        client_config_to_common_name(webhook, config)
    }
}

/// Derive the certificate common name from a webhook's client config.
///
/// # Errors
///
/// - [`SyncError::AmbiguousClientConfig`] unless exactly one of service and url is set
/// - [`SyncError::InvalidUrl`] if the url has no host
pub fn client_config_to_common_name(webhook: &str, config: &WebhookClientConfig) -> Result<String> {
    match (&config.service, &config.url) {
        (Some(_), Some(_)) => Err(SyncError::AmbiguousClientConfig {
            webhook: webhook.to_string(),
            reason: "service and url can't be set at the same time",
        }),
        (None, None) => Err(SyncError::AmbiguousClientConfig {
            webhook: webhook.to_string(),
            reason: "one of service and url needs to be set",
        }),
        (Some(service), None) => Ok(service_to_common_name(&service.namespace, &service.name)),
        (None, Some(raw)) => {
            let invalid = |reason: String| SyncError::InvalidUrl {
                webhook: webhook.to_string(),
                url: raw.clone(),
                reason,
            };
            let parsed = url::Url::parse(raw).map_err(|e| invalid(e.to_string()))?;
            parsed
                .host_str()
                .map(str::to_string)
                .ok_or_else(|| invalid("url has no host".to_string()))
        }
    }
}

#[async_trait]
impl CertsHandler for SecretCertsHandler {
    fn skip(&self, webhook: &str) -> bool {
        !self.webhook_to_secret.contains_key(webhook)
    }

    async fn read(&self, webhook: &str) -> Result<CertMaterial> {
        let secret_ref = self.secret_ref(webhook)?;
        let secret =
            self.store
                .get(secret_ref)
                .await?
                .ok_or_else(|| SyncError::RecordNotFound {
                    namespace: secret_ref.namespace.clone(),
                    name: secret_ref.name.clone(),
                })?;
        secret_to_certs(&secret, secret_ref)
    }

    async fn write(&self, webhook: &str) -> Result<CertMaterial> {
        let secret_ref = self.secret_ref(webhook)?;
        let common_name = self.common_name(webhook)?;

        let provisioning_error = |source| SyncError::Provisioning {
            common_name: common_name.clone(),
            source,
        };
        let provisioner = (self.provisioner_factory)(&common_name).map_err(provisioning_error)?;
        let certs = provisioner
            .provision_serving_cert()
            .map_err(provisioning_error)?;
        metrics::record_certificate_provisioned(self.kind.kind_name());

        match self.store.get(secret_ref).await? {
            None => {
                let secret = certs_to_secret(&certs, secret_ref, self.owner.clone());
                self.store.create(&secret).await?;
                info!(
                    webhook = %webhook,
                    secret = %secret_ref,
                    common_name = %common_name,
                    "Created certificate secret"
                );
            }
            Some(mut existing) => {
                existing.data = Some(certs_to_data(&certs));
                existing.string_data = None;
                self.store.update(&existing).await?;
                info!(
                    webhook = %webhook,
                    secret = %secret_ref,
                    common_name = %common_name,
                    "Rewrote certificate secret"
                );
            }
        }

        Ok(certs)
    }

    fn is_valid(&self, certs: &CertMaterial) -> bool {
        self.validator.is_valid(certs)
    }
}

#[cfg(test)]
#[path = "certs_handler_tests.rs"]
mod certs_handler_tests;
