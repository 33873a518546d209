// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Shared fixtures and in-memory collaborators for unit tests.

use crate::certs::{CertMaterial, SecretRef};
use crate::constants::SECRET_CERT_ANNOTATION_PREFIX;
use crate::element::WebhookConfigElement;
use crate::errors::{ProvisionError, Result};
use crate::provisioner::{CertProvisioner, ProvisionerFactory};
use crate::resource_client::ResourceClient;
use crate::secret_store::SecretStore;
use async_trait::async_trait;
use k8s_openapi::api::admissionregistration::v1::{
    MutatingWebhook, MutatingWebhookConfiguration, ServiceReference, ValidatingWebhook,
    ValidatingWebhookConfiguration, WebhookClientConfig,
};
use k8s_openapi::api::core::v1::Secret;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use kube::ResourceExt;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

// ============================================================================
// Resource builders
// ============================================================================

/// Client config pointing at an in-cluster service.
pub fn service_config(namespace: &str, name: &str) -> WebhookClientConfig {
    WebhookClientConfig {
        service: Some(ServiceReference {
            namespace: namespace.to_string(),
            name: name.to_string(),
            path: Some("/webhook".to_string()),
            port: Some(443),
        }),
        ..Default::default()
    }
}

/// Client config pointing at a url.
pub fn url_config(url: &str) -> WebhookClientConfig {
    WebhookClientConfig {
        url: Some(url.to_string()),
        ..Default::default()
    }
}

fn metadata(name: &str, secrets: &[(&str, &str)]) -> ObjectMeta {
    let annotations = (!secrets.is_empty()).then(|| {
        secrets
            .iter()
            .map(|(webhook, secret)| {
                (
                    format!("{SECRET_CERT_ANNOTATION_PREFIX}{webhook}"),
                    (*secret).to_string(),
                )
            })
            .collect()
    });

    ObjectMeta {
        name: Some(name.to_string()),
        annotations,
        ..Default::default()
    }
}

/// Mutating configuration with `webhook -> namespace/secret` annotations.
pub fn mutating_config(
    name: &str,
    secrets: &[(&str, &str)],
    webhooks: &[(&str, WebhookClientConfig)],
) -> MutatingWebhookConfiguration {
    MutatingWebhookConfiguration {
        metadata: metadata(name, secrets),
        webhooks: Some(
            webhooks
                .iter()
                .map(|(webhook, client_config)| MutatingWebhook {
                    name: (*webhook).to_string(),
                    client_config: client_config.clone(),
                    admission_review_versions: vec!["v1".to_string()],
                    side_effects: "None".to_string(),
                    ..Default::default()
                })
                .collect(),
        ),
    }
}

/// Validating configuration with `webhook -> namespace/secret` annotations.
pub fn validating_config(
    name: &str,
    secrets: &[(&str, &str)],
    webhooks: &[(&str, WebhookClientConfig)],
) -> ValidatingWebhookConfiguration {
    ValidatingWebhookConfiguration {
        metadata: metadata(name, secrets),
        webhooks: Some(
            webhooks
                .iter()
                .map(|(webhook, client_config)| ValidatingWebhook {
                    name: (*webhook).to_string(),
                    client_config: client_config.clone(),
                    admission_review_versions: vec!["v1".to_string()],
                    side_effects: "None".to_string(),
                    ..Default::default()
                })
                .collect(),
        ),
    }
}

/// Secret reference shorthand.
pub fn secret_ref(namespace: &str, name: &str) -> SecretRef {
    SecretRef {
        namespace: namespace.to_string(),
        name: name.to_string(),
    }
}

// ============================================================================
// In-memory secret store
// ============================================================================

/// [`SecretStore`] keeping secrets in memory and counting calls.
#[derive(Default)]
pub struct InMemorySecretStore {
    secrets: Mutex<BTreeMap<SecretRef, Secret>>,
    gets: AtomicUsize,
    creates: AtomicUsize,
    updates: AtomicUsize,
}

impl InMemorySecretStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn insert(&self, secret: Secret) {
        let key = secret_ref(&secret.namespace().unwrap_or_default(), &secret.name_any());
        self.secrets.lock().unwrap().insert(key, secret);
    }

    pub fn secret(&self, namespace: &str, name: &str) -> Option<Secret> {
        self.secrets
            .lock()
            .unwrap()
            .get(&secret_ref(namespace, name))
            .cloned()
    }

    pub fn len(&self) -> usize {
        self.secrets.lock().unwrap().len()
    }

    pub fn gets(&self) -> usize {
        self.gets.load(Ordering::SeqCst)
    }

    pub fn creates(&self) -> usize {
        self.creates.load(Ordering::SeqCst)
    }

    pub fn updates(&self) -> usize {
        self.updates.load(Ordering::SeqCst)
    }

    pub fn writes(&self) -> usize {
        self.creates() + self.updates()
    }
}

#[async_trait]
impl SecretStore for InMemorySecretStore {
    async fn get(&self, secret_ref: &SecretRef) -> Result<Option<Secret>> {
        self.gets.fetch_add(1, Ordering::SeqCst);
        Ok(self.secrets.lock().unwrap().get(secret_ref).cloned())
    }

    async fn create(&self, secret: &Secret) -> Result<()> {
        self.creates.fetch_add(1, Ordering::SeqCst);
        self.insert(secret.clone());
        Ok(())
    }

    async fn update(&self, secret: &Secret) -> Result<()> {
        self.updates.fetch_add(1, Ordering::SeqCst);
        self.insert(secret.clone());
        Ok(())
    }
}

// ============================================================================
// Recording resource client
// ============================================================================

/// [`ResourceClient`] remembering every update.
#[derive(Default)]
pub struct RecordingResourceClient {
    updates: Mutex<Vec<WebhookConfigElement>>,
}

impl RecordingResourceClient {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn updates(&self) -> Vec<WebhookConfigElement> {
        self.updates.lock().unwrap().clone()
    }
}

#[async_trait]
impl ResourceClient for RecordingResourceClient {
    async fn update(&self, element: &WebhookConfigElement) -> Result<()> {
        // Same dispatch the real client performs.
        match element.kind() {
            crate::element::WebhookKind::Mutating => {
                element.as_mutating()?;
            }
            crate::element::WebhookKind::Validating => {
                element.as_validating()?;
            }
        }
        self.updates.lock().unwrap().push(element.clone());
        Ok(())
    }
}

// ============================================================================
// Fake provisioner
// ============================================================================

/// Deterministic material for a common name and generation.
pub fn fake_certs(common_name: &str, generation: usize) -> CertMaterial {
    CertMaterial {
        ca_cert: format!("-----CA {common_name} #{generation}-----\n").into_bytes(),
        cert: format!("-----CERT {common_name} #{generation}-----\n").into_bytes(),
        key: format!("-----KEY {common_name} #{generation}-----\n").into_bytes(),
    }
}

/// Provisioner factory returning [`fake_certs`] and counting provisioning calls.
///
/// With `rotate_ca` every call yields a new generation, otherwise generation 0.
#[derive(Clone, Default)]
pub struct FakeProvisioning {
    calls: Arc<AtomicUsize>,
    common_names: Arc<Mutex<Vec<String>>>,
    rotate_ca: bool,
    fail: bool,
}

struct FakeProvisioner {
    common_name: String,
    calls: Arc<AtomicUsize>,
    rotate_ca: bool,
    fail: bool,
}

impl CertProvisioner for FakeProvisioner {
    fn provision_serving_cert(&self) -> std::result::Result<CertMaterial, ProvisionError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(ProvisionError::KeyGenerationFailed("boom".to_string()));
        }
        let generation = if self.rotate_ca { call + 1 } else { 0 };
        Ok(fake_certs(&self.common_name, generation))
    }
}

impl FakeProvisioning {
    pub fn stable() -> Self {
        Self::default()
    }

    pub fn rotating() -> Self {
        Self {
            rotate_ca: true,
            ..Self::default()
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn common_names(&self) -> Vec<String> {
        self.common_names.lock().unwrap().clone()
    }

    pub fn factory(&self) -> ProvisionerFactory {
        let this = self.clone();
        Arc::new(move |common_name: &str| {
            this.common_names
                .lock()
                .unwrap()
                .push(common_name.to_string());
            Ok(Box::new(FakeProvisioner {
                common_name: common_name.to_string(),
                calls: this.calls.clone(),
                rotate_ca: this.rotate_ca,
                fail: this.fail,
            }) as Box<dyn CertProvisioner>)
        })
    }
}
