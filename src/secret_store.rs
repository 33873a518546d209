// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Key-value secret storage used to persist certificate material.

use crate::certs::SecretRef;
use crate::errors::Result;
use async_trait::async_trait;
use k8s_openapi::api::core::v1::Secret;
use kube::api::PostParams;
use kube::{Api, Client, ResourceExt};

/// Read and write access to namespaced secrets.
#[async_trait]
pub trait SecretStore: Send + Sync {
    /// Fetch a secret, `None` if it does not exist.
    async fn get(&self, secret_ref: &SecretRef) -> Result<Option<Secret>>;

    /// Create a new secret.
    async fn create(&self, secret: &Secret) -> Result<()>;

    /// Replace an existing secret.
    async fn update(&self, secret: &Secret) -> Result<()>;
}

/// [`SecretStore`] backed by the Kubernetes API.
#[derive(Clone)]
pub struct KubeSecretStore {
    client: Client,
}

impl KubeSecretStore {
    /// Create a store using `client`.
    #[must_use]
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    fn api(&self, namespace: &str) -> Api<Secret> {
        Api::namespaced(self.client.clone(), namespace)
    }
}

#[async_trait]
impl SecretStore for KubeSecretStore {
    async fn get(&self, secret_ref: &SecretRef) -> Result<Option<Secret>> {
        Ok(self
            .api(&secret_ref.namespace)
            .get_opt(&secret_ref.name)
            .await?)
    }

    async fn create(&self, secret: &Secret) -> Result<()> {
        let namespace = secret.namespace().unwrap_or_default();
        self.api(&namespace)
            .create(&PostParams::default(), secret)
            .await?;
        Ok(())
    }

    async fn update(&self, secret: &Secret) -> Result<()> {
        let namespace = secret.namespace().unwrap_or_default();
        self.api(&namespace)
            .replace(&secret.name_any(), &PostParams::default(), secret)
            .await?;
        Ok(())
    }
}
