// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Certificate material and its secret representation.
//!
//! One [`CertMaterial`] is stored per webhook entry in a secret with three fixed
//! data keys: `ca-cert.pem`, `cert.pem` and `key.pem`.

use crate::constants::{
    CA_CERT_KEY, MANAGED_BY_LABEL, MANAGED_BY_VALUE, SECRET_CERT_ANNOTATION_PREFIX,
    SERVER_CERT_KEY, SERVER_KEY_KEY,
};
use crate::errors::{Result, SyncError};
use k8s_openapi::api::core::v1::Secret;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::{ObjectMeta, OwnerReference};
use k8s_openapi::ByteString;
use std::collections::BTreeMap;
use std::fmt;

/// One certificate chain for one webhook's serving endpoint.
#[derive(Clone, PartialEq, Eq)]
pub struct CertMaterial {
    /// PEM-encoded CA certificate
    pub ca_cert: Vec<u8>,
    /// PEM-encoded serving certificate
    pub cert: Vec<u8>,
    /// PEM-encoded serving private key
    pub key: Vec<u8>,
}

// Keep private keys out of logs.
impl fmt::Debug for CertMaterial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CertMaterial")
            .field("ca_cert_len", &self.ca_cert.len())
            .field("cert_len", &self.cert.len())
            .field("key", &"<redacted>")
            .finish()
    }
}

/// Identity of the secret holding a webhook's certificate material.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SecretRef {
    /// Secret namespace
    pub namespace: String,
    /// Secret name
    pub name: String,
}

impl SecretRef {
    /// Parse a `namespace/name` annotation value.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::InvalidSecretReference`] unless the value has exactly
    /// two non-empty segments.
    pub fn parse(annotation: &str, value: &str) -> Result<Self> {
        let invalid = || SyncError::InvalidSecretReference {
            annotation: annotation.to_string(),
            value: value.to_string(),
        };

        let (namespace, name) = value.trim().split_once('/').ok_or_else(invalid)?;
        if namespace.is_empty() || name.is_empty() || name.contains('/') {
            return Err(invalid());
        }

        Ok(Self {
            namespace: namespace.to_string(),
            name: name.to_string(),
        })
    }
}

impl fmt::Display for SecretRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.namespace, self.name)
    }
}

/// Build the webhook-name to secret map from resource annotations.
///
/// Keys without [`SECRET_CERT_ANNOTATION_PREFIX`] are ignored. Annotations are a
/// map, so every webhook name appears at most once.
///
/// # Errors
///
/// Returns [`SyncError::InvalidSecretReference`] for a malformed value.
pub fn secrets_from_annotations(
    annotations: &BTreeMap<String, String>,
) -> Result<BTreeMap<String, SecretRef>> {
    annotations
        .iter()
        .filter_map(|(key, value)| {
            key.strip_prefix(SECRET_CERT_ANNOTATION_PREFIX)
                .map(|webhook| (key, webhook, value))
        })
        .map(|(key, webhook, value)| Ok((webhook.to_string(), SecretRef::parse(key, value)?)))
        .collect()
}

/// Decode certificate material from a secret.
///
/// # Errors
///
/// Returns [`SyncError::MalformedRecord`] naming the first missing key.
pub fn secret_to_certs(secret: &Secret, secret_ref: &SecretRef) -> Result<CertMaterial> {
    let empty = BTreeMap::new();
    let data = secret.data.as_ref().unwrap_or(&empty);

    let field = |key: &'static str| {
        data.get(key)
            .map(|value| value.0.clone())
            .ok_or_else(|| SyncError::MalformedRecord {
                namespace: secret_ref.namespace.clone(),
                name: secret_ref.name.clone(),
                key,
            })
    };

    Ok(CertMaterial {
        ca_cert: field(CA_CERT_KEY)?,
        cert: field(SERVER_CERT_KEY)?,
        key: field(SERVER_KEY_KEY)?,
    })
}

/// Data section of a secret holding `certs`.
#[must_use]
pub fn certs_to_data(certs: &CertMaterial) -> BTreeMap<String, ByteString> {
    BTreeMap::from([
        (CA_CERT_KEY.to_string(), ByteString(certs.ca_cert.clone())),
        (SERVER_CERT_KEY.to_string(), ByteString(certs.cert.clone())),
        (SERVER_KEY_KEY.to_string(), ByteString(certs.key.clone())),
    ])
}

/// Build a new secret holding `certs`.
#[must_use]
pub fn certs_to_secret(
    certs: &CertMaterial,
    secret_ref: &SecretRef,
    owner: Option<OwnerReference>,
) -> Secret {
    Secret {
        metadata: ObjectMeta {
            namespace: Some(secret_ref.namespace.clone()),
            name: Some(secret_ref.name.clone()),
            labels: Some(BTreeMap::from([(
                MANAGED_BY_LABEL.to_string(),
                MANAGED_BY_VALUE.to_string(),
            )])),
            owner_references: owner.map(|owner| vec![owner]),
            ..Default::default()
        },
        data: Some(certs_to_data(certs)),
        ..Default::default()
    }
}

#[cfg(test)]
#[path = "certs_tests.rs"]
mod certs_tests;
