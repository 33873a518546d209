// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Uniform view over mutating and validating webhook configurations.
//!
//! The sync algorithm is written once against [`WebhookConfigElement`]; the two
//! concrete Kubernetes resources only appear at construction time and when the
//! element is persisted again (see [`WebhookConfigElement::as_mutating`] and
//! [`WebhookConfigElement::as_validating`]).
//!
//! # Example
//!
//! ```rust
//! use k8s_openapi::api::admissionregistration::v1::MutatingWebhookConfiguration;
//! use webhook_certs::element::{WebhookConfigElement, WebhookKind};
//!
//! let element = WebhookConfigElement::from(MutatingWebhookConfiguration::default());
//! assert_eq!(element.kind(), WebhookKind::Mutating);
//!
//! let snapshot = element.clone();
//! assert!(element.equals(&snapshot));
//! ```

use crate::constants::{
    ADMISSION_API_VERSION, KIND_MUTATING_WEBHOOK_CONFIGURATION,
    KIND_VALIDATING_WEBHOOK_CONFIGURATION,
};
use crate::errors::{Result, SyncError};
use k8s_openapi::api::admissionregistration::v1::{
    MutatingWebhookConfiguration, ValidatingWebhookConfiguration, WebhookClientConfig,
};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::{ObjectMeta, OwnerReference};
use kube::api::DynamicObject;
use kube::ResourceExt;
use std::collections::BTreeMap;
use std::fmt;

/// Variant tag of a webhook configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WebhookKind {
    /// `MutatingWebhookConfiguration`
    Mutating,
    /// `ValidatingWebhookConfiguration`
    Validating,
}

impl WebhookKind {
    /// Short lowercase name (`mutating` / `validating`)
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Mutating => "mutating",
            Self::Validating => "validating",
        }
    }

    /// Kubernetes kind name
    #[must_use]
    pub fn kind_name(self) -> &'static str {
        match self {
            Self::Mutating => KIND_MUTATING_WEBHOOK_CONFIGURATION,
            Self::Validating => KIND_VALIDATING_WEBHOOK_CONFIGURATION,
        }
    }
}

impl fmt::Display for WebhookKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Read-only view of one webhook entry.
#[derive(Debug, Clone, Copy)]
pub struct WebhookEntry<'a> {
    /// Entry name, unique within its configuration
    pub name: &'a str,
    /// Client connection config including the CA bundle
    pub client_config: &'a WebhookClientConfig,
}

/// Mutable view of one webhook entry.
///
/// Writes through `client_config` land directly in the owning configuration.
#[derive(Debug)]
pub struct WebhookEntryMut<'a> {
    /// Entry name, unique within its configuration
    pub name: &'a str,
    /// Client connection config including the CA bundle
    pub client_config: &'a mut WebhookClientConfig,
}

/// A mutating or validating webhook configuration.
#[derive(Debug, Clone, PartialEq)]
pub enum WebhookConfigElement {
    /// Wraps a `MutatingWebhookConfiguration`
    Mutating(MutatingWebhookConfiguration),
    /// Wraps a `ValidatingWebhookConfiguration`
    Validating(ValidatingWebhookConfiguration),
}

impl WebhookConfigElement {
    /// Variant tag, fixed at construction.
    #[must_use]
    pub fn kind(&self) -> WebhookKind {
        match self {
            Self::Mutating(_) => WebhookKind::Mutating,
            Self::Validating(_) => WebhookKind::Validating,
        }
    }

    /// Object metadata of the wrapped resource.
    #[must_use]
    pub fn meta(&self) -> &ObjectMeta {
        match self {
            Self::Mutating(config) => &config.metadata,
            Self::Validating(config) => &config.metadata,
        }
    }

    /// Resource name (cluster-scoped, so this is the full identity).
    #[must_use]
    pub fn name(&self) -> String {
        match self {
            Self::Mutating(config) => config.name_any(),
            Self::Validating(config) => config.name_any(),
        }
    }

    /// Annotations, or `None` when the resource carries none at all.
    #[must_use]
    pub fn annotations(&self) -> Option<&BTreeMap<String, String>> {
        self.meta().annotations.as_ref()
    }

    /// Webhook entries in declaration order.
    #[must_use]
    pub fn entries(&self) -> Vec<WebhookEntry<'_>> {
        match self {
            Self::Mutating(config) => config
                .webhooks
                .iter()
                .flatten()
                .map(|webhook| WebhookEntry {
                    name: webhook.name.as_str(),
                    client_config: &webhook.client_config,
                })
                .collect(),
            Self::Validating(config) => config
                .webhooks
                .iter()
                .flatten()
                .map(|webhook| WebhookEntry {
                    name: webhook.name.as_str(),
                    client_config: &webhook.client_config,
                })
                .collect(),
        }
    }

    /// Mutable webhook entries in declaration order.
    pub fn entries_mut(&mut self) -> Vec<WebhookEntryMut<'_>> {
        match self {
            Self::Mutating(config) => config
                .webhooks
                .iter_mut()
                .flatten()
                .map(|webhook| WebhookEntryMut {
                    name: webhook.name.as_str(),
                    client_config: &mut webhook.client_config,
                })
                .collect(),
            Self::Validating(config) => config
                .webhooks
                .iter_mut()
                .flatten()
                .map(|webhook| WebhookEntryMut {
                    name: webhook.name.as_str(),
                    client_config: &mut webhook.client_config,
                })
                .collect(),
        }
    }

    /// Deep structural equality. Elements of different variants are never equal.
    #[must_use]
    pub fn equals(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Mutating(a), Self::Mutating(b)) => a == b,
            (Self::Validating(a), Self::Validating(b)) => a == b,
            _ => false,
        }
    }

    /// Downcast to the mutating configuration.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::WrongVariant`] if this is a validating configuration.
    pub fn as_mutating(&self) -> Result<&MutatingWebhookConfiguration> {
        match self {
            Self::Mutating(config) => Ok(config),
            Self::Validating(_) => Err(SyncError::WrongVariant {
                expected: WebhookKind::Mutating.as_str(),
                found: WebhookKind::Validating.as_str(),
            }),
        }
    }

    /// Downcast to the validating configuration.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::WrongVariant`] if this is a mutating configuration.
    pub fn as_validating(&self) -> Result<&ValidatingWebhookConfiguration> {
        match self {
            Self::Validating(config) => Ok(config),
            Self::Mutating(_) => Err(SyncError::WrongVariant {
                expected: WebhookKind::Validating.as_str(),
                found: WebhookKind::Mutating.as_str(),
            }),
        }
    }

    /// Owner reference pointing at this configuration, if it has a uid.
    ///
    /// Objects that were never persisted (no uid) cannot own anything.
    #[must_use]
    pub fn owner_reference(&self) -> Option<OwnerReference> {
        let meta = self.meta();
        let uid = meta.uid.clone()?;
        Some(OwnerReference {
            api_version: ADMISSION_API_VERSION.to_string(),
            kind: self.kind().kind_name().to_string(),
            name: self.name(),
            uid,
            controller: Some(true),
            block_owner_deletion: Some(false),
        })
    }
}

impl From<MutatingWebhookConfiguration> for WebhookConfigElement {
    fn from(config: MutatingWebhookConfiguration) -> Self {
        Self::Mutating(config)
    }
}

impl From<ValidatingWebhookConfiguration> for WebhookConfigElement {
    fn from(config: ValidatingWebhookConfiguration) -> Self {
        Self::Validating(config)
    }
}

impl TryFrom<&DynamicObject> for WebhookConfigElement {
    type Error = SyncError;

    fn try_from(obj: &DynamicObject) -> Result<Self> {
        let Some(types) = obj.types.as_ref() else {
            return Err(SyncError::UnsupportedType {
                kind: "<unknown>".to_string(),
            });
        };

        if types.api_version != ADMISSION_API_VERSION {
            return Err(SyncError::UnsupportedType {
                kind: format!("{}/{}", types.api_version, types.kind),
            });
        }

        let decode_error = |source| SyncError::InvalidObject {
            kind: types.kind.clone(),
            source,
        };

        match types.kind.as_str() {
            KIND_MUTATING_WEBHOOK_CONFIGURATION => {
                let value = serde_json::to_value(obj).map_err(decode_error)?;
                serde_json::from_value::<MutatingWebhookConfiguration>(value)
                    .map(Self::Mutating)
                    .map_err(decode_error)
            }
            KIND_VALIDATING_WEBHOOK_CONFIGURATION => {
                let value = serde_json::to_value(obj).map_err(decode_error)?;
                serde_json::from_value::<ValidatingWebhookConfiguration>(value)
                    .map(Self::Validating)
                    .map_err(decode_error)
            }
            other => Err(SyncError::UnsupportedType {
                kind: format!("{}/{}", types.api_version, other),
            }),
        }
    }
}

impl TryFrom<DynamicObject> for WebhookConfigElement {
    type Error = SyncError;

    fn try_from(obj: DynamicObject) -> Result<Self> {
        Self::try_from(&obj)
    }
}

#[cfg(test)]
#[path = "element_tests.rs"]
mod element_tests;
