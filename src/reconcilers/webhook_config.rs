// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Certificate sync for mutating and validating webhook configurations.
//!
//! One pass over a configuration:
//!
//! 1. Build a [`CertsHandler`] for the configuration
//! 2. Clone the configuration; only the clone is mutated
//! 3. For every managed webhook entry, in declaration order:
//!    - read the stored material, provisioning it if the secret does not exist
//!    - re-provision if the material fails the validity policy
//!    - append the CA to the entry's `caBundle` unless already present
//! 4. Persist the clone only if it differs from the original
//!
//! The first error aborts the pass. Secrets written before the failure stay
//! written; the next pass finds them and completes the CA merge.

use crate::certs_handler::{CertsHandler, CertsHandlerFactory};
use crate::element::{WebhookConfigElement, WebhookEntryMut, WebhookKind};
use crate::errors::{Result, SyncError};
use crate::metrics;
use crate::resource_client::ResourceClient;
use k8s_openapi::ByteString;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Result of a successful sync pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
    /// Nothing changed; the configuration was not written
    Unchanged,
    /// The configuration was updated with new CA bundle content
    Updated,
}

/// Keeps webhook serving certificates and CA bundles in sync.
#[derive(Clone)]
pub struct WebhookCertSyncer {
    handler_factory: Arc<dyn CertsHandlerFactory>,
    resource_client: Arc<dyn ResourceClient>,
}

impl WebhookCertSyncer {
    /// Create a syncer.
    #[must_use]
    pub fn new(
        handler_factory: Arc<dyn CertsHandlerFactory>,
        resource_client: Arc<dyn ResourceClient>,
    ) -> Self {
        Self {
            handler_factory,
            resource_client,
        }
    }

    /// Run one sync pass over `element`.
    ///
    /// # Errors
    ///
    /// Returns the first error from handler construction, any managed entry, or
    /// the final update. Nothing is persisted to the configuration on error.
    pub async fn sync(&self, element: &WebhookConfigElement) -> Result<SyncOutcome> {
        let handler = self.handler_factory.new_handler(element)?;
        let kind = element.kind();

        let mut desired = element.clone();
        for entry in desired.entries_mut() {
            sync_secret_with_webhook(handler.as_ref(), entry, kind).await?;
        }

        if element.equals(&desired) {
            debug!(kind = %kind, name = %element.name(), "Webhook configuration up to date");
            return Ok(SyncOutcome::Unchanged);
        }

        self.resource_client.update(&desired).await?;
        info!(kind = %kind, name = %element.name(), "Updated webhook CA bundles");
        Ok(SyncOutcome::Updated)
    }
}

/// Reconcile one entry against its secret.
///
/// Returns `true` if the CA was appended to the entry's bundle.
async fn sync_secret_with_webhook(
    handler: &dyn CertsHandler,
    entry: WebhookEntryMut<'_>,
    kind: WebhookKind,
) -> Result<bool> {
    let WebhookEntryMut {
        name: webhook,
        client_config,
    } = entry;

    if handler.skip(webhook) {
        return Ok(false);
    }

    let mut certs = match handler.read(webhook).await {
        Ok(certs) => certs,
        Err(SyncError::RecordNotFound { namespace, name }) => {
            debug!(
                webhook = %webhook,
                secret = %format!("{namespace}/{name}"),
                "No certificate secret yet, provisioning"
            );
            handler.write(webhook).await?
        }
        Err(e) => return Err(e),
    };

    if !handler.is_valid(&certs) {
        info!(webhook = %webhook, "Certificate material rejected, re-provisioning");
        certs = handler.write(webhook).await?;
    }

    let merged = merge_ca_bundle(&mut client_config.ca_bundle, &certs.ca_cert);
    if merged {
        metrics::record_ca_bundle_updated(kind.kind_name());
        debug!(webhook = %webhook, "Appended CA to bundle");
    }
    Ok(merged)
}

/// Append `ca_cert` to `bundle` unless it already occurs in it.
///
/// An absent bundle is only created when something is appended.
pub fn merge_ca_bundle(bundle: &mut Option<ByteString>, ca_cert: &[u8]) -> bool {
    let existing = bundle.as_ref().map_or(&[][..], |b| b.0.as_slice());
    if contains_subslice(existing, ca_cert) {
        return false;
    }
    bundle
        .get_or_insert_with(|| ByteString(Vec::new()))
        .0
        .extend_from_slice(ca_cert);
    true
}

fn contains_subslice(haystack: &[u8], needle: &[u8]) -> bool {
    needle.is_empty() || haystack.windows(needle.len()).any(|window| window == needle)
}

/// Controller entry point: sync `element` and record metrics for the pass.
///
/// # Errors
///
/// Propagates any [`SyncError`] from [`WebhookCertSyncer::sync`].
pub async fn reconcile_webhook_config(
    syncer: &WebhookCertSyncer,
    element: &WebhookConfigElement,
) -> Result<SyncOutcome> {
    let kind = element.kind().kind_name();
    let start = Instant::now();

    match syncer.sync(element).await {
        Ok(SyncOutcome::Updated) => {
            metrics::record_reconciliation_success(kind, start.elapsed());
            Ok(SyncOutcome::Updated)
        }
        Ok(SyncOutcome::Unchanged) => {
            metrics::record_reconciliation_unchanged(kind, start.elapsed());
            Ok(SyncOutcome::Unchanged)
        }
        Err(e) => {
            metrics::record_reconciliation_error(kind, start.elapsed());
            metrics::record_error(kind, e.metric_label());
            warn!(
                kind = %kind,
                name = %element.name(),
                error = %e,
                "Webhook certificate sync failed"
            );
            Err(e)
        }
    }
}
