// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Validity policies for stored certificate material.
//!
//! Material that fails the configured [`CertValidator`] is re-provisioned during
//! sync. The default policy is [`AcceptAll`]; [`X509Validator`] is opt-in.

use crate::certs::CertMaterial;
use crate::constants::ROTATION_THRESHOLD;
use tracing::debug;
use x509_parser::prelude::*;

/// Decides whether stored certificate material can keep serving.
///
/// A complete policy verifies that the key matches the certificate, that the
/// certificate chains to the CA, and that its subject or SANs match the host
/// the webhook is reached on.
pub trait CertValidator: Send + Sync {
    /// `true` if `certs` can be used as is.
    fn is_valid(&self, certs: &CertMaterial) -> bool;
}

/// Accepts any stored material.
#[derive(Debug, Clone, Copy, Default)]
pub struct AcceptAll;

impl CertValidator for AcceptAll {
    fn is_valid(&self, _certs: &CertMaterial) -> bool {
        true
    }
}

/// Parses the stored PEM material and checks it structurally.
///
/// Rejects material that does not parse, whose serving certificate is outside
/// its validity window or past the rotation threshold, whose signature does
/// not verify against the stored CA, or whose key does not belong to the
/// certificate.
#[derive(Debug, Clone, Copy)]
pub struct X509Validator {
    /// Fraction of lifetime after which the certificate is treated as invalid
    pub rotation_threshold: f64,
}

impl Default for X509Validator {
    fn default() -> Self {
        Self {
            rotation_threshold: ROTATION_THRESHOLD,
        }
    }
}

impl X509Validator {
    fn check(&self, certs: &CertMaterial, now: i64) -> Result<(), String> {
        let ca_pem = ::pem::parse(&certs.ca_cert).map_err(|e| format!("CA PEM: {e}"))?;
        let cert_pem = ::pem::parse(&certs.cert).map_err(|e| format!("cert PEM: {e}"))?;

        let (_, ca) = X509Certificate::from_der(ca_pem.contents())
            .map_err(|e| format!("CA certificate: {e}"))?;
        let (_, cert) = X509Certificate::from_der(cert_pem.contents())
            .map_err(|e| format!("certificate: {e}"))?;

        if cert.issuer().as_raw() != ca.subject().as_raw() {
            return Err("certificate is not issued by the stored CA".to_string());
        }
        cert.verify_signature(Some(ca.public_key()))
            .map_err(|e| format!("certificate does not chain to the stored CA: {e}"))?;

        let not_before = cert.validity().not_before.timestamp();
        let not_after = cert.validity().not_after.timestamp();
        if now < not_before || now >= not_after {
            return Err("certificate is outside its validity window".to_string());
        }

        #[allow(clippy::cast_precision_loss)]
        let elapsed = (now - not_before) as f64 / (not_after - not_before).max(1) as f64;
        if elapsed >= self.rotation_threshold {
            return Err(format!("certificate is {:.0}% through its lifetime", elapsed * 100.0));
        }

        let key_pem = std::str::from_utf8(&certs.key).map_err(|e| format!("key: {e}"))?;
        let key = rcgen::KeyPair::from_pem(key_pem).map_err(|e| format!("key: {e}"))?;
        if rcgen::PublicKeyData::subject_public_key_info(&key) != cert.public_key().raw {
            return Err("key does not match certificate".to_string());
        }

        Ok(())
    }
}

impl CertValidator for X509Validator {
    fn is_valid(&self, certs: &CertMaterial) -> bool {
        let now = ::time::OffsetDateTime::now_utc().unix_timestamp();
        match self.check(certs, now) {
            Ok(()) => true,
            Err(reason) => {
                debug!(reason = %reason, "Stored certificate material rejected");
                false
            }
        }
    }
}

#[cfg(test)]
#[path = "validity_tests.rs"]
mod validity_tests;
