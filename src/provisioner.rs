// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Certificate provisioning for webhook serving endpoints.
//!
//! A [`CertProvisioner`] issues a fresh CA, serving certificate and key for one
//! common name. The controller obtains one per webhook entry through a
//! [`ProvisionerFactory`], which lets tests and alternative PKIs plug in without
//! touching the sync logic.
//!
//! The default [`SelfSignedCertProvisioner`] generates a new self-signed CA for
//! every call and signs an ECDSA P-256 serving certificate with it.

use crate::certs::CertMaterial;
use crate::constants::{DEFAULT_CERT_VALIDITY_DAYS, SELF_SIGNED_CA_COMMON_NAME};
use crate::errors::ProvisionError;
use rcgen::{
    string::Ia5String, BasicConstraints, CertificateParams, DistinguishedName, DnType, DnValue,
    ExtendedKeyUsagePurpose, IsCa, Issuer, KeyPair, KeyUsagePurpose, SanType,
};
use std::sync::Arc;

/// Issues serving certificates for a single common name.
pub trait CertProvisioner: Send + Sync {
    /// Provision a fresh CA, serving certificate and key.
    ///
    /// # Errors
    ///
    /// Returns a [`ProvisionError`] if key generation or signing fails.
    fn provision_serving_cert(&self) -> Result<CertMaterial, ProvisionError>;
}

/// Builds a [`CertProvisioner`] for a common name.
pub type ProvisionerFactory =
    Arc<dyn Fn(&str) -> Result<Box<dyn CertProvisioner>, ProvisionError> + Send + Sync>;

/// Common name for a webhook backed by an in-cluster service.
#[must_use]
pub fn service_to_common_name(namespace: &str, name: &str) -> String {
    format!("{name}.{namespace}.svc")
}

/// Compute certificate validity period from now
fn compute_validity(days: i64) -> (::time::OffsetDateTime, ::time::OffsetDateTime) {
    let now = ::time::OffsetDateTime::now_utc();
    let not_after = now + ::time::Duration::days(days);
    (now, not_after)
}

/// Provisioner that signs serving certificates with a freshly generated CA.
#[derive(Debug, Clone)]
pub struct SelfSignedCertProvisioner {
    /// Subject common name and DNS/IP SAN of the serving certificate
    pub common_name: String,
    /// Validity of both the CA and the serving certificate, in days
    pub validity_days: i64,
}

impl SelfSignedCertProvisioner {
    /// Create a provisioner with the default one-year validity.
    #[must_use]
    pub fn new(common_name: impl Into<String>) -> Self {
        Self {
            common_name: common_name.into(),
            validity_days: DEFAULT_CERT_VALIDITY_DAYS,
        }
    }

    /// Factory producing self-signed provisioners with the given validity.
    #[must_use]
    pub fn factory(validity_days: i64) -> ProvisionerFactory {
        Arc::new(move |common_name: &str| {
            Ok(Box::new(SelfSignedCertProvisioner {
                common_name: common_name.to_string(),
                validity_days,
            }) as Box<dyn CertProvisioner>)
        })
    }

    fn subject_alt_name(&self) -> Result<SanType, ProvisionError> {
        if let Ok(ip) = self.common_name.parse::<std::net::IpAddr>() {
            return Ok(SanType::IpAddress(ip));
        }
        Ia5String::try_from(self.common_name.clone())
            .map(SanType::DnsName)
            .map_err(|e| ProvisionError::InvalidCommonName {
                common_name: self.common_name.clone(),
                reason: e.to_string(),
            })
    }

    fn generate_ca(&self) -> Result<(String, KeyPair), ProvisionError> {
        let mut params = CertificateParams::default();

        let mut dn = DistinguishedName::new();
        dn.push(
            DnType::CommonName,
            DnValue::Utf8String(SELF_SIGNED_CA_COMMON_NAME.to_string()),
        );
        params.distinguished_name = dn;

        params.is_ca = IsCa::Ca(BasicConstraints::Constrained(0));
        params.key_usages = vec![
            KeyUsagePurpose::KeyCertSign,
            KeyUsagePurpose::CrlSign,
            KeyUsagePurpose::DigitalSignature,
        ];

        let (not_before, not_after) = compute_validity(self.validity_days);
        params.not_before = not_before;
        params.not_after = not_after;

        let key_pair = KeyPair::generate().map_err(|e| {
            ProvisionError::KeyGenerationFailed(format!("failed to generate CA key: {e}"))
        })?;

        let cert = params.self_signed(&key_pair).map_err(|e| {
            ProvisionError::CertificateGenerationFailed(format!("failed to create CA cert: {e}"))
        })?;

        Ok((cert.pem(), key_pair))
    }
}

impl CertProvisioner for SelfSignedCertProvisioner {
    fn provision_serving_cert(&self) -> Result<CertMaterial, ProvisionError> {
        let (ca_cert_pem, ca_key) = self.generate_ca()?;

        let mut params = CertificateParams::default();
        let mut dn = DistinguishedName::new();
        dn.push(
            DnType::CommonName,
            DnValue::Utf8String(self.common_name.clone()),
        );
        params.distinguished_name = dn;

        params.is_ca = IsCa::NoCa;
        params.key_usages = vec![
            KeyUsagePurpose::DigitalSignature,
            KeyUsagePurpose::KeyEncipherment,
        ];
        params.extended_key_usages = vec![ExtendedKeyUsagePurpose::ServerAuth];
        params.subject_alt_names = vec![self.subject_alt_name()?];

        let (not_before, not_after) = compute_validity(self.validity_days);
        params.not_before = not_before;
        params.not_after = not_after;

        let server_key = KeyPair::generate().map_err(|e| {
            ProvisionError::KeyGenerationFailed(format!("failed to generate server key: {e}"))
        })?;

        let issuer = Issuer::from_ca_cert_pem(&ca_cert_pem, &ca_key).map_err(|e| {
            ProvisionError::CertificateGenerationFailed(format!("failed to create issuer: {e}"))
        })?;

        let server_cert = params.signed_by(&server_key, &issuer).map_err(|e| {
            ProvisionError::CertificateGenerationFailed(format!("failed to sign server cert: {e}"))
        })?;

        Ok(CertMaterial {
            ca_cert: ca_cert_pem.into_bytes(),
            cert: server_cert.pem().into_bytes(),
            key: server_key.serialize_pem().into_bytes(),
        })
    }
}

#[cfg(test)]
#[path = "provisioner_tests.rs"]
mod provisioner_tests;
