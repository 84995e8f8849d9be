//! Cryptographic capabilities used by the CA manager and the TLS issuer.
//!
//! The managers only sequence steps and persist what these calls return;
//! every key, request and certificate comes from a [`CryptoBackend`].

use tracing::debug;

use crate::cert::extensions::{ExtendedKeyUsageOption, SubjectAltName};
use crate::cert::params::{CertificationRequestInfo, DistinguishedName, ExtensionParam, Validity};
use crate::cert::{Certificate, CertificateWithPrivateKey};
use crate::csr::CertificateSigningRequest;
use crate::error::Result;
use crate::issuer::Issuer;
use crate::key::KeyPair;

pub trait CryptoBackend {
    /// Generates an RSA key pair of `bits` bits.
    fn generate_key(&self, bits: usize) -> Result<KeyPair>;

    /// Builds a self-signed CA certificate with subject `CN=<common_name>`.
    fn self_signed_ca(
        &self,
        common_name: &str,
        key: &KeyPair,
        validity: Validity,
    ) -> Result<Certificate>;

    /// Builds a CSR with subject `CN=<common_name>` requesting `san`.
    fn signing_request(
        &self,
        common_name: &str,
        san: &SubjectAltName,
        key: &KeyPair,
    ) -> Result<CertificateSigningRequest>;

    /// Signs `csr` as a TLS server certificate issued by `ca`.
    fn sign_request(
        &self,
        csr: &CertificateSigningRequest,
        ca: &CertificateWithPrivateKey,
        serial_number: &[u8],
        validity: Validity,
    ) -> Result<Certificate>;
}

/// Backend built on the RustCrypto crates.
#[derive(Debug, Clone, Copy, Default)]
pub struct RustCryptoBackend;

impl CryptoBackend for RustCryptoBackend {
    fn generate_key(&self, bits: usize) -> Result<KeyPair> {
        debug!(bits, "generating RSA key");
        KeyPair::generate_rsa(bits)
    }

    fn self_signed_ca(
        &self,
        common_name: &str,
        key: &KeyPair,
        validity: Validity,
    ) -> Result<Certificate> {
        let cert_info = CertificationRequestInfo::builder()
            .subject(DistinguishedName::from_common_name(common_name))
            .subject_public_key(key.public_key())
            .is_ca(true)
            .build();
        Certificate::new_self_signed(&cert_info, key, validity)
    }

    fn signing_request(
        &self,
        common_name: &str,
        san: &SubjectAltName,
        key: &KeyPair,
    ) -> Result<CertificateSigningRequest> {
        let mut extensions = Vec::new();
        if !san.names.is_empty() {
            extensions.push(ExtensionParam::from_extension(san, false)?);
        }
        CertificateSigningRequest::new(
            &DistinguishedName::from_common_name(common_name),
            key,
            &extensions,
        )
    }

    fn sign_request(
        &self,
        csr: &CertificateSigningRequest,
        ca: &CertificateWithPrivateKey,
        serial_number: &[u8],
        validity: Validity,
    ) -> Result<Certificate> {
        let cert_info = csr.to_cert_info(vec![ExtendedKeyUsageOption::ServerAuth])?;
        debug!(serial = %hex::encode_upper(serial_number), "signing certificate request");
        ca.issue(&cert_info, serial_number, validity)
    }
}
