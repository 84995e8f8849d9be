pub mod extensions;
pub mod params;

use der::{Decode, DecodePem, Encode, EncodePem};
use extensions::{SubjectAltName, ToAndFromX509Extension};
use params::{CertificationRequestInfo, DistinguishedName, ExtensionParam, Validity};
use rand_core::RngCore;
use x509_cert::certificate::CertificateInner;
use x509_cert::name::Name;

use crate::error::{PrivCaError, Result};
use crate::issuer::Issuer;
use crate::key::{KeyPair, PublicKey};

/// Length of freshly drawn serial numbers, well under the 20-octet limit.
const SERIAL_NUMBER_LEN: usize = 16;

/// Draws a random, positive serial number with no leading zero octet.
pub fn random_serial_number() -> Vec<u8> {
    let mut serial = [0u8; SERIAL_NUMBER_LEN];
    rand_core::OsRng.fill_bytes(&mut serial);
    serial[0] &= 0x7f;
    if serial[0] == 0 {
        serial[0] = 0x01;
    }
    serial.to_vec()
}

/// Represents an X.509 certificate.
///
/// This struct provides methods to encode the certificate into DER or PEM formats.
#[derive(Debug, Clone)]
pub struct Certificate {
    /// The inner representation of the certificate.
    pub inner: CertificateInner,
}

impl Certificate {
    /// Encodes the certificate into DER format.
    pub fn to_der(&self) -> Result<Vec<u8>> {
        self.inner
            .to_der()
            .map_err(|e| PrivCaError::EncodingError(e.to_string()))
    }

    /// Encodes the certificate into PEM format.
    pub fn to_pem(&self) -> Result<String> {
        self.inner
            .to_pem(pkcs8::LineEnding::LF)
            .map_err(|e| PrivCaError::EncodingError(e.to_string()))
    }

    pub fn from_der(der: &[u8]) -> Result<Self> {
        Ok(Certificate {
            inner: CertificateInner::from_der(der)?,
        })
    }

    pub fn from_pem(pem: &str) -> Result<Self> {
        Ok(Certificate {
            inner: CertificateInner::from_pem(pem)?,
        })
    }

    pub fn subject(&self) -> &Name {
        &self.inner.tbs_certificate.subject
    }

    pub fn subject_common_name(&self) -> String {
        DistinguishedName::from_x509_name(self.subject()).common_name
    }

    /// Serial number as stored, including any leading zero octet.
    pub fn serial_number(&self) -> &[u8] {
        self.inner.tbs_certificate.serial_number.as_bytes()
    }

    pub fn public_key(&self) -> Result<PublicKey> {
        PublicKey::from_x509spki(&self.inner.tbs_certificate.subject_public_key_info)
    }

    /// Finds and decodes the extension of type `E`, if present.
    pub fn extension<E: ToAndFromX509Extension>(&self) -> Result<Option<E>> {
        self.inner
            .tbs_certificate
            .extensions
            .iter()
            .flatten()
            .find(|ext| ext.extn_id == E::OID)
            .map(|ext| ExtensionParam::from_x509(ext).to_extension())
            .transpose()
    }

    pub fn subject_alt_name(&self) -> Result<Option<SubjectAltName>> {
        self.extension()
    }

    /// Checks that this certificate was signed by `issuer`'s key.
    pub fn verify_signed_by(&self, issuer: &Certificate) -> Result<()> {
        if self.inner.tbs_certificate.issuer != *issuer.subject() {
            return Err(PrivCaError::CertificateError(
                "issuer name does not match the CA subject".to_string(),
            ));
        }
        let tbs = self.inner.tbs_certificate.to_der()?;
        issuer
            .public_key()?
            .verify(&tbs, self.inner.signature.raw_bytes())
    }

    /// Creates a new self-signed certificate.
    ///
    /// # Arguments
    /// * `cert_info` - The certification request information.
    /// * `key` - The key pair used to sign the certificate.
    /// * `validity` - The validity window of the certificate.
    pub fn new_self_signed(
        cert_info: &CertificationRequestInfo,
        key: &KeyPair,
        validity: Validity,
    ) -> Result<Self> {
        // For self-signed certificates, the issuer is the same as the subject
        let self_issuer = SelfIssuer {
            name: cert_info.subject.clone(),
            key,
        };

        self_issuer.issue(cert_info, &random_serial_number(), validity)
    }
}

// Helper struct for self-signed certificates
struct SelfIssuer<'a> {
    name: DistinguishedName,
    key: &'a KeyPair,
}

impl Issuer for SelfIssuer<'_> {
    fn issuer_name(&self) -> Result<Name> {
        self.name.as_x509_name()
    }

    fn signing_key(&self) -> &KeyPair {
        self.key
    }
}

/// A CA certificate together with the key that signs on its behalf.
#[derive(Debug, Clone)]
pub struct CertificateWithPrivateKey {
    pub cert: Certificate,
    pub key: KeyPair,
}

impl CertificateWithPrivateKey {
    /// Pairs a certificate with its key, rejecting mismatched halves.
    pub fn new(cert: Certificate, key: KeyPair) -> Result<Self> {
        if cert.public_key()? != key.public_key() {
            return Err(PrivCaError::InvalidInput(
                "private key does not match the certificate".to_string(),
            ));
        }
        Ok(Self { cert, key })
    }
}

impl Issuer for CertificateWithPrivateKey {
    fn issuer_name(&self) -> Result<Name> {
        // The name of the issuer is the subject of the certificate
        Ok(self.cert.subject().clone())
    }

    fn signing_key(&self) -> &KeyPair {
        &self.key
    }
}
