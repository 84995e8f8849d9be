//! PKCS#10 certification requests.
//!
//! A request carries the subject, the subject's public key and an
//! `extensionRequest` attribute (PKCS#9) with the extensions the subject asks
//! the CA to include. It is signed with the subject's own key, which proves
//! possession of the private half.

use const_oid::ObjectIdentifier;
use der::asn1::{Any, BitString, SetOfVec};
use der::{Decode, DecodePem, Encode, EncodePem};
use x509_cert::attr::Attribute;
use x509_cert::ext::Extension;
use x509_cert::name::Name;
use x509_cert::request::{CertReq, CertReqInfo, Version};

use crate::cert::extensions::ExtendedKeyUsageOption;
use crate::cert::params::{CertificationRequestInfo, DistinguishedName, ExtensionParam};
use crate::error::{PrivCaError, Result};
use crate::key::{KeyPair, PublicKey};

/// PKCS#9 `extensionRequest` attribute.
pub const EXTENSION_REQUEST: ObjectIdentifier =
    ObjectIdentifier::new_unwrap("1.2.840.113549.1.9.14");

#[derive(Debug, Clone)]
pub struct CertificateSigningRequest {
    pub inner: CertReq,
}

impl CertificateSigningRequest {
    /// Builds and signs a request for `subject` with `key`.
    pub fn new(
        subject: &DistinguishedName,
        key: &KeyPair,
        extensions: &[ExtensionParam],
    ) -> Result<Self> {
        let mut attributes = Vec::new();
        if !extensions.is_empty() {
            let requested = extensions
                .iter()
                .map(ExtensionParam::to_x509)
                .collect::<Result<Vec<Extension>>>()?;
            attributes.push(Attribute {
                oid: EXTENSION_REQUEST,
                values: SetOfVec::try_from(vec![Any::encode_from(&requested)?])?,
            });
        }

        let info = CertReqInfo {
            version: Version::V1,
            subject: subject.as_x509_name()?,
            public_key: key.as_spki()?,
            attributes: SetOfVec::try_from(attributes)?,
        };

        let signature = key.sign_data(&info.to_der()?)?;

        Ok(CertificateSigningRequest {
            inner: CertReq {
                info,
                algorithm: key.signature_algorithm(),
                signature: BitString::from_bytes(&signature)?,
            },
        })
    }

    pub fn to_der(&self) -> Result<Vec<u8>> {
        self.inner
            .to_der()
            .map_err(|e| PrivCaError::EncodingError(e.to_string()))
    }

    /// Encodes as `-----BEGIN CERTIFICATE REQUEST-----`.
    pub fn to_pem(&self) -> Result<String> {
        self.inner
            .to_pem(pkcs8::LineEnding::LF)
            .map_err(|e| PrivCaError::EncodingError(e.to_string()))
    }

    pub fn from_der(der: &[u8]) -> Result<Self> {
        Ok(CertificateSigningRequest {
            inner: CertReq::from_der(der)?,
        })
    }

    pub fn from_pem(pem: &str) -> Result<Self> {
        Ok(CertificateSigningRequest {
            inner: CertReq::from_pem(pem)?,
        })
    }

    pub fn subject(&self) -> &Name {
        &self.inner.info.subject
    }

    pub fn public_key(&self) -> Result<PublicKey> {
        PublicKey::from_x509spki(&self.inner.info.public_key)
    }

    /// Checks the self-signature against the embedded public key.
    pub fn verify(&self) -> Result<()> {
        if self.inner.algorithm.oid != const_oid::db::rfc5912::SHA_256_WITH_RSA_ENCRYPTION {
            return Err(PrivCaError::CertificateError(format!(
                "unsupported CSR signature algorithm {}",
                self.inner.algorithm.oid
            )));
        }
        let info = self.inner.info.to_der()?;
        self.public_key()?
            .verify(&info, self.inner.signature.raw_bytes())
    }

    /// Extensions listed in the `extensionRequest` attribute, in order.
    pub fn requested_extensions(&self) -> Result<Vec<ExtensionParam>> {
        let mut extensions = Vec::new();
        for attribute in self.inner.info.attributes.iter() {
            if attribute.oid != EXTENSION_REQUEST {
                continue;
            }
            for value in attribute.values.iter() {
                let requested = Vec::<Extension>::from_der(&value.to_der()?)?;
                extensions.extend(requested.iter().map(ExtensionParam::from_x509));
            }
        }
        Ok(extensions)
    }

    /// Turns the request into issuance parameters for a leaf certificate.
    ///
    /// The signature is verified first; a request that fails it is rejected.
    pub fn to_cert_info(
        &self,
        usages: Vec<ExtendedKeyUsageOption>,
    ) -> Result<CertificationRequestInfo> {
        self.verify()?;
        Ok(CertificationRequestInfo::builder()
            .subject(DistinguishedName::from_x509_name(self.subject()))
            .subject_public_key(self.public_key()?)
            .usages(usages)
            .extensions(self.requested_extensions()?)
            .build())
    }
}
