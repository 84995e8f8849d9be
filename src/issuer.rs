use der::Encode;
use der::flagset::FlagSet;
use x509_cert::certificate::CertificateInner;
use x509_cert::name::Name;

use crate::cert::Certificate;
use crate::cert::extensions::AuthorityKeyIdentifier;
use crate::cert::extensions::BasicConstraints;
use crate::cert::extensions::ExtendedKeyUsage;
use crate::cert::extensions::ExtendedKeyUsageOption;
use crate::cert::extensions::KeyUsage;
use crate::cert::extensions::KeyUsages;
use crate::cert::extensions::SubjectKeyIdentifier;
use crate::cert::params::{CertificationRequestInfo, ExtensionParam, Validity};
use crate::error::PrivCaError;
use crate::key::KeyPair;
use crate::tbs_certificate::TbsCertificate;

/// Represents an entity capable of issuing certificates.
///
/// This trait provides methods to retrieve issuer details and issue certificates.
pub trait Issuer {
    /// Returns the name written into the `issuer` field of issued certificates.
    fn issuer_name(&self) -> Result<Name, PrivCaError>;

    /// Returns the signing key of the issuer.
    fn signing_key(&self) -> &KeyPair;

    /// Issues a certificate based on the provided certification request information.
    ///
    /// The issuer adds BasicConstraints, KeyUsage, ExtendedKeyUsage and the
    /// two key identifiers. Extensions carried by the request (for example a
    /// SAN) are copied first, unless the issuer sets the same OID itself.
    ///
    /// # Arguments
    /// * `cert_request` - The certification request information containing details about the certificate to be issued.
    /// * `serial_number` - Unsigned big-endian serial; must be unique per issuer.
    /// * `validity` - The validity window of the new certificate.
    fn issue(
        &self,
        cert_request: &CertificationRequestInfo,
        serial_number: &[u8],
        validity: Validity,
    ) -> Result<Certificate, PrivCaError> {
        let signing_key = self.signing_key();
        let signature_algorithm = signing_key.signature_algorithm();

        let authority_key_id = AuthorityKeyIdentifier {
            key_identifier: signing_key.public_key().key_identifier()?,
        };
        let subject_key_id =
            SubjectKeyIdentifier(cert_request.subject_public_key.key_identifier()?);

        let basic_constraints = BasicConstraints {
            is_ca: cert_request.is_ca,
            max_path_length: None,
        };

        let mut extensions: Vec<ExtensionParam> = vec![
            ExtensionParam::from_extension(&basic_constraints, true)?,
            ExtensionParam::from_extension(&subject_key_id, false)?,
            ExtensionParam::from_extension(&authority_key_id, false)?,
        ];

        let mut key_usage_flags: FlagSet<KeyUsages> = FlagSet::empty();

        if cert_request.is_ca {
            key_usage_flags |= KeyUsages::KeyCertSign;
            key_usage_flags |= KeyUsages::CRLSign;
        }

        for usage in &cert_request.usages {
            match usage {
                ExtendedKeyUsageOption::ServerAuth | ExtendedKeyUsageOption::ClientAuth => {
                    key_usage_flags |= KeyUsages::DigitalSignature;
                    key_usage_flags |= KeyUsages::KeyEncipherment;
                }
            }
        }

        if !key_usage_flags.is_empty() {
            let key_usage = KeyUsage(key_usage_flags);
            extensions.push(ExtensionParam::from_extension(&key_usage, true)?);
        }

        if !cert_request.usages.is_empty() {
            let extended_key_usage = ExtendedKeyUsage {
                usage: cert_request.usages.clone(),
            };
            extensions.push(ExtensionParam::from_extension(&extended_key_usage, false)?);
        }

        let requested = cert_request
            .extensions
            .iter()
            .filter(|requested| !extensions.iter().any(|own| own.oid == requested.oid))
            .cloned()
            .collect::<Vec<_>>();
        let combined_extensions = requested.into_iter().chain(extensions).collect();

        let tbs_cert = TbsCertificate {
            serial_number: serial_number.to_vec(),
            signature_algorithm: signature_algorithm.clone(),
            issuer: self.issuer_name()?,
            not_before: validity.not_before,
            not_after: validity.not_after,
            subject: cert_request.subject.as_x509_name()?,
            subject_public_key: cert_request.subject_public_key.clone(),
            extensions: combined_extensions,
        };

        let tbs_cert_inner = tbs_cert.to_tbs_certificate_inner()?;

        let signature = signing_key.sign_data(&tbs_cert_inner.to_der()?)?;

        let cert_inner = CertificateInner {
            tbs_certificate: tbs_cert_inner,
            signature_algorithm,
            signature: der::asn1::BitString::from_bytes(&signature)?,
        };

        Ok(Certificate { inner: cert_inner })
    }
}
