use std::time::SystemTime;

use der::Encode;
use der::asn1::{GeneralizedTime, UtcTime};
use time::OffsetDateTime;
use x509_cert::Version;
use x509_cert::certificate::TbsCertificateInner;
use x509_cert::name::Name;
use x509_cert::serial_number::SerialNumber;
use x509_cert::spki::AlgorithmIdentifierOwned;
use x509_cert::time::Time;

use crate::cert::params::ExtensionParam;
use crate::error::PrivCaError;
use crate::key::PublicKey;

/// Represents the "To Be Signed" (TBS) portion of an X.509 certificate.
/// This struct contains all the fields required to generate a valid X.509 certificate.
///
/// # Fields
/// * `serial_number` - The unique identifier for the certificate.
/// * `signature_algorithm` - The algorithm used to sign the certificate.
/// * `issuer` - The distinguished name of the certificate issuer.
/// * `not_before` - The start of the certificate's validity period.
/// * `not_after` - The end of the certificate's validity period.
/// * `subject` - The distinguished name of the certificate subject.
/// * `subject_public_key` - The public key of the certificate subject.
/// * `extensions` - Additional X.509 extensions for the certificate.
pub struct TbsCertificate {
    /// Certificate serial number, unsigned big-endian
    pub serial_number: Vec<u8>,
    /// Certificate signature algorithm
    pub signature_algorithm: AlgorithmIdentifierOwned,
    /// Certificate issuer distinguished name, copied verbatim from the issuer's subject
    pub issuer: Name,
    pub not_before: OffsetDateTime,
    pub not_after: OffsetDateTime,
    /// Certificate subject distinguished name
    pub subject: Name,
    /// Subject's public key
    pub subject_public_key: PublicKey,
    /// Certificate extensions
    pub extensions: Vec<ExtensionParam>,
}

impl TbsCertificate {
    /// Converts the `TbsCertificate` into a `TbsCertificateInner` for DER encoding.
    pub fn to_tbs_certificate_inner(&self) -> Result<TbsCertificateInner, PrivCaError> {
        let extensions = self
            .extensions
            .iter()
            .map(ExtensionParam::to_x509)
            .collect::<Result<Vec<_>, _>>()?;

        let validity = x509_cert::time::Validity {
            not_before: encode_time(self.not_before)?,
            not_after: encode_time(self.not_after)?,
        };

        let serial_number = SerialNumber::new(self.serial_number.as_slice())?;

        Ok(TbsCertificateInner {
            version: Version::V3,
            serial_number,
            signature: self.signature_algorithm.clone(),
            issuer: self.issuer.clone(),
            validity,
            subject: self.subject.clone(),
            subject_public_key_info: self.subject_public_key.to_spki()?,
            issuer_unique_id: None,
            subject_unique_id: None,
            extensions: if extensions.is_empty() {
                None
            } else {
                Some(extensions)
            },
        })
    }

    /// Encodes the `TbsCertificate` into DER format.
    pub fn to_der(&self) -> Result<Vec<u8>, PrivCaError> {
        Ok(self.to_tbs_certificate_inner()?.to_der()?)
    }
}

/// RFC 5280 §4.1.2.5: UTCTime through 2049, GeneralizedTime from 2050 on.
fn encode_time(at: OffsetDateTime) -> Result<Time, PrivCaError> {
    let system_time = SystemTime::from(at);
    if at.year() < 2050 {
        Ok(Time::UtcTime(UtcTime::from_system_time(system_time)?))
    } else {
        Ok(Time::GeneralTime(GeneralizedTime::from_system_time(
            system_time,
        )?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dates_before_2050_use_utc_time() {
        let at = OffsetDateTime::from_unix_timestamp(1_700_000_000).unwrap();
        assert!(matches!(encode_time(at).unwrap(), Time::UtcTime(_)));
    }

    #[test]
    fn dates_from_2050_use_generalized_time() {
        // 2050-01-01T00:00:00Z
        let at = OffsetDateTime::from_unix_timestamp(2_524_608_000).unwrap();
        assert!(matches!(encode_time(at).unwrap(), Time::GeneralTime(_)));
    }
}
