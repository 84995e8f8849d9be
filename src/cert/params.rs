use bon::Builder;
use const_oid::ObjectIdentifier;
use der::asn1::{Any, SetOfVec};
use der::Tag;
use time::Duration;
use time::OffsetDateTime;
use x509_cert::attr::AttributeTypeAndValue;
use x509_cert::name::{Name, RdnSequence, RelativeDistinguishedName};

use super::extensions::ToAndFromX509Extension;
pub use crate::cert::extensions::ExtendedKeyUsageOption;
use crate::error::PrivCaError;
use crate::key::PublicKey;

const COUNTRY: ObjectIdentifier = ObjectIdentifier::new_unwrap("2.5.4.6");
const STATE: ObjectIdentifier = ObjectIdentifier::new_unwrap("2.5.4.8");
const LOCALITY: ObjectIdentifier = ObjectIdentifier::new_unwrap("2.5.4.7");
const ORGANIZATION: ObjectIdentifier = ObjectIdentifier::new_unwrap("2.5.4.10");
const ORGANIZATION_UNIT: ObjectIdentifier = ObjectIdentifier::new_unwrap("2.5.4.11");
const COMMON_NAME: ObjectIdentifier = ObjectIdentifier::new_unwrap("2.5.4.3");

/// Parameters for building an X.509 certificate.
///
/// This struct contains the subject, public key, and optional extensions for the certificate.
///
/// # Fields
/// * `subject` - The distinguished name of the certificate subject.
/// * `subject_public_key` - The public key of the certificate subject.
/// * `usages` - A list of extended key usage options.
/// * `is_ca` - Indicates if the certificate is a CA.
/// * `extensions` - Additional X.509 extensions, such as a requested SAN.
#[derive(Clone, Debug, Builder)]
pub struct CertificationRequestInfo {
    pub subject: DistinguishedName,
    pub subject_public_key: PublicKey,
    #[builder(default)]
    pub usages: Vec<ExtendedKeyUsageOption>,
    #[builder(default)]
    pub is_ca: bool,
    #[builder(default)]
    pub extensions: Vec<ExtensionParam>,
}

/// Distinguished name parameters for building an X.509 certificate.
///
/// Only non-empty components are encoded, in C, ST, L, O, OU, CN order.
#[derive(Clone, Debug, Builder, Default, PartialEq, Eq)]
pub struct DistinguishedName {
    #[builder(into)]
    pub common_name: String,
    pub country: Option<String>,
    pub state: Option<String>,
    pub locality: Option<String>,
    pub organization: Option<String>,
    pub organization_unit: Option<String>,
}

impl DistinguishedName {
    /// A name with only a common name, as written by `-subj "/CN=..."`.
    pub fn from_common_name(common_name: &str) -> Self {
        DistinguishedName {
            common_name: common_name.to_string(),
            ..Default::default()
        }
    }

    /// Converts the distinguished name to an X.509-compatible format.
    pub fn as_x509_name(&self) -> Result<Name, PrivCaError> {
        if self.common_name.is_empty() {
            return Err(PrivCaError::InvalidInput(
                "common name must not be empty".to_string(),
            ));
        }

        let components = [
            (COUNTRY, Tag::PrintableString, self.country.as_deref()),
            (STATE, Tag::Utf8String, self.state.as_deref()),
            (LOCALITY, Tag::Utf8String, self.locality.as_deref()),
            (ORGANIZATION, Tag::Utf8String, self.organization.as_deref()),
            (ORGANIZATION_UNIT, Tag::Utf8String, self.organization_unit.as_deref()),
            (COMMON_NAME, Tag::Utf8String, Some(self.common_name.as_str())),
        ];

        let mut rdns = Vec::new();
        for (oid, tag, value) in components {
            let Some(value) = value.filter(|v| !v.is_empty()) else {
                continue;
            };
            let attribute = AttributeTypeAndValue {
                oid,
                value: Any::new(tag, value.as_bytes())?,
            };
            rdns.push(RelativeDistinguishedName(SetOfVec::try_from(vec![
                attribute,
            ])?));
        }
        Ok(RdnSequence(rdns))
    }

    /// Creates a `DistinguishedName` from an X.509 name.
    ///
    /// Attributes other than the six known ones are ignored.
    pub fn from_x509_name(x509dn: &Name) -> Self {
        let mut dn = DistinguishedName::default();

        for rdn in x509dn.0.iter() {
            for attr in rdn.0.iter() {
                let value = String::from_utf8_lossy(attr.value.value()).into_owned();
                match attr.oid {
                    COMMON_NAME => dn.common_name = value,
                    COUNTRY => dn.country = Some(value),
                    STATE => dn.state = Some(value),
                    LOCALITY => dn.locality = Some(value),
                    ORGANIZATION => dn.organization = Some(value),
                    ORGANIZATION_UNIT => dn.organization_unit = Some(value),
                    _ => {}
                }
            }
        }

        dn
    }
}

/// Certificate validity period.
///
/// # Fields
/// * `not_before` - The start of the validity period.
/// * `not_after` - The end of the validity period.
#[derive(Clone, Debug)]
pub struct Validity {
    pub not_before: OffsetDateTime,
    pub not_after: OffsetDateTime,
}

impl Validity {
    /// Creates a validity period starting now for the given number of days.
    ///
    /// Fails when the end of the period cannot be represented (after the
    /// year 9999).
    pub fn for_days(days: i64) -> Result<Self, PrivCaError> {
        let now = OffsetDateTime::now_utc();
        let not_after = days
            .checked_mul(86_400)
            .map(Duration::seconds)
            .and_then(|span| now.checked_add(span))
            .ok_or_else(|| {
                PrivCaError::InvalidInput(format!("a validity of {days} days ends after 9999-12-31"))
            })?;
        Ok(Self {
            not_before: now,
            not_after,
        })
    }
}

/// Represents an X.509 extension.
///
/// This struct contains the OID, criticality, and value of an extension.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExtensionParam {
    pub oid: ObjectIdentifier,
    pub critical: bool,
    /// DER-encoded extension value
    pub value: Vec<u8>,
}

impl ExtensionParam {
    /// Creates an `ExtensionParam` from a specific extension.
    ///
    /// # Arguments
    /// * `extension` - The extension to encode.
    /// * `critical` - Indicates if the extension is critical.
    pub fn from_extension<E: ToAndFromX509Extension>(
        extension: &E,
        critical: bool,
    ) -> Result<Self, PrivCaError> {
        Ok(Self {
            oid: E::OID,
            critical,
            value: extension.to_x509_extension_value()?,
        })
    }

    /// Decodes an `ExtensionParam` into a specific extension.
    pub fn to_extension<E: ToAndFromX509Extension>(&self) -> Result<E, PrivCaError> {
        E::from_x509_extension_value(&self.value)
    }

    pub fn from_x509(extension: &x509_cert::ext::Extension) -> Self {
        Self {
            oid: extension.extn_id,
            critical: extension.critical,
            value: extension.extn_value.as_bytes().to_vec(),
        }
    }

    pub fn to_x509(&self) -> Result<x509_cert::ext::Extension, PrivCaError> {
        Ok(x509_cert::ext::Extension {
            extn_id: self.oid,
            critical: self.critical,
            extn_value: der::asn1::OctetString::new(self.value.clone())?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn common_name_only_name_has_a_single_rdn() {
        let dn = DistinguishedName::from_common_name("Test Root");
        let name = dn.as_x509_name().unwrap();
        assert_eq!(name.0.len(), 1);
        assert_eq!(name.to_string(), "CN=Test Root");
    }

    #[test]
    fn names_with_rfc4514_specials_survive_encoding() {
        let dn = DistinguishedName::builder()
            .common_name("Acme, Inc. + Friends")
            .organization("Acme".to_string())
            .build();
        let name = dn.as_x509_name().unwrap();
        assert_eq!(DistinguishedName::from_x509_name(&name), dn);
    }

    #[test]
    fn empty_common_name_is_rejected() {
        let dn = DistinguishedName::default();
        assert!(matches!(
            dn.as_x509_name(),
            Err(PrivCaError::InvalidInput(_))
        ));
    }

    #[test]
    fn validity_spans_the_requested_days() {
        let validity = Validity::for_days(365).unwrap();
        assert_eq!(
            (validity.not_after - validity.not_before).whole_days(),
            365
        );
    }

    #[test]
    fn validity_past_year_9999_is_an_error() {
        assert!(matches!(
            Validity::for_days(4_000_000),
            Err(PrivCaError::InvalidInput(_))
        ));
        assert!(matches!(
            Validity::for_days(i64::MAX),
            Err(PrivCaError::InvalidInput(_))
        ));
    }
}
