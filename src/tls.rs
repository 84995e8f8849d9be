//! Leaf certificate issuance under an existing CA.

use std::fs;
use std::path::PathBuf;
use std::sync::LazyLock;

use regex::Regex;
use tracing::{debug, info};

use crate::backend::{CryptoBackend, RustCryptoBackend};
use crate::cert::extensions::{SubjectAltName, SubjectAltNameEntry};
use crate::cert::params::Validity;
use crate::cert::{Certificate, CertificateWithPrivateKey};
use crate::config::Config;
use crate::error::{PrivCaError, Result};
use crate::key::KeyPair;
use crate::store::{Artifact, CaStore, SerialState, write_artifact};

/// Dotted-quad shape, 1-3 digits per octet; values above 255 still match.
/// Unanchored: a dotted quad anywhere in the identifier makes it an IP entry.
static DOTTED_QUAD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[0-9]{1,3}\.[0-9]{1,3}\.[0-9]{1,3}\.[0-9]{1,3}").expect("static regex")
});

/// Classifies one identifier as an IP or a DNS SAN entry by shape alone.
pub fn classify(identifier: &str) -> SubjectAltNameEntry {
    if DOTTED_QUAD.is_match(identifier) {
        SubjectAltNameEntry::Ip(identifier.to_string())
    } else {
        SubjectAltNameEntry::Dns(identifier.to_string())
    }
}

/// The ordered hostnames/IPs of one leaf; the first is the primary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubjectIdentifiers {
    identifiers: Vec<String>,
}

impl SubjectIdentifiers {
    /// Splits a comma-separated list, keeping order and duplicates.
    pub fn parse(common_names: &str) -> Result<Self> {
        let identifiers = common_names
            .split(',')
            .map(|id| id.trim().to_string())
            .collect::<Vec<_>>();

        for id in &identifiers {
            if id.is_empty() {
                return Err(PrivCaError::InvalidInput(format!(
                    "empty identifier in {common_names:?}"
                )));
            }
            if id == "." || id == ".." || id.contains(['/', '\\']) {
                return Err(PrivCaError::InvalidInput(format!(
                    "identifier {id:?} cannot name a file"
                )));
            }
        }

        Ok(SubjectIdentifiers { identifiers })
    }

    /// The certificate CN and the stem of every leaf file.
    pub fn primary(&self) -> &str {
        &self.identifiers[0]
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.identifiers.iter().map(String::as_str)
    }

    /// Every identifier as a SAN entry, primary included.
    pub fn subject_alt_name(&self) -> SubjectAltName {
        SubjectAltName {
            names: self.iter().map(classify).collect(),
        }
    }
}

/// Where the artifacts of one issuance ended up.
#[derive(Debug, Clone)]
pub struct IssuedLeaf {
    pub primary: String,
    pub subject_alt_name: SubjectAltName,
    pub key_path: PathBuf,
    pub csr_path: PathBuf,
    pub cert_path: PathBuf,
}

pub struct TlsIssuer<B = RustCryptoBackend> {
    config: Config,
    backend: B,
}

impl TlsIssuer<RustCryptoBackend> {
    pub fn new(config: Config) -> Self {
        TlsIssuer::with_backend(config, RustCryptoBackend)
    }
}

impl<B: CryptoBackend> TlsIssuer<B> {
    pub fn with_backend(config: Config, backend: B) -> Self {
        TlsIssuer { config, backend }
    }

    /// Issues a key, CSR and certificate for the first of `common_names`,
    /// signed by the CA registered as `ca_name`.
    ///
    /// Existing leaf files for the same primary identifier are overwritten.
    /// A failed step stops the run and leaves earlier files in place.
    pub fn issue(&self, ca_name: &str, common_names: &str) -> Result<IssuedLeaf> {
        let store = CaStore::new(&self.config.store_root, ca_name);
        if !store.exists() {
            return Err(PrivCaError::NotRegistered {
                ca_name: ca_name.to_string(),
            });
        }

        let identifiers = SubjectIdentifiers::parse(common_names)?;
        let primary = identifiers.primary();
        let key_path = store.leaf_key_path(primary);
        let csr_path = store.leaf_csr_path(primary);
        let cert_path = store.leaf_cert_path(primary);

        let key = self
            .backend
            .generate_key(self.config.key_bits)
            .and_then(|key| {
                write_artifact(Artifact::TlsKey, &key_path, key.export_pkcs8_pem()?.as_bytes())?;
                Ok(key)
            })
            .map_err(|e| e.for_artifact(Artifact::TlsKey, primary))?;
        info!(primary, "TLS private key written");

        let san = identifiers.subject_alt_name();
        debug!(%san, "subject alternative names");

        let csr = self
            .backend
            .signing_request(primary, &san, &key)
            .and_then(|csr| {
                write_artifact(Artifact::Csr, &csr_path, csr.to_pem()?.as_bytes())?;
                Ok(csr)
            })
            .map_err(|e| e.for_artifact(Artifact::Csr, primary))?;
        info!(primary, "CSR written");

        self.load_ca(&store)
            .and_then(|ca| {
                let validity = Validity::for_days(self.config.validity_days)?;
                let serial = SerialState::new(store.serial_path()).next()?;
                let cert = self.backend.sign_request(&csr, &ca, &serial, validity)?;
                write_artifact(Artifact::TlsCertificate, &cert_path, cert.to_pem()?.as_bytes())
            })
            .map_err(|e| {
                debug!(error = %e, "certificate signing failed");
                e.for_artifact(Artifact::TlsCertificate, primary)
            })?;
        info!(primary, ca_name, "TLS certificate written");

        if !(key_path.exists() && cert_path.exists()) {
            return Err(PrivCaError::MissingArtifact {
                path: cert_path.clone(),
            }
            .for_artifact(Artifact::TlsCertificate, primary));
        }

        Ok(IssuedLeaf {
            primary: primary.to_string(),
            subject_alt_name: san,
            key_path,
            csr_path,
            cert_path,
        })
    }

    fn load_ca(&self, store: &CaStore) -> Result<CertificateWithPrivateKey> {
        let key_path = store.ca_key_path();
        let cert_path = store.ca_cert_path();
        let key_pem = fs::read_to_string(&key_path).map_err(|e| PrivCaError::io(&key_path, e))?;
        let cert_pem =
            fs::read_to_string(&cert_path).map_err(|e| PrivCaError::io(&cert_path, e))?;
        CertificateWithPrivateKey::new(
            Certificate::from_pem(&cert_pem)?,
            KeyPair::import_from_pkcs8_pem(&key_pem)?,
        )
    }
}
