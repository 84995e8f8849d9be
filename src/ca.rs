//! Idempotent CA bootstrapping.

use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;
use tracing::{info, warn};

use crate::backend::{CryptoBackend, RustCryptoBackend};
use crate::cert::params::Validity;
use crate::config::Config;
use crate::error::{PrivCaError, Result};
use crate::store::{Artifact, CaMetadata, CaStore, write_artifact};

/// What [`CaManager::ensure`] found or did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaOutcome {
    /// A new key and root certificate were written.
    Created,
    /// The normalized directory already existed; nothing was touched.
    ///
    /// `registered_name` is the name recorded when the CA was created, if
    /// any. It differs from the requested name when two spellings collide.
    AlreadyRegistered { registered_name: Option<String> },
}

pub struct CaManager<B = RustCryptoBackend> {
    config: Config,
    backend: B,
}

impl CaManager<RustCryptoBackend> {
    pub fn new(config: Config) -> Self {
        CaManager::with_backend(config, RustCryptoBackend)
    }
}

impl<B: CryptoBackend> CaManager<B> {
    pub fn with_backend(config: Config, backend: B) -> Self {
        CaManager { config, backend }
    }

    pub fn store(&self, ca_name: &str) -> CaStore {
        CaStore::new(&self.config.store_root, ca_name)
    }

    /// Makes sure the CA `ca_name` has a key and a root certificate with
    /// subject `CN=<common_name>`.
    ///
    /// An existing CA directory is never modified, even if it is incomplete.
    /// Any failure after the directories exist leaves them in place.
    pub fn ensure(&self, ca_name: &str, common_name: &str) -> Result<CaOutcome> {
        let store = self.store(ca_name);

        if store.exists() {
            let registered_name = match store.read_metadata() {
                Ok(metadata) => metadata.map(|m| m.ca_name),
                Err(err) => {
                    warn!(error = %err, "unreadable CA metadata");
                    None
                }
            };
            if let Some(registered) = registered_name.as_deref().filter(|r| *r != ca_name) {
                warn!(
                    requested = ca_name,
                    registered,
                    path = %store.root().display(),
                    "CA name collides with an existing CA after normalization"
                );
            }
            info!(ca_name, path = %store.root().display(), "CA already registered");
            return Ok(CaOutcome::AlreadyRegistered { registered_name });
        }

        store
            .create_layout()
            .map_err(|e| e.for_artifact(Artifact::CaKey, ca_name))?;

        let key = self
            .backend
            .generate_key(self.config.key_bits)
            .and_then(|key| {
                write_artifact(
                    Artifact::CaKey,
                    &store.ca_key_path(),
                    key.export_pkcs8_pem()?.as_bytes(),
                )?;
                Ok(key)
            })
            .map_err(|e| e.for_artifact(Artifact::CaKey, ca_name))?;
        info!(ca_name, bits = key.bits(), "CA private key written");

        Validity::for_days(self.config.validity_days)
            .and_then(|validity| self.backend.self_signed_ca(common_name, &key, validity))
            .and_then(|cert| {
                write_artifact(
                    Artifact::CaCertificate,
                    &store.ca_cert_path(),
                    cert.to_pem()?.as_bytes(),
                )
            })
            .map_err(|e| e.for_artifact(Artifact::CaCertificate, ca_name))?;
        info!(ca_name, common_name, "CA root certificate written");

        let metadata = CaMetadata {
            ca_name: ca_name.to_string(),
            common_name: common_name.to_string(),
            created_at: OffsetDateTime::now_utc()
                .format(&Rfc3339)
                .unwrap_or_default(),
        };
        if let Err(err) = store.write_metadata(&metadata) {
            warn!(error = %err, "could not record CA metadata");
        }

        if !(store.ca_key_path().exists() && store.ca_cert_path().exists()) {
            return Err(PrivCaError::MissingArtifact {
                path: store.ca_cert_path(),
            }
            .for_artifact(Artifact::CaCertificate, ca_name));
        }

        Ok(CaOutcome::Created)
    }
}
