//! On-disk model of a CA.
//!
//! ```text
//! <store-root>/<normalized-ca-name>/
//!   ca/ca.key ca/ca.pem ca/ca.srl ca/ca.json
//!   tls-certs/<primary>.key <primary>.csr <primary>.pem
//! ```
//!
//! The directory is the only state shared between the CA manager and the
//! TLS issuer, and between runs.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::cert::random_serial_number;
use crate::error::{PrivCaError, Result};

const CA_DIR: &str = "ca";
const TLS_DIR: &str = "tls-certs";

static NON_WORD: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\W").expect("static regex"));

/// Maps a CA name to its directory name: every non-word character becomes
/// `_` and the result is lower-cased.
///
/// Distinct names can collide ("My CA" and "my-ca"); the normalized form is
/// the CA's identity.
pub fn normalize_ca_name(ca_name: &str) -> String {
    NON_WORD.replace_all(ca_name, "_").to_lowercase()
}

/// The files a CA or TLS operation produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Artifact {
    CaKey,
    CaCertificate,
    TlsKey,
    Csr,
    TlsCertificate,
}

impl fmt::Display for Artifact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Artifact::CaKey => "CA private key",
            Artifact::CaCertificate => "CA certificate",
            Artifact::TlsKey => "TLS private key",
            Artifact::Csr => "CSR file",
            Artifact::TlsCertificate => "TLS certificate",
        })
    }
}

impl Artifact {
    /// The operator-facing failure message for this artifact.
    pub fn failure_message(&self, identifier: &str) -> String {
        match self {
            Artifact::CaKey | Artifact::CaCertificate => {
                format!("The {self} generation has failed for the CA ({identifier}).")
            }
            Artifact::TlsKey | Artifact::Csr | Artifact::TlsCertificate => {
                format!("The {self} generation has failed for the FQDN ({identifier}).")
            }
        }
    }

    fn is_private_key(&self) -> bool {
        matches!(self, Artifact::CaKey | Artifact::TlsKey)
    }
}

/// Paths of one CA under a store root.
#[derive(Debug, Clone)]
pub struct CaStore {
    root: PathBuf,
}

impl CaStore {
    pub fn new(store_root: &Path, ca_name: &str) -> Self {
        CaStore {
            root: store_root.join(normalize_ca_name(ca_name)),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Whether the CA is registered. Only the root directory is checked.
    pub fn exists(&self) -> bool {
        self.root.exists()
    }

    pub fn ca_dir(&self) -> PathBuf {
        self.root.join(CA_DIR)
    }

    pub fn tls_dir(&self) -> PathBuf {
        self.root.join(TLS_DIR)
    }

    pub fn ca_key_path(&self) -> PathBuf {
        self.ca_dir().join("ca.key")
    }

    pub fn ca_cert_path(&self) -> PathBuf {
        self.ca_dir().join("ca.pem")
    }

    pub fn serial_path(&self) -> PathBuf {
        self.ca_dir().join("ca.srl")
    }

    pub fn metadata_path(&self) -> PathBuf {
        self.ca_dir().join("ca.json")
    }

    pub fn leaf_key_path(&self, primary: &str) -> PathBuf {
        self.tls_dir().join(format!("{primary}.key"))
    }

    pub fn leaf_csr_path(&self, primary: &str) -> PathBuf {
        self.tls_dir().join(format!("{primary}.csr"))
    }

    pub fn leaf_cert_path(&self, primary: &str) -> PathBuf {
        self.tls_dir().join(format!("{primary}.pem"))
    }

    /// Creates the root, `ca/` and `tls-certs/`, skipping any that exist.
    pub fn create_layout(&self) -> Result<()> {
        for dir in [self.root.clone(), self.ca_dir(), self.tls_dir()] {
            if !dir.exists() {
                fs::create_dir(&dir).map_err(|e| PrivCaError::io(&dir, e))?;
                debug!(dir = %dir.display(), "created store directory");
            }
        }
        Ok(())
    }

    pub fn read_metadata(&self) -> Result<Option<CaMetadata>> {
        let path = self.metadata_path();
        if !path.exists() {
            return Ok(None);
        }
        let raw = fs::read_to_string(&path).map_err(|e| PrivCaError::io(&path, e))?;
        Ok(Some(serde_json::from_str(&raw)?))
    }

    pub fn write_metadata(&self, metadata: &CaMetadata) -> Result<()> {
        let path = self.metadata_path();
        let json = serde_json::to_string_pretty(metadata)?;
        fs::write(&path, json).map_err(|e| PrivCaError::io(&path, e))
    }
}

/// Writes one artifact and confirms it is present afterwards.
///
/// Private keys are restricted to the owner on Unix.
pub fn write_artifact(artifact: Artifact, path: &Path, contents: &[u8]) -> Result<()> {
    fs::write(path, contents).map_err(|e| PrivCaError::io(path, e))?;

    #[cfg(unix)]
    if artifact.is_private_key() {
        use std::os::unix::fs::PermissionsExt;
        if let Err(e) = fs::set_permissions(path, fs::Permissions::from_mode(0o600)) {
            warn!(path = %path.display(), "Failed to restrict private key permissions: {e}");
        }
    }

    if !path.exists() {
        return Err(PrivCaError::MissingArtifact {
            path: path.to_path_buf(),
        });
    }
    debug!(%artifact, path = %path.display(), "wrote artifact");
    Ok(())
}

/// Identity recorded next to the CA key, so that later requests whose names
/// normalize to the same directory can be told apart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaMetadata {
    pub ca_name: String,
    pub common_name: String,
    /// RFC 3339 creation timestamp.
    pub created_at: String,
}

/// The CA's serial counter, stored as upper-case hex in `ca/ca.srl`.
#[derive(Debug)]
pub struct SerialState {
    path: PathBuf,
}

impl SerialState {
    pub fn new(path: PathBuf) -> Self {
        SerialState { path }
    }

    /// Returns the serial for the next certificate and persists it.
    ///
    /// A missing file is initialized from a random serial.
    pub fn next(&self) -> Result<Vec<u8>> {
        let mut serial = if self.path.exists() {
            let raw = fs::read_to_string(&self.path).map_err(|e| PrivCaError::io(&self.path, e))?;
            parse_serial(&raw)?
        } else {
            debug!(path = %self.path.display(), "initializing serial state");
            random_serial_number()
        };
        increment(&mut serial);

        let encoded = format!("{}\n", hex::encode_upper(&serial));
        fs::write(&self.path, encoded).map_err(|e| PrivCaError::io(&self.path, e))?;
        Ok(serial)
    }
}

fn parse_serial(raw: &str) -> Result<Vec<u8>> {
    let digits = raw.trim();
    if digits.is_empty() {
        return Err(PrivCaError::DecodingError("empty serial file".to_string()));
    }
    let padded = if digits.len() % 2 == 1 {
        format!("0{digits}")
    } else {
        digits.to_string()
    };
    let bytes = hex::decode(padded)
        .map_err(|e| PrivCaError::DecodingError(format!("serial file: {e}")))?;
    let first_nonzero = bytes.iter().position(|b| *b != 0).unwrap_or(bytes.len());
    Ok(bytes[first_nonzero..].to_vec())
}

/// Big-endian `+1`, growing by one octet on overflow.
fn increment(serial: &mut Vec<u8>) {
    for byte in serial.iter_mut().rev() {
        if *byte == 0xff {
            *byte = 0;
        } else {
            *byte += 1;
            return;
        }
    }
    serial.insert(0, 1);
}
