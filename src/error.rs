//! Error type shared by every privca operation.

use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::store::Artifact;

pub type Result<T> = std::result::Result<T, PrivCaError>;

/// Represents errors that can occur while managing the CA store.
///
/// The crypto-level variants describe why a single step failed. The store-level
/// variants (`NotRegistered`, `ArtifactGeneration`) are what CA and TLS
/// operations surface to their callers.
#[derive(Debug, Error)]
pub enum PrivCaError {
    /// Error during data encoding.
    #[error("Failed to encode data: {0}")]
    EncodingError(String),

    /// Error during data decoding.
    #[error("Failed to decode data: {0}")]
    DecodingError(String),

    /// Error due to invalid input.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Error during key generation.
    #[error("Key generation error: {0}")]
    KeyGenerationError(String),

    /// Error related to certificate or CSR operations.
    #[error("Certificate error: {0}")]
    CertificateError(String),

    /// Error from RSA operations.
    #[error("RSA error: {0}")]
    RsaError(String),

    /// Error from RSA PKCS#8 operations.
    #[error("RSA PKCS8 error: {0}")]
    RsaPkcs8Error(String),

    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A file was written but could not be found afterwards.
    #[error("Expected artifact {} is missing", path.display())]
    MissingArtifact { path: PathBuf },

    /// The normalized CA directory does not exist.
    #[error("The CA ({ca_name}) is not registered")]
    NotRegistered { ca_name: String },

    /// A key, CSR or certificate step did not produce its artifact.
    #[error("{artifact} generation failed for {identifier}: {source}")]
    ArtifactGeneration {
        artifact: Artifact,
        identifier: String,
        #[source]
        source: Box<PrivCaError>,
    },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl PrivCaError {
    pub fn io(path: impl AsRef<Path>, source: std::io::Error) -> Self {
        PrivCaError::Io {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }

    /// Wraps `self` as the cause of a failed artifact step.
    pub fn for_artifact(self, artifact: Artifact, identifier: &str) -> Self {
        PrivCaError::ArtifactGeneration {
            artifact,
            identifier: identifier.to_string(),
            source: Box::new(self),
        }
    }
}

impl From<der::Error> for PrivCaError {
    /// Converts a `der::Error` into a `PrivCaError`.
    fn from(err: der::Error) -> Self {
        PrivCaError::DecodingError(err.to_string())
    }
}

impl From<rsa::Error> for PrivCaError {
    fn from(err: rsa::Error) -> Self {
        PrivCaError::RsaError(err.to_string())
    }
}

impl From<rsa::pkcs8::Error> for PrivCaError {
    fn from(err: rsa::pkcs8::Error) -> Self {
        PrivCaError::RsaPkcs8Error(err.to_string())
    }
}

impl From<rsa::pkcs8::spki::Error> for PrivCaError {
    fn from(err: rsa::pkcs8::spki::Error) -> Self {
        PrivCaError::EncodingError(err.to_string())
    }
}
