//! # privca - A Pure Rust Private Certificate Authority
//!
//! privca bootstraps a file-system backed certificate authority and issues TLS
//! leaf certificates signed by it. Every key, request and certificate is built
//! with the RustCrypto crates; nothing shells out to an external toolkit.
//!
//! ## Store Layout
//!
//! ```text
//! <store-root>/<normalized-ca-name>/
//!   ca/ca.key         CA private key (PKCS#8 PEM)
//!   ca/ca.pem         self-signed root certificate
//!   ca/ca.srl         serial state, created on first signing
//!   ca/ca.json        name the CA was registered under
//!   tls-certs/<primary>.key|.csr|.pem
//! ```
//!
//! The CA name is normalized by replacing every non-word character with `_`
//! and lower-casing, so "Example CA" and "example-ca" share one directory.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use privca::{ca::CaManager, config::Config, tls::TlsIssuer};
//!
//! # fn main() -> Result<(), privca::error::PrivCaError> {
//! let config = Config::builder().store_root("/var/lib/privca").build();
//!
//! // Idempotent: a second call reports the CA as already registered.
//! CaManager::new(config.clone()).ensure("Example CA", "Example Root")?;
//!
//! // Key, CSR and certificate for the first name; every name becomes a SAN.
//! let leaf = TlsIssuer::new(config).issue("Example CA", "example.com,www.example.com,192.168.1.10")?;
//! assert_eq!(
//!     leaf.subject_alt_name.to_string(),
//!     "subjectAltName=DNS:example.com,DNS:www.example.com,IP:192.168.1.10"
//! );
//! # Ok(())
//! # }
//! ```
//!
//! ## Error Handling
//!
//! Operations return [`error::PrivCaError`]. A failed step surfaces as
//! `ArtifactGeneration`, naming the artifact and the CA name or primary
//! hostname; [`report::Report`] turns any outcome into the status/message pair
//! printed by the binary.
//!
//! ## Module Organization
//!
//! - [`ca`]: idempotent CA creation
//! - [`tls`]: leaf issuance and SAN classification
//! - [`store`]: directory layout, artifact writes and serial state
//! - [`backend`]: the crypto capability trait and its RustCrypto implementation
//! - [`key`], [`cert`], [`csr`], [`issuer`], [`tbs_certificate`]: X.509 building blocks
//! - [`config`], [`report`], [`error`]: settings, results and errors

pub mod backend;
pub mod ca;
pub mod cert;
pub mod config;
pub mod csr;
pub mod error;
pub mod issuer;
pub mod key;
pub mod report;
pub mod store;
pub mod tbs_certificate;
pub mod tls;
