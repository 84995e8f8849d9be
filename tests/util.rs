#![allow(dead_code)]

use std::cell::RefCell;
use std::path::Path;
use std::rc::Rc;

use privca::backend::{CryptoBackend, RustCryptoBackend};
use privca::ca::{CaManager, CaOutcome};
use privca::cert::extensions::SubjectAltName;
use privca::cert::params::Validity;
use privca::cert::{Certificate, CertificateWithPrivateKey};
use privca::config::Config;
use privca::csr::CertificateSigningRequest;
use privca::error::{PrivCaError, Result};
use privca::key::KeyPair;

/// Keeps RSA generation fast; production defaults to 4096.
pub const TEST_KEY_BITS: usize = 2048;

pub fn test_config(store_root: &Path) -> Config {
    Config::builder()
        .store_root(store_root)
        .key_bits(TEST_KEY_BITS)
        .build()
}

pub fn create_ca(store_root: &Path, ca_name: &str, common_name: &str) -> CaOutcome {
    CaManager::new(test_config(store_root))
        .ensure(ca_name, common_name)
        .expect("CA creation failed")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    GenerateKey,
    SelfSignedCa,
    SigningRequest,
    SignRequest,
}

/// Delegates to the real backend, records every call, and fails on
/// `fail_at`.
#[derive(Clone, Default)]
pub struct ScriptedBackend {
    fail_at: Option<Step>,
    pub calls: Rc<RefCell<Vec<Step>>>,
}

impl ScriptedBackend {
    pub fn failing_at(step: Step) -> Self {
        ScriptedBackend {
            fail_at: Some(step),
            calls: Rc::default(),
        }
    }

    pub fn calls(&self) -> Vec<Step> {
        self.calls.borrow().clone()
    }

    fn enter(&self, step: Step) -> Result<()> {
        self.calls.borrow_mut().push(step);
        if self.fail_at == Some(step) {
            return Err(PrivCaError::KeyGenerationError(format!(
                "scripted failure at {step:?}"
            )));
        }
        Ok(())
    }
}

impl CryptoBackend for ScriptedBackend {
    fn generate_key(&self, bits: usize) -> Result<KeyPair> {
        self.enter(Step::GenerateKey)?;
        RustCryptoBackend.generate_key(bits)
    }

    fn self_signed_ca(
        &self,
        common_name: &str,
        key: &KeyPair,
        validity: Validity,
    ) -> Result<Certificate> {
        self.enter(Step::SelfSignedCa)?;
        RustCryptoBackend.self_signed_ca(common_name, key, validity)
    }

    fn signing_request(
        &self,
        common_name: &str,
        san: &SubjectAltName,
        key: &KeyPair,
    ) -> Result<CertificateSigningRequest> {
        self.enter(Step::SigningRequest)?;
        RustCryptoBackend.signing_request(common_name, san, key)
    }

    fn sign_request(
        &self,
        csr: &CertificateSigningRequest,
        ca: &CertificateWithPrivateKey,
        serial_number: &[u8],
        validity: Validity,
    ) -> Result<Certificate> {
        self.enter(Step::SignRequest)?;
        RustCryptoBackend.sign_request(csr, ca, serial_number, validity)
    }
}

/// Names of the entries directly under `dir`, sorted.
pub fn list_dir(dir: &Path) -> Vec<String> {
    let mut names = std::fs::read_dir(dir)
        .map(|entries| {
            entries
                .filter_map(|entry| entry.ok())
                .map(|entry| entry.file_name().to_string_lossy().into_owned())
                .collect::<Vec<_>>()
        })
        .unwrap_or_default();
    names.sort();
    names
}
