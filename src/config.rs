use std::path::PathBuf;

use bon::Builder;

use crate::cert::params::Validity;
use crate::error::PrivCaError;
use crate::key::{MAX_RSA_BITS, MIN_RSA_BITS};

pub const DEFAULT_KEY_BITS: usize = 4096;
pub const DEFAULT_VALIDITY_DAYS: i64 = 365;

/// Settings shared by the CA manager and the TLS issuer.
///
/// `store_root` is always explicit; nothing is resolved against the process
/// working directory unless the caller passes a relative path.
#[derive(Clone, Debug, Builder)]
pub struct Config {
    #[builder(into)]
    pub store_root: PathBuf,
    /// RSA modulus size for both CA and leaf keys.
    #[builder(default = DEFAULT_KEY_BITS)]
    pub key_bits: usize,
    /// Validity of the root and of every leaf, in days.
    #[builder(default = DEFAULT_VALIDITY_DAYS)]
    pub validity_days: i64,
}

impl Config {
    pub fn validate(&self) -> Result<(), PrivCaError> {
        if !(MIN_RSA_BITS..=MAX_RSA_BITS).contains(&self.key_bits) {
            return Err(PrivCaError::InvalidInput(format!(
                "key size must be between {MIN_RSA_BITS} and {MAX_RSA_BITS} bits, got {}",
                self.key_bits
            )));
        }
        if self.validity_days < 1 {
            return Err(PrivCaError::InvalidInput(format!(
                "validity must be at least one day, got {}",
                self.validity_days
            )));
        }
        Validity::for_days(self.validity_days)?;
        Ok(())
    }
}
