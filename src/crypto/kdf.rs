use pbkdf2::pbkdf2_hmac;
use sha2::Sha256;
use zeroize::Zeroizing;

use super::KEY_LEN;
use crate::error::{Error, Result};

/// Default PBKDF2-HMAC-SHA256 iteration count.
pub const DEFAULT_ITERATIONS: u32 = 600_000;
/// Upper bound accepted from an envelope, so a stored record cannot demand
/// unbounded work before the tag is even checked.
pub const MAX_ITERATIONS: u32 = 10_000_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KdfParams {
    iterations: u32,
}

impl Default for KdfParams {
    fn default() -> Self {
        Self {
            iterations: DEFAULT_ITERATIONS,
        }
    }
}

impl KdfParams {
    pub fn new(iterations: u32) -> Result<Self> {
        let params = Self { iterations };
        params.validate()?;
        Ok(params)
    }

    pub fn iterations(&self) -> u32 {
        self.iterations
    }

    pub fn validate(&self) -> Result<()> {
        if self.iterations < 1 {
            return Err(Error::InvalidKdfParams(
                "pbkdf2 iterations must be >= 1".into(),
            ));
        }
        if self.iterations > MAX_ITERATIONS {
            return Err(Error::InvalidKdfParams(format!(
                "pbkdf2 iterations must be <= {MAX_ITERATIONS}"
            )));
        }
        Ok(())
    }
}

/// Derive a 256-bit key from `password` and `salt`.
///
/// Same password, salt and parameters always give the same key. The key is
/// zeroed when the returned buffer is dropped.
pub fn derive_key(
    password: &str,
    salt: &[u8],
    kdf: KdfParams,
) -> Result<Zeroizing<[u8; KEY_LEN]>> {
    kdf.validate()?;

    tracing::debug!(iterations = kdf.iterations, "deriving key");

    let mut key = Zeroizing::new([0u8; KEY_LEN]);
    pbkdf2_hmac::<Sha256>(password.as_bytes(), salt, kdf.iterations, &mut key[..]);

    Ok(key)
}
