//! Cryptographic primitives for sealing a secret.
//!
//! Provides password-based key derivation, the AES-256-GCM cipher and the
//! random salt/nonce generators both sides depend on.

pub mod aead;
pub mod kdf;

pub use aead::{decrypt, encrypt};
pub use kdf::{KdfParams, derive_key};

use crate::error::{Error, Result};
use getrandom::fill;

/// Length of the salt (32 bytes).
pub const SALT_LEN: usize = 32;
/// Length of the nonce (12 bytes / 96 bits for AES-GCM).
pub const NONCE_LEN: usize = 12;
/// Length of the encryption key (32 bytes / 256 bits).
pub const KEY_LEN: usize = 32;
/// Length of the detached authentication tag (16 bytes / 128 bits).
pub const TAG_LEN: usize = 16;

/// Fill buffer with cryptographically secure random bytes
pub(crate) fn secure_random(buf: &mut [u8]) -> Result<()> {
    fill(buf).map_err(|_| Error::RandomUnavailable)
}

/// Generate a fresh salt
pub fn generate_salt() -> Result<[u8; SALT_LEN]> {
    let mut salt = [0u8; SALT_LEN];
    secure_random(&mut salt)?;
    Ok(salt)
}

/// Generate a fresh nonce. Must be called once per encryption.
pub fn generate_nonce() -> Result<[u8; NONCE_LEN]> {
    let mut nonce = [0u8; NONCE_LEN];
    secure_random(&mut nonce)?;
    Ok(nonce)
}
