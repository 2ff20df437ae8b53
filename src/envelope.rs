//! The persisted envelope: everything needed to re-derive the key and
//! verify/decrypt the sealed message, none of it secret.

use std::fmt;

use crate::crypto::{KdfParams, NONCE_LEN, SALT_LEN, TAG_LEN};
use crate::error::Result;
use crate::format;

/// Salt, nonce, ciphertext and tag of one sealed message.
///
/// Only ever built whole: by a single encryption, or by decoding a record in
/// which all four fields are present and correctly sized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Envelope {
    version: u8,
    kdf: KdfParams,
    salt: [u8; SALT_LEN],
    nonce: [u8; NONCE_LEN],
    ciphertext: Vec<u8>,
    tag: [u8; TAG_LEN],
}

impl Envelope {
    pub fn new(
        kdf: KdfParams,
        salt: [u8; SALT_LEN],
        nonce: [u8; NONCE_LEN],
        ciphertext: Vec<u8>,
        tag: [u8; TAG_LEN],
    ) -> Self {
        Self {
            version: format::CURRENT_VERSION,
            kdf,
            salt,
            nonce,
            ciphertext,
            tag,
        }
    }

    pub fn version(&self) -> u8 {
        self.version
    }

    pub fn kdf(&self) -> &KdfParams {
        &self.kdf
    }

    pub fn salt(&self) -> &[u8; SALT_LEN] {
        &self.salt
    }

    pub fn nonce(&self) -> &[u8; NONCE_LEN] {
        &self.nonce
    }

    pub fn ciphertext(&self) -> &[u8] {
        &self.ciphertext
    }

    pub fn tag(&self) -> &[u8; TAG_LEN] {
        &self.tag
    }

    /// Serializes the envelope into its on-disk record.
    pub fn encode(&self) -> Result<Vec<u8>> {
        format::serialize(self)
    }

    /// Parses a stored record.
    ///
    /// # Errors
    ///
    /// [`Error::MalformedEnvelope`](crate::Error::MalformedEnvelope) if the
    /// record is not valid, a required field is missing or has the wrong
    /// length, or the version / KDF is not supported.
    pub fn decode(data: &[u8]) -> Result<Self> {
        format::parse(data)
    }

    /// Public metadata, safe to display without the password.
    pub fn info(&self) -> EnvelopeInfo {
        EnvelopeInfo {
            version: self.version,
            iterations: self.kdf.iterations(),
            salt_len: self.salt.len(),
            nonce_len: self.nonce.len(),
            ciphertext_len: self.ciphertext.len(),
            tag_len: self.tag.len(),
        }
    }

    #[cfg(test)]
    pub(crate) fn salt_mut(&mut self) -> &mut [u8; SALT_LEN] {
        &mut self.salt
    }

    #[cfg(test)]
    pub(crate) fn nonce_mut(&mut self) -> &mut [u8; NONCE_LEN] {
        &mut self.nonce
    }

    #[cfg(test)]
    pub(crate) fn ciphertext_mut(&mut self) -> &mut Vec<u8> {
        &mut self.ciphertext
    }

    #[cfg(test)]
    pub(crate) fn tag_mut(&mut self) -> &mut [u8; TAG_LEN] {
        &mut self.tag
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EnvelopeInfo {
    pub version: u8,
    pub iterations: u32,
    pub salt_len: usize,
    pub nonce_len: usize,
    pub ciphertext_len: usize,
    pub tag_len: usize,
}

impl fmt::Display for EnvelopeInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "format version: {}", self.version)?;
        writeln!(f, "kdf:            pbkdf2-sha256 ({} iterations)", self.iterations)?;
        writeln!(f, "cipher:         aes-256-gcm")?;
        writeln!(f, "salt:           {} bytes", self.salt_len)?;
        writeln!(f, "nonce:          {} bytes", self.nonce_len)?;
        writeln!(f, "ciphertext:     {} bytes", self.ciphertext_len)?;
        write!(f, "tag:            {} bytes", self.tag_len)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Envelope {
        Envelope::new(
            KdfParams::new(1_000).unwrap(),
            [1u8; SALT_LEN],
            [2u8; NONCE_LEN],
            vec![3u8; 5],
            [4u8; TAG_LEN],
        )
    }

    #[test]
    fn new_envelope_uses_current_version() {
        assert_eq!(sample().version(), format::CURRENT_VERSION);
    }

    #[test]
    fn encode_decode_preserves_every_field() {
        let env = sample();
        let decoded = Envelope::decode(&env.encode().unwrap()).unwrap();
        assert_eq!(decoded, env);
    }

    #[test]
    fn info_reports_lengths() {
        let info = sample().info();
        assert_eq!(info.salt_len, 32);
        assert_eq!(info.nonce_len, 12);
        assert_eq!(info.ciphertext_len, 5);
        assert_eq!(info.tag_len, 16);
        assert_eq!(info.iterations, 1_000);
        assert!(info.to_string().contains("1000 iterations"));
    }
}
