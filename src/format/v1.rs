//! Envelope record format v1.
//!
//! V1 record (byte fields are standard base64):
//! ```text
//! {
//!   "version": 1,
//!   "kdf": { "algorithm": "pbkdf2-sha256", "iterations": 600000 },
//!   "salt": "<32 bytes>",
//!   "nonce": "<12 bytes>",
//!   "cipherText": "<len(plaintext) bytes>",
//!   "tag": "<16 bytes>"
//! }
//! ```
//!
//! `version` and `kdf` may be absent (baseline records); unknown fields are
//! ignored. Baseline records written with PascalCase names (`Salt`, `Nonce`,
//! `CipherText`, `Tag`) are read as well.

use base64::{Engine, engine::general_purpose::STANDARD};
use serde::{Deserialize, Serialize};

use crate::{
    crypto::KdfParams,
    envelope::Envelope,
    error::{Error, Result},
};

/// Current record format version.
pub const VERSION_V1: u8 = 1;

const PBKDF2_SHA256: &str = "pbkdf2-sha256";

#[derive(Serialize, Deserialize)]
struct KdfRecord {
    algorithm: String,
    iterations: u32,
}

#[derive(Serialize, Deserialize)]
struct RecordV1 {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    version: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    kdf: Option<KdfRecord>,
    #[serde(alias = "Salt")]
    salt: String,
    #[serde(alias = "Nonce")]
    nonce: String,
    #[serde(rename = "cipherText", alias = "CipherText")]
    cipher_text: String,
    #[serde(alias = "Tag")]
    tag: String,
}

fn decode_field(field: &str, value: &str) -> Result<Vec<u8>> {
    STANDARD
        .decode(value)
        .map_err(|e| Error::malformed(format!("field `{field}` is not valid base64: {e}")))
}

fn decode_fixed<const N: usize>(field: &str, value: &str) -> Result<[u8; N]> {
    let bytes = decode_field(field, value)?;
    <[u8; N]>::try_from(bytes.as_slice()).map_err(|_| {
        Error::malformed(format!(
            "field `{field}` must be {N} bytes, got {}",
            bytes.len()
        ))
    })
}

/// Parses a v1 record.
///
/// # Errors
///
/// Returns an error if a required field is missing, not base64, or
/// has the wrong length, or if the KDF description is not supported.
pub fn parse(data: &[u8]) -> Result<Envelope> {
    let record: RecordV1 = serde_json::from_slice(data)
        .map_err(|e| Error::malformed(format!("invalid v1 record: {e}")))?;

    let kdf = match record.kdf {
        None => KdfParams::default(),
        Some(kdf) if kdf.algorithm == PBKDF2_SHA256 => KdfParams::new(kdf.iterations)
            .map_err(|e| Error::malformed(e.to_string()))?,
        Some(kdf) => {
            return Err(Error::malformed(format!(
                "unsupported kdf algorithm: {}",
                kdf.algorithm
            )));
        }
    };

    let salt = decode_fixed("salt", &record.salt)?;
    let nonce = decode_fixed("nonce", &record.nonce)?;
    let tag = decode_fixed("tag", &record.tag)?;
    let ciphertext = decode_field("cipherText", &record.cipher_text)?;

    Ok(Envelope::new(kdf, salt, nonce, ciphertext, tag))
}

/// Serializes an envelope to a v1 record.
///
/// # Errors
///
/// Returns an error if the envelope is not v1.
pub fn serialize(envelope: &Envelope) -> Result<Vec<u8>> {
    if envelope.version() != VERSION_V1 {
        return Err(Error::malformed("wrong version for v1 serializer"));
    }

    let record = RecordV1 {
        version: Some(VERSION_V1),
        kdf: Some(KdfRecord {
            algorithm: PBKDF2_SHA256.to_string(),
            iterations: envelope.kdf().iterations(),
        }),
        salt: STANDARD.encode(envelope.salt()),
        nonce: STANDARD.encode(envelope.nonce()),
        cipher_text: STANDARD.encode(envelope.ciphertext()),
        tag: STANDARD.encode(envelope.tag()),
    };

    let mut buf = serde_json::to_vec(&record)
        .map_err(|e| Error::malformed(format!("failed to serialize envelope: {e}")))?;
    buf.push(b'\n');
    Ok(buf)
}
