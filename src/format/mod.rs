//! On-disk record format for the envelope.
//!
//! Records are JSON objects. The `version` field selects the parser; records
//! written before versioning existed carry no `version` and are read as v1.

use serde::Deserialize;

use crate::envelope::Envelope;
use crate::error::{Error, Result};

pub mod v1;

/// Latest format version
pub const CURRENT_VERSION: u8 = v1::VERSION_V1;

#[derive(Deserialize)]
struct VersionProbe {
    #[serde(default)]
    version: Option<u8>,
}

/// Parses a stored record, dispatching on its version.
///
/// # Errors
///
/// Returns [`Error::MalformedEnvelope`] if:
/// - The record is not a JSON object
/// - The version is unsupported
/// - The versioned parser rejects it
pub fn parse(data: &[u8]) -> Result<Envelope> {
    let probe: VersionProbe = serde_json::from_slice(data)
        .map_err(|e| Error::malformed(format!("not an envelope record: {e}")))?;

    match probe.version {
        None | Some(v1::VERSION_V1) => v1::parse(data),
        Some(other) => Err(Error::malformed(format!(
            "unsupported envelope version: {other}"
        ))),
    }
}

/// Serializes an envelope in the format matching its version.
pub fn serialize(envelope: &Envelope) -> Result<Vec<u8>> {
    match envelope.version() {
        v1::VERSION_V1 => v1::serialize(envelope),
        other => Err(Error::malformed(format!(
            "unsupported envelope version: {other}"
        ))),
    }
}
