use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Errors surfaced by sealing, opening and storing a secret.
#[derive(Debug, Error)]
pub enum Error {
    /// Tag verification failed. Wrong password and tampered data are
    /// deliberately reported the same way.
    #[error("Invalid password or corrupted data")]
    AuthenticationFailure,

    /// The stored record could not be decoded into an envelope.
    #[error("malformed envelope: {0}")]
    MalformedEnvelope(String),

    /// Nothing has been stored at the given location yet.
    #[error("no secret stored at {}", .0.display())]
    NotFound(PathBuf),

    #[error("storage error at {}: {source}", .path.display())]
    Storage {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("invalid key derivation parameters: {0}")]
    InvalidKdfParams(String),

    #[error("OS random generator unavailable")]
    RandomUnavailable,

    #[error("encryption failed")]
    Encryption,

    #[error("decrypted secret is not valid UTF-8")]
    InvalidUtf8,
}

impl Error {
    pub(crate) fn malformed(msg: impl Into<String>) -> Self {
        Error::MalformedEnvelope(msg.into())
    }

    pub(crate) fn storage(path: impl Into<PathBuf>, source: io::Error) -> Self {
        let path = path.into();
        if source.kind() == io::ErrorKind::NotFound {
            Error::NotFound(path)
        } else {
            Error::Storage { path, source }
        }
    }

    /// Returns `true` for failures raised by the storage collaborator.
    pub fn is_storage(&self) -> bool {
        matches!(self, Error::NotFound(_) | Error::Storage { .. })
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
