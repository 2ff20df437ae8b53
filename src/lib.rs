//! Seal a single secret message under a password.
//!
//! A key is derived from the password with PBKDF2-HMAC-SHA256 and a fresh
//! random salt, the message is encrypted with AES-256-GCM under a fresh
//! random nonce, and salt, nonce, ciphertext and tag are kept together in an
//! [`Envelope`] that a [`SecretStore`] persists.

pub mod crypto;
mod envelope;
mod error;
pub mod format;
pub mod storage;

pub use crate::crypto::KdfParams;
pub use crate::envelope::{Envelope, EnvelopeInfo};
pub use crate::error::{Error, Result};
pub use crate::storage::{FileStore, MemoryStore, SecretStore};

use directories::{ProjectDirs, UserDirs};
use zeroize::Zeroizing;

/// File name of the sealed message in the default location.
pub const DEFAULT_FILE_NAME: &str = "secret-message.json";

/// Encrypts `message` under `password` with the default KDF cost.
pub fn encrypt(message: &str, password: &str) -> Result<Envelope> {
    encrypt_with_kdf(message, password, KdfParams::default())
}

/// Encrypts `message` under `password`.
///
/// Draws a new salt and nonce from the OS random generator on every call, so
/// sealing the same message twice gives unrelated envelopes.
pub fn encrypt_with_kdf(message: &str, password: &str, kdf: KdfParams) -> Result<Envelope> {
    let salt = crypto::generate_salt()?;
    let key = crypto::derive_key(password, &salt, kdf)?;

    let nonce = crypto::generate_nonce()?;
    let (ciphertext, tag) = crypto::encrypt(&key, &nonce, message.as_bytes())?;
    drop(key);

    tracing::debug!(len = ciphertext.len(), "message encrypted");

    Ok(Envelope::new(kdf, salt, nonce, ciphertext, tag))
}

/// Recovers the message sealed in `envelope`.
///
/// # Errors
///
/// [`Error::AuthenticationFailure`] if the password is wrong or any part of
/// the envelope was altered; the two cases are indistinguishable.
pub fn decrypt(envelope: &Envelope, password: &str) -> Result<Zeroizing<String>> {
    let key = crypto::derive_key(password, envelope.salt(), *envelope.kdf())?;

    let plaintext = crypto::decrypt(&key, envelope.nonce(), envelope.ciphertext(), envelope.tag())
        .inspect_err(|_| tracing::warn!("envelope failed authentication"))?;
    drop(key);

    let message = std::str::from_utf8(&plaintext).map_err(|_| Error::InvalidUtf8)?;
    Ok(Zeroizing::new(message.to_owned()))
}

/// A sealed message bound to the store that holds it.
pub struct SealNote<S> {
    store: S,
    kdf: KdfParams,
}

impl<S: SecretStore> SealNote<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            kdf: KdfParams::default(),
        }
    }

    /// Uses `kdf` for subsequent seals. Opening always uses the parameters
    /// recorded in the stored envelope.
    pub fn with_kdf(mut self, kdf: KdfParams) -> Self {
        self.kdf = kdf;
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Encrypts `message` and replaces the stored envelope with it.
    ///
    /// Nothing is written if encryption fails.
    pub fn seal(&self, message: &str, password: &str) -> Result<Envelope> {
        let envelope = encrypt_with_kdf(message, password, self.kdf)?;
        self.store.save(&envelope)?;
        Ok(envelope)
    }

    /// Loads the stored envelope and decrypts it.
    pub fn open(&self, password: &str) -> Result<Zeroizing<String>> {
        let envelope = self.store.load()?;
        decrypt(&envelope, password)
    }

    /// Public metadata of the stored envelope; needs no password.
    pub fn info(&self) -> Result<EnvelopeInfo> {
        Ok(self.store.load()?.info())
    }
}

/// The default store: `secret-message.json` in the user's documents
/// directory, or in the platform data directory when there is none.
pub fn default_store() -> Result<FileStore> {
    if let Some(docs) = UserDirs::new().and_then(|u| u.document_dir().map(|d| d.to_path_buf())) {
        return Ok(FileStore::new(docs.join(DEFAULT_FILE_NAME)));
    }

    let project_dirs = ProjectDirs::from("", "", "sealnote").ok_or_else(|| {
        Error::storage(
            DEFAULT_FILE_NAME,
            std::io::Error::other("could not determine platform directories"),
        )
    })?;

    Ok(FileStore::new(project_dirs.data_dir().join(DEFAULT_FILE_NAME)))
}
