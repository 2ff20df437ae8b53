//! Storage collaborators for the sealed envelope.
//!
//! A store holds exactly one envelope; every save replaces the previous one.

use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::crypto::secure_random;
use crate::envelope::Envelope;
use crate::error::{Error, Result};

/// Somewhere a single envelope can be saved to and loaded from.
pub trait SecretStore {
    /// Replaces whatever envelope was stored before. All-or-nothing.
    fn save(&self, envelope: &Envelope) -> Result<()>;

    /// Loads and fully decodes the stored envelope.
    fn load(&self) -> Result<Envelope>;

    /// Returns `true` if an envelope has been saved.
    fn exists(&self) -> bool;
}

impl<T: SecretStore + ?Sized> SecretStore for &T {
    fn save(&self, envelope: &Envelope) -> Result<()> {
        (**self).save(envelope)
    }

    fn load(&self) -> Result<Envelope> {
        (**self).load()
    }

    fn exists(&self) -> bool {
        (**self).exists()
    }
}

/// File-backed store writing the JSON record to a fixed path.
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    /// Creates a new FileStore with the given path.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Returns the path to the storage file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads the raw record from disk.
    pub fn load_bytes(&self) -> Result<Vec<u8>> {
        fs::read(&self.path).map_err(|e| Error::storage(&self.path, e))
    }

    /// Saves data to the storage file using atomic write.
    ///
    /// Data goes to a randomly named temporary file next to the target,
    /// which is fsynced and then renamed over the target; the directory is
    /// fsynced afterwards. A crash leaves either the old or the new file,
    /// never a partial one, and concurrent readers never see a torn record.
    /// A failed save removes its temporary file and leaves the previous
    /// record in place. Once the rename has happened the save counts as
    /// committed; a failing directory fsync after that is only logged.
    ///
    /// Creates parent directories if they don't exist.
    pub fn save_bytes(&self, data: &[u8]) -> Result<()> {
        self.write_atomic(data)
            .map_err(|e| Error::storage(&self.path, e))
    }

    fn write_atomic(&self, data: &[u8]) -> io::Result<()> {
        if let Some(parent) = self.parent() {
            fs::create_dir_all(parent)?;
        }

        let tmp_path = self.random_tmp_path()?;

        // securely create temp file (fail if exists)
        let mut tmp_file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&tmp_path)?;

        if let Err(e) = tmp_file.write_all(data).and_then(|_| tmp_file.sync_all()) {
            drop(tmp_file);
            let _ = fs::remove_file(&tmp_path);
            return Err(e);
        }
        drop(tmp_file);

        if let Err(e) = self.atomic_replace(&tmp_path) {
            let _ = fs::remove_file(&tmp_path);
            return Err(e);
        }

        self.after_commit(self.sync_parent())
    }

    fn sync_parent(&self) -> io::Result<()> {
        match self.parent() {
            Some(parent) => File::open(parent)?.sync_all(),
            None => Ok(()),
        }
    }

    /// The new record is already in place, so a directory sync failure must
    /// not be reported as a failed save.
    fn after_commit(&self, dir_sync: io::Result<()>) -> io::Result<()> {
        if let Err(e) = dir_sync {
            tracing::warn!(
                path = %self.path.display(),
                error = %e,
                "envelope saved but directory fsync failed"
            );
        }
        Ok(())
    }

    fn parent(&self) -> Option<&Path> {
        self.path.parent().filter(|p| !p.as_os_str().is_empty())
    }

    /// Unique temporary path in the same directory:
    /// `filename.tmp.<randomhex>`
    fn random_tmp_path(&self) -> io::Result<PathBuf> {
        let mut buf = [0u8; 8]; // 64 bit entropy
        secure_random(&mut buf).map_err(io::Error::other)?;

        let rand_string = buf.iter().map(|b| format!("{:02x}", b)).collect::<String>();

        let file_name = self
            .path
            .file_name()
            .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "store path has no file name"))?
            .to_string_lossy();

        let tmp_name = format!("{}.tmp.{}", file_name, rand_string);

        Ok(self.path.with_file_name(tmp_name))
    }

    /// Atomically replaces the target file with the temporary file.
    ///
    /// Uses Windows `ReplaceFileW` API with `REPLACEFILE_WRITE_THROUGH` flag
    /// when the target already exists; a first save is a plain rename.
    #[cfg(target_os = "windows")]
    fn atomic_replace(&self, tmp_path: &Path) -> io::Result<()> {
        use std::ffi::OsStr;
        use std::os::windows::ffi::OsStrExt;
        use windows_sys::Win32::Storage::FileSystem::{REPLACEFILE_WRITE_THROUGH, ReplaceFileW};

        if !self.path.exists() {
            return fs::rename(tmp_path, &self.path);
        }

        fn to_wide(s: &OsStr) -> Vec<u16> {
            s.encode_wide().chain(std::iter::once(0)).collect()
        }

        let target_w = to_wide(self.path.as_os_str());
        let tmp_w = to_wide(tmp_path.as_os_str());

        // SAFETY:
        // - Strings are valid UTF-16 and null-terminated
        // - Pointers remain valid during the call
        // - Windows does not retain the pointers after return
        let result = unsafe {
            ReplaceFileW(
                target_w.as_ptr(),
                tmp_w.as_ptr(),
                std::ptr::null(),
                REPLACEFILE_WRITE_THROUGH,
                std::ptr::null(),
                std::ptr::null(),
            )
        };

        if result == 0 {
            return Err(io::Error::last_os_error());
        }

        Ok(())
    }

    /// On Unix, `rename()` is atomic when both paths are on the same filesystem.
    #[cfg(not(target_os = "windows"))]
    fn atomic_replace(&self, tmp_path: &Path) -> io::Result<()> {
        fs::rename(tmp_path, &self.path)
    }
}

impl SecretStore for FileStore {
    fn save(&self, envelope: &Envelope) -> Result<()> {
        let data = envelope.encode()?;
        self.save_bytes(&data)?;
        tracing::info!(path = %self.path.display(), "envelope saved");
        Ok(())
    }

    fn load(&self) -> Result<Envelope> {
        let data = self.load_bytes()?;
        let envelope = Envelope::decode(&data)?;
        tracing::debug!(path = %self.path.display(), "envelope loaded");
        Ok(envelope)
    }

    fn exists(&self) -> bool {
        self.path.exists()
    }
}

/// In-process store, mainly for tests and embedding.
#[derive(Debug, Default)]
pub struct MemoryStore {
    slot: Mutex<Option<Vec<u8>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Option<Vec<u8>>> {
        // the slot only ever holds a complete record, so a poisoned lock is still usable
        self.slot.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl SecretStore for MemoryStore {
    fn save(&self, envelope: &Envelope) -> Result<()> {
        let data = envelope.encode()?;
        *self.lock() = Some(data);
        Ok(())
    }

    fn load(&self) -> Result<Envelope> {
        match self.lock().as_deref() {
            Some(data) => Envelope::decode(data),
            None => Err(Error::NotFound(PathBuf::from("<memory>"))),
        }
    }

    fn exists(&self) -> bool {
        self.lock().is_some()
    }
}
