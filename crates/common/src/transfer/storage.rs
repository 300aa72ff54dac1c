use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;

use super::TransferMode;

/// Prefix of files recovered from an encrypted transfer
pub const DECRYPTED_PREFIX: &str = "DECRYPTED_";
/// Prefix of files stored verbatim from a plain transfer
pub const RECEIVED_PREFIX: &str = "RECEIVED_";

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("rejected file name {0:?}")]
    InvalidFilename(String),
    #[error("failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Reduce an untrusted, sender-supplied name to a single path component
///
/// Anything up to the last `/` or `\` is dropped, so `../../etc/passwd`
/// becomes `passwd`. Names that are empty, `.`, `..` or contain control
/// characters after that are rejected outright.
pub fn sanitize_filename(name: &str) -> Result<&str, StorageError> {
    let base = name.rsplit(['/', '\\']).next().unwrap_or_default();

    if base.is_empty() || base == "." || base == ".." || base.chars().any(char::is_control) {
        return Err(StorageError::InvalidFilename(name.to_string()));
    }
    Ok(base)
}

/// Directory received files are written into
#[derive(Debug, Clone)]
pub struct ReceiveDir {
    root: PathBuf,
}

impl ReceiveDir {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Where a file of this mode and declared name would be stored
    pub fn resolve(&self, mode: TransferMode, filename: &str) -> Result<PathBuf, StorageError> {
        let base = sanitize_filename(filename)?;
        let prefix = match mode {
            TransferMode::Encrypted => DECRYPTED_PREFIX,
            TransferMode::Plain => RECEIVED_PREFIX,
        };
        Ok(self.root.join(format!("{}{}", prefix, base)))
    }

    /// Write `data` to a path previously returned by [`resolve`](Self::resolve)
    ///
    /// The data lands in a temporary file next to `path` and is renamed into
    /// place once synced, so a failed write leaves nothing behind. An existing
    /// file of the same name is replaced.
    pub fn persist(&self, path: &Path, data: &[u8]) -> Result<(), StorageError> {
        if path.parent() != Some(self.root.as_path()) {
            return Err(StorageError::InvalidFilename(path.display().to_string()));
        }

        let io_err = |source| StorageError::Io {
            path: path.to_path_buf(),
            source,
        };

        fs::create_dir_all(&self.root).map_err(io_err)?;
        // dropped (and removed) on any early return
        let mut staged = NamedTempFile::new_in(&self.root).map_err(io_err)?;
        staged.write_all(data).map_err(io_err)?;
        staged.as_file().sync_all().map_err(io_err)?;
        staged.persist(path).map_err(|e| io_err(e.error))?;
        Ok(())
    }
}
