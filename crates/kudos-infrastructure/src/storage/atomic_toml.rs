//! Crash-safe TOML documents.
//!
//! Writes go to a hidden sibling file which is fsynced and renamed over the
//! target. Read-modify-write cycles hold an exclusive `fs2` lock on a
//! `.lock` sibling for their whole duration.

use std::fs::{self, File, OpenOptions};
use std::io::Write as IoWrite;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};

use kudos_core::KudosError;
use serde::{Serialize, de::DeserializeOwned};

/// Errors raised by [`AtomicTomlFile`].
#[derive(Debug)]
pub enum AtomicTomlError {
    Io { path: PathBuf, source: std::io::Error },
    Parse { path: PathBuf, source: toml::de::Error },
    Serialize(toml::ser::Error),
    Lock { path: PathBuf, message: String },
    /// Rejected by the caller's update function.
    Rejected(String),
}

impl std::fmt::Display for AtomicTomlError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AtomicTomlError::Io { path, source } => write!(f, "I/O error on {}: {}", path.display(), source),
            AtomicTomlError::Parse { path, source } => {
                write!(f, "TOML parse error in {}: {}", path.display(), source)
            }
            AtomicTomlError::Serialize(e) => write!(f, "TOML serialization error: {}", e),
            AtomicTomlError::Lock { path, message } => {
                write!(f, "Failed to lock {}: {}", path.display(), message)
            }
            AtomicTomlError::Rejected(message) => write!(f, "Update rejected: {}", message),
        }
    }
}

impl std::error::Error for AtomicTomlError {}

impl From<toml::ser::Error> for AtomicTomlError {
    fn from(e: toml::ser::Error) -> Self {
        AtomicTomlError::Serialize(e)
    }
}

impl From<AtomicTomlError> for KudosError {
    fn from(e: AtomicTomlError) -> Self {
        match e {
            AtomicTomlError::Io { .. } => KudosError::io(e.to_string()),
            AtomicTomlError::Parse { .. } | AtomicTomlError::Serialize(_) => KudosError::Serialization {
                format: "toml".to_string(),
                message: e.to_string(),
            },
            AtomicTomlError::Lock { .. } => KudosError::data_access(e.to_string()),
            AtomicTomlError::Rejected(message) => KudosError::data_access(message),
        }
    }
}

fn io_error(path: &Path) -> impl FnOnce(std::io::Error) -> AtomicTomlError + '_ {
    move |source| AtomicTomlError::Io {
        path: path.to_path_buf(),
        source,
    }
}

/// A TOML file holding one `T`.
#[derive(Debug)]
pub struct AtomicTomlFile<T> {
    path: PathBuf,
    _phantom: PhantomData<fn() -> T>,
}

impl<T> AtomicTomlFile<T>
where
    T: Serialize + DeserializeOwned,
{
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            _phantom: PhantomData,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads the document.
    ///
    /// # Returns
    ///
    /// - `Ok(Some(T))`: Document parsed
    /// - `Ok(None)`: File missing or blank
    /// - `Err(_)`: File unreadable or malformed
    pub fn load(&self) -> Result<Option<T>, AtomicTomlError> {
        if !self.path.exists() {
            return Ok(None);
        }
        let content = fs::read_to_string(&self.path).map_err(io_error(&self.path))?;
        if content.trim().is_empty() {
            return Ok(None);
        }
        toml::from_str(&content)
            .map(Some)
            .map_err(|source| AtomicTomlError::Parse {
                path: self.path.clone(),
                source,
            })
    }

    /// Writes the document via temp file, fsync and rename.
    pub fn save(&self, data: &T) -> Result<(), AtomicTomlError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent).map_err(io_error(parent))?;
            }
        }

        let content = toml::to_string_pretty(data)?;
        let tmp_path = self.temp_path();
        let mut tmp_file = File::create(&tmp_path).map_err(io_error(&tmp_path))?;
        tmp_file
            .write_all(content.as_bytes())
            .map_err(io_error(&tmp_path))?;
        tmp_file.sync_all().map_err(io_error(&tmp_path))?;
        drop(tmp_file);

        fs::rename(&tmp_path, &self.path).map_err(io_error(&self.path))
    }

    /// Locked read-modify-write.
    ///
    /// `change` sees the stored document (or `default` when there is none).
    /// The document is written back only if `change` returns `Ok`.
    pub fn update<F, R>(&self, default: T, change: F) -> Result<R, AtomicTomlError>
    where
        F: FnOnce(&mut T) -> Result<R, AtomicTomlError>,
    {
        let _lock = FileLock::acquire(&self.path)?;
        let mut data = self.load()?.unwrap_or(default);
        let result = change(&mut data)?;
        self.save(&data)?;
        Ok(result)
    }

    fn temp_path(&self) -> PathBuf {
        let file_name = self
            .path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "document".to_string());
        self.path.with_file_name(format!(".{file_name}.tmp"))
    }
}

/// Exclusive lock on `<path>.lock`, released on drop.
struct FileLock {
    _file: File,
    lock_path: PathBuf,
}

impl FileLock {
    fn acquire(path: &Path) -> Result<Self, AtomicTomlError> {
        let lock_path = path.with_extension("lock");
        if let Some(parent) = lock_path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent).map_err(io_error(parent))?;
            }
        }

        let file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(false)
            .open(&lock_path)
            .map_err(io_error(&lock_path))?;

        #[cfg(unix)]
        {
            use fs2::FileExt;
            file.lock_exclusive().map_err(|e| AtomicTomlError::Lock {
                path: lock_path.clone(),
                message: e.to_string(),
            })?;
        }

        Ok(FileLock {
            _file: file,
            lock_path,
        })
    }
}

impl Drop for FileLock {
    fn drop(&mut self) {
        let _ = fs::remove_file(&self.lock_path);
    }
}
