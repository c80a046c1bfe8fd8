use std::collections::HashMap;
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Component, Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use tracing::warn;

/// Blob storage for uploaded resume documents.
pub trait FileStore: Send + Sync {
    /// Persist `bytes` and return the storage path used to resolve them later.
    fn store(&self, file_name: &str, bytes: &[u8]) -> Result<String, FileStoreError>;
    fn resolve(&self, path: &str) -> Result<Vec<u8>, FileStoreError>;
    fn remove(&self, path: &str) -> Result<(), FileStoreError>;
}

#[derive(Debug, thiserror::Error)]
pub enum FileStoreError {
    #[error("stored file '{0}' not found")]
    NotFound(String),
    #[error("storage path '{0}' escapes the storage root")]
    InvalidPath(String),
    #[error("file storage io error at {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("file storage unavailable: {0}")]
    Unavailable(String),
}

static FILE_SEQUENCE: AtomicU64 = AtomicU64::new(1);

/// Fresh keys tried before giving up on a crowded storage root.
const STORE_ATTEMPTS: usize = 8;

/// Builds `resumes/<millis>-<seq>-<name>` keeping only characters that are safe on any filesystem.
///
/// The sequence restarts with the process, so the timestamp keeps keys from a
/// previous run apart.
fn storage_key(file_name: &str) -> String {
    let sanitized: String = file_name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();
    let sanitized = sanitized.trim_start_matches('.');
    let sanitized = if sanitized.is_empty() {
        "resume"
    } else {
        sanitized
    };
    let seq = FILE_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    let stamp = chrono::Utc::now().timestamp_millis();
    format!("resumes/{stamp}-{seq:06}-{sanitized}")
}

/// Writes `bytes` to a file that must not exist yet.
fn write_new(target: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let mut file = fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(target)?;
    file.write_all(bytes)
}

/// Stores documents beneath a root directory on the local disk.
#[derive(Debug, Clone)]
pub struct LocalFileStore {
    root: PathBuf,
}

impl LocalFileStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn absolute(&self, path: &str) -> Result<PathBuf, FileStoreError> {
        let relative = Path::new(path);
        let escapes = relative
            .components()
            .any(|component| !matches!(component, Component::Normal(_)));
        if path.is_empty() || escapes {
            return Err(FileStoreError::InvalidPath(path.to_string()));
        }
        Ok(self.root.join(relative))
    }
}

impl FileStore for LocalFileStore {
    fn store(&self, file_name: &str, bytes: &[u8]) -> Result<String, FileStoreError> {
        for _ in 0..STORE_ATTEMPTS {
            let key = storage_key(file_name);
            let target = self.absolute(&key)?;
            let io_error = |source| FileStoreError::Io {
                path: target.display().to_string(),
                source,
            };
            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent).map_err(io_error)?;
            }
            match write_new(&target, bytes) {
                Ok(()) => return Ok(key),
                Err(err) if err.kind() == ErrorKind::AlreadyExists => {
                    warn!(key = %key, "storage key already taken, retrying");
                }
                Err(err) => return Err(io_error(err)),
            }
        }
        Err(FileStoreError::Unavailable(format!(
            "no free storage key for '{file_name}' after {STORE_ATTEMPTS} attempts"
        )))
    }

    fn resolve(&self, path: &str) -> Result<Vec<u8>, FileStoreError> {
        let target = self.absolute(path)?;
        fs::read(&target).map_err(|source| match source.kind() {
            ErrorKind::NotFound => FileStoreError::NotFound(path.to_string()),
            _ => FileStoreError::Io {
                path: target.display().to_string(),
                source,
            },
        })
    }

    fn remove(&self, path: &str) -> Result<(), FileStoreError> {
        let target = self.absolute(path)?;
        fs::remove_file(&target).map_err(|source| match source.kind() {
            ErrorKind::NotFound => FileStoreError::NotFound(path.to_string()),
            _ => FileStoreError::Io {
                path: target.display().to_string(),
                source,
            },
        })
    }
}

/// Keeps documents in memory; used by tests and the CLI demo.
#[derive(Debug, Default, Clone)]
pub struct InMemoryFileStore {
    files: Arc<Mutex<HashMap<String, Vec<u8>>>>,
}

impl InMemoryFileStore {
    pub fn len(&self) -> usize {
        self.files.lock().map(|files| files.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl FileStore for InMemoryFileStore {
    fn store(&self, file_name: &str, bytes: &[u8]) -> Result<String, FileStoreError> {
        let key = storage_key(file_name);
        let mut files = self
            .files
            .lock()
            .map_err(|_| FileStoreError::Unavailable("file mutex poisoned".to_string()))?;
        files.insert(key.clone(), bytes.to_vec());
        Ok(key)
    }

    fn resolve(&self, path: &str) -> Result<Vec<u8>, FileStoreError> {
        let files = self
            .files
            .lock()
            .map_err(|_| FileStoreError::Unavailable("file mutex poisoned".to_string()))?;
        files
            .get(path)
            .cloned()
            .ok_or_else(|| FileStoreError::NotFound(path.to_string()))
    }

    fn remove(&self, path: &str) -> Result<(), FileStoreError> {
        let mut files = self
            .files
            .lock()
            .map_err(|_| FileStoreError::Unavailable("file mutex poisoned".to_string()))?;
        files
            .remove(path)
            .map(|_| ())
            .ok_or_else(|| FileStoreError::NotFound(path.to_string()))
    }
}
