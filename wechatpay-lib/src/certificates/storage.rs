//! Platform certificate storage implementations.

use super::certificate::{CertificateError, PlatformCertificate};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

/// Error type for storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("cert not exists: {0}")]
    NotFound(String),
    #[error(transparent)]
    Parse(#[from] CertificateError),
    #[error("Storage I/O error: {0}")]
    Io(String),
    #[error("Storage error: {0}")]
    Other(String),
}

impl From<std::io::Error> for StoreError {
    fn from(e: std::io::Error) -> Self {
        StoreError::Io(e.to_string())
    }
}

/// Result type for storage operations.
pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Persistence for platform certificates keyed by serial number.
///
/// Implementations must tolerate concurrent readers alongside the single
/// refresh writer without callers adding their own locking. A `set` either
/// fully succeeds (visible to later `get`s) or leaves the previous entry
/// untouched.
#[async_trait]
pub trait CertificateStore: Send + Sync {
    /// Return previously persisted raw certificate blobs. May be empty.
    async fn load(&self) -> StoreResult<Vec<Vec<u8>>>;

    /// Get the certificate for a serial number.
    async fn get(&self, serial_no: &str) -> StoreResult<Arc<PlatformCertificate>>;

    /// Parse `raw` and store it under `serial_no`, replacing any previous entry.
    async fn set(&self, serial_no: &str, raw: &[u8]) -> StoreResult<()>;

    /// Number of certificates held.
    async fn count(&self) -> StoreResult<usize>;
}

#[async_trait]
impl<S: CertificateStore + ?Sized> CertificateStore for Arc<S> {
    async fn load(&self) -> StoreResult<Vec<Vec<u8>>> {
        (**self).load().await
    }

    async fn get(&self, serial_no: &str) -> StoreResult<Arc<PlatformCertificate>> {
        (**self).get(serial_no).await
    }

    async fn set(&self, serial_no: &str, raw: &[u8]) -> StoreResult<()> {
        (**self).set(serial_no, raw).await
    }

    async fn count(&self) -> StoreResult<usize> {
        (**self).count().await
    }
}

fn lock_error(context: &str) -> StoreError {
    StoreError::Other(format!("lock poisoned during {}", context))
}

/// In-memory certificate storage.
///
/// Nothing survives a restart, so `load` is always empty. Entries are held
/// behind `Arc` and swapped whole, so readers never observe a partial update.
pub struct InMemoryStore {
    certs: RwLock<HashMap<String, Arc<PlatformCertificate>>>,
}

impl InMemoryStore {
    /// Create a new in-memory store.
    pub fn new() -> Self {
        Self {
            certs: RwLock::new(HashMap::new()),
        }
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CertificateStore for InMemoryStore {
    async fn load(&self) -> StoreResult<Vec<Vec<u8>>> {
        Ok(Vec::new())
    }

    async fn get(&self, serial_no: &str) -> StoreResult<Arc<PlatformCertificate>> {
        let certs = self.certs.read().map_err(|_| lock_error("get"))?;
        certs
            .get(serial_no)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(serial_no.to_string()))
    }

    async fn set(&self, serial_no: &str, raw: &[u8]) -> StoreResult<()> {
        let cert = Arc::new(PlatformCertificate::parse(raw)?);
        let mut certs = self.certs.write().map_err(|_| lock_error("set"))?;
        certs.insert(serial_no.to_string(), cert);
        Ok(())
    }

    async fn count(&self) -> StoreResult<usize> {
        let certs = self.certs.read().map_err(|_| lock_error("count"))?;
        Ok(certs.len())
    }
}

/// File-backed certificate storage.
///
/// Each certificate is written as `<SERIAL>.pem` holding the raw blob, so the
/// set survives restarts and `load` can hand it back at bootstrap.
#[cfg(feature = "file-storage")]
pub struct FileStore {
    base_path: std::path::PathBuf,
    cache: RwLock<HashMap<String, Arc<PlatformCertificate>>>,
}

#[cfg(feature = "file-storage")]
impl FileStore {
    /// Create a store rooted at `base_path`, creating the directory if needed.
    pub fn new<P: AsRef<std::path::Path>>(base_path: P) -> std::io::Result<Self> {
        let path = base_path.as_ref().to_path_buf();
        std::fs::create_dir_all(&path)?;
        Ok(Self {
            base_path: path,
            cache: RwLock::new(HashMap::new()),
        })
    }

    /// Directory holding the certificate files.
    pub fn base_path(&self) -> &std::path::Path {
        &self.base_path
    }

    fn cert_path(&self, serial_no: &str) -> StoreResult<std::path::PathBuf> {
        if serial_no.is_empty() || !serial_no.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(StoreError::Other(format!(
                "invalid serial number for file name: {:?}",
                serial_no
            )));
        }
        Ok(self.base_path.join(format!("{}.pem", serial_no)))
    }
}

#[cfg(feature = "file-storage")]
#[async_trait]
impl CertificateStore for FileStore {
    async fn load(&self) -> StoreResult<Vec<Vec<u8>>> {
        let mut blobs = Vec::new();
        for entry in std::fs::read_dir(&self.base_path)? {
            let path = entry?.path();
            if path.extension().map(|e| e == "pem").unwrap_or(false) {
                blobs.push(std::fs::read(&path)?);
            }
        }
        Ok(blobs)
    }

    async fn get(&self, serial_no: &str) -> StoreResult<Arc<PlatformCertificate>> {
        if let Some(cert) = self
            .cache
            .read()
            .map_err(|_| lock_error("get"))?
            .get(serial_no)
        {
            return Ok(cert.clone());
        }

        let path = self.cert_path(serial_no)?;
        if !path.exists() {
            return Err(StoreError::NotFound(serial_no.to_string()));
        }

        let cert = Arc::new(PlatformCertificate::parse(&std::fs::read(&path)?)?);
        self.cache
            .write()
            .map_err(|_| lock_error("get"))?
            .insert(serial_no.to_string(), cert.clone());
        Ok(cert)
    }

    async fn set(&self, serial_no: &str, raw: &[u8]) -> StoreResult<()> {
        let cert = Arc::new(PlatformCertificate::parse(raw)?);
        let path = self.cert_path(serial_no)?;

        // Write-then-rename so a crash never leaves a truncated certificate.
        let tmp = path.with_extension("pem.tmp");
        std::fs::write(&tmp, raw)?;
        if let Err(e) = std::fs::rename(&tmp, &path) {
            let _ = std::fs::remove_file(&tmp);
            return Err(e.into());
        }

        self.cache
            .write()
            .map_err(|_| lock_error("set"))?
            .insert(serial_no.to_string(), cert);
        Ok(())
    }

    async fn count(&self) -> StoreResult<usize> {
        let mut total = 0;
        for entry in std::fs::read_dir(&self.base_path)? {
            let path = entry?.path();
            if path.extension().map(|e| e == "pem").unwrap_or(false) {
                total += 1;
            }
        }
        Ok(total)
    }
}
