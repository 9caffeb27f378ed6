//! Platform certificate management.
//!
//! The gateway signs every response and notification with one of its
//! platform certificates, identified by serial number. This module parses
//! those certificates, stores them behind a pluggable [`CertificateStore`],
//! and keeps the set current through [`CertificateCentral`]'s periodic
//! refresh.

mod central;
mod certificate;
mod storage;
mod types;

pub use central::{CertificateCentral, CertificateFetcher, RefreshHandle, RefreshReport};
pub use certificate::{canonical_serial, CertificateError, PlatformCertificate};
pub use storage::{CertificateStore, InMemoryStore, StoreError, StoreResult};
pub use types::{CertificateEntry, CertificateListResponse, EncryptedCertificate};

#[cfg(feature = "file-storage")]
pub use storage::FileStore;
