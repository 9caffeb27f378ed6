//! Wire types for the certificate-listing endpoint.

use serde::{Deserialize, Serialize};

/// Body returned by `GET /v3/certificates`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CertificateListResponse {
    /// Currently valid platform certificates
    #[serde(default)]
    pub data: Vec<CertificateEntry>,
}

/// One listed platform certificate.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CertificateEntry {
    /// Serial number as published by the gateway
    #[serde(default)]
    pub serial_no: String,
    /// Start of validity (RFC 3339)
    #[serde(default)]
    pub effective_time: String,
    /// End of validity (RFC 3339)
    #[serde(default)]
    pub expire_time: String,
    /// The certificate, sealed with the API v3 key. Missing means the entry
    /// is skipped, not the whole listing.
    #[serde(default)]
    pub encrypt_certificate: EncryptedCertificate,
}

/// AEAD-sealed certificate payload.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncryptedCertificate {
    /// Always `AEAD_AES_256_GCM` today
    #[serde(default)]
    pub algorithm: String,
    #[serde(default)]
    pub nonce: String,
    #[serde(default)]
    pub associated_data: String,
    /// Base64 ciphertext with trailing GCM tag
    #[serde(default)]
    pub ciphertext: String,
}
