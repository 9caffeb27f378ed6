//! AEAD_AES_256_GCM codec for gateway-encrypted payloads.
//!
//! Platform certificates and notification resources are both delivered as
//! base64 ciphertext sealed with the merchant's API v3 key, a per-message
//! nonce and associated data.
//!
//! # Wire Format
//!
//! ```text
//! base64([N bytes ciphertext][16 bytes auth tag])
//! ```
//!
//! The nonce (12 bytes) and associated data travel next to the ciphertext
//! as plain strings.

use aes_gcm::{
    aead::{Aead, KeyInit, Payload},
    Aes256Gcm, Nonce,
};
use base64::{engine::general_purpose, Engine};
use std::fmt;

/// Algorithm label carried in encrypted gateway payloads.
pub const AEAD_AES_256_GCM: &str = "AEAD_AES_256_GCM";

/// Size of the API v3 key in bytes.
const KEY_SIZE: usize = 32;

/// Size of the nonce in bytes (96 bits for GCM).
const NONCE_SIZE: usize = 12;

/// AEAD error types.
#[derive(Debug, thiserror::Error)]
pub enum AeadError {
    #[error("ciphertext is not valid base64: {0}")]
    Decode(String),
    #[error("invalid AES-256 key length: expected {KEY_SIZE} bytes, got {0}")]
    InvalidKey(usize),
    #[error("invalid GCM nonce length: expected {NONCE_SIZE} bytes, got {0}")]
    InvalidNonce(usize),
    #[error("authentication tag mismatch")]
    Authentication,
    #[error("encryption failed")]
    Encrypt,
}

/// Result type for AEAD operations.
pub type AeadResult<T> = Result<T, AeadError>;

/// Decrypt a base64 AEAD_AES_256_GCM ciphertext.
///
/// Any failure yields no plaintext.
pub fn decrypt_aes_256_gcm(
    key: &[u8],
    ciphertext_b64: &str,
    nonce: &[u8],
    associated_data: &[u8],
) -> AeadResult<Vec<u8>> {
    let sealed = general_purpose::STANDARD
        .decode(ciphertext_b64)
        .map_err(|e| AeadError::Decode(e.to_string()))?;

    let cipher = cipher_for(key)?;
    let nonce = nonce_from(nonce)?;

    cipher
        .decrypt(
            nonce,
            Payload {
                msg: &sealed,
                aad: associated_data,
            },
        )
        .map_err(|_| AeadError::Authentication)
}

/// Encrypt plaintext into base64 AEAD_AES_256_GCM ciphertext.
///
/// The gateway is the only producer of these payloads in production; this
/// is the inverse used by test gateways and tooling.
pub fn encrypt_aes_256_gcm(
    key: &[u8],
    plaintext: &[u8],
    nonce: &[u8],
    associated_data: &[u8],
) -> AeadResult<String> {
    let cipher = cipher_for(key)?;
    let nonce = nonce_from(nonce)?;

    let sealed = cipher
        .encrypt(
            nonce,
            Payload {
                msg: plaintext,
                aad: associated_data,
            },
        )
        .map_err(|_| AeadError::Encrypt)?;

    Ok(general_purpose::STANDARD.encode(sealed))
}

fn cipher_for(key: &[u8]) -> AeadResult<Aes256Gcm> {
    if key.len() != KEY_SIZE {
        return Err(AeadError::InvalidKey(key.len()));
    }
    Aes256Gcm::new_from_slice(key).map_err(|_| AeadError::InvalidKey(key.len()))
}

fn nonce_from(nonce: &[u8]) -> AeadResult<&Nonce<aes_gcm::aead::consts::U12>> {
    if nonce.len() != NONCE_SIZE {
        return Err(AeadError::InvalidNonce(nonce.len()));
    }
    Ok(Nonce::from_slice(nonce))
}

/// The merchant's API v3 key.
///
/// One key per client, used for every certificate and notification payload.
/// The bytes are cleared when the key is dropped.
#[derive(Clone)]
pub struct ApiV3Key {
    bytes: Vec<u8>,
}

impl ApiV3Key {
    /// Wrap a key, rejecting anything that is not 32 bytes.
    pub fn new(key: impl Into<Vec<u8>>) -> AeadResult<Self> {
        let bytes = key.into();
        if bytes.len() != KEY_SIZE {
            return Err(AeadError::InvalidKey(bytes.len()));
        }
        Ok(Self { bytes })
    }

    /// Decrypt a payload sealed with this key.
    pub fn decrypt(
        &self,
        ciphertext_b64: &str,
        nonce: &str,
        associated_data: &str,
    ) -> AeadResult<Vec<u8>> {
        decrypt_aes_256_gcm(
            &self.bytes,
            ciphertext_b64,
            nonce.as_bytes(),
            associated_data.as_bytes(),
        )
    }

    /// Encrypt a payload with this key.
    pub fn encrypt(
        &self,
        plaintext: &[u8],
        nonce: &str,
        associated_data: &str,
    ) -> AeadResult<String> {
        encrypt_aes_256_gcm(
            &self.bytes,
            plaintext,
            nonce.as_bytes(),
            associated_data.as_bytes(),
        )
    }
}

impl fmt::Debug for ApiV3Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ApiV3Key(***)")
    }
}

impl Drop for ApiV3Key {
    fn drop(&mut self) {
        self.bytes.iter_mut().for_each(|b| *b = 0);
    }
}
