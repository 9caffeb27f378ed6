//! Outbound request signing.
//!
//! Every request to the gateway carries an `Authorization` header built
//! from a SHA256-RSA2048 (PKCS#1 v1.5) signature over the canonical
//! request message:
//!
//! ```text
//! METHOD\n
//! REQUEST_URI\n
//! TIMESTAMP\n
//! NONCE\n
//! BODY\n
//! ```
//!
//! The header layout is fixed by the gateway and must match byte for byte:
//!
//! ```text
//! WECHATPAY2-SHA256-RSA2048 mchid="..",nonce_str="..",timestamp="..",serial_no="..",signature=".."
//! ```

use std::fmt;

use base64::{engine::general_purpose, Engine};
use rand::RngCore;
use rsa::pkcs1::DecodeRsaPrivateKey;
use rsa::pkcs1v15::{Signature, SigningKey, VerifyingKey};
use rsa::pkcs8::DecodePrivateKey;
use rsa::signature::{SignatureEncoding, Signer as _, Verifier as _};
use rsa::RsaPrivateKey;
use sha2::Sha256;

use crate::{Result, WechatPayError, AUTHORIZATION_SCHEMA};

/// Random bytes per nonce; hex encoding doubles this.
const NONCE_BYTES: usize = 16;

/// Build a canonical signature message: each field followed by `\n`.
///
/// Outbound requests use five fields (method, uri, timestamp, nonce, body);
/// inbound responses and notifications use three (timestamp, nonce, body).
pub fn build_message(fields: &[&[u8]]) -> Vec<u8> {
    let len = fields.iter().map(|f| f.len() + 1).sum();
    let mut message = Vec::with_capacity(len);
    for field in fields {
        message.extend_from_slice(field);
        message.push(b'\n');
    }
    message
}

/// Fresh request nonce: 32 uppercase hex characters.
pub fn generate_nonce() -> String {
    let mut bytes = [0u8; NONCE_BYTES];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode_upper(bytes)
}

/// Current unix time in seconds.
pub fn current_timestamp() -> i64 {
    chrono::Utc::now().timestamp()
}

/// Parse a merchant private key in PKCS#8 or PKCS#1 PEM form.
pub fn parse_private_key(pem: &str) -> Result<RsaPrivateKey> {
    RsaPrivateKey::from_pkcs8_pem(pem)
        .or_else(|_| RsaPrivateKey::from_pkcs1_pem(pem))
        .map_err(|e| WechatPayError::config(format!("invalid merchant private key: {}", e)))
}

/// Merchant identity plus the key that signs on its behalf.
///
/// The key is parsed once at construction and never changes.
#[derive(Clone)]
pub struct Signer {
    mchid: String,
    serial_no: String,
    signing_key: SigningKey<Sha256>,
    verifying_key: VerifyingKey<Sha256>,
}

impl Signer {
    /// Create a signer from an already parsed key.
    pub fn new(
        mchid: impl Into<String>,
        serial_no: impl Into<String>,
        private_key: RsaPrivateKey,
    ) -> Self {
        let verifying_key = VerifyingKey::<Sha256>::new(private_key.to_public_key());
        Self {
            mchid: mchid.into(),
            serial_no: serial_no.into(),
            signing_key: SigningKey::<Sha256>::new(private_key),
            verifying_key,
        }
    }

    /// Create a signer from a PEM encoded merchant key.
    pub fn from_pem(
        mchid: impl Into<String>,
        serial_no: impl Into<String>,
        private_key_pem: &str,
    ) -> Result<Self> {
        let key = parse_private_key(private_key_pem)?;
        Ok(Self::new(mchid, serial_no, key))
    }

    /// Merchant id.
    pub fn mchid(&self) -> &str {
        &self.mchid
    }

    /// Serial number of the merchant certificate.
    pub fn serial_no(&self) -> &str {
        &self.serial_no
    }

    /// Sign a canonical message and return the base64 signature.
    ///
    /// The signature is checked against the merchant public key before it
    /// is returned; a signature that does not verify is an error.
    pub fn sign(&self, message: &[u8]) -> Result<String> {
        let signature: Signature = self
            .signing_key
            .try_sign(message)
            .map_err(|e| WechatPayError::Internal(format!("signing failed: {}", e)))?;

        self.verifying_key
            .verify(message, &signature)
            .map_err(|_| WechatPayError::Internal("produced signature does not verify".into()))?;

        Ok(general_purpose::STANDARD.encode(signature.to_bytes()))
    }

    /// Build the `Authorization` header value for a request, using the
    /// current time and a fresh nonce.
    pub fn authorization(&self, method: &str, request_uri: &str, body: &[u8]) -> Result<String> {
        self.authorization_at(
            method,
            request_uri,
            body,
            current_timestamp(),
            &generate_nonce(),
        )
    }

    /// Build the `Authorization` header value with an explicit timestamp
    /// and nonce.
    pub fn authorization_at(
        &self,
        method: &str,
        request_uri: &str,
        body: &[u8],
        timestamp: i64,
        nonce: &str,
    ) -> Result<String> {
        let timestamp = timestamp.to_string();
        let message = build_message(&[
            method.as_bytes(),
            request_uri.as_bytes(),
            timestamp.as_bytes(),
            nonce.as_bytes(),
            body,
        ]);
        let signature = self.sign(&message)?;

        Ok(format!(
            "{} mchid=\"{}\",nonce_str=\"{}\",timestamp=\"{}\",serial_no=\"{}\",signature=\"{}\"",
            AUTHORIZATION_SCHEMA, self.mchid, nonce, timestamp, self.serial_no, signature
        ))
    }
}

impl fmt::Debug for Signer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Signer")
            .field("mchid", &self.mchid)
            .field("serial_no", &self.serial_no)
            .finish_non_exhaustive()
    }
}
