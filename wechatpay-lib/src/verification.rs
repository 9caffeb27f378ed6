//! Inbound signature verification.
//!
//! Responses and notifications are signed by the gateway over a three-line
//! message (`TIMESTAMP\nNONCE\nBODY\n`), with the signer's certificate
//! serial and the base64 signature carried in `Wechatpay-*` headers.

use std::sync::Arc;

use base64::{engine::general_purpose, Engine};
use rsa::pkcs1v15::{Signature, VerifyingKey};
use rsa::signature::Verifier as _;
use sha2::Sha256;

use crate::certificates::{CertificateCentral, PlatformCertificate};
use crate::signing::build_message;
use crate::{Result, WechatPayError};

/// Header carrying the signing timestamp.
pub const HEADER_TIMESTAMP: &str = "Wechatpay-Timestamp";
/// Header carrying the signing nonce.
pub const HEADER_NONCE: &str = "Wechatpay-Nonce";
/// Header carrying the platform certificate serial.
pub const HEADER_SERIAL: &str = "Wechatpay-Serial";
/// Header carrying the base64 signature.
pub const HEADER_SIGNATURE: &str = "Wechatpay-Signature";

/// The four signature headers of an inbound message.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SignatureHeaders {
    pub timestamp: String,
    pub nonce: String,
    pub serial_no: String,
    pub signature: String,
}

impl SignatureHeaders {
    /// Collect the headers through a case-insensitive lookup.
    ///
    /// Returns `VerificationFailed` if any of them is missing: an unsigned
    /// message cannot be trusted.
    pub fn from_lookup<'a, F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<&'a str>,
    {
        let serial_no = lookup(HEADER_SERIAL).unwrap_or_default().to_string();
        let get = |name: &str| {
            lookup(name)
                .map(str::to_string)
                .ok_or_else(|| WechatPayError::verification_failed(serial_no.clone()))
        };

        Ok(Self {
            timestamp: get(HEADER_TIMESTAMP)?,
            nonce: get(HEADER_NONCE)?,
            serial_no: get(HEADER_SERIAL)?,
            signature: get(HEADER_SIGNATURE)?,
        })
    }

    /// Collect the headers from name/value pairs.
    pub fn from_pairs(headers: &[(String, String)]) -> Result<Self> {
        Self::from_lookup(|name| {
            headers
                .iter()
                .find(|(k, _)| k.eq_ignore_ascii_case(name))
                .map(|(_, v)| v.as_str())
        })
    }
}

/// Check an RSA-SHA256 signature over the inbound message.
///
/// Returns `false` on undecodable base64 or any mismatch.
pub fn verify_with_certificate(
    cert: &PlatformCertificate,
    timestamp: &str,
    nonce: &str,
    signature_b64: &str,
    body: &[u8],
) -> bool {
    let Ok(raw) = general_purpose::STANDARD.decode(signature_b64) else {
        return false;
    };
    let Ok(signature) = Signature::try_from(raw.as_slice()) else {
        return false;
    };

    let message = build_message(&[timestamp.as_bytes(), nonce.as_bytes(), body]);
    VerifyingKey::<Sha256>::new(cert.public_key().clone())
        .verify(&message, &signature)
        .is_ok()
}

/// Verifies inbound messages against the live certificate set.
#[derive(Clone)]
pub struct Verifier {
    central: Arc<CertificateCentral>,
}

impl Verifier {
    /// Create a verifier over a certificate central.
    pub fn new(central: Arc<CertificateCentral>) -> Self {
        Self { central }
    }

    /// Verify a signed inbound message.
    ///
    /// An unknown serial counts as a failed verification, not an error.
    pub async fn verify(
        &self,
        timestamp: &str,
        nonce: &str,
        serial_no: &str,
        signature_b64: &str,
        body: &[u8],
    ) -> bool {
        let cert = match self.central.get_cert(serial_no).await {
            Ok(cert) => cert,
            Err(e) => {
                tracing::warn!(serial_no = %serial_no, error = %e, "no platform certificate for signature");
                return false;
            }
        };

        let valid = verify_with_certificate(&cert, timestamp, nonce, signature_b64, body);
        if !valid {
            tracing::warn!(serial_no = %serial_no, "signature verification failed");
        }
        valid
    }

    /// Verify using collected headers, failing with `VerificationFailed`.
    pub async fn verify_headers(&self, headers: &SignatureHeaders, body: &[u8]) -> Result<()> {
        if self
            .verify(
                &headers.timestamp,
                &headers.nonce,
                &headers.serial_no,
                &headers.signature,
                body,
            )
            .await
        {
            Ok(())
        } else {
            Err(WechatPayError::verification_failed(&headers.serial_no))
        }
    }
}
