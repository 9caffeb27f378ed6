//! Parsed platform certificates.

use rsa::pkcs8::DecodePublicKey;
use rsa::RsaPublicKey;
use x509_parser::parse_x509_certificate;
use x509_parser::pem::parse_x509_pem;

const PEM_PREFIX: &[u8] = b"-----BEGIN";
const CERTIFICATE_LABEL: &str = "CERTIFICATE";

/// Certificate parse errors.
#[derive(Debug, thiserror::Error)]
pub enum CertificateError {
    #[error("failed to decode PEM block containing certificate: {0}")]
    Pem(String),
    #[error("failed to parse certificate: {0}")]
    Der(String),
    #[error("unsupported public key: {0}")]
    UnsupportedKey(String),
}

/// A gateway-issued certificate used to verify responses and notifications.
///
/// The raw blob is kept exactly as supplied so stores can persist it and
/// hand it back through `load`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PlatformCertificate {
    serial_no: String,
    public_key: RsaPublicKey,
    not_before: i64,
    not_after: i64,
    raw: Vec<u8>,
}

impl PlatformCertificate {
    /// Parse a PEM or DER encoded X.509 certificate.
    pub fn parse(raw: &[u8]) -> Result<Self, CertificateError> {
        if raw.trim_ascii_start().starts_with(PEM_PREFIX) {
            let (_, pem) = parse_x509_pem(raw).map_err(|e| CertificateError::Pem(e.to_string()))?;
            if pem.label != CERTIFICATE_LABEL {
                return Err(CertificateError::Pem(format!(
                    "unexpected PEM label {}",
                    pem.label
                )));
            }
            Self::from_parts(&pem.contents, raw)
        } else {
            Self::from_parts(raw, raw)
        }
    }

    fn from_parts(der: &[u8], raw: &[u8]) -> Result<Self, CertificateError> {
        let (_, cert) =
            parse_x509_certificate(der).map_err(|e| CertificateError::Der(e.to_string()))?;

        let public_key = RsaPublicKey::from_public_key_der(cert.public_key().raw)
            .map_err(|e| CertificateError::UnsupportedKey(e.to_string()))?;

        let validity = cert.validity();

        Ok(Self {
            serial_no: canonical_serial(cert.raw_serial()),
            public_key,
            not_before: validity.not_before.timestamp(),
            not_after: validity.not_after.timestamp(),
            raw: raw.to_vec(),
        })
    }

    /// Serial number as uppercase hex.
    pub fn serial_no(&self) -> &str {
        &self.serial_no
    }

    /// RSA public key used for signature verification.
    pub fn public_key(&self) -> &RsaPublicKey {
        &self.public_key
    }

    /// Start of the validity window (unix seconds).
    pub fn not_before(&self) -> i64 {
        self.not_before
    }

    /// End of the validity window (unix seconds).
    pub fn not_after(&self) -> i64 {
        self.not_after
    }

    /// Whether `now` (unix seconds) falls past the validity window.
    ///
    /// Informational only: verification does not consult it.
    pub fn is_expired_at(&self, now: i64) -> bool {
        now > self.not_after
    }

    /// The blob this certificate was parsed from.
    pub fn raw(&self) -> &[u8] {
        &self.raw
    }
}

/// Uppercase hex of the serial's big-endian magnitude.
///
/// DER encodes positive serials with a leading zero byte when the high bit
/// is set; that sign byte is not part of the serial number.
pub fn canonical_serial(raw_serial: &[u8]) -> String {
    let start = raw_serial
        .iter()
        .position(|b| *b != 0)
        .unwrap_or(raw_serial.len());
    hex::encode_upper(&raw_serial[start..])
}
