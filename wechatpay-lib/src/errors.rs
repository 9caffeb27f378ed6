//! Error types for WeChat Pay operations.
//!
//! `WechatPayError` is the error surfaced by every public operation of the
//! crate. Module-level errors (`AeadError`, `StoreError`, `CertificateError`)
//! convert into it so callers only need to match one type.

use std::fmt;

use crate::certificates::{CertificateError, StoreError};
use crate::crypto::AeadError;

/// Stable numeric error codes for logging and FFI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum WechatPayErrorCode {
    /// Bad key material or configuration
    Config = 1000,
    /// Transport/network layer error
    Transport = 2000,
    /// Connection failed
    ConnectionFailed = 2001,
    /// Connection timeout
    ConnectionTimeout = 2002,
    /// Gateway answered with a non-success status
    Api = 3000,
    /// Malformed gateway response
    Protocol = 3001,
    /// Signature mismatch or unknown signer
    VerificationFailed = 4000,
    /// No platform certificate for the serial number
    CertificateNotFound = 4001,
    /// Certificate could not be parsed
    Certificate = 4002,
    /// AEAD decryption failed
    Decryption = 5000,
    /// Serialization error
    Serialization = 5001,
    /// Certificate store error
    Storage = 7000,
    /// Internal/unexpected error
    Internal = 9999,
}

/// Detail object attached to gateway error responses.
#[derive(Clone, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ApiErrorDetail {
    /// Offending field
    #[serde(default)]
    pub field: String,
    /// Offending value, as sent (string or number)
    #[serde(default)]
    pub value: serde_json::Value,
    /// Issue description
    #[serde(default)]
    pub issue: String,
    /// Where the field was found (body, query, ...)
    #[serde(default)]
    pub location: String,
}

/// Error body returned by the gateway on non-2xx responses.
#[derive(Clone, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ApiErrorBody {
    /// Machine-readable error code (e.g. `PARAM_ERROR`)
    #[serde(default)]
    pub code: String,
    /// Human-readable message
    #[serde(default)]
    pub message: String,
    /// Optional field-level detail
    #[serde(default)]
    pub detail: Option<ApiErrorDetail>,
}

/// Comprehensive error type for WeChat Pay operations.
#[derive(Debug)]
pub enum WechatPayError {
    /// Invalid configuration or key material. Fatal at construction.
    Config(String),

    /// Transport/network layer error.
    Transport(String),

    /// Connection failed.
    ConnectionFailed {
        /// Target URL
        target: String,
        /// Underlying error message
        reason: String,
    },

    /// Connection timeout.
    ConnectionTimeout {
        /// Operation that timed out
        operation: String,
        /// Timeout duration in milliseconds
        timeout_ms: u64,
    },

    /// The gateway answered with a non-success status.
    Api {
        /// HTTP status code
        status: u16,
        /// Parsed error body
        body: ApiErrorBody,
    },

    /// Malformed gateway response.
    Protocol(String),

    /// Response or notification signature did not verify.
    VerificationFailed {
        /// Serial number the message claimed to be signed with
        serial_no: String,
    },

    /// No platform certificate is held for the serial number.
    CertificateNotFound(String),

    /// Certificate could not be parsed.
    Certificate(String),

    /// AEAD decryption failed.
    Decryption(String),

    /// Serialization/deserialization error.
    Serialization(String),

    /// Certificate store operation failed.
    Storage(String),

    /// Internal/unexpected error.
    Internal(String),
}

impl WechatPayError {
    /// Get the error code.
    pub fn code(&self) -> WechatPayErrorCode {
        match self {
            Self::Config(_) => WechatPayErrorCode::Config,
            Self::Transport(_) => WechatPayErrorCode::Transport,
            Self::ConnectionFailed { .. } => WechatPayErrorCode::ConnectionFailed,
            Self::ConnectionTimeout { .. } => WechatPayErrorCode::ConnectionTimeout,
            Self::Api { .. } => WechatPayErrorCode::Api,
            Self::Protocol(_) => WechatPayErrorCode::Protocol,
            Self::VerificationFailed { .. } => WechatPayErrorCode::VerificationFailed,
            Self::CertificateNotFound(_) => WechatPayErrorCode::CertificateNotFound,
            Self::Certificate(_) => WechatPayErrorCode::Certificate,
            Self::Decryption(_) => WechatPayErrorCode::Decryption,
            Self::Serialization(_) => WechatPayErrorCode::Serialization,
            Self::Storage(_) => WechatPayErrorCode::Storage,
            Self::Internal(_) => WechatPayErrorCode::Internal,
        }
    }

    /// Returns true if the caller may retry the operation.
    ///
    /// A retried request must be signed again from scratch.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Transport(_) | Self::ConnectionFailed { .. } | Self::ConnectionTimeout { .. }
        )
    }

    /// Returns true for failures that indicate a forged or tampered message.
    pub fn is_security_failure(&self) -> bool {
        matches!(self, Self::VerificationFailed { .. } | Self::Decryption(_))
    }

    /// Create a configuration error.
    pub fn config(reason: impl Into<String>) -> Self {
        Self::Config(reason.into())
    }

    /// Create a verification failure for the given serial number.
    pub fn verification_failed(serial_no: impl Into<String>) -> Self {
        Self::VerificationFailed {
            serial_no: serial_no.into(),
        }
    }
}

impl fmt::Display for WechatPayError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config(msg) => write!(f, "configuration error: {}", msg),
            Self::Transport(msg) => write!(f, "transport error: {}", msg),
            Self::ConnectionFailed { target, reason } => {
                write!(f, "connection to {} failed: {}", target, reason)
            }
            Self::ConnectionTimeout {
                operation,
                timeout_ms,
            } => {
                write!(f, "{} timed out after {}ms", operation, timeout_ms)
            }
            Self::Api { status, body } => {
                write!(
                    f,
                    "response error ({}), code: {}; msg: {}",
                    status, body.code, body.message
                )
            }
            Self::Protocol(msg) => write!(f, "protocol error: {}", msg),
            Self::VerificationFailed { serial_no } => {
                write!(f, "verify sign failed (serial {})", serial_no)
            }
            Self::CertificateNotFound(serial_no) => {
                write!(f, "platform certificate not found: {}", serial_no)
            }
            Self::Certificate(msg) => write!(f, "invalid certificate: {}", msg),
            Self::Decryption(msg) => write!(f, "decryption failed: {}", msg),
            Self::Serialization(msg) => write!(f, "serialization error: {}", msg),
            Self::Storage(msg) => write!(f, "storage error: {}", msg),
            Self::Internal(msg) => write!(f, "internal error: {}", msg),
        }
    }
}

impl std::error::Error for WechatPayError {}

impl From<serde_json::Error> for WechatPayError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

impl From<AeadError> for WechatPayError {
    fn from(err: AeadError) -> Self {
        Self::Decryption(err.to_string())
    }
}

impl From<CertificateError> for WechatPayError {
    fn from(err: CertificateError) -> Self {
        Self::Certificate(err.to_string())
    }
}

impl From<StoreError> for WechatPayError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(serial_no) => Self::CertificateNotFound(serial_no),
            StoreError::Parse(err) => Self::Certificate(err.to_string()),
            other => Self::Storage(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        let err = WechatPayError::ConnectionTimeout {
            operation: "GET /v3/certificates".to_string(),
            timeout_ms: 30_000,
        };
        assert_eq!(err.code(), WechatPayErrorCode::ConnectionTimeout);
        assert!(err.is_retryable());
        assert!(!err.is_security_failure());
    }

    #[test]
    fn test_verification_failure_is_not_retryable() {
        let err = WechatPayError::verification_failed("5157F09E");
        assert_eq!(err.code(), WechatPayErrorCode::VerificationFailed);
        assert!(!err.is_retryable());
        assert!(err.is_security_failure());
        assert!(err.to_string().contains("5157F09E"));
    }

    #[test]
    fn test_api_error_display() {
        let err = WechatPayError::Api {
            status: 400,
            body: ApiErrorBody {
                code: "PARAM_ERROR".to_string(),
                message: "appid和mch_id不匹配".to_string(),
                detail: None,
            },
        };
        assert!(err.to_string().contains("PARAM_ERROR"));
        assert!(err.to_string().contains("400"));
    }

    #[test]
    fn test_store_not_found_maps_to_certificate_not_found() {
        let err: WechatPayError = StoreError::NotFound("ABC".to_string()).into();
        assert_eq!(err.code(), WechatPayErrorCode::CertificateNotFound);
    }

    #[test]
    fn test_aead_error_maps_to_decryption() {
        let err: WechatPayError = AeadError::Authentication.into();
        assert_eq!(err.code(), WechatPayErrorCode::Decryption);
    }
}
