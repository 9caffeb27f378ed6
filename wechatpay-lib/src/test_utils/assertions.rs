//! Assertion helpers.

use crate::{Result, WechatPayError, WechatPayErrorCode};

/// Assert that a result failed signature verification.
///
/// # Panics
/// Panics if the result is `Ok` or a different error.
pub fn assert_verification_failed<T: std::fmt::Debug>(result: &Result<T>) {
    match result {
        Err(e) => assert_eq!(
            e.code(),
            WechatPayErrorCode::VerificationFailed,
            "expected verification failure, got {}",
            e
        ),
        Ok(value) => panic!("expected verification failure, got Ok({:?})", value),
    }
}

/// Assert that a result is a gateway error with the given status and code.
///
/// # Panics
/// Panics if the result is `Ok` or a different error.
pub fn assert_api_error<T: std::fmt::Debug>(result: &Result<T>, status: u16, code: &str) {
    match result {
        Err(WechatPayError::Api { status: s, body }) => {
            assert_eq!(*s, status, "unexpected status");
            assert_eq!(body.code, code, "unexpected error code");
        }
        Err(e) => panic!("expected API error, got {}", e),
        Ok(value) => panic!("expected API error, got Ok({:?})", value),
    }
}
