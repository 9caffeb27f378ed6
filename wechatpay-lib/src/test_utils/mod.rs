//! Test utilities for WeChat Pay integrations.
//!
//! This module provides:
//! - Key and certificate fixtures (merchant key, two platform key pairs)
//! - A scripted in-process gateway implementing [`HttpTransport`](crate::transport::HttpTransport)
//! - Assertion helpers for security-relevant failures
//!
//! ## Usage
//!
//! ```rust,ignore
//! use wechatpay_lib::test_utils::{test_config, MockGateway};
//!
//! let gateway = MockGateway::new();
//! gateway.respond_signed("POST", "/v3/pay/transactions/native", 200, r#"{"code_url":"weixin://x"}"#);
//!
//! let client = WechatPayClient::new(test_config(), gateway.clone(), store).await?;
//! client.refresh_certificates().await?;
//! ```

mod assertions;
mod fixtures;
mod mock_gateway;

pub use assertions::{assert_api_error, assert_verification_failed};
pub use fixtures::{
    encrypted_certificate_entry, platform_signer, test_config, StaticFetcher, API_V3_KEY,
    MCHID, MERCHANT_KEY, MERCHANT_SERIAL, PLATFORM_CERT_1, PLATFORM_CERT_1_REISSUED,
    PLATFORM_CERT_2, PLATFORM_KEY_1, PLATFORM_KEY_2, PLATFORM_SERIAL_1, PLATFORM_SERIAL_2,
};
pub use mock_gateway::{MockGateway, MockReply};
