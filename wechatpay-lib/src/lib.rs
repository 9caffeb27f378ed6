//! WeChat Pay API v3 client library.
//!
//! The gateway authenticates merchants by signature instead of TLS client
//! certificates. This crate covers both directions of that protocol and the
//! certificate lifecycle it depends on.
//!
//! # Features
//!
//! - **Request signing**: SHA256-RSA2048 `Authorization` headers built from
//!   the merchant private key
//! - **Response and notification verification**: checked against the
//!   gateway's rotating platform certificates
//! - **Certificate management**: periodic background refresh, AEAD
//!   decryption of certificate payloads, pluggable storage
//! - **Transport abstraction**: any [`transport::HttpTransport`] can carry
//!   the requests; a `reqwest` one ships behind `http-client`
//!
//! # Example
//!
//! ```rust,ignore
//! use wechatpay_lib::{WechatPayClient, WechatPayConfig};
//! use wechatpay_lib::pay::{NativeOrderRequest, OrderAmount};
//!
//! let config = WechatPayConfig::from_key_file(
//!     "1900000109",
//!     "408B07E79B8269FEC3D5D3E6AB8ED163A6A380DB",
//!     "apiclient_key.pem",
//!     api_v3_key,
//! )?
//! .with_appid("wxd678efh567hg6787");
//!
//! let client = WechatPayClient::from_config(config).await?;
//! let code_url = client
//!     .native_order(NativeOrderRequest::new(
//!         "Image形象店-深圳腾大-QQ公仔",
//!         "1217752501201407033233368018",
//!         "https://www.weixin.qq.com/wxpay/pay.php",
//!         OrderAmount::cny(100),
//!     ))
//!     .await?;
//! ```

pub mod certificates;
pub mod client;
pub mod config;
pub mod crypto;
pub mod errors;
pub mod notify;
pub mod pay;
pub mod prelude;
pub mod signing;
pub mod transport;
pub mod verification;

/// Test utilities: key fixtures and a scripted gateway.
///
/// This module is only available with the `test-utils` feature or in test builds.
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use client::WechatPayClient;
pub use config::WechatPayConfig;
pub use errors::{ApiErrorBody, ApiErrorDetail, WechatPayError, WechatPayErrorCode};

/// Common result alias for WeChat Pay operations.
pub type Result<T> = std::result::Result<T, WechatPayError>;

/// Scheme name at the start of every `Authorization` header.
pub const AUTHORIZATION_SCHEMA: &str = "WECHATPAY2-SHA256-RSA2048";

/// Production gateway.
pub const DEFAULT_BASE_URL: &str = "https://api.mch.weixin.qq.com";

/// Certificate listing endpoint. Its responses are not signature-checked.
pub const CERTIFICATES_PATH: &str = "/v3/certificates";
