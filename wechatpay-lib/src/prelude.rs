//! Prelude module for convenient imports.
//!
//! ```rust,ignore
//! use wechatpay_lib::prelude::*;
//! ```

// Client and configuration
pub use crate::{WechatPayClient, WechatPayConfig};

// Error handling
pub use crate::errors::{ApiErrorBody, WechatPayError, WechatPayErrorCode};
pub use crate::Result;

// Certificates
pub use crate::certificates::{
    CertificateCentral, CertificateStore, InMemoryStore, PlatformCertificate, RefreshReport,
};

#[cfg(feature = "file-storage")]
pub use crate::certificates::FileStore;

// Signing and verification
pub use crate::crypto::ApiV3Key;
pub use crate::signing::Signer;
pub use crate::verification::{SignatureHeaders, Verifier};

// Transport
pub use crate::transport::HttpTransport;

#[cfg(feature = "http-client")]
pub use crate::transport::ReqwestTransport;

// Notifications and orders
pub use crate::notify::{NotificationAck, TradeState, TransactionNotification};
pub use crate::pay::{NativeOrderRequest, OrderAmount};
