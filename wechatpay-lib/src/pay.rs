//! Native (QR code) payment orders.

use serde::{Deserialize, Serialize};

/// Path of the native order endpoint.
pub const NATIVE_ORDER_PATH: &str = "/v3/pay/transactions/native";

/// Order amount.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderAmount {
    /// Total in fen
    pub total: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,
}

impl OrderAmount {
    /// An amount in CNY fen.
    pub fn cny(total: i64) -> Self {
        Self {
            total,
            currency: Some("CNY".to_string()),
        }
    }
}

/// Request body for `POST /v3/pay/transactions/native`.
///
/// `appid` and `mchid` may be left empty; the client fills them from its
/// configuration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NativeOrderRequest {
    #[serde(default)]
    pub appid: String,
    #[serde(default)]
    pub mchid: String,
    pub description: String,
    pub out_trade_no: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_expire: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attach: Option<String>,
    pub notify_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub goods_tag: Option<String>,
    pub amount: OrderAmount,
}

impl NativeOrderRequest {
    /// Create an order request with the required fields.
    pub fn new(
        description: impl Into<String>,
        out_trade_no: impl Into<String>,
        notify_url: impl Into<String>,
        amount: OrderAmount,
    ) -> Self {
        Self {
            appid: String::new(),
            mchid: String::new(),
            description: description.into(),
            out_trade_no: out_trade_no.into(),
            time_expire: None,
            attach: None,
            notify_url: notify_url.into(),
            goods_tag: None,
            amount,
        }
    }

    /// Set the attach field echoed back in notifications.
    pub fn with_attach(mut self, attach: impl Into<String>) -> Self {
        self.attach = Some(attach.into());
        self
    }
}

/// Response of the native order endpoint.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NativeOrderResponse {
    /// QR code content for the payer to scan
    pub code_url: String,
}
