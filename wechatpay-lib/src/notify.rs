//! Payment notifications pushed by the gateway.
//!
//! A notification is a signed JSON envelope whose `resource` holds the
//! business event sealed with the API v3 key. The receiver must answer
//! with [`NotificationAck::success`] or the gateway redelivers.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::crypto::{ApiV3Key, AEAD_AES_256_GCM};
use crate::{Result, WechatPayError};

/// Top-level notification envelope.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationEnvelope {
    pub id: String,
    pub create_time: String,
    pub resource_type: String,
    /// e.g. `TRANSACTION.SUCCESS`
    pub event_type: String,
    #[serde(default)]
    pub summary: String,
    pub resource: NotificationResource,
}

/// Encrypted notification payload.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationResource {
    pub algorithm: String,
    pub ciphertext: String,
    pub nonce: String,
    #[serde(default)]
    pub original_type: String,
    #[serde(default)]
    pub associated_data: String,
}

impl NotificationResource {
    /// Decrypt the resource with the API v3 key.
    pub fn decrypt(&self, key: &ApiV3Key) -> Result<Vec<u8>> {
        if self.algorithm != AEAD_AES_256_GCM {
            return Err(WechatPayError::Decryption(format!(
                "unsupported algorithm {}",
                self.algorithm
            )));
        }
        Ok(key.decrypt(&self.ciphertext, &self.nonce, &self.associated_data)?)
    }
}

/// A verified, decrypted notification.
#[derive(Clone, Debug)]
pub struct Notification {
    pub envelope: NotificationEnvelope,
    /// The decrypted resource document
    pub plaintext: Vec<u8>,
}

impl Notification {
    /// Decode the plaintext into a business type.
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T> {
        Ok(serde_json::from_slice(&self.plaintext)?)
    }
}

/// Trade state of a transaction.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum TradeState {
    Success,
    Refund,
    NotPay,
    Closed,
    Revoked,
    UserPaying,
    PayError,
    /// A state this crate does not know yet.
    Other(String),
}

impl TradeState {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Success => "SUCCESS",
            Self::Refund => "REFUND",
            Self::NotPay => "NOTPAY",
            Self::Closed => "CLOSED",
            Self::Revoked => "REVOKED",
            Self::UserPaying => "USERPAYING",
            Self::PayError => "PAYERROR",
            Self::Other(s) => s,
        }
    }
}

impl From<String> for TradeState {
    fn from(s: String) -> Self {
        match s.as_str() {
            "SUCCESS" => Self::Success,
            "REFUND" => Self::Refund,
            "NOTPAY" => Self::NotPay,
            "CLOSED" => Self::Closed,
            "REVOKED" => Self::Revoked,
            "USERPAYING" => Self::UserPaying,
            "PAYERROR" => Self::PayError,
            _ => Self::Other(s),
        }
    }
}

impl From<TradeState> for String {
    fn from(state: TradeState) -> Self {
        state.as_str().to_string()
    }
}

impl std::fmt::Display for TradeState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payer {
    #[serde(default)]
    pub openid: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionAmount {
    /// Order total in fen
    #[serde(default)]
    pub total: i64,
    #[serde(default)]
    pub payer_total: i64,
    #[serde(default)]
    pub currency: String,
    #[serde(default)]
    pub payer_currency: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SceneInfo {
    #[serde(default)]
    pub device_id: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromotionDetail {
    #[serde(default)]
    pub coupon_id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub scope: String,
    #[serde(default, rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub amount: i64,
    #[serde(default)]
    pub stock_id: String,
    #[serde(default)]
    pub wechatpay_contribute: i64,
    #[serde(default)]
    pub merchant_contribute: i64,
    #[serde(default)]
    pub other_contribute: i64,
    #[serde(default)]
    pub currency: String,
}

/// Decrypted `TRANSACTION.*` notification resource.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionNotification {
    pub appid: String,
    pub mchid: String,
    pub out_trade_no: String,
    pub transaction_id: String,
    pub trade_type: String,
    pub trade_state: TradeState,
    #[serde(default)]
    pub trade_state_desc: String,
    #[serde(default)]
    pub bank_type: String,
    #[serde(default)]
    pub attach: String,
    #[serde(default)]
    pub success_time: String,
    #[serde(default)]
    pub payer: Payer,
    #[serde(default)]
    pub amount: TransactionAmount,
    #[serde(default)]
    pub scene_info: Option<SceneInfo>,
    #[serde(default)]
    pub promotion_detail: Vec<PromotionDetail>,
}

/// Response the merchant returns to the gateway for a notification.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NotificationAck {
    pub status: u16,
    pub body: String,
}

#[derive(Serialize)]
struct AckBody<'a> {
    code: &'a str,
    message: &'a str,
}

impl NotificationAck {
    /// Acknowledge receipt; stops redelivery.
    pub fn success() -> Self {
        Self::with(200, "SUCCESS", "成功")
    }

    /// Reject the notification; the gateway will redeliver it.
    pub fn failure(message: &str) -> Self {
        Self::with(500, "FAIL", message)
    }

    fn with(status: u16, code: &str, message: &str) -> Self {
        let body = serde_json::to_string(&AckBody { code, message })
            .unwrap_or_else(|_| format!(r#"{{"code":"{}"}}"#, code));
        Self { status, body }
    }
}
