//! Notify command - verify and decrypt a notification

use anyhow::{Context, Result};
use std::path::Path;
use wechatpay_lib::notify::{NotificationAck, TransactionNotification};
use wechatpay_lib::verification::{HEADER_NONCE, HEADER_SERIAL, HEADER_SIGNATURE, HEADER_TIMESTAMP};

use super::MerchantArgs;
use crate::ui;

/// Signature headers as received with the notification.
pub struct NotificationHeaders {
    pub timestamp: String,
    pub nonce: String,
    pub serial: String,
    pub signature: String,
}

pub async fn run(merchant: &MerchantArgs, body_file: &Path, headers: NotificationHeaders) -> Result<()> {
    let body = std::fs::read(body_file)
        .with_context(|| format!("failed to read body {}", body_file.display()))?;
    let pairs = vec![
        (HEADER_TIMESTAMP.to_string(), headers.timestamp),
        (HEADER_NONCE.to_string(), headers.nonce),
        (HEADER_SERIAL.to_string(), headers.serial),
        (HEADER_SIGNATURE.to_string(), headers.signature),
    ];

    let client = merchant.client().await?;
    let notification = client.parse_notification(&pairs, &body).await?;

    ui::header("Notification");
    ui::key_value("Id", &notification.envelope.id);
    ui::key_value("Event", &notification.envelope.event_type);
    ui::key_value("Created", &notification.envelope.create_time);

    if notification.envelope.event_type.starts_with("TRANSACTION.") {
        let tx: TransactionNotification = notification.decode()?;
        ui::key_value("Order", &tx.out_trade_no);
        ui::key_value("Transaction", &tx.transaction_id);
        ui::key_value("State", tx.trade_state.as_str());
        ui::key_value("Amount (fen)", &tx.amount.total.to_string());
    }

    ui::header("Resource");
    ui::json_or_text(&notification.plaintext);

    let ack = NotificationAck::success();
    ui::header("Reply");
    ui::key_value("Status", &ack.status.to_string());
    ui::key_value("Body", &ack.body);

    client.shutdown().await;
    Ok(())
}
