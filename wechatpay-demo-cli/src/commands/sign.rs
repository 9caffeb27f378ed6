//! Sign command - build an Authorization header

use anyhow::{Context, Result};
use std::path::PathBuf;
use wechatpay_lib::signing::{current_timestamp, generate_nonce, Signer};

use super::MerchantArgs;
use crate::ui;

pub async fn run(
    merchant: &MerchantArgs,
    method: &str,
    uri: &str,
    body_file: Option<PathBuf>,
    timestamp: Option<i64>,
    nonce: Option<String>,
) -> Result<()> {
    let signer = Signer::from_pem(
        merchant.mchid()?,
        merchant.serial_no()?,
        &merchant.private_key_pem()?,
    )?;

    let body = match &body_file {
        Some(path) => std::fs::read(path)
            .with_context(|| format!("failed to read body {}", path.display()))?,
        None => Vec::new(),
    };

    let timestamp = timestamp.unwrap_or_else(current_timestamp);
    let nonce = nonce.unwrap_or_else(generate_nonce);
    tracing::debug!(method, uri, timestamp, body_len = body.len(), "signing request");

    let header = signer.authorization_at(&method.to_uppercase(), uri, &body, timestamp, &nonce)?;

    ui::header("Authorization");
    println!("{}", header);
    Ok(())
}
