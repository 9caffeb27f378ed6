//! Inspect-cert command - show certificate details

use anyhow::{Context, Result};
use std::path::Path;
use wechatpay_lib::certificates::PlatformCertificate;

use crate::ui;

pub async fn run(path: &Path) -> Result<()> {
    let raw = std::fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
    let cert = PlatformCertificate::parse(&raw)?;

    ui::header("Certificate");
    ui::key_value("Serial", cert.serial_no());
    ui::key_value("Not before", &ui::timestamp(cert.not_before()));
    ui::key_value("Not after", &ui::timestamp(cert.not_after()));

    if cert.is_expired_at(chrono::Utc::now().timestamp()) {
        ui::warning("Certificate validity window has ended");
    } else {
        ui::success("Certificate is within its validity window");
    }
    Ok(())
}
