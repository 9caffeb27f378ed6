//! Certs command - refresh platform certificates

use anyhow::Result;
use std::path::PathBuf;
use std::sync::Arc;
use wechatpay_lib::certificates::{CertificateStore, FileStore, InMemoryStore};
use wechatpay_lib::transport::ReqwestTransport;
use wechatpay_lib::WechatPayClient;

use super::MerchantArgs;
use crate::ui;

pub async fn run(merchant: &MerchantArgs, store_dir: Option<PathBuf>) -> Result<()> {
    let config = merchant.config()?;
    let store: Arc<dyn CertificateStore> = match &store_dir {
        Some(dir) => Arc::new(FileStore::new(dir)?),
        None => Arc::new(InMemoryStore::new()),
    };

    let transport = Arc::new(ReqwestTransport::new(config.timeout_secs)?);
    let client = WechatPayClient::new(config, transport, store).await?;
    let bootstrapped = client.certificates().count().await?;

    let spinner = ui::spinner("Downloading platform certificates...");
    let report = client.refresh_certificates().await;
    spinner.finish_and_clear();
    let report = report?;

    ui::header("Platform Certificates");
    ui::key_value("Loaded from store", &bootstrapped.to_string());
    ui::key_value("Updated", &report.updated.to_string());
    ui::key_value("Skipped", &report.skipped.to_string());
    ui::key_value("Total", &report.total.to_string());
    if let Some(dir) = &store_dir {
        ui::key_value("Store", &dir.display().to_string());
    }
    ui::separator();

    if report.skipped > 0 {
        ui::warning("Some certificates could not be decrypted; check the API v3 key");
    } else {
        ui::success("Certificates up to date");
    }

    client.shutdown().await;
    Ok(())
}
