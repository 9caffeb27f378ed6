//! CLI command implementations

pub mod certs;
pub mod decrypt;
pub mod inspect;
pub mod native;
pub mod notify;
pub mod sign;

use anyhow::{anyhow, Context, Result};
use clap::Args;
use std::path::PathBuf;
use wechatpay_lib::{WechatPayClient, WechatPayConfig};

/// Merchant credentials, from flags or `WECHATPAY_*` environment variables.
#[derive(Args, Debug, Clone)]
pub struct MerchantArgs {
    /// Merchant id
    #[arg(long, global = true, env = "WECHATPAY_MCHID")]
    pub mchid: Option<String>,

    /// Merchant certificate serial number
    #[arg(long, global = true, env = "WECHATPAY_MCH_SERIAL_NO")]
    pub serial_no: Option<String>,

    /// Merchant private key (PEM)
    #[arg(long, global = true, env = "WECHATPAY_PRIVATE_KEY_PATH")]
    pub key: Option<PathBuf>,

    /// API v3 key
    #[arg(long, global = true, env = "WECHATPAY_API_V3_KEY", hide_env_values = true)]
    pub api_v3_key: Option<String>,

    /// App id
    #[arg(long, global = true, env = "WECHATPAY_APPID")]
    pub appid: Option<String>,

    /// Gateway base URL
    #[arg(long, global = true, env = "WECHATPAY_BASE_URL")]
    pub base_url: Option<String>,
}

impl MerchantArgs {
    fn required<'a>(value: &'a Option<String>, flag: &str) -> Result<&'a str> {
        value
            .as_deref()
            .ok_or_else(|| anyhow!("missing --{} (or its WECHATPAY_* variable)", flag))
    }

    /// Merchant id, required.
    pub fn mchid(&self) -> Result<&str> {
        Self::required(&self.mchid, "mchid")
    }

    /// Merchant serial number, required.
    pub fn serial_no(&self) -> Result<&str> {
        Self::required(&self.serial_no, "serial-no")
    }

    /// API v3 key, required.
    pub fn api_v3_key(&self) -> Result<&str> {
        Self::required(&self.api_v3_key, "api-v3-key")
    }

    /// Merchant private key PEM, read from `--key`.
    pub fn private_key_pem(&self) -> Result<String> {
        let path = self
            .key
            .as_ref()
            .ok_or_else(|| anyhow!("missing --key (or WECHATPAY_PRIVATE_KEY_PATH)"))?;
        std::fs::read_to_string(path)
            .with_context(|| format!("failed to read private key {}", path.display()))
    }

    /// Full client configuration.
    pub fn config(&self) -> Result<WechatPayConfig> {
        let mut config = WechatPayConfig::new(
            self.mchid()?,
            self.serial_no()?,
            self.private_key_pem()?,
            self.api_v3_key()?,
        );
        if let Some(appid) = &self.appid {
            config = config.with_appid(appid);
        }
        if let Some(url) = &self.base_url {
            config = config.with_base_url(url);
        }
        config.validate()?;
        Ok(config)
    }

    /// Client with in-memory storage and fetched certificates.
    pub async fn client(&self) -> Result<WechatPayClient> {
        let client = WechatPayClient::from_config(self.config()?).await?;
        client
            .refresh_certificates()
            .await
            .context("failed to download platform certificates")?;
        Ok(client)
    }
}
