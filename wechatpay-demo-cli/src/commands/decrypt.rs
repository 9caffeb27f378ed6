//! Decrypt command - open an AEAD_AES_256_GCM payload

use anyhow::Result;
use wechatpay_lib::crypto::ApiV3Key;

use super::MerchantArgs;
use crate::ui;

pub async fn run(
    merchant: &MerchantArgs,
    ciphertext: &str,
    nonce: &str,
    associated_data: &str,
) -> Result<()> {
    let key = ApiV3Key::new(merchant.api_v3_key()?.as_bytes())?;
    let plaintext = key.decrypt(ciphertext, nonce, associated_data)?;

    ui::header("Plaintext");
    ui::json_or_text(&plaintext);
    Ok(())
}
