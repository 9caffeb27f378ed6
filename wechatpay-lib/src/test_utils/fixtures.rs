//! Key material and canned gateway payloads.

use std::sync::Mutex;

use async_trait::async_trait;

use crate::certificates::{
    CertificateEntry, CertificateFetcher, CertificateListResponse, EncryptedCertificate,
};
use crate::crypto::{ApiV3Key, AEAD_AES_256_GCM};
use crate::signing::{generate_nonce, Signer};
use crate::{Result, WechatPayConfig, WechatPayError};

/// Merchant id used throughout the fixtures.
pub const MCHID: &str = "1900000109";
/// Serial of the merchant certificate.
pub const MERCHANT_SERIAL: &str = "408B07E79B8269FEC3D5D3E6AB8ED163A6A380DB";
/// Merchant private key (PKCS#8).
pub const MERCHANT_KEY: &str = include_str!("../../tests/fixtures/merchant_key.pem");
/// API v3 key shared with the fixture gateway.
pub const API_V3_KEY: &str = "a7cde1ABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// Platform certificate 1, signed by `PLATFORM_KEY_1`.
pub const PLATFORM_CERT_1: &str = include_str!("../../tests/fixtures/platform_cert_1.pem");
/// Same serial as certificate 1, but carrying `PLATFORM_KEY_2`.
pub const PLATFORM_CERT_1_REISSUED: &str =
    include_str!("../../tests/fixtures/platform_cert_1_reissued.pem");
/// Platform certificate 2, signed by `PLATFORM_KEY_2`.
pub const PLATFORM_CERT_2: &str = include_str!("../../tests/fixtures/platform_cert_2.pem");
pub const PLATFORM_KEY_1: &str = include_str!("../../tests/fixtures/platform_key_1.pem");
pub const PLATFORM_KEY_2: &str = include_str!("../../tests/fixtures/platform_key_2.pem");
pub const PLATFORM_SERIAL_1: &str = "5157F09EFDC096DE15EBE81A47057A7232F1B8E1";
pub const PLATFORM_SERIAL_2: &str = "3775B6A45ACD588826D15E583A95F5DD2FBD7A8D";

/// A signer holding platform key 1 or 2, for producing gateway signatures.
///
/// # Panics
/// Panics on an index other than 1 or 2.
pub fn platform_signer(index: u8) -> Signer {
    let (key, serial) = match index {
        1 => (PLATFORM_KEY_1, PLATFORM_SERIAL_1),
        2 => (PLATFORM_KEY_2, PLATFORM_SERIAL_2),
        other => panic!("no platform key {}", other),
    };
    Signer::from_pem(MCHID, serial, key).expect("fixture key parses")
}

/// Client configuration matching the fixtures.
pub fn test_config() -> WechatPayConfig {
    WechatPayConfig::new(MCHID, MERCHANT_SERIAL, MERCHANT_KEY, API_V3_KEY)
        .with_appid("wxd678efh567hg6787")
}

/// Seal a certificate into a listing entry with the fixture API v3 key.
pub fn encrypted_certificate_entry(serial_no: &str, pem: &str) -> CertificateEntry {
    let key = ApiV3Key::new(API_V3_KEY.as_bytes().to_vec()).expect("fixture key is 32 bytes");
    let nonce = &generate_nonce()[..12];
    let associated_data = "certificate";

    CertificateEntry {
        serial_no: serial_no.to_string(),
        effective_time: "2023-12-31T08:00:00+08:00".to_string(),
        expire_time: "2034-12-28T08:00:00+08:00".to_string(),
        encrypt_certificate: EncryptedCertificate {
            algorithm: AEAD_AES_256_GCM.to_string(),
            nonce: nonce.to_string(),
            associated_data: associated_data.to_string(),
            ciphertext: key
                .encrypt(pem.as_bytes(), nonce, associated_data)
                .expect("fixture encryption"),
        },
    }
}

/// Fetcher returning a fixed listing, or a transport error when unset.
#[derive(Default)]
pub struct StaticFetcher {
    listing: Mutex<Option<CertificateListResponse>>,
}

impl StaticFetcher {
    /// A fetcher whose listing call always fails.
    pub fn empty() -> Self {
        Self::default()
    }

    /// A fetcher serving the given entries.
    pub fn with_entries(entries: Vec<CertificateEntry>) -> Self {
        let fetcher = Self::default();
        fetcher.serve(entries);
        fetcher
    }

    /// Replace the served listing.
    pub fn serve(&self, entries: Vec<CertificateEntry>) {
        *self.listing.lock().expect("fetcher lock") = Some(CertificateListResponse { data: entries });
    }
}

#[async_trait]
impl CertificateFetcher for StaticFetcher {
    async fn fetch_certificates(&self) -> Result<CertificateListResponse> {
        self.listing
            .lock()
            .expect("fetcher lock")
            .clone()
            .ok_or_else(|| WechatPayError::Transport("no listing configured".into()))
    }
}
