//! Symmetric cryptography shared by certificate refresh and notifications.

mod aead;

pub use aead::{decrypt_aes_256_gcm, encrypt_aes_256_gcm, AeadError, ApiV3Key, AEAD_AES_256_GCM};
