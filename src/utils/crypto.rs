//! AES/HMAC wrapper with MD5-derived key material.
//!
//! The key and IV are each the MD5 digest of `"{raw}_{suffix}"`, which makes
//! the cipher AES-128-CBC with PKCS#7 padding. Ciphertext is base64, MACs are
//! lowercase hex.

use aes::cipher::{block_padding::Pkcs7, BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use hmac::{Hmac, Mac};
use md5::{Digest, Md5};
use rand::RngCore;
use sha1::Sha1;
use tracing::debug;

use crate::error::{PageKitError, Result};

type Aes128CbcEnc = cbc::Encryptor<aes::Aes128>;
type Aes128CbcDec = cbc::Decryptor<aes::Aes128>;

/// Suffix appended to raw key and IV when none is given
pub const DEFAULT_SUFFIX: &str = "0";

pub struct CryptoManager {
    key: [u8; 16],
    iv: [u8; 16],
}

impl CryptoManager {
    pub fn new(key: &str, iv: &str, suffix: Option<&str>) -> Self {
        let suffix = suffix.unwrap_or(DEFAULT_SUFFIX);
        debug!(suffix, "Deriving cipher key material");

        Self {
            key: derive(key, suffix),
            iv: derive(iv, suffix),
        }
    }

    pub fn encrypt_aes(&self, plaintext: &str) -> String {
        let ciphertext = Aes128CbcEnc::new(&self.key.into(), &self.iv.into())
            .encrypt_padded_vec_mut::<Pkcs7>(plaintext.as_bytes());
        STANDARD.encode(ciphertext)
    }

    pub fn decrypt_aes(&self, ciphertext: &str) -> Result<String> {
        let bytes = STANDARD
            .decode(ciphertext.trim())
            .map_err(|e| PageKitError::crypto(format!("invalid base64: {}", e)))?;

        let plaintext = Aes128CbcDec::new(&self.key.into(), &self.iv.into())
            .decrypt_padded_vec_mut::<Pkcs7>(&bytes)
            .map_err(|_| PageKitError::crypto("invalid padding"))?;

        String::from_utf8(plaintext)
            .map_err(|e| PageKitError::crypto(format!("plaintext is not UTF-8: {}", e)))
    }

    pub fn hmac_sha1(&self, message: &str) -> Result<String> {
        let mut mac = <Hmac<Sha1> as Mac>::new_from_slice(&self.key)
            .map_err(|e| PageKitError::crypto(e))?;
        mac.update(message.as_bytes());
        Ok(hex::encode(mac.finalize().into_bytes()))
    }

    pub fn hmac_md5(&self, message: &str) -> Result<String> {
        let mut mac = <Hmac<Md5> as Mac>::new_from_slice(&self.key)
            .map_err(|e| PageKitError::crypto(e))?;
        mac.update(message.as_bytes());
        Ok(hex::encode(mac.finalize().into_bytes()))
    }
}

/// `n_bytes` random bytes from the OS-seeded thread RNG, hex encoded
pub fn random_hex(n_bytes: usize) -> String {
    let mut bytes = vec![0u8; n_bytes];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

fn derive(raw: &str, suffix: &str) -> [u8; 16] {
    Md5::digest(format!("{}_{}", raw, suffix).as_bytes()).into()
}
