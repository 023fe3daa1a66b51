//! AES-256-GCM field sealing and HMAC-SHA256 record signing for integrations.

use aes_gcm::aead::{Aead, KeyInit, OsRng};
use aes_gcm::{AeadCore, Aes256Gcm, Nonce};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use lattice_application::{FieldCipher, RecordSigner};
use lattice_core::{AppError, AppResult};
use ring::hmac;
use ring::rand::{SecureRandom, SystemRandom};

const KEY_LEN: usize = 32;
const NONCE_LEN: usize = 12;
const SALT_LEN: usize = 16;

/// Seals sensitive integration values and signs stored integration rows.
#[derive(Clone)]
pub struct AesHmacIntegrationCrypto {
    cipher: Aes256Gcm,
    signing_key: hmac::Key,
    rng: SystemRandom,
}

impl AesHmacIntegrationCrypto {
    /// Creates the crypto adapter from two 32-byte keys.
    #[must_use]
    pub fn new(encryption_key: &[u8; KEY_LEN], signing_key: &[u8; KEY_LEN]) -> Self {
        Self {
            cipher: Aes256Gcm::new(encryption_key.into()),
            signing_key: hmac::Key::new(hmac::HMAC_SHA256, signing_key),
            rng: SystemRandom::new(),
        }
    }

    /// Creates the crypto adapter from hex-encoded 32-byte keys.
    pub fn from_hex(encryption_key_hex: &str, signing_key_hex: &str) -> AppResult<Self> {
        let encryption_key = decode_key("INTEGRATION_ENCRYPTION_KEY", encryption_key_hex)?;
        let signing_key = decode_key("INTEGRATION_SIGNING_KEY", signing_key_hex)?;
        Ok(Self::new(&encryption_key, &signing_key))
    }

    fn tag(&self, salt: &[u8], canonical: &[u8]) -> hmac::Tag {
        let mut context = hmac::Context::with_key(&self.signing_key);
        context.update(salt);
        context.update(canonical);
        context.sign()
    }
}

fn decode_key(variable: &str, hex_key: &str) -> AppResult<[u8; KEY_LEN]> {
    let decoded = hex::decode(hex_key.trim())
        .map_err(|error| AppError::Validation(format!("invalid {variable} hex: {error}")))?;

    decoded.try_into().map_err(|_| {
        AppError::Validation(format!(
            "{variable} must be exactly 32 bytes (64 hex chars)"
        ))
    })
}

impl RecordSigner for AesHmacIntegrationCrypto {
    fn sign(&self, canonical: &[u8]) -> AppResult<String> {
        let mut salt = [0u8; SALT_LEN];
        self.rng.fill(&mut salt).map_err(|_| {
            AppError::Internal("failed to generate signature salt".to_owned())
        })?;

        let tag = self.tag(&salt, canonical);
        Ok(format!("{}.{}", hex::encode(salt), hex::encode(tag.as_ref())))
    }

    fn verify(&self, canonical: &[u8], signature: &str) -> AppResult<bool> {
        let Some((salt_hex, tag_hex)) = signature.split_once('.') else {
            return Ok(false);
        };
        let (Ok(salt), Ok(tag)) = (hex::decode(salt_hex), hex::decode(tag_hex)) else {
            return Ok(false);
        };
        if salt.len() != SALT_LEN {
            return Ok(false);
        }

        let mut message = Vec::with_capacity(salt.len() + canonical.len());
        message.extend_from_slice(&salt);
        message.extend_from_slice(canonical);

        // ring compares tags in constant time.
        Ok(hmac::verify(&self.signing_key, &message, &tag).is_ok())
    }
}

impl FieldCipher for AesHmacIntegrationCrypto {
    fn seal(&self, plaintext: &str) -> AppResult<String> {
        let nonce = Aes256Gcm::generate_nonce(&mut OsRng);
        let ciphertext = self
            .cipher
            .encrypt(&nonce, plaintext.as_bytes())
            .map_err(|error| AppError::Internal(format!("failed to seal value: {error}")))?;

        let mut sealed = Vec::with_capacity(nonce.len() + ciphertext.len());
        sealed.extend_from_slice(&nonce);
        sealed.extend_from_slice(&ciphertext);
        Ok(STANDARD.encode(sealed))
    }

    fn open(&self, sealed: &str) -> AppResult<String> {
        let decoded = STANDARD
            .decode(sealed)
            .map_err(|error| AppError::Internal(format!("sealed value is not base64: {error}")))?;
        if decoded.len() < NONCE_LEN {
            return Err(AppError::Internal(
                "sealed value too short: missing nonce".to_owned(),
            ));
        }

        let (nonce_bytes, ciphertext) = decoded.split_at(NONCE_LEN);
        let nonce_array: [u8; NONCE_LEN] = nonce_bytes
            .try_into()
            .map_err(|_| AppError::Internal("nonce must be exactly 12 bytes".to_owned()))?;
        let plaintext = self
            .cipher
            .decrypt(&Nonce::from(nonce_array), ciphertext)
            .map_err(|error| AppError::Internal(format!("failed to open value: {error}")))?;

        String::from_utf8(plaintext)
            .map_err(|error| AppError::Internal(format!("opened value is not utf-8: {error}")))
    }
}
