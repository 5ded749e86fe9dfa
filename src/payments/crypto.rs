//! Symmetric envelope encryption for sensitive payment metadata.
//!
//! The key is derived once, at construction, from the configured passphrase;
//! each encrypt call draws a fresh random IV. Envelopes are hex-encoded so
//! they can sit inside the record's JSON metadata column.

use aes::cipher::{block_padding::Pkcs7, BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use rand::RngCore;
use scrypt::Params;
use serde::{de::DeserializeOwned, Serialize};

use crate::{
    domain::EncryptedEnvelope,
    error::{AppError, Result},
};

type Aes256CbcEnc = cbc::Encryptor<aes::Aes256>;
type Aes256CbcDec = cbc::Decryptor<aes::Aes256>;

const KEY_SALT: &[u8] = b"tiffin-payment-metadata";
const KEY_LEN: usize = 32;
const IV_LEN: usize = 16;

pub struct CryptoCodec {
    key: [u8; KEY_LEN],
}

impl CryptoCodec {
    /// Derives the AES-256 key from `passphrase` with scrypt (N = 2^14,
    /// r = 8, p = 1). The derived key is stable for the process lifetime.
    pub fn new(passphrase: &str) -> Result<Self> {
        let params =
            Params::new(14, 8, 1, KEY_LEN).map_err(|e| AppError::Crypto(e.to_string()))?;

        let mut key = [0u8; KEY_LEN];
        scrypt::scrypt(passphrase.as_bytes(), KEY_SALT, &params, &mut key)
            .map_err(|e| AppError::Crypto(e.to_string()))?;

        Ok(Self { key })
    }

    /// Serializes `payload` as JSON and encrypts it under AES-256-CBC with
    /// a fresh random IV. The IV is part of the returned envelope; without
    /// it the ciphertext is unrecoverable.
    pub fn encrypt<T: Serialize>(&self, payload: &T) -> Result<EncryptedEnvelope> {
        let plaintext =
            serde_json::to_vec(payload).map_err(|e| AppError::Crypto(e.to_string()))?;

        let mut iv = [0u8; IV_LEN];
        rand::thread_rng().fill_bytes(&mut iv);

        let ciphertext = Aes256CbcEnc::new(&self.key.into(), &iv.into())
            .encrypt_padded_vec_mut::<Pkcs7>(&plaintext);

        Ok(EncryptedEnvelope {
            ciphertext: hex::encode(ciphertext),
            iv: hex::encode(iv),
        })
    }

    /// Reverses `encrypt`. A malformed envelope or a key mismatch surfaces
    /// as a crypto error; for the affected record that is a data-integrity
    /// failure, not something a retry can fix.
    pub fn decrypt<T: DeserializeOwned>(&self, envelope: &EncryptedEnvelope) -> Result<T> {
        let ciphertext = hex::decode(&envelope.ciphertext)
            .map_err(|_| AppError::Crypto("malformed ciphertext".to_string()))?;
        let iv: [u8; IV_LEN] = hex::decode(&envelope.iv)
            .ok()
            .and_then(|bytes| bytes.try_into().ok())
            .ok_or_else(|| AppError::Crypto("malformed IV".to_string()))?;

        let plaintext = Aes256CbcDec::new(&self.key.into(), &iv.into())
            .decrypt_padded_vec_mut::<Pkcs7>(&ciphertext)
            .map_err(|_| AppError::Crypto("decryption failed".to_string()))?;

        serde_json::from_slice(&plaintext).map_err(|e| AppError::Crypto(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::CardSummary;

    fn codec() -> CryptoCodec {
        CryptoCodec::new("test-passphrase").unwrap()
    }

    #[test]
    fn encrypt_decrypt_round_trip() {
        let codec = codec();
        let summary = CardSummary {
            last4: "1111".to_string(),
            network: Some("visa".to_string()),
        };

        let envelope = codec.encrypt(&summary).unwrap();
        let decrypted: CardSummary = codec.decrypt(&envelope).unwrap();
        assert_eq!(decrypted, summary);
    }

    #[test]
    fn round_trips_arbitrary_json() {
        let codec = codec();
        let payload = serde_json::json!({
            "nested": {"a": [1, 2, 3]},
            "text": "with unicode ₹ and quotes \"",
            "flag": true,
        });

        let envelope = codec.encrypt(&payload).unwrap();
        let decrypted: serde_json::Value = codec.decrypt(&envelope).unwrap();
        assert_eq!(decrypted, payload);
    }

    #[test]
    fn each_call_draws_a_fresh_iv() {
        let codec = codec();
        let a = codec.encrypt(&"same payload").unwrap();
        let b = codec.encrypt(&"same payload").unwrap();
        assert_ne!(a.iv, b.iv);
        assert_ne!(a.ciphertext, b.ciphertext);
    }

    #[test]
    fn wrong_key_fails_to_decrypt() {
        let envelope = codec().encrypt(&"secret").unwrap();
        let other = CryptoCodec::new("a different passphrase").unwrap();
        assert!(other.decrypt::<String>(&envelope).is_err());
    }

    #[test]
    fn malformed_envelope_is_rejected() {
        let codec = codec();

        let bad_hex = EncryptedEnvelope {
            ciphertext: "zz".to_string(),
            iv: "00".repeat(16),
        };
        assert!(codec.decrypt::<String>(&bad_hex).is_err());

        let short_iv = EncryptedEnvelope {
            ciphertext: "00".repeat(16),
            iv: "0011".to_string(),
        };
        assert!(codec.decrypt::<String>(&short_iv).is_err());
    }
}
