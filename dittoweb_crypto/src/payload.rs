//! Request-payload encryption.
//!
//! Outgoing RPC payloads are encrypted with an AES-256-CTR keystream and
//! authenticated with HMAC-SHA256. The wire layout is
//! `ciphertext | iv (16 bytes) | HMAC-SHA256(ciphertext || iv) (32 bytes)`.

use aes::cipher::{KeyIvInit, StreamCipher};
use hmac::{Hmac, Mac};
use rand::{rngs::OsRng, RngCore};
use sha2::Sha256;
use thiserror::Error;

type Aes256Ctr = ctr::Ctr128BE<aes::Aes256>;
type HmacSha256 = Hmac<Sha256>;

const IV_LEN: usize = 16;
const MAC_LEN: usize = 32;

/// Problem while decrypting a payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum PayloadCryptoError {
    /// The payload is shorter than `iv + mac`.
    #[error("payload too short")]
    TooShort,

    /// MAC verification failed; the payload is corrupted or keyed wrong.
    #[error("MAC verification failed")]
    MacMismatch,
}

/// The per-session request-crypto key pair.
#[derive(Clone)]
pub struct PayloadKeys {
    aes: [u8; 32],
    hmac: [u8; 32],
}

impl std::fmt::Debug for PayloadKeys {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PayloadKeys").finish_non_exhaustive()
    }
}

impl PayloadKeys {
    /// Generate a fresh random key pair for a new pairing.
    #[must_use]
    pub fn generate() -> Self {
        let mut aes = [0u8; 32];
        let mut hmac = [0u8; 32];
        OsRng.fill_bytes(&mut aes);
        OsRng.fill_bytes(&mut hmac);
        Self { aes, hmac }
    }

    /// Rebuild the key pair from persisted bytes.
    #[must_use]
    pub const fn from_bytes(aes: [u8; 32], hmac: [u8; 32]) -> Self {
        Self { aes, hmac }
    }

    /// The AES key bytes (embedded in the pairing QR).
    #[must_use]
    pub const fn aes_key(&self) -> &[u8; 32] {
        &self.aes
    }

    /// The HMAC key bytes (embedded in the pairing QR).
    #[must_use]
    pub const fn hmac_key(&self) -> &[u8; 32] {
        &self.hmac
    }

    fn mac(&self, ciphertext_and_iv: &[u8]) -> HmacSha256 {
        let mut mac =
            HmacSha256::new_from_slice(&self.hmac).expect("HMAC accepts any key length");
        mac.update(ciphertext_and_iv);
        mac
    }

    /// Encrypt and MAC a plaintext payload.
    #[must_use]
    pub fn encrypt(&self, plaintext: &[u8]) -> Vec<u8> {
        let mut iv = [0u8; IV_LEN];
        OsRng.fill_bytes(&mut iv);

        let mut out = plaintext.to_vec();
        let mut cipher = Aes256Ctr::new(&self.aes.into(), &iv.into());
        cipher.apply_keystream(&mut out);

        out.extend_from_slice(&iv);
        let tag = self.mac(&out).finalize().into_bytes();
        out.extend_from_slice(&tag);
        out
    }

    /// Verify and decrypt a payload.
    ///
    /// # Errors
    ///
    /// Returns a [`PayloadCryptoError`] if the payload is truncated or the
    /// MAC does not verify. The MAC is checked before any decryption.
    pub fn decrypt(&self, data: &[u8]) -> Result<Vec<u8>, PayloadCryptoError> {
        if data.len() < IV_LEN + MAC_LEN {
            return Err(PayloadCryptoError::TooShort);
        }
        let (ciphertext_and_iv, tag) = data.split_at(data.len() - MAC_LEN);
        self.mac(ciphertext_and_iv)
            .verify_slice(tag)
            .map_err(|_| PayloadCryptoError::MacMismatch)?;

        let (ciphertext, iv) = ciphertext_and_iv.split_at(ciphertext_and_iv.len() - IV_LEN);
        let iv: [u8; IV_LEN] = iv.try_into().map_err(|_| PayloadCryptoError::TooShort)?;

        let mut out = ciphertext.to_vec();
        let mut cipher = Aes256Ctr::new(&self.aes.into(), &iv.into());
        cipher.apply_keystream(&mut out);
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips() {
        let keys = PayloadKeys::generate();
        let plaintext = b"hello from the browser";
        let encrypted = keys.encrypt(plaintext);
        assert_eq!(keys.decrypt(&encrypted).expect("decrypt"), plaintext);
    }

    #[test]
    fn round_trips_empty() {
        let keys = PayloadKeys::generate();
        let encrypted = keys.encrypt(b"");
        assert_eq!(encrypted.len(), IV_LEN + MAC_LEN);
        assert!(keys.decrypt(&encrypted).expect("decrypt").is_empty());
    }

    #[test]
    fn any_bit_flip_fails() {
        let keys = PayloadKeys::generate();
        let encrypted = keys.encrypt(b"payload under test");
        for i in 0..encrypted.len() {
            let mut corrupted = encrypted.clone();
            corrupted[i] ^= 1;
            assert!(
                keys.decrypt(&corrupted).is_err(),
                "bit flip at byte {i} was not detected"
            );
        }
    }

    #[test]
    fn wrong_keys_fail() {
        let keys = PayloadKeys::generate();
        let other = PayloadKeys::generate();
        let encrypted = keys.encrypt(b"payload");
        assert_eq!(
            other.decrypt(&encrypted),
            Err(PayloadCryptoError::MacMismatch)
        );
    }

    #[test]
    fn truncated_payload_is_too_short() {
        let keys = PayloadKeys::generate();
        assert_eq!(keys.decrypt(&[0u8; 47]), Err(PayloadCryptoError::TooShort));
    }
}
