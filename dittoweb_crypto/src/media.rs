//! Media encryption.
//!
//! Media bodies are encrypted as an AES-256-GCM chunk stream: the
//! plaintext is split into chunks and each chunk is sealed independently
//! as `nonce (12) | ciphertext | tag (16)`. Every ciphertext chunk is
//! exactly 32 KiB except the last, so the decryptor can walk the stream
//! without a length prefix.

use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{Aes256Gcm, Nonce};
use rand::{rngs::OsRng, RngCore};
use thiserror::Error;

/// Ciphertext chunk size, including the per-chunk overhead.
const CHUNK_SIZE: usize = 32 * 1024;
/// Per-chunk overhead: 12-byte nonce + 16-byte tag.
const CHUNK_OVERHEAD: usize = 12 + 16;
/// Plaintext bytes carried by a full chunk.
const PLAIN_CHUNK_SIZE: usize = CHUNK_SIZE - CHUNK_OVERHEAD;

/// Problem while decrypting a media stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum MediaCryptoError {
    /// A chunk was shorter than its fixed overhead.
    #[error("media chunk too short")]
    ChunkTooShort,

    /// A chunk failed authentication.
    #[error("media chunk failed to decrypt")]
    ChunkFailed,
}

/// A per-file media encryption key.
#[derive(Clone)]
pub struct MediaKey([u8; 32]);

impl std::fmt::Debug for MediaKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("MediaKey").finish_non_exhaustive()
    }
}

impl MediaKey {
    /// Generate a fresh random key.
    #[must_use]
    pub fn generate() -> Self {
        let mut key = [0u8; 32];
        OsRng.fill_bytes(&mut key);
        Self(key)
    }

    /// Rebuild a key from its raw bytes.
    #[must_use]
    pub const fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// The raw key bytes (sent to the peer out of band).
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    fn cipher(&self) -> Aes256Gcm {
        Aes256Gcm::new(self.0.as_slice().into())
    }

    /// Encrypt a media body as a chunk stream.
    #[must_use]
    pub fn encrypt_stream(&self, plaintext: &[u8]) -> Vec<u8> {
        let cipher = self.cipher();
        let chunks = plaintext.chunks(PLAIN_CHUNK_SIZE);
        let mut out = Vec::with_capacity(plaintext.len() + CHUNK_OVERHEAD);

        let seal = |out: &mut Vec<u8>, chunk: &[u8]| {
            let mut nonce = [0u8; 12];
            OsRng.fill_bytes(&mut nonce);
            let sealed = cipher
                .encrypt(Nonce::from_slice(&nonce), chunk)
                .expect("AES-GCM encryption is infallible for in-memory buffers");
            out.extend_from_slice(&nonce);
            out.extend_from_slice(&sealed);
        };

        if plaintext.is_empty() {
            seal(&mut out, &[]);
        } else {
            for chunk in chunks {
                seal(&mut out, chunk);
            }
        }
        out
    }

    /// Decrypt a chunk stream back into the media body.
    ///
    /// # Errors
    ///
    /// Returns a [`MediaCryptoError`] if any chunk is truncated or fails
    /// authentication.
    pub fn decrypt_stream(&self, data: &[u8]) -> Result<Vec<u8>, MediaCryptoError> {
        let cipher = self.cipher();
        let mut out = Vec::with_capacity(data.len());
        for chunk in data.chunks(CHUNK_SIZE) {
            if chunk.len() < CHUNK_OVERHEAD {
                return Err(MediaCryptoError::ChunkTooShort);
            }
            let (nonce, sealed) = chunk.split_at(12);
            let plain = cipher
                .decrypt(Nonce::from_slice(nonce), sealed)
                .map_err(|_| MediaCryptoError::ChunkFailed)?;
            out.extend_from_slice(&plain);
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn round_trip(len: usize) {
        let key = MediaKey::generate();
        let plaintext: Vec<u8> = (0..len).map(|i| (i % 251) as u8).collect();
        let encrypted = key.encrypt_stream(&plaintext);
        assert_eq!(key.decrypt_stream(&encrypted).expect("decrypt"), plaintext);
    }

    #[test]
    fn round_trips_small() {
        round_trip(0);
        round_trip(1);
        round_trip(1024);
    }

    #[test]
    fn round_trips_across_chunk_boundaries() {
        round_trip(PLAIN_CHUNK_SIZE - 1);
        round_trip(PLAIN_CHUNK_SIZE);
        round_trip(PLAIN_CHUNK_SIZE + 1);
        round_trip(3 * PLAIN_CHUNK_SIZE + 17);
    }

    #[test]
    fn full_chunks_are_exactly_chunk_size() {
        let key = MediaKey::generate();
        let encrypted = key.encrypt_stream(&vec![7u8; 2 * PLAIN_CHUNK_SIZE + 5]);
        assert_eq!(encrypted.len(), 2 * CHUNK_SIZE + 5 + CHUNK_OVERHEAD);
    }

    #[test]
    fn corrupted_chunk_fails() {
        let key = MediaKey::generate();
        let mut encrypted = key.encrypt_stream(b"some media bytes");
        encrypted[20] ^= 0xFF;
        assert_eq!(
            key.decrypt_stream(&encrypted),
            Err(MediaCryptoError::ChunkFailed)
        );
    }

    #[test]
    fn wrong_key_fails() {
        let key = MediaKey::generate();
        let encrypted = key.encrypt_stream(b"some media bytes");
        assert!(MediaKey::generate().decrypt_stream(&encrypted).is_err());
    }
}
