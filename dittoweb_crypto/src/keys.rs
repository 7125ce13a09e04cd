//! P-256 refresh key: signing, agreement, and SPKI export.
//!
//! The refresh key is generated at first pairing. Its PKIX
//! SubjectPublicKeyInfo DER form is submitted during pairing; the private
//! half signs periodic token-refresh requests with ECDSA-SHA256
//! (DER-encoded signatures).

use hkdf::Hkdf;
use p256::ecdsa::signature::{Signer, Verifier};
use p256::ecdsa::{Signature, SigningKey, VerifyingKey};
use p256::pkcs8::{DecodePublicKey, EncodePublicKey};
use p256::{PublicKey, SecretKey};
use rand::rngs::OsRng;
use sha2::Sha256;
use thiserror::Error;

/// Problem while handling key material.
#[derive(Debug, Error)]
pub enum KeyError {
    /// The persisted scalar bytes are not a valid P-256 secret key.
    #[error("invalid P-256 secret scalar")]
    InvalidScalar,

    /// SPKI DER encoding or parsing failed.
    #[error("SPKI error: {0}")]
    Spki(#[from] p256::pkcs8::spki::Error),

    /// A signature failed to parse or verify.
    #[error("invalid signature")]
    InvalidSignature,

    /// HKDF output length was out of range.
    #[error("invalid HKDF output length")]
    InvalidKdfLength,
}

/// The P-256 signing key that authenticates token refreshes.
#[derive(Clone)]
pub struct RefreshKey {
    secret: SecretKey,
}

impl std::fmt::Debug for RefreshKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RefreshKey").finish_non_exhaustive()
    }
}

impl RefreshKey {
    /// Generate a fresh key for a new pairing.
    #[must_use]
    pub fn generate() -> Self {
        Self {
            secret: SecretKey::random(&mut OsRng),
        }
    }

    /// Rebuild the key from its persisted 32-byte scalar.
    ///
    /// # Errors
    ///
    /// Returns [`KeyError::InvalidScalar`] if the bytes are not a valid
    /// P-256 scalar.
    pub fn from_scalar_bytes(bytes: &[u8; 32]) -> Result<Self, KeyError> {
        let secret =
            SecretKey::from_bytes(bytes.into()).map_err(|_| KeyError::InvalidScalar)?;
        Ok(Self { secret })
    }

    /// The 32-byte scalar for persistence.
    #[must_use]
    pub fn to_scalar_bytes(&self) -> [u8; 32] {
        self.secret.to_bytes().into()
    }

    /// The PKIX SubjectPublicKeyInfo DER form of the public key.
    ///
    /// # Errors
    ///
    /// Returns a [`KeyError`] if DER encoding fails.
    pub fn public_key_der(&self) -> Result<Vec<u8>, KeyError> {
        Ok(self
            .secret
            .public_key()
            .to_public_key_der()?
            .as_bytes()
            .to_vec())
    }

    /// Sign `data` with ECDSA-SHA256, returning the DER-encoded signature.
    #[must_use]
    pub fn sign(&self, data: &[u8]) -> Vec<u8> {
        let signing_key = SigningKey::from(&self.secret);
        let signature: Signature = signing_key.sign(data);
        signature.to_der().as_bytes().to_vec()
    }

    /// Verify a DER-encoded ECDSA-SHA256 signature against this key.
    ///
    /// # Errors
    ///
    /// Returns [`KeyError::InvalidSignature`] if the signature fails to
    /// parse or verify.
    pub fn verify(&self, data: &[u8], signature_der: &[u8]) -> Result<(), KeyError> {
        let signature =
            Signature::from_der(signature_der).map_err(|_| KeyError::InvalidSignature)?;
        let verifying_key = VerifyingKey::from(&SigningKey::from(&self.secret));
        verifying_key
            .verify(data, &signature)
            .map_err(|_| KeyError::InvalidSignature)
    }

    /// ECDH against a peer SPKI DER public key, expanded through
    /// HKDF-SHA256 into a 32-byte key.
    ///
    /// # Errors
    ///
    /// Returns a [`KeyError`] if the peer key is malformed.
    pub fn agree(&self, peer_spki_der: &[u8], info: &[u8]) -> Result<[u8; 32], KeyError> {
        let peer = PublicKey::from_public_key_der(peer_spki_der)?;
        let shared = p256::ecdh::diffie_hellman(self.secret.to_nonzero_scalar(), peer.as_affine());
        let hk = Hkdf::<Sha256>::new(None, shared.raw_secret_bytes());
        let mut out = [0u8; 32];
        hk.expand(info, &mut out)
            .map_err(|_| KeyError::InvalidKdfLength)?;
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scalar_bytes_round_trip() {
        let key = RefreshKey::generate();
        let restored = RefreshKey::from_scalar_bytes(&key.to_scalar_bytes()).expect("restore");
        assert_eq!(key.to_scalar_bytes(), restored.to_scalar_bytes());
    }

    #[test]
    fn spki_der_has_p256_header() {
        let der = RefreshKey::generate().public_key_der().expect("der");
        // SubjectPublicKeyInfo for an uncompressed P-256 point is 91 bytes.
        assert_eq!(der.len(), 91);
        assert_eq!(der[0], 0x30);
    }

    #[test]
    fn signatures_verify_and_reject_tampering() {
        let key = RefreshKey::generate();
        let data = b"req-id:1700000000000000";
        let signature = key.sign(data);
        key.verify(data, &signature).expect("verify");
        assert!(key.verify(b"req-id:1700000000000001", &signature).is_err());
    }

    #[test]
    fn agreement_is_symmetric() {
        let a = RefreshKey::generate();
        let b = RefreshKey::generate();
        let a_der = a.public_key_der().expect("der");
        let b_der = b.public_key_der().expect("der");
        let ab = a.agree(&b_der, b"pairing").expect("agree");
        let ba = b.agree(&a_der, b"pairing").expect("agree");
        assert_eq!(ab, ba);
    }
}
