//! # dittoweb crypto
//!
//! Cryptographic kit for the Messages for Web client:
//!
//! - [`payload`] — AES-256-CTR + HMAC-SHA256 for RPC payloads
//! - [`media`] — AES-256-GCM chunk stream for media transfer
//! - [`keys`] — P-256 signing/agreement and PKIX SPKI DER export
//! - [`hash`] — SHA-256 and the SAPISIDHASH digest
//!
//! All primitives come from the RustCrypto crates.

pub mod hash;
pub mod keys;
pub mod media;
pub mod payload;

pub use hash::{sapisid_hash, sha256};
pub use keys::{KeyError, RefreshKey};
pub use media::{MediaCryptoError, MediaKey};
pub use payload::{PayloadCryptoError, PayloadKeys};
