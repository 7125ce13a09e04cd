//! Digest helpers: SHA-256 for update dedup, SHA-1 for SAPISIDHASH.

use sha1::Sha1;
use sha2::{Digest, Sha256};

/// SHA-256 of `data`.
#[must_use]
pub fn sha256(data: &[u8]) -> [u8; 32] {
    Sha256::digest(data).into()
}

/// The SAPISIDHASH authorization value:
/// `<ts>_<sha1(ts + " " + sapisid + " " + origin)>`.
#[must_use]
pub fn sapisid_hash(timestamp_secs: i64, sapisid: &str, origin: &str) -> String {
    let digest = Sha1::digest(format!("{timestamp_secs} {sapisid} {origin}").as_bytes());
    let hex: String = digest.iter().map(|b| format!("{b:02x}")).collect();
    format!("{timestamp_secs}_{hex}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sha256_matches_known_vector() {
        // SHA-256 of the empty string.
        assert_eq!(
            sha256(b"")[..4],
            [0xe3, 0xb0, 0xc4, 0x42]
        );
    }

    #[test]
    fn sapisid_hash_shape() {
        let hash = sapisid_hash(1_700_000_000, "SAPISID-VALUE", "https://messages.google.com");
        let (ts, digest) = hash.split_once('_').expect("underscore");
        assert_eq!(ts, "1700000000");
        assert_eq!(digest.len(), 40);
        assert!(digest.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn sapisid_hash_is_deterministic() {
        let a = sapisid_hash(1, "s", "o");
        let b = sapisid_hash(1, "s", "o");
        assert_eq!(a, b);
        assert_ne!(a, sapisid_hash(2, "s", "o"));
    }
}
