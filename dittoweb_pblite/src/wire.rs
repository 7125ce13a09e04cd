//! Wire-format selection by HTTP content type.
//!
//! Servers reply with `application/x-protobuf`, `application/json+protobuf`,
//! or `text/plain` (which carries pblite). Unknown content types fall back
//! to trying protobuf first, then pblite.


use crate::{error::DecodeError, from_slice, Pblite};

/// The two encodings a response body can carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WireFormat {
    /// Standard binary protobuf (`application/x-protobuf`).
    Protobuf,
    /// Sparse JSON-array protobuf (`application/json+protobuf`, `text/plain`).
    Pblite,
}

impl WireFormat {
    /// Pick the format for a `Content-Type` header value, if recognized.
    #[must_use]
    pub fn from_content_type(content_type: &str) -> Option<Self> {
        let mime = content_type
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase();
        match mime.as_str() {
            "application/x-protobuf" | "application/protobuf" => Some(Self::Protobuf),
            "application/json+protobuf" | "text/plain" => Some(Self::Pblite),
            _ => None,
        }
    }

    /// The `Content-Type` value to send for this format.
    #[must_use]
    pub const fn content_type(self) -> &'static str {
        match self {
            Self::Protobuf => "application/x-protobuf",
            Self::Pblite => "application/json+protobuf",
        }
    }
}

/// Decode a response body, selecting the codec by content type.
///
/// Unrecognized content types try protobuf first, then pblite.
///
/// # Errors
///
/// Returns the pblite [`DecodeError`] when every applicable codec fails.
pub fn decode_body<M: Pblite>(content_type: &str, body: &[u8]) -> Result<M, DecodeError> {
    match WireFormat::from_content_type(content_type) {
        Some(WireFormat::Protobuf) => Ok(M::decode(body)?),
        Some(WireFormat::Pblite) => from_slice(body),
        None => match M::decode(body) {
            Ok(msg) => Ok(msg),
            Err(_) => from_slice(body),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn content_types_map_to_formats() {
        assert_eq!(
            WireFormat::from_content_type("application/x-protobuf"),
            Some(WireFormat::Protobuf)
        );
        assert_eq!(
            WireFormat::from_content_type("application/json+protobuf; charset=utf-8"),
            Some(WireFormat::Pblite)
        );
        assert_eq!(
            WireFormat::from_content_type("Text/Plain"),
            Some(WireFormat::Pblite)
        );
        assert_eq!(WireFormat::from_content_type("application/json"), None);
    }
}
