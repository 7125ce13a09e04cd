//! Error types for the pblite codec.

use thiserror::Error;

/// Problem while decoding a pblite value.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// The top-level value was not a JSON array.
    #[error("pblite value is not an array")]
    NotAnArray,

    /// A field entry had the wrong JSON kind.
    #[error("field {field} of {message}: expected {expected}")]
    WrongKind {
        /// Fully-qualified message name.
        message: &'static str,
        /// Protobuf field number.
        field: u32,
        /// The JSON kind the decoder expected.
        expected: &'static str,
    },

    /// A numeric entry did not fit the target integer type.
    #[error("field {field} of {message}: number out of range")]
    OutOfRange {
        /// Fully-qualified message name.
        message: &'static str,
        /// Protobuf field number.
        field: u32,
    },

    /// A bytes or binary-override entry was not valid base64.
    #[error("invalid base64: {0}")]
    Base64(#[from] base64::DecodeError),

    /// A binary-override string field did not decode as UTF-8.
    #[error("invalid UTF-8 in binary string field: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),

    /// A binary-override message field did not decode as protobuf.
    #[error("invalid protobuf in binary message field: {0}")]
    Protobuf(#[from] prost::DecodeError),

    /// The input bytes were not valid JSON.
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
}
