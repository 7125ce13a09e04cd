//! # dittoweb pblite
//!
//! Codec for the "JSON-array protobuf" encoding (pblite) that the Messages
//! for Web service requires on most endpoints.
//!
//! A protobuf message is encoded as a sparse JSON array where index `i`
//! holds the value of field number `i + 1` and omitted fields are `null`.
//! Nested messages are nested arrays; trailing nulls are trimmed on encode.
//!
//! # Scalars
//!
//! Numbers and booleans are native JSON, bytes are standard-alphabet
//! base64, enums carry their integer value, and strings are JSON strings
//! unless the field appears in the [binary override table](binary), in
//! which case the value is treated as opaque binary regardless of its
//! declared type.
//!
//! # Traits
//!
//! - [`Pblite`] — per-message field map, layered on [`prost::Message`]
//! - [`Encoder`] / [`Decoder`] — typed per-field helpers
//!
//! Map fields and extensions are unused by this protocol and have no
//! accessors.

pub mod binary;
pub mod decode;
pub mod encode;
pub mod error;
pub mod wire;

pub use decode::Decoder;
pub use encode::Encoder;
pub use error::DecodeError;
pub use wire::{decode_body, WireFormat};

use serde_json::Value;

/// A message that can be encoded to and decoded from the pblite format.
///
/// Implementations list each field once in `encode_fields` and once in
/// `decode_fields`; the [`Encoder`] and [`Decoder`] consult the binary
/// override table keyed by [`Pblite::NAME`], so adding an override never
/// touches the codec itself.
pub trait Pblite: prost::Message + Default {
    /// Fully-qualified protobuf message name, e.g. `rpc.OutgoingRPCMessage`.
    const NAME: &'static str;

    /// Write every populated field into the encoder.
    fn encode_fields(&self, enc: &mut Encoder);

    /// Read every field back out of the decoder.
    ///
    /// Missing trailing entries decode as field-absent.
    ///
    /// # Errors
    ///
    /// Returns a [`DecodeError`] if a present entry has the wrong JSON kind
    /// or carries malformed base64/UTF-8/protobuf content.
    fn decode_fields(dec: &Decoder<'_>) -> Result<Self, DecodeError>;
}

/// Encode a message as a pblite JSON value.
#[must_use]
pub fn to_value<M: Pblite>(msg: &M) -> Value {
    let mut enc = Encoder::new(M::NAME);
    msg.encode_fields(&mut enc);
    enc.finish()
}

/// Encode a message as pblite JSON bytes.
#[must_use]
pub fn to_vec<M: Pblite>(msg: &M) -> Vec<u8> {
    to_value(msg).to_string().into_bytes()
}

/// Decode a message from an already-parsed JSON value.
///
/// # Errors
///
/// Returns a [`DecodeError`] if the value is not an array or a field entry
/// is malformed.
pub fn from_value<M: Pblite>(value: &Value) -> Result<M, DecodeError> {
    let dec = Decoder::new(M::NAME, value)?;
    M::decode_fields(&dec)
}

/// Decode a message from raw pblite JSON bytes.
///
/// # Errors
///
/// Returns a [`DecodeError`] if the bytes are not valid JSON or the decoded
/// value is malformed.
pub fn from_slice<M: Pblite>(bytes: &[u8]) -> Result<M, DecodeError> {
    let value: Value = serde_json::from_slice(bytes)?;
    from_value(&value)
}
