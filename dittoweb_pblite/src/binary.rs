//! Binary-field override table.
//!
//! A small static table keyed by fully-qualified message name listing
//! field numbers whose wire value is treated as opaque binary regardless
//! of the declared protobuf type: strings become their UTF-8 bytes
//! base64-encoded, nested messages become their standard protobuf
//! serialization base64-encoded.
//!
//! The table is part of the wire format. It is held as data so that new
//! entries never touch the codec.

/// Message-name → override field numbers.
const BINARY_FIELDS: &[(&str, &[u32])] = &[
    ("authentication.SignInGaiaRequest.Inner", &[36]),
    ("authentication.SignInGaiaResponse", &[2]),
    ("authentication.RPCGaiaData.UnknownContainer.Item2.Item1", &[1]),
    ("authentication.RPCGaiaData.UnknownContainer.Item4", &[1, 8]),
    ("rpc.OutgoingRPCMessage", &[9]),
];

/// Whether `field` of `message` is a binary-override field.
#[must_use]
pub fn is_binary_field(message: &str, field: u32) -> bool {
    BINARY_FIELDS
        .iter()
        .any(|(name, fields)| *name == message && fields.contains(&field))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn override_entries_match() {
        assert!(is_binary_field("rpc.OutgoingRPCMessage", 9));
        assert!(is_binary_field("authentication.SignInGaiaRequest.Inner", 36));
        assert!(is_binary_field(
            "authentication.RPCGaiaData.UnknownContainer.Item4",
            8
        ));
    }

    #[test]
    fn non_entries_do_not_match() {
        assert!(!is_binary_field("rpc.OutgoingRPCMessage", 1));
        assert!(!is_binary_field("rpc.IncomingRPCMessage", 9));
    }
}
