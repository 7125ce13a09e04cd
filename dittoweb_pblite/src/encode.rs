//! Sparse-array encoder.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde_json::{json, Value};

use crate::{binary::is_binary_field, to_value, Pblite};

/// Builds the sparse JSON array for one message.
///
/// Field setters skip proto3 default values so the encoded array stays
/// sparse; index `field - 1` holds the value of `field`. Trailing nulls
/// are trimmed by [`Encoder::finish`].
#[derive(Debug)]
pub struct Encoder {
    message: &'static str,
    slots: Vec<Value>,
}

impl Encoder {
    /// Create an encoder for the named message.
    #[must_use]
    pub fn new(message: &'static str) -> Self {
        Self {
            message,
            slots: Vec::new(),
        }
    }

    fn put(&mut self, field: u32, value: Value) {
        let index = (field - 1) as usize;
        if self.slots.len() <= index {
            self.slots.resize(index + 1, Value::Null);
        }
        self.slots[index] = value;
    }

    /// Set a string field, honoring the binary override table.
    pub fn string(&mut self, field: u32, value: &str) {
        if value.is_empty() {
            return;
        }
        if is_binary_field(self.message, field) {
            self.put(field, Value::String(STANDARD.encode(value.as_bytes())));
        } else {
            self.put(field, Value::String(value.to_owned()));
        }
    }

    /// Set a bytes field (standard-alphabet base64).
    pub fn bytes(&mut self, field: u32, value: &[u8]) {
        if value.is_empty() {
            return;
        }
        self.put(field, Value::String(STANDARD.encode(value)));
    }

    /// Set an int32 field.
    pub fn int32(&mut self, field: u32, value: i32) {
        if value != 0 {
            self.put(field, json!(value));
        }
    }

    /// Set an int64 field.
    pub fn int64(&mut self, field: u32, value: i64) {
        if value != 0 {
            self.put(field, json!(value));
        }
    }

    /// Set a uint64 field.
    pub fn uint64(&mut self, field: u32, value: u64) {
        if value != 0 {
            self.put(field, json!(value));
        }
    }

    /// Set a bool field.
    pub fn bool(&mut self, field: u32, value: bool) {
        if value {
            self.put(field, Value::Bool(true));
        }
    }

    /// Set an enum field by its integer value.
    pub fn enumeration(&mut self, field: u32, value: i32) {
        if value != 0 {
            self.put(field, json!(value));
        }
    }

    /// Set a nested message field, honoring the binary override table.
    pub fn message<M: Pblite>(&mut self, field: u32, value: &M) {
        if is_binary_field(self.message, field) {
            self.put(field, Value::String(STANDARD.encode(value.encode_to_vec())));
        } else {
            self.put(field, to_value(value));
        }
    }

    /// Set an optional nested message field.
    pub fn message_opt<M: Pblite>(&mut self, field: u32, value: Option<&M>) {
        if let Some(value) = value {
            self.message(field, value);
        }
    }

    /// Set a repeated message field.
    pub fn repeated_message<M: Pblite>(&mut self, field: u32, items: &[M]) {
        if items.is_empty() {
            return;
        }
        let values = items.iter().map(to_value).collect();
        self.put(field, Value::Array(values));
    }

    /// Set a repeated string field.
    pub fn repeated_string(&mut self, field: u32, items: &[String]) {
        if items.is_empty() {
            return;
        }
        let values = items.iter().map(|s| Value::String(s.clone())).collect();
        self.put(field, Value::Array(values));
    }

    /// Trim trailing nulls and return the finished array.
    #[must_use]
    pub fn finish(mut self) -> Value {
        while self.slots.last().is_some_and(Value::is_null) {
            self.slots.pop();
        }
        Value::Array(self.slots)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_omitted() {
        let mut enc = Encoder::new("test.Message");
        enc.string(1, "");
        enc.int32(2, 0);
        enc.bool(3, false);
        assert_eq!(enc.finish(), json!([]));
    }

    #[test]
    fn trailing_nulls_are_trimmed() {
        let mut enc = Encoder::new("test.Message");
        enc.int32(5, 7);
        enc.string(2, "hi");
        assert_eq!(enc.finish(), json!([null, "hi", null, null, 7]));
    }

    #[test]
    fn binary_override_base64s_strings() {
        let mut enc = Encoder::new("rpc.OutgoingRPCMessage");
        enc.string(9, "abc");
        assert_eq!(enc.finish(), json!([
            null, null, null, null, null, null, null, null, "YWJj"
        ]));
    }
}
