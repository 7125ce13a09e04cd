//! Sparse-array decoder.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde_json::Value;

use crate::{binary::is_binary_field, error::DecodeError, from_value, Pblite};

/// Reads typed fields out of one parsed pblite array.
///
/// Entries past the end of the array (and explicit nulls) decode as
/// field-absent; getters return `Ok(None)` for those and the caller picks
/// the proto3 default.
#[derive(Debug)]
pub struct Decoder<'a> {
    message: &'static str,
    slots: &'a [Value],
}

impl<'a> Decoder<'a> {
    /// Wrap a parsed JSON value.
    ///
    /// # Errors
    ///
    /// Returns [`DecodeError::NotAnArray`] if the value is not an array.
    pub fn new(message: &'static str, value: &'a Value) -> Result<Self, DecodeError> {
        let slots = value.as_array().ok_or(DecodeError::NotAnArray)?;
        Ok(Self { message, slots })
    }

    fn get(&self, field: u32) -> Option<&'a Value> {
        self.slots
            .get((field - 1) as usize)
            .filter(|v| !v.is_null())
    }

    fn wrong_kind(&self, field: u32, expected: &'static str) -> DecodeError {
        DecodeError::WrongKind {
            message: self.message,
            field,
            expected,
        }
    }

    /// Read a string field, honoring the binary override table.
    ///
    /// # Errors
    ///
    /// Returns a [`DecodeError`] on a non-string entry or, for override
    /// fields, malformed base64/UTF-8.
    pub fn string(&self, field: u32) -> Result<Option<String>, DecodeError> {
        let Some(value) = self.get(field) else {
            return Ok(None);
        };
        let s = value.as_str().ok_or_else(|| self.wrong_kind(field, "string"))?;
        if is_binary_field(self.message, field) {
            let raw = STANDARD.decode(s)?;
            Ok(Some(String::from_utf8(raw)?))
        } else {
            Ok(Some(s.to_owned()))
        }
    }

    /// Read a bytes field.
    ///
    /// # Errors
    ///
    /// Returns a [`DecodeError`] on a non-string entry or malformed base64.
    pub fn bytes(&self, field: u32) -> Result<Option<Vec<u8>>, DecodeError> {
        let Some(value) = self.get(field) else {
            return Ok(None);
        };
        let s = value.as_str().ok_or_else(|| self.wrong_kind(field, "base64 string"))?;
        Ok(Some(STANDARD.decode(s)?))
    }

    /// Read an int32 field.
    ///
    /// # Errors
    ///
    /// Returns a [`DecodeError`] on a non-numeric or out-of-range entry.
    pub fn int32(&self, field: u32) -> Result<Option<i32>, DecodeError> {
        match self.int64(field)? {
            None => Ok(None),
            Some(n) => Ok(Some(i32::try_from(n).map_err(|_| DecodeError::OutOfRange {
                message: self.message,
                field,
            })?)),
        }
    }

    /// Read an int64 field.
    ///
    /// # Errors
    ///
    /// Returns a [`DecodeError`] on a non-numeric entry.
    pub fn int64(&self, field: u32) -> Result<Option<i64>, DecodeError> {
        let Some(value) = self.get(field) else {
            return Ok(None);
        };
        value
            .as_i64()
            .map(Some)
            .ok_or_else(|| self.wrong_kind(field, "integer"))
    }

    /// Read a uint64 field.
    ///
    /// # Errors
    ///
    /// Returns a [`DecodeError`] on a non-numeric entry.
    pub fn uint64(&self, field: u32) -> Result<Option<u64>, DecodeError> {
        let Some(value) = self.get(field) else {
            return Ok(None);
        };
        value
            .as_u64()
            .map(Some)
            .ok_or_else(|| self.wrong_kind(field, "unsigned integer"))
    }

    /// Read a bool field.
    ///
    /// # Errors
    ///
    /// Returns a [`DecodeError`] on a non-boolean entry.
    pub fn bool(&self, field: u32) -> Result<Option<bool>, DecodeError> {
        let Some(value) = self.get(field) else {
            return Ok(None);
        };
        value
            .as_bool()
            .map(Some)
            .ok_or_else(|| self.wrong_kind(field, "boolean"))
    }

    /// Read an enum field by its integer value.
    ///
    /// # Errors
    ///
    /// Returns a [`DecodeError`] on a non-numeric or out-of-range entry.
    pub fn enumeration(&self, field: u32) -> Result<Option<i32>, DecodeError> {
        self.int32(field)
    }

    /// Read a nested message field, honoring the binary override table.
    ///
    /// # Errors
    ///
    /// Returns a [`DecodeError`] if the entry is neither an array (plain)
    /// nor a base64 protobuf string (override), or its content is
    /// malformed.
    pub fn message<M: Pblite>(&self, field: u32) -> Result<Option<M>, DecodeError> {
        let Some(value) = self.get(field) else {
            return Ok(None);
        };
        if is_binary_field(self.message, field) {
            let s = value
                .as_str()
                .ok_or_else(|| self.wrong_kind(field, "base64 protobuf string"))?;
            let raw = STANDARD.decode(s)?;
            Ok(Some(M::decode(raw.as_slice())?))
        } else {
            Ok(Some(from_value(value)?))
        }
    }

    /// Read a repeated message field.
    ///
    /// # Errors
    ///
    /// Returns a [`DecodeError`] if the entry is not an array of arrays.
    pub fn repeated_message<M: Pblite>(&self, field: u32) -> Result<Vec<M>, DecodeError> {
        let Some(value) = self.get(field) else {
            return Ok(Vec::new());
        };
        let items = value
            .as_array()
            .ok_or_else(|| self.wrong_kind(field, "array"))?;
        items.iter().map(from_value).collect()
    }

    /// Read a repeated string field.
    ///
    /// # Errors
    ///
    /// Returns a [`DecodeError`] if the entry is not an array of strings.
    pub fn repeated_string(&self, field: u32) -> Result<Vec<String>, DecodeError> {
        let Some(value) = self.get(field) else {
            return Ok(Vec::new());
        };
        let items = value
            .as_array()
            .ok_or_else(|| self.wrong_kind(field, "array"))?;
        items
            .iter()
            .map(|v| {
                v.as_str()
                    .map(str::to_owned)
                    .ok_or_else(|| self.wrong_kind(field, "string"))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn missing_trailing_entries_are_absent() {
        let value = json!(["a"]);
        let dec = Decoder::new("test.Message", &value).expect("array");
        assert_eq!(dec.string(1).expect("string"), Some("a".into()));
        assert_eq!(dec.string(7).expect("string"), None);
        assert_eq!(dec.int64(7).expect("int"), None);
    }

    #[test]
    fn explicit_null_is_absent() {
        let value = json!([null, 3]);
        let dec = Decoder::new("test.Message", &value).expect("array");
        assert_eq!(dec.int32(1).expect("int"), None);
        assert_eq!(dec.int32(2).expect("int"), Some(3));
    }

    #[test]
    fn wrong_kind_is_rejected() {
        let value = json!([42]);
        let dec = Decoder::new("test.Message", &value).expect("array");
        assert!(dec.string(1).is_err());
    }

    #[test]
    fn non_array_is_rejected() {
        assert!(Decoder::new("test.Message", &json!({"a": 1})).is_err());
    }
}
