//! Incremental parser for the `[[ <element>, <element>, ... ]]` stream.
//!
//! The body is a nested JSON array delivered over a long-lived response.
//! Elements are accumulated byte by byte; whenever a candidate ends with
//! `]` and parses as a standalone JSON value, it is emitted and the
//! buffer clears unconditionally, so the framer stays synchronized even
//! when the protobuf layer later rejects the element.

use serde_json::Value;
use thiserror::Error;

/// Accumulated element size cap; exceeding it is fatal for the stream.
const MAX_ELEMENT_SIZE: usize = 10 * 1024 * 1024;

/// Fatal framing violations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum FramerError {
    /// The stream did not start with `[[`.
    #[error("stream did not start with '[['")]
    BadPrefix,

    /// An element exceeded the 10 MB cap.
    #[error("stream element exceeded {MAX_ELEMENT_SIZE} bytes")]
    ElementTooLarge,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    /// Waiting for the outer `[`.
    OuterOpen,
    /// Waiting for the first element's `[`.
    FirstElement,
    /// Accumulating elements.
    Elements,
    /// The outer array closed cleanly.
    Done,
}

/// Byte-fed framer for one stream attempt.
#[derive(Debug)]
pub struct Framer {
    state: State,
    buf: Vec<u8>,
}

impl Framer {
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: State::OuterOpen,
            buf: Vec::new(),
        }
    }

    /// Whether the outer array closed cleanly with `]]`.
    #[must_use]
    pub fn is_done(&self) -> bool {
        self.state == State::Done
    }

    /// Feed a chunk; returns every element completed within it, in order.
    ///
    /// # Errors
    ///
    /// Returns a [`FramerError`] on a bad prefix or an oversize element;
    /// both are fatal for the stream attempt.
    pub fn feed(&mut self, chunk: &[u8]) -> Result<Vec<Value>, FramerError> {
        let mut out = Vec::new();
        for &byte in chunk {
            match self.state {
                State::OuterOpen => match byte {
                    b'[' => self.state = State::FirstElement,
                    b' ' | b'\t' | b'\r' | b'\n' => {}
                    _ => return Err(FramerError::BadPrefix),
                },
                State::FirstElement => match byte {
                    b'[' => {
                        self.state = State::Elements;
                        self.buf.push(byte);
                    }
                    _ => return Err(FramerError::BadPrefix),
                },
                State::Elements => {
                    if self.buf.is_empty() {
                        match byte {
                            b',' | b' ' | b'\t' | b'\r' | b'\n' => {}
                            b']' => self.state = State::Done,
                            _ => self.buf.push(byte),
                        }
                    } else {
                        self.buf.push(byte);
                        if byte == b']' {
                            if let Ok(value) = serde_json::from_slice::<Value>(&self.buf) {
                                self.buf.clear();
                                out.push(value);
                            }
                        }
                        if self.buf.len() > MAX_ELEMENT_SIZE {
                            return Err(FramerError::ElementTooLarge);
                        }
                    }
                }
                State::Done => {}
            }
        }
        Ok(out)
    }
}

impl Default for Framer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn feed_all(framer: &mut Framer, bytes: &[u8]) -> Vec<Value> {
        framer.feed(bytes).expect("feed")
    }

    #[test]
    fn parses_elements_in_order() {
        let mut framer = Framer::new();
        let values = feed_all(&mut framer, b"[[1,null],[2],[3,[4]]]");
        assert_eq!(values, vec![json!([1, null]), json!([2]), json!([3, [4]])]);
        assert!(framer.is_done());
    }

    #[test]
    fn handles_byte_at_a_time_delivery() {
        let mut framer = Framer::new();
        let mut values = Vec::new();
        for byte in b"[[\"a\"] , [\"b\"]]" {
            values.extend(framer.feed(&[*byte]).expect("feed"));
        }
        assert_eq!(values, vec![json!(["a"]), json!(["b"])]);
        assert!(framer.is_done());
    }

    #[test]
    fn nested_close_brackets_do_not_split_elements() {
        let mut framer = Framer::new();
        let values = feed_all(&mut framer, b"[[[1,[2,[3]]],null]]");
        assert_eq!(values, vec![json!([[1, [2, [3]]], null])]);
    }

    #[test]
    fn exactly_n_elements_for_n_inputs() {
        let mut framer = Framer::new();
        let values = feed_all(&mut framer, b"[[1],[2],[3],[4],[5]]");
        assert_eq!(values.len(), 5);
    }

    #[test]
    fn bad_prefix_is_fatal() {
        assert_eq!(
            Framer::new().feed(b"{\"not\": \"an array\"}"),
            Err(FramerError::BadPrefix)
        );
        assert_eq!(Framer::new().feed(b"[x"), Err(FramerError::BadPrefix));
    }

    #[test]
    fn eof_without_close_is_not_an_error() {
        let mut framer = Framer::new();
        let values = feed_all(&mut framer, b"[[1],[2]");
        assert_eq!(values.len(), 2);
        assert!(!framer.is_done());
    }

    #[test]
    fn leading_whitespace_before_outer_bracket_is_tolerated() {
        let mut framer = Framer::new();
        let values = feed_all(&mut framer, b"  [[7]]");
        assert_eq!(values, vec![json!([7])]);
        assert!(framer.is_done());
    }
}
