//! Error taxonomy for the client core.

use thiserror::Error;

use crate::framing::FramerError;

/// Problem while performing an HTTP RPC or reading the stream.
#[derive(Debug, Error)]
pub enum RequestError {
    /// Transport-level failure.
    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    /// The server returned a non-2xx status.
    #[error("HTTP error {status}: {body}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Response body, truncated for logging.
        body: String,
    },

    /// The response was structurally unusable.
    #[error("invalid response: {0}")]
    InvalidResponse(&'static str),

    /// Stream framing violation; fatal for the stream attempt.
    #[error("stream framing error: {0}")]
    Framing(#[from] FramerError),

    /// The pblite layer rejected the body.
    #[error("codec error: {0}")]
    Decode(#[from] dittoweb_pblite::DecodeError),

    /// The protobuf layer rejected an inner payload.
    #[error("protobuf error: {0}")]
    Proto(#[from] prost::DecodeError),

    /// An incoming payload failed to decrypt.
    #[error("payload crypto error: {0}")]
    PayloadCrypto(#[from] dittoweb_crypto::PayloadCryptoError),

    /// The waiter was removed before a response arrived.
    #[error("request cancelled before a response arrived")]
    Cancelled,
}

/// Client lifecycle failures.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Token or browser identity is missing.
    #[error("not logged in")]
    NotLoggedIn,

    /// Background sync finished without ever receiving a data payload.
    #[error("background polling exited uncleanly")]
    BackgroundPollingExitedUncleanly,

    /// The stream did not open within the first-connect window.
    #[error("timed out waiting for the stream to open")]
    ConnectTimeout,

    /// An underlying RPC failed.
    #[error(transparent)]
    Request(#[from] RequestError),

    /// Key material failure.
    #[error("key error: {0}")]
    Key(#[from] dittoweb_crypto::KeyError),

    /// A media body failed to decrypt.
    #[error("media crypto error: {0}")]
    Media(#[from] dittoweb_crypto::MediaCryptoError),
}
