//! # dittoweb core
//!
//! Client core for the Google Messages for Web protocol: pairs a browser
//! identity with a phone, maintains a streaming long-poll connection for
//! real-time events, correlates request/response RPCs transported over
//! that connection, and surfaces a typed stream of domain events.
//!
//! # Architecture
//!
//! - [`auth`] — durable session/credential state with serialized mutation
//! - [`http`] — one unary request primitive and one streaming open
//! - [`rpc`] — outgoing envelopes, request-id keyed waiters, ack batching
//! - [`longpoll`] — the stream reader, framer, dispatcher, and pinger
//! - [`client`] — the lifecycle facade
//! - [`events`] — the typed event contract to upstream consumers
//!
//! # Example
//!
//! ```ignore
//! use dittoweb_core::{AuthState, CallbackHandler, Client, ClientConfig};
//!
//! let handler = std::sync::Arc::new(CallbackHandler::new(|event| {
//!     println!("{event:?}");
//! }));
//! let client = Client::new(AuthState::new(), handler, ClientConfig::default())?;
//! let qr = client.start_login().await?;   // show this QR to the user
//! // ... pairing completes, events flow ...
//! client.connect().await?;
//! ```

pub mod auth;
pub mod client;
pub mod consts;
pub mod dedup;
pub mod error;
pub mod events;
pub mod framing;
pub mod http;
pub mod longpoll;
pub mod media;
pub mod rpc;

mod dispatch;
mod methods;
mod pinger;

pub use auth::{AuthState, AuthStore, PushKeys};
pub use client::{Client, ClientConfig};
pub use dedup::DedupRing;
pub use error::{ClientError, RequestError};
pub use events::{CallbackHandler, Event, EventHandler, NoopHandler};
pub use framing::{Framer, FramerError};
pub use http::HttpClient;
pub use longpoll::LongPoll;
pub use media::MediaUpload;
pub use rpc::{IncomingPayload, SendOptions, SessionHandler};

/// Lock a mutex, recovering from poisoning; held only for short critical
/// sections.
pub(crate) fn lock<T>(mutex: &std::sync::Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
}
