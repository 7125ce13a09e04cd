//! Event contract to upstream consumers.
//!
//! A single handler receives one event at a time; dispatch is serialized
//! per component (each owning task delivers its own events in order).

use std::sync::Arc;

use dittoweb_proto::authentication::PairedData;
use dittoweb_proto::conversations::{Conversation, Message};
use dittoweb_proto::events::{AccountChangeEvent, Settings, TypingData, UserAlertEvent};

/// Events emitted by the client core.
#[derive(Debug, Clone)]
pub enum Event {
    /// A pairing QR URL is ready to display.
    Qr {
        /// The full `support.google.com` URL with the embedded payload.
        url: String,
    },

    /// The phone completed pairing.
    PairSuccessful {
        /// Source id of the newly paired phone.
        phone_id: String,
        /// The full pair payload.
        data: PairedData,
    },

    /// The tachyon token was refreshed.
    AuthTokenRefreshed,

    /// The stream reopened after one or more errors.
    ListenRecovered,

    /// A stream attempt failed; the engine will retry.
    ListenTemporaryError {
        /// Description of the failure.
        error: String,
    },

    /// The stream cannot continue.
    ListenFatalError {
        /// Description of the failure.
        error: String,
    },

    /// A ditto ping failed outright.
    PingFailed {
        /// Description of the failure.
        error: String,
        /// Consecutive failure count.
        count: u32,
    },

    /// The phone stopped answering pings.
    PhoneNotResponding,

    /// The phone answered again after an unresponsive episode.
    PhoneRespondingAgain,

    /// No data arrived within the receive-check window; a sync was
    /// synthesized.
    NoDataReceived,

    /// An incoming or updated message.
    Message {
        message: Message,
        /// Whether this update replayed from the backlog.
        is_old: bool,
    },

    /// A conversation changed.
    Conversation { conversation: Conversation },

    /// A participant started or stopped typing.
    Typing { data: TypingData },

    /// A phone-side condition report.
    UserAlert { alert: UserAlertEvent },

    /// Phone settings changed.
    Settings { settings: Settings },

    /// The active account changed.
    AccountChange {
        event: AccountChangeEvent,
        /// Set for the synthesized event produced while decrypting
        /// second-generation payloads.
        is_fake: bool,
    },

    /// The Google-account session was signed out on the phone.
    GaiaLoggedOut,
}

/// Receives client events.
///
/// Implementations must be cheap; slow handlers stall the emitting task.
pub trait EventHandler: Send + Sync {
    /// Called once per event, in emission order per component.
    fn on_event(&self, event: Event);
}

/// Closure-based event handler.
pub struct CallbackHandler<F>
where
    F: Fn(Event) + Send + Sync,
{
    callback: F,
}

impl<F> CallbackHandler<F>
where
    F: Fn(Event) + Send + Sync,
{
    /// Wrap a closure as a handler.
    pub fn new(callback: F) -> Self {
        Self { callback }
    }
}

impl<F> EventHandler for CallbackHandler<F>
where
    F: Fn(Event) + Send + Sync,
{
    fn on_event(&self, event: Event) {
        (self.callback)(event);
    }
}

/// Handler that drops every event. Useful for headless flows and tests.
pub struct NoopHandler;

impl EventHandler for NoopHandler {
    fn on_event(&self, _event: Event) {}
}

/// Shared handle the engine components emit through.
pub(crate) type EventSink = Arc<dyn EventHandler>;
