//! Session RPC engine.
//!
//! Builds outgoing envelopes, issues them over HTTP, and delivers the
//! eventual response to its waiter. The POST's own response body carries
//! nothing: the real response arrives out-of-band on the long-poll stream
//! and is matched back to the waiter by the envelope's `session_id` field.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use prost::Message as _;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, warn};
use uuid::Uuid;

use dittoweb_pblite::WireFormat;
use dittoweb_proto::authentication::AuthMessage;
use dittoweb_proto::rpc::{
    message_type_for_action, AckMessageEntry, AckMessageRequest, ActionType, BugleRoute,
    IncomingRpcMessage, MessageType, OutgoingRpcAuth, OutgoingRpcData, OutgoingRpcMessage,
    RpcMessageData,
};

use crate::auth::AuthStore;
use crate::consts::{config_version, messaging_url, ACK_FLUSH_INTERVAL, SLOW_REQUEST_AFTER};
use crate::error::RequestError;
use crate::http::HttpClient;
use crate::lock;

/// Per-call knobs for [`SessionHandler::send`].
#[derive(Default)]
pub struct SendOptions {
    /// Use this request id instead of a fresh UUID.
    pub custom_request_id: Option<String>,
    /// Suppress the TTL field even though the auth state has a default.
    pub omit_ttl: bool,
    /// Place the payload in `unencrypted_proto_data` verbatim.
    pub dont_encrypt: bool,
    /// Override the wrapper message type for this call.
    pub message_type: Option<MessageType>,
}

/// A decoded incoming data envelope with its payload ready to use.
#[derive(Debug)]
pub struct IncomingPayload {
    /// The raw envelope from the wire.
    pub envelope: IncomingRpcMessage,
    /// The decoded inner message.
    pub data: RpcMessageData,
    /// Decrypted payload bytes when the envelope was encrypted; `None`
    /// means the unencrypted field applies verbatim.
    pub decrypted: Option<Vec<u8>>,
}

impl IncomingPayload {
    /// The effective payload bytes.
    #[must_use]
    pub fn payload_bytes(&self) -> &[u8] {
        self.decrypted
            .as_deref()
            .unwrap_or(&self.data.unencrypted_proto_data)
    }

    /// Decode the payload as a protobuf message.
    ///
    /// # Errors
    ///
    /// Returns the prost error when the payload is not a valid `M`.
    pub fn decode<M: prost::Message + Default>(&self) -> Result<M, prost::DecodeError> {
        M::decode(self.payload_bytes())
    }
}

type SlowCallback = Arc<dyn Fn() + Send + Sync>;

/// The request/response correlation engine for one session.
pub struct SessionHandler {
    auth: Arc<AuthStore>,
    http: HttpClient,
    waiters: Mutex<HashMap<String, oneshot::Sender<IncomingPayload>>>,
    ack_queue: Mutex<HashSet<String>>,
    ack_ticker: Mutex<Option<JoinHandle<()>>>,
    on_slow: Mutex<Option<SlowCallback>>,
}

/// Removes the waiter on cancellation or post failure. Resolution already
/// removed the entry, so the drop is a no-op on the happy path.
struct WaiterGuard<'a> {
    handler: &'a SessionHandler,
    request_id: &'a str,
}

impl Drop for WaiterGuard<'_> {
    fn drop(&mut self) {
        lock(&self.handler.waiters).remove(self.request_id);
    }
}

impl SessionHandler {
    #[must_use]
    pub fn new(auth: Arc<AuthStore>, http: HttpClient) -> Self {
        Self {
            auth,
            http,
            waiters: Mutex::new(HashMap::new()),
            ack_queue: Mutex::new(HashSet::new()),
            ack_ticker: Mutex::new(None),
            on_slow: Mutex::new(None),
        }
    }

    /// Install the callback invoked when a request turns slow (5 s without
    /// a response). It never fails the request; it only notifies upstream.
    pub fn set_slow_callback(&self, callback: impl Fn() + Send + Sync + 'static) {
        *lock(&self.on_slow) = Some(Arc::new(callback));
    }

    fn build_envelope(
        &self,
        action: ActionType,
        payload: Option<Vec<u8>>,
        opts: &SendOptions,
    ) -> (OutgoingRpcMessage, String) {
        let state = self.auth.snapshot();
        let request_id = opts
            .custom_request_id
            .clone()
            .unwrap_or_else(|| Uuid::new_v4().to_string())
            .to_lowercase();

        let mut data = RpcMessageData {
            request_id: request_id.clone(),
            action: action as i32,
            session_id: state.session_id.clone(),
            ..Default::default()
        };
        if let Some(payload) = payload {
            if opts.dont_encrypt {
                data.unencrypted_proto_data = payload;
            } else {
                data.encrypted_proto_data = state.request_crypto.encrypt(&payload);
            }
        }

        let message_type = opts
            .message_type
            .unwrap_or_else(|| message_type_for_action(action));
        let envelope = OutgoingRpcMessage {
            mobile: state.mobile.clone(),
            data: Some(OutgoingRpcData {
                request_id: request_id.clone(),
                bugle_route: BugleRoute::DataEvent as i32,
                message_data: data.encode_to_vec(),
                message_type: message_type as i32,
            }),
            auth: Some(OutgoingRpcAuth {
                request_id: request_id.clone(),
                tachyon_auth_token: state.tachyon_token.clone(),
                config_version: Some(config_version()),
            }),
            ttl_micros: if opts.omit_ttl {
                0
            } else {
                state.effective_ttl().as_micros() as i64
            },
            dest_registration_ids: state.dest_reg_id.clone().into_iter().collect(),
            pairing_attempt_id: if action.is_gaia_pairing() {
                state.pairing_id.clone().unwrap_or_default()
            } else {
                String::new()
            },
        };
        (envelope, request_id)
    }

    fn send_url(&self) -> String {
        messaging_url("SendMessage", self.auth.should_use_google_host())
    }

    /// Issue an RPC without waiting for its stream-borne response.
    ///
    /// # Errors
    ///
    /// Returns a [`RequestError`] when the POST itself fails.
    pub async fn send_no_wait(
        &self,
        action: ActionType,
        payload: Option<Vec<u8>>,
        opts: SendOptions,
    ) -> Result<(), RequestError> {
        let (envelope, request_id) = self.build_envelope(action, payload, &opts);
        debug!(%request_id, ?action, "sending RPC (no wait)");
        self.http
            .post_ignore_body(&self.send_url(), &envelope, WireFormat::Pblite)
            .await
    }

    /// Issue an RPC and wait for its response to arrive on the stream.
    ///
    /// Cancelling the returned future removes the waiter; any later
    /// arrival for its id is dropped.
    ///
    /// # Errors
    ///
    /// Returns a [`RequestError`] when the POST fails or the waiter is
    /// torn down before a response arrives.
    pub async fn send(
        &self,
        action: ActionType,
        payload: Option<Vec<u8>>,
        opts: SendOptions,
    ) -> Result<IncomingPayload, RequestError> {
        let (envelope, request_id) = self.build_envelope(action, payload, &opts);
        debug!(%request_id, ?action, "sending RPC");

        let (tx, mut rx) = oneshot::channel();
        lock(&self.waiters).insert(request_id.clone(), tx);
        let _guard = WaiterGuard {
            handler: self,
            request_id: &request_id,
        };

        self.http
            .post_ignore_body(&self.send_url(), &envelope, WireFormat::Pblite)
            .await?;

        let slow = tokio::time::sleep(SLOW_REQUEST_AFTER);
        tokio::pin!(slow);
        let response = tokio::select! {
            response = &mut rx => response,
            () = &mut slow => {
                let callback = lock(&self.on_slow).clone();
                if let Some(callback) = callback {
                    debug!(%request_id, "request is slow");
                    callback();
                }
                (&mut rx).await
            }
        };
        response.map_err(|_| RequestError::Cancelled)
    }

    /// Deliver a stream-borne response to its waiter.
    ///
    /// The key is the incoming envelope's `session_id`. Returns the
    /// payload back when no waiter matched so the caller can classify it
    /// as unsolicited.
    pub(crate) fn resolve(
        &self,
        key: &str,
        payload: IncomingPayload,
    ) -> Result<(), IncomingPayload> {
        match lock(&self.waiters).remove(key) {
            Some(tx) => {
                if tx.send(payload).is_err() {
                    // Waiter cancelled after the envelope arrived; drop it.
                    debug!(%key, "waiter gone, dropping response");
                }
                Ok(())
            }
            None => Err(payload),
        }
    }

    /// Queue an incoming envelope id for the next ack batch.
    pub(crate) fn queue_ack(&self, response_id: String) {
        if !response_id.is_empty() {
            lock(&self.ack_queue).insert(response_id);
        }
    }

    /// Flush the queued ids as one ack RPC.
    ///
    /// Failed batches (and batches attempted without a token or browser
    /// identity) are re-queued; the next flush retries the union of the
    /// failed batch and anything queued since.
    pub async fn flush_acks(&self) {
        let batch: Vec<String> = {
            let mut queue = lock(&self.ack_queue);
            queue.drain().collect()
        };
        if batch.is_empty() {
            return;
        }

        let state = self.auth.snapshot();
        if !state.is_logged_in() {
            debug!(count = batch.len(), "ack flush deferred: not logged in");
            lock(&self.ack_queue).extend(batch);
            return;
        }

        let request = AckMessageRequest {
            auth: Some(AuthMessage {
                request_id: Uuid::new_v4().to_string(),
                network: state.auth_network().to_owned(),
                tachyon_auth_token: state.tachyon_token.clone(),
                config_version: Some(config_version()),
            }),
            acks: batch
                .iter()
                .map(|id| AckMessageEntry {
                    request_id: id.clone(),
                    device: state.mobile.clone(),
                })
                .collect(),
        };
        let url = messaging_url("AckMessages", state.should_use_google_host());
        match self
            .http
            .post_ignore_body(&url, &request, WireFormat::Pblite)
            .await
        {
            Ok(()) => debug!(count = batch.len(), "acked incoming messages"),
            Err(error) => {
                warn!(%error, "ack batch failed, re-queueing");
                lock(&self.ack_queue).extend(batch);
            }
        }
    }

    /// Start the background ack ticker (5 s period). Idempotent.
    pub fn start_ack_ticker(self: Arc<Self>) {
        let mut slot = lock(&self.ack_ticker);
        if slot.is_some() {
            return;
        }
        let handler = Arc::clone(&self);
        *slot = Some(tokio::spawn(async move {
            let mut ticker = tokio::time::interval(ACK_FLUSH_INTERVAL);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                handler.flush_acks().await;
            }
        }));
    }

    /// Stop the ack ticker, optionally flushing once.
    pub async fn stop_ack_ticker(&self, flush: bool) {
        if let Some(handle) = lock(&self.ack_ticker).take() {
            handle.abort();
        }
        if flush {
            self.flush_acks().await;
        }
    }

    #[cfg(test)]
    pub(crate) fn pending_acks(&self) -> usize {
        lock(&self.ack_queue).len()
    }

    #[cfg(test)]
    pub(crate) fn pending_waiters(&self) -> usize {
        lock(&self.waiters).len()
    }

    #[cfg(test)]
    pub(crate) fn insert_waiter(&self, key: &str) -> oneshot::Receiver<IncomingPayload> {
        let (tx, rx) = oneshot::channel();
        lock(&self.waiters).insert(key.to_owned(), tx);
        rx
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::AuthState;
    use dittoweb_proto::authentication::{Device, TokenData};

    fn handler_with(state: AuthState) -> Arc<SessionHandler> {
        let auth = Arc::new(AuthStore::new(state));
        let http = HttpClient::new(Arc::clone(&auth), None).expect("client");
        Arc::new(SessionHandler::new(auth, http))
    }

    fn paired_state() -> AuthState {
        let mut state = AuthState::new();
        state.browser = Some(Device {
            user_id: 1,
            source_id: "browser".into(),
            network: String::new(),
        });
        state.mobile = Some(Device {
            user_id: 1,
            source_id: "phone".into(),
            network: String::new(),
        });
        state.apply_token(TokenData {
            tachyon_auth_token: b"tok".to_vec(),
            ttl_micros: 0,
        });
        state
    }

    fn incoming(session_id: &str) -> IncomingPayload {
        IncomingPayload {
            envelope: IncomingRpcMessage {
                session_id: session_id.into(),
                ..Default::default()
            },
            data: RpcMessageData::default(),
            decrypted: None,
        }
    }

    #[test]
    fn envelope_carries_session_and_encrypted_payload() {
        let handler = handler_with(paired_state());
        let (envelope, request_id) =
            handler.build_envelope(ActionType::ListConversations, Some(vec![1, 2, 3]), &SendOptions::default());

        assert_eq!(request_id, request_id.to_lowercase());
        let data = envelope.data.expect("data");
        assert_eq!(data.bugle_route, BugleRoute::DataEvent as i32);
        assert_eq!(data.message_type, MessageType::BugleAnnotation as i32);

        let inner = RpcMessageData::decode(data.message_data.as_slice()).expect("inner");
        assert!(!inner.encrypted_proto_data.is_empty());
        assert!(inner.unencrypted_proto_data.is_empty());
        assert!(!inner.session_id.is_empty());
        assert!(envelope.ttl_micros > 0);
    }

    #[test]
    fn omit_ttl_suppresses_the_field() {
        let handler = handler_with(paired_state());
        let opts = SendOptions {
            omit_ttl: true,
            ..Default::default()
        };
        let (envelope, _) = handler.build_envelope(ActionType::GetUpdates, None, &opts);
        assert_eq!(envelope.ttl_micros, 0);
    }

    #[test]
    fn custom_request_id_is_honored_lowercased() {
        let handler = handler_with(paired_state());
        let opts = SendOptions {
            custom_request_id: Some("ABC-DEF".into()),
            ..Default::default()
        };
        let (_, request_id) = handler.build_envelope(ActionType::GetUpdates, None, &opts);
        assert_eq!(request_id, "abc-def");
    }

    #[test]
    fn dont_encrypt_uses_the_unencrypted_field() {
        let handler = handler_with(paired_state());
        let opts = SendOptions {
            dont_encrypt: true,
            ..Default::default()
        };
        let (envelope, _) =
            handler.build_envelope(ActionType::GetUpdates, Some(vec![9, 9]), &opts);
        let inner =
            RpcMessageData::decode(envelope.data.expect("data").message_data.as_slice())
                .expect("inner");
        assert_eq!(inner.unencrypted_proto_data, vec![9, 9]);
        assert!(inner.encrypted_proto_data.is_empty());
    }

    #[test]
    fn pairing_attempt_id_only_for_gaia_pairing_actions() {
        let mut state = paired_state();
        state.pairing_id = Some("attempt-1".into());
        let handler = handler_with(state);

        let (plain, _) =
            handler.build_envelope(ActionType::GetUpdates, None, &SendOptions::default());
        assert!(plain.pairing_attempt_id.is_empty());

        let (pairing, _) = handler.build_envelope(
            ActionType::CreateGaiaPairingClientInit,
            None,
            &SendOptions::default(),
        );
        assert_eq!(pairing.pairing_attempt_id, "attempt-1");
    }

    #[test]
    fn gaia_message_types_follow_the_observed_rules() {
        assert_eq!(
            message_type_for_action(ActionType::CreateGaiaPairingClientInit),
            MessageType::Gaia2
        );
        assert_eq!(
            message_type_for_action(ActionType::CreateGaiaPairingClientFinished),
            MessageType::BugleMessage
        );
        assert_eq!(
            message_type_for_action(ActionType::ListConversations),
            MessageType::BugleAnnotation
        );
        assert_eq!(
            message_type_for_action(ActionType::SendMessage),
            MessageType::BugleMessage
        );
    }

    #[tokio::test]
    async fn resolve_matches_exactly_one_waiter() {
        let handler = handler_with(paired_state());
        let (tx, rx) = oneshot::channel();
        lock(&handler.waiters).insert("sess-1".into(), tx);

        assert!(handler.resolve("sess-1", incoming("sess-1")).is_ok());
        assert_eq!(handler.pending_waiters(), 0);
        let delivered = rx.await.expect("delivered");
        assert_eq!(delivered.envelope.session_id, "sess-1");

        // A second arrival for the same key is unmatched.
        assert!(handler.resolve("sess-1", incoming("sess-1")).is_err());
    }

    #[test]
    fn unmatched_payload_is_returned_for_classification() {
        let handler = handler_with(paired_state());
        let unmatched = handler.resolve("nobody", incoming("nobody"));
        assert!(unmatched.is_err());
    }

    #[tokio::test]
    async fn ack_flush_without_login_requeues_the_union() {
        let handler = handler_with(AuthState::new());
        handler.queue_ack("a".into());
        handler.flush_acks().await;
        assert_eq!(handler.pending_acks(), 1);

        handler.queue_ack("b".into());
        handler.flush_acks().await;
        assert_eq!(handler.pending_acks(), 2);
    }

    #[test]
    fn empty_response_ids_are_not_queued() {
        let handler = handler_with(paired_state());
        handler.queue_ack(String::new());
        assert_eq!(handler.pending_acks(), 0);
    }
}
