//! Incoming envelope routing.
//!
//! Envelopes are routed by their bugle route: pair events mutate the auth
//! state and fire the pairing callback, data events either resolve an RPC
//! waiter or surface as unsolicited updates, and gaia events are ignored.

use std::sync::atomic::Ordering;

use prost::Message as _;
use tracing::{debug, info, warn};

use dittoweb_crypto::sha256;
use dittoweb_proto::authentication::PairEventData;
use dittoweb_proto::events::UpdateEvents;
use dittoweb_proto::rpc::{ActionType, BugleRoute, IncomingRpcMessage, RpcMessageData};

use crate::events::Event;
use crate::lock;
use crate::longpoll::LongPoll;
use crate::rpc::IncomingPayload;

/// Payload the server emits when the Google account signed out; treated
/// as a logged-out signal as observed on the wire.
const LOGGED_OUT_SENTINEL: [u8; 2] = [0x72, 0x00];

impl LongPoll {
    pub(crate) async fn handle_incoming(&self, envelope: IncomingRpcMessage) {
        match envelope.bugle_route() {
            BugleRoute::PairEvent => self.handle_pair_event(&envelope),
            BugleRoute::GaiaEvent => debug!("ignoring gaia-route envelope"),
            BugleRoute::DataEvent => self.handle_data_event(envelope).await,
            BugleRoute::UnknownBugleRoute => {
                warn!(route = envelope.bugle_route, "unknown bugle route");
            }
        }
    }

    fn handle_pair_event(&self, envelope: &IncomingRpcMessage) {
        let event = match PairEventData::decode(envelope.message_data.as_slice()) {
            Ok(event) => event,
            Err(error) => {
                warn!(%error, "undecodable pair event");
                return;
            }
        };

        if let Some(paired) = event.paired {
            info!("pairing completed");
            self.auth.update(|state| {
                if let Some(token) = paired.token_data.clone() {
                    state.apply_token(token);
                }
                state.mobile.clone_from(&paired.mobile);
                state.browser.clone_from(&paired.browser);
            });
            let phone_id = paired
                .mobile
                .as_ref()
                .map(|device| device.source_id.clone())
                .unwrap_or_default();
            self.events.on_event(Event::PairSuccessful {
                phone_id,
                data: paired.clone(),
            });
            if let Some(callback) = lock(&self.on_pair).clone() {
                callback(paired);
            }
        } else if event.revoked.is_some() {
            info!("pairing revoked by the phone");
            self.events.on_event(Event::GaiaLoggedOut);
        }
    }

    async fn handle_data_event(&self, envelope: IncomingRpcMessage) {
        self.session.queue_ack(envelope.response_id.clone());

        let data = match RpcMessageData::decode(envelope.message_data.as_slice()) {
            Ok(data) => data,
            Err(error) => {
                warn!(%error, "undecodable data envelope");
                return;
            }
        };

        let decrypted = if !data.encrypted_proto_data.is_empty() {
            match self
                .auth
                .read(|state| state.request_crypto.decrypt(&data.encrypted_proto_data))
            {
                Ok(plain) => Some(plain),
                Err(error) => {
                    warn!(%error, "failed to decrypt payload");
                    return;
                }
            }
        } else if !data.encrypted_proto_data2.is_empty() {
            let plain = match self
                .auth
                .read(|state| state.request_crypto.decrypt(&data.encrypted_proto_data2))
            {
                Ok(plain) => plain,
                Err(error) => {
                    warn!(%error, "failed to decrypt payload");
                    return;
                }
            };
            // Second-generation payloads that carry an @-account change are
            // surfaced as a synthesized account-change and go no further.
            if let Ok(updates) = UpdateEvents::decode(plain.as_slice()) {
                if let Some(change) = updates.account_change {
                    if change.account.contains('@') {
                        self.events.on_event(Event::AccountChange {
                            event: change,
                            is_fake: true,
                        });
                        return;
                    }
                }
            }
            Some(plain)
        } else {
            None
        };

        let payload = IncomingPayload {
            envelope,
            data,
            decrypted,
        };

        // The Google host may emit phantom data before the real response:
        // not a Gaia pairing action, and only the unencrypted field set.
        // Those never resolve waiters.
        let phantom = self.auth.should_use_google_host()
            && !payload.data.action().is_gaia_pairing()
            && payload.decrypted.is_none()
            && !payload.data.unencrypted_proto_data.is_empty();

        let payload = if phantom {
            debug!(
                session_id = %payload.envelope.session_id,
                "phantom data envelope"
            );
            payload
        } else {
            let key = payload.envelope.session_id.clone();
            match self.session.resolve(&key, payload) {
                Ok(()) => {
                    self.recv_check.bump();
                    return;
                }
                Err(unmatched) => unmatched,
            }
        };

        let is_old = self.consume_skip();
        if !is_old {
            self.recv_check.bump();
        }

        if payload.data.action() == ActionType::GetUpdates {
            self.handle_updates(&payload, is_old);
        } else if payload.decrypted.is_none()
            && payload.data.unencrypted_proto_data == LOGGED_OUT_SENTINEL
        {
            info!("logged-out sentinel received");
            self.events.on_event(Event::GaiaLoggedOut);
        }
    }

    /// Consume one backlog slot; true while the server-reported backlog
    /// is still draining.
    fn consume_skip(&self) -> bool {
        loop {
            let current = self.skip_count.load(Ordering::SeqCst);
            if current <= 0 {
                return false;
            }
            if self
                .skip_count
                .compare_exchange(current, current - 1, Ordering::SeqCst, Ordering::SeqCst)
                .is_ok()
            {
                return true;
            }
        }
    }

    fn handle_updates(&self, payload: &IncomingPayload, is_old: bool) {
        let bytes = payload.payload_bytes();
        let updates = match UpdateEvents::decode(bytes) {
            Ok(updates) => updates,
            Err(error) => {
                warn!(%error, "undecodable update payload");
                return;
            }
        };
        let hash = sha256(bytes);

        if let Some(event) = updates.conversation_event {
            {
                let mut dedup = lock(&self.dedup);
                for conversation in &event.data {
                    if !dedup.check(&conversation.conversation_id, hash) {
                        debug!("duplicate conversation batch dropped");
                        return;
                    }
                }
            }
            if !is_old {
                for conversation in event.data {
                    self.events.on_event(Event::Conversation { conversation });
                }
            }
        }

        if let Some(event) = updates.message_event {
            {
                let mut dedup = lock(&self.dedup);
                for message in &event.data {
                    if !dedup.check(&message.message_id, hash) {
                        debug!("duplicate message batch dropped");
                        return;
                    }
                }
            }
            for message in event.data {
                self.events.on_event(Event::Message { message, is_old });
            }
        }

        // Typing and account changes are never deduped; typing is
        // suppressed entirely for backlog replays.
        if let Some(event) = updates.typing_event {
            if !is_old {
                if let Some(data) = event.data {
                    self.events.on_event(Event::Typing { data });
                }
            }
        }

        if let Some(alert) = updates.user_alert_event {
            if !is_old {
                self.events.on_event(Event::UserAlert { alert });
            }
        }

        if let Some(event) = updates.settings_event {
            if let Some(settings) = event.data {
                self.events.on_event(Event::Settings { settings });
            }
        }

        if let Some(change) = updates.account_change {
            self.events.on_event(Event::AccountChange {
                event: change,
                is_fake: false,
            });
        }

        // Browser presence checks need no client action.
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use prost::Message as _;
    use uuid::Uuid;

    use dittoweb_pblite::to_value;
    use dittoweb_proto::authentication::{Device, PairEventData, PairedData, TokenData};
    use dittoweb_proto::conversations::{Conversation, Message};
    use dittoweb_proto::events::{
        AccountChangeEvent, ConversationEvent, MessageEvent, UpdateEvents,
    };
    use dittoweb_proto::rpc::{LongPollingPayload, StreamAck};

    use super::*;
    use crate::auth::{AuthState, AuthStore};
    use crate::events::{Event, EventHandler};
    use crate::http::HttpClient;
    use crate::rpc::SessionHandler;

    #[derive(Default)]
    struct Recorder(Mutex<Vec<Event>>);

    impl EventHandler for Recorder {
        fn on_event(&self, event: Event) {
            self.0.lock().expect("recorder lock").push(event);
        }
    }

    impl Recorder {
        fn events(&self) -> Vec<Event> {
            self.0.lock().expect("recorder lock").clone()
        }
    }

    struct Fixture {
        engine: Arc<LongPoll>,
        recorder: Arc<Recorder>,
        auth: Arc<AuthStore>,
        session: Arc<SessionHandler>,
    }

    fn fixture() -> Fixture {
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

        let auth = Arc::new(AuthStore::new(state));
        let http = HttpClient::new(Arc::clone(&auth), None).expect("client");
        let session = Arc::new(SessionHandler::new(Arc::clone(&auth), http.clone()));
        let recorder = Arc::new(Recorder::default());
        let engine = LongPoll::new(
            Arc::clone(&auth),
            http,
            Arc::clone(&session),
            recorder.clone(),
            true,
        );
        Fixture {
            engine,
            recorder,
            auth,
            session,
        }
    }

    fn data_envelope(session_id: &str, data: &RpcMessageData) -> IncomingRpcMessage {
        IncomingRpcMessage {
            response_id: Uuid::new_v4().to_string(),
            bugle_route: BugleRoute::DataEvent as i32,
            session_id: session_id.into(),
            message_data: data.encode_to_vec(),
            ..Default::default()
        }
    }

    fn updates_envelope(updates: &UpdateEvents) -> IncomingRpcMessage {
        data_envelope(
            "",
            &RpcMessageData {
                action: ActionType::GetUpdates as i32,
                unencrypted_proto_data: updates.encode_to_vec(),
                ..Default::default()
            },
        )
    }

    fn message_update(id: &str) -> UpdateEvents {
        UpdateEvents {
            message_event: Some(MessageEvent {
                data: vec![Message {
                    message_id: id.into(),
                    conversation_id: "conv-1".into(),
                    ..Default::default()
                }],
            }),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn backlog_skip_marks_leading_messages_old() {
        let fx = fixture();

        let ack = to_value(&LongPollingPayload {
            ack: Some(StreamAck { count: 3 }),
            ..Default::default()
        });
        fx.engine.handle_element(&ack).await;
        assert_eq!(fx.engine.skip_count(), 3);

        for i in 0..5 {
            let value = to_value(&LongPollingPayload {
                data: Some(updates_envelope(&message_update(&format!("msg-{i}")))),
                ..Default::default()
            });
            fx.engine.handle_element(&value).await;
        }

        let flags: Vec<bool> = fx
            .recorder
            .events()
            .iter()
            .filter_map(|event| match event {
                Event::Message { is_old, .. } => Some(*is_old),
                _ => None,
            })
            .collect();
        assert_eq!(flags, vec![true, true, true, false, false]);
        assert_eq!(fx.engine.payload_count(), 6);
        assert!(fx.engine.received_data());
    }

    #[tokio::test]
    async fn phantom_data_does_not_resolve_a_waiter() {
        let fx = fixture();
        assert!(fx.auth.should_use_google_host());
        let mut rx = fx.session.insert_waiter("sess-1");

        let phantom = data_envelope(
            "sess-1",
            &RpcMessageData {
                action: ActionType::SendMessage as i32,
                unencrypted_proto_data: vec![1, 2, 3],
                session_id: "sess-1".into(),
                ..Default::default()
            },
        );
        fx.engine.handle_incoming(phantom).await;
        assert_eq!(fx.session.pending_waiters(), 1);
        assert!(rx.try_recv().is_err());

        // The real (encrypted) response still resolves the waiter.
        let encrypted = fx
            .auth
            .read(|state| state.request_crypto.encrypt(&[4, 5]));
        let real = data_envelope(
            "sess-1",
            &RpcMessageData {
                action: ActionType::SendMessage as i32,
                encrypted_proto_data: encrypted,
                session_id: "sess-1".into(),
                ..Default::default()
            },
        );
        fx.engine.handle_incoming(real).await;
        let payload = rx.await.expect("resolved");
        assert_eq!(payload.payload_bytes(), &[4, 5]);
    }

    #[tokio::test]
    async fn gaia_pairing_actions_bypass_the_phantom_filter() {
        let fx = fixture();
        let mut rx = fx.session.insert_waiter("sess-2");

        let envelope = data_envelope(
            "sess-2",
            &RpcMessageData {
                action: ActionType::CreateGaiaPairingClientInit as i32,
                unencrypted_proto_data: vec![7],
                session_id: "sess-2".into(),
                ..Default::default()
            },
        );
        fx.engine.handle_incoming(envelope).await;
        assert!(rx.try_recv().is_ok());
    }

    #[tokio::test]
    async fn logged_out_sentinel_emits_the_event() {
        let fx = fixture();
        let envelope = data_envelope(
            "",
            &RpcMessageData {
                action: ActionType::SendMessage as i32,
                unencrypted_proto_data: vec![0x72, 0x00],
                ..Default::default()
            },
        );
        fx.engine.handle_incoming(envelope).await;
        assert!(matches!(
            fx.recorder.events().as_slice(),
            [Event::GaiaLoggedOut]
        ));
    }

    #[tokio::test]
    async fn account_change_hack_synthesizes_a_fake_event() {
        let fx = fixture();
        let updates = UpdateEvents {
            account_change: Some(AccountChangeEvent {
                account: "someone@gmail.com".into(),
                enabled: true,
            }),
            ..Default::default()
        };
        let encrypted = fx
            .auth
            .read(|state| state.request_crypto.encrypt(&updates.encode_to_vec()));
        let envelope = data_envelope(
            "",
            &RpcMessageData {
                action: ActionType::GetUpdates as i32,
                encrypted_proto_data2: encrypted,
                ..Default::default()
            },
        );
        fx.engine.handle_incoming(envelope).await;

        let events = fx.recorder.events();
        assert_eq!(events.len(), 1);
        assert!(matches!(
            &events[0],
            Event::AccountChange { is_fake: true, event }
                if event.account == "someone@gmail.com"
        ));
    }

    #[tokio::test]
    async fn replayed_update_batches_are_deduped() {
        let fx = fixture();
        let envelope = updates_envelope(&message_update("dup-1"));
        fx.engine.handle_incoming(envelope.clone()).await;
        fx.engine.handle_incoming(envelope).await;

        let message_events = fx
            .recorder
            .events()
            .iter()
            .filter(|event| matches!(event, Event::Message { .. }))
            .count();
        assert_eq!(message_events, 1);
    }

    #[tokio::test]
    async fn conversations_are_suppressed_for_backlog_replays() {
        let fx = fixture();
        let ack = to_value(&LongPollingPayload {
            ack: Some(StreamAck { count: 1 }),
            ..Default::default()
        });
        fx.engine.handle_element(&ack).await;

        let updates = UpdateEvents {
            conversation_event: Some(ConversationEvent {
                data: vec![Conversation {
                    conversation_id: "conv-9".into(),
                    ..Default::default()
                }],
            }),
            ..Default::default()
        };
        fx.engine.handle_incoming(updates_envelope(&updates)).await;
        assert!(fx.recorder.events().is_empty());

        // The same conversation arriving fresh (different payload) emits.
        let mut fresh = updates;
        if let Some(event) = fresh.conversation_event.as_mut() {
            event.data[0].name = "renamed".into();
        }
        fx.engine.handle_incoming(updates_envelope(&fresh)).await;
        assert!(matches!(
            fx.recorder.events().as_slice(),
            [Event::Conversation { .. }]
        ));
    }

    #[tokio::test]
    async fn pair_event_updates_auth_and_emits() {
        let fx = fixture();
        let paired = PairEventData {
            paired: Some(PairedData {
                mobile: Some(Device {
                    user_id: 9,
                    source_id: "new-phone".into(),
                    network: String::new(),
                }),
                browser: Some(Device {
                    user_id: 9,
                    source_id: "new-browser".into(),
                    network: String::new(),
                }),
                token_data: Some(TokenData {
                    tachyon_auth_token: b"fresh".to_vec(),
                    ttl_micros: 1_000_000,
                }),
            }),
            revoked: None,
        };
        let envelope = IncomingRpcMessage {
            bugle_route: BugleRoute::PairEvent as i32,
            message_data: paired.encode_to_vec(),
            ..Default::default()
        };
        fx.engine.handle_incoming(envelope).await;

        assert!(matches!(
            fx.recorder.events().as_slice(),
            [Event::PairSuccessful { phone_id, .. }] if phone_id == "new-phone"
        ));
        fx.auth.read(|state| {
            assert_eq!(state.tachyon_token, b"fresh");
            assert_eq!(
                state.mobile.as_ref().map(|d| d.source_id.as_str()),
                Some("new-phone")
            );
        });
    }

    #[tokio::test]
    async fn incoming_data_envelopes_queue_acks() {
        let fx = fixture();
        fx.engine
            .handle_incoming(updates_envelope(&message_update("ack-check")))
            .await;
        assert_eq!(fx.session.pending_acks(), 1);
    }
}
