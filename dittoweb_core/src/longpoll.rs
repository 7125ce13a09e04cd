//! Long-poll engine: the restartable poll loop and its stream reader.
//!
//! Opens the receive stream, parses the `[[...]]` framing, and routes
//! each long-polling payload. Incoming envelope dispatch lives in
//! [`crate::dispatch`]; the pinger in [`crate::pinger`].
//!
//! The reader is self-healing: every caught error increments a counter,
//! emits a temporary-error event, and retries after a linear backoff
//! capped at 60 seconds. Recovery emits `ListenRecovered`.

use std::sync::atomic::{AtomicBool, AtomicI64, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use futures::StreamExt;
use serde_json::Value;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use uuid::Uuid;

use dittoweb_pblite::{from_value, WireFormat};
use dittoweb_proto::authentication::{
    AuthMessage, RegisterRefreshRequest, RegisterRefreshResponse, WebPushParams,
};
use dittoweb_proto::rpc::{LongPollingPayload, ReceiveMessagesRequest};

use crate::auth::AuthStore;
use crate::consts::{config_version, messaging_url, registration_url};
use crate::dedup::DedupRing;
use crate::error::{ClientError, RequestError};
use crate::events::{Event, EventSink};
use crate::framing::Framer;
use crate::http::HttpClient;
use crate::lock;
use crate::pinger::{Pinger, ReceiveCheck};
use crate::rpc::SessionHandler;

/// Callback invoked once per [`LongPoll::start`] on the first stream open.
pub type FirstConnectCallback = Box<dyn FnOnce() + Send>;

/// Callback invoked when a pair event completes.
pub(crate) type PairCallback =
    Arc<dyn Fn(dittoweb_proto::authentication::PairedData) + Send + Sync>;

#[derive(Default)]
struct Tasks {
    stream: Option<JoinHandle<()>>,
    pinger: Option<JoinHandle<()>>,
}

/// The restartable long-poll engine.
pub struct LongPoll {
    pub(crate) auth: Arc<AuthStore>,
    pub(crate) http: HttpClient,
    pub(crate) session: Arc<SessionHandler>,
    pub(crate) events: EventSink,
    pub(crate) pinger: Arc<Pinger>,
    pub(crate) recv_check: Arc<ReceiveCheck>,
    pub(crate) dedup: Mutex<DedupRing>,

    connected: AtomicBool,
    pub(crate) skip_count: AtomicI64,
    payload_count: AtomicU64,
    received_data: AtomicBool,
    had_first_connect: AtomicBool,
    first_connect_tx: watch::Sender<bool>,
    on_first_connect: Mutex<Option<FirstConnectCallback>>,
    pub(crate) on_pair: Mutex<Option<PairCallback>>,
    tasks: Mutex<Tasks>,
}

impl LongPoll {
    pub fn new(
        auth: Arc<AuthStore>,
        http: HttpClient,
        session: Arc<SessionHandler>,
        events: EventSink,
        send_not_responding: bool,
    ) -> Arc<Self> {
        let recv_check = Arc::new(ReceiveCheck::new());
        let pinger = Arc::new(Pinger::new(
            Arc::clone(&auth),
            Arc::clone(&session),
            Arc::clone(&events),
            Arc::clone(&recv_check),
            send_not_responding,
        ));
        let (first_connect_tx, _) = watch::channel(false);
        Arc::new(Self {
            auth,
            http,
            session,
            events,
            pinger,
            recv_check,
            dedup: Mutex::new(DedupRing::new()),
            connected: AtomicBool::new(false),
            skip_count: AtomicI64::new(0),
            payload_count: AtomicU64::new(0),
            received_data: AtomicBool::new(false),
            had_first_connect: AtomicBool::new(false),
            first_connect_tx,
            on_first_connect: Mutex::new(None),
            on_pair: Mutex::new(None),
            tasks: Mutex::new(Tasks::default()),
        })
    }

    /// Install the on-paired callback.
    pub(crate) fn set_on_pair(&self, callback: PairCallback) {
        *lock(&self.on_pair) = Some(callback);
    }

    /// Whether the engine is up.
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    /// Remaining backlog entries the server reported.
    #[must_use]
    pub fn skip_count(&self) -> i64 {
        self.skip_count.load(Ordering::SeqCst)
    }

    /// Number of stream payloads parsed since [`LongPoll::start`].
    #[must_use]
    pub fn payload_count(&self) -> u64 {
        self.payload_count.load(Ordering::SeqCst)
    }

    /// Whether any data payload arrived since [`LongPoll::start`].
    #[must_use]
    pub fn received_data(&self) -> bool {
        self.received_data.load(Ordering::SeqCst)
    }

    /// Handle to the pinger, for pulses and short-circuits.
    pub(crate) fn pinger(&self) -> &Arc<Pinger> {
        &self.pinger
    }

    /// Schedule an early data-receive check.
    pub(crate) fn schedule_early_receive_check(&self) {
        self.recv_check.schedule_early();
    }

    /// Start the poll and pinger loops. Idempotent while connected.
    pub fn start(self: Arc<Self>, on_first_connect: Option<FirstConnectCallback>) {
        if self.connected.swap(true, Ordering::SeqCst) {
            return;
        }
        self.skip_count.store(0, Ordering::SeqCst);
        self.payload_count.store(0, Ordering::SeqCst);
        self.received_data.store(false, Ordering::SeqCst);
        self.had_first_connect.store(false, Ordering::SeqCst);
        *lock(&self.on_first_connect) = on_first_connect;
        let _ = self.first_connect_tx.send_replace(false);

        let mut tasks = lock(&self.tasks);
        let poller = Arc::clone(&self);
        tasks.stream = Some(tokio::spawn(async move { poller.poll_loop().await }));
        let pinger = Arc::clone(&self.pinger);
        tasks.pinger = Some(tokio::spawn(async move { pinger.run().await }));
        info!("long-poll engine started");
    }

    /// Stop both loops.
    pub fn stop(&self) {
        if !self.connected.swap(false, Ordering::SeqCst) {
            return;
        }
        let mut tasks = lock(&self.tasks);
        if let Some(handle) = tasks.stream.take() {
            handle.abort();
        }
        if let Some(handle) = tasks.pinger.take() {
            handle.abort();
        }
        let _ = self.first_connect_tx.send_replace(false);
        info!("long-poll engine stopped");
    }

    /// Wait until the stream has opened once, bounded by `timeout`.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::ConnectTimeout`] when the window passes
    /// without an open.
    pub async fn wait_first_connect(&self, timeout: Duration) -> Result<(), ClientError> {
        let mut rx = self.first_connect_tx.subscribe();
        tokio::time::timeout(timeout, rx.wait_for(|open| *open))
            .await
            .map_err(|_| ClientError::ConnectTimeout)?
            .map_err(|_| ClientError::ConnectTimeout)?;
        Ok(())
    }

    fn backoff(errors: u32) -> Duration {
        Duration::from_secs(u64::from(5 * errors).min(60))
    }

    async fn poll_loop(self: Arc<Self>) {
        let listen_request_id = Uuid::new_v4().to_string();
        let mut errors: u32 = 0;

        while self.is_connected() {
            if let Err(error) = self.refresh_token_if_needed().await {
                errors += 1;
                warn!(%error, errors, "token refresh failed");
                self.events.on_event(Event::ListenTemporaryError {
                    error: error.to_string(),
                });
                tokio::time::sleep(Self::backoff(errors)).await;
                continue;
            }

            let state = self.auth.snapshot();
            let url = messaging_url("ReceiveMessages", state.should_use_google_host());
            let request = ReceiveMessagesRequest {
                auth: Some(AuthMessage {
                    request_id: listen_request_id.clone(),
                    network: state.auth_network().to_owned(),
                    tachyon_auth_token: state.tachyon_token.clone(),
                    config_version: Some(config_version()),
                }),
            };
            debug!(%url, "opening receive stream");
            let response = match self.http.open_stream(&url, &request).await {
                Ok(response) => response,
                Err(error) => {
                    if !self.is_connected() {
                        break;
                    }
                    if let RequestError::Status { status: 401 | 403, .. } = error {
                        warn!(%error, "stream open rejected, giving up");
                        self.events.on_event(Event::ListenFatalError {
                            error: error.to_string(),
                        });
                        self.connected.store(false, Ordering::SeqCst);
                        break;
                    }
                    errors += 1;
                    warn!(%error, errors, "stream open failed");
                    self.events.on_event(Event::ListenTemporaryError {
                        error: error.to_string(),
                    });
                    tokio::time::sleep(Self::backoff(errors)).await;
                    continue;
                }
            };

            let _ = self.first_connect_tx.send_replace(true);
            if errors > 0 {
                info!("receive stream recovered");
                self.events.on_event(Event::ListenRecovered);
                errors = 0;
            }
            if !self.had_first_connect.swap(true, Ordering::SeqCst) {
                if let Some(callback) = lock(&self.on_first_connect).take() {
                    callback();
                }
            }
            if self
                .auth
                .read(|s| s.is_logged_in() && s.should_use_google_host())
            {
                self.pinger.pulse();
            }

            match self.read_stream(response).await {
                Ok(clean) => debug!(clean, "receive stream ended"),
                Err(error) => {
                    if !self.is_connected() {
                        break;
                    }
                    errors += 1;
                    warn!(%error, errors, "receive stream error");
                    self.events.on_event(Event::ListenTemporaryError {
                        error: error.to_string(),
                    });
                    tokio::time::sleep(Self::backoff(errors)).await;
                }
            }
        }
        debug!("poll loop exited");
    }

    /// Read one stream attempt to completion.
    async fn read_stream(&self, response: reqwest::Response) -> Result<bool, RequestError> {
        let mut framer = Framer::new();
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            for value in framer.feed(&chunk)? {
                if !self.is_connected() {
                    return Ok(false);
                }
                self.handle_element(&value).await;
            }
            if framer.is_done() {
                break;
            }
        }
        Ok(framer.is_done())
    }

    /// Decode and route one stream element. Per-element decode errors are
    /// swallowed; the framer already cleared its buffer, so the stream
    /// stays synchronized.
    pub(crate) async fn handle_element(&self, value: &Value) {
        let payload: LongPollingPayload = match from_value(value) {
            Ok(payload) => payload,
            Err(error) => {
                warn!(%error, "undecodable stream element");
                return;
            }
        };
        self.payload_count.fetch_add(1, Ordering::SeqCst);

        if let Some(ack) = payload.ack {
            debug!(count = ack.count, "backlog ack");
            self.skip_count.store(ack.count.into(), Ordering::SeqCst);
        } else if let Some(envelope) = payload.data {
            self.received_data.store(true, Ordering::SeqCst);
            self.handle_incoming(envelope).await;
        }
        // startRead, heartbeat, and anything else: ignored.
    }

    /// Refresh the tachyon token when it is missing or expiring within an
    /// hour. Requires a browser identity; a silent no-op otherwise.
    pub(crate) async fn refresh_token_if_needed(&self) -> Result<(), RequestError> {
        let state = self.auth.snapshot();
        if state.browser.is_none() || !state.needs_token_refresh() {
            return Ok(());
        }

        let request_id = Uuid::new_v4().to_string();
        let timestamp_micros = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_micros() as i64;
        let signature = state
            .refresh_key
            .sign(format!("{request_id}:{timestamp_micros}").as_bytes());
        let request = RegisterRefreshRequest {
            request_id,
            timestamp_micros,
            tachyon_auth_token: state.tachyon_token.clone(),
            signature,
            push: state.push_keys.as_ref().map(|keys| WebPushParams {
                endpoint: keys.endpoint.clone(),
                p256dh: keys.p256dh.clone(),
                auth: keys.auth.clone(),
            }),
        };

        let url = registration_url("RegisterRefresh", state.should_use_google_host());
        let response: RegisterRefreshResponse =
            self.http.request(&url, &request, WireFormat::Pblite).await?;
        let Some(token) = response.token_data else {
            return Err(RequestError::InvalidResponse(
                "refresh response carried no token",
            ));
        };
        info!("tachyon token refreshed");
        self.auth.set_token(token);
        self.events.on_event(Event::AuthTokenRefreshed);
        Ok(())
    }
}
