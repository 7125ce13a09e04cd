//! The ditto pinger: probes the paired phone and reports unresponsive /
//! recovered transitions.
//!
//! Runs continuously while the engine is up, driven by two signals:
//!
//! - **pulse** — at-most-one buffered; extra pulses coalesce into a
//!   single pending bit.
//! - **short-circuit** — unbuffered; a signal wakes the current waiter
//!   and is otherwise dropped.
//!
//! Each ping races the RPC against a timer, a one-shot [`Resetter`]
//! barrier shared across the ping chain, and further short-circuit
//! signals. Timeouts enter a reping phase with an exponentially growing
//! ticker that issues sub-pings until the chain resolves.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use prost::Message as _;
use tokio::sync::Notify;
use tokio::time::Instant;
use tokio::task::{JoinError, JoinHandle};
use tracing::{debug, warn};

use dittoweb_proto::client::NotifyDittoActivityRequest;
use dittoweb_proto::rpc::ActionType;

use crate::auth::AuthStore;
use crate::consts::{
    DATA_RECEIVE_CHECK_INTERVAL, EARLY_DATA_RECEIVE_CHECK, PING_MIN_INTERVAL, PING_TIMEOUT,
    REPING_BASE, REPING_CAP, SHORT_CIRCUIT_PING_TIMEOUT,
};
use crate::error::RequestError;
use crate::events::{Event, EventSink};
use crate::lock;
use crate::rpc::{IncomingPayload, SendOptions, SessionHandler};

/// One-shot barrier shared across a ping chain. When the outermost ping
/// resolves, every sub-wait unblocks instead of hanging.
pub(crate) struct Resetter {
    done: AtomicBool,
    notify: Notify,
}

impl Resetter {
    fn new() -> Self {
        Self {
            done: AtomicBool::new(false),
            notify: Notify::new(),
        }
    }

    fn resolve(&self) {
        self.done.store(true, Ordering::SeqCst);
        self.notify.notify_waiters();
    }

    async fn wait(&self) {
        let notified = self.notify.notified();
        tokio::pin!(notified);
        if self.done.load(Ordering::SeqCst) {
            return;
        }
        notified.await;
    }
}

/// Tracks when data was last expected from the phone.
pub(crate) struct ReceiveCheck {
    next_check: Mutex<Instant>,
    last_check: Mutex<Instant>,
}

impl ReceiveCheck {
    pub(crate) fn new() -> Self {
        let now = Instant::now();
        Self {
            next_check: Mutex::new(now + DATA_RECEIVE_CHECK_INTERVAL),
            last_check: Mutex::new(now),
        }
    }

    /// Push the deadline forward; called for every non-old data payload.
    pub(crate) fn bump(&self) {
        *lock(&self.next_check) = Instant::now() + DATA_RECEIVE_CHECK_INTERVAL;
    }

    /// Pull the deadline in shortly after connect.
    pub(crate) fn schedule_early(&self) {
        *lock(&self.next_check) = Instant::now() + EARLY_DATA_RECEIVE_CHECK;
    }

    fn is_due(&self) -> bool {
        Instant::now() >= *lock(&self.next_check)
    }

    fn last_check_age(&self) -> Duration {
        lock(&self.last_check).elapsed()
    }

    fn mark_checked(&self) {
        let now = Instant::now();
        *lock(&self.last_check) = now;
        *lock(&self.next_check) = now + DATA_RECEIVE_CHECK_INTERVAL;
    }
}

#[derive(Default)]
struct PingerState {
    oldest_ping_time: Option<Instant>,
    last_ping_time: Option<Instant>,
    ping_fails: u32,
    not_responding_sent: bool,
    first_ping_done: bool,
    id_counter: u64,
}

/// Aborts the inner task when the ping wait is dropped, so cancellation
/// propagates into the in-flight RPC.
struct AbortOnDrop<T>(JoinHandle<T>);

impl<T> Drop for AbortOnDrop<T> {
    fn drop(&mut self) {
        self.0.abort();
    }
}

type PingRpc = AbortOnDrop<Result<IncomingPayload, RequestError>>;
type PingResult = Result<Result<IncomingPayload, RequestError>, JoinError>;

pub(crate) struct Pinger {
    auth: Arc<AuthStore>,
    session: Arc<SessionHandler>,
    events: EventSink,
    recv_check: Arc<ReceiveCheck>,
    send_not_responding: bool,
    pulse: Notify,
    short_circuit: Notify,
    state: Mutex<PingerState>,
}

impl Pinger {
    pub(crate) fn new(
        auth: Arc<AuthStore>,
        session: Arc<SessionHandler>,
        events: EventSink,
        recv_check: Arc<ReceiveCheck>,
        send_not_responding: bool,
    ) -> Self {
        Self {
            auth,
            session,
            events,
            recv_check,
            send_not_responding,
            pulse: Notify::new(),
            short_circuit: Notify::new(),
            state: Mutex::new(PingerState::default()),
        }
    }

    /// Request a ping; coalesces with any pending pulse.
    pub(crate) fn pulse(&self) {
        self.pulse.notify_one();
    }

    /// Wake the pinger immediately with the short response window.
    pub(crate) fn short_circuit(&self) {
        self.short_circuit.notify_waiters();
    }

    /// Drive the pinger until the owning task is aborted.
    pub(crate) async fn run(self: Arc<Self>) {
        loop {
            let short_circuited = {
                let pulsed = self.pulse.notified();
                let shorted = self.short_circuit.notified();
                tokio::select! {
                    () = pulsed => false,
                    () = shorted => true,
                }
            };
            let started = Instant::now();
            Arc::clone(&self).ping_cycle(short_circuited).await;
            self.data_receive_check(started.elapsed()).await;
        }
    }

    async fn ping_cycle(self: Arc<Self>, short_circuited: bool) {
        let eligible = self
            .auth
            .read(|state| state.is_logged_in() && state.should_use_google_host());
        if !eligible {
            return;
        }

        {
            let mut state = lock(&self.state);
            if let Some(last) = state.last_ping_time {
                if last.elapsed() < PING_MIN_INTERVAL {
                    return;
                }
            }
            let now = Instant::now();
            state.last_ping_time = Some(now);
            state.oldest_ping_time.get_or_insert(now);
            state.id_counter += 1;
            debug!(ping_id = state.id_counter, short_circuited, "pinging phone");
        }

        let resetter = Arc::new(Resetter::new());
        let timeout = if short_circuited {
            SHORT_CIRCUIT_PING_TIMEOUT
        } else {
            PING_TIMEOUT
        };
        let rpc = self.spawn_ping_rpc();
        self.wait_for_ping(rpc, resetter, timeout, false).await;
    }

    fn spawn_ping_rpc(&self) -> PingRpc {
        let session = Arc::clone(&self.session);
        AbortOnDrop(tokio::spawn(async move {
            let payload = NotifyDittoActivityRequest { success: true }.encode_to_vec();
            session
                .send(
                    ActionType::NotifyDittoActivity,
                    Some(payload),
                    SendOptions::default(),
                )
                .await
        }))
    }

    /// Race the RPC against the timer, the resetter, and further
    /// short-circuit signals; on timeout, extend the wait with the reping
    /// ticker (never from a sub-ping).
    async fn wait_for_ping(
        self: Arc<Self>,
        mut rpc: PingRpc,
        resetter: Arc<Resetter>,
        timeout: Duration,
        is_sub_ping: bool,
    ) {
        let deadline = tokio::time::sleep(timeout);
        tokio::pin!(deadline);
        loop {
            tokio::select! {
                result = &mut rpc.0 => {
                    self.finish_ping(result, &resetter);
                    return;
                }
                () = resetter.wait() => return,
                () = self.short_circuit.notified() => self.report_not_responding_once(),
                () = &mut deadline => break,
            }
        }

        let should_report = {
            let state = lock(&self.state);
            !state.first_ping_done || self.send_not_responding
        };
        if should_report {
            self.report_not_responding_once();
        }
        if is_sub_ping {
            return;
        }

        let mut interval = REPING_BASE;
        let mut tick = Box::pin(tokio::time::sleep(interval));
        loop {
            tokio::select! {
                result = &mut rpc.0 => {
                    self.finish_ping(result, &resetter);
                    return;
                }
                () = resetter.wait() => return,
                () = self.short_circuit.notified() => self.report_not_responding_once(),
                () = tick.as_mut() => {
                    interval = (interval * 2).min(REPING_CAP);
                    tick = Box::pin(tokio::time::sleep(interval));
                    Arc::clone(&self).spawn_sub_ping(&resetter);
                }
            }
        }
    }

    fn spawn_sub_ping(self: Arc<Self>, resetter: &Arc<Resetter>) {
        debug!("issuing sub-ping");
        let resetter = Arc::clone(resetter);
        tokio::spawn(async move {
            let rpc = self.spawn_ping_rpc();
            self.wait_for_ping(rpc, resetter, PING_TIMEOUT, true).await;
        });
    }

    fn finish_ping(&self, result: PingResult, resetter: &Resetter) {
        match result {
            Ok(Ok(_response)) => {
                let had_trouble = {
                    let mut state = lock(&self.state);
                    let had_trouble = state.not_responding_sent || state.ping_fails > 0;
                    state.ping_fails = 0;
                    state.not_responding_sent = false;
                    state.oldest_ping_time = None;
                    state.first_ping_done = true;
                    had_trouble
                };
                if had_trouble {
                    self.events.on_event(Event::PhoneRespondingAgain);
                }
                resetter.resolve();
            }
            Ok(Err(error)) => {
                let count = {
                    let mut state = lock(&self.state);
                    state.ping_fails += 1;
                    state.ping_fails
                };
                warn!(%error, count, "ping failed");
                self.events.on_event(Event::PingFailed {
                    error: error.to_string(),
                    count,
                });
            }
            Err(_cancelled) => debug!("ping task cancelled"),
        }
    }

    /// Emit `PhoneNotResponding` at most once per unresponsive episode.
    fn report_not_responding_once(&self) {
        {
            let mut state = lock(&self.state);
            if state.not_responding_sent {
                return;
            }
            state.not_responding_sent = true;
        }
        self.events.on_event(Event::PhoneNotResponding);
    }

    /// After each cycle: when the receive deadline passed, or the cycle
    /// dragged on, synthesize a sync and tell upstream nothing arrived.
    async fn data_receive_check(&self, cycle_elapsed: Duration) {
        let overdue = self.recv_check.is_due();
        let dragged = cycle_elapsed > Duration::from_secs(5 * 60)
            || (cycle_elapsed > Duration::from_secs(60)
                && self.recv_check.last_check_age() > Duration::from_secs(30 * 60));
        if !(overdue || dragged) {
            return;
        }
        self.recv_check.mark_checked();
        warn!("no data received within the check window, forcing a sync");

        let session_id = self.auth.read(|state| state.session_id.clone());
        let opts = SendOptions {
            custom_request_id: Some(session_id),
            omit_ttl: true,
            ..Default::default()
        };
        if let Err(error) = self
            .session
            .send_no_wait(ActionType::GetUpdates, None, opts)
            .await
        {
            warn!(%error, "forced sync request failed");
        }
        self.events.on_event(Event::NoDataReceived);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn resetter_unblocks_waiters_created_before_and_after() {
        let resetter = Arc::new(Resetter::new());

        let early = {
            let resetter = Arc::clone(&resetter);
            tokio::spawn(async move { resetter.wait().await })
        };
        tokio::task::yield_now().await;

        resetter.resolve();
        early.await.expect("early waiter unblocked");

        // A waiter arriving after resolution returns immediately.
        resetter.wait().await;
    }

    #[tokio::test(start_paused = true)]
    async fn receive_check_bump_pushes_the_deadline() {
        let check = ReceiveCheck::new();
        assert!(!check.is_due());

        tokio::time::advance(DATA_RECEIVE_CHECK_INTERVAL + Duration::from_secs(1)).await;
        assert!(check.is_due());

        check.bump();
        assert!(!check.is_due());
    }

    #[tokio::test(start_paused = true)]
    async fn early_check_comes_before_the_regular_interval() {
        let check = ReceiveCheck::new();
        check.schedule_early();
        tokio::time::advance(EARLY_DATA_RECEIVE_CHECK + Duration::from_secs(1)).await;
        assert!(check.is_due());
    }
}
