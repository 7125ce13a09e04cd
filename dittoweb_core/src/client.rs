//! Client facade: lifecycle orchestration.
//!
//! The facade itself holds no protocol state beyond configuration; it
//! wires the auth store, HTTP layer, session RPC engine, and long-poll
//! engine together and drives connect / disconnect / pairing flows.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use prost::Message as _;
use tokio::time::{sleep, Instant};
use tracing::{debug, info, warn};
use uuid::Uuid;

use dittoweb_pblite::WireFormat;
use dittoweb_proto::authentication::{
    AuthMessage, BrowserDetails, BrowserType, GetWebEncryptionKeyRequest,
    GetWebEncryptionKeyResponse, RefreshPhoneRelayRequest, RefreshPhoneRelayResponse,
    RegisterPhoneRelayRequest, RegisterPhoneRelayResponse, RevokeRelayPairingRequest,
    RevokeRelayPairingResponse, SignInGaiaDeviceId, SignInGaiaInner, SignInGaiaRequest,
    SignInGaiaResponse, UrlData,
};
use dittoweb_proto::rpc::ActionType;

use crate::auth::{AuthState, AuthStore};
use crate::consts::{
    config_version, pairing_url, registration_url, FIRST_CONNECT_TIMEOUT, GAIA_NETWORK,
    QR_CODE_URL_BASE, USER_AGENT,
};
use crate::error::ClientError;
use crate::events::{Event, EventHandler, EventSink};
use crate::http::HttpClient;
use crate::longpoll::LongPoll;
use crate::rpc::{SendOptions, SessionHandler};

/// Facade configuration.
pub struct ClientConfig {
    /// Route all traffic through this proxy URL.
    pub proxy: Option<String>,
    /// Reconnect automatically once pairing completes.
    pub auto_reconnect_after_pair: bool,
    /// Which registered phone to target in Gaia mode.
    pub preferred_gaia_device: usize,
    /// How long to wait for the first stream open.
    pub first_connect_timeout: Duration,
    /// Report `PhoneNotResponding` on ping timeouts even after the first
    /// successful ping.
    pub send_not_responding: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            proxy: None,
            auto_reconnect_after_pair: true,
            preferred_gaia_device: 0,
            first_connect_timeout: FIRST_CONNECT_TIMEOUT,
            send_not_responding: true,
        }
    }
}

struct Inner {
    auth: Arc<AuthStore>,
    http: HttpClient,
    session: Arc<SessionHandler>,
    longpoll: Arc<LongPoll>,
    events: EventSink,
    config: ClientConfig,
}

/// A Messages for Web client. Cheap to clone; all clones share state.
#[derive(Clone)]
pub struct Client {
    inner: Arc<Inner>,
}

impl Client {
    /// Assemble a client over a fresh or rehydrated [`AuthState`].
    ///
    /// # Errors
    ///
    /// Returns a [`ClientError`] if the HTTP client cannot be built
    /// (e.g. a malformed proxy URL).
    pub fn new(
        state: AuthState,
        events: Arc<dyn EventHandler>,
        config: ClientConfig,
    ) -> Result<Self, ClientError> {
        let auth = Arc::new(AuthStore::new(state));
        let http = HttpClient::new(Arc::clone(&auth), config.proxy.as_deref())?;
        let session = Arc::new(SessionHandler::new(Arc::clone(&auth), http.clone()));
        let longpoll = LongPoll::new(
            Arc::clone(&auth),
            http.clone(),
            Arc::clone(&session),
            Arc::clone(&events),
            config.send_not_responding,
        );

        // A slow RPC is a cheap early signal that the phone is gone.
        {
            let pinger = Arc::clone(longpoll.pinger());
            session.set_slow_callback(move || pinger.short_circuit());
        }

        let client = Self {
            inner: Arc::new(Inner {
                auth,
                http,
                session,
                longpoll,
                events,
                config,
            }),
        };

        if client.inner.config.auto_reconnect_after_pair {
            let weak = Arc::downgrade(&client.inner);
            client.inner.longpoll.set_on_pair(Arc::new(move |_paired| {
                let Some(inner) = weak.upgrade() else { return };
                tokio::spawn(async move {
                    // Give the phone time to persist the pair record.
                    sleep(Duration::from_secs(2)).await;
                    let client = Client { inner };
                    if let Err(error) = client.reconnect().await {
                        warn!(%error, "post-pair reconnect failed");
                    }
                });
            }));
        }

        Ok(client)
    }

    /// The auth store, for persistence snapshots.
    #[must_use]
    pub fn auth(&self) -> &Arc<AuthStore> {
        &self.inner.auth
    }

    pub(crate) fn session(&self) -> &Arc<SessionHandler> {
        &self.inner.session
    }

    pub(crate) fn http(&self) -> &HttpClient {
        &self.inner.http
    }

    /// Begin QR pairing: register the phone relay, open the stream so the
    /// pair event cannot be missed, and return the QR URL to display.
    ///
    /// # Errors
    ///
    /// Returns a [`ClientError`] when the registration RPC fails.
    pub async fn start_login(&self) -> Result<String, ClientError> {
        let state = self.inner.auth.snapshot();
        let request = RegisterPhoneRelayRequest {
            config_version: Some(config_version()),
            browser_details: Some(BrowserDetails {
                user_agent: USER_AGENT.to_owned(),
                browser_type: BrowserType::Chrome as i32,
                os: "Linux".to_owned(),
            }),
            public_key_der: state.refresh_key.public_key_der()?,
        };
        let response: RegisterPhoneRelayResponse = self
            .inner
            .http
            .request(
                &pairing_url("RegisterPhoneRelay"),
                &request,
                WireFormat::Protobuf,
            )
            .await?;
        if let Some(token) = response.auth_key_data {
            self.inner.auth.set_token(token);
        }

        Arc::clone(&self.inner.longpoll).start(None);

        let url = qr_url(
            &response.pairing_key,
            state.request_crypto.aes_key(),
            state.request_crypto.hmac_key(),
        );
        info!("pairing started, QR ready");
        self.inner.events.on_event(Event::Qr { url: url.clone() });
        Ok(url)
    }

    /// Regenerate the pairing key for an outstanding QR attempt and
    /// return the fresh QR URL.
    ///
    /// # Errors
    ///
    /// Returns a [`ClientError`] when the refresh RPC fails.
    pub async fn refresh_phone_relay(&self) -> Result<String, ClientError> {
        let request = RefreshPhoneRelayRequest {
            config_version: Some(config_version()),
        };
        let response: RefreshPhoneRelayResponse = self
            .inner
            .http
            .request(
                &pairing_url("RefreshPhoneRelay"),
                &request,
                WireFormat::Protobuf,
            )
            .await?;
        let state = self.inner.auth.snapshot();
        let url = qr_url(
            &response.pairing_key,
            state.request_crypto.aes_key(),
            state.request_crypto.hmac_key(),
        );
        self.inner.events.on_event(Event::Qr { url: url.clone() });
        Ok(url)
    }

    /// Fetch and store the web encryption key.
    ///
    /// # Errors
    ///
    /// Returns a [`ClientError`] when the RPC fails.
    pub async fn get_web_encryption_key(&self) -> Result<Vec<u8>, ClientError> {
        let request = GetWebEncryptionKeyRequest {
            config_version: Some(config_version()),
        };
        let response: GetWebEncryptionKeyResponse = self
            .inner
            .http
            .request(
                &pairing_url("GetWebEncryptionKey"),
                &request,
                WireFormat::Protobuf,
            )
            .await?;
        self.inner
            .auth
            .update(|state| state.web_encryption_key = Some(response.key.clone()));
        Ok(response.key)
    }

    /// Revoke the relay pairing and clear the paired identities.
    ///
    /// # Errors
    ///
    /// Returns a [`ClientError`] when the revoke RPC fails; the local
    /// state is only cleared on success.
    pub async fn unpair(&self) -> Result<(), ClientError> {
        let state = self.inner.auth.snapshot();
        let request = RevokeRelayPairingRequest {
            auth_message: Some(AuthMessage {
                request_id: Uuid::new_v4().to_string(),
                network: state.auth_network().to_owned(),
                tachyon_auth_token: state.tachyon_token.clone(),
                config_version: Some(config_version()),
            }),
            browser: state.browser.clone(),
        };
        let _: RevokeRelayPairingResponse = self
            .inner
            .http
            .request(
                &pairing_url("RevokeRelayPairing"),
                &request,
                WireFormat::Protobuf,
            )
            .await?;
        self.inner.auth.update(|state| {
            state.browser = None;
            state.mobile = None;
            state.tachyon_token.clear();
            state.tachyon_expiry = None;
        });
        info!("relay pairing revoked");
        Ok(())
    }

    /// Sign in with a Google account instead of scanning a QR.
    ///
    /// Marks the session as Gaia, registers this browser, and targets the
    /// configured preferred phone. The UKEY2 handshake that follows is an
    /// external collaborator's concern.
    ///
    /// # Errors
    ///
    /// Returns a [`ClientError`] when the sign-in RPC fails.
    pub async fn sign_in_gaia(
        &self,
        cookies: HashMap<String, String>,
    ) -> Result<SignInGaiaResponse, ClientError> {
        self.inner.auth.update(|state| {
            state.google_account = true;
            state.cookies.extend(cookies);
        });

        let request = SignInGaiaRequest {
            auth_message: Some(AuthMessage {
                request_id: Uuid::new_v4().to_string(),
                network: GAIA_NETWORK.to_owned(),
                tachyon_auth_token: Vec::new(),
                config_version: Some(config_version()),
            }),
            inner: Some(SignInGaiaInner {
                device_id: Some(SignInGaiaDeviceId {
                    unknown_int: 3,
                    device_id: format!("messages-web-{}", Uuid::new_v4()),
                }),
                some_data: None,
            }),
            network: GAIA_NETWORK.to_owned(),
            config_version: Some(config_version()),
        };
        let url = registration_url("SignInGaia", self.inner.auth.should_use_google_host());
        let response: SignInGaiaResponse = self
            .inner
            .http
            .request(&url, &request, WireFormat::Pblite)
            .await?;

        if let Some(token) = response.token_data.clone() {
            self.inner.auth.set_token(token);
        }
        if !response.browser_uuid.is_empty() {
            self.inner.auth.set_dest_reg_id(response.browser_uuid.clone());
        }
        if let Some(device_data) = &response.device_data {
            let preferred = self.inner.config.preferred_gaia_device;
            let mobile = device_data
                .registered
                .get(preferred)
                .or(device_data.mobile.as_ref());
            if let Some(mobile) = mobile {
                self.inner.auth.set_mobile(mobile.clone());
            }
        }
        info!("gaia sign-in completed");
        Ok(response)
    }

    /// Open the stream and wait for it to come up.
    ///
    /// # Errors
    ///
    /// Returns a [`ClientError`] when the token refresh fails or the
    /// stream does not open within the first-connect window.
    pub async fn connect(&self) -> Result<(), ClientError> {
        self.inner.longpoll.refresh_token_if_needed().await?;
        if self.inner.auth.is_logged_in() {
            self.inner.longpoll.schedule_early_receive_check();
            Arc::clone(&self.inner.session).start_ack_ticker();
        }

        let client = self.clone();
        Arc::clone(&self.inner.longpoll).start(Some(Box::new(move || {
            tokio::spawn(async move { client.post_connect().await });
        })));
        self.inner
            .longpoll
            .wait_first_connect(self.inner.config.first_connect_timeout)
            .await
    }

    /// First-open prelude: drain the backlog, flush acks, rotate the
    /// session id, and force a sync under the new id.
    async fn post_connect(&self) {
        sleep(Duration::from_secs(2)).await;
        if self.inner.longpoll.skip_count() != 0 {
            let deadline = Instant::now() + Duration::from_secs(3);
            while Instant::now() < deadline {
                sleep(Duration::from_secs(1)).await;
                if self.inner.longpoll.skip_count() == 0 {
                    break;
                }
            }
        }
        self.inner.session.flush_acks().await;

        let session_id = self.inner.auth.rotate_session_id();
        let opts = SendOptions {
            custom_request_id: Some(session_id),
            omit_ttl: true,
            ..Default::default()
        };
        if let Err(error) = self
            .inner
            .session
            .send_no_wait(ActionType::GetUpdates, None, opts)
            .await
        {
            warn!(%error, "post-connect sync failed");
        }
        if let Err(error) = self
            .inner
            .session
            .send_no_wait(ActionType::IsBugleDefault, None, SendOptions::default())
            .await
        {
            debug!(%error, "is-bugle-default probe failed");
        }
    }

    /// Stop the stream and the ack ticker, flushing pending acks once.
    pub async fn disconnect(&self) {
        self.inner.longpoll.stop();
        self.inner.session.stop_ack_ticker(true).await;
    }

    /// Disconnect, then connect.
    ///
    /// # Errors
    ///
    /// Propagates the connect failure.
    pub async fn reconnect(&self) -> Result<(), ClientError> {
        self.disconnect().await;
        self.connect().await
    }

    /// Short-lived sync for push-woken background contexts: poll until
    /// the payload counter goes quiet, then stop.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::BackgroundPollingExitedUncleanly`] when no
    /// data payload ever arrived, [`ClientError::NotLoggedIn`] without
    /// credentials.
    pub async fn connect_background(&self) -> Result<(), ClientError> {
        if !self.inner.auth.is_logged_in() {
            return Err(ClientError::NotLoggedIn);
        }
        self.inner.longpoll.refresh_token_if_needed().await?;
        Arc::clone(&self.inner.longpoll).start(None);

        let result = self.background_poll().await;

        self.inner.longpoll.stop();
        self.inner.session.flush_acks().await;
        result
    }

    async fn background_poll(&self) -> Result<(), ClientError> {
        let longpoll = &self.inner.longpoll;
        longpoll
            .wait_first_connect(self.inner.config.first_connect_timeout)
            .await?;

        let mut deadline = Instant::now() + Duration::from_secs(10);
        let mut last_count = longpoll.payload_count();
        while longpoll.is_connected() && Instant::now() < deadline {
            sleep(Duration::from_millis(250)).await;
            let count = longpoll.payload_count();
            if count != last_count {
                last_count = count;
                let extension = if longpoll.received_data() {
                    Duration::from_secs(3)
                } else {
                    Duration::from_secs(5)
                };
                deadline = Instant::now() + extension;
            }
        }

        if longpoll.received_data() {
            Ok(())
        } else {
            Err(ClientError::BackgroundPollingExitedUncleanly)
        }
    }
}

/// Compose the QR URL embedding the pairing key and request-crypto keys.
pub(crate) fn qr_url(pairing_key: &[u8], aes_key: &[u8; 32], hmac_key: &[u8; 32]) -> String {
    let url_data = UrlData {
        pairing_key: pairing_key.to_vec(),
        aes_key: aes_key.to_vec(),
        hmac_key: hmac_key.to_vec(),
    };
    format!(
        "{QR_CODE_URL_BASE}{}",
        STANDARD.encode(url_data.encode_to_vec())
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn qr_url_embeds_the_request_crypto_keys() {
        let aes = [7u8; 32];
        let hmac = [9u8; 32];
        let url = qr_url(b"pair-key", &aes, &hmac);

        let encoded = url
            .strip_prefix("https://support.google.com/messages/?p=web_computer#?c=")
            .expect("QR URL prefix");
        let raw = STANDARD.decode(encoded).expect("base64");
        let decoded = UrlData::decode(raw.as_slice()).expect("protobuf");
        assert_eq!(decoded.pairing_key, b"pair-key");
        assert_eq!(decoded.aes_key, aes);
        assert_eq!(decoded.hmac_key, hmac);
    }
}
