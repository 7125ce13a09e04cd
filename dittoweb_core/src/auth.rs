//! Durable authentication and session state.
//!
//! [`AuthState`] is the full credential record: request-crypto keys, the
//! P-256 refresh key, device identities, the tachyon token, cookies, and
//! push keys. It round-trips byte-faithfully through serde; the on-disk
//! format is the storage collaborator's concern.
//!
//! [`AuthStore`] owns the state for the lifetime of the client and
//! serializes all mutation: concurrent readers observe a consistent
//! snapshot, concurrent writers never interleave field updates.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};
use std::time::{Duration, SystemTime};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use dittoweb_crypto::{PayloadKeys, RefreshKey};
use dittoweb_proto::authentication::{Device, TokenData};

use crate::consts::{DEFAULT_TTL, GAIA_NETWORK, TOKEN_REFRESH_MARGIN};

/// Web-push subscription keys.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PushKeys {
    pub endpoint: String,
    pub p256dh: Vec<u8>,
    pub auth: Vec<u8>,
}

/// The full session/credential record.
#[derive(Clone, Serialize, Deserialize)]
#[serde(try_from = "AuthStateRepr", into = "AuthStateRepr")]
pub struct AuthState {
    /// AES + HMAC keys for RPC payload encryption.
    pub request_crypto: PayloadKeys,
    /// P-256 key that signs token refreshes.
    pub refresh_key: RefreshKey,
    /// Browser identity assigned at pair time.
    pub browser: Option<Device>,
    /// Phone identity assigned at pair time.
    pub mobile: Option<Device>,
    /// Bearer credential for most RPCs.
    pub tachyon_token: Vec<u8>,
    /// Expiry instant of the token, when known.
    pub tachyon_expiry: Option<SystemTime>,
    /// Token time-to-live in microseconds; zero means 24 h.
    pub tachyon_ttl_micros: i64,
    /// Identifies this browser session; rotated on demand.
    pub session_id: String,
    /// Phone destination registration id (Gaia mode).
    pub dest_reg_id: Option<String>,
    /// Outstanding Gaia pairing attempt.
    pub pairing_id: Option<String>,
    /// Cookie jar; presence of SAPISID enables SAPISIDHASH.
    pub cookies: HashMap<String, String>,
    /// Key returned by `GetWebEncryptionKey`.
    pub web_encryption_key: Option<Vec<u8>>,
    /// Web-push subscription, if registered.
    pub push_keys: Option<PushKeys>,
    /// Whether this is a Google-account (Gaia) session.
    pub google_account: bool,
}

impl std::fmt::Debug for AuthState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthState")
            .field("browser", &self.browser)
            .field("mobile", &self.mobile)
            .field("session_id", &self.session_id)
            .field("google_account", &self.google_account)
            .finish_non_exhaustive()
    }
}

impl AuthState {
    /// Create a fresh, not-logged-in state for a first pairing.
    #[must_use]
    pub fn new() -> Self {
        Self {
            request_crypto: PayloadKeys::generate(),
            refresh_key: RefreshKey::generate(),
            browser: None,
            mobile: None,
            tachyon_token: Vec::new(),
            tachyon_expiry: None,
            tachyon_ttl_micros: 0,
            session_id: Uuid::new_v4().to_string(),
            dest_reg_id: None,
            pairing_id: None,
            cookies: HashMap::new(),
            web_encryption_key: None,
            push_keys: None,
            google_account: false,
        }
    }

    /// Both the token and the browser identity are present.
    #[must_use]
    pub fn is_logged_in(&self) -> bool {
        !self.tachyon_token.is_empty() && self.browser.is_some()
    }

    /// The token is absent, expired, or expiring within one hour.
    #[must_use]
    pub fn needs_token_refresh(&self) -> bool {
        match self.tachyon_expiry {
            None => true,
            Some(expiry) => SystemTime::now() + TOKEN_REFRESH_MARGIN >= expiry,
        }
    }

    /// Whether messaging endpoints use the Google hostname variant.
    ///
    /// True iff this is not a Google-account session OR the cookie map is
    /// non-empty.
    #[must_use]
    pub fn should_use_google_host(&self) -> bool {
        !self.google_account || !self.cookies.is_empty()
    }

    /// The network identifier: empty for QR sessions, fixed for Gaia.
    #[must_use]
    pub fn auth_network(&self) -> &'static str {
        if self.google_account {
            GAIA_NETWORK
        } else {
            ""
        }
    }

    /// The TTL to apply, substituting 24 h for zero.
    #[must_use]
    pub fn effective_ttl(&self) -> Duration {
        if self.tachyon_ttl_micros == 0 {
            DEFAULT_TTL
        } else {
            Duration::from_micros(self.tachyon_ttl_micros.unsigned_abs())
        }
    }

    /// Apply a token issued by the server, computing the new expiry.
    pub fn apply_token(&mut self, token: TokenData) {
        self.tachyon_ttl_micros = token.ttl_micros;
        self.tachyon_token = token.tachyon_auth_token;
        self.tachyon_expiry = Some(SystemTime::now() + self.effective_ttl());
    }

    /// The SAPISID cookie value, if present under either name.
    #[must_use]
    pub fn sapisid(&self) -> Option<&str> {
        self.cookies
            .get("SAPISID")
            .or_else(|| self.cookies.get("__Secure-1PAPISID"))
            .map(String::as_str)
    }

    /// The `cookie:` header value, or `None` when the jar is empty.
    #[must_use]
    pub fn cookie_header(&self) -> Option<String> {
        if self.cookies.is_empty() {
            return None;
        }
        let mut pairs: Vec<_> = self.cookies.iter().collect();
        pairs.sort_by_key(|(name, _)| name.as_str());
        Some(
            pairs
                .into_iter()
                .map(|(name, value)| format!("{name}={value}"))
                .collect::<Vec<_>>()
                .join("; "),
        )
    }
}

impl Default for AuthState {
    fn default() -> Self {
        Self::new()
    }
}

/// Serde mirror of [`AuthState`] holding raw key bytes.
#[derive(Clone, Serialize, Deserialize)]
struct AuthStateRepr {
    aes_key: [u8; 32],
    hmac_key: [u8; 32],
    refresh_key_scalar: [u8; 32],
    browser: Option<DeviceRepr>,
    mobile: Option<DeviceRepr>,
    tachyon_token: Vec<u8>,
    tachyon_expiry: Option<SystemTime>,
    tachyon_ttl_micros: i64,
    session_id: String,
    dest_reg_id: Option<String>,
    pairing_id: Option<String>,
    cookies: HashMap<String, String>,
    web_encryption_key: Option<Vec<u8>>,
    push_keys: Option<PushKeys>,
    google_account: bool,
}

#[derive(Clone, Serialize, Deserialize)]
struct DeviceRepr {
    user_id: i64,
    source_id: String,
    network: String,
}

impl From<Device> for DeviceRepr {
    fn from(device: Device) -> Self {
        Self {
            user_id: device.user_id,
            source_id: device.source_id,
            network: device.network,
        }
    }
}

impl From<DeviceRepr> for Device {
    fn from(repr: DeviceRepr) -> Self {
        Self {
            user_id: repr.user_id,
            source_id: repr.source_id,
            network: repr.network,
        }
    }
}

impl From<AuthState> for AuthStateRepr {
    fn from(state: AuthState) -> Self {
        Self {
            aes_key: *state.request_crypto.aes_key(),
            hmac_key: *state.request_crypto.hmac_key(),
            refresh_key_scalar: state.refresh_key.to_scalar_bytes(),
            browser: state.browser.map(Into::into),
            mobile: state.mobile.map(Into::into),
            tachyon_token: state.tachyon_token,
            tachyon_expiry: state.tachyon_expiry,
            tachyon_ttl_micros: state.tachyon_ttl_micros,
            session_id: state.session_id,
            dest_reg_id: state.dest_reg_id,
            pairing_id: state.pairing_id,
            cookies: state.cookies,
            web_encryption_key: state.web_encryption_key,
            push_keys: state.push_keys,
            google_account: state.google_account,
        }
    }
}

impl TryFrom<AuthStateRepr> for AuthState {
    type Error = dittoweb_crypto::KeyError;

    fn try_from(repr: AuthStateRepr) -> Result<Self, Self::Error> {
        Ok(Self {
            request_crypto: PayloadKeys::from_bytes(repr.aes_key, repr.hmac_key),
            refresh_key: RefreshKey::from_scalar_bytes(&repr.refresh_key_scalar)?,
            browser: repr.browser.map(Into::into),
            mobile: repr.mobile.map(Into::into),
            tachyon_token: repr.tachyon_token,
            tachyon_expiry: repr.tachyon_expiry,
            tachyon_ttl_micros: repr.tachyon_ttl_micros,
            session_id: repr.session_id,
            dest_reg_id: repr.dest_reg_id,
            pairing_id: repr.pairing_id,
            cookies: repr.cookies,
            web_encryption_key: repr.web_encryption_key,
            push_keys: repr.push_keys,
            google_account: repr.google_account,
        })
    }
}

/// Serialized-mutation owner of the [`AuthState`].
pub struct AuthStore {
    inner: RwLock<AuthState>,
}

impl AuthStore {
    /// Wrap a state (fresh or rehydrated from storage).
    #[must_use]
    pub fn new(state: AuthState) -> Self {
        Self {
            inner: RwLock::new(state),
        }
    }

    /// A consistent clone of the current state.
    #[must_use]
    pub fn snapshot(&self) -> AuthState {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Run a closure against the current state.
    pub fn read<R>(&self, f: impl FnOnce(&AuthState) -> R) -> R {
        f(&self.inner.read().unwrap_or_else(PoisonError::into_inner))
    }

    /// Run a mutating closure; the whole closure is one atomic update.
    pub fn update<R>(&self, f: impl FnOnce(&mut AuthState) -> R) -> R {
        f(&mut self.inner.write().unwrap_or_else(PoisonError::into_inner))
    }

    /// Apply a server-issued token.
    pub fn set_token(&self, token: TokenData) {
        self.update(|state| state.apply_token(token));
    }

    /// Record the browser identity.
    pub fn set_browser(&self, device: Device) {
        self.update(|state| state.browser = Some(device));
    }

    /// Record the phone identity.
    pub fn set_mobile(&self, device: Device) {
        self.update(|state| state.mobile = Some(device));
    }

    /// Insert or replace one cookie.
    pub fn set_cookie(&self, name: String, value: String) {
        self.update(|state| {
            state.cookies.insert(name, value);
        });
    }

    /// Merge cookies parsed from `Set-Cookie` response headers.
    pub fn merge_cookies(&self, cookies: impl IntoIterator<Item = (String, String)>) {
        self.update(|state| state.cookies.extend(cookies));
    }

    /// Record web-push subscription keys.
    pub fn set_push_keys(&self, keys: PushKeys) {
        self.update(|state| state.push_keys = Some(keys));
    }

    /// Record the phone destination registration id (Gaia mode).
    pub fn set_dest_reg_id(&self, id: String) {
        self.update(|state| state.dest_reg_id = Some(id));
    }

    /// Record an outstanding Gaia pairing attempt.
    pub fn set_pairing_id(&self, id: Option<String>) {
        self.update(|state| state.pairing_id = id);
    }

    /// Replace the session id with a fresh UUID and return it.
    pub fn rotate_session_id(&self) -> String {
        let id = Uuid::new_v4().to_string();
        self.update(|state| state.session_id.clone_from(&id));
        id
    }

    /// See [`AuthState::is_logged_in`].
    #[must_use]
    pub fn is_logged_in(&self) -> bool {
        self.read(AuthState::is_logged_in)
    }

    /// See [`AuthState::needs_token_refresh`].
    #[must_use]
    pub fn needs_token_refresh(&self) -> bool {
        self.read(AuthState::needs_token_refresh)
    }

    /// See [`AuthState::should_use_google_host`].
    #[must_use]
    pub fn should_use_google_host(&self) -> bool {
        self.read(AuthState::should_use_google_host)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn paired_state() -> AuthState {
        let mut state = AuthState::new();
        state.browser = Some(Device {
            user_id: 1,
            source_id: "browser-1".into(),
            network: String::new(),
        });
        state.apply_token(TokenData {
            tachyon_auth_token: b"token".to_vec(),
            ttl_micros: 0,
        });
        state
    }

    #[test]
    fn fresh_state_is_not_logged_in() {
        assert!(!AuthState::new().is_logged_in());
    }

    #[test]
    fn token_and_browser_mean_logged_in() {
        assert!(paired_state().is_logged_in());
    }

    #[test]
    fn zero_ttl_is_treated_as_24h() {
        let state = paired_state();
        assert_eq!(state.effective_ttl(), DEFAULT_TTL);
        let expiry = state.tachyon_expiry.expect("expiry set");
        let remaining = expiry
            .duration_since(SystemTime::now())
            .expect("in the future");
        assert!(remaining > Duration::from_secs(23 * 3600));
    }

    #[test]
    fn refresh_needed_when_expiry_is_near() {
        let mut state = paired_state();
        state.tachyon_expiry = Some(SystemTime::now() + Duration::from_secs(30 * 60));
        assert!(state.needs_token_refresh());
        state.tachyon_expiry = Some(SystemTime::now() + Duration::from_secs(2 * 3600));
        assert!(!state.needs_token_refresh());
        state.tachyon_expiry = None;
        assert!(state.needs_token_refresh());
    }

    #[test]
    fn google_host_predicate() {
        let mut state = AuthState::new();
        assert!(state.should_use_google_host());
        state.google_account = true;
        assert!(!state.should_use_google_host());
        state.cookies.insert("SAPISID".into(), "abc".into());
        assert!(state.should_use_google_host());
    }

    #[test]
    fn auth_network_by_session_kind() {
        let mut state = AuthState::new();
        assert_eq!(state.auth_network(), "");
        state.google_account = true;
        assert_eq!(state.auth_network(), GAIA_NETWORK);
    }

    #[test]
    fn sapisid_fallback_name() {
        let mut state = AuthState::new();
        assert!(state.sapisid().is_none());
        state
            .cookies
            .insert("__Secure-1PAPISID".into(), "fallback".into());
        assert_eq!(state.sapisid(), Some("fallback"));
        state.cookies.insert("SAPISID".into(), "primary".into());
        assert_eq!(state.sapisid(), Some("primary"));
    }

    #[test]
    fn serde_round_trip_is_byte_faithful() {
        let mut state = paired_state();
        state.cookies.insert("SAPISID".into(), "v".into());
        state.push_keys = Some(PushKeys {
            endpoint: "https://push.example/ep".into(),
            p256dh: vec![1, 2, 3],
            auth: vec![4, 5],
        });

        let json = serde_json::to_string(&state).expect("serialize");
        let restored: AuthState = serde_json::from_str(&json).expect("deserialize");

        assert_eq!(
            restored.request_crypto.aes_key(),
            state.request_crypto.aes_key()
        );
        assert_eq!(
            restored.refresh_key.to_scalar_bytes(),
            state.refresh_key.to_scalar_bytes()
        );
        assert_eq!(restored.tachyon_token, state.tachyon_token);
        assert_eq!(restored.session_id, state.session_id);
        assert_eq!(restored.cookies, state.cookies);
        assert_eq!(restored.push_keys, state.push_keys);
    }

    #[test]
    fn rotate_session_id_changes_the_id() {
        let store = AuthStore::new(AuthState::new());
        let before = store.snapshot().session_id;
        let after = store.rotate_session_id();
        assert_ne!(before, after);
        assert_eq!(store.snapshot().session_id, after);
    }
}
