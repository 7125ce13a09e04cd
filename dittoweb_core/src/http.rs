//! HTTP layer: one unary request primitive and one streaming open.
//!
//! Every request carries the fixed browser-profile headers, the current
//! cookie jar, and (when a SAPISID cookie exists) the SAPISIDHASH
//! authorization header. `Set-Cookie` directives on responses are merged
//! back into the auth state.

use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use reqwest::header::{
    HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE, COOKIE, ORIGIN, REFERER, SET_COOKIE,
};
use tracing::{debug, warn};

use dittoweb_crypto::sapisid_hash;
use dittoweb_pblite::{decode_body, to_vec as pblite_to_vec, Pblite, WireFormat};

use crate::auth::AuthStore;
use crate::consts::{
    GOOG_API_KEY, MESSAGES_ORIGIN, MESSAGES_REFERER, SEC_CH_UA, SEC_CH_UA_PLATFORM,
    STREAM_TIMEOUT, USER_AGENT, X_USER_AGENT,
};
use crate::error::RequestError;

const BODY_LOG_LIMIT: usize = 1024;

/// Shared HTTP client bound to the auth state.
#[derive(Clone)]
pub struct HttpClient {
    client: reqwest::Client,
    auth: Arc<AuthStore>,
}

impl HttpClient {
    /// Build the client, optionally routing through a proxy.
    ///
    /// # Errors
    ///
    /// Returns a [`RequestError`] if the proxy URL is rejected or the
    /// client cannot be constructed.
    pub fn new(auth: Arc<AuthStore>, proxy: Option<&str>) -> Result<Self, RequestError> {
        let mut builder = reqwest::Client::builder().user_agent(USER_AGENT);
        if let Some(proxy) = proxy {
            builder = builder.proxy(reqwest::Proxy::all(proxy)?);
        }
        Ok(Self {
            client: builder.build()?,
            auth,
        })
    }

    /// The underlying [`reqwest::Client`], for media transfers.
    #[must_use]
    pub(crate) fn raw(&self) -> &reqwest::Client {
        &self.client
    }

    fn encode<M: Pblite>(msg: &M, wire: WireFormat) -> Vec<u8> {
        match wire {
            WireFormat::Protobuf => msg.encode_to_vec(),
            WireFormat::Pblite => pblite_to_vec(msg),
        }
    }

    /// Assemble the fixed browser-profile headers plus cookie/auth.
    pub(crate) fn request_headers(&self, wire: WireFormat) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static(wire.content_type()));
        headers.insert("sec-ch-ua", HeaderValue::from_static(SEC_CH_UA));
        headers.insert("sec-ch-ua-mobile", HeaderValue::from_static("?0"));
        headers.insert(
            "sec-ch-ua-platform",
            HeaderValue::from_static(SEC_CH_UA_PLATFORM),
        );
        headers.insert("x-user-agent", HeaderValue::from_static(X_USER_AGENT));
        headers.insert("x-goog-api-key", HeaderValue::from_static(GOOG_API_KEY));
        headers.insert(ORIGIN, HeaderValue::from_static(MESSAGES_ORIGIN));
        headers.insert(REFERER, HeaderValue::from_static(MESSAGES_REFERER));

        let (cookie, authorization) = self.auth.read(|state| {
            let authorization = state.sapisid().map(|sapisid| {
                let timestamp = SystemTime::now()
                    .duration_since(UNIX_EPOCH)
                    .unwrap_or_default()
                    .as_secs() as i64;
                format!(
                    "SAPISIDHASH {}",
                    sapisid_hash(timestamp, sapisid, MESSAGES_ORIGIN)
                )
            });
            (state.cookie_header(), authorization)
        });
        if let Some(cookie) = cookie {
            match HeaderValue::from_str(&cookie) {
                Ok(value) => {
                    headers.insert(COOKIE, value);
                }
                Err(_) => warn!("cookie jar contains a non-header-safe value, skipping"),
            }
        }
        if let Some(authorization) = authorization {
            if let Ok(value) = HeaderValue::from_str(&authorization) {
                headers.insert(AUTHORIZATION, value);
            }
        }
        headers
    }

    /// Merge `Set-Cookie` directives back into the cookie jar.
    fn merge_set_cookies(&self, headers: &HeaderMap) {
        let cookies: Vec<(String, String)> = headers
            .get_all(SET_COOKIE)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .filter_map(|directive| {
                let pair = directive.split(';').next()?;
                let (name, value) = pair.split_once('=')?;
                Some((name.trim().to_owned(), value.trim().to_owned()))
            })
            .collect();
        if !cookies.is_empty() {
            debug!(count = cookies.len(), "merging response cookies");
            self.auth.merge_cookies(cookies);
        }
    }

    async fn post_raw(
        &self,
        url: &str,
        body: Vec<u8>,
        wire: WireFormat,
        timeout: Option<Duration>,
    ) -> Result<reqwest::Response, RequestError> {
        debug!(url, "POST");
        let mut request = self
            .client
            .post(url)
            .headers(self.request_headers(wire))
            .body(body);
        if let Some(timeout) = timeout {
            request = request.timeout(timeout);
        }
        let response = request.send().await?;
        self.merge_set_cookies(response.headers());

        let status = response.status();
        if !status.is_success() {
            let mut body = response.text().await.unwrap_or_default();
            body.truncate(BODY_LOG_LIMIT);
            warn!(status = status.as_u16(), "request failed");
            return Err(RequestError::Status {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }

    /// Unary request: POST a message, decode the response by its content
    /// type (protobuf first, then pblite, when the type is unrecognized).
    ///
    /// # Errors
    ///
    /// Returns a [`RequestError`] for transport failures, non-2xx
    /// statuses, and undecodable bodies.
    pub async fn request<Req: Pblite, Resp: Pblite>(
        &self,
        url: &str,
        body: &Req,
        wire: WireFormat,
    ) -> Result<Resp, RequestError> {
        let response = self.post_raw(url, Self::encode(body, wire), wire, None).await?;
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_owned();
        let bytes = response.bytes().await?;
        Ok(decode_body(&content_type, &bytes)?)
    }

    /// POST whose response body carries nothing; the real response arrives
    /// out-of-band on the long-poll stream.
    ///
    /// # Errors
    ///
    /// Returns a [`RequestError`] for transport failures and non-2xx
    /// statuses.
    pub async fn post_ignore_body<Req: Pblite>(
        &self,
        url: &str,
        body: &Req,
        wire: WireFormat,
    ) -> Result<(), RequestError> {
        self.post_raw(url, Self::encode(body, wire), wire, None)
            .await
            .map(drop)
    }

    /// Open the streaming receive POST. The response is returned with its
    /// body unconsumed so the caller can read it as a byte stream; the
    /// whole stream is bounded by a 30-minute timeout.
    ///
    /// # Errors
    ///
    /// Returns a [`RequestError`] for transport failures and non-2xx
    /// statuses; any non-2xx is fatal for the attempt.
    pub async fn open_stream<Req: Pblite>(
        &self,
        url: &str,
        body: &Req,
    ) -> Result<reqwest::Response, RequestError> {
        self.post_raw(
            url,
            Self::encode(body, WireFormat::Pblite),
            WireFormat::Pblite,
            Some(STREAM_TIMEOUT),
        )
        .await
    }
}
