//! `authentication` package: pairing, tokens, and Gaia sign-in.

use dittoweb_pblite::{DecodeError, Decoder, Encoder, Pblite};

/// Client build identity attached to every authenticated envelope.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ConfigVersion {
    #[prost(int32, tag = "3")]
    pub year: i32,
    #[prost(int32, tag = "4")]
    pub month: i32,
    #[prost(int32, tag = "5")]
    pub day: i32,
    #[prost(int32, tag = "7")]
    pub v1: i32,
    #[prost(int32, tag = "9")]
    pub v2: i32,
}

impl Pblite for ConfigVersion {
    const NAME: &'static str = "authentication.ConfigVersion";

    fn encode_fields(&self, enc: &mut Encoder) {
        enc.int32(3, self.year);
        enc.int32(4, self.month);
        enc.int32(5, self.day);
        enc.int32(7, self.v1);
        enc.int32(9, self.v2);
    }

    fn decode_fields(dec: &Decoder<'_>) -> Result<Self, DecodeError> {
        Ok(Self {
            year: dec.int32(3)?.unwrap_or_default(),
            month: dec.int32(4)?.unwrap_or_default(),
            day: dec.int32(5)?.unwrap_or_default(),
            v1: dec.int32(7)?.unwrap_or_default(),
            v2: dec.int32(9)?.unwrap_or_default(),
        })
    }
}

/// A device triple assigned by the server at pair time.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Device {
    #[prost(int64, tag = "1")]
    pub user_id: i64,
    #[prost(string, tag = "2")]
    pub source_id: String,
    #[prost(string, tag = "3")]
    pub network: String,
}

impl Pblite for Device {
    const NAME: &'static str = "authentication.Device";

    fn encode_fields(&self, enc: &mut Encoder) {
        enc.int64(1, self.user_id);
        enc.string(2, &self.source_id);
        enc.string(3, &self.network);
    }

    fn decode_fields(dec: &Decoder<'_>) -> Result<Self, DecodeError> {
        Ok(Self {
            user_id: dec.int64(1)?.unwrap_or_default(),
            source_id: dec.string(2)?.unwrap_or_default(),
            network: dec.string(3)?.unwrap_or_default(),
        })
    }
}

/// Request identity + bearer credential for stream opens and refreshes.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct AuthMessage {
    #[prost(string, tag = "1")]
    pub request_id: String,
    #[prost(string, tag = "3")]
    pub network: String,
    #[prost(bytes = "vec", tag = "6")]
    pub tachyon_auth_token: Vec<u8>,
    #[prost(message, optional, tag = "7")]
    pub config_version: Option<ConfigVersion>,
}

impl Pblite for AuthMessage {
    const NAME: &'static str = "authentication.AuthMessage";

    fn encode_fields(&self, enc: &mut Encoder) {
        enc.string(1, &self.request_id);
        enc.string(3, &self.network);
        enc.bytes(6, &self.tachyon_auth_token);
        enc.message_opt(7, self.config_version.as_ref());
    }

    fn decode_fields(dec: &Decoder<'_>) -> Result<Self, DecodeError> {
        Ok(Self {
            request_id: dec.string(1)?.unwrap_or_default(),
            network: dec.string(3)?.unwrap_or_default(),
            tachyon_auth_token: dec.bytes(6)?.unwrap_or_default(),
            config_version: dec.message(7)?,
        })
    }
}

/// The browser kinds the service distinguishes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
#[repr(i32)]
pub enum BrowserType {
    UnknownBrowserType = 0,
    Other = 1,
    Chrome = 2,
    Firefox = 3,
    Safari = 4,
}

/// Browser profile submitted when registering the phone relay.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct BrowserDetails {
    #[prost(string, tag = "1")]
    pub user_agent: String,
    #[prost(enumeration = "BrowserType", tag = "2")]
    pub browser_type: i32,
    #[prost(string, tag = "3")]
    pub os: String,
}

impl Pblite for BrowserDetails {
    const NAME: &'static str = "authentication.BrowserDetails";

    fn encode_fields(&self, enc: &mut Encoder) {
        enc.string(1, &self.user_agent);
        enc.enumeration(2, self.browser_type);
        enc.string(3, &self.os);
    }

    fn decode_fields(dec: &Decoder<'_>) -> Result<Self, DecodeError> {
        Ok(Self {
            user_agent: dec.string(1)?.unwrap_or_default(),
            browser_type: dec.enumeration(2)?.unwrap_or_default(),
            os: dec.string(3)?.unwrap_or_default(),
        })
    }
}

/// A tachyon bearer token with its validity window in microseconds.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct TokenData {
    #[prost(bytes = "vec", tag = "1")]
    pub tachyon_auth_token: Vec<u8>,
    #[prost(int64, tag = "2")]
    pub ttl_micros: i64,
}

impl Pblite for TokenData {
    const NAME: &'static str = "authentication.TokenData";

    fn encode_fields(&self, enc: &mut Encoder) {
        enc.bytes(1, &self.tachyon_auth_token);
        enc.int64(2, self.ttl_micros);
    }

    fn decode_fields(dec: &Decoder<'_>) -> Result<Self, DecodeError> {
        Ok(Self {
            tachyon_auth_token: dec.bytes(1)?.unwrap_or_default(),
            ttl_micros: dec.int64(2)?.unwrap_or_default(),
        })
    }
}

/// Starts a QR pairing attempt.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct RegisterPhoneRelayRequest {
    #[prost(message, optional, tag = "1")]
    pub config_version: Option<ConfigVersion>,
    #[prost(message, optional, tag = "3")]
    pub browser_details: Option<BrowserDetails>,
    /// PKIX SubjectPublicKeyInfo DER of the refresh key.
    #[prost(bytes = "vec", tag = "6")]
    pub public_key_der: Vec<u8>,
}

impl Pblite for RegisterPhoneRelayRequest {
    const NAME: &'static str = "authentication.RegisterPhoneRelayRequest";

    fn encode_fields(&self, enc: &mut Encoder) {
        enc.message_opt(1, self.config_version.as_ref());
        enc.message_opt(3, self.browser_details.as_ref());
        enc.bytes(6, &self.public_key_der);
    }

    fn decode_fields(dec: &Decoder<'_>) -> Result<Self, DecodeError> {
        Ok(Self {
            config_version: dec.message(1)?,
            browser_details: dec.message(3)?,
            public_key_der: dec.bytes(6)?.unwrap_or_default(),
        })
    }
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct RegisterPhoneRelayResponse {
    #[prost(message, optional, tag = "2")]
    pub auth_key_data: Option<TokenData>,
    /// Opaque key embedded in the QR URL.
    #[prost(bytes = "vec", tag = "5")]
    pub pairing_key: Vec<u8>,
}

impl Pblite for RegisterPhoneRelayResponse {
    const NAME: &'static str = "authentication.RegisterPhoneRelayResponse";

    fn encode_fields(&self, enc: &mut Encoder) {
        enc.message_opt(2, self.auth_key_data.as_ref());
        enc.bytes(5, &self.pairing_key);
    }

    fn decode_fields(dec: &Decoder<'_>) -> Result<Self, DecodeError> {
        Ok(Self {
            auth_key_data: dec.message(2)?,
            pairing_key: dec.bytes(5)?.unwrap_or_default(),
        })
    }
}

/// Regenerates the pairing key for a stalled QR attempt.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct RefreshPhoneRelayRequest {
    #[prost(message, optional, tag = "1")]
    pub config_version: Option<ConfigVersion>,
}

impl Pblite for RefreshPhoneRelayRequest {
    const NAME: &'static str = "authentication.RefreshPhoneRelayRequest";

    fn encode_fields(&self, enc: &mut Encoder) {
        enc.message_opt(1, self.config_version.as_ref());
    }

    fn decode_fields(dec: &Decoder<'_>) -> Result<Self, DecodeError> {
        Ok(Self {
            config_version: dec.message(1)?,
        })
    }
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct RefreshPhoneRelayResponse {
    #[prost(bytes = "vec", tag = "2")]
    pub pairing_key: Vec<u8>,
}

impl Pblite for RefreshPhoneRelayResponse {
    const NAME: &'static str = "authentication.RefreshPhoneRelayResponse";

    fn encode_fields(&self, enc: &mut Encoder) {
        enc.bytes(2, &self.pairing_key);
    }

    fn decode_fields(dec: &Decoder<'_>) -> Result<Self, DecodeError> {
        Ok(Self {
            pairing_key: dec.bytes(2)?.unwrap_or_default(),
        })
    }
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct GetWebEncryptionKeyRequest {
    #[prost(message, optional, tag = "1")]
    pub config_version: Option<ConfigVersion>,
}

impl Pblite for GetWebEncryptionKeyRequest {
    const NAME: &'static str = "authentication.GetWebEncryptionKeyRequest";

    fn encode_fields(&self, enc: &mut Encoder) {
        enc.message_opt(1, self.config_version.as_ref());
    }

    fn decode_fields(dec: &Decoder<'_>) -> Result<Self, DecodeError> {
        Ok(Self {
            config_version: dec.message(1)?,
        })
    }
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct GetWebEncryptionKeyResponse {
    #[prost(bytes = "vec", tag = "2")]
    pub key: Vec<u8>,
}

impl Pblite for GetWebEncryptionKeyResponse {
    const NAME: &'static str = "authentication.GetWebEncryptionKeyResponse";

    fn encode_fields(&self, enc: &mut Encoder) {
        enc.bytes(2, &self.key);
    }

    fn decode_fields(dec: &Decoder<'_>) -> Result<Self, DecodeError> {
        Ok(Self {
            key: dec.bytes(2)?.unwrap_or_default(),
        })
    }
}

/// Tears down the relay pairing from the browser side.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct RevokeRelayPairingRequest {
    #[prost(message, optional, tag = "1")]
    pub auth_message: Option<AuthMessage>,
    #[prost(message, optional, tag = "2")]
    pub browser: Option<Device>,
}

impl Pblite for RevokeRelayPairingRequest {
    const NAME: &'static str = "authentication.RevokeRelayPairingRequest";

    fn encode_fields(&self, enc: &mut Encoder) {
        enc.message_opt(1, self.auth_message.as_ref());
        enc.message_opt(2, self.browser.as_ref());
    }

    fn decode_fields(dec: &Decoder<'_>) -> Result<Self, DecodeError> {
        Ok(Self {
            auth_message: dec.message(1)?,
            browser: dec.message(2)?,
        })
    }
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct RevokeRelayPairingResponse {}

impl Pblite for RevokeRelayPairingResponse {
    const NAME: &'static str = "authentication.RevokeRelayPairingResponse";

    fn encode_fields(&self, _enc: &mut Encoder) {}

    fn decode_fields(_dec: &Decoder<'_>) -> Result<Self, DecodeError> {
        Ok(Self {})
    }
}

/// Payload of the pairing QR code.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct UrlData {
    #[prost(bytes = "vec", tag = "1")]
    pub pairing_key: Vec<u8>,
    #[prost(bytes = "vec", tag = "2")]
    pub aes_key: Vec<u8>,
    #[prost(bytes = "vec", tag = "3")]
    pub hmac_key: Vec<u8>,
}

impl Pblite for UrlData {
    const NAME: &'static str = "authentication.URLData";

    fn encode_fields(&self, enc: &mut Encoder) {
        enc.bytes(1, &self.pairing_key);
        enc.bytes(2, &self.aes_key);
        enc.bytes(3, &self.hmac_key);
    }

    fn decode_fields(dec: &Decoder<'_>) -> Result<Self, DecodeError> {
        Ok(Self {
            pairing_key: dec.bytes(1)?.unwrap_or_default(),
            aes_key: dec.bytes(2)?.unwrap_or_default(),
            hmac_key: dec.bytes(3)?.unwrap_or_default(),
        })
    }
}

/// Web-push registration parameters, sent along with token refreshes when
/// push keys exist.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct WebPushParams {
    #[prost(string, tag = "1")]
    pub endpoint: String,
    #[prost(bytes = "vec", tag = "2")]
    pub p256dh: Vec<u8>,
    #[prost(bytes = "vec", tag = "3")]
    pub auth: Vec<u8>,
}

impl Pblite for WebPushParams {
    const NAME: &'static str = "authentication.WebPushParams";

    fn encode_fields(&self, enc: &mut Encoder) {
        enc.string(1, &self.endpoint);
        enc.bytes(2, &self.p256dh);
        enc.bytes(3, &self.auth);
    }

    fn decode_fields(dec: &Decoder<'_>) -> Result<Self, DecodeError> {
        Ok(Self {
            endpoint: dec.string(1)?.unwrap_or_default(),
            p256dh: dec.bytes(2)?.unwrap_or_default(),
            auth: dec.bytes(3)?.unwrap_or_default(),
        })
    }
}

/// Periodic token refresh, signed with the refresh key.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct RegisterRefreshRequest {
    #[prost(string, tag = "1")]
    pub request_id: String,
    #[prost(int64, tag = "2")]
    pub timestamp_micros: i64,
    #[prost(bytes = "vec", tag = "3")]
    pub tachyon_auth_token: Vec<u8>,
    /// DER ECDSA-SHA256 signature over `"<requestID>:<timestamp>"`.
    #[prost(bytes = "vec", tag = "4")]
    pub signature: Vec<u8>,
    #[prost(message, optional, tag = "5")]
    pub push: Option<WebPushParams>,
}

impl Pblite for RegisterRefreshRequest {
    const NAME: &'static str = "authentication.RegisterRefreshRequest";

    fn encode_fields(&self, enc: &mut Encoder) {
        enc.string(1, &self.request_id);
        enc.int64(2, self.timestamp_micros);
        enc.bytes(3, &self.tachyon_auth_token);
        enc.bytes(4, &self.signature);
        enc.message_opt(5, self.push.as_ref());
    }

    fn decode_fields(dec: &Decoder<'_>) -> Result<Self, DecodeError> {
        Ok(Self {
            request_id: dec.string(1)?.unwrap_or_default(),
            timestamp_micros: dec.int64(2)?.unwrap_or_default(),
            tachyon_auth_token: dec.bytes(3)?.unwrap_or_default(),
            signature: dec.bytes(4)?.unwrap_or_default(),
            push: dec.message(5)?,
        })
    }
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct RegisterRefreshResponse {
    #[prost(message, optional, tag = "2")]
    pub token_data: Option<TokenData>,
}

impl Pblite for RegisterRefreshResponse {
    const NAME: &'static str = "authentication.RegisterRefreshResponse";

    fn encode_fields(&self, enc: &mut Encoder) {
        enc.message_opt(2, self.token_data.as_ref());
    }

    fn decode_fields(dec: &Decoder<'_>) -> Result<Self, DecodeError> {
        Ok(Self {
            token_data: dec.message(2)?,
        })
    }
}

/// Google-account sign-in (Gaia mode).
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct SignInGaiaRequest {
    #[prost(message, optional, tag = "1")]
    pub auth_message: Option<AuthMessage>,
    #[prost(message, optional, tag = "2")]
    pub inner: Option<SignInGaiaInner>,
    #[prost(string, tag = "3")]
    pub network: String,
    #[prost(message, optional, tag = "5")]
    pub config_version: Option<ConfigVersion>,
}

impl Pblite for SignInGaiaRequest {
    const NAME: &'static str = "authentication.SignInGaiaRequest";

    fn encode_fields(&self, enc: &mut Encoder) {
        enc.message_opt(1, self.auth_message.as_ref());
        enc.message_opt(2, self.inner.as_ref());
        enc.string(3, &self.network);
        enc.message_opt(5, self.config_version.as_ref());
    }

    fn decode_fields(dec: &Decoder<'_>) -> Result<Self, DecodeError> {
        Ok(Self {
            auth_message: dec.message(1)?,
            inner: dec.message(2)?,
            network: dec.string(3)?.unwrap_or_default(),
            config_version: dec.message(5)?,
        })
    }
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct SignInGaiaInner {
    #[prost(message, optional, tag = "1")]
    pub device_id: Option<SignInGaiaDeviceId>,
    /// Field 36 is a binary-override field: it travels as base64 protobuf
    /// inside the pblite array.
    #[prost(message, optional, tag = "36")]
    pub some_data: Option<SignInGaiaInnerData>,
}

impl Pblite for SignInGaiaInner {
    const NAME: &'static str = "authentication.SignInGaiaRequest.Inner";

    fn encode_fields(&self, enc: &mut Encoder) {
        enc.message_opt(1, self.device_id.as_ref());
        enc.message_opt(36, self.some_data.as_ref());
    }

    fn decode_fields(dec: &Decoder<'_>) -> Result<Self, DecodeError> {
        Ok(Self {
            device_id: dec.message(1)?,
            some_data: dec.message(36)?,
        })
    }
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct SignInGaiaDeviceId {
    #[prost(int32, tag = "1")]
    pub unknown_int: i32,
    #[prost(string, tag = "2")]
    pub device_id: String,
}

impl Pblite for SignInGaiaDeviceId {
    const NAME: &'static str = "authentication.SignInGaiaRequest.Inner.DeviceID";

    fn encode_fields(&self, enc: &mut Encoder) {
        enc.int32(1, self.unknown_int);
        enc.string(2, &self.device_id);
    }

    fn decode_fields(dec: &Decoder<'_>) -> Result<Self, DecodeError> {
        Ok(Self {
            unknown_int: dec.int32(1)?.unwrap_or_default(),
            device_id: dec.string(2)?.unwrap_or_default(),
        })
    }
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct SignInGaiaInnerData {
    #[prost(bytes = "vec", tag = "3")]
    pub some_data: Vec<u8>,
}

impl Pblite for SignInGaiaInnerData {
    const NAME: &'static str = "authentication.SignInGaiaRequest.Inner.Data";

    fn encode_fields(&self, enc: &mut Encoder) {
        enc.bytes(3, &self.some_data);
    }

    fn decode_fields(dec: &Decoder<'_>) -> Result<Self, DecodeError> {
        Ok(Self {
            some_data: dec.bytes(3)?.unwrap_or_default(),
        })
    }
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct SignInGaiaResponse {
    /// Browser registration UUID. Binary-override field 2.
    #[prost(string, tag = "2")]
    pub browser_uuid: String,
    #[prost(message, optional, tag = "3")]
    pub device_data: Option<SignInGaiaDeviceData>,
    #[prost(message, optional, tag = "4")]
    pub token_data: Option<TokenData>,
}

impl Pblite for SignInGaiaResponse {
    const NAME: &'static str = "authentication.SignInGaiaResponse";

    fn encode_fields(&self, enc: &mut Encoder) {
        enc.string(2, &self.browser_uuid);
        enc.message_opt(3, self.device_data.as_ref());
        enc.message_opt(4, self.token_data.as_ref());
    }

    fn decode_fields(dec: &Decoder<'_>) -> Result<Self, DecodeError> {
        Ok(Self {
            browser_uuid: dec.string(2)?.unwrap_or_default(),
            device_data: dec.message(3)?,
            token_data: dec.message(4)?,
        })
    }
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct SignInGaiaDeviceData {
    #[prost(message, optional, tag = "1")]
    pub mobile: Option<Device>,
    /// Every phone registered on the account; the client picks one as the
    /// destination.
    #[prost(message, repeated, tag = "2")]
    pub registered: Vec<Device>,
}

impl Pblite for SignInGaiaDeviceData {
    const NAME: &'static str = "authentication.SignInGaiaResponse.DeviceData";

    fn encode_fields(&self, enc: &mut Encoder) {
        enc.message_opt(1, self.mobile.as_ref());
        enc.repeated_message(2, &self.registered);
    }

    fn decode_fields(dec: &Decoder<'_>) -> Result<Self, DecodeError> {
        Ok(Self {
            mobile: dec.message(1)?,
            registered: dec.repeated_message(2)?,
        })
    }
}

/// Server-pushed Gaia pairing data.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct RpcGaiaData {
    #[prost(int32, tag = "1")]
    pub command: i32,
    #[prost(message, optional, tag = "2")]
    pub maybe_server_data: Option<GaiaUnknownContainer>,
}

impl Pblite for RpcGaiaData {
    const NAME: &'static str = "authentication.RPCGaiaData";

    fn encode_fields(&self, enc: &mut Encoder) {
        enc.int32(1, self.command);
        enc.message_opt(2, self.maybe_server_data.as_ref());
    }

    fn decode_fields(dec: &Decoder<'_>) -> Result<Self, DecodeError> {
        Ok(Self {
            command: dec.int32(1)?.unwrap_or_default(),
            maybe_server_data: dec.message(2)?,
        })
    }
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct GaiaUnknownContainer {
    #[prost(message, optional, tag = "2")]
    pub item2: Option<GaiaContainerItem2>,
    #[prost(message, optional, tag = "4")]
    pub item4: Option<GaiaContainerItem4>,
}

impl Pblite for GaiaUnknownContainer {
    const NAME: &'static str = "authentication.RPCGaiaData.UnknownContainer";

    fn encode_fields(&self, enc: &mut Encoder) {
        enc.message_opt(2, self.item2.as_ref());
        enc.message_opt(4, self.item4.as_ref());
    }

    fn decode_fields(dec: &Decoder<'_>) -> Result<Self, DecodeError> {
        Ok(Self {
            item2: dec.message(2)?,
            item4: dec.message(4)?,
        })
    }
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct GaiaContainerItem2 {
    #[prost(message, repeated, tag = "1")]
    pub item1: Vec<GaiaContainerItem2Item1>,
}

impl Pblite for GaiaContainerItem2 {
    const NAME: &'static str = "authentication.RPCGaiaData.UnknownContainer.Item2";

    fn encode_fields(&self, enc: &mut Encoder) {
        enc.repeated_message(1, &self.item1);
    }

    fn decode_fields(dec: &Decoder<'_>) -> Result<Self, DecodeError> {
        Ok(Self {
            item1: dec.repeated_message(1)?,
        })
    }
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct GaiaContainerItem2Item1 {
    /// Destination or source registration UUID. Binary-override field 1.
    #[prost(string, tag = "1")]
    pub dest_or_source_uuid: String,
}

impl Pblite for GaiaContainerItem2Item1 {
    const NAME: &'static str = "authentication.RPCGaiaData.UnknownContainer.Item2.Item1";

    fn encode_fields(&self, enc: &mut Encoder) {
        enc.string(1, &self.dest_or_source_uuid);
    }

    fn decode_fields(dec: &Decoder<'_>) -> Result<Self, DecodeError> {
        Ok(Self {
            dest_or_source_uuid: dec.string(1)?.unwrap_or_default(),
        })
    }
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct GaiaContainerItem4 {
    /// Destination registration UUID. Binary-override field 1.
    #[prost(string, tag = "1")]
    pub dest_reg_uuid: String,
    #[prost(int32, tag = "3")]
    pub unknown_int: i32,
    /// Related registration UUID. Binary-override field 8.
    #[prost(string, tag = "8")]
    pub reg_uuid_related: String,
}

impl Pblite for GaiaContainerItem4 {
    const NAME: &'static str = "authentication.RPCGaiaData.UnknownContainer.Item4";

    fn encode_fields(&self, enc: &mut Encoder) {
        enc.string(1, &self.dest_reg_uuid);
        enc.int32(3, self.unknown_int);
        enc.string(8, &self.reg_uuid_related);
    }

    fn decode_fields(dec: &Decoder<'_>) -> Result<Self, DecodeError> {
        Ok(Self {
            dest_reg_uuid: dec.string(1)?.unwrap_or_default(),
            unknown_int: dec.int32(3)?.unwrap_or_default(),
            reg_uuid_related: dec.string(8)?.unwrap_or_default(),
        })
    }
}

/// Inner payload of a pair-event envelope.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct PairEventData {
    #[prost(message, optional, tag = "4")]
    pub paired: Option<PairedData>,
    #[prost(message, optional, tag = "5")]
    pub revoked: Option<RevokePairData>,
}

impl Pblite for PairEventData {
    const NAME: &'static str = "authentication.PairEventData";

    fn encode_fields(&self, enc: &mut Encoder) {
        enc.message_opt(4, self.paired.as_ref());
        enc.message_opt(5, self.revoked.as_ref());
    }

    fn decode_fields(dec: &Decoder<'_>) -> Result<Self, DecodeError> {
        Ok(Self {
            paired: dec.message(4)?,
            revoked: dec.message(5)?,
        })
    }
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct PairedData {
    #[prost(message, optional, tag = "1")]
    pub mobile: Option<Device>,
    #[prost(message, optional, tag = "2")]
    pub browser: Option<Device>,
    #[prost(message, optional, tag = "3")]
    pub token_data: Option<TokenData>,
}

impl Pblite for PairedData {
    const NAME: &'static str = "authentication.PairedData";

    fn encode_fields(&self, enc: &mut Encoder) {
        enc.message_opt(1, self.mobile.as_ref());
        enc.message_opt(2, self.browser.as_ref());
        enc.message_opt(3, self.token_data.as_ref());
    }

    fn decode_fields(dec: &Decoder<'_>) -> Result<Self, DecodeError> {
        Ok(Self {
            mobile: dec.message(1)?,
            browser: dec.message(2)?,
            token_data: dec.message(3)?,
        })
    }
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct RevokePairData {
    #[prost(message, optional, tag = "1")]
    pub revoked_device: Option<Device>,
}

impl Pblite for RevokePairData {
    const NAME: &'static str = "authentication.RevokePairData";

    fn encode_fields(&self, enc: &mut Encoder) {
        enc.message_opt(1, self.revoked_device.as_ref());
    }

    fn decode_fields(dec: &Decoder<'_>) -> Result<Self, DecodeError> {
        Ok(Self {
            revoked_device: dec.message(1)?,
        })
    }
}
