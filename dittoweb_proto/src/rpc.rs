//! `rpc` package: envelope types carried on the long-poll stream and the
//! send endpoint.

use dittoweb_pblite::{DecodeError, Decoder, Encoder, Pblite};

use crate::authentication::{AuthMessage, ConfigVersion, Device};

/// Routing class of an envelope.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
#[repr(i32)]
pub enum BugleRoute {
    UnknownBugleRoute = 0,
    PairEvent = 6,
    GaiaEvent = 7,
    DataEvent = 19,
}

/// The RPC an envelope's inner payload invokes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
#[repr(i32)]
pub enum ActionType {
    Unspecified = 0,
    ListConversations = 1,
    NotifyDittoActivity = 3,
    SendMessage = 5,
    MessageRead = 7,
    GetConversation = 9,
    GetUpdates = 19,
    IsBugleDefault = 31,
    CreateGaiaPairing = 58,
    CreateGaiaPairingClientInit = 60,
    CreateGaiaPairingClientFinished = 61,
}

impl ActionType {
    /// Whether this action belongs to the Gaia pairing exchange.
    #[must_use]
    pub const fn is_gaia_pairing(self) -> bool {
        matches!(
            self,
            Self::CreateGaiaPairingClientInit | Self::CreateGaiaPairingClientFinished
        )
    }
}

/// Wrapper kind carried alongside the route.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
#[repr(i32)]
pub enum MessageType {
    UnknownMessageType = 0,
    BugleMessage = 2,
    Gaia2 = 14,
    BugleAnnotation = 16,
}

/// The wrapper kind an action travels under.
///
/// All Gaia pairing actions use `GAIA2` except client-finished, which uses
/// `BUGLE_MESSAGE`; the first conversation fetch uses `BUGLE_ANNOTATION`.
#[must_use]
pub fn message_type_for_action(action: ActionType) -> MessageType {
    match action {
        ActionType::CreateGaiaPairing | ActionType::CreateGaiaPairingClientInit => {
            MessageType::Gaia2
        }
        ActionType::ListConversations => MessageType::BugleAnnotation,
        _ => MessageType::BugleMessage,
    }
}

/// Inner payload of an RPC in either direction.
///
/// Exactly one of `unencrypted_proto_data`, `encrypted_proto_data`, or
/// (incoming only) `encrypted_proto_data2` is populated.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct RpcMessageData {
    #[prost(string, tag = "1")]
    pub request_id: String,
    #[prost(enumeration = "ActionType", tag = "3")]
    pub action: i32,
    #[prost(bytes = "vec", tag = "5")]
    pub unencrypted_proto_data: Vec<u8>,
    #[prost(bytes = "vec", tag = "6")]
    pub encrypted_proto_data: Vec<u8>,
    #[prost(bytes = "vec", tag = "8")]
    pub encrypted_proto_data2: Vec<u8>,
    #[prost(string, tag = "11")]
    pub session_id: String,
}

impl Pblite for RpcMessageData {
    const NAME: &'static str = "rpc.RPCMessageData";

    fn encode_fields(&self, enc: &mut Encoder) {
        enc.string(1, &self.request_id);
        enc.enumeration(3, self.action);
        enc.bytes(5, &self.unencrypted_proto_data);
        enc.bytes(6, &self.encrypted_proto_data);
        enc.bytes(8, &self.encrypted_proto_data2);
        enc.string(11, &self.session_id);
    }

    fn decode_fields(dec: &Decoder<'_>) -> Result<Self, DecodeError> {
        Ok(Self {
            request_id: dec.string(1)?.unwrap_or_default(),
            action: dec.enumeration(3)?.unwrap_or_default(),
            unencrypted_proto_data: dec.bytes(5)?.unwrap_or_default(),
            encrypted_proto_data: dec.bytes(6)?.unwrap_or_default(),
            encrypted_proto_data2: dec.bytes(8)?.unwrap_or_default(),
            session_id: dec.string(11)?.unwrap_or_default(),
        })
    }
}

/// Outgoing envelope posted to the send endpoint.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct OutgoingRpcMessage {
    #[prost(message, optional, tag = "1")]
    pub mobile: Option<Device>,
    #[prost(message, optional, tag = "2")]
    pub data: Option<OutgoingRpcData>,
    #[prost(message, optional, tag = "3")]
    pub auth: Option<OutgoingRpcAuth>,
    /// Time to live in microseconds; suppressed when the caller omits TTL.
    #[prost(int64, tag = "5")]
    pub ttl_micros: i64,
    #[prost(string, repeated, tag = "7")]
    pub dest_registration_ids: Vec<String>,
    /// Pairing attempt id carried during Gaia pairing. Binary-override
    /// field 9.
    #[prost(string, tag = "9")]
    pub pairing_attempt_id: String,
}

impl Pblite for OutgoingRpcMessage {
    const NAME: &'static str = "rpc.OutgoingRPCMessage";

    fn encode_fields(&self, enc: &mut Encoder) {
        enc.message_opt(1, self.mobile.as_ref());
        enc.message_opt(2, self.data.as_ref());
        enc.message_opt(3, self.auth.as_ref());
        enc.int64(5, self.ttl_micros);
        enc.repeated_string(7, &self.dest_registration_ids);
        enc.string(9, &self.pairing_attempt_id);
    }

    fn decode_fields(dec: &Decoder<'_>) -> Result<Self, DecodeError> {
        Ok(Self {
            mobile: dec.message(1)?,
            data: dec.message(2)?,
            auth: dec.message(3)?,
            ttl_micros: dec.int64(5)?.unwrap_or_default(),
            dest_registration_ids: dec.repeated_string(7)?,
            pairing_attempt_id: dec.string(9)?.unwrap_or_default(),
        })
    }
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct OutgoingRpcData {
    #[prost(string, tag = "1")]
    pub request_id: String,
    #[prost(enumeration = "BugleRoute", tag = "2")]
    pub bugle_route: i32,
    /// Serialized [`RpcMessageData`].
    #[prost(bytes = "vec", tag = "3")]
    pub message_data: Vec<u8>,
    #[prost(enumeration = "MessageType", tag = "5")]
    pub message_type: i32,
}

impl Pblite for OutgoingRpcData {
    const NAME: &'static str = "rpc.OutgoingRPCMessage.Data";

    fn encode_fields(&self, enc: &mut Encoder) {
        enc.string(1, &self.request_id);
        enc.enumeration(2, self.bugle_route);
        enc.bytes(3, &self.message_data);
        enc.enumeration(5, self.message_type);
    }

    fn decode_fields(dec: &Decoder<'_>) -> Result<Self, DecodeError> {
        Ok(Self {
            request_id: dec.string(1)?.unwrap_or_default(),
            bugle_route: dec.enumeration(2)?.unwrap_or_default(),
            message_data: dec.bytes(3)?.unwrap_or_default(),
            message_type: dec.enumeration(5)?.unwrap_or_default(),
        })
    }
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct OutgoingRpcAuth {
    #[prost(string, tag = "1")]
    pub request_id: String,
    #[prost(bytes = "vec", tag = "6")]
    pub tachyon_auth_token: Vec<u8>,
    #[prost(message, optional, tag = "7")]
    pub config_version: Option<ConfigVersion>,
}

impl Pblite for OutgoingRpcAuth {
    const NAME: &'static str = "rpc.OutgoingRPCMessage.Auth";

    fn encode_fields(&self, enc: &mut Encoder) {
        enc.string(1, &self.request_id);
        enc.bytes(6, &self.tachyon_auth_token);
        enc.message_opt(7, self.config_version.as_ref());
    }

    fn decode_fields(dec: &Decoder<'_>) -> Result<Self, DecodeError> {
        Ok(Self {
            request_id: dec.string(1)?.unwrap_or_default(),
            tachyon_auth_token: dec.bytes(6)?.unwrap_or_default(),
            config_version: dec.message(7)?,
        })
    }
}

/// Incoming envelope delivered on the long-poll stream.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct IncomingRpcMessage {
    #[prost(string, tag = "1")]
    pub response_id: String,
    #[prost(enumeration = "BugleRoute", tag = "2")]
    pub bugle_route: i32,
    #[prost(enumeration = "MessageType", tag = "5")]
    pub message_type: i32,
    #[prost(int64, tag = "8")]
    pub timestamp_micros: i64,
    /// Waiters are matched against this field, not a distinct response id.
    #[prost(string, tag = "9")]
    pub session_id: String,
    /// Serialized inner message; [`RpcMessageData`] on the data route,
    /// [`PairEventData`](crate::authentication::PairEventData) on the pair
    /// route.
    #[prost(bytes = "vec", tag = "12")]
    pub message_data: Vec<u8>,
}

impl Pblite for IncomingRpcMessage {
    const NAME: &'static str = "rpc.IncomingRPCMessage";

    fn encode_fields(&self, enc: &mut Encoder) {
        enc.string(1, &self.response_id);
        enc.enumeration(2, self.bugle_route);
        enc.enumeration(5, self.message_type);
        enc.int64(8, self.timestamp_micros);
        enc.string(9, &self.session_id);
        enc.bytes(12, &self.message_data);
    }

    fn decode_fields(dec: &Decoder<'_>) -> Result<Self, DecodeError> {
        Ok(Self {
            response_id: dec.string(1)?.unwrap_or_default(),
            bugle_route: dec.enumeration(2)?.unwrap_or_default(),
            message_type: dec.enumeration(5)?.unwrap_or_default(),
            timestamp_micros: dec.int64(8)?.unwrap_or_default(),
            session_id: dec.string(9)?.unwrap_or_default(),
            message_data: dec.bytes(12)?.unwrap_or_default(),
        })
    }
}

/// One element of the long-poll stream. Exactly one variant is populated.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct LongPollingPayload {
    #[prost(message, optional, tag = "1")]
    pub data: Option<IncomingRpcMessage>,
    #[prost(message, optional, tag = "2")]
    pub heartbeat: Option<Heartbeat>,
    #[prost(message, optional, tag = "3")]
    pub start_read: Option<StartRead>,
    #[prost(message, optional, tag = "4")]
    pub ack: Option<StreamAck>,
}

impl Pblite for LongPollingPayload {
    const NAME: &'static str = "rpc.LongPollingPayload";

    fn encode_fields(&self, enc: &mut Encoder) {
        enc.message_opt(1, self.data.as_ref());
        enc.message_opt(2, self.heartbeat.as_ref());
        enc.message_opt(3, self.start_read.as_ref());
        enc.message_opt(4, self.ack.as_ref());
    }

    fn decode_fields(dec: &Decoder<'_>) -> Result<Self, DecodeError> {
        Ok(Self {
            data: dec.message(1)?,
            heartbeat: dec.message(2)?,
            start_read: dec.message(3)?,
            ack: dec.message(4)?,
        })
    }
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Heartbeat {}

impl Pblite for Heartbeat {
    const NAME: &'static str = "rpc.LongPollingPayload.Heartbeat";

    fn encode_fields(&self, _enc: &mut Encoder) {}

    fn decode_fields(_dec: &Decoder<'_>) -> Result<Self, DecodeError> {
        Ok(Self {})
    }
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct StartRead {}

impl Pblite for StartRead {
    const NAME: &'static str = "rpc.LongPollingPayload.StartRead";

    fn encode_fields(&self, _enc: &mut Encoder) {}

    fn decode_fields(_dec: &Decoder<'_>) -> Result<Self, DecodeError> {
        Ok(Self {})
    }
}

/// Seeds the backlog skip counter at the top of a stream.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct StreamAck {
    #[prost(int32, tag = "1")]
    pub count: i32,
}

impl Pblite for StreamAck {
    const NAME: &'static str = "rpc.LongPollingPayload.Ack";

    fn encode_fields(&self, enc: &mut Encoder) {
        enc.int32(1, self.count);
    }

    fn decode_fields(dec: &Decoder<'_>) -> Result<Self, DecodeError> {
        Ok(Self {
            count: dec.int32(1)?.unwrap_or_default(),
        })
    }
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ReceiveMessagesRequest {
    #[prost(message, optional, tag = "1")]
    pub auth: Option<AuthMessage>,
}

impl Pblite for ReceiveMessagesRequest {
    const NAME: &'static str = "rpc.ReceiveMessagesRequest";

    fn encode_fields(&self, enc: &mut Encoder) {
        enc.message_opt(1, self.auth.as_ref());
    }

    fn decode_fields(dec: &Decoder<'_>) -> Result<Self, DecodeError> {
        Ok(Self {
            auth: dec.message(1)?,
        })
    }
}

/// At-least-once acknowledgement batch for received envelopes.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct AckMessageRequest {
    #[prost(message, optional, tag = "1")]
    pub auth: Option<AuthMessage>,
    #[prost(message, repeated, tag = "2")]
    pub acks: Vec<AckMessageEntry>,
}

impl Pblite for AckMessageRequest {
    const NAME: &'static str = "rpc.AckMessageRequest";

    fn encode_fields(&self, enc: &mut Encoder) {
        enc.message_opt(1, self.auth.as_ref());
        enc.repeated_message(2, &self.acks);
    }

    fn decode_fields(dec: &Decoder<'_>) -> Result<Self, DecodeError> {
        Ok(Self {
            auth: dec.message(1)?,
            acks: dec.repeated_message(2)?,
        })
    }
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct AckMessageEntry {
    #[prost(string, tag = "1")]
    pub request_id: String,
    #[prost(message, optional, tag = "2")]
    pub device: Option<Device>,
}

impl Pblite for AckMessageEntry {
    const NAME: &'static str = "rpc.AckMessageRequest.Message";

    fn encode_fields(&self, enc: &mut Encoder) {
        enc.string(1, &self.request_id);
        enc.message_opt(2, self.device.as_ref());
    }

    fn decode_fields(dec: &Decoder<'_>) -> Result<Self, DecodeError> {
        Ok(Self {
            request_id: dec.string(1)?.unwrap_or_default(),
            device: dec.message(2)?,
        })
    }
}
