//! Round-trip coverage for the pblite codec over real wire messages,
//! including the binary-field override table.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use dittoweb_pblite::{from_slice, from_value, to_value, to_vec};
use dittoweb_proto::authentication::{
    AuthMessage, ConfigVersion, Device, GaiaContainerItem4, SignInGaiaInner, SignInGaiaInnerData,
    SignInGaiaResponse, TokenData,
};
use dittoweb_proto::rpc::{
    ActionType, BugleRoute, IncomingRpcMessage, LongPollingPayload, MessageType,
    OutgoingRpcAuth, OutgoingRpcData, OutgoingRpcMessage, RpcMessageData, StreamAck,
};
use prost::Message as _;
use serde_json::json;

fn sample_outgoing() -> OutgoingRpcMessage {
    OutgoingRpcMessage {
        mobile: Some(Device {
            user_id: 7,
            source_id: "phone-1".into(),
            network: String::new(),
        }),
        data: Some(OutgoingRpcData {
            request_id: "11111111-2222-3333-4444-555555555555".into(),
            bugle_route: BugleRoute::DataEvent as i32,
            message_data: vec![1, 2, 3],
            message_type: MessageType::BugleMessage as i32,
        }),
        auth: Some(OutgoingRpcAuth {
            request_id: "11111111-2222-3333-4444-555555555555".into(),
            tachyon_auth_token: b"token".to_vec(),
            config_version: Some(ConfigVersion {
                year: 2024,
                month: 5,
                day: 8,
                v1: 4,
                v2: 6,
            }),
        }),
        ttl_micros: 86_400_000_000,
        dest_registration_ids: vec![],
        pairing_attempt_id: "attempt-42".into(),
    }
}

#[test]
fn outgoing_envelope_round_trips() {
    let msg = sample_outgoing();
    let bytes = to_vec(&msg);
    let back: OutgoingRpcMessage = from_slice(&bytes).expect("decode");
    assert_eq!(msg, back);
}

#[test]
fn outgoing_field_nine_is_base64_binary() {
    let value = to_value(&sample_outgoing());
    let slots = value.as_array().expect("array");
    let nine = slots[8].as_str().expect("string");
    assert_eq!(STANDARD.decode(nine).expect("base64"), b"attempt-42");
}

#[test]
fn gaia_inner_field_36_is_base64_protobuf() {
    let inner = SignInGaiaInner {
        device_id: None,
        some_data: Some(SignInGaiaInnerData {
            some_data: vec![9, 8, 7],
        }),
    };
    let value = to_value(&inner);
    let slots = value.as_array().expect("array");
    let encoded = slots[35].as_str().expect("override is a string");

    let raw = STANDARD.decode(encoded).expect("base64");
    let nested = SignInGaiaInnerData::decode(raw.as_slice()).expect("protobuf");
    assert_eq!(nested.some_data, vec![9, 8, 7]);

    let back: SignInGaiaInner = from_value(&value).expect("decode");
    assert_eq!(inner, back);
}

#[test]
fn gaia_response_field_two_round_trips_as_binary_string() {
    let resp = SignInGaiaResponse {
        browser_uuid: "b4dcafe0-0000-4000-8000-000000000000".into(),
        device_data: None,
        token_data: Some(TokenData {
            tachyon_auth_token: b"tok".to_vec(),
            ttl_micros: 1,
        }),
    };
    let value = to_value(&resp);
    let slots = value.as_array().expect("array");
    let two = slots[1].as_str().expect("string");
    assert_eq!(
        STANDARD.decode(two).expect("base64"),
        resp.browser_uuid.as_bytes()
    );

    let back: SignInGaiaResponse = from_value(&value).expect("decode");
    assert_eq!(resp, back);
}

#[test]
fn item4_fields_one_and_eight_are_binary() {
    let item = GaiaContainerItem4 {
        dest_reg_uuid: "dest".into(),
        unknown_int: 3,
        reg_uuid_related: "related".into(),
    };
    let value = to_value(&item);
    let slots = value.as_array().expect("array");
    assert_eq!(
        STANDARD.decode(slots[0].as_str().expect("str")).expect("b64"),
        b"dest"
    );
    assert_eq!(
        STANDARD.decode(slots[7].as_str().expect("str")).expect("b64"),
        b"related"
    );

    let back: GaiaContainerItem4 = from_value(&value).expect("decode");
    assert_eq!(item, back);
}

#[test]
fn long_polling_payload_round_trips() {
    let payload = LongPollingPayload {
        data: Some(IncomingRpcMessage {
            response_id: "resp-1".into(),
            bugle_route: BugleRoute::DataEvent as i32,
            message_type: MessageType::BugleMessage as i32,
            timestamp_micros: 1_700_000_000_000_000,
            session_id: "sess-1".into(),
            message_data: RpcMessageData {
                request_id: "req-1".into(),
                action: ActionType::GetUpdates as i32,
                unencrypted_proto_data: vec![],
                encrypted_proto_data: vec![0xAA; 4],
                encrypted_proto_data2: vec![],
                session_id: "sess-1".into(),
            }
            .encode_to_vec(),
        }),
        heartbeat: None,
        start_read: None,
        ack: None,
    };
    let bytes = to_vec(&payload);
    let back: LongPollingPayload = from_slice(&bytes).expect("decode");
    assert_eq!(payload, back);
}

#[test]
fn ack_payload_round_trips() {
    let payload = LongPollingPayload {
        ack: Some(StreamAck { count: 3 }),
        ..Default::default()
    };
    let value = to_value(&payload);
    assert_eq!(value, json!([null, null, null, [3]]));
    let back: LongPollingPayload = from_value(&value).expect("decode");
    assert_eq!(back.ack.expect("ack").count, 3);
}

#[test]
fn auth_message_trailing_absence_decodes_as_default() {
    let value = json!(["req-9"]);
    let msg: AuthMessage = from_value(&value).expect("decode");
    assert_eq!(msg.request_id, "req-9");
    assert!(msg.tachyon_auth_token.is_empty());
    assert!(msg.config_version.is_none());
}
