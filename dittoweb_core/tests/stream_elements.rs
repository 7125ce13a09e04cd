//! Framer synchronization over realistic stream bodies.
//!
//! For any stream `[[ E1 , E2 , ... , En ]]` exactly n elements must be
//! parsed, in order, regardless of chunk boundaries; corrupting one
//! element's protobuf layer must never shift element boundaries.

use dittoweb_core::{Framer, FramerError};
use dittoweb_pblite::{from_value, to_value};
use dittoweb_proto::rpc::{
    BugleRoute, IncomingRpcMessage, LongPollingPayload, StreamAck,
};

fn payloads() -> Vec<LongPollingPayload> {
    vec![
        LongPollingPayload {
            ack: Some(StreamAck { count: 2 }),
            ..Default::default()
        },
        LongPollingPayload {
            heartbeat: Some(Default::default()),
            ..Default::default()
        },
        LongPollingPayload {
            data: Some(IncomingRpcMessage {
                response_id: "resp-1".into(),
                bugle_route: BugleRoute::DataEvent as i32,
                session_id: "sess-1".into(),
                message_data: vec![8, 1],
                ..Default::default()
            }),
            ..Default::default()
        },
        LongPollingPayload {
            data: Some(IncomingRpcMessage {
                response_id: "resp-2".into(),
                bugle_route: BugleRoute::DataEvent as i32,
                ..Default::default()
            }),
            ..Default::default()
        },
    ]
}

fn stream_body(payloads: &[LongPollingPayload]) -> Vec<u8> {
    let elements: Vec<String> = payloads
        .iter()
        .map(|payload| to_value(payload).to_string())
        .collect();
    format!("[{}]", elements.join(",")).into_bytes()
}

#[test]
fn all_elements_parse_in_order() {
    let payloads = payloads();
    let body = stream_body(&payloads);

    let mut framer = Framer::new();
    let values = framer.feed(&body).expect("feed");
    assert!(framer.is_done());
    assert_eq!(values.len(), payloads.len());

    for (value, expected) in values.iter().zip(&payloads) {
        let decoded: LongPollingPayload = from_value(value).expect("decode");
        assert_eq!(&decoded, expected);
    }
}

#[test]
fn chunk_boundaries_do_not_matter() {
    let payloads = payloads();
    let body = stream_body(&payloads);

    for chunk_size in [1, 2, 3, 5, 17, 64, body.len()] {
        let mut framer = Framer::new();
        let mut values = Vec::new();
        for chunk in body.chunks(chunk_size) {
            values.extend(framer.feed(chunk).expect("feed"));
        }
        assert_eq!(
            values.len(),
            payloads.len(),
            "chunk size {chunk_size} changed the element count"
        );
        assert!(framer.is_done());
    }
}

#[test]
fn a_corrupt_element_does_not_shift_boundaries() {
    let payloads = payloads();
    let mut elements: Vec<String> = payloads
        .iter()
        .map(|payload| to_value(payload).to_string())
        .collect();
    // Valid JSON that is not a decodable long-polling payload.
    elements[1] = "[\"garbage\", {\"not\": \"pblite\"}]".to_owned();
    let body = format!("[{}]", elements.join(",")).into_bytes();

    let mut framer = Framer::new();
    let values = framer.feed(&body).expect("feed");
    assert_eq!(values.len(), payloads.len());

    // The corrupt element fails at the codec layer only.
    assert!(from_value::<LongPollingPayload>(&values[1]).is_err());
    let after: LongPollingPayload = from_value(&values[2]).expect("decode");
    assert_eq!(
        after.data.expect("data").response_id,
        "resp-1",
        "element boundaries shifted after the corrupt element"
    );
}

#[test]
fn oversize_element_is_fatal() {
    let mut framer = Framer::new();
    framer.feed(b"[[").expect("prefix");
    let filler = vec![b'1'; 1024 * 1024];
    let mut result = Ok(Vec::new());
    for _ in 0..11 {
        result = framer.feed(&filler);
        if result.is_err() {
            break;
        }
    }
    assert_eq!(result.expect_err("oversize"), FramerError::ElementTooLarge);
}
