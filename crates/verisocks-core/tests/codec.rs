//! Framing round-trip and pre-header-law properties, `spec.md` §8.

use std::io::Cursor;

use proptest::prelude::*;
use uuid::Uuid;
use verisocks_core::{decode_message, encode, encode_json, ContentType};

fn content_type_strategy() -> impl Strategy<Value = ContentType> {
    prop_oneof![
        Just(ContentType::Text),
        Just(ContentType::Json),
        Just(ContentType::Binary),
    ]
}

proptest! {
    /// Every frame's two-byte pre-header equals the byte length of the
    /// header JSON that immediately follows it.
    #[test]
    fn pre_header_declares_the_exact_header_length(
        payload in prop::collection::vec(any::<u8>(), 0..256),
        ct in content_type_strategy(),
    ) {
        let frame = encode(&payload, ct, None).unwrap();
        let declared = u16::from_be_bytes([frame[0], frame[1]]) as usize;
        prop_assert!(frame.len() >= 2 + declared);
        let header_bytes = &frame[2..2 + declared];
        let parsed: serde_json::Value = serde_json::from_slice(header_bytes).unwrap();
        prop_assert!(parsed.get("content-length").is_some());
    }

    /// Encoding then decoding an arbitrary binary payload returns the exact
    /// bytes, content-type and UUID that went in.
    #[test]
    fn binary_round_trips_exactly(
        payload in prop::collection::vec(any::<u8>(), 0..4096),
        uuid_present in any::<bool>(),
    ) {
        let id = uuid_present.then(Uuid::new_v4);
        let frame = encode(&payload, ContentType::Binary, id).unwrap();
        let mut cursor = Cursor::new(frame);
        let (msg, total) = decode_message(&mut cursor, 1 << 20).unwrap();
        prop_assert_eq!(total, payload.len());
        prop_assert_eq!(msg.payload, payload);
        prop_assert_eq!(msg.header.content_type, ContentType::Binary);
        prop_assert_eq!(msg.header.uuid, id);
    }

    /// Text frames carry a trailing NUL counted in `content-length`, so the
    /// declared length is always exactly one more than the payload length.
    #[test]
    fn text_frames_count_the_trailing_nul(payload in "[ -~]{0,64}") {
        let frame = encode(payload.as_bytes(), ContentType::Text, None).unwrap();
        let mut cursor = Cursor::new(frame);
        let (msg, total) = decode_message(&mut cursor, 1 << 16).unwrap();
        prop_assert_eq!(total, payload.len() + 1);
        prop_assert_eq!(&msg.payload[..payload.len()], payload.as_bytes());
        prop_assert_eq!(msg.payload[payload.len()], 0);
    }

    /// A JSON frame's decoded payload parses back to the same JSON value.
    #[test]
    fn json_round_trips_through_encode_json(
        a in any::<i32>(),
        b in "[a-z]{1,12}",
    ) {
        let original = serde_json::json!({"a": a, "b": b});
        let frame = encode_json(&original, None).unwrap();
        let mut cursor = Cursor::new(frame);
        let (msg, _) = decode_message(&mut cursor, 1 << 16).unwrap();
        let decoded = msg.json().unwrap();
        prop_assert_eq!(decoded, original);
    }
}

/// Pins the wire header's exact field set and order, `spec.md` §4.1/§6: a
/// JSON frame's header is `content-type`, `content-encoding`, then
/// `content-length`, then `uuid` if present.
#[test]
fn header_json_shape_for_a_json_frame() {
    let id = Uuid::parse_str("00000000-0000-0000-0000-000000000001").unwrap();
    let frame = encode_json(&serde_json::json!({"a": 1}), Some(id)).unwrap();
    let declared = u16::from_be_bytes([frame[0], frame[1]]) as usize;
    let header_json = std::str::from_utf8(&frame[2..2 + declared]).unwrap();
    insta::assert_snapshot!(header_json, @r#"{"content-type":"application/json","content-encoding":"UTF-8","content-length":7,"uuid":"00000000-0000-0000-0000-000000000001"}"#);
}
