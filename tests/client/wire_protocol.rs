use bson;
use client::{bson_bytes, frame_bytes, push_i32, push_i64};
use mongowire::wire_protocol::flags::{OpDeleteFlags, OpInsertFlags, OpQueryFlags, OpReplyFlags,
                                      OpUpdateFlags};
use mongowire::wire_protocol::{Message, OpCode};
use mongowire::Error;
use std::io::Cursor;

fn assert_round_trip(message: &Message) {
    let frame = frame_bytes(message);
    assert_eq!(frame.len(), message.header().message_length as usize);
    let decoded = Message::scatter(&frame).unwrap();
    assert_eq!(&decoded, message);
}

#[test]
fn encode_op_query_ping() {
    let query = bson_bytes(&doc! { "ping": 1 });
    assert_eq!(query.len(), 15);

    let mut message =
        Message::new_query(OpQueryFlags::no_flags(), "admin.$cmd", 0, 1, &query, None).unwrap();
    message.header_mut().request_id = 7;

    let frame = frame_bytes(&message);

    let mut expected = Vec::new();
    push_i32(&mut expected, 54); // message_length
    push_i32(&mut expected, 7); // request_id
    push_i32(&mut expected, 0); // response_to
    push_i32(&mut expected, 2004); // OP_QUERY
    push_i32(&mut expected, 0); // flags
    expected.extend_from_slice(b"admin.$cmd\0");
    push_i32(&mut expected, 0); // number_to_skip
    push_i32(&mut expected, 1); // number_to_return
    expected.extend_from_slice(&query);

    assert_eq!(frame, expected);
}

#[test]
fn decode_op_reply_with_two_empty_documents() {
    let mut frame = Vec::new();
    push_i32(&mut frame, 46); // message_length
    push_i32(&mut frame, 3); // request_id
    push_i32(&mut frame, 7); // response_to
    push_i32(&mut frame, 1); // OP_REPLY
    push_i32(&mut frame, 0); // flags
    push_i64(&mut frame, 0); // cursor_id
    push_i32(&mut frame, 0); // starting_from
    push_i32(&mut frame, 2); // number_returned
    frame.extend_from_slice(&[5, 0, 0, 0, 0, 5, 0, 0, 0, 0]);

    let message = Message::scatter(&frame).unwrap();
    match message {
        Message::OpReply {
            header,
            flags,
            cursor_id,
            starting_from,
            number_returned,
            documents,
        } => {
            assert_eq!(header.op_code, OpCode::Reply);
            assert_eq!(header.response_to, 7);
            assert_eq!(flags, OpReplyFlags::no_flags());
            assert_eq!(cursor_id, 0);
            assert_eq!(starting_from, 0);
            assert_eq!(number_returned, 2);
            assert_eq!(documents.len(), 10);

            let mut reader = Cursor::new(documents);
            let first = bson::decode_document(&mut reader).unwrap();
            let second = bson::decode_document(&mut reader).unwrap();
            assert!(first.is_empty());
            assert!(second.is_empty());
            assert_eq!(reader.position(), 10);
        }
        other => panic!("Expected OP_REPLY, found {:?}", other),
    }
}

#[test]
fn round_trip_reply() {
    let documents = bson_bytes(&doc! { "a": 1 });
    let message = Message::new_reply(OpReplyFlags::AWAIT_CAPABLE, 42, 5, 1, &documents);
    assert_round_trip(&message);
}

#[test]
fn round_trip_msg() {
    let message = Message::new_msg("shutting down").unwrap();
    assert_round_trip(&message);
}

#[test]
fn round_trip_update() {
    let selector = bson_bytes(&doc! { "_id": 1 });
    let update = bson_bytes(&doc! { "$set": { "a": 2 } });
    let message =
        Message::new_update("test.things", OpUpdateFlags::UPSERT, &selector, &update).unwrap();
    assert_round_trip(&message);
}

#[test]
fn round_trip_insert() {
    let first = bson_bytes(&doc! { "a": 1 });
    let second = bson_bytes(&doc! { "b": 2 });
    let message = Message::new_insert(
        OpInsertFlags::CONTINUE_ON_ERROR,
        "test.things",
        vec![&first, &second],
    ).unwrap();
    assert_round_trip(&message);
}

#[test]
fn round_trip_query_without_fields() {
    let query = bson_bytes(&doc! { "a": 1 });
    let message =
        Message::new_query(OpQueryFlags::SLAVE_OK, "test.things", 2, 10, &query, None).unwrap();
    assert_round_trip(&message);

    let frame = frame_bytes(&message);
    match Message::scatter(&frame).unwrap() {
        Message::OpQuery {
            return_field_selector,
            ..
        } => assert!(return_field_selector.is_none()),
        other => panic!("Expected OP_QUERY, found {:?}", other),
    }
}

#[test]
fn round_trip_query_with_fields() {
    let query = bson_bytes(&doc! { "a": 1 });
    let fields = bson_bytes(&doc! { "a": 1, "_id": 0 });
    let message = Message::new_query(
        OpQueryFlags::no_flags(),
        "test.things",
        0,
        0,
        &query,
        Some(&fields),
    ).unwrap();
    assert_round_trip(&message);

    let frame = frame_bytes(&message);
    match Message::scatter(&frame).unwrap() {
        Message::OpQuery {
            return_field_selector,
            ..
        } => assert_eq!(return_field_selector, Some(&fields[..])),
        other => panic!("Expected OP_QUERY, found {:?}", other),
    }
}

#[test]
fn round_trip_get_more() {
    let message = Message::new_get_more("test.things", 100, 42).unwrap();
    assert_round_trip(&message);
}

#[test]
fn round_trip_delete() {
    let selector = bson_bytes(&doc! { "a": 1 });
    let message =
        Message::new_delete("test.things", OpDeleteFlags::SINGLE_REMOVE, &selector).unwrap();
    assert_round_trip(&message);
}

#[test]
fn round_trip_kill_cursors() {
    let message = Message::new_kill_cursors(vec![42, -7, 1 << 40]);
    assert_round_trip(&message);
}

#[test]
fn scatter_rejects_bad_document_length() {
    // An OP_QUERY whose query document claims only 3 bytes.
    let mut frame = Vec::new();
    push_i32(&mut frame, 0); // message_length, patched below
    push_i32(&mut frame, 1);
    push_i32(&mut frame, 0);
    push_i32(&mut frame, 2004);
    push_i32(&mut frame, 0); // flags
    frame.extend_from_slice(b"test.things\0");
    push_i32(&mut frame, 0); // number_to_skip
    push_i32(&mut frame, 1); // number_to_return
    push_i32(&mut frame, 3); // bad document length
    frame.push(0);
    patch_length(&mut frame);

    match Message::scatter(&frame) {
        Err(Error::DecodeError(_)) => {}
        other => panic!("Expected a decode error, found {:?}", other),
    }
}

#[test]
fn scatter_rejects_missing_nul() {
    let mut frame = Vec::new();
    push_i32(&mut frame, 0);
    push_i32(&mut frame, 1);
    push_i32(&mut frame, 0);
    push_i32(&mut frame, 2005); // OP_GETMORE
    push_i32(&mut frame, 0); // ZERO
    frame.extend_from_slice(b"test.things"); // no terminator
    patch_length(&mut frame);

    match Message::scatter(&frame) {
        Err(Error::DecodeError(_)) => {}
        other => panic!("Expected a decode error, found {:?}", other),
    }
}

#[test]
fn scatter_rejects_unknown_opcode() {
    let mut frame = Vec::new();
    push_i32(&mut frame, 16);
    push_i32(&mut frame, 1);
    push_i32(&mut frame, 0);
    push_i32(&mut frame, 9999);

    match Message::scatter(&frame) {
        Err(Error::DecodeError(_)) => {}
        other => panic!("Expected a decode error, found {:?}", other),
    }
}

#[test]
fn scatter_rejects_short_header() {
    match Message::scatter(&[1, 0, 0]) {
        Err(Error::DecodeError(_)) => {}
        other => panic!("Expected a decode error, found {:?}", other),
    }
}

#[test]
fn scatter_rejects_overlong_cursor_id_array() {
    let mut frame = Vec::new();
    push_i32(&mut frame, 0);
    push_i32(&mut frame, 1);
    push_i32(&mut frame, 0);
    push_i32(&mut frame, 2007); // OP_KILL_CURSORS
    push_i32(&mut frame, 0); // ZERO
    push_i32(&mut frame, 5); // claims five ids
    push_i64(&mut frame, 42); // carries one
    patch_length(&mut frame);

    match Message::scatter(&frame) {
        Err(Error::DecodeError(_)) => {}
        other => panic!("Expected a decode error, found {:?}", other),
    }
}

#[test]
fn constructors_reject_inconsistent_documents() {
    // Claims 6 bytes but carries 5.
    let bad = [6u8, 0, 0, 0, 0];
    match Message::new_query(OpQueryFlags::no_flags(), "test.things", 0, 1, &bad, None) {
        Err(Error::ArgumentError(_)) => {}
        other => panic!("Expected an argument error, found {:?}", other),
    }
}

#[test]
fn display_prints_one_line_per_field() {
    let query = bson_bytes(&doc! { "ping": 1 });
    let message =
        Message::new_query(OpQueryFlags::no_flags(), "admin.$cmd", 0, 1, &query, None).unwrap();

    let printed = format!("{}", message);
    assert!(printed.contains("message_length : 54"));
    assert!(printed.contains("op_code : OP_QUERY"));
    assert!(printed.contains("namespace : admin.$cmd"));
    assert!(printed.contains("query :"));
    assert!(printed.contains("ping"));
}

// Rewrites the message_length field once the frame is assembled.
fn patch_length(frame: &mut Vec<u8>) {
    let mut length = Vec::new();
    push_i32(&mut length, frame.len() as i32);
    frame[0..4].copy_from_slice(&length);
}
