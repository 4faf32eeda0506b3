pub mod wire_protocol;

use std::io;
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::thread::{self, JoinHandle};

use bson;
use byteorder::{LittleEndian, WriteBytesExt};
use mongowire::wire_protocol::flags::OpReplyFlags;
use mongowire::wire_protocol::Message;
use mongowire::Connection;

/// Binds an ephemeral loopback port and runs `script` against the first
/// accepted connection. Join the returned handle so assertion failures in
/// the script fail the test.
pub fn spawn_server<F>(script: F) -> (SocketAddr, JoinHandle<()>)
where
    F: FnOnce(TcpStream) + Send + 'static,
{
    let _ = ::env_logger::try_init();
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    let handle = thread::spawn(move || {
        let (stream, _) = listener.accept().unwrap();
        script(stream);
    });
    (addr, handle)
}

pub fn bson_bytes(doc: &bson::Document) -> Vec<u8> {
    let mut bytes = Vec::new();
    bson::encode_document(&mut bytes, doc).unwrap();
    bytes
}

/// The complete frame a message gathers to.
pub fn frame_bytes(message: &Message) -> Vec<u8> {
    let mut frame = Vec::new();
    let payloads = message.gather(&mut frame);
    for payload in payloads {
        frame.extend_from_slice(payload);
    }
    frame
}

pub fn push_i32(buf: &mut Vec<u8>, value: i32) {
    buf.write_i32::<LittleEndian>(value).unwrap();
}

pub fn push_i64(buf: &mut Vec<u8>, value: i64) {
    buf.write_i64::<LittleEndian>(value).unwrap();
}

/// Server-side helper: receives one message and requires it to be an
/// OP_QUERY command, returning its request id and decoded query document.
pub fn expect_command(conn: &mut Connection<TcpStream>) -> (i32, bson::Document) {
    let (request_id, query_bytes) = {
        let message = conn.recv().unwrap();
        match message {
            Message::OpQuery { header, query, .. } => (header.request_id, query.to_vec()),
            other => panic!("Expected OP_QUERY, found {:?}", other),
        }
    };
    let document = bson::decode_document(&mut io::Cursor::new(&query_bytes[..])).unwrap();
    (request_id, document)
}

/// Server-side helper: sends an OP_REPLY carrying `documents`.
pub fn send_reply(
    conn: &mut Connection<TcpStream>,
    response_to: i32,
    flags: OpReplyFlags,
    cursor_id: i64,
    documents: &[bson::Document],
) {
    let mut bytes = Vec::new();
    for document in documents {
        bson::encode_document(&mut bytes, document).unwrap();
    }
    let mut reply = Message::new_reply(flags, cursor_id, 0, documents.len() as i32, &bytes);
    reply.header_mut().response_to = response_to;
    conn.send(&mut reply).unwrap();
}
