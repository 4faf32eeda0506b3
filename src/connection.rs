//! A connection speaking the legacy wire protocol: request-id assignment,
//! request/response matching, traffic counters and the synchronous server
//! command helpers.

use std::fmt;
use std::io;
use std::net::TcpStream;
use std::time::Duration;

use bson::{self, Bson};
use rand::os::OsRng;
use rand::{self, Rng};
use semver;
use separator::Separatable;
use time;

use cursor::Cursor;
use error::{ConnectionFailure, Error, Result};
use runtime;
use stream::Stream;
use wire_protocol::flags::{OpDeleteFlags, OpInsertFlags, OpQueryFlags, OpReplyFlags,
                           OpUpdateFlags};
use wire_protocol::header::Header;
use wire_protocol::operations::Message;
use wire_protocol::reader::Reader;
use wire_protocol::writer::Writer;

/// Byte and message counters kept per connection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConnectionStats {
    pub bytes_sent: u64,
    pub bytes_recv: u64,
    pub msg_sent: u64,
    pub msg_recv: u64,
}

impl fmt::Display for ConnectionStats {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        write!(
            fmt,
            "{} msgs / {} bytes sent, {} msgs / {} bytes received",
            self.msg_sent.separated_string(),
            self.bytes_sent.separated_string(),
            self.msg_recv.separated_string(),
            self.bytes_recv.separated_string()
        )
    }
}

/// An owned snapshot of an OP_REPLY, with the documents parsed. Borrowed
/// replies from `recv` stay available for proxy paths; command helpers
/// return this instead so the reply can outlive the read buffer.
#[derive(Debug, Clone)]
pub struct CommandReply {
    pub header: Header,
    pub flags: OpReplyFlags,
    pub cursor_id: i64,
    pub starting_from: i32,
    pub number_returned: i32,
    pub documents: Vec<bson::Document>,
}

impl CommandReply {
    fn from_message(message: &Message) -> Result<CommandReply> {
        match *message {
            Message::OpReply {
                header,
                flags,
                cursor_id,
                starting_from,
                number_returned,
                documents,
            } => {
                let mut parsed = Vec::new();
                let mut reader = io::Cursor::new(documents);
                while (reader.position() as usize) < documents.len() {
                    parsed.push(bson::decode_document(&mut reader)?);
                }
                Ok(CommandReply {
                    header: header,
                    flags: flags,
                    cursor_id: cursor_id,
                    starting_from: starting_from,
                    number_returned: number_returned,
                    documents: parsed,
                })
            }
            _ => Err(Error::ResponseError(format!(
                "Expected OP_REPLY but received {}.",
                message.header().op_code
            ))),
        }
    }

    /// Whether the first document carries a truthy `ok`.
    pub fn ok(&self) -> bool {
        self.documents
            .first()
            .and_then(|doc| doc.get("ok"))
            .map_or(false, bson_truthy)
    }
}

fn bson_truthy(value: &Bson) -> bool {
    match *value {
        Bson::Boolean(b) => b,
        Bson::I32(i) => i != 0,
        Bson::I64(i) => i != 0,
        Bson::FloatingPoint(f) => f != 0.0,
        Bson::Null => false,
        _ => true,
    }
}

fn seed_request_id() -> i32 {
    match OsRng::new() {
        Ok(mut rng) => rng.gen(),
        Err(_) => rand::random(),
    }
}

fn send_message<S: Stream>(
    stream: &mut S,
    writer: &mut Writer,
    assign_request_ids: bool,
    last_request_id: &mut i32,
    bytes_sent: &mut u64,
    msg_sent: &mut u64,
    message: &mut Message,
) -> Result<()> {
    if assign_request_ids {
        *last_request_id = last_request_id.wrapping_add(1);
        message.header_mut().request_id = *last_request_id;
    }

    let n = writer.write(stream, message)?;
    *bytes_sent += n as u64;
    *msg_sent += 1;
    Ok(())
}

/// An open connection. Owns the socket, the framed reader and writer, and
/// the request-id counter. A connection belongs to exactly one task;
/// sharing one across tasks is not supported.
pub struct Connection<S: Stream = TcpStream> {
    stream: S,
    reader: Reader,
    writer: Writer,
    peer: String,
    last_request_id: i32,
    assign_request_ids: bool,
    bytes_sent: u64,
    bytes_recv: u64,
    msg_sent: u64,
    msg_recv: u64,
}

/// The write half of a connection, handed to listener callbacks while the
/// decoded message still borrows the read buffer.
pub struct Responder<'a, S: Stream + 'a> {
    stream: &'a mut S,
    writer: &'a mut Writer,
    assign_request_ids: bool,
    last_request_id: &'a mut i32,
    bytes_sent: &'a mut u64,
    msg_sent: &'a mut u64,
    peer: &'a str,
}

impl<'a, S: Stream> Responder<'a, S> {
    /// Sends a message on the connection this responder was split from.
    pub fn send(&mut self, message: &mut Message) -> Result<()> {
        send_message(
            self.stream,
            self.writer,
            self.assign_request_ids,
            self.last_request_id,
            self.bytes_sent,
            self.msg_sent,
            message,
        )
    }

    /// The peer as `ip:port`.
    pub fn peer(&self) -> &str {
        self.peer
    }
}

impl Connection<TcpStream> {
    /// Resolves `host` and connects to the first address that accepts.
    pub fn connect(host: &str, port: u16) -> Result<Connection<TcpStream>> {
        let addrs = runtime::resolve(host, port)?;

        for addr in addrs {
            match TcpStream::connect(&addr) {
                Ok(stream) => {
                    info!("[{}] connection established", addr);
                    return Ok(Connection::new(stream));
                }
                Err(err) => {
                    debug!("connect to {} failed: {}", addr, err);
                }
            }
        }

        Err(Error::OperationError(format!(
            "Failed to connect to host '{}:{}'",
            host, port
        )))
    }
}

impl<S: Stream> Connection<S> {
    /// Wraps an already-connected stream. Sent messages get a fresh
    /// request id from a CSPRNG-seeded counter.
    pub fn new(stream: S) -> Connection<S> {
        Connection::with_mode(stream, true)
    }

    /// Wraps a stream for proxy forwarding: headers pass through without
    /// request-id rewriting.
    pub fn forwarding(stream: S) -> Connection<S> {
        Connection::with_mode(stream, false)
    }

    fn with_mode(stream: S, assign_request_ids: bool) -> Connection<S> {
        let peer = stream
            .peer_addr()
            .map(|addr| addr.to_string())
            .unwrap_or_else(|_| String::from("unknown"));

        Connection {
            stream: stream,
            reader: Reader::new(),
            writer: Writer::new(),
            peer: peer,
            last_request_id: seed_request_id(),
            assign_request_ids: assign_request_ids,
            bytes_sent: 0,
            bytes_recv: 0,
            msg_sent: 0,
            msg_recv: 0,
        }
    }

    /// Switches request-id rewriting off (or back on) after the fact.
    /// Prefer `forwarding` where the construction site is in hand; this
    /// exists for accepted sockets, which the listener constructs.
    pub fn set_raw_forwarding(&mut self, raw: bool) {
        self.assign_request_ids = !raw;
    }

    /// The peer as `ip:port`.
    pub fn peer(&self) -> &str {
        &self.peer
    }

    pub fn stats(&self) -> ConnectionStats {
        ConnectionStats {
            bytes_sent: self.bytes_sent,
            bytes_recv: self.bytes_recv,
            msg_sent: self.msg_sent,
            msg_recv: self.msg_recv,
        }
    }

    /// Applies `timeout` to every subsequent read and write.
    pub fn set_timeout(&mut self, timeout: Option<Duration>) -> Result<()> {
        self.stream.set_read_timeout(timeout)?;
        self.stream.set_write_timeout(timeout)?;
        Ok(())
    }

    /// Tears the socket down; any read or write blocked on it fails.
    pub fn shutdown(&self) -> Result<()> {
        self.stream.shutdown()?;
        Ok(())
    }

    /// Sends `message`, assigning the next request id unless the
    /// connection is in forwarding mode.
    pub fn send(&mut self, message: &mut Message) -> Result<()> {
        send_message(
            &mut self.stream,
            &mut self.writer,
            self.assign_request_ids,
            &mut self.last_request_id,
            &mut self.bytes_sent,
            &mut self.msg_sent,
            message,
        )
    }

    /// Receives the next message. The returned message borrows the read
    /// buffer and is invalidated by the next `recv`.
    pub fn recv(&mut self) -> Result<Message> {
        let message = self.reader.read(&mut self.stream)?;
        self.bytes_recv += message.header().message_length as u64;
        self.msg_recv += 1;
        Ok(message)
    }

    /// Receives one message and hands it to `handler` together with the
    /// write half of the connection, so the handler can answer while the
    /// message still borrows the read buffer. Returns the handler's
    /// verdict on whether to keep the connection open.
    pub fn process_message<F>(&mut self, handler: F) -> Result<bool>
    where
        F: FnOnce(&mut Responder<S>, &Message) -> bool,
    {
        let message = self.reader.read(&mut self.stream)?;
        self.bytes_recv += message.header().message_length as u64;
        self.msg_recv += 1;

        let mut responder = Responder {
            stream: &mut self.stream,
            writer: &mut self.writer,
            assign_request_ids: self.assign_request_ids,
            last_request_id: &mut self.last_request_id,
            bytes_sent: &mut self.bytes_sent,
            msg_sent: &mut self.msg_sent,
            peer: &self.peer,
        };

        Ok(handler(&mut responder, &message))
    }

    /// Runs a command document against `collection` and returns the
    /// matched reply. The reply must be an OP_REPLY answering the request
    /// id that was just assigned.
    pub fn command(&mut self, collection: &str, command: &bson::Document) -> Result<CommandReply> {
        let begin = time::precise_time_ns();

        let mut query = Vec::new();
        bson::encode_document(&mut query, command)?;
        let mut request =
            Message::new_query(OpQueryFlags::no_flags(), collection, 0, 1, &query, None)?;

        self.send(&mut request)?;
        let request_id = request.header().request_id;

        let reply = {
            let message = self.recv()?;
            CommandReply::from_message(&message)?
        };

        if reply.header.response_to != request_id {
            return Err(Error::ResponseError(format!(
                "Reply answers request {} but request {} was sent.",
                reply.header.response_to, request_id
            )));
        }

        debug!(
            "[{}] command on {} took {}us",
            self.peer,
            collection,
            (time::precise_time_ns() - begin) / 1000
        );

        Ok(reply)
    }

    pub fn ping(&mut self) -> Result<CommandReply> {
        self.command("admin.$cmd", &doc! { "ping": 1 })
    }

    pub fn is_master(&mut self) -> Result<CommandReply> {
        self.command("admin.$cmd", &doc! { "isMaster": 1 })
    }

    /// The server version string from `buildInfo`.
    pub fn server_version_string(&mut self) -> Result<String> {
        let reply = self.command("admin.$cmd", &doc! { "buildInfo": 1 })?;
        match reply.documents.first().and_then(|doc| doc.get("version")) {
            Some(&Bson::String(ref version)) => Ok(version.to_owned()),
            _ => Err(Error::ResponseError(String::from(
                "The buildInfo reply carried no version string.",
            ))),
        }
    }

    /// The server version, parsed.
    pub fn server_version(&mut self) -> Result<semver::Version> {
        let version = self.server_version_string()?;
        semver::Version::parse(&version).map_err(|err| {
            Error::ResponseError(format!(
                "Failed to parse server version '{}': {}",
                version, err
            ))
        })
    }

    /// The `(major, minor, micro, release)` tuple from
    /// `buildInfo.versionArray`.
    pub fn server_version_array(&mut self) -> Result<(i32, i32, i32, i32)> {
        let reply = self.command("admin.$cmd", &doc! { "buildInfo": 1 })?;
        let mut parts = [0i32; 4];

        match reply.documents.first().and_then(|doc| doc.get("versionArray")) {
            Some(&Bson::Array(ref array)) => {
                for (slot, value) in parts.iter_mut().zip(array.iter()) {
                    if let Bson::I32(i) = *value {
                        *slot = i;
                    }
                }
            }
            _ => {
                return Err(Error::ResponseError(String::from(
                    "The buildInfo reply carried no versionArray.",
                )))
            }
        }

        Ok((parts[0], parts[1], parts[2], parts[3]))
    }

    /// Starts a paged query over `collection`.
    pub fn query<'c>(
        &'c mut self,
        collection: &str,
        query: &bson::Document,
        fields: Option<&bson::Document>,
    ) -> Result<Cursor<'c, S>> {
        Cursor::new(self, collection, query, fields)
    }

    /// Sends an OP_INSERT for `documents`. Fire-and-forget; pair with
    /// `get_last_error` for confirmation.
    pub fn insert(
        &mut self,
        collection: &str,
        flags: OpInsertFlags,
        documents: &[bson::Document],
    ) -> Result<()> {
        let mut encoded = Vec::with_capacity(documents.len());
        for document in documents {
            let mut bytes = Vec::new();
            bson::encode_document(&mut bytes, document)?;
            encoded.push(bytes);
        }
        let slices: Vec<&[u8]> = encoded.iter().map(|bytes| &bytes[..]).collect();

        let mut request = Message::new_insert(flags, collection, slices)?;
        self.send(&mut request)
    }

    /// Sends an OP_UPDATE.
    pub fn update(
        &mut self,
        collection: &str,
        flags: OpUpdateFlags,
        selector: &bson::Document,
        update: &bson::Document,
    ) -> Result<()> {
        let mut selector_bytes = Vec::new();
        bson::encode_document(&mut selector_bytes, selector)?;
        let mut update_bytes = Vec::new();
        bson::encode_document(&mut update_bytes, update)?;

        let mut request = Message::new_update(collection, flags, &selector_bytes, &update_bytes)?;
        self.send(&mut request)
    }

    /// Sends an OP_DELETE.
    pub fn delete(
        &mut self,
        collection: &str,
        flags: OpDeleteFlags,
        selector: &bson::Document,
    ) -> Result<()> {
        let mut selector_bytes = Vec::new();
        bson::encode_document(&mut selector_bytes, selector)?;

        let mut request = Message::new_delete(collection, flags, &selector_bytes)?;
        self.send(&mut request)
    }

    /// Sends an OP_KILL_CURSORS for `cursor_ids`.
    pub fn kill_cursors(&mut self, cursor_ids: &[i64]) -> Result<()> {
        let mut request = Message::new_kill_cursors(cursor_ids.to_vec());
        self.send(&mut request)
    }

    /// Runs `getLastError` merged with the options in `gle` and maps the
    /// outcome onto the coded connection errors.
    pub fn get_last_error(&mut self, collection: &str, gle: &bson::Document) -> Result<()> {
        let mut command = doc! { "getLastError": 1 };
        for (key, value) in gle.iter() {
            if key.as_str() != "getLastError" {
                command.insert(key.to_owned(), value.clone());
            }
        }

        let mut query = Vec::new();
        bson::encode_document(&mut query, &command)?;
        let mut request =
            Message::new_query(OpQueryFlags::no_flags(), collection, 0, 1, &query, None)?;

        if self.send(&mut request).is_err() {
            return Err(Error::connection(
                ConnectionFailure::SendFailure,
                "Failed to send request.",
            ));
        }

        let (flags, first) = {
            let message = match self.recv() {
                Ok(message) => message,
                Err(_) => {
                    return Err(Error::connection(
                        ConnectionFailure::RecvFailure,
                        "Failed to recv request.",
                    ))
                }
            };
            match message {
                Message::OpReply {
                    flags, documents, ..
                } => (
                    flags,
                    bson::decode_document(&mut io::Cursor::new(documents)).ok(),
                ),
                _ => {
                    return Err(Error::connection(
                        ConnectionFailure::RecvFailure,
                        "Invalid reply message.",
                    ))
                }
            }
        };

        if flags.contains(OpReplyFlags::QUERY_FAILURE) {
            return Err(Error::connection(
                ConnectionFailure::QueryFailure,
                "The query failed.",
            ));
        }

        let document = match first {
            Some(document) => document,
            None => {
                return Err(Error::connection(
                    ConnectionFailure::RecvFailure,
                    "Invalid reply message.",
                ))
            }
        };

        if !document.get("ok").map_or(false, bson_truthy) {
            return Err(Error::connection(
                ConnectionFailure::QueryFailure,
                "The getlasterror returned failure.",
            ));
        }

        Ok(())
    }
}
