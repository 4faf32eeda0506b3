//! Scatter/gather codec for the legacy wire protocol operations.
//!
//! Every opcode body follows the same recipe: a declarative field order,
//! decoded left-to-right from a complete frame (`scatter`) and encoded as a
//! little-endian scalar prefix plus zero-copy payload slices (`gather`).
//! Decoded messages borrow the frame buffer they were scattered from and
//! are only valid until that buffer is reused.

use std::fmt;
use std::io;

use bson;
use byteorder::{ByteOrder, LittleEndian};
use data_encoding::HEXLOWER;

use error::{Error, Result};
use wire_protocol::flags::{OpDeleteFlags, OpInsertFlags, OpQueryFlags, OpReplyFlags,
                           OpUpdateFlags};
use wire_protocol::header::{Header, OpCode, HEADER_SIZE};

/// Frames larger than this are rejected outright; it matches the server's
/// maximum message size.
pub const MAX_MESSAGE_SIZE: i32 = 48 * 1000 * 1000;

/// The documents of an OP_INSERT: a vector of per-document buffers on the
/// send path, one contiguous region covering the rest of the frame on the
/// receive path. Equality compares the concatenated bytes, so a vectored
/// build equals its own re-decode.
#[derive(Debug, Clone)]
pub enum DocumentSet<'a> {
    Vectored(Vec<&'a [u8]>),
    Contiguous(&'a [u8]),
}

impl<'a> DocumentSet<'a> {
    pub fn byte_length(&self) -> i32 {
        match *self {
            DocumentSet::Vectored(ref docs) => docs.iter().map(|doc| doc.len() as i32).sum(),
            DocumentSet::Contiguous(bytes) => bytes.len() as i32,
        }
    }

    /// The buffers in frame order.
    pub fn as_slices(&self) -> Vec<&'a [u8]> {
        match *self {
            DocumentSet::Vectored(ref docs) => docs.clone(),
            DocumentSet::Contiguous(bytes) => vec![bytes],
        }
    }
}

impl<'a> PartialEq for DocumentSet<'a> {
    fn eq(&self, other: &DocumentSet<'a>) -> bool {
        if self.byte_length() != other.byte_length() {
            return false;
        }
        let lhs = self.as_slices();
        let rhs = other.as_slices();
        lhs.iter()
            .flat_map(|slice| slice.iter())
            .zip(rhs.iter().flat_map(|slice| slice.iter()))
            .all(|(a, b)| a == b)
    }
}

/// Represents a message in the legacy wire protocol.
#[derive(Debug, Clone, PartialEq)]
pub enum Message<'a> {
    OpReply {
        /// The message header.
        header: Header,
        /// A bit vector of reply options.
        flags: OpReplyFlags,
        /// Uniquely identifies the cursor being returned.
        cursor_id: i64,
        /// The starting position of the cursor.
        starting_from: i32,
        /// The total number of documents being returned.
        number_returned: i32,
        /// The returned documents, packed back to back to the end of the
        /// frame.
        documents: &'a [u8],
    },
    OpMsg {
        /// The message header.
        header: Header,
        /// A human-readable message from the server.
        message: &'a str,
    },
    OpUpdate {
        /// The message header.
        header: Header,
        // The wire protocol specifies that a 32-bit 0 field goes here
        /// The full qualified name of the collection, beginning with the
        /// database name and a dot separator.
        namespace: &'a str,
        /// A bit vector of update options.
        flags: OpUpdateFlags,
        /// Identifies the document(s) to be updated.
        selector: &'a [u8],
        /// Instruction document for how to update the document(s).
        update: &'a [u8],
    },
    OpInsert {
        /// The message header.
        header: Header,
        /// A bit vector of insert options.
        flags: OpInsertFlags,
        /// The full qualified name of the collection.
        namespace: &'a str,
        /// The documents to be inserted.
        documents: DocumentSet<'a>,
    },
    OpQuery {
        /// The message header.
        header: Header,
        /// A bit vector of query options.
        flags: OpQueryFlags,
        /// The full qualified name of the collection.
        namespace: &'a str,
        /// The number of initial documents to skip over in the results.
        number_to_skip: i32,
        /// The total number of documents that should be returned.
        number_to_return: i32,
        /// Specifies which documents to return.
        query: &'a [u8],
        /// An optional projection of which fields should be present in
        /// the returned documents. Present on the wire iff bytes remain
        /// after `query`.
        return_field_selector: Option<&'a [u8]>,
    },
    OpGetMore {
        /// The message header.
        header: Header,
        // The wire protocol specifies that a 32-bit 0 field goes here
        /// The full qualified name of the collection.
        namespace: &'a str,
        /// The total number of documents that should be returned.
        number_to_return: i32,
        /// Uniquely identifies the cursor being drained.
        cursor_id: i64,
    },
    OpDelete {
        /// The message header.
        header: Header,
        // The wire protocol specifies that a 32-bit 0 field goes here
        /// The full qualified name of the collection.
        namespace: &'a str,
        /// A bit vector of delete options.
        flags: OpDeleteFlags,
        /// Identifies the document(s) to be removed.
        selector: &'a [u8],
    },
    OpKillCursors {
        /// The message header.
        header: Header,
        // The wire protocol specifies that a 32-bit 0 field goes here
        /// The cursors to be closed by the server.
        cursor_ids: Vec<i64>,
    },
}

fn check_namespace(namespace: &str) -> Result<()> {
    if namespace.as_bytes().contains(&0) {
        return Err(Error::ArgumentError(String::from(
            "Collection namespaces may not contain NUL bytes.",
        )));
    }
    Ok(())
}

fn check_document(name: &str, bytes: &[u8]) -> Result<()> {
    if bytes.len() < 5 {
        return Err(Error::ArgumentError(format!(
            "The {} document must be at least 5 bytes long.",
            name
        )));
    }
    let embedded = LittleEndian::read_i32(&bytes[0..4]);
    if embedded as usize != bytes.len() {
        return Err(Error::ArgumentError(format!(
            "The {} document claims {} bytes but {} were supplied.",
            name,
            embedded,
            bytes.len()
        )));
    }
    Ok(())
}

impl<'a> Message<'a> {
    /// Constructs a new reply message.
    pub fn new_reply(
        flags: OpReplyFlags,
        cursor_id: i64,
        starting_from: i32,
        number_returned: i32,
        documents: &'a [u8],
    ) -> Message<'a> {
        let total_length = HEADER_SIZE + 4 + 8 + 4 + 4 + documents.len() as i32;

        Message::OpReply {
            header: Header::new(total_length, OpCode::Reply),
            flags: flags,
            cursor_id: cursor_id,
            starting_from: starting_from,
            number_returned: number_returned,
            documents: documents,
        }
    }

    /// Constructs a new server log message.
    pub fn new_msg(message: &'a str) -> Result<Message<'a>> {
        if message.as_bytes().contains(&0) {
            return Err(Error::ArgumentError(String::from(
                "OP_MSG text may not contain NUL bytes.",
            )));
        }

        let total_length = HEADER_SIZE + message.len() as i32 + 1;

        Ok(Message::OpMsg {
            header: Header::new(total_length, OpCode::Msg),
            message: message,
        })
    }

    /// Constructs a new message for an update.
    pub fn new_update(
        namespace: &'a str,
        flags: OpUpdateFlags,
        selector: &'a [u8],
        update: &'a [u8],
    ) -> Result<Message<'a>> {
        check_namespace(namespace)?;
        check_document("selector", selector)?;
        check_document("update", update)?;

        // Two i32 fields: the wire protocol-specified ZERO and `flags`.
        // The namespace carries an extra byte for NUL-termination.
        let total_length = HEADER_SIZE + 2 * 4 + namespace.len() as i32 + 1 +
            selector.len() as i32 + update.len() as i32;

        Ok(Message::OpUpdate {
            header: Header::new(total_length, OpCode::Update),
            namespace: namespace,
            flags: flags,
            selector: selector,
            update: update,
        })
    }

    /// Constructs a new message request for an insertion.
    pub fn new_insert(
        flags: OpInsertFlags,
        namespace: &'a str,
        documents: Vec<&'a [u8]>,
    ) -> Result<Message<'a>> {
        check_namespace(namespace)?;
        for document in &documents {
            check_document("insert", document)?;
        }

        let documents = DocumentSet::Vectored(documents);
        let total_length =
            HEADER_SIZE + 4 + namespace.len() as i32 + 1 + documents.byte_length();

        Ok(Message::OpInsert {
            header: Header::new(total_length, OpCode::Insert),
            flags: flags,
            namespace: namespace,
            documents: documents,
        })
    }

    /// Constructs a new message request for a query.
    pub fn new_query(
        flags: OpQueryFlags,
        namespace: &'a str,
        number_to_skip: i32,
        number_to_return: i32,
        query: &'a [u8],
        return_field_selector: Option<&'a [u8]>,
    ) -> Result<Message<'a>> {
        check_namespace(namespace)?;
        check_document("query", query)?;
        if let Some(selector) = return_field_selector {
            check_document("field selector", selector)?;
        }

        // Three i32 fields: `flags`, `number_to_skip` and `number_to_return`.
        let selector_length = match return_field_selector {
            Some(bytes) => bytes.len() as i32,
            None => 0,
        };
        let total_length = HEADER_SIZE + 3 * 4 + namespace.len() as i32 + 1 +
            query.len() as i32 + selector_length;

        Ok(Message::OpQuery {
            header: Header::new(total_length, OpCode::Query),
            flags: flags,
            namespace: namespace,
            number_to_skip: number_to_skip,
            number_to_return: number_to_return,
            query: query,
            return_field_selector: return_field_selector,
        })
    }

    /// Constructs a new "get more" request message.
    pub fn new_get_more(
        namespace: &'a str,
        number_to_return: i32,
        cursor_id: i64,
    ) -> Result<Message<'a>> {
        check_namespace(namespace)?;

        // Two i32 fields: the wire protocol-specified ZERO and
        // `number_to_return`.
        let total_length = HEADER_SIZE + 2 * 4 + namespace.len() as i32 + 1 + 8;

        Ok(Message::OpGetMore {
            header: Header::new(total_length, OpCode::GetMore),
            namespace: namespace,
            number_to_return: number_to_return,
            cursor_id: cursor_id,
        })
    }

    /// Constructs a new message request for a deletion.
    pub fn new_delete(
        namespace: &'a str,
        flags: OpDeleteFlags,
        selector: &'a [u8],
    ) -> Result<Message<'a>> {
        check_namespace(namespace)?;
        check_document("selector", selector)?;

        let total_length =
            HEADER_SIZE + 2 * 4 + namespace.len() as i32 + 1 + selector.len() as i32;

        Ok(Message::OpDelete {
            header: Header::new(total_length, OpCode::Delete),
            namespace: namespace,
            flags: flags,
            selector: selector,
        })
    }

    /// Constructs a new request to close server-side cursors.
    pub fn new_kill_cursors(cursor_ids: Vec<i64>) -> Message<'a> {
        let total_length = HEADER_SIZE + 2 * 4 + 8 * cursor_ids.len() as i32;

        Message::OpKillCursors {
            header: Header::new(total_length, OpCode::KillCursors),
            cursor_ids: cursor_ids,
        }
    }

    /// The message header.
    pub fn header(&self) -> &Header {
        match *self {
            Message::OpReply { ref header, .. } |
            Message::OpMsg { ref header, .. } |
            Message::OpUpdate { ref header, .. } |
            Message::OpInsert { ref header, .. } |
            Message::OpQuery { ref header, .. } |
            Message::OpGetMore { ref header, .. } |
            Message::OpDelete { ref header, .. } |
            Message::OpKillCursors { ref header, .. } => header,
        }
    }

    pub fn header_mut(&mut self) -> &mut Header {
        match *self {
            Message::OpReply { ref mut header, .. } |
            Message::OpMsg { ref mut header, .. } |
            Message::OpUpdate { ref mut header, .. } |
            Message::OpInsert { ref mut header, .. } |
            Message::OpQuery { ref mut header, .. } |
            Message::OpGetMore { ref mut header, .. } |
            Message::OpDelete { ref mut header, .. } |
            Message::OpKillCursors { ref mut header, .. } => header,
        }
    }

    /// Decodes a complete frame, header included. Payload fields borrow
    /// from `buf`.
    pub fn scatter(buf: &'a [u8]) -> Result<Message<'a>> {
        let header = Header::scatter(buf)?;
        let mut body = BodyReader::new(&buf[HEADER_SIZE as usize..]);

        match header.op_code {
            OpCode::Reply => {
                let flags = OpReplyFlags::from_bits_truncate(body.read_i32()?);
                let cursor_id = body.read_i64()?;
                let starting_from = body.read_i32()?;
                let number_returned = body.read_i32()?;
                let documents = body.remainder();
                Ok(Message::OpReply {
                    header: header,
                    flags: flags,
                    cursor_id: cursor_id,
                    starting_from: starting_from,
                    number_returned: number_returned,
                    documents: documents,
                })
            }
            OpCode::Msg => {
                let message = body.read_cstring()?;
                Ok(Message::OpMsg {
                    header: header,
                    message: message,
                })
            }
            OpCode::Update => {
                body.read_i32()?; // ZERO
                let namespace = body.read_cstring()?;
                let flags = OpUpdateFlags::from_bits_truncate(body.read_i32()?);
                let selector = body.read_document()?;
                let update = body.read_document()?;
                Ok(Message::OpUpdate {
                    header: header,
                    namespace: namespace,
                    flags: flags,
                    selector: selector,
                    update: update,
                })
            }
            OpCode::Insert => {
                let flags = OpInsertFlags::from_bits_truncate(body.read_i32()?);
                let namespace = body.read_cstring()?;
                let documents = DocumentSet::Contiguous(body.remainder());
                Ok(Message::OpInsert {
                    header: header,
                    flags: flags,
                    namespace: namespace,
                    documents: documents,
                })
            }
            OpCode::Query => {
                let flags = OpQueryFlags::from_bits_truncate(body.read_i32()?);
                let namespace = body.read_cstring()?;
                let number_to_skip = body.read_i32()?;
                let number_to_return = body.read_i32()?;
                let query = body.read_document()?;
                let return_field_selector = if body.is_empty() {
                    None
                } else {
                    Some(body.read_document()?)
                };
                Ok(Message::OpQuery {
                    header: header,
                    flags: flags,
                    namespace: namespace,
                    number_to_skip: number_to_skip,
                    number_to_return: number_to_return,
                    query: query,
                    return_field_selector: return_field_selector,
                })
            }
            OpCode::GetMore => {
                body.read_i32()?; // ZERO
                let namespace = body.read_cstring()?;
                let number_to_return = body.read_i32()?;
                let cursor_id = body.read_i64()?;
                Ok(Message::OpGetMore {
                    header: header,
                    namespace: namespace,
                    number_to_return: number_to_return,
                    cursor_id: cursor_id,
                })
            }
            OpCode::Delete => {
                body.read_i32()?; // ZERO
                let namespace = body.read_cstring()?;
                let flags = OpDeleteFlags::from_bits_truncate(body.read_i32()?);
                let selector = body.read_document()?;
                Ok(Message::OpDelete {
                    header: header,
                    namespace: namespace,
                    flags: flags,
                    selector: selector,
                })
            }
            OpCode::KillCursors => {
                body.read_i32()?; // ZERO
                let cursor_ids = body.read_i64_array()?;
                Ok(Message::OpKillCursors {
                    header: header,
                    cursor_ids: cursor_ids,
                })
            }
        }
    }

    /// Encodes the header and every scalar and cstring field into
    /// `prefix` in little-endian wire order, and returns the payload
    /// buffers that follow it. The concatenation of `prefix` and the
    /// returned slices is the complete frame.
    pub fn gather<'b>(&'b self, prefix: &mut Vec<u8>) -> Vec<&'b [u8]> {
        prefix.clear();
        self.header().gather(prefix);

        match *self {
            Message::OpReply {
                flags,
                cursor_id,
                starting_from,
                number_returned,
                documents,
                ..
            } => {
                put_i32(prefix, flags.bits());
                put_i64(prefix, cursor_id);
                put_i32(prefix, starting_from);
                put_i32(prefix, number_returned);
                payloads(&[documents])
            }
            Message::OpMsg { message, .. } => {
                put_cstring(prefix, message);
                Vec::new()
            }
            Message::OpUpdate {
                namespace,
                flags,
                selector,
                update,
                ..
            } => {
                put_i32(prefix, 0);
                put_cstring(prefix, namespace);
                put_i32(prefix, flags.bits());
                payloads(&[selector, update])
            }
            Message::OpInsert {
                flags,
                namespace,
                ref documents,
                ..
            } => {
                put_i32(prefix, flags.bits());
                put_cstring(prefix, namespace);
                payloads(&documents.as_slices())
            }
            Message::OpQuery {
                flags,
                namespace,
                number_to_skip,
                number_to_return,
                query,
                return_field_selector,
                ..
            } => {
                put_i32(prefix, flags.bits());
                put_cstring(prefix, namespace);
                put_i32(prefix, number_to_skip);
                put_i32(prefix, number_to_return);
                match return_field_selector {
                    Some(selector) => payloads(&[query, selector]),
                    None => payloads(&[query]),
                }
            }
            Message::OpGetMore {
                namespace,
                number_to_return,
                cursor_id,
                ..
            } => {
                put_i32(prefix, 0);
                put_cstring(prefix, namespace);
                put_i32(prefix, number_to_return);
                put_i64(prefix, cursor_id);
                Vec::new()
            }
            Message::OpDelete {
                namespace,
                flags,
                selector,
                ..
            } => {
                put_i32(prefix, 0);
                put_cstring(prefix, namespace);
                put_i32(prefix, flags.bits());
                payloads(&[selector])
            }
            Message::OpKillCursors { ref cursor_ids, .. } => {
                put_i32(prefix, 0);
                put_i32(prefix, cursor_ids.len() as i32);
                for cursor_id in cursor_ids {
                    put_i64(prefix, *cursor_id);
                }
                Vec::new()
            }
        }
    }
}

fn put_i32(buf: &mut Vec<u8>, value: i32) {
    let mut scratch = [0u8; 4];
    LittleEndian::write_i32(&mut scratch, value);
    buf.extend_from_slice(&scratch);
}

fn put_i64(buf: &mut Vec<u8>, value: i64) {
    let mut scratch = [0u8; 8];
    LittleEndian::write_i64(&mut scratch, value);
    buf.extend_from_slice(&scratch);
}

fn put_cstring(buf: &mut Vec<u8>, value: &str) {
    buf.extend_from_slice(value.as_bytes());
    buf.push(0);
}

fn payloads<'b>(slices: &[&'b [u8]]) -> Vec<&'b [u8]> {
    slices.iter().cloned().filter(|slice| !slice.is_empty()).collect()
}

/// Left-to-right field decoder over the body of a frame.
struct BodyReader<'a> {
    buf: &'a [u8],
}

impl<'a> BodyReader<'a> {
    fn new(buf: &'a [u8]) -> BodyReader<'a> {
        BodyReader { buf: buf }
    }

    fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    fn read_i32(&mut self) -> Result<i32> {
        if self.buf.len() < 4 {
            return Err(Error::DecodeError(String::from(
                "Frame too short for an int32 field.",
            )));
        }
        let value = LittleEndian::read_i32(&self.buf[0..4]);
        self.buf = &self.buf[4..];
        Ok(value)
    }

    fn read_i64(&mut self) -> Result<i64> {
        if self.buf.len() < 8 {
            return Err(Error::DecodeError(String::from(
                "Frame too short for an int64 field.",
            )));
        }
        let value = LittleEndian::read_i64(&self.buf[0..8]);
        self.buf = &self.buf[8..];
        Ok(value)
    }

    fn read_cstring(&mut self) -> Result<&'a str> {
        let nul = match self.buf.iter().position(|&byte| byte == 0) {
            Some(position) => position,
            None => {
                return Err(Error::DecodeError(String::from(
                    "Unterminated cstring field in frame.",
                )))
            }
        };
        let value = ::std::str::from_utf8(&self.buf[..nul])?;
        self.buf = &self.buf[nul + 1..];
        Ok(value)
    }

    fn read_document(&mut self) -> Result<&'a [u8]> {
        if self.buf.len() < 4 {
            return Err(Error::DecodeError(String::from(
                "Frame too short for a document length prefix.",
            )));
        }
        let length = LittleEndian::read_i32(&self.buf[0..4]);
        if length < 5 || length as usize > self.buf.len() {
            return Err(Error::DecodeError(format!(
                "Invalid document length {} with {} bytes remaining.",
                length,
                self.buf.len()
            )));
        }
        let value = &self.buf[..length as usize];
        self.buf = &self.buf[length as usize..];
        Ok(value)
    }

    fn read_i64_array(&mut self) -> Result<Vec<i64>> {
        let count = self.read_i32()?;
        if count < 0 || count as usize * 8 > self.buf.len() {
            return Err(Error::DecodeError(format!(
                "Invalid int64 array count {} with {} bytes remaining.",
                count,
                self.buf.len()
            )));
        }
        let mut values = Vec::with_capacity(count as usize);
        for _ in 0..count {
            values.push(self.read_i64()?);
        }
        Ok(values)
    }

    fn remainder(&mut self) -> &'a [u8] {
        let value = self.buf;
        self.buf = &[];
        value
    }
}

fn fmt_header(fmt: &mut fmt::Formatter, header: &Header) -> fmt::Result {
    writeln!(fmt, "  message_length : {}", header.message_length)?;
    writeln!(fmt, "  request_id : {}", header.request_id)?;
    writeln!(fmt, "  response_to : {}", header.response_to)?;
    writeln!(fmt, "  op_code : {}", header.op_code)
}

fn fmt_document(fmt: &mut fmt::Formatter, name: &str, bytes: &[u8]) -> fmt::Result {
    match bson::decode_document(&mut io::Cursor::new(bytes)) {
        Ok(document) => writeln!(fmt, "  {} : {}", name, document),
        Err(_) => writeln!(fmt, "  {} : <invalid bson {}>", name, HEXLOWER.encode(bytes)),
    }
}

fn fmt_document_stream(fmt: &mut fmt::Formatter, name: &str, bytes: &[u8]) -> fmt::Result {
    let mut reader = io::Cursor::new(bytes);
    while (reader.position() as usize) < bytes.len() {
        match bson::decode_document(&mut reader) {
            Ok(document) => writeln!(fmt, "  {} : {}", name, document)?,
            Err(_) => {
                let rest = &bytes[reader.position() as usize..];
                return writeln!(fmt, "  {} : <invalid bson {}>", name, HEXLOWER.encode(rest));
            }
        }
    }
    Ok(())
}

impl<'a> fmt::Display for Message<'a> {
    /// One line per field, with BSON payloads rendered as JSON.
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        fmt_header(fmt, self.header())?;

        match *self {
            Message::OpReply {
                flags,
                cursor_id,
                starting_from,
                number_returned,
                documents,
                ..
            } => {
                writeln!(fmt, "  flags : {}", flags.bits())?;
                writeln!(fmt, "  cursor_id : {}", cursor_id)?;
                writeln!(fmt, "  starting_from : {}", starting_from)?;
                writeln!(fmt, "  number_returned : {}", number_returned)?;
                fmt_document_stream(fmt, "documents", documents)
            }
            Message::OpMsg { message, .. } => writeln!(fmt, "  message : {}", message),
            Message::OpUpdate {
                namespace,
                flags,
                selector,
                update,
                ..
            } => {
                writeln!(fmt, "  namespace : {}", namespace)?;
                writeln!(fmt, "  flags : {}", flags.bits())?;
                fmt_document(fmt, "selector", selector)?;
                fmt_document(fmt, "update", update)
            }
            Message::OpInsert {
                flags,
                namespace,
                ref documents,
                ..
            } => {
                writeln!(fmt, "  flags : {}", flags.bits())?;
                writeln!(fmt, "  namespace : {}", namespace)?;
                for slice in documents.as_slices() {
                    writeln!(fmt, "  documents : {}", HEXLOWER.encode(slice))?;
                }
                Ok(())
            }
            Message::OpQuery {
                flags,
                namespace,
                number_to_skip,
                number_to_return,
                query,
                return_field_selector,
                ..
            } => {
                writeln!(fmt, "  flags : {}", flags.bits())?;
                writeln!(fmt, "  namespace : {}", namespace)?;
                writeln!(fmt, "  number_to_skip : {}", number_to_skip)?;
                writeln!(fmt, "  number_to_return : {}", number_to_return)?;
                fmt_document(fmt, "query", query)?;
                match return_field_selector {
                    Some(selector) => fmt_document(fmt, "return_field_selector", selector),
                    None => Ok(()),
                }
            }
            Message::OpGetMore {
                namespace,
                number_to_return,
                cursor_id,
                ..
            } => {
                writeln!(fmt, "  namespace : {}", namespace)?;
                writeln!(fmt, "  number_to_return : {}", number_to_return)?;
                writeln!(fmt, "  cursor_id : {}", cursor_id)
            }
            Message::OpDelete {
                namespace,
                flags,
                selector,
                ..
            } => {
                writeln!(fmt, "  namespace : {}", namespace)?;
                writeln!(fmt, "  flags : {}", flags.bits())?;
                fmt_document(fmt, "selector", selector)
            }
            Message::OpKillCursors { ref cursor_ids, .. } => {
                writeln!(fmt, "  number_of_cursor_ids : {}", cursor_ids.len())?;
                for cursor_id in cursor_ids {
                    writeln!(fmt, "  cursor_ids : {}", cursor_id)?;
                }
                Ok(())
            }
        }
    }
}
