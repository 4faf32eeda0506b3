//! Message header and opcodes for the legacy wire protocol.

use std::fmt;

use byteorder::{ByteOrder, LittleEndian};

use error::{Error, Result};

/// Size of the wire header in bytes.
pub const HEADER_SIZE: i32 = 16;

/// Opcodes understood by this library. Anything else on the wire is a
/// decode failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpCode {
    Reply = 1,
    Msg = 1000,
    Update = 2001,
    Insert = 2002,
    Query = 2004,
    GetMore = 2005,
    Delete = 2006,
    KillCursors = 2007,
}

impl OpCode {
    pub fn from_i32(i: i32) -> Option<OpCode> {
        match i {
            1 => Some(OpCode::Reply),
            1000 => Some(OpCode::Msg),
            2001 => Some(OpCode::Update),
            2002 => Some(OpCode::Insert),
            2004 => Some(OpCode::Query),
            2005 => Some(OpCode::GetMore),
            2006 => Some(OpCode::Delete),
            2007 => Some(OpCode::KillCursors),
            _ => None,
        }
    }
}

impl fmt::Display for OpCode {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        let name = match *self {
            OpCode::Reply => "OP_REPLY",
            OpCode::Msg => "OP_MSG",
            OpCode::Update => "OP_UPDATE",
            OpCode::Insert => "OP_INSERT",
            OpCode::Query => "OP_QUERY",
            OpCode::GetMore => "OP_GETMORE",
            OpCode::Delete => "OP_DELETE",
            OpCode::KillCursors => "OP_KILL_CURSORS",
        };
        write!(fmt, "{}", name)
    }
}

/// The 16-byte header that starts every message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header {
    /// The total message length, including the header.
    pub message_length: i32,
    /// Identifies the request being sent.
    pub request_id: i32,
    /// The request id this message answers; zero for requests.
    pub response_to: i32,
    /// Identifies which message type is being sent.
    pub op_code: OpCode,
}

impl Header {
    pub fn new(message_length: i32, op_code: OpCode) -> Header {
        Header {
            message_length: message_length,
            request_id: 0,
            response_to: 0,
            op_code: op_code,
        }
    }

    /// Reads the four little-endian header fields from the front of `buf`.
    pub fn scatter(buf: &[u8]) -> Result<Header> {
        if buf.len() < HEADER_SIZE as usize {
            return Err(Error::DecodeError(format!(
                "Message header requires 16 bytes; {} available.",
                buf.len()
            )));
        }

        let message_length = LittleEndian::read_i32(&buf[0..4]);
        let request_id = LittleEndian::read_i32(&buf[4..8]);
        let response_to = LittleEndian::read_i32(&buf[8..12]);
        let raw_op_code = LittleEndian::read_i32(&buf[12..16]);

        let op_code = match OpCode::from_i32(raw_op_code) {
            Some(op_code) => op_code,
            None => {
                warn!("Unknown rpc type: 0x{:08x}", raw_op_code);
                return Err(Error::DecodeError(format!(
                    "Unknown opcode 0x{:08x} in message header.",
                    raw_op_code
                )));
            }
        };

        Ok(Header {
            message_length: message_length,
            request_id: request_id,
            response_to: response_to,
            op_code: op_code,
        })
    }

    /// Appends the header fields to `buf` in little-endian order.
    pub fn gather(&self, buf: &mut Vec<u8>) {
        let mut scratch = [0u8; 4];
        LittleEndian::write_i32(&mut scratch, self.message_length);
        buf.extend_from_slice(&scratch);
        LittleEndian::write_i32(&mut scratch, self.request_id);
        buf.extend_from_slice(&scratch);
        LittleEndian::write_i32(&mut scratch, self.response_to);
        buf.extend_from_slice(&scratch);
        LittleEndian::write_i32(&mut scratch, self.op_code as i32);
        buf.extend_from_slice(&scratch);
    }
}
