//! Library-wide error types.

use std::error;
use std::fmt;
use std::io;
use std::result;
use std::str::Utf8Error;

use bson::{DecoderError, EncoderError};

/// Error domain for connection-level failures.
pub const CONNECTION_ERROR_DOMAIN: i32 = 4000;

/// Longest message carried by a coded connection error.
pub const MAX_ERROR_MESSAGE_LEN: usize = 127;

/// The failure classes a connection reports through its numeric
/// `(domain, code, message)` surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionFailure {
    SendFailure,
    RecvFailure,
    QueryFailure,
}

impl ConnectionFailure {
    pub fn code(&self) -> i32 {
        match *self {
            ConnectionFailure::SendFailure => 1,
            ConnectionFailure::RecvFailure => 2,
            ConnectionFailure::QueryFailure => 3,
        }
    }
}

#[derive(Debug)]
pub enum Error {
    /// A caller supplied an argument the wire format cannot carry.
    ArgumentError(String),
    /// A frame could not be decoded (short buffer, bad BSON length,
    /// missing NUL, unknown opcode).
    DecodeError(String),
    /// Socket-level failure, including per-operation timeouts.
    IoError(io::Error),
    /// The peer answered with something other than what the protocol
    /// requires at this point of the exchange.
    ResponseError(String),
    /// A higher-level operation could not be carried out.
    OperationError(String),
    /// A coded connection failure; see `domain`, `code` and `message`.
    ConnectionError(ConnectionFailure, String),
    /// The peer shut down cleanly on a frame boundary.
    Eof,
}

pub type Result<T> = result::Result<T, Error>;

impl Error {
    /// Builds a coded connection error, clipping the message the way the
    /// numeric error surface requires.
    pub fn connection(failure: ConnectionFailure, message: &str) -> Error {
        let mut message = message.to_owned();
        if message.len() > MAX_ERROR_MESSAGE_LEN {
            let mut end = MAX_ERROR_MESSAGE_LEN;
            while !message.is_char_boundary(end) {
                end -= 1;
            }
            message.truncate(end);
        }
        Error::ConnectionError(failure, message)
    }

    /// The numeric error domain, when the error carries one.
    pub fn domain(&self) -> Option<i32> {
        match *self {
            Error::ConnectionError(..) => Some(CONNECTION_ERROR_DOMAIN),
            _ => None,
        }
    }

    /// The numeric error code within `domain`.
    pub fn code(&self) -> Option<i32> {
        match *self {
            Error::ConnectionError(failure, _) => Some(failure.code()),
            _ => None,
        }
    }

    pub fn is_eof(&self) -> bool {
        match *self {
            Error::Eof => true,
            _ => false,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Error::ArgumentError(ref inner) => inner.fmt(fmt),
            Error::DecodeError(ref inner) => inner.fmt(fmt),
            Error::IoError(ref inner) => inner.fmt(fmt),
            Error::ResponseError(ref inner) => inner.fmt(fmt),
            Error::OperationError(ref inner) => inner.fmt(fmt),
            Error::ConnectionError(failure, ref message) => write!(
                fmt,
                "connection error {}/{}: {}",
                CONNECTION_ERROR_DOMAIN,
                failure.code(),
                message
            ),
            Error::Eof => write!(fmt, "end of stream"),
        }
    }
}

impl error::Error for Error {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match *self {
            Error::IoError(ref inner) => Some(inner),
            _ => None,
        }
    }
}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Error {
        Error::IoError(err)
    }
}

impl From<DecoderError> for Error {
    fn from(err: DecoderError) -> Error {
        Error::DecodeError(format!("Failed to decode BSON document: {}", err))
    }
}

impl From<EncoderError> for Error {
    fn from(err: EncoderError) -> Error {
        Error::ArgumentError(format!("Failed to encode BSON document: {}", err))
    }
}

impl From<Utf8Error> for Error {
    fn from(err: Utf8Error) -> Error {
        Error::DecodeError(format!("Invalid UTF-8 in cstring field: {}", err))
    }
}
