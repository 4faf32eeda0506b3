//! The legacy wire protocol: message codec, framed reader and writer.

pub mod flags;
pub mod header;
pub mod operations;
pub mod reader;
pub mod writer;

pub use self::header::{Header, OpCode};
pub use self::operations::{DocumentSet, Message, MAX_MESSAGE_SIZE};
pub use self::reader::Reader;
pub use self::writer::Writer;
