//! Vectored frame writer.

use std::io::{IoSlice, Write};

use error::{ConnectionFailure, Error, Result};
use wire_protocol::operations::Message;

/// Writes messages as single vectored sends.
///
/// The writer owns no buffer: every payload buffer of the message is
/// handed to the stream as its own I/O slice, preceded by one small
/// little-endian prefix holding the header and scalar fields.
pub struct Writer;

impl Writer {
    pub fn new() -> Writer {
        Writer
    }

    /// Writes `message` to `stream`. The stream must accept the whole
    /// frame in one vectored write; a short write is a send failure.
    pub fn write<S: Write>(&mut self, stream: &mut S, message: &Message) -> Result<usize> {
        let mut prefix = Vec::with_capacity(64);
        let payloads = message.gather(&mut prefix);

        let expected = prefix.len() + payloads.iter().map(|slice| slice.len()).sum::<usize>();
        if expected != message.header().message_length as usize {
            return Err(Error::ArgumentError(format!(
                "Message header claims {} bytes but {} were gathered.",
                message.header().message_length,
                expected
            )));
        }

        let mut iovecs = Vec::with_capacity(1 + payloads.len());
        iovecs.push(IoSlice::new(&prefix));
        for payload in &payloads {
            iovecs.push(IoSlice::new(payload));
        }

        let n = stream.write_vectored(&iovecs)?;
        if n != expected {
            return Err(Error::connection(
                ConnectionFailure::SendFailure,
                &format!("Short write: {} of {} bytes accepted.", n, expected),
            ));
        }

        stream.flush()?;
        Ok(n)
    }
}

impl Default for Writer {
    fn default() -> Writer {
        Writer::new()
    }
}
