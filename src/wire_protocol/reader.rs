//! Buffered, length-prefixed frame reader.

use std::io::{self, Read};

use byteorder::{ByteOrder, LittleEndian};

use error::{Error, Result};
use wire_protocol::header::HEADER_SIZE;
use wire_protocol::operations::{Message, MAX_MESSAGE_SIZE};

/// Initial capacity of the decode buffer; grown to the next power of two
/// whenever a frame needs more.
const INITIAL_BUFFER_SIZE: usize = 512;

/// Reads length-prefixed messages out of a byte stream.
///
/// The reader owns a growable decode buffer. A decoded `Message` borrows
/// that buffer, so it is invalidated by the next call to `read`: buffer
/// the message contents if they must outlive it.
pub struct Reader {
    buf: Vec<u8>,
    len: usize,
    msg_len: usize,
}

impl Reader {
    pub fn new() -> Reader {
        Reader {
            buf: vec![0; INITIAL_BUFFER_SIZE],
            len: 0,
            msg_len: 0,
        }
    }

    /// Reads the next message from `stream`.
    ///
    /// A clean shutdown on a frame boundary is reported as `Error::Eof`;
    /// running dry inside a frame is an I/O error.
    pub fn read<'a, S: Read>(&'a mut self, stream: &mut S) -> Result<Message<'a>> {
        // Drop the previous frame and keep whatever was read past it.
        if self.len > self.msg_len {
            let msg_len = self.msg_len;
            let len = self.len;
            self.buf.copy_within(msg_len..len, 0);
        }
        self.len -= self.msg_len;
        self.msg_len = 0;

        self.try_fill(stream, 4)?;

        let frame_len = LittleEndian::read_i32(&self.buf[0..4]);
        if frame_len < HEADER_SIZE || frame_len > MAX_MESSAGE_SIZE {
            return Err(Error::DecodeError(format!(
                "Invalid frame length {}.",
                frame_len
            )));
        }

        self.try_fill(stream, frame_len as usize)?;

        self.msg_len = frame_len as usize;
        Message::scatter(&self.buf[..frame_len as usize])
    }

    /// Receives from `stream` into the buffer tail until at least
    /// `minsize` bytes are available.
    fn try_fill<S: Read>(&mut self, stream: &mut S, minsize: usize) -> Result<()> {
        if minsize <= self.len {
            return Ok(());
        }

        if minsize > self.buf.len() {
            let size = minsize.next_power_of_two();
            self.buf.resize(size, 0);
        }

        while self.len < minsize {
            let n = stream.read(&mut self.buf[self.len..])?;
            if n == 0 {
                if self.len == 0 {
                    return Err(Error::Eof);
                }
                return Err(Error::IoError(io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    "stream closed inside a frame",
                )));
            }
            self.len += n;
        }

        Ok(())
    }
}

impl Default for Reader {
    fn default() -> Reader {
        Reader::new()
    }
}
