//! The socket facade the protocol layers are written against.

use std::io::{self, Read, Write};
use std::net::{Shutdown, SocketAddr, TcpStream};
use std::time::Duration;

/// A byte stream with the socket surface the connection layer needs:
/// blocking reads and writes, per-operation timeouts, a peer name, and a
/// way to shut the stream down from another task.
pub trait Stream: Read + Write + Send {
    fn peer_addr(&self) -> io::Result<SocketAddr>;

    /// Bounds every subsequent read; expiry surfaces as an I/O error on
    /// that read, never as a retry.
    fn set_read_timeout(&self, timeout: Option<Duration>) -> io::Result<()>;

    /// Bounds every subsequent write.
    fn set_write_timeout(&self, timeout: Option<Duration>) -> io::Result<()>;

    /// Tears the stream down. Any blocked read or write on it fails,
    /// which is the only cancellation mechanism the core has.
    fn shutdown(&self) -> io::Result<()>;
}

impl Stream for TcpStream {
    fn peer_addr(&self) -> io::Result<SocketAddr> {
        TcpStream::peer_addr(self)
    }

    fn set_read_timeout(&self, timeout: Option<Duration>) -> io::Result<()> {
        TcpStream::set_read_timeout(self, timeout)
    }

    fn set_write_timeout(&self, timeout: Option<Duration>) -> io::Result<()> {
        TcpStream::set_write_timeout(self, timeout)
    }

    fn shutdown(&self) -> io::Result<()> {
        TcpStream::shutdown(self, Shutdown::Both)
    }
}
