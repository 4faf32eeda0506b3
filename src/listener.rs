//! Accept loop with per-connection tasks and handler callbacks.

use std::net::{SocketAddr, TcpListener, TcpStream};
use std::sync::Arc;
use std::thread::JoinHandle;

use connection::{Connection, Responder};
use error::{Error, Result};
use runtime;
use wire_protocol::operations::Message;

/// The callbacks a listener drives for each accepted connection:
/// `on_accept` once, then `on_message` per decoded message until it
/// returns `false` or the stream ends, then `on_close` once.
///
/// One handler set serves every connection; use the responder's peer name
/// to key per-connection state.
pub trait Handlers: Send + Sync + 'static {
    /// Returning `false` drops the connection before any message is
    /// read.
    fn on_accept(&self, connection: &mut Connection<TcpStream>) -> bool {
        let _ = connection;
        true
    }

    /// Handles one decoded message. The message borrows the connection's
    /// read buffer; the responder is the connection's write half.
    /// Returning `false` closes the connection.
    fn on_message(&self, responder: &mut Responder<TcpStream>, message: &Message) -> bool;

    fn on_close(&self, connection: &mut Connection<TcpStream>) {
        let _ = connection;
    }
}

/// A bound accept socket, not yet serving.
pub struct Listener {
    inner: TcpListener,
}

impl Listener {
    /// Binds `ip:port`. A bind failure is logged and abandons only this
    /// listener.
    pub fn bind(ip: &str, port: u16) -> Result<Listener> {
        match TcpListener::bind((ip, port)) {
            Ok(inner) => Ok(Listener { inner: inner }),
            Err(err) => {
                warn!("Failed to bind {}:{}: {}", ip, port, err);
                Err(Error::IoError(err))
            }
        }
    }

    /// The bound address; useful when binding port 0.
    pub fn local_addr(&self) -> Result<SocketAddr> {
        let addr = self.inner.local_addr()?;
        Ok(addr)
    }

    /// Starts the accept loop on its own task. Each accepted connection
    /// runs on a task of its own, driving `handlers` as described on the
    /// trait.
    pub fn start<H: Handlers>(self, handlers: Arc<H>) -> Result<JoinHandle<()>> {
        let listener = self.inner;

        let handle = runtime::spawn("accept-loop", move || loop {
            match listener.accept() {
                Ok((stream, addr)) => {
                    info!("[{}] connection established", addr);
                    let handlers = handlers.clone();
                    let spawned = runtime::spawn("connection", move || {
                        serve_connection(stream, handlers);
                    });
                    if let Err(err) = spawned {
                        warn!("[{}] failed to spawn connection task: {}", addr, err);
                    }
                }
                Err(err) => {
                    warn!("Failed to accept connection: {}", err);
                }
            }
        })?;

        Ok(handle)
    }
}

fn serve_connection<H: Handlers>(stream: TcpStream, handlers: Arc<H>) {
    let mut connection = Connection::new(stream);

    if handlers.on_accept(&mut connection) {
        loop {
            let keep_going = connection
                .process_message(|responder, message| handlers.on_message(responder, message));
            match keep_going {
                Ok(true) => {}
                Ok(false) => break,
                Err(ref err) if err.is_eof() => break,
                Err(err) => {
                    warn!("[{}] {}", connection.peer(), err);
                    break;
                }
            }
        }
    }

    info!(
        "[{}] closing connection: {}",
        connection.peer(),
        connection.stats()
    );
    handlers.on_close(&mut connection);
}
