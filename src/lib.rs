//! A client, proxy, and tooling core for the legacy MongoDB wire
//! protocol (the pre-3.6 opcodes: OP_REPLY, OP_MSG, OP_UPDATE,
//! OP_INSERT, OP_QUERY, OP_GETMORE, OP_DELETE, OP_KILL_CURSORS).
//!
//! The crate provides a bit-exact message codec with zero-copy decoding,
//! a framed reader and vectored writer, a blocking-I/O socket and task
//! surface, a connection with request/response matching and the common
//! server commands, a paged query cursor, and an accept-loop listener for
//! building proxies. BSON payloads are carried as opaque bytes; only
//! their length prefixes are interpreted.

#[macro_use]
extern crate bitflags;
#[macro_use(bson, doc)]
extern crate bson;
extern crate byteorder;
extern crate data_encoding;
#[macro_use]
extern crate lazy_static;
#[macro_use]
extern crate log;
extern crate rand;
extern crate semver;
extern crate separator;
extern crate time;

pub mod connection;
pub mod cursor;
pub mod error;
pub mod listener;
pub mod runtime;
pub mod stream;
pub mod wire_protocol;

pub use connection::{CommandReply, Connection, ConnectionStats, Responder};
pub use cursor::Cursor;
pub use error::{ConnectionFailure, Error, Result};
pub use listener::{Handlers, Listener};
pub use stream::Stream;
