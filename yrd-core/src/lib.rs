//! Admin client for the cjdns router control socket.
//! Blocking UDP request/response with optional cookie authentication, paginated queries,
//! and the address model used to read peer and route records.

pub mod address;
pub mod admin;
pub mod auth;
pub mod base32;
pub mod config;
pub mod credential;
pub mod error;
pub mod peer;
pub mod poll;
pub mod protocol;
pub mod session;
pub mod wire;

#[cfg(test)]
mod testing;

pub use address::{classify, collect, key_to_ip, AddressClass, Addresses};
pub use admin::{Search, SessionStats, DEFAULT_PING_TIMEOUT_MS};
pub use config::AdminConfig;
pub use credential::Credential;
pub use error::{Error, ErrorKind, FormatError, RemoteError, Result};
pub use peer::Peer;
pub use poll::{poll, Exchange, Pages, Peers};
pub use protocol::{Query, Response, DEFAULT_HOST, DEFAULT_PORT, RECV_TIMEOUT};
pub use session::Session;
pub use wire::{Dict, Value, MAX_DATAGRAM_LEN};
