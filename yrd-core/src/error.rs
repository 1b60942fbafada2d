//! Error taxonomy for admin socket calls.

use std::fmt;
use std::io;

use crate::wire::{self, Dict, Pretty, WireError};

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Socket failure, including a receive timeout. Never retried.
    #[error("transport error: {0}")]
    Transport(#[from] io::Error),
    /// Liveness ping failed or the response is structurally unusable.
    #[error("protocol error: {0}")]
    Protocol(String),
    #[error("malformed datagram: {0}")]
    Wire(#[from] WireError),
    #[error("router error: {0}")]
    Remote(#[from] RemoteError),
    #[error("format error: {0}")]
    Format(#[from] FormatError),
}

/// Coarse class of an [`Error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Transport,
    Protocol,
    Remote,
    Format,
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Transport(_) => ErrorKind::Transport,
            Error::Protocol(_) | Error::Wire(_) => ErrorKind::Protocol,
            Error::Remote(_) => ErrorKind::Remote,
            Error::Format(_) => ErrorKind::Format,
        }
    }

    /// True when the receive timeout elapsed before a datagram arrived.
    pub fn is_timeout(&self) -> bool {
        match self {
            Error::Transport(e) => matches!(
                e.kind(),
                io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut
            ),
            _ => false,
        }
    }

    /// The router's error text, if this is a remote error.
    pub fn remote_message(&self) -> Option<&str> {
        match self {
            Error::Remote(e) => e.message(),
            _ => None,
        }
    }
}

/// Router reply whose `error` field is not `"none"`. Keeps the whole decoded mapping.
#[derive(Debug, Clone, PartialEq)]
pub struct RemoteError {
    response: Dict,
}

impl RemoteError {
    pub(crate) fn new(response: Dict) -> Self {
        Self { response }
    }

    pub fn message(&self) -> Option<&str> {
        self.response.get(b"error".as_slice()).and_then(wire::as_str)
    }

    pub fn response(&self) -> &Dict {
        &self.response
    }

    pub fn into_response(self) -> Dict {
        self.response
    }
}

impl fmt::Display for RemoteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.message() {
            Some(msg) => write!(f, "{} {}", msg, Pretty(&self.response)),
            None => write!(f, "{}", Pretty(&self.response)),
        }
    }
}

impl std::error::Error for RemoteError {}

/// Malformed local input, detected before anything is sent.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FormatError {
    #[error("non-ascii byte {byte:#04x} at offset {offset}")]
    NonAscii { offset: usize, byte: u8 },
    #[error("bad character {0:?}")]
    BadCharacter(char),
    #[error("{bits} dangling bits with value {value}")]
    TrailingBits { bits: u32, value: u32 },
    #[error("weird input: {0:?}")]
    WeirdInput(String),
    #[error("key does not end with .k: {0:?}")]
    MissingKeySuffix(String),
    #[error("key decodes to {0} bytes, expected 32")]
    KeyLength(usize),
    #[error("bad credential: {0}")]
    Credential(String),
}
