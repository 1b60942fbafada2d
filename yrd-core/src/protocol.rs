//! Admin protocol: queries, responses and well-known constants.

use std::time::Duration;

use crate::error::RemoteError;
use crate::wire::{self, Dict, IntoValue, Value};

/// Where the router's admin socket listens unless configured otherwise.
pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 11234;

/// How long a receive blocks before the call fails.
pub const RECV_TIMEOUT: Duration = Duration::from_secs(7);

/// Sentinel the router puts in `error` on success.
const NO_ERROR: &[u8] = b"none";

/// One admin command with its arguments. Built per call.
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    command: String,
    args: Option<Dict>,
}

impl Query {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            args: None,
        }
    }

    /// Add an argument (goes under `args`).
    pub fn arg(mut self, key: &str, value: impl IntoValue) -> Self {
        wire::put(self.args.get_or_insert_with(Dict::new), key, value);
        self
    }

    pub fn command(&self) -> &str {
        &self.command
    }

    pub fn args(&self) -> Option<&Dict> {
        self.args.as_ref()
    }

    /// Current `args.page`, if set.
    pub fn page(&self) -> Option<i64> {
        match self.args.as_ref()?.get(b"page".as_slice())? {
            Value::Int(n) => Some(*n),
            _ => None,
        }
    }

    pub fn set_page(&mut self, page: i64) {
        wire::put(self.args.get_or_insert_with(Dict::new), "page", page);
    }

    /// Request mapping: `{q: command, args?: {...}}`.
    pub fn to_dict(&self) -> Dict {
        let mut dict = Dict::new();
        wire::put(&mut dict, "q", self.command.as_str());
        if let Some(args) = &self.args {
            wire::put(&mut dict, "args", args.clone());
        }
        dict
    }
}

/// A successful router reply. A reply carrying a real `error` never becomes a `Response`.
#[derive(Debug, Clone, PartialEq)]
pub struct Response(Dict);

impl Response {
    /// Map the router's `error` sentinel into a result.
    pub fn from_dict(dict: Dict) -> Result<Self, RemoteError> {
        match dict.get(b"error".as_slice()) {
            None => Ok(Response(dict)),
            Some(Value::Bytes(b)) if b.as_slice() == NO_ERROR => Ok(Response(dict)),
            Some(_) => Err(RemoteError::new(dict)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key.as_bytes())
    }

    pub fn contains(&self, key: &str) -> bool {
        self.0.contains_key(key.as_bytes())
    }

    pub fn str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(wire::as_str)
    }

    pub fn int(&self, key: &str) -> Option<i64> {
        match self.get(key)? {
            Value::Int(n) => Some(*n),
            _ => None,
        }
    }

    pub fn list(&self, key: &str) -> Option<&[Value]> {
        match self.get(key)? {
            Value::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn dict(&self, key: &str) -> Option<&Dict> {
        match self.get(key)? {
            Value::Dict(d) => Some(d),
            _ => None,
        }
    }

    /// A page is non-terminal when the router includes `more`.
    pub fn has_more(&self) -> bool {
        self.contains("more")
    }

    pub fn as_dict(&self) -> &Dict {
        &self.0
    }

    pub fn into_dict(self) -> Dict {
        self.0
    }
}
