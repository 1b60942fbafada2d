//! Peer records as the router reports them, with derivable identity fields filled in.

use crate::address;
use crate::wire::{self, Dict, Value};

/// A node's identity plus whatever else the router said about it.
/// Built from a response entry and never mutated afterwards.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Peer {
    pub ip: Option<String>,
    pub public_key: Option<String>,
    pub path: Option<String>,
    pub version: Option<String>,
    pub addr: Option<String>,
    /// Remaining fields of the record (traffic counters, state, user, link quality, ...).
    pub extra: Dict,
}

impl Peer {
    /// Build a peer from one `peers` / `routingTable` entry.
    pub fn from_dict(mut dict: Dict) -> Peer {
        let ip = take_text(&mut dict, "ip");
        let public_key = take_text(&mut dict, "publicKey");
        let path = take_text(&mut dict, "path");
        let version = take_text(&mut dict, "version");
        let addr = take_text(&mut dict, "addr");
        Peer {
            ip,
            public_key,
            path,
            version,
            addr,
            extra: dict,
        }
        .resolve()
    }

    /// Fill in missing identity fields from the ones present.
    ///
    /// `ip` comes from an explicit value, else the public key, else the key inside `addr`.
    /// `public_key`, `path` and `version` fall back to the corresponding parts of `addr`.
    /// Anything that cannot be derived stays `None`.
    pub fn resolve(self) -> Peer {
        let Peer {
            ip,
            public_key,
            path,
            version,
            addr,
            extra,
        } = self;

        let addr_key = addr.as_deref().and_then(|a| {
            let key = address::key_of(a);
            address::key_to_ip(key).ok().map(|ip| (key.to_string(), ip))
        });

        let ip = ip
            .or_else(|| {
                public_key
                    .as_deref()
                    .and_then(|k| address::key_to_ip(k).ok())
            })
            .or_else(|| addr_key.as_ref().map(|(_, ip)| ip.clone()));
        let public_key = public_key.or_else(|| addr_key.map(|(key, _)| key));
        let path = path.or_else(|| {
            addr.as_deref()
                .and_then(address::path_of)
                .map(str::to_string)
        });
        let version = version.or_else(|| {
            addr.as_deref()
                .and_then(address::version_of)
                .map(str::to_string)
        });

        Peer {
            ip,
            public_key,
            path,
            version,
            addr,
            extra,
        }
    }

    /// False when an explicit ip disagrees with the ip derived from the public key.
    pub fn is_consistent(&self) -> bool {
        match (&self.ip, &self.public_key) {
            (Some(ip), Some(key)) => {
                address::key_to_ip(key).map_or(false, |derived| &derived == ip)
            }
            _ => true,
        }
    }

    pub fn extra_str(&self, key: &str) -> Option<&str> {
        self.extra.get(key.as_bytes()).and_then(wire::as_str)
    }

    pub fn extra_int(&self, key: &str) -> Option<i64> {
        match self.extra.get(key.as_bytes())? {
            Value::Int(n) => Some(*n),
            _ => None,
        }
    }
}

fn take_text(dict: &mut Dict, key: &str) -> Option<String> {
    match dict.remove(key.as_bytes())? {
        Value::Bytes(b) => String::from_utf8(b).ok(),
        Value::Int(n) => Some(n.to_string()),
        _ => None,
    }
}
