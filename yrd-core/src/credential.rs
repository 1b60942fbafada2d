//! Peering credentials, written as one JSON object member per peer:
//! `"1.2.3.4:5678": {"password": "...", "publicKey": "....k"}`.

use std::collections::BTreeMap;

use rand::distributions::Alphanumeric;
use rand::Rng;
use serde::Deserialize;
use serde_json::{Map, Value};

use crate::address;
use crate::error::FormatError;

/// What a remote node needs to open an outbound connection to us (or we to it).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credential {
    /// `host:port` of the peer's UDP interface.
    pub address: String,
    pub public_key: String,
    pub password: String,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct Entry {
    #[serde(rename = "publicKey")]
    public_key: String,
    password: String,
}

impl Credential {
    /// Parse one line holding one or more comma-separated members.
    /// Keys are checked to be well-formed before anything is returned.
    pub fn parse_line(line: &str) -> Result<Vec<Credential>, FormatError> {
        let line = line.trim();
        if line.is_empty() {
            return Ok(Vec::new());
        }
        let entries: BTreeMap<String, Entry> = serde_json::from_str(&format!("{{{}}}", line))
            .map_err(|e| FormatError::Credential(e.to_string()))?;
        let mut out = Vec::with_capacity(entries.len());
        for (address, entry) in entries {
            address::key_to_ip(&entry.public_key)?;
            out.push(Credential {
                address,
                public_key: entry.public_key,
                password: entry.password,
            });
        }
        Ok(out)
    }

    /// Format as a single member, parseable by [`Credential::parse_line`].
    pub fn to_line(&self) -> String {
        let mut entry = Map::new();
        entry.insert("password".into(), Value::String(self.password.clone()));
        entry.insert("publicKey".into(), Value::String(self.public_key.clone()));
        let mut outer = Map::new();
        outer.insert(self.address.clone(), Value::Object(entry));
        let s = Value::Object(outer).to_string();
        s[1..s.len() - 1].to_string()
    }
}

/// Random alphanumeric password for a new inbound peer.
pub fn generate_password(len: usize) -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(len)
        .map(char::from)
        .collect()
}
