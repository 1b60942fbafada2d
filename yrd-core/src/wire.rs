//! Framing: one bencoded dictionary per UDP datagram.

use std::collections::HashMap;
use std::fmt;

pub use serde_bencode::value::Value;

/// Largest datagram the router sends or accepts.
pub const MAX_DATAGRAM_LEN: usize = 69632;

/// Decoded bencode dictionary. Keys are raw byte strings.
pub type Dict = HashMap<Vec<u8>, Value>;

/// Encode a dictionary into one datagram payload. Keys are emitted in sorted byte order,
/// so the same mapping always encodes to the same bytes.
pub fn encode_dict(dict: &Dict) -> Result<Vec<u8>, WireError> {
    let out = serde_bencode::to_bytes(&Value::Dict(dict.clone())).map_err(WireError::Encode)?;
    if out.len() > MAX_DATAGRAM_LEN {
        return Err(WireError::TooLarge(out.len()));
    }
    Ok(out)
}

/// Decode one datagram payload. The top-level value must be a dictionary.
pub fn decode_dict(bytes: &[u8]) -> Result<Dict, WireError> {
    if bytes.len() > MAX_DATAGRAM_LEN {
        return Err(WireError::TooLarge(bytes.len()));
    }
    match serde_bencode::from_bytes::<Value>(bytes).map_err(WireError::Decode)? {
        Value::Dict(dict) => Ok(dict),
        _ => Err(WireError::NotADict),
    }
}

/// Error encoding or decoding a datagram.
#[derive(Debug, thiserror::Error)]
pub enum WireError {
    #[error("encode error: {0}")]
    Encode(serde_bencode::Error),
    #[error("decode error: {0}")]
    Decode(serde_bencode::Error),
    #[error("datagram too large ({0} bytes)")]
    TooLarge(usize),
    #[error("top-level value is not a dictionary")]
    NotADict,
}

/// Conversion into a bencode value, used when building query arguments.
pub trait IntoValue {
    fn into_value(self) -> Value;
}

impl IntoValue for Value {
    fn into_value(self) -> Value {
        self
    }
}

impl IntoValue for &str {
    fn into_value(self) -> Value {
        Value::Bytes(self.as_bytes().to_vec())
    }
}

impl IntoValue for String {
    fn into_value(self) -> Value {
        Value::Bytes(self.into_bytes())
    }
}

impl IntoValue for &String {
    fn into_value(self) -> Value {
        Value::Bytes(self.as_bytes().to_vec())
    }
}

impl IntoValue for i64 {
    fn into_value(self) -> Value {
        Value::Int(self)
    }
}

impl IntoValue for i32 {
    fn into_value(self) -> Value {
        Value::Int(self.into())
    }
}

impl IntoValue for u32 {
    fn into_value(self) -> Value {
        Value::Int(self.into())
    }
}

impl IntoValue for Dict {
    fn into_value(self) -> Value {
        Value::Dict(self)
    }
}

impl IntoValue for Vec<Value> {
    fn into_value(self) -> Value {
        Value::List(self)
    }
}

/// Insert `value` under the text key `key`.
pub fn put(dict: &mut Dict, key: &str, value: impl IntoValue) {
    dict.insert(key.as_bytes().to_vec(), value.into_value());
}

/// Byte-string value as UTF-8 text.
pub fn as_str(value: &Value) -> Option<&str> {
    match value {
        Value::Bytes(b) => std::str::from_utf8(b).ok(),
        _ => None,
    }
}

/// Human-readable rendering of a dictionary for diagnostics (byte strings shown as text).
pub struct Pretty<'a>(pub &'a Dict);

impl fmt::Display for Pretty<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt_dict(self.0, f)
    }
}

fn fmt_dict(dict: &Dict, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let mut entries: Vec<_> = dict.iter().collect();
    entries.sort_by(|a, b| a.0.cmp(b.0));
    f.write_str("{")?;
    for (i, (k, v)) in entries.into_iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{:?}: ", String::from_utf8_lossy(k))?;
        fmt_value(v, f)?;
    }
    f.write_str("}")
}

fn fmt_value(value: &Value, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match value {
        Value::Bytes(b) => write!(f, "{:?}", String::from_utf8_lossy(b)),
        Value::Int(n) => write!(f, "{}", n),
        Value::List(items) => {
            f.write_str("[")?;
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    f.write_str(", ")?;
                }
                fmt_value(item, f)?;
            }
            f.write_str("]")
        }
        Value::Dict(d) => fmt_dict(d, f),
    }
}
