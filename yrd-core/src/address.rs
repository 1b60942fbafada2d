//! Node address forms and how they relate: full path address, public key, IPv6.
//!
//! A path address looks like `v20.0000.0000.0000.0013.<base32>.k`: version, four
//! label groups, then the node's key. A key is `<base32>.k`. The IPv6 address is
//! derived from the key.

use sha2::{Digest, Sha512};

use crate::base32;
use crate::error::FormatError;

/// Which form a free-form address token is in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddressClass {
    Path,
    Key,
    Ip,
}

/// Classify by number of dot-separated segments: 7 path, 2 key, 1 ip.
pub fn classify(token: &str) -> Result<AddressClass, FormatError> {
    match token.split('.').count() {
        7 => Ok(AddressClass::Path),
        2 => Ok(AddressClass::Key),
        1 => Ok(AddressClass::Ip),
        _ => Err(FormatError::WeirdInput(token.to_string())),
    }
}

/// Key embedded in an address: the trailing `<base32>.k` token (last two segments).
pub fn key_of(addr: &str) -> &str {
    match addr.rmatch_indices('.').nth(1) {
        Some((i, _)) => &addr[i + 1..],
        None => addr,
    }
}

/// Switch label part of a path address (`addr[4..23]`), if long enough.
pub fn path_of(addr: &str) -> Option<&str> {
    addr.get(4..23)
}

/// Version digits of a path address (`addr[1..3]`), if long enough.
pub fn version_of(addr: &str) -> Option<&str> {
    addr.get(1..3)
}

/// Derive the node's IPv6 address from its public key: the first 16 bytes of
/// SHA-512(SHA-512(key)), as eight uncompressed hex groups.
pub fn key_to_ip(key: &str) -> Result<String, FormatError> {
    let body = key
        .strip_suffix(".k")
        .ok_or_else(|| FormatError::MissingKeySuffix(key.to_string()))?;
    let bytes = base32::decode(body)?;
    if bytes.len() != 32 {
        return Err(FormatError::KeyLength(bytes.len()));
    }
    let first = Sha512::digest(&bytes);
    let second = Sha512::digest(first);
    Ok(second[..16]
        .chunks(2)
        .map(hex::encode)
        .collect::<Vec<_>>()
        .join(":"))
}

/// IPv6 address for a path address.
pub fn addr_to_ip(addr: &str) -> Result<String, FormatError> {
    key_to_ip(key_of(addr))
}

/// Every address form recoverable from one token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Addresses {
    pub path: Option<String>,
    pub key: Option<String>,
    pub ip: String,
}

/// Classify `token` and fill in the forms that follow from it (path gives key, key gives ip).
pub fn collect(token: &str) -> Result<Addresses, FormatError> {
    match classify(token)? {
        AddressClass::Path => {
            let key = key_of(token);
            Ok(Addresses {
                path: Some(token.to_string()),
                key: Some(key.to_string()),
                ip: key_to_ip(key)?,
            })
        }
        AddressClass::Key => Ok(Addresses {
            path: None,
            key: Some(token.to_string()),
            ip: key_to_ip(token)?,
        }),
        AddressClass::Ip => Ok(Addresses {
            path: None,
            key: None,
            ip: token.to_string(),
        }),
    }
}

#[cfg(test)]
pub(crate) fn sample_key(seed: u8) -> String {
    format!("{}.k", base32::encode(&[seed; 32]))
}
