//! Cookie authentication for admin requests.
//!
//! The router hands out a cookie; the client proves knowledge of the admin password
//! with `sha256(password || cookie)`, then replaces that hash with a digest of the whole
//! encoded request so the request itself is bound to the cookie.

use sha2::{Digest, Sha256};

use crate::wire::{self, Dict, WireError};

/// First round: hex SHA-256 of password followed by cookie.
pub fn password_hash(password: &str, cookie: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(password.as_bytes());
    hasher.update(cookie.as_bytes());
    hex::encode(hasher.finalize())
}

/// Turn a plain request into an `auth` request for `cookie`.
///
/// The original command moves to `aq` and `q` becomes `"auth"`. The final `hash` is the
/// hex SHA-256 of the encoded request while it still carries the first-round hash.
pub fn authenticate(mut request: Dict, password: &str, cookie: &str) -> Result<Dict, WireError> {
    wire::put(&mut request, "hash", password_hash(password, cookie));
    wire::put(&mut request, "cookie", cookie);
    if let Some(command) = request.remove(b"q".as_slice()) {
        request.insert(b"aq".to_vec(), command);
    }
    wire::put(&mut request, "q", "auth");

    let encoded = wire::encode_dict(&request)?;
    wire::put(&mut request, "hash", hex::encode(Sha256::digest(&encoded)));
    Ok(request)
}
