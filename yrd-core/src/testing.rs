//! In-process stand-in for the router's admin socket, for tests.

use std::collections::HashSet;
use std::net::{SocketAddr, UdpSocket};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use sha2::{Digest, Sha256};

use crate::auth::password_hash;
use crate::wire::{self, Dict, MAX_DATAGRAM_LEN};

pub(crate) struct FakeRouter {
    pub addr: SocketAddr,
    log: Arc<Mutex<Vec<Dict>>>,
}

impl FakeRouter {
    /// Every request received so far, in arrival order.
    pub fn requests(&self) -> Vec<Dict> {
        self.log.lock().unwrap().clone()
    }
}

/// Dictionary of text values.
pub(crate) fn reply(pairs: &[(&str, &str)]) -> Dict {
    let mut d = Dict::new();
    for (k, v) in pairs {
        wire::put(&mut d, k, *v);
    }
    d
}

pub(crate) fn text<'a>(dict: &'a Dict, key: &str) -> &'a str {
    dict.get(key.as_bytes()).and_then(wire::as_str).unwrap_or("")
}

/// Start a router on 127.0.0.1. `handler` gets the command and its args and returns the
/// datagrams to send back; returning none falls back to `pong` for `ping` and an empty
/// success otherwise. With a password, everything except `ping` and `cookie` must be a
/// correctly signed `auth` request.
pub(crate) fn spawn(
    password: Option<&str>,
    handler: impl Fn(&str, &Dict) -> Vec<Dict> + Send + 'static,
) -> FakeRouter {
    let socket = UdpSocket::bind("127.0.0.1:0").unwrap();
    socket
        .set_read_timeout(Some(Duration::from_secs(10)))
        .unwrap();
    let addr = socket.local_addr().unwrap();
    let log = Arc::new(Mutex::new(Vec::new()));
    let password = password.map(str::to_string);

    let thread_log = log.clone();
    thread::spawn(move || {
        let mut buf = vec![0u8; MAX_DATAGRAM_LEN];
        let mut issued = HashSet::new();
        while let Ok((n, from)) = socket.recv_from(&mut buf) {
            let Ok(req) = wire::decode_dict(&buf[..n]) else {
                continue;
            };
            thread_log.lock().unwrap().push(req.clone());

            let replies = match text(&req, "q") {
                "cookie" => {
                    let cookie = format!("{}", 123 + issued.len());
                    issued.insert(cookie.clone());
                    vec![reply(&[("cookie", cookie.as_str())])]
                }
                "auth" => match &password {
                    Some(pw) if signed_correctly(&req, pw, &issued) => {
                        dispatch(&handler, text(&req, "aq"), &req)
                    }
                    _ => vec![reply(&[("error", "Auth failed.")])],
                },
                "ping" => dispatch(&handler, "ping", &req),
                q if password.is_none() => dispatch(&handler, q, &req),
                _ => vec![reply(&[("error", "Auth failed.")])],
            };
            for r in replies {
                let bytes = wire::encode_dict(&r).unwrap();
                let _ = socket.send_to(&bytes, from);
            }
        }
    });

    FakeRouter { addr, log }
}

fn dispatch(
    handler: &impl Fn(&str, &Dict) -> Vec<Dict>,
    command: &str,
    req: &Dict,
) -> Vec<Dict> {
    let empty = Dict::new();
    let args = match req.get(b"args".as_slice()) {
        Some(wire::Value::Dict(d)) => d,
        _ => &empty,
    };
    let replies = handler(command, args);
    if !replies.is_empty() {
        return replies;
    }
    if command == "ping" {
        vec![reply(&[("q", "pong")])]
    } else {
        vec![reply(&[("error", "none")])]
    }
}

/// Check the request hash the way the router does: put the password hash back in
/// place of the request hash and digest the re-encoded request.
fn signed_correctly(req: &Dict, password: &str, issued: &HashSet<String>) -> bool {
    let cookie = text(req, "cookie");
    if !issued.contains(cookie) {
        return false;
    }
    let mut check = req.clone();
    wire::put(&mut check, "hash", password_hash(password, cookie));
    let Ok(encoded) = wire::encode_dict(&check) else {
        return false;
    };
    hex::encode(Sha256::digest(encoded)) == text(req, "hash")
}
