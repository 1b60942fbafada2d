//! Admin session: one UDP socket connected to the router's admin port.
//!
//! Every call is a blocking send followed by a blocking receive with a fixed timeout.
//! Nothing is retried. With an admin password set, each request first fetches a cookie
//! and is then sent as a signed `auth` request (two round trips).

use std::fmt;
use std::io;
use std::net::{Ipv4Addr, Ipv6Addr, SocketAddr, ToSocketAddrs, UdpSocket};

use crate::auth;
use crate::config::{self, AdminConfig};
use crate::error::{Error, Result};
use crate::poll::Exchange;
use crate::protocol::{Query, Response};
use crate::wire::{self, Dict, Pretty, Value, MAX_DATAGRAM_LEN};

pub struct Session {
    socket: UdpSocket,
    peer: SocketAddr,
    password: String,
    debug: bool,
}

impl Session {
    /// Connect to `host:port` and check that a router answers `ping`.
    /// Mirroring is enabled when `YRD_DEBUG` is set.
    pub fn connect(host: &str, port: u16, password: &str) -> Result<Session> {
        let mut config = AdminConfig::new(host, port, password);
        config.debug = config::debug_from_env();
        Self::connect_with(&config)
    }

    /// Connect using `config`. Fails with a transport error if nothing answers in time,
    /// or a protocol error if the reply to `ping` is not `pong`.
    pub fn connect_with(config: &AdminConfig) -> Result<Session> {
        let peer = (config.host.as_str(), config.port)
            .to_socket_addrs()?
            .next()
            .ok_or_else(|| {
                io::Error::new(
                    io::ErrorKind::AddrNotAvailable,
                    format!("no address for {}", config.host),
                )
            })?;
        let bind: SocketAddr = if peer.is_ipv4() {
            (Ipv4Addr::UNSPECIFIED, 0).into()
        } else {
            (Ipv6Addr::UNSPECIFIED, 0).into()
        };
        let socket = UdpSocket::bind(bind)?;
        socket.connect(peer)?;
        socket.set_read_timeout(Some(config.timeout()))?;

        let mut session = Session {
            socket,
            peer,
            password: config.password.clone(),
            debug: config.debug,
        };
        if !session.ping()? {
            tracing::warn!(%peer, "admin socket did not answer ping with pong");
            return Err(Error::Protocol(format!(
                "not a compatible router socket ({})",
                peer
            )));
        }
        tracing::debug!(%peer, authenticated = session.is_authenticated(), "admin session open");
        Ok(session)
    }

    /// Close the socket.
    pub fn disconnect(self) {
        tracing::debug!(peer = %self.peer, "admin session closed");
    }

    pub fn peer_addr(&self) -> SocketAddr {
        self.peer
    }

    /// Whether requests are signed with the admin password.
    pub fn is_authenticated(&self) -> bool {
        !self.password.is_empty()
    }

    /// Receive and decode one datagram. A reply whose `error` is not `"none"` becomes
    /// [`Error::Remote`].
    pub fn recv(&mut self) -> Result<Response> {
        let mut buf = vec![0u8; MAX_DATAGRAM_LEN];
        let n = self.socket.recv(&mut buf)?;
        let dict = wire::decode_dict(&buf[..n])?;
        if self.debug {
            tracing::debug!(peer = %self.peer, response = %Pretty(&dict), "admin response");
        }
        Ok(Response::from_dict(dict)?)
    }

    /// Encode `dict` and send it as one datagram, unsigned.
    pub fn send_raw(&mut self, dict: &Dict) -> Result<()> {
        let bytes = wire::encode_dict(dict)?;
        self.socket.send(&bytes)?;
        Ok(())
    }

    /// Send `query`, signing it first when a password is configured.
    pub fn send(&mut self, query: &Query) -> Result<()> {
        let mut request = query.to_dict();
        if self.is_authenticated() {
            let cookie = self.cookie()?;
            request = auth::authenticate(request, &self.password, &cookie)?;
        }
        if self.debug {
            tracing::debug!(peer = %self.peer, request = %Pretty(&request), "admin request");
        }
        self.send_raw(&request)
    }

    fn cookie(&mut self) -> Result<String> {
        self.send_raw(&Query::new("cookie").to_dict())?;
        let resp = self.recv()?;
        match resp.get("cookie") {
            Some(Value::Bytes(b)) => String::from_utf8(b.clone())
                .map_err(|_| Error::Protocol("cookie is not text".into())),
            Some(Value::Int(n)) => Ok(n.to_string()),
            _ => Err(Error::Protocol("cookie reply without cookie".into())),
        }
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("peer", &self.peer)
            .field("authenticated", &self.is_authenticated())
            .field("debug", &self.debug)
            .finish_non_exhaustive()
    }
}

impl Exchange for Session {
    fn request(&mut self, query: &Query) -> Result<Response> {
        self.send(query)?;
        self.recv()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::testing::{self, reply};

    fn config_for(addr: SocketAddr, password: &str) -> AdminConfig {
        let mut c = AdminConfig::new("127.0.0.1", addr.port(), password);
        c.timeout_ms = 2000;
        c
    }

    #[test]
    fn connect_without_password() {
        let router = testing::spawn(None, |_, _| vec![]);
        let mut session = Session::connect_with(&config_for(router.addr, "")).unwrap();
        assert_eq!(session.peer_addr(), router.addr);
        assert!(!session.is_authenticated());
        assert!(session.ping().unwrap());
        session.disconnect();

        let log = router.requests();
        assert_eq!(log.len(), 2);
        assert!(log.iter().all(|r| testing::text(r, "q") == "ping"));
    }

    #[test]
    fn connect_with_password_signs_requests() {
        let router = testing::spawn(Some("p"), |_, _| vec![]);
        let session = Session::connect("127.0.0.1", router.addr.port(), "p").unwrap();
        assert!(session.is_authenticated());

        let log = router.requests();
        assert_eq!(testing::text(&log[0], "q"), "cookie");
        assert_eq!(testing::text(&log[1], "q"), "auth");
        assert_eq!(testing::text(&log[1], "aq"), "ping");
    }

    #[test]
    fn debug_output_hides_password() {
        let router = testing::spawn(Some("hunter2"), |_, _| vec![]);
        let session = Session::connect_with(&config_for(router.addr, "hunter2")).unwrap();
        let shown = format!("{session:?}");
        assert!(shown.contains("authenticated: true"));
        assert!(shown.contains(&router.addr.to_string()));
        assert!(!shown.contains("hunter2"));
    }

    #[test]
    fn wrong_password_is_remote_error() {
        let router = testing::spawn(Some("p"), |_, _| vec![]);
        let err = Session::connect_with(&config_for(router.addr, "q")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Remote);
        assert_eq!(err.remote_message(), Some("Auth failed."));
    }

    #[test]
    fn not_a_router() {
        let router = testing::spawn(None, |q, _| {
            if q == "ping" {
                vec![reply(&[("q", "nope")])]
            } else {
                vec![]
            }
        });
        let err = Session::connect_with(&config_for(router.addr, "")).unwrap_err();
        assert!(matches!(err, Error::Protocol(_)));
    }

    #[test]
    fn silent_endpoint_times_out() {
        let silent = UdpSocket::bind("127.0.0.1:0").unwrap();
        let mut config = config_for(silent.local_addr().unwrap(), "");
        config.timeout_ms = 200;
        let err = Session::connect_with(&config).unwrap_err();
        assert!(err.is_timeout());
        assert_eq!(err.kind(), ErrorKind::Transport);
    }

    #[test]
    fn remote_error_carries_response() {
        let router = testing::spawn(None, |q, _| match q {
            "Broken" => vec![reply(&[("error", "boom"), ("detail", "x")])],
            _ => vec![],
        });
        let mut session = Session::connect_with(&config_for(router.addr, "")).unwrap();
        let err = session.request(&Query::new("Broken")).unwrap_err();
        match err {
            Error::Remote(remote) => {
                assert_eq!(remote.message(), Some("boom"));
                assert!(remote.response().contains_key(b"detail".as_slice()));
            }
            other => panic!("expected remote error, got {other:?}"),
        }
    }

    #[test]
    fn error_none_is_success() {
        let router = testing::spawn(None, |q, _| match q {
            "Fine" => vec![reply(&[("error", "none"), ("ok", "yes")])],
            _ => vec![],
        });
        let mut session = Session::connect_with(&config_for(router.addr, "")).unwrap();
        let resp = session.request(&Query::new("Fine")).unwrap();
        assert_eq!(resp.str("ok"), Some("yes"));
    }

    #[test]
    fn arguments_reach_router() {
        let router = testing::spawn(Some("p"), |q, args| match q {
            "Echo" => {
                let mut d = Dict::new();
                if let Some(v) = args.get(b"word".as_slice()) {
                    d.insert(b"word".to_vec(), v.clone());
                }
                vec![d]
            }
            _ => vec![],
        });
        let mut session = Session::connect_with(&config_for(router.addr, "p")).unwrap();
        let resp = session
            .request(&Query::new("Echo").arg("word", "hello"))
            .unwrap();
        assert_eq!(resp.str("word"), Some("hello"));
    }

    #[test]
    fn debug_mirror_does_not_change_protocol() {
        let router = testing::spawn(Some("p"), |_, _| vec![]);
        let mut config = config_for(router.addr, "p");
        config.debug = true;
        let mut session = Session::connect_with(&config).unwrap();
        assert!(session.ping().unwrap());
    }
}
