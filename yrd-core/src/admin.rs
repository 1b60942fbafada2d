//! Router admin commands on top of [`Session`].

use std::collections::VecDeque;

use crate::credential::Credential;
use crate::error::{Error, Result};
use crate::poll::{poll, Exchange, Pages, Peers};
use crate::protocol::{Query, Response};
use crate::session::Session;
use crate::wire::Value;

/// Timeout the router uses for a ping when the caller does not pick one.
pub const DEFAULT_PING_TIMEOUT_MS: u32 = 5000;

impl Session {
    /// Liveness check: true when the router answers `pong`.
    pub fn ping(&mut self) -> Result<bool> {
        let resp = self.request(&Query::new("ping"))?;
        Ok(resp.str("q") == Some("pong"))
    }

    /// Look up a node in the node store; without `ip`, the router reports itself.
    pub fn node_for_addr(&mut self, ip: Option<&str>) -> Result<Response> {
        let mut query = Query::new("NodeStore_nodeForAddr");
        if let Some(ip) = ip {
            query = query.arg("ip", ip);
        }
        self.request(&query)
    }

    /// Every route in the routing table, across all pages.
    pub fn dump_table(&mut self) -> Peers<'_, Session> {
        Peers::new(poll(self, Query::new("NodeStore_dumpTable")), "routingTable")
    }

    /// Live peers with their link statistics, across all pages.
    pub fn peer_stats(&mut self) -> Peers<'_, Session> {
        Peers::new(
            poll(self, Query::new("InterfaceController_peerStats")),
            "peers",
        )
    }

    /// Stats for every open crypto session, one reply per handle. Each page of handles
    /// is queried before the next page is requested.
    pub fn session_stats(&mut self) -> SessionStats<'_> {
        SessionStats {
            pages: poll(self, Query::new("SessionManager_getHandles")),
            handles: VecDeque::new(),
            done: false,
        }
    }

    /// Start a search for `addr`. The router streams results until one marked `complete`.
    /// `max_requests` of `None` leaves the limit to the router.
    ///
    /// Drain the returned iterator before issuing another call on this session; unread
    /// results would otherwise be taken as replies to the next request.
    pub fn search(&mut self, addr: &str, max_requests: Option<i64>) -> Result<Search<'_>> {
        let query = Query::new("SearchRunner_search")
            .arg("ipv6", addr)
            .arg("maxRequests", max_requests.unwrap_or(-1));
        self.send(&query)?;
        Ok(Search {
            session: self,
            done: false,
        })
    }

    /// Ping a node through the router module (DHT level).
    pub fn router_ping(&mut self, path: &str, timeout_ms: Option<u32>) -> Result<Response> {
        self.generic_ping("RouterModule_pingNode", path, timeout_ms)
    }

    /// Ping a switch label (switch level).
    pub fn switch_ping(&mut self, path: &str, timeout_ms: Option<u32>) -> Result<Response> {
        self.generic_ping("SwitchPinger_ping", path, timeout_ms)
    }

    fn generic_ping(
        &mut self,
        command: &str,
        path: &str,
        timeout_ms: Option<u32>,
    ) -> Result<Response> {
        let query = Query::new(command)
            .arg("path", path)
            .arg("timeout", timeout_ms.unwrap_or(DEFAULT_PING_TIMEOUT_MS));
        self.request(&query)
    }

    /// Ask `node_to_query` for its next hop towards `target`.
    pub fn next_hop(&mut self, target: &str, node_to_query: &str) -> Result<Response> {
        let query = Query::new("RouterModule_nextHop")
            .arg("target", target)
            .arg("nodeToQuery", node_to_query);
        self.request(&query)
    }

    /// Link number `link_num` of node `parent`.
    pub fn get_link(&mut self, parent: &str, link_num: i64) -> Result<Response> {
        let query = Query::new("NodeStore_getLink")
            .arg("parent", parent)
            .arg("linkNum", link_num);
        self.request(&query)
    }

    /// Authorize `password` for inbound connections, labelled `user`.
    pub fn add_password(&mut self, user: &str, password: &str) -> Result<Response> {
        let query = Query::new("AuthorizedPasswords_add")
            .arg("user", user)
            .arg("password", password);
        self.request(&query)
    }

    /// Users with an authorized inbound password.
    pub fn list_passwords(&mut self) -> Result<Vec<String>> {
        let resp = self.request(&Query::new("AuthorizedPasswords_list"))?;
        let users = resp
            .list("users")
            .ok_or_else(|| Error::Protocol("password list without users".into()))?;
        users
            .iter()
            .map(|u| {
                crate::wire::as_str(u)
                    .map(str::to_string)
                    .ok_or_else(|| Error::Protocol("user name is not text".into()))
            })
            .collect()
    }

    pub fn remove_password(&mut self, user: &str) -> Result<Response> {
        self.request(&Query::new("AuthorizedPasswords_remove").arg("user", user))
    }

    /// Open an outbound connection on UDP interface `interface_number`.
    pub fn udp_begin_connection(
        &mut self,
        credential: &Credential,
        interface_number: u32,
    ) -> Result<Response> {
        let query = Query::new("UDPInterface_beginConnection")
            .arg("address", &credential.address)
            .arg("publicKey", &credential.public_key)
            .arg("password", &credential.password)
            .arg("interfaceNumber", interface_number);
        self.request(&query)
    }
}

/// `SessionManager_sessionStats` replies in handle order; ends after the last handle or
/// the first error.
pub struct SessionStats<'a> {
    pages: Pages<'a, Session>,
    handles: VecDeque<i64>,
    done: bool,
}

impl Iterator for SessionStats<'_> {
    type Item = Result<Response>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if self.done {
                return None;
            }
            if let Some(handle) = self.handles.pop_front() {
                let query = Query::new("SessionManager_sessionStats").arg("handle", handle);
                let stats = self.pages.exchange().request(&query);
                self.done = stats.is_err();
                return Some(stats);
            }
            let page = self.pages.next()?.and_then(|resp| handles_of(&resp));
            match page {
                Ok(handles) => self.handles.extend(handles),
                Err(e) => {
                    self.done = true;
                    return Some(Err(e));
                }
            }
        }
    }
}

fn handles_of(resp: &Response) -> Result<Vec<i64>> {
    resp.list("handles")
        .unwrap_or_default()
        .iter()
        .map(|h| match h {
            Value::Int(h) => Ok(*h),
            _ => Err(Error::Protocol("session handle is not an integer".into())),
        })
        .collect()
}

/// Streaming search results; ends at the router's `complete` marker or the first error.
pub struct Search<'a> {
    session: &'a mut Session,
    done: bool,
}

impl Iterator for Search<'_> {
    type Item = Result<Response>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.session.recv() {
            Ok(resp) if resp.contains("complete") => {
                self.done = true;
                None
            }
            Ok(resp) => Some(Ok(resp)),
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}
