//! Paginated queries: request page 0, 1, 2, ... until a reply arrives without `more`.

use std::collections::VecDeque;

use crate::error::{Error, Result};
use crate::peer::Peer;
use crate::protocol::{Query, Response};
use crate::wire::Value;

/// One request/response round trip. Implemented by [`crate::Session`].
pub trait Exchange {
    fn request(&mut self, query: &Query) -> Result<Response>;
}

/// Start paginating `query`. Nothing is sent until the first `next()`.
pub fn poll<E: Exchange + ?Sized>(exchange: &mut E, query: Query) -> Pages<'_, E> {
    Pages {
        exchange,
        query,
        page: 0,
        more: true,
    }
}

/// Lazy sequence of reply pages, in page order. Each page is fully received before the
/// next one is requested. Ends after the last page or after the first error.
pub struct Pages<'a, E: Exchange + ?Sized> {
    exchange: &'a mut E,
    query: Query,
    page: i64,
    more: bool,
}

impl<E: Exchange + ?Sized> Pages<'_, E> {
    /// Whether another page will be requested.
    pub fn has_more(&self) -> bool {
        self.more
    }

    /// Index the next request will carry.
    pub fn next_page(&self) -> i64 {
        self.page
    }

    /// The underlying exchange, for follow-up requests between pages.
    pub(crate) fn exchange(&mut self) -> &mut E {
        &mut *self.exchange
    }
}

impl<E: Exchange + ?Sized> Iterator for Pages<'_, E> {
    type Item = Result<Response>;

    fn next(&mut self) -> Option<Self::Item> {
        if !self.more {
            return None;
        }
        self.query.set_page(self.page);
        match self.exchange.request(&self.query) {
            Ok(resp) => {
                if resp.has_more() {
                    self.page += 1;
                } else {
                    self.more = false;
                }
                Some(Ok(resp))
            }
            Err(e) => {
                self.more = false;
                Some(Err(e))
            }
        }
    }
}

/// Peer records listed under `field` across every page. A page is checked whole before
/// any of its records are yielded; a malformed entry ends the sequence with one error.
pub struct Peers<'a, E: Exchange + ?Sized> {
    pages: Pages<'a, E>,
    field: &'static str,
    buffered: VecDeque<Peer>,
    done: bool,
}

impl<'a, E: Exchange + ?Sized> Peers<'a, E> {
    pub fn new(pages: Pages<'a, E>, field: &'static str) -> Self {
        Self {
            pages,
            field,
            buffered: VecDeque::new(),
            done: false,
        }
    }

    fn records(&self, resp: &Response) -> Result<Vec<Peer>> {
        let Some(entries) = resp.list(self.field) else {
            return Ok(Vec::new());
        };
        entries
            .iter()
            .map(|entry| match entry {
                Value::Dict(d) => Ok(Peer::from_dict(d.clone())),
                _ => Err(Error::Protocol(format!(
                    "{} entry is not a dictionary",
                    self.field
                ))),
            })
            .collect()
    }
}

impl<E: Exchange + ?Sized> Iterator for Peers<'_, E> {
    type Item = Result<Peer>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(peer) = self.buffered.pop_front() {
                return Some(Ok(peer));
            }
            if self.done {
                return None;
            }
            let page = self.pages.next()?.and_then(|resp| self.records(&resp));
            match page {
                Ok(records) => self.buffered.extend(records),
                Err(e) => {
                    self.done = true;
                    return Some(Err(e));
                }
            }
        }
    }
}
