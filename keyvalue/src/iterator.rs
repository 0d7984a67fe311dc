//! Pull-based iteration over a paged scan cursor.

use std::collections::VecDeque;
use std::sync::Arc;

use bytes::Bytes;
use common::{CqlSession, CqlValue, KeyBounds, Page, Row, Statement};

use crate::config::IteratorOptions;
use crate::error::{Error, Result};
use crate::model::KeyValueEntry;
use crate::serde::decode_id;

enum State {
    /// No page fetched yet.
    Init,
    /// A page is buffered; `continuation` resumes the scan once it drains.
    Holding {
        rows: VecDeque<Row>,
        continuation: Option<Bytes>,
    },
    /// Natural end of the sequence; `next()` keeps returning `Ok(None)`.
    Done,
    /// Ended explicitly or terminated by an error; `next()` returns
    /// [`Error::IteratorClosed`].
    Closed,
}

/// A single-consumer iterator over the records of one table.
///
/// Records arrive in the store's native scan order. Each `next()` pops from
/// the buffered page; fetching the next page is the only suspension point.
/// The iterator is not restartable: after [`end`](Self::end) or natural
/// exhaustion a fresh iterator must be constructed.
pub struct KeyValueIterator {
    session: Arc<dyn CqlSession>,
    scan: Statement,
    page_size: usize,
    bounds: KeyBounds,
    /// Records still allowed out when a limit was requested.
    remaining: Option<usize>,
    state: State,
}

impl KeyValueIterator {
    pub(crate) fn new(
        session: Arc<dyn CqlSession>,
        scan: Statement,
        page_size: usize,
        options: IteratorOptions,
    ) -> Result<Self> {
        let options = options.normalized();
        if options.reverse {
            return Err(Error::UnsupportedOption(
                "reverse iteration is not supported by the backing cursor".to_string(),
            ));
        }
        let bounds = KeyBounds::from_endpoints(options.gt, options.gte, options.lt, options.lte);
        Ok(Self {
            session,
            scan,
            page_size,
            bounds,
            remaining: options.limit,
            state: State::Init,
        })
    }

    /// Returns the next entry, or `None` when the sequence is exhausted.
    ///
    /// An error from a page fetch is surfaced exactly once; every call after
    /// that returns [`Error::IteratorClosed`].
    #[tracing::instrument(level = "trace", skip_all)]
    pub async fn next(&mut self) -> Result<Option<KeyValueEntry>> {
        if self.remaining == Some(0) && !matches!(self.state, State::Closed) {
            self.state = State::Done;
        }
        loop {
            match std::mem::replace(&mut self.state, State::Done) {
                State::Init => {
                    let page = match self.fetch(None).await {
                        Ok(page) => page,
                        Err(e) => {
                            self.state = State::Closed;
                            return Err(e);
                        }
                    };
                    self.state = State::Holding {
                        rows: VecDeque::from(page.rows),
                        continuation: page.paging_state,
                    };
                }
                State::Holding {
                    mut rows,
                    continuation,
                } => match rows.pop_front() {
                    Some(row) => {
                        let entry = match decode_row(row) {
                            Ok(entry) => entry,
                            Err(e) => {
                                self.state = State::Closed;
                                return Err(e);
                            }
                        };
                        if !self.bounds.contains(&entry.key) {
                            self.state = State::Holding { rows, continuation };
                            continue;
                        }
                        let exhausted = match self.remaining.as_mut() {
                            Some(remaining) => {
                                *remaining -= 1;
                                *remaining == 0
                            }
                            None => false,
                        };
                        if exhausted {
                            self.state = State::Done;
                        } else {
                            self.state = State::Holding { rows, continuation };
                        }
                        return Ok(Some(entry));
                    }
                    None => match continuation {
                        Some(token) => {
                            let page = match self.fetch(Some(token)).await {
                                Ok(page) => page,
                                Err(e) => {
                                    self.state = State::Closed;
                                    return Err(e);
                                }
                            };
                            self.state = State::Holding {
                                rows: VecDeque::from(page.rows),
                                continuation: page.paging_state,
                            };
                        }
                        None => {
                            self.state = State::Done;
                            return Ok(None);
                        }
                    },
                },
                State::Done => {
                    self.state = State::Done;
                    return Ok(None);
                }
                State::Closed => {
                    self.state = State::Closed;
                    return Err(Error::IteratorClosed);
                }
            }
        }
    }

    /// Ends the iteration, releasing any buffered page.
    ///
    /// Safe to call in any state, including before the first `next()` and
    /// after natural exhaustion; calling it again is a no-op. `next()` is
    /// `&mut self`, so no fetch can be in flight while this runs.
    pub fn end(&mut self) {
        self.state = State::Closed;
    }

    async fn fetch(&self, paging_state: Option<Bytes>) -> Result<Page> {
        let page = self
            .session
            .execute_paged(&self.scan, &[], self.page_size, paging_state)
            .await?;
        Ok(page)
    }
}

fn decode_row(row: Row) -> Result<KeyValueEntry> {
    let key = row
        .column(0)
        .and_then(CqlValue::as_text)
        .map(decode_id)
        .ok_or_else(|| Error::Internal("scan returned a non-text id column".to_string()))?;
    let value = row
        .column(1)
        .and_then(CqlValue::as_blob)
        .cloned()
        .ok_or_else(|| Error::Internal("scan returned a non-blob value column".to_string()))?;
    Ok(KeyValueEntry { key, value })
}
