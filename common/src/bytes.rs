//! Byte-key range bounds for scan filtering.

use std::ops::Bound::{Excluded, Included, Unbounded};
use std::ops::{Bound, RangeBounds};

use bytes::Bytes;

/// A pair of lower/upper bounds over byte keys.
///
/// Scans over a partitioned table page in partitioner order, so key-range
/// restrictions cannot be pushed into the scan statement. The bounds are
/// applied record by record on the consumer side instead.
#[derive(Clone, Debug)]
pub struct KeyBounds {
    pub start: Bound<Bytes>,
    pub end: Bound<Bytes>,
}

impl KeyBounds {
    pub fn new(start: Bound<Bytes>, end: Bound<Bytes>) -> Self {
        Self { start, end }
    }

    /// Bounds that accept every key.
    pub fn unbounded() -> Self {
        Self {
            start: Unbounded,
            end: Unbounded,
        }
    }

    /// Builds bounds from the four optional endpoints of an iterator request.
    ///
    /// An exclusive endpoint takes precedence over its inclusive counterpart
    /// when both are supplied.
    pub fn from_endpoints(
        gt: Option<Bytes>,
        gte: Option<Bytes>,
        lt: Option<Bytes>,
        lte: Option<Bytes>,
    ) -> Self {
        let start = match (gt, gte) {
            (Some(k), _) => Excluded(k),
            (None, Some(k)) => Included(k),
            (None, None) => Unbounded,
        };
        let end = match (lt, lte) {
            (Some(k), _) => Excluded(k),
            (None, Some(k)) => Included(k),
            (None, None) => Unbounded,
        };
        Self { start, end }
    }

    pub fn contains(&self, k: &[u8]) -> bool {
        (match &self.start {
            Included(s) => k >= s.as_ref(),
            Excluded(s) => k > s.as_ref(),
            Unbounded => true,
        }) && (match &self.end {
            Included(e) => k <= e.as_ref(),
            Excluded(e) => k < e.as_ref(),
            Unbounded => true,
        })
    }

    /// True when no endpoint restricts the range.
    pub fn is_unbounded(&self) -> bool {
        matches!(self.start, Unbounded) && matches!(self.end, Unbounded)
    }
}

impl RangeBounds<Bytes> for KeyBounds {
    fn start_bound(&self) -> Bound<&Bytes> {
        self.start.as_ref()
    }
    fn end_bound(&self) -> Bound<&Bytes> {
        self.end.as_ref()
    }
}
