use std::fmt;

use bytes::Bytes;

use crate::error::SegmentError;

/// A byte range of the remote resource, fetched independently.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Segment {
    /// Segment index (0-based), diagnostics only
    pub index: u32,
    /// Starting byte offset (inclusive)
    pub start: u64,
    /// Ending byte offset (exclusive); `None` runs to the end of the resource
    pub end:   Option<u64>,
}

impl Segment {
    pub fn is_open_ended(&self) -> bool { self.end.is_none() }

    /// Value for the HTTP `Range` request header.
    ///
    /// HTTP ranges are inclusive, so a closed segment `[start, end)` is sent
    /// as `bytes=start-(end - 1)`.
    pub fn range_header(&self) -> String {
        match self.end {
            Some(end) => format!("bytes={}-{}", self.start, end.saturating_sub(1)),
            None => format!("bytes={}-", self.start),
        }
    }

    /// Number of bytes this segment covers in a resource of `total_length`.
    pub fn len(&self, total_length: u64) -> u64 {
        self.end
            .unwrap_or(total_length)
            .saturating_sub(self.start)
    }

    pub fn is_empty(&self, total_length: u64) -> bool { self.len(total_length) == 0 }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.end {
            Some(end) => write!(f, "#{} [{}, {})", self.index, self.start, end),
            None => write!(f, "#{} [{}, end)", self.index, self.start),
        }
    }
}

/// What happened to one segment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SegmentOutcome {
    Fetched {
        /// Start offset as confirmed by the server's `Content-Range`
        confirmed_start: u64,
        bytes:           Bytes,
    },
    Failed {
        last_error: SegmentError,
        attempts:   u32,
    },
}

/// The result one fetcher hands back to the coordinator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SegmentResult {
    pub segment: Segment,
    pub outcome: SegmentOutcome,
}

impl SegmentResult {
    pub fn fetched(segment: Segment, confirmed_start: u64, bytes: Bytes) -> Self {
        Self {
            segment,
            outcome: SegmentOutcome::Fetched {
                confirmed_start,
                bytes,
            },
        }
    }

    pub fn failed(segment: Segment, last_error: SegmentError, attempts: u32) -> Self {
        Self {
            segment,
            outcome: SegmentOutcome::Failed {
                last_error,
                attempts,
            },
        }
    }

    pub fn is_fetched(&self) -> bool { matches!(self.outcome, SegmentOutcome::Fetched { .. }) }
}
