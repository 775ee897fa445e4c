use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use crate::data::segment::Segment;
use crate::error::SegmentError;

/// A segment that exhausted its attempts or hit a protocol error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailedSegment {
    pub segment:    Segment,
    pub last_error: SegmentError,
    pub attempts:   u32,
}

impl fmt::Display for FailedSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "segment {} ({}) failed after {} attempt(s): {}",
            self.segment,
            self.segment.range_header(),
            self.attempts,
            self.last_error
        )
    }
}

/// Timing and size of a completed transfer.
#[derive(Debug, Clone, PartialEq)]
pub struct TransferReport {
    pub destination: PathBuf,
    pub total_bytes: u64,
    pub segments:    usize,
    pub elapsed:     Duration,
}

impl TransferReport {
    /// Achieved throughput in bytes per second.
    ///
    /// Returns 0.0 when no measurable time elapsed.
    #[must_use]
    pub fn throughput_bps(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs > 0.0 {
            self.total_bytes as f64 / secs
        } else {
            0.0
        }
    }

    /// Throughput in decimal megabytes per second.
    #[must_use]
    pub fn throughput_mbps(&self) -> f64 { self.throughput_bps() / 1_000_000.0 }
}

/// Aggregate result of a transfer.
#[derive(Debug, Clone, PartialEq)]
pub enum TransferOutcome {
    /// Every segment was fetched and the file was assembled.
    Success(TransferReport),
    /// At least one segment failed; nothing was written.
    Failure { failed_segments: Vec<FailedSegment> },
}

impl TransferOutcome {
    pub fn is_success(&self) -> bool { matches!(self, TransferOutcome::Success(_)) }

    pub fn report(&self) -> Option<&TransferReport> {
        match self {
            TransferOutcome::Success(report) => Some(report),
            TransferOutcome::Failure { .. } => None,
        }
    }

    pub fn failed_segments(&self) -> &[FailedSegment] {
        match self {
            TransferOutcome::Success(_) => &[],
            TransferOutcome::Failure { failed_segments } => failed_segments,
        }
    }
}
