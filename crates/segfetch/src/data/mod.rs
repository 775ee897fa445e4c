//! Immutable data types for segmented transfers.
//!
//! Requests, segments, per-segment results, the aggregate outcome, and the
//! options and progress types passed between the layers. None of these are
//! mutated after construction.

pub mod options;
pub mod outcome;
pub mod progress;
pub mod request;
pub mod segment;

pub use options::{FetchOptions, Timeouts};
pub use outcome::{FailedSegment, TransferOutcome, TransferReport};
pub use progress::{FetchPhase, Progress};
pub use request::TransferRequest;
pub use segment::{Segment, SegmentOutcome, SegmentResult};
