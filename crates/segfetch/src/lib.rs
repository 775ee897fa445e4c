//! Segmented HTTP range downloading with positional reassembly.
//!
//! A resource is split into byte-range segments, the segments are fetched
//! concurrently with bounded retry, and the results are written into one
//! local file at their offsets.
//!
//! # Architecture
//!
//! This crate follows the three-layer pattern:
//! - [`data`] - Immutable requests, segments, results and options
//! - [`core`] - Pure transformations: planning, backoff, range validation
//! - [`effects`] - I/O operations with trait abstraction
//!
//! # Example
//!
//! ```no_run
//! use segfetch::{FetchOptions, ReqwestClient, TransferCoordinator, TransferOutcome, TransferRequest};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let request = TransferRequest::new("https://example.com/big.iso", 16, "big.iso")?;
//! let coordinator = TransferCoordinator::new(ReqwestClient::new()?)
//!     .with_options(FetchOptions::default().max_in_flight(Some(8)));
//!
//! match coordinator.run(&request).await? {
//!     TransferOutcome::Success(report) => println!("{:.2} MB/s", report.throughput_mbps()),
//!     TransferOutcome::Failure { failed_segments } => {
//!         for failed in failed_segments {
//!             eprintln!("{failed}");
//!         }
//!     }
//! }
//! # Ok(())
//! # }
//! ```

pub mod core;
pub mod data;
pub mod effects;
mod error;

pub use data::{
    FailedSegment, FetchOptions, FetchPhase, Progress, Segment, SegmentOutcome, SegmentResult,
    Timeouts, TransferOutcome, TransferReport, TransferRequest,
};
pub use effects::{
    Assembler, HttpClient, HttpResponse, ResourceMetadata, SegmentFetcher, TransferCoordinator,
};
pub use error::{Error, ProtocolError, Result, SegmentError};

#[cfg(feature = "reqwest")]
pub use effects::ReqwestClient;
