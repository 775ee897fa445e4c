//! I/O operations for segmented fetching.
//!
//! Network access goes through the [`HttpClient`] trait; the file system is
//! touched only by the [`Assembler`], after every segment has reported.

mod assembler;
mod coordinator;
mod fetcher;
mod http;

pub use assembler::Assembler;
pub use coordinator::TransferCoordinator;
pub use fetcher::SegmentFetcher;
pub use http::{HttpClient, HttpResponse, ResourceMetadata};

#[cfg(feature = "reqwest")]
pub use http::ReqwestClient;
