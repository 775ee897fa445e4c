//! Pure transformations for segmented fetching.
//!
//! Planning, backoff and range validation. Nothing in here performs I/O.

mod retry;
mod segment;
mod validation;

pub use retry::retry_delay;
pub use segment::plan_segments;
pub use validation::{ContentRange, PARTIAL_CONTENT, is_partial_content, validate_range_response};
