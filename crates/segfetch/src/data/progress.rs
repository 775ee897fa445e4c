use std::fmt;

/// Phases of a transfer.
///
/// Transfers progress through these phases in order:
/// Probing → Fetching → Assembling → Completed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FetchPhase {
    /// Waiting on the HEAD request for the resource length.
    #[default]
    Probing,

    /// Segment requests are in flight.
    ///
    /// Reported once when fetching starts and again after every segment
    /// finishes, successfully or not.
    Fetching,

    /// All segments arrived; writing them into the destination file.
    Assembling,

    /// The destination file is in place.
    Completed,
}

impl fmt::Display for FetchPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FetchPhase::Probing => write!(f, "Probing"),
            FetchPhase::Fetching => write!(f, "Fetching"),
            FetchPhase::Assembling => write!(f, "Assembling"),
            FetchPhase::Completed => write!(f, "Completed"),
        }
    }
}

/// Snapshot passed to progress callbacks.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Progress {
    pub phase: FetchPhase,

    /// Segments that have reported back, fetched or failed.
    pub segments_done: usize,

    pub segments_total: usize,

    /// Bytes received across all fetched segments.
    pub bytes_done: u64,

    /// Total length of the resource, once known.
    pub bytes_total: Option<u64>,
}

impl Progress {
    /// Percentage of bytes received.
    ///
    /// Returns `None` if the total is unknown.
    #[must_use]
    pub fn percentage(&self) -> Option<f64> {
        self.bytes_total.map(|total| {
            if total == 0 {
                if self.is_completed() { 100.0 } else { 0.0 }
            } else {
                (self.bytes_done as f64 / total as f64) * 100.0
            }
        })
    }

    #[must_use]
    pub fn is_completed(&self) -> bool { self.phase == FetchPhase::Completed }
}
