use std::time::Duration;

/// Delay to wait after a failed attempt, using linear backoff.
///
/// The delay formula is: `unit * attempt`
///
/// # Arguments
///
/// * `attempt` - The attempt that just failed (1-indexed: 1 = first attempt)
/// * `unit` - The backoff unit
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use segfetch::core::retry_delay;
///
/// let unit = Duration::from_secs(3);
/// assert_eq!(retry_delay(1, unit), Duration::from_secs(3));
/// assert_eq!(retry_delay(2, unit), Duration::from_secs(6));
/// assert_eq!(retry_delay(4, unit), Duration::from_secs(12));
/// ```
pub fn retry_delay(attempt: u32, unit: Duration) -> Duration { unit.saturating_mul(attempt) }
