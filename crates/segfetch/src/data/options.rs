use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use super::progress::Progress;

/// Attempts per segment before a transport failure becomes terminal.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 5;

/// Backoff unit; the wait after failed attempt `n` is `n * unit`.
pub const DEFAULT_BACKOFF_UNIT: Duration = Duration::from_secs(3);

/// Transport timeouts for the bundled HTTP client.
///
/// These bound a single attempt; the retry loop bounds the number of
/// attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timeouts {
    /// Time allowed to establish a connection.
    ///
    /// Default: 30s
    pub connect: Duration,

    /// Time allowed for one whole request, body included.
    ///
    /// Default: None
    pub request: Option<Duration>,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            connect: Duration::from_secs(30),
            request: None,
        }
    }
}

/// Configuration for segmented transfers.
///
/// # Examples
///
/// ```
/// use segfetch::FetchOptions;
/// use std::time::Duration;
///
/// let options = FetchOptions::default()
///     .max_attempts(3)
///     .backoff_unit(Duration::from_millis(500))
///     .max_in_flight(Some(16))
///     .header("User-Agent", "segfetch/0.1");
/// ```
#[derive(Clone)]
pub struct FetchOptions {
    /// Total attempts per segment for transport errors, including the first.
    ///
    /// - Only transport errors (connection reset, timeout, DNS) are retried
    /// - A status other than 206 or a bad `Content-Range` fails immediately
    ///
    /// Default: 5
    pub max_attempts: u32,

    /// Linear backoff unit between attempts.
    ///
    /// The wait after failed attempt `n` is `n * backoff_unit`. No wait
    /// follows the final attempt.
    ///
    /// Default: 3s
    pub backoff_unit: Duration,

    /// Upper bound on simultaneous segment requests.
    ///
    /// Segments beyond the bound wait for a free slot. `None` sends every
    /// segment at once.
    ///
    /// Default: None
    pub max_in_flight: Option<usize>,

    /// Overall bound on the fetch phase.
    ///
    /// When it elapses, in-flight segments are abandoned and nothing is
    /// written.
    ///
    /// Default: None
    pub deadline: Option<Duration>,

    /// Extra HTTP headers sent with every segment request.
    ///
    /// `Range` and `Accept-Encoding` are always set by the fetcher and take
    /// precedence.
    ///
    /// Default: empty
    pub headers: Arc<[(String, String)]>,

    /// Progress callback invoked on phase transitions and after every
    /// segment reports back.
    ///
    /// Default: None
    pub on_progress: Option<Arc<dyn Fn(&Progress) + Send + Sync>>,
}

// Header values may carry credentials; only names are printed.
impl fmt::Debug for FetchOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let header_names: Vec<&str> = self.headers.iter().map(|(k, _)| k.as_str()).collect();
        f.debug_struct("FetchOptions")
            .field("max_attempts", &self.max_attempts)
            .field("backoff_unit", &self.backoff_unit)
            .field("max_in_flight", &self.max_in_flight)
            .field("deadline", &self.deadline)
            .field("headers", &header_names)
            .field("on_progress", &"{ ... }")
            .finish()
    }
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            max_attempts:  DEFAULT_MAX_ATTEMPTS,
            backoff_unit:  DEFAULT_BACKOFF_UNIT,
            max_in_flight: None,
            deadline:      None,
            headers:       Arc::new([]),
            on_progress:   None,
        }
    }
}

impl FetchOptions {
    /// Set the attempt budget. Values below 1 are raised to 1.
    #[must_use]
    pub fn max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }

    #[must_use]
    pub fn backoff_unit(mut self, backoff_unit: Duration) -> Self {
        self.backoff_unit = backoff_unit;
        self
    }

    /// Cap simultaneous requests. `Some(0)` is treated as `Some(1)`.
    #[must_use]
    pub fn max_in_flight(mut self, max_in_flight: Option<usize>) -> Self {
        self.max_in_flight = max_in_flight.map(|n| n.max(1));
        self
    }

    #[must_use]
    pub fn deadline(mut self, deadline: Option<Duration>) -> Self {
        self.deadline = deadline;
        self
    }

    /// Add a single custom HTTP header.
    ///
    /// # Examples
    ///
    /// ```
    /// use segfetch::FetchOptions;
    ///
    /// let options = FetchOptions::default()
    ///     .header("Authorization", "Bearer token")
    ///     .header("User-Agent", "MyApp/1.0");
    /// assert_eq!(options.headers.len(), 2);
    /// ```
    #[must_use]
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        let mut headers: Vec<_> = self.headers.iter().cloned().collect();
        headers.push((key.into(), value.into()));
        self.headers = Arc::from(headers);
        self
    }

    /// Replace all custom headers.
    #[must_use]
    pub fn headers(mut self, headers: Vec<(String, String)>) -> Self {
        self.headers = Arc::from(headers);
        self
    }

    #[must_use]
    pub fn on_progress(mut self, on_progress: Arc<dyn Fn(&Progress) + Send + Sync>) -> Self {
        self.on_progress = Some(on_progress);
        self
    }

    pub(crate) fn report(&self, progress: Progress) {
        if let Some(ref callback) = self.on_progress {
            callback(&progress);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[test]
    fn test_defaults() {
        let options = FetchOptions::default();
        assert_eq!(options.max_attempts, 5);
        assert_eq!(options.backoff_unit, Duration::from_secs(3));
        assert!(options.max_in_flight.is_none());
        assert!(options.deadline.is_none());
        assert!(options.headers.is_empty());
    }

    #[test]
    fn test_builder_clamps() {
        let options = FetchOptions::default().max_attempts(0).max_in_flight(Some(0));
        assert_eq!(options.max_attempts, 1);
        assert_eq!(options.max_in_flight, Some(1));
    }

    #[test]
    fn test_headers_replace() {
        let options = FetchOptions::default()
            .header("A", "1")
            .headers(vec![("B".to_string(), "2".to_string())]);
        assert_eq!(&*options.headers, &[("B".to_string(), "2".to_string())]);
    }

    #[test]
    fn test_debug_hides_header_values() {
        let options = FetchOptions::default().header("Authorization", "Bearer secret-token");
        let printed = format!("{options:?}");
        assert!(printed.contains("Authorization"));
        assert!(!printed.contains("secret-token"));
    }

    #[test]
    fn test_report_invokes_callback() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let options = FetchOptions::default().on_progress(Arc::new(move |p: &Progress| {
            sink.lock().unwrap().push(p.phase);
        }));

        options.report(Progress::default());
        assert_eq!(seen.lock().unwrap().len(), 1);
    }
}
