use crate::data::Segment;
use crate::error::ProtocolError;

/// HTTP 206 Partial Content.
pub const PARTIAL_CONTENT: u16 = 206;

/// Returns `true` if the status confirms a range response.
///
/// # Examples
///
/// ```
/// use segfetch::core::is_partial_content;
///
/// assert!(is_partial_content(206));
/// assert!(!is_partial_content(200));
/// assert!(!is_partial_content(416));
/// ```
pub fn is_partial_content(status: u16) -> bool { status == PARTIAL_CONTENT }

/// A parsed `Content-Range: bytes <first>-<last>/<complete>` header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContentRange {
    /// First byte position (inclusive)
    pub first:    u64,
    /// Last byte position (inclusive)
    pub last:     u64,
    /// Complete length, `None` when the server sent `*`
    pub complete: Option<u64>,
}

impl ContentRange {
    /// Parse a `Content-Range` value.
    ///
    /// # Examples
    ///
    /// ```
    /// use segfetch::core::ContentRange;
    ///
    /// let range = ContentRange::parse("bytes 56994-65136/814210").unwrap();
    /// assert_eq!(range.first, 56994);
    /// assert_eq!(range.last, 65136);
    /// assert_eq!(range.complete, Some(814210));
    /// ```
    pub fn parse(value: &str) -> Result<Self, ProtocolError> {
        let malformed = || ProtocolError::MalformedContentRange(value.to_string());

        let (unit, rest) = value.trim().split_once(' ').ok_or_else(malformed)?;
        if !unit.eq_ignore_ascii_case("bytes") {
            return Err(malformed());
        }

        let (span, complete) = rest.trim().split_once('/').ok_or_else(malformed)?;
        let (first, last) = span.split_once('-').ok_or_else(malformed)?;
        let first: u64 = first.trim().parse().map_err(|_| malformed())?;
        let last: u64 = last.trim().parse().map_err(|_| malformed())?;
        if last < first {
            return Err(malformed());
        }

        let complete = match complete.trim() {
            "*" => None,
            n => Some(n.parse::<u64>().map_err(|_| malformed())?),
        };
        if complete.is_some_and(|c| last >= c) {
            return Err(malformed());
        }

        Ok(Self {
            first,
            last,
            complete,
        })
    }

    /// Number of bytes the range spans.
    pub fn len(&self) -> u64 { self.last - self.first + 1 }
}

/// Check a range response against the segment that requested it.
///
/// `total_length` is the resource length the probe reported. Returns the
/// confirmed start offset on success. A stated complete length must equal
/// `total_length`, the confirmed start must equal the requested start, the
/// last byte must be `end - 1` (or `total_length - 1` for the open-ended
/// segment, even when the server answers `*`), and the body must be exactly
/// as long as the confirmed range.
pub fn validate_range_response(
    segment: &Segment,
    total_length: u64,
    status: u16,
    content_range: Option<&str>,
    body_len: u64,
) -> Result<u64, ProtocolError> {
    if !is_partial_content(status) {
        return Err(ProtocolError::UnexpectedStatus(status));
    }

    let range = ContentRange::parse(content_range.ok_or(ProtocolError::MissingContentRange)?)?;

    if let Some(stated) = range.complete
        && stated != total_length
    {
        return Err(ProtocolError::TotalMismatch {
            expected: total_length,
            stated,
        });
    }

    if range.first != segment.start {
        return Err(ProtocolError::StartMismatch {
            requested: segment.start,
            confirmed: range.first,
        });
    }

    let expected_last = segment.end.unwrap_or(total_length).saturating_sub(1);
    if range.last != expected_last {
        return Err(ProtocolError::EndMismatch {
            requested: expected_last,
            confirmed: range.last,
        });
    }

    if body_len != range.len() {
        return Err(ProtocolError::LengthMismatch {
            expected: range.len(),
            actual:   body_len,
        });
    }

    Ok(range.first)
}
