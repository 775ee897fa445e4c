use crate::data::Segment;

/// Partition `[0, total_length)` into contiguous segments for parallel fetch.
///
/// Every segment but the last covers `floor(total_length / n)` bytes. The
/// last segment is open-ended and absorbs the remainder.
///
/// # Arguments
///
/// * `total_length` - Size of the resource in bytes
/// * `concurrency` - Desired number of segments; clamped to `1..=total_length`
///
/// # Examples
///
/// ```
/// use segfetch::core::plan_segments;
///
/// let segments = plan_segments(814_210, 100);
/// assert_eq!(segments.len(), 100);
/// assert_eq!(segments[0].end, Some(8142));
/// assert_eq!(segments[99].start, 806_058);
/// assert_eq!(segments[99].end, None);
/// ```
pub fn plan_segments(total_length: u64, concurrency: u32) -> Vec<Segment> {
    // An empty resource still gets one (empty, open-ended) segment.
    if total_length == 0 {
        return vec![Segment {
            index: 0,
            start: 0,
            end:   None,
        }];
    }

    // No empty closed segments: they cannot be expressed as a byte range.
    let count = u64::from(concurrency.max(1)).min(total_length);
    let chunk_size = total_length / count;

    (0..count)
        .map(|i| {
            let start = i * chunk_size;
            let end = (i + 1 < count).then(|| (i + 1) * chunk_size);
            Segment {
                index: i as u32,
                start,
                end,
            }
        })
        .collect()
}
