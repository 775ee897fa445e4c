use std::sync::Arc;
use std::time::Instant;

use bytes::Bytes;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{info, instrument, warn};

use crate::core::plan_segments;
use crate::data::{
    FailedSegment, FetchOptions, FetchPhase, Progress, Segment, SegmentOutcome, SegmentResult,
    TransferOutcome, TransferReport, TransferRequest,
};
use crate::effects::assembler::Assembler;
use crate::effects::fetcher::SegmentFetcher;
use crate::effects::http::HttpClient;
use crate::error::{Error, Result};

/// Runs a whole transfer: probe, plan, fan out, join, assemble.
pub struct TransferCoordinator<C: HttpClient> {
    client:    Arc<C>,
    options:   FetchOptions,
    assembler: Assembler,
}

impl<C: HttpClient + 'static> TransferCoordinator<C> {
    pub fn new(client: C) -> Self { Self::from_shared(Arc::new(client)) }

    /// Build a coordinator around a client shared with other users.
    pub fn from_shared(client: Arc<C>) -> Self {
        Self {
            client,
            options: FetchOptions::default(),
            assembler: Assembler::default(),
        }
    }

    #[must_use]
    pub fn with_options(mut self, options: FetchOptions) -> Self {
        self.options = options;
        self
    }

    #[must_use]
    pub fn with_assembler(mut self, assembler: Assembler) -> Self {
        self.assembler = assembler;
        self
    }

    /// Download `request.url()` into `request.destination()`.
    ///
    /// Segment failures do not produce an `Err`: they are collected into
    /// [`TransferOutcome::Failure`] once every segment has reported, and the
    /// destination is left untouched. `Err` is reserved for failures of the
    /// transfer as a whole (metadata probe, file I/O, deadline).
    #[instrument(skip_all, fields(url = %request.url()))]
    pub async fn run(&self, request: &TransferRequest) -> Result<TransferOutcome> {
        let started = Instant::now();
        let url = request.url().as_str();

        self.options.report(Progress::default());
        let total_length = self.probe(url).await?;

        let segments = plan_segments(total_length, request.concurrency());
        info!(total_length, segments = segments.len(), "planned segments");

        let results = if total_length == 0 {
            // Nothing to request: an empty range cannot be asked for.
            vec![SegmentResult::fetched(segments[0], 0, Bytes::new())]
        } else {
            self.fetch_all(url, &segments, total_length).await?
        };

        let failed_segments = collect_failures(&results);
        if !failed_segments.is_empty() {
            warn!(
                failed = failed_segments.len(),
                segments = segments.len(),
                "transfer failed, destination not written"
            );
            return Ok(TransferOutcome::Failure { failed_segments });
        }

        self.options.report(Progress {
            phase: FetchPhase::Assembling,
            segments_done: segments.len(),
            segments_total: segments.len(),
            bytes_done: total_length,
            bytes_total: Some(total_length),
        });
        self.assembler.assemble(request.destination(), &results).await?;

        let report = TransferReport {
            destination: request.destination().to_path_buf(),
            total_bytes: total_length,
            segments:    segments.len(),
            elapsed:     started.elapsed(),
        };
        self.options.report(Progress {
            phase: FetchPhase::Completed,
            segments_done: segments.len(),
            segments_total: segments.len(),
            bytes_done: total_length,
            bytes_total: Some(total_length),
        });
        info!(
            destination = %report.destination.display(),
            bytes = report.total_bytes,
            elapsed_ms = report.elapsed.as_millis() as u64,
            throughput_bps = report.throughput_bps(),
            "transfer complete"
        );

        Ok(TransferOutcome::Success(report))
    }

    /// HEAD the resource and return its total length.
    async fn probe(&self, url: &str) -> Result<u64> {
        let metadata = self
            .client
            .head(url)
            .await
            .map_err(|e| Error::Metadata(e.to_string()))?;

        if metadata.ranges_refused() {
            return Err(Error::Metadata(
                "server does not accept byte range requests".into(),
            ));
        }
        if metadata.accept_ranges.is_none() {
            warn!("server did not advertise Accept-Ranges, trying byte ranges anyway");
        }

        metadata
            .content_length
            .ok_or_else(|| Error::Metadata("response has no usable Content-Length".into()))
    }

    async fn fetch_all(
        &self,
        url: &str,
        segments: &[Segment],
        total_length: u64,
    ) -> Result<Vec<SegmentResult>> {
        let fan_out = self.fan_out(url, segments, total_length);
        match self.options.deadline {
            // Dropping the fan-out future drops its JoinSet, aborting every task.
            Some(deadline) => tokio::time::timeout(deadline, fan_out)
                .await
                .map_err(|_| Error::DeadlineExceeded(deadline))?,
            None => fan_out.await,
        }
    }

    /// Spawn one task per segment and wait for all of them.
    async fn fan_out(
        &self,
        url: &str,
        segments: &[Segment],
        total_length: u64,
    ) -> Result<Vec<SegmentResult>> {
        let fetcher = SegmentFetcher::new(Arc::clone(&self.client), self.options.clone());
        let limiter = self.options.max_in_flight.map(|n| Arc::new(Semaphore::new(n)));

        let mut tasks = JoinSet::new();
        for &segment in segments {
            let fetcher = fetcher.clone();
            let limiter = limiter.clone();
            let url = url.to_owned();
            tasks.spawn(async move {
                // The semaphore is never closed, so acquisition cannot fail.
                let _permit = match limiter {
                    Some(limiter) => limiter.acquire_owned().await.ok(),
                    None => None,
                };
                fetcher.fetch(&url, segment, total_length).await
            });
        }

        let mut progress = Progress {
            phase: FetchPhase::Fetching,
            segments_done: 0,
            segments_total: segments.len(),
            bytes_done: 0,
            bytes_total: Some(total_length),
        };
        self.options.report(progress.clone());

        let mut results = Vec::with_capacity(segments.len());
        while let Some(joined) = tasks.join_next().await {
            let result = joined.map_err(Error::Task)?;

            progress.segments_done += 1;
            if let SegmentOutcome::Fetched { bytes, .. } = &result.outcome {
                progress.bytes_done += bytes.len() as u64;
            }
            self.options.report(progress.clone());

            results.push(result);
        }

        results.sort_by_key(|r| r.segment.index);
        Ok(results)
    }
}

fn collect_failures(results: &[SegmentResult]) -> Vec<FailedSegment> {
    results
        .iter()
        .filter_map(|r| match &r.outcome {
            SegmentOutcome::Failed {
                last_error,
                attempts,
            } => Some(FailedSegment {
                segment:    r.segment,
                last_error: last_error.clone(),
                attempts:   *attempts,
            }),
            SegmentOutcome::Fetched { .. } => None,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ProtocolError, SegmentError};

    #[test]
    fn test_collect_failures() {
        let ok = SegmentResult::fetched(
            Segment {
                index: 0,
                start: 0,
                end:   Some(10),
            },
            0,
            Bytes::from_static(&[0u8; 10]),
        );
        let bad = SegmentResult::failed(
            Segment {
                index: 1,
                start: 10,
                end:   None,
            },
            SegmentError::Protocol(ProtocolError::UnexpectedStatus(416)),
            1,
        );

        let failures = collect_failures(&[ok, bad]);
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].segment.index, 1);
        assert_eq!(failures[0].attempts, 1);
    }
}
