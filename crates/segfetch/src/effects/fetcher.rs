use std::sync::Arc;

use bytes::Bytes;
use tracing::{debug, error, warn};

use crate::core::{retry_delay, validate_range_response};
use crate::data::{FetchOptions, Segment, SegmentResult};
use crate::effects::http::HttpClient;
use crate::error::SegmentError;

/// Fetches one segment with a ranged GET, retrying transport errors.
///
/// The fetcher holds no per-segment state; every call returns its own
/// [`SegmentResult`].
pub struct SegmentFetcher<C: HttpClient> {
    client:  Arc<C>,
    options: FetchOptions,
}

impl<C: HttpClient> Clone for SegmentFetcher<C> {
    fn clone(&self) -> Self {
        Self {
            client:  Arc::clone(&self.client),
            options: self.options.clone(),
        }
    }
}

impl<C: HttpClient> SegmentFetcher<C> {
    pub fn new(client: Arc<C>, options: FetchOptions) -> Self { Self { client, options } }

    /// Fetch `segment` of the `total_length`-byte resource at `url`.
    ///
    /// Transport errors are retried up to `max_attempts` times in total,
    /// waiting `attempt * backoff_unit` after each failure. Protocol errors
    /// (status other than 206, missing or inconsistent `Content-Range`) end
    /// the fetch at once, as does a response that disagrees with
    /// `total_length`.
    pub async fn fetch(&self, url: &str, segment: Segment, total_length: u64) -> SegmentResult {
        let headers = self.request_headers(&segment);
        let max_attempts = self.options.max_attempts.max(1);
        let mut attempt = 0;

        loop {
            attempt += 1;
            debug!(segment = segment.index, range = %segment.range_header(), attempt, "requesting segment");

            match self.attempt(url, &segment, total_length, &headers).await {
                Ok((confirmed_start, bytes)) => {
                    debug!(segment = segment.index, bytes = bytes.len(), attempt, "segment fetched");
                    return SegmentResult::fetched(segment, confirmed_start, bytes);
                }
                Err(err) if err.is_retryable() && attempt < max_attempts => {
                    let delay = retry_delay(attempt, self.options.backoff_unit);
                    warn!(
                        segment = segment.index,
                        attempt,
                        error = %err,
                        "segment attempt failed, retrying in {delay:?}"
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(err) => {
                    error!(
                        segment = segment.index,
                        range = %segment.range_header(),
                        attempt,
                        error = %err,
                        "segment failed"
                    );
                    return SegmentResult::failed(segment, err, attempt);
                }
            }
        }
    }

    async fn attempt(
        &self,
        url: &str,
        segment: &Segment,
        total_length: u64,
        headers: &[(String, String)],
    ) -> Result<(u64, Bytes), SegmentError> {
        let response = self
            .client
            .get(url, headers)
            .await
            .map_err(|e| SegmentError::Transport(e.to_string()))?;

        let confirmed_start = validate_range_response(
            segment,
            total_length,
            response.status,
            response.header("Content-Range"),
            response.body.len() as u64,
        )?;

        Ok((confirmed_start, response.body))
    }

    /// Custom headers, then `Range` and `Accept-Encoding: identity`.
    fn request_headers(&self, segment: &Segment) -> Vec<(String, String)> {
        let mut headers: Vec<(String, String)> = self
            .options
            .headers
            .iter()
            .filter(|(k, _)| {
                !k.eq_ignore_ascii_case("range") && !k.eq_ignore_ascii_case("accept-encoding")
            })
            .cloned()
            .collect();
        headers.push(("Range".to_string(), segment.range_header()));
        headers.push(("Accept-Encoding".to_string(), "identity".to_string()));
        headers
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::SegmentOutcome;
    use crate::effects::http::{HttpResponse, ResourceMetadata};
    use crate::error::ProtocolError;
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use std::time::Duration;

    #[derive(Debug)]
    struct MockError(String);

    impl std::fmt::Display for MockError {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            write!(f, "{}", self.0)
        }
    }

    impl std::error::Error for MockError {}

    /// Replays a fixed script of responses and records every request.
    struct ScriptedClient {
        script:   Mutex<VecDeque<Result<HttpResponse, MockError>>>,
        requests: Mutex<Vec<Vec<(String, String)>>>,
    }

    impl ScriptedClient {
        fn new(script: Vec<Result<HttpResponse, MockError>>) -> Arc<Self> {
            Arc::new(Self {
                script:   Mutex::new(script.into()),
                requests: Mutex::new(Vec::new()),
            })
        }

        fn calls(&self) -> usize { self.requests.lock().unwrap().len() }
    }

    impl HttpClient for ScriptedClient {
        type Error = MockError;

        async fn head(&self, _url: &str) -> Result<ResourceMetadata, Self::Error> {
            Ok(ResourceMetadata::default())
        }

        async fn get(
            &self,
            _url: &str,
            headers: &[(String, String)],
        ) -> Result<HttpResponse, Self::Error> {
            self.requests.lock().unwrap().push(headers.to_vec());
            self.script
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(MockError("script exhausted".into())))
        }
    }

    fn partial(content_range: &str, body: &'static [u8]) -> Result<HttpResponse, MockError> {
        Ok(HttpResponse {
            status:  206,
            headers: vec![("Content-Range".into(), content_range.into())],
            body:    Bytes::from_static(body),
        })
    }

    fn reset() -> Result<HttpResponse, MockError> {
        Err(MockError("connection reset by peer".into()))
    }

    fn first_hundred() -> Segment {
        Segment {
            index: 0,
            start: 0,
            end:   Some(100),
        }
    }

    fn fetcher(client: Arc<ScriptedClient>) -> SegmentFetcher<ScriptedClient> {
        SegmentFetcher::new(
            client,
            FetchOptions::default().backoff_unit(Duration::from_millis(1)),
        )
    }

    #[tokio::test]
    async fn test_fetch_success() {
        let client = ScriptedClient::new(vec![partial("bytes 0-99/1000", &[7u8; 100])]);
        let result = fetcher(Arc::clone(&client))
            .fetch("http://example.com/f", first_hundred(), 1000)
            .await;

        match result.outcome {
            SegmentOutcome::Fetched {
                confirmed_start,
                bytes,
            } => {
                assert_eq!(confirmed_start, 0);
                assert_eq!(bytes.len(), 100);
            }
            other => panic!("expected fetched, got {other:?}"),
        }
        assert_eq!(client.calls(), 1);
    }

    #[tokio::test]
    async fn test_request_headers() {
        let client = ScriptedClient::new(vec![partial("bytes 0-99/1000", &[0u8; 100])]);
        let fetcher = SegmentFetcher::new(
            Arc::clone(&client),
            FetchOptions::default()
                .header("User-Agent", "test")
                .header("range", "bytes=5-6"),
        );
        fetcher.fetch("http://example.com/f", first_hundred(), 1000).await;

        let requests = client.requests.lock().unwrap();
        assert_eq!(
            requests[0],
            vec![
                ("User-Agent".to_string(), "test".to_string()),
                ("Range".to_string(), "bytes=0-99".to_string()),
                ("Accept-Encoding".to_string(), "identity".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn test_non_partial_status_fails_without_retry() {
        let client = ScriptedClient::new(vec![
            Ok(HttpResponse {
                status:  200,
                headers: vec![],
                body:    Bytes::from_static(&[0u8; 1000]),
            }),
            partial("bytes 0-99/1000", &[0u8; 100]),
        ]);
        let result = fetcher(Arc::clone(&client))
            .fetch("http://example.com/f", first_hundred(), 1000)
            .await;

        assert_eq!(client.calls(), 1);
        assert_eq!(result.segment.range_header(), "bytes=0-99");
        assert_eq!(
            result.outcome,
            SegmentOutcome::Failed {
                last_error: ProtocolError::UnexpectedStatus(200).into(),
                attempts:   1,
            }
        );
    }

    #[tokio::test]
    async fn test_succeeds_on_final_attempt() {
        let client = ScriptedClient::new(vec![
            reset(),
            reset(),
            reset(),
            reset(),
            partial("bytes 0-99/1000", &[1u8; 100]),
        ]);
        let result = fetcher(Arc::clone(&client))
            .fetch("http://example.com/f", first_hundred(), 1000)
            .await;

        assert!(result.is_fetched());
        assert_eq!(client.calls(), 5);
    }

    #[tokio::test]
    async fn test_exhausts_attempt_budget() {
        let client = ScriptedClient::new(vec![reset(), reset(), reset(), reset(), reset(), reset()]);
        let result = fetcher(Arc::clone(&client))
            .fetch("http://example.com/f", first_hundred(), 1000)
            .await;

        match result.outcome {
            SegmentOutcome::Failed {
                last_error,
                attempts,
            } => {
                assert_eq!(attempts, 5);
                assert!(last_error.is_retryable());
                assert!(last_error.to_string().contains("connection reset"));
            }
            other => panic!("expected failure, got {other:?}"),
        }
        assert_eq!(client.calls(), 5);
    }

    #[tokio::test]
    async fn test_start_mismatch_with_partial_status_fails() {
        let client = ScriptedClient::new(vec![partial("bytes 100-199/1000", &[0u8; 100])]);
        let result = fetcher(Arc::clone(&client))
            .fetch("http://example.com/f", first_hundred(), 1000)
            .await;

        assert_eq!(
            result.outcome,
            SegmentOutcome::Failed {
                last_error: ProtocolError::StartMismatch {
                    requested: 0,
                    confirmed: 100,
                }
                .into(),
                attempts:   1,
            }
        );
        assert_eq!(client.calls(), 1);
    }

    #[tokio::test]
    async fn test_protocol_error_after_transport_error() {
        let client = ScriptedClient::new(vec![
            reset(),
            Ok(HttpResponse {
                status: 503,
                ..HttpResponse::default()
            }),
        ]);
        let result = fetcher(Arc::clone(&client))
            .fetch("http://example.com/f", first_hundred(), 1000)
            .await;

        assert_eq!(
            result.outcome,
            SegmentOutcome::Failed {
                last_error: ProtocolError::UnexpectedStatus(503).into(),
                attempts:   2,
            }
        );
    }

    #[tokio::test]
    async fn test_custom_attempt_budget() {
        let client = ScriptedClient::new(vec![reset(), reset(), reset()]);
        let fetcher = SegmentFetcher::new(
            Arc::clone(&client),
            FetchOptions::default()
                .max_attempts(2)
                .backoff_unit(Duration::ZERO),
        );
        let result = fetcher.fetch("http://example.com/f", first_hundred(), 1000).await;

        assert!(!result.is_fetched());
        assert_eq!(client.calls(), 2);
    }
}
