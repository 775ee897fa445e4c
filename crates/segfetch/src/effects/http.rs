use std::future::Future;

use bytes::Bytes;

/// What a HEAD probe learned about the resource.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResourceMetadata {
    /// `Content-Length`, if present and numeric.
    pub content_length: Option<u64>,
    /// Raw `Accept-Ranges` value, if present.
    pub accept_ranges:  Option<String>,
}

impl ResourceMetadata {
    /// Returns `true` when the server explicitly answers `Accept-Ranges: none`.
    pub fn ranges_refused(&self) -> bool {
        self.accept_ranges
            .as_deref()
            .is_some_and(|v| v.trim().eq_ignore_ascii_case("none"))
    }
}

/// A fully received HTTP response.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HttpResponse {
    pub status:  u16,
    pub headers: Vec<(String, String)>,
    pub body:    Bytes,
}

impl HttpResponse {
    /// Case-insensitive header lookup; returns the first match.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// Asynchronous HTTP client abstraction.
///
/// This trait provides the minimal interface needed for segmented fetching.
/// Implementations handle their own redirect following, timeout
/// configuration and connection pooling.
///
/// Every `Err` returned from these methods is treated as a transport error:
/// segment requests are retried, a failed probe aborts the transfer. Status
/// codes on `get` are not errors; they are surfaced in [`HttpResponse`].
///
/// # Implementations
///
/// - [`ReqwestClient`]: Production implementation using `reqwest`
/// - Mock implementations for testing
pub trait HttpClient: Send + Sync {
    /// Error type for transport failures.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Probe the resource without downloading its body.
    ///
    /// A non-success status should be reported as an error.
    fn head(
        &self,
        url: &str,
    ) -> impl Future<Output = Result<ResourceMetadata, Self::Error>> + Send;

    /// Send a GET with the given request headers and collect the body.
    fn get(
        &self,
        url: &str,
        headers: &[(String, String)],
    ) -> impl Future<Output = Result<HttpResponse, Self::Error>> + Send;
}

#[cfg(feature = "reqwest")]
mod reqwest_impl {
    use super::*;
    use reqwest::header::{ACCEPT_RANGES, CONTENT_LENGTH};

    use crate::data::options::Timeouts;

    /// Production HTTP client implementation using reqwest.
    ///
    /// Built without any decompression feature, so bodies arrive exactly as
    /// the server sent them.
    #[derive(Debug, Clone)]
    pub struct ReqwestClient {
        client: reqwest::Client,
    }

    impl ReqwestClient {
        /// Create a new ReqwestClient with default timeouts.
        pub fn new() -> Result<Self, reqwest::Error> { Self::with_timeouts(Timeouts::default()) }

        pub fn with_timeouts(timeouts: Timeouts) -> Result<Self, reqwest::Error> {
            let mut builder = reqwest::Client::builder()
                .user_agent(concat!("segfetch/", env!("CARGO_PKG_VERSION")))
                .connect_timeout(timeouts.connect);
            if let Some(request) = timeouts.request {
                builder = builder.timeout(request);
            }
            Ok(Self {
                client: builder.build()?,
            })
        }
    }

    impl HttpClient for ReqwestClient {
        type Error = reqwest::Error;

        async fn head(&self, url: &str) -> Result<ResourceMetadata, Self::Error> {
            let response = self.client.head(url).send().await?.error_for_status()?;
            let headers = response.headers();

            // Read the header directly: the body of a HEAD response is empty.
            let content_length = headers
                .get(CONTENT_LENGTH)
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.trim().parse::<u64>().ok());
            let accept_ranges = headers
                .get(ACCEPT_RANGES)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string);

            Ok(ResourceMetadata {
                content_length,
                accept_ranges,
            })
        }

        async fn get(
            &self,
            url: &str,
            headers: &[(String, String)],
        ) -> Result<HttpResponse, Self::Error> {
            let mut request = self.client.get(url);
            for (key, value) in headers {
                request = request.header(key, value);
            }

            let response = request.send().await?;
            let status = response.status().as_u16();
            let headers = response
                .headers()
                .iter()
                .filter_map(|(k, v)| {
                    v.to_str()
                        .ok()
                        .map(|v| (k.as_str().to_string(), v.to_string()))
                })
                .collect();
            let body = response.bytes().await?;

            Ok(HttpResponse {
                status,
                headers,
                body,
            })
        }
    }
}

#[cfg(feature = "reqwest")]
pub use reqwest_impl::ReqwestClient;
