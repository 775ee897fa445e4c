use std::path::{Path, PathBuf};

use url::Url;

use crate::error::{Error, Result};

/// File name used when the URL has no usable final path segment.
pub const DEFAULT_FILE_NAME: &str = "download";

/// One invocation's worth of work: what to fetch, how wide, and where to put it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferRequest {
    url:         Url,
    concurrency: u32,
    destination: PathBuf,
}

impl TransferRequest {
    /// Build a request, rejecting URLs that are not `http` or `https`.
    ///
    /// `concurrency` is clamped to at least 1.
    pub fn new(url: &str, concurrency: u32, destination: impl Into<PathBuf>) -> Result<Self> {
        let url = Url::parse(url).map_err(|e| Error::InvalidUrl(format!("{url}: {e}")))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(Error::InvalidUrl(format!(
                "{url}: unsupported scheme {:?}",
                url.scheme()
            )));
        }

        Ok(Self {
            url,
            concurrency: concurrency.max(1),
            destination: destination.into(),
        })
    }

    /// Build a request whose destination is `dir` joined with the file name
    /// derived from the URL.
    pub fn in_directory(url: &str, concurrency: u32, dir: impl AsRef<Path>) -> Result<Self> {
        let mut request = Self::new(url, concurrency, PathBuf::new())?;
        request.destination = dir.as_ref().join(request.file_name());
        Ok(request)
    }

    pub fn url(&self) -> &Url { &self.url }

    pub fn concurrency(&self) -> u32 { self.concurrency }

    pub fn destination(&self) -> &Path { &self.destination }

    /// The last non-empty path segment of the URL, or [`DEFAULT_FILE_NAME`].
    pub fn file_name(&self) -> String { file_name_from_url(&self.url) }
}

/// Derive a local file name from a URL's final path segment.
pub fn file_name_from_url(url: &Url) -> String {
    url.path_segments()
        .and_then(|segments| segments.filter(|s| !s.is_empty()).next_back())
        .map(str::to_string)
        .unwrap_or_else(|| DEFAULT_FILE_NAME.to_string())
}
