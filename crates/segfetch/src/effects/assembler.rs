use std::io::SeekFrom;
use std::path::{Path, PathBuf};

use tokio::fs;
use tokio::io::{AsyncSeekExt, AsyncWriteExt};
use tracing::{debug, warn};

use crate::data::{SegmentOutcome, SegmentResult};
use crate::error::{Error, Result};

/// Writes fetched segments into the destination file at their offsets.
///
/// Segments are written into a staging file beside the destination, which
/// is synced and then renamed over the destination. A failed assembly
/// removes the staging file and leaves the destination as it was.
#[derive(Clone, Copy, Debug)]
pub struct Assembler {
    prefix: &'static str,
    suffix: &'static str,
}

impl Default for Assembler {
    fn default() -> Self { Self::new() }
}

impl Assembler {
    pub fn new() -> Self {
        Self {
            prefix: ".",
            suffix: ".segfetch.tmp",
        }
    }

    #[must_use]
    pub fn prefix(mut self, prefix: &'static str) -> Self {
        self.prefix = prefix;
        self
    }

    #[must_use]
    pub fn suffix(mut self, suffix: &'static str) -> Self {
        self.suffix = suffix;
        self
    }

    /// Staging path used for `destination`.
    pub fn staging_path(&self, destination: &Path) -> PathBuf {
        let parent = destination.parent().unwrap_or(Path::new(""));
        let file_name = destination.file_name().unwrap_or_default().to_string_lossy();
        parent.join(format!("{}{}{}", self.prefix, file_name, self.suffix))
    }

    /// Write every fetched result at its confirmed start offset.
    ///
    /// Results that are not fetched are skipped. Returns the number of bytes
    /// written.
    pub async fn assemble(&self, destination: &Path, results: &[SegmentResult]) -> Result<u64> {
        if let Some(parent) = destination.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| Error::io(parent, e))?;
        }

        let staging = self.staging_path(destination);
        let written = match write_segments(&staging, results).await {
            Ok(written) => written,
            Err(e) => {
                discard(&staging).await;
                return Err(Error::io(&staging, e));
            }
        };

        if let Err(e) = fs::rename(&staging, destination).await {
            discard(&staging).await;
            return Err(Error::io(destination, e));
        }

        debug!(destination = %destination.display(), written, "assembled destination file");
        Ok(written)
    }
}

async fn write_segments(staging: &Path, results: &[SegmentResult]) -> std::io::Result<u64> {
    let mut file = fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(staging)
        .await?;

    let mut written = 0u64;
    for result in results {
        let SegmentOutcome::Fetched {
            confirmed_start,
            bytes,
        } = &result.outcome
        else {
            continue;
        };

        file.seek(SeekFrom::Start(*confirmed_start)).await?;
        // write_all reports a short write as ErrorKind::WriteZero.
        file.write_all(bytes).await?;
        written += bytes.len() as u64;
    }

    file.flush().await?;
    file.sync_all().await?;
    Ok(written)
}

async fn discard(staging: &Path) {
    if let Err(e) = fs::remove_file(staging).await
        && e.kind() != std::io::ErrorKind::NotFound
    {
        warn!(path = %staging.display(), error = %e, "failed to remove staging file");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::Segment;
    use crate::error::SegmentError;
    use bytes::Bytes;
    use tempfile::tempdir;

    fn fetched(index: u32, start: u64, end: Option<u64>, data: &[u8]) -> SegmentResult {
        SegmentResult::fetched(
            Segment { index, start, end },
            start,
            Bytes::copy_from_slice(data),
        )
    }

    #[tokio::test]
    async fn test_assemble_out_of_order() {
        let dir = tempdir().unwrap();
        let destination = dir.path().join("out.bin");
        let content: Vec<u8> = (0..=255u8).cycle().take(1000).collect();

        let results = vec![
            fetched(2, 600, None, &content[600..]),
            fetched(0, 0, Some(300), &content[..300]),
            fetched(1, 300, Some(600), &content[300..600]),
        ];
        let written = Assembler::new().assemble(&destination, &results).await.unwrap();

        assert_eq!(written, 1000);
        let assembled = std::fs::read(&destination).unwrap();
        assert_eq!(assembled, content);
        for result in &results {
            if let SegmentOutcome::Fetched {
                confirmed_start,
                bytes,
            } = &result.outcome
            {
                let start = *confirmed_start as usize;
                assert_eq!(&assembled[start..start + bytes.len()], &bytes[..]);
            }
        }
    }

    #[tokio::test]
    async fn test_assemble_truncates_existing_file() {
        let dir = tempdir().unwrap();
        let destination = dir.path().join("out.bin");
        std::fs::write(&destination, vec![0xFFu8; 4096]).unwrap();

        let results = vec![fetched(0, 0, None, b"fresh")];
        Assembler::new().assemble(&destination, &results).await.unwrap();

        assert_eq!(std::fs::read(&destination).unwrap(), b"fresh");
        assert!(!Assembler::new().staging_path(&destination).exists());
    }

    #[tokio::test]
    async fn test_assemble_empty_resource() {
        let dir = tempdir().unwrap();
        let destination = dir.path().join("empty.bin");

        let results = vec![fetched(0, 0, None, b"")];
        let written = Assembler::new().assemble(&destination, &results).await.unwrap();

        assert_eq!(written, 0);
        assert_eq!(std::fs::metadata(&destination).unwrap().len(), 0);
    }

    #[tokio::test]
    async fn test_assemble_skips_failed_results() {
        let dir = tempdir().unwrap();
        let destination = dir.path().join("out.bin");

        let results = vec![
            fetched(0, 0, Some(3), b"abc"),
            SegmentResult::failed(
                Segment {
                    index: 1,
                    start: 3,
                    end:   None,
                },
                SegmentError::Transport("timeout".into()),
                5,
            ),
        ];
        let written = Assembler::new().assemble(&destination, &results).await.unwrap();
        assert_eq!(written, 3);
    }

    #[tokio::test]
    async fn test_assemble_creates_parent_directories() {
        let dir = tempdir().unwrap();
        let destination = dir.path().join("nested").join("deeper").join("out.bin");

        Assembler::new()
            .assemble(&destination, &[fetched(0, 0, None, b"data")])
            .await
            .unwrap();
        assert_eq!(std::fs::read(&destination).unwrap(), b"data");
    }

    #[tokio::test]
    async fn test_assemble_into_directory_fails_cleanly() {
        let dir = tempdir().unwrap();
        let destination = dir.path().join("taken");
        std::fs::create_dir(&destination).unwrap();
        std::fs::write(destination.join("keep.txt"), b"keep").unwrap();

        let err = Assembler::new()
            .assemble(&destination, &[fetched(0, 0, None, b"data")])
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Io { .. }));
        assert!(destination.is_dir());
        assert_eq!(std::fs::read(destination.join("keep.txt")).unwrap(), b"keep");
        assert!(!Assembler::new().staging_path(&destination).exists());
    }

    #[test]
    fn test_staging_path() {
        let assembler = Assembler::new().prefix("~").suffix(".part");
        assert_eq!(
            assembler.staging_path(Path::new("dir/file.bin")),
            PathBuf::from("dir/~file.bin.part")
        );
    }
}
