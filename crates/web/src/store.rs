//! File metadata and byte access behind a trait, so the static file
//! orchestrator can run against the local file system or a test double.

use std::io;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use bytes::Bytes;
use tokio::io::{AsyncReadExt, AsyncSeekExt};
use tracing::trace;

use crate::range::ByteRange;

/// A snapshot of what the store knows about one resource.
///
/// The modification time is kept at second precision, the precision of
/// `Last-Modified` and `If-Modified-Since`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceMetadata {
    path: PathBuf,
    size: u64,
    modified: SystemTime,
}

impl ResourceMetadata {
    pub fn new(path: impl Into<PathBuf>, size: u64, modified: SystemTime) -> Self {
        Self { path: path.into(), size, modified: truncate_to_secs(modified) }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn size(&self) -> u64 {
        self.size
    }

    pub fn modified(&self) -> SystemTime {
        self.modified
    }

    /// Seconds since the unix epoch; times before the epoch count as zero.
    pub fn modified_secs(&self) -> u64 {
        self.modified.duration_since(UNIX_EPOCH).map_or(0, |d| d.as_secs())
    }
}

fn truncate_to_secs(time: SystemTime) -> SystemTime {
    let secs = time.duration_since(UNIX_EPOCH).map_or(0, |d| d.as_secs());
    UNIX_EPOCH + Duration::from_secs(secs)
}

/// Read access to the resources served by [`StaticFiles`](crate::StaticFiles).
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ResourceStore: Send + Sync {
    /// Looks up a resource; `Ok(None)` when nothing servable exists at `path`.
    async fn metadata(&self, path: &Path) -> io::Result<Option<ResourceMetadata>>;

    /// Reads the whole resource.
    async fn read_all(&self, path: &Path) -> io::Result<Bytes>;

    /// Reads exactly the bytes of `range`.
    async fn read_range(&self, path: &Path, range: ByteRange) -> io::Result<Bytes>;
}

/// [`ResourceStore`] over the local file system using `tokio::fs`.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalFs;

#[async_trait]
impl ResourceStore for LocalFs {
    async fn metadata(&self, path: &Path) -> io::Result<Option<ResourceMetadata>> {
        let metadata = match tokio::fs::metadata(path).await {
            Ok(metadata) => metadata,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e),
        };

        // directories and other special files are not served
        if !metadata.is_file() {
            return Ok(None);
        }
        Ok(Some(ResourceMetadata::new(path, metadata.len(), metadata.modified()?)))
    }

    async fn read_all(&self, path: &Path) -> io::Result<Bytes> {
        let content = tokio::fs::read(path).await?;
        trace!(path = %path.display(), size = content.len(), "read whole file");
        Ok(Bytes::from(content))
    }

    async fn read_range(&self, path: &Path, range: ByteRange) -> io::Result<Bytes> {
        let mut file = tokio::fs::File::open(path).await?;
        file.seek(io::SeekFrom::Start(range.start())).await?;

        let len = usize::try_from(range.len()).map_err(io::Error::other)?;
        let mut buf = vec![0u8; len];
        file.read_exact(&mut buf).await?;
        trace!(path = %path.display(), start = range.start(), end = range.end(), "read file range");
        Ok(Bytes::from(buf))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[tokio::test]
    async fn local_fs_reads_metadata_and_ranges() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"0123456789").unwrap();

        let metadata = LocalFs.metadata(file.path()).await.unwrap().unwrap();
        assert_eq!(metadata.size(), 10);
        assert_eq!(metadata.path(), file.path());

        let all = LocalFs.read_all(file.path()).await.unwrap();
        assert_eq!(&all[..], b"0123456789");

        let part = LocalFs.read_range(file.path(), ByteRange::new(3, 5).unwrap()).await.unwrap();
        assert_eq!(&part[..], b"345");
    }

    #[tokio::test]
    async fn missing_file_and_directory_have_no_metadata() {
        let dir = tempfile::tempdir().unwrap();

        assert!(LocalFs.metadata(&dir.path().join("absent.txt")).await.unwrap().is_none());
        assert!(LocalFs.metadata(dir.path()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn range_past_end_is_an_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"abc").unwrap();

        let result = LocalFs.read_range(file.path(), ByteRange::new(1, 9).unwrap()).await;
        assert_eq!(result.unwrap_err().kind(), io::ErrorKind::UnexpectedEof);
    }

    #[test]
    fn modification_time_is_truncated() {
        let modified = UNIX_EPOCH + Duration::from_millis(1_700_000_000_750);
        let metadata = ResourceMetadata::new("/srv/a.txt", 1, modified);

        assert_eq!(metadata.modified_secs(), 1_700_000_000);
        assert_eq!(metadata.modified(), UNIX_EPOCH + Duration::from_secs(1_700_000_000));
    }
}
