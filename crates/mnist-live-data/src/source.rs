// Byte sources — where compressed IDX streams come from
//
// A ByteSource is opened once and then read chunk by chunk. Nothing here
// buffers a whole payload: each chunk is handed to the decoder and dropped.
//
//   FileSource    local path, read through tokio::fs in fixed-size chunks
//   HttpSource    http(s) URL, streamed with reqwest's Response::chunk()
//   MemorySource  pre-split bytes (embedded data, tests)
//   Resource      one of the above, parsed from a configuration string

use std::future::Future;
use std::path::{Path, PathBuf};

use tokio::io::AsyncReadExt;
use tracing::debug;

use crate::error::{LoadError, Result};

/// Default read size for file sources.
pub const DEFAULT_CHUNK_SIZE: usize = 64 * 1024;

/// An open stream yielding successive chunks of raw (still compressed) bytes.
pub trait ChunkStream {
    /// Next chunk, or `None` at end of stream.
    fn next_chunk(&mut self) -> impl Future<Output = Result<Option<Vec<u8>>>>;
}

/// Something that can be opened into a [`ChunkStream`].
pub trait ByteSource {
    type Stream: ChunkStream;

    /// Human-readable location used in errors and logs.
    fn location(&self) -> String;

    /// Open the source. Fails with [`LoadError::Unavailable`] when nothing
    /// can be read from it.
    fn open(&self) -> impl Future<Output = Result<Self::Stream>>;
}

// FileSource

/// A file on the local filesystem.
#[derive(Debug, Clone)]
pub struct FileSource {
    path: PathBuf,
    chunk_size: usize,
}

impl FileSource {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }

    pub fn chunk_size(mut self, size: usize) -> Self {
        self.chunk_size = size.max(1);
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

pub struct FileStream {
    file: tokio::fs::File,
    chunk_size: usize,
    location: String,
}

impl ChunkStream for FileStream {
    async fn next_chunk(&mut self) -> Result<Option<Vec<u8>>> {
        let mut buf = vec![0u8; self.chunk_size];
        let n = self
            .file
            .read(&mut buf)
            .await
            .map_err(|source| LoadError::Io {
                location: self.location.clone(),
                source,
            })?;
        if n == 0 {
            return Ok(None);
        }
        buf.truncate(n);
        Ok(Some(buf))
    }
}

impl ByteSource for FileSource {
    type Stream = FileStream;

    fn location(&self) -> String {
        self.path.display().to_string()
    }

    async fn open(&self) -> Result<FileStream> {
        let location = self.location();
        let file = tokio::fs::File::open(&self.path)
            .await
            .map_err(|e| LoadError::unavailable(location.clone(), e))?;
        debug!(%location, "opened file source");
        Ok(FileStream {
            file,
            chunk_size: self.chunk_size,
            location,
        })
    }
}

// HttpSource

/// A resource fetched over HTTP(S).
#[derive(Debug, Clone)]
pub struct HttpSource {
    url: String,
    client: reqwest::Client,
}

impl HttpSource {
    pub fn new(url: impl Into<String>) -> Self {
        Self::with_client(url, reqwest::Client::new())
    }

    /// Share a client (and its connection pool) between sources.
    pub fn with_client(url: impl Into<String>, client: reqwest::Client) -> Self {
        Self {
            url: url.into(),
            client,
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

pub struct HttpStream {
    response: reqwest::Response,
    location: String,
}

impl ChunkStream for HttpStream {
    async fn next_chunk(&mut self) -> Result<Option<Vec<u8>>> {
        let chunk = self
            .response
            .chunk()
            .await
            .map_err(|source| LoadError::Http {
                location: self.location.clone(),
                source,
            })?;
        Ok(chunk.map(|bytes| bytes.to_vec()))
    }
}

impl ByteSource for HttpSource {
    type Stream = HttpStream;

    fn location(&self) -> String {
        self.url.clone()
    }

    async fn open(&self) -> Result<HttpStream> {
        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(|e| LoadError::unavailable(self.url.clone(), e))?;
        let status = response.status();
        if !status.is_success() {
            return Err(LoadError::unavailable(
                self.url.clone(),
                format!("HTTP status {status}"),
            ));
        }
        debug!(url = %self.url, %status, "opened http source");
        Ok(HttpStream {
            response,
            location: self.url.clone(),
        })
    }
}

// MemorySource

/// Bytes already in memory, served in the chunks they were given in.
#[derive(Debug, Clone)]
pub struct MemorySource {
    name: String,
    chunks: Vec<Vec<u8>>,
}

impl MemorySource {
    /// Split `data` into chunks of at most `chunk_size` bytes.
    pub fn new(name: impl Into<String>, data: &[u8], chunk_size: usize) -> Self {
        let chunks = data.chunks(chunk_size.max(1)).map(<[u8]>::to_vec).collect();
        Self::from_chunks(name, chunks)
    }

    pub fn from_chunks(name: impl Into<String>, chunks: Vec<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            chunks,
        }
    }
}

pub struct MemoryStream {
    chunks: std::vec::IntoIter<Vec<u8>>,
}

impl ChunkStream for MemoryStream {
    async fn next_chunk(&mut self) -> Result<Option<Vec<u8>>> {
        Ok(self.chunks.next())
    }
}

impl ByteSource for MemorySource {
    type Stream = MemoryStream;

    fn location(&self) -> String {
        format!("memory:{}", self.name)
    }

    async fn open(&self) -> Result<MemoryStream> {
        Ok(MemoryStream {
            chunks: self.chunks.clone().into_iter(),
        })
    }
}

// Resource — a source chosen from a location string

/// A byte source resolved from a configuration string.
///
/// `http://` and `https://` locations are fetched over the network,
/// everything else is treated as a filesystem path.
#[derive(Debug, Clone)]
pub enum Resource {
    File(FileSource),
    Http(HttpSource),
    Memory(MemorySource),
}

impl Resource {
    pub fn parse(location: &str) -> Self {
        let trimmed = location.trim();
        if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
            Resource::Http(HttpSource::new(trimmed))
        } else {
            Resource::File(FileSource::new(trimmed))
        }
    }

    /// Like [`parse`](Resource::parse) but reuses `client` for HTTP locations.
    pub fn parse_with_client(location: &str, client: &reqwest::Client) -> Self {
        match Self::parse(location) {
            Resource::Http(http) => Resource::Http(HttpSource::with_client(http.url, client.clone())),
            other => other,
        }
    }
}

pub enum ResourceStream {
    File(FileStream),
    Http(HttpStream),
    Memory(MemoryStream),
}

impl ChunkStream for ResourceStream {
    async fn next_chunk(&mut self) -> Result<Option<Vec<u8>>> {
        match self {
            ResourceStream::File(s) => s.next_chunk().await,
            ResourceStream::Http(s) => s.next_chunk().await,
            ResourceStream::Memory(s) => s.next_chunk().await,
        }
    }
}

impl ByteSource for Resource {
    type Stream = ResourceStream;

    fn location(&self) -> String {
        match self {
            Resource::File(s) => s.location(),
            Resource::Http(s) => s.location(),
            Resource::Memory(s) => s.location(),
        }
    }

    async fn open(&self) -> Result<ResourceStream> {
        Ok(match self {
            Resource::File(s) => ResourceStream::File(s.open().await?),
            Resource::Http(s) => ResourceStream::Http(s.open().await?),
            Resource::Memory(s) => ResourceStream::Memory(s.open().await?),
        })
    }
}

impl From<FileSource> for Resource {
    fn from(s: FileSource) -> Self {
        Resource::File(s)
    }
}

impl From<HttpSource> for Resource {
    fn from(s: HttpSource) -> Self {
        Resource::Http(s)
    }
}

impl From<MemorySource> for Resource {
    fn from(s: MemorySource) -> Self {
        Resource::Memory(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_locations() {
        assert!(matches!(
            Resource::parse("https://example.org/train-images-idx3-ubyte.gz"),
            Resource::Http(_)
        ));
        assert!(matches!(
            Resource::parse("http://localhost:8080/labels.gz"),
            Resource::Http(_)
        ));
        match Resource::parse("resources/t10k-images-idx3-ubyte.gz") {
            Resource::File(f) => {
                assert_eq!(f.path(), Path::new("resources/t10k-images-idx3-ubyte.gz"))
            }
            other => panic!("expected file source, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_memory_source_chunks() {
        let src = MemorySource::new("bytes", &[1, 2, 3, 4, 5], 2);
        assert_eq!(src.location(), "memory:bytes");
        let mut stream = src.open().await.unwrap();
        assert_eq!(stream.next_chunk().await.unwrap(), Some(vec![1, 2]));
        assert_eq!(stream.next_chunk().await.unwrap(), Some(vec![3, 4]));
        assert_eq!(stream.next_chunk().await.unwrap(), Some(vec![5]));
        assert_eq!(stream.next_chunk().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_missing_file_is_unavailable() {
        let src = FileSource::new("/definitely/not/here/train-images-idx3-ubyte.gz");
        let err = src.open().await.err().expect("open should fail");
        assert!(matches!(err, LoadError::Unavailable { .. }));
    }

    #[tokio::test]
    async fn test_file_source_reads_in_chunks() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("blob");
        std::fs::write(&path, [9u8; 10]).unwrap();

        let mut stream = FileSource::new(&path).chunk_size(4).open().await.unwrap();
        let mut sizes = Vec::new();
        while let Some(chunk) = stream.next_chunk().await.unwrap() {
            sizes.push(chunk.len());
        }
        assert_eq!(sizes.iter().sum::<usize>(), 10);
        assert!(sizes.iter().all(|&n| n <= 4));
    }
}
