// Inflate — incremental gzip decompression
//
// Chunks are pushed one at a time as they arrive from a ChunkStream and
// decompressed straight into a single contiguous output buffer, so the
// compressed payload never has to be held in memory at once.
//
// The MNIST distribution files are gzip, but decompressed IDX files are
// common too: the first two bytes decide. Anything that does not start with
// the gzip magic (1f 8b) is copied through unchanged.

use std::io::Write;

use flate2::write::GzDecoder;

use crate::error::{LoadError, Result};
use crate::source::ChunkStream;

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

enum State {
    /// Fewer than two bytes seen; format not known yet.
    Sniffing(Vec<u8>),
    Gzip(GzDecoder<Vec<u8>>),
    Raw(Vec<u8>),
}

/// Push-style decoder producing one contiguous buffer.
pub struct Inflater {
    state: State,
    location: String,
}

impl Inflater {
    pub fn new(location: impl Into<String>) -> Self {
        Self {
            state: State::Sniffing(Vec::with_capacity(2)),
            location: location.into(),
        }
    }

    /// Feed the next compressed chunk.
    pub fn push(&mut self, chunk: &[u8]) -> Result<()> {
        if let State::Sniffing(head) = &mut self.state {
            head.extend_from_slice(chunk);
            if head.len() < GZIP_MAGIC.len() {
                return Ok(());
            }
            let head = std::mem::take(head);
            self.state = if head[..2] == GZIP_MAGIC {
                State::Gzip(GzDecoder::new(Vec::new()))
            } else {
                State::Raw(Vec::new())
            };
            return self.write(&head);
        }
        self.write(chunk)
    }

    fn write(&mut self, bytes: &[u8]) -> Result<()> {
        match &mut self.state {
            State::Gzip(decoder) => decoder.write_all(bytes).map_err(|source| LoadError::Decompress {
                location: self.location.clone(),
                source,
            }),
            State::Raw(out) => {
                out.extend_from_slice(bytes);
                Ok(())
            }
            State::Sniffing(head) => {
                head.extend_from_slice(bytes);
                Ok(())
            }
        }
    }

    /// Flush the decoder and return everything decompressed so far.
    ///
    /// Fails if a gzip stream ended before its trailer.
    pub fn finish(self) -> Result<Vec<u8>> {
        match self.state {
            State::Sniffing(head) => Ok(head),
            State::Raw(out) => Ok(out),
            State::Gzip(decoder) => decoder.finish().map_err(|source| LoadError::Decompress {
                location: self.location,
                source,
            }),
        }
    }
}

/// Drain `stream` through an [`Inflater`].
pub async fn inflate_stream<S: ChunkStream>(stream: &mut S, location: &str) -> Result<Vec<u8>> {
    let mut inflater = Inflater::new(location);
    let mut compressed = 0usize;
    while let Some(chunk) = stream.next_chunk().await? {
        compressed += chunk.len();
        inflater.push(&chunk)?;
    }
    let out = inflater.finish()?;
    tracing::debug!(location, compressed, decompressed = out.len(), "inflated stream");
    Ok(out)
}
