//! # mnist-live-data
//!
//! Streaming MNIST loading and batching for mnist-live.
//!
//! This crate provides:
//! - [`ByteSource`] — files, HTTP resources or in-memory bytes read chunk by chunk
//! - [`Inflater`] — incremental gzip decompression into one contiguous buffer
//! - [`IdxBuffers`] — IDX header parsing over the decompressed images/labels
//! - [`EpochCursor`] — shuffled index permutation with wrap-and-reshuffle
//! - [`BatchSource`] — concurrent load, then normalised / one-hot [`Batch`]es

pub mod batch;
pub mod cursor;
pub mod error;
pub mod idx;
pub mod inflate;
pub mod loader;
pub mod source;

pub use batch::{argmax, normalize, one_hot, Batch, NUM_CLASSES};
pub use cursor::{EpochCursor, Selection};
pub use error::{LoadError, PreconditionError, Result};
pub use idx::{build_idx1_bytes, build_idx3_bytes, IdxBuffers};
pub use inflate::{inflate_stream, Inflater};
pub use loader::{BatchSource, LoadOptions};
pub use source::{
    ByteSource, ChunkStream, FileSource, HttpSource, MemorySource, Resource, DEFAULT_CHUNK_SIZE,
};
