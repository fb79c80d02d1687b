// Errors — load failures and batch preconditions
//
// Two families:
//   - LoadError:          a source could not be fetched, decompressed or parsed.
//                         Surfaced to the caller; aborts the run.
//   - PreconditionError:  the batch source was used incorrectly (not loaded,
//                         empty split, zero batch size). A programming error,
//                         not recoverable.

use std::io;
use std::time::Duration;

/// Everything that can go wrong while fetching and decoding IDX resources.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    /// The source could not be opened (missing file, refused connection,
    /// non-success HTTP status). Raised before any byte is decompressed.
    #[error("source unavailable: {location}: {reason}")]
    Unavailable { location: String, reason: String },

    /// The HTTP transfer failed after the response started streaming.
    #[error("http transfer failed for {location}: {source}")]
    Http {
        location: String,
        #[source]
        source: reqwest::Error,
    },

    /// Reading a local stream failed midway.
    #[error("i/o error reading {location}: {source}")]
    Io {
        location: String,
        #[source]
        source: io::Error,
    },

    /// The gzip stream was corrupt or ended early.
    #[error("decompression failed for {location}: {source}")]
    Decompress {
        location: String,
        #[source]
        source: io::Error,
    },

    /// The decompressed bytes do not match the IDX layout.
    #[error("malformed {kind} data: {detail}")]
    Malformed { kind: &'static str, detail: String },

    /// The fetch did not finish within the configured timeout.
    #[error("timed out after {elapsed:?} loading {location}")]
    Timeout { location: String, elapsed: Duration },
}

impl LoadError {
    pub(crate) fn unavailable(location: impl Into<String>, reason: impl ToString) -> Self {
        LoadError::Unavailable {
            location: location.into(),
            reason: reason.to_string(),
        }
    }

    pub(crate) fn malformed(kind: &'static str, detail: impl Into<String>) -> Self {
        LoadError::Malformed {
            kind,
            detail: detail.into(),
        }
    }
}

/// Misuse of a [`BatchSource`](crate::BatchSource).
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum PreconditionError {
    /// `next_batch` was called before `load` completed.
    #[error("no data loaded: call load() before requesting batches")]
    NotLoaded,
    /// The loaded split holds no examples.
    #[error("the loaded dataset is empty")]
    EmptyDataset,
    /// A batch of zero examples was requested.
    #[error("batch size must be positive")]
    ZeroBatchSize,
}

pub type Result<T> = std::result::Result<T, LoadError>;
