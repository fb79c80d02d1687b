// BatchSource — load one MNIST split, then serve shuffled mini-batches
//
//   1. load():        open both sources concurrently, inflate both
//                     concurrently chunk by chunk, parse the IDX headers
//   2. next_batch():  walk the index permutation from the cursor, gather
//                     normalised images + one-hot labels, reshuffle on wrap
//
// One BatchSource per split (train / test). Single reader, single writer:
// next_batch takes &mut self and is not meant to be shared across tasks.

use std::future::Future;
use std::time::Duration;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tokio::time::Instant;
use tracing::{debug, info};

use crate::batch::{gather, Batch};
use crate::cursor::EpochCursor;
use crate::error::{LoadError, PreconditionError, Result};
use crate::idx::IdxBuffers;
use crate::inflate::inflate_stream;
use crate::source::ByteSource;

/// Options for [`BatchSource::load`].
#[derive(Debug, Clone, Default)]
pub struct LoadOptions {
    /// Give up if both sources are not fully read within this time.
    /// `None` waits indefinitely.
    pub fetch_timeout: Option<Duration>,
}

impl LoadOptions {
    pub fn fetch_timeout(mut self, timeout: Duration) -> Self {
        self.fetch_timeout = Some(timeout);
        self
    }
}

struct Loaded {
    data: IdxBuffers,
    cursor: EpochCursor,
}

/// Streams one MNIST split and serves shuffled batches from it.
///
/// The random source `R` drives every reshuffle; substitute a seeded or mock
/// generator for reproducible order.
pub struct BatchSource<R = StdRng> {
    options: LoadOptions,
    rng: R,
    loaded: Option<Loaded>,
}

impl BatchSource<StdRng> {
    /// A source shuffled from OS entropy.
    pub fn new() -> Self {
        Self::with_rng(StdRng::from_entropy())
    }

    /// A source with reproducible shuffling.
    pub fn seeded(seed: u64) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed))
    }
}

impl Default for BatchSource<StdRng> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: Rng> BatchSource<R> {
    pub fn with_rng(rng: R) -> Self {
        Self {
            options: LoadOptions::default(),
            rng,
            loaded: None,
        }
    }

    pub fn options(mut self, options: LoadOptions) -> Self {
        self.options = options;
        self
    }

    /// Fetch, inflate and parse an images/labels pair.
    ///
    /// Both sources are opened before any decompression starts; if either
    /// cannot be opened the call fails with [`LoadError::Unavailable`] and
    /// the source keeps whatever it had loaded before.
    pub async fn load<I, L>(&mut self, images: &I, labels: &L) -> Result<()>
    where
        I: ByteSource,
        L: ByteSource,
    {
        let image_location = images.location();
        let label_location = labels.location();
        let deadline = self
            .options
            .fetch_timeout
            .map(|limit| (Instant::now() + limit, limit));
        let both = format!("{image_location} + {label_location}");

        let (mut image_stream, mut label_stream) =
            within(deadline, &both, async { tokio::try_join!(images.open(), labels.open()) })
                .await?;

        let (image_bytes, label_bytes) = within(deadline, &both, async {
            tokio::try_join!(
                inflate_stream(&mut image_stream, &image_location),
                inflate_stream(&mut label_stream, &label_location),
            )
        })
        .await?;

        self.load_buffers(image_bytes, label_bytes)?;
        info!(
            images = %image_location,
            labels = %label_location,
            count = self.number_of_images(),
            rows = self.number_of_rows(),
            cols = self.number_of_columns(),
            "loaded MNIST split"
        );
        Ok(())
    }

    /// Install already-decompressed IDX buffers.
    ///
    /// Resets the permutation to identity order and the cursor to zero.
    pub fn load_buffers(&mut self, images: Vec<u8>, labels: Vec<u8>) -> Result<()> {
        let data = IdxBuffers::parse(images, labels)?;
        let cursor = EpochCursor::new(data.count());
        self.loaded = Some(Loaded { data, cursor });
        Ok(())
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded.is_some()
    }

    /// Number of examples, 0 before loading.
    pub fn number_of_images(&self) -> usize {
        self.loaded.as_ref().map_or(0, |l| l.data.count())
    }

    pub fn number_of_rows(&self) -> usize {
        self.loaded.as_ref().map_or(0, |l| l.data.rows())
    }

    pub fn number_of_columns(&self) -> usize {
        self.loaded.as_ref().map_or(0, |l| l.data.cols())
    }

    /// Cursor position within the current permutation.
    pub fn cursor(&self) -> usize {
        self.loaded.as_ref().map_or(0, |l| l.cursor.position())
    }

    /// The current index permutation (empty before loading).
    pub fn indices(&self) -> &[usize] {
        self.loaded
            .as_ref()
            .map(|l| l.cursor.indices())
            .unwrap_or(&[])
    }

    /// Next batch of `size` examples.
    ///
    /// # Panics
    /// Panics if called before a successful load, on an empty dataset, or
    /// with `size == 0`. Use [`try_next_batch`](Self::try_next_batch) to
    /// check instead.
    pub fn next_batch(&mut self, size: usize) -> Batch {
        match self.try_next_batch(size) {
            Ok(batch) => batch,
            Err(e) => panic!("next_batch({size}) precondition violated: {e}"),
        }
    }

    /// Like [`next_batch`](Self::next_batch) but reports misuse as an error.
    pub fn try_next_batch(&mut self, size: usize) -> std::result::Result<Batch, PreconditionError> {
        if size == 0 {
            return Err(PreconditionError::ZeroBatchSize);
        }
        let loaded = self.loaded.as_mut().ok_or(PreconditionError::NotLoaded)?;
        if loaded.cursor.is_empty() {
            return Err(PreconditionError::EmptyDataset);
        }

        let selection = loaded.cursor.advance(size, &mut self.rng);
        let batch = gather(&loaded.data, &selection.indices, selection.wrapped);
        debug!(
            size,
            done = batch.done,
            cursor = loaded.cursor.position(),
            "served batch"
        );
        Ok(batch)
    }
}

async fn within<T, F>(deadline: Option<(Instant, Duration)>, location: &str, fut: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    match deadline {
        None => fut.await,
        Some((at, limit)) => tokio::time::timeout_at(at, fut)
            .await
            .map_err(|_| LoadError::Timeout {
                location: location.to_string(),
                elapsed: limit,
            })?,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::idx::{build_idx1_bytes, build_idx3_bytes};
    use crate::source::MemorySource;
    use rand::rngs::mock::StepRng;

    fn tiny_split(n: u8) -> (Vec<u8>, Vec<u8>) {
        let images: Vec<Vec<u8>> = (0..n).map(|i| vec![i; 4]).collect();
        let refs: Vec<&[u8]> = images.iter().map(Vec::as_slice).collect();
        let labels: Vec<u8> = (0..n).map(|i| i % 10).collect();
        (build_idx3_bytes(&refs, 2, 2), build_idx1_bytes(&labels))
    }

    #[test]
    fn test_not_loaded() {
        let mut src = BatchSource::seeded(0);
        assert_eq!(src.try_next_batch(4).unwrap_err(), PreconditionError::NotLoaded);
        assert_eq!(src.number_of_images(), 0);
        assert!(src.indices().is_empty());
    }

    #[test]
    #[should_panic(expected = "precondition violated")]
    fn test_next_batch_before_load_panics() {
        BatchSource::seeded(0).next_batch(1);
    }

    #[test]
    fn test_zero_size_rejected() {
        let (img, lbl) = tiny_split(3);
        let mut src = BatchSource::seeded(0);
        src.load_buffers(img, lbl).unwrap();
        assert_eq!(src.try_next_batch(0).unwrap_err(), PreconditionError::ZeroBatchSize);
    }

    #[test]
    fn test_empty_dataset_rejected() {
        let mut src = BatchSource::seeded(0);
        src.load_buffers(build_idx3_bytes(&[], 2, 2), build_idx1_bytes(&[]))
            .unwrap();
        assert_eq!(src.try_next_batch(1).unwrap_err(), PreconditionError::EmptyDataset);
    }

    #[test]
    fn test_first_epoch_in_identity_order() {
        let (img, lbl) = tiny_split(4);
        let mut src = BatchSource::with_rng(StepRng::new(0, 0));
        src.load_buffers(img, lbl).unwrap();
        let b = src.next_batch(3);
        assert!(!b.done);
        assert_eq!(b.labels(), vec![0, 1, 2]);
        assert_eq!(src.cursor(), 3);
    }

    #[tokio::test]
    async fn test_load_from_memory_chunks() {
        let (img, lbl) = tiny_split(5);
        let mut src = BatchSource::seeded(1);
        src.load(
            &MemorySource::new("images", &img, 3),
            &MemorySource::new("labels", &lbl, 2),
        )
        .await
        .unwrap();
        assert!(src.is_loaded());
        assert_eq!(src.number_of_images(), 5);
        assert_eq!((src.number_of_rows(), src.number_of_columns()), (2, 2));
        assert_eq!(src.indices(), &[0, 1, 2, 3, 4]);
    }
}
