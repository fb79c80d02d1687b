// Batch — the tensors handed to one training step
//
// xs: [size, rows, cols, 1]  pixels scaled by 1/255 (f32)
// ys: [size, NUM_CLASSES]    one-hot labels (f32)
//
// Both arrays are filled directly from the dataset buffers with no
// intermediate copies, and own their data: dropping a Batch releases
// everything the step used.

use ndarray::{Array2, Array4, ArrayView1};

use crate::idx::IdxBuffers;

/// Number of digit classes.
pub const NUM_CLASSES: usize = 10;

/// Largest pixel value; pixels are divided by it.
pub const PIXEL_MAX: f32 = 255.0;

/// One mini-batch.
#[derive(Debug, Clone)]
pub struct Batch {
    /// True when this batch reached or crossed the end of an epoch.
    pub done: bool,
    /// Images, `[size, rows, cols, 1]`, values in `[0, 1]`.
    pub xs: Array4<f32>,
    /// One-hot labels, `[size, NUM_CLASSES]`.
    pub ys: Array2<f32>,
}

impl Batch {
    /// Number of examples.
    pub fn len(&self) -> usize {
        self.xs.shape()[0]
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Class index of each row of `ys`.
    pub fn labels(&self) -> Vec<usize> {
        self.ys.rows().into_iter().map(argmax).collect()
    }
}

/// Gather the examples at `indices` into a batch.
pub(crate) fn gather(data: &IdxBuffers, indices: &[usize], done: bool) -> Batch {
    let (rows, cols) = (data.rows(), data.cols());
    let xs = Array4::from_shape_fn((indices.len(), rows, cols, 1), |(b, r, c, _)| {
        normalize(data.image(indices[b])[r * cols + c])
    });
    let labels: Vec<u8> = indices.iter().map(|&i| data.label(i)).collect();
    Batch {
        done,
        xs,
        ys: one_hot(&labels),
    }
}

/// Scale one pixel byte to `[0, 1]`.
pub fn normalize(byte: u8) -> f32 {
    byte as f32 / PIXEL_MAX
}

/// One-hot encode labels into `[labels.len(), NUM_CLASSES]`.
///
/// A label outside `0..NUM_CLASSES` yields an all-zero row.
pub fn one_hot(labels: &[u8]) -> Array2<f32> {
    let mut ys = Array2::zeros((labels.len(), NUM_CLASSES));
    for (row, &label) in labels.iter().enumerate() {
        let class = label as usize;
        if class < NUM_CLASSES {
            ys[[row, class]] = 1.0;
        }
    }
    ys
}

/// Index of the largest value (first one on ties).
pub fn argmax(row: ArrayView1<'_, f32>) -> usize {
    let mut best = 0;
    for (i, &v) in row.iter().enumerate() {
        if v > row[best] {
            best = i;
        }
    }
    best
}
