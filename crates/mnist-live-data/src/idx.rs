// IDX — header parsing over decompressed MNIST buffers
//
// The MNIST database consists of 4 files:
//   - train-images-idx3-ubyte  (60,000  28×28 images)
//   - train-labels-idx1-ubyte  (60,000  labels 0-9)
//   - t10k-images-idx3-ubyte   (10,000  28×28 images)
//   - t10k-labels-idx1-ubyte   (10,000  labels 0-9)
//
// IDX format (all header values big-endian u32):
//   images: magic(2051) | count | rows | cols | pixel_data(u8...)
//   labels: magic(2049) | count | label_data(u8...)
//
// The buffers are kept whole; samples are addressed by offset into them
// rather than split into per-image vectors.

use tracing::debug;

use crate::error::{LoadError, Result};

/// Offset of the first pixel byte in an image file.
pub const IMAGE_DATA_START: usize = 16;
/// Offset of the first label byte in a label file.
pub const LABEL_DATA_START: usize = 8;

pub const IMAGE_MAGIC: u32 = 2051;
pub const LABEL_MAGIC: u32 = 2049;

/// The two decompressed buffers of one split, with their parsed headers.
#[derive(Debug, Clone)]
pub struct IdxBuffers {
    images: Vec<u8>,
    labels: Vec<u8>,
    count: usize,
    rows: usize,
    cols: usize,
}

impl IdxBuffers {
    /// Parse headers and check that both buffers hold what they claim.
    pub fn parse(images: Vec<u8>, labels: Vec<u8>) -> Result<Self> {
        if images.len() < IMAGE_DATA_START {
            return Err(LoadError::malformed(
                "image",
                format!("header needs {IMAGE_DATA_START} bytes, got {}", images.len()),
            ));
        }
        if labels.len() < LABEL_DATA_START {
            return Err(LoadError::malformed(
                "label",
                format!("header needs {LABEL_DATA_START} bytes, got {}", labels.len()),
            ));
        }

        let image_magic = read_u32_be(&images, 0);
        let label_magic = read_u32_be(&labels, 0);
        if image_magic != IMAGE_MAGIC || label_magic != LABEL_MAGIC {
            debug!(image_magic, label_magic, "unexpected IDX magic numbers");
        }

        let count = read_u32_be(&images, 4) as usize;
        let rows = read_u32_be(&images, 8) as usize;
        let cols = read_u32_be(&images, 12) as usize;
        let label_count = read_u32_be(&labels, 4) as usize;

        if label_count != count {
            return Err(LoadError::malformed(
                "label",
                format!("{label_count} labels for {count} images"),
            ));
        }

        let image_len = count
            .checked_mul(rows)
            .and_then(|n| n.checked_mul(cols))
            .and_then(|n| n.checked_add(IMAGE_DATA_START))
            .ok_or_else(|| LoadError::malformed("image", "header dimensions overflow"))?;
        if images.len() < image_len {
            return Err(LoadError::malformed(
                "image",
                format!("expected {image_len} bytes, got {}", images.len()),
            ));
        }
        let label_len = LABEL_DATA_START + count;
        if labels.len() < label_len {
            return Err(LoadError::malformed(
                "label",
                format!("expected {label_len} bytes, got {}", labels.len()),
            ));
        }

        Ok(Self {
            images,
            labels,
            count,
            rows,
            cols,
        })
    }

    /// Number of examples.
    pub fn count(&self) -> usize {
        self.count
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Bytes per image (`rows * cols`).
    pub fn image_size(&self) -> usize {
        self.rows * self.cols
    }

    /// Raw pixels of example `i`.
    pub fn image(&self, i: usize) -> &[u8] {
        let start = IMAGE_DATA_START + i * self.image_size();
        &self.images[start..start + self.image_size()]
    }

    /// Label byte of example `i`.
    pub fn label(&self, i: usize) -> u8 {
        self.labels[LABEL_DATA_START + i]
    }
}

/// Read a big-endian u32 from `data` at byte offset `off`.
pub fn read_u32_be(data: &[u8], off: usize) -> u32 {
    u32::from_be_bytes([data[off], data[off + 1], data[off + 2], data[off + 3]])
}

// Builder helpers

/// Build IDX3 image bytes from raw image data (useful for tests).
pub fn build_idx3_bytes(images: &[&[u8]], rows: u32, cols: u32) -> Vec<u8> {
    let count = images.len() as u32;
    let mut buf = Vec::new();
    buf.extend_from_slice(&IMAGE_MAGIC.to_be_bytes());
    buf.extend_from_slice(&count.to_be_bytes());
    buf.extend_from_slice(&rows.to_be_bytes());
    buf.extend_from_slice(&cols.to_be_bytes());
    for img in images {
        buf.extend_from_slice(img);
    }
    buf
}

/// Build IDX1 label bytes (useful for tests).
pub fn build_idx1_bytes(labels: &[u8]) -> Vec<u8> {
    let count = labels.len() as u32;
    let mut buf = Vec::new();
    buf.extend_from_slice(&LABEL_MAGIC.to_be_bytes());
    buf.extend_from_slice(&count.to_be_bytes());
    buf.extend_from_slice(labels);
    buf
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_headers() {
        let img1 = [0u8; 4];
        let img2 = [255u8; 4];
        let bufs = IdxBuffers::parse(
            build_idx3_bytes(&[&img1, &img2], 2, 2),
            build_idx1_bytes(&[4, 9]),
        )
        .unwrap();
        assert_eq!(bufs.count(), 2);
        assert_eq!((bufs.rows(), bufs.cols()), (2, 2));
        assert_eq!(bufs.image(0), &[0, 0, 0, 0]);
        assert_eq!(bufs.image(1), &[255, 255, 255, 255]);
        assert_eq!(bufs.label(0), 4);
        assert_eq!(bufs.label(1), 9);
    }

    #[test]
    fn test_magic_is_not_enforced() {
        let mut images = vec![0, 0, 8, 1, 0, 0, 0, 1, 0, 0, 0, 1, 0, 0, 0, 1];
        images.push(17);
        let bufs = IdxBuffers::parse(images, vec![0, 0, 8, 1, 0, 0, 0, 1, 5]).unwrap();
        assert_eq!(bufs.count(), 1);
        assert_eq!(bufs.image(0), &[17]);
    }

    #[test]
    fn test_truncated_images() {
        let mut images = build_idx3_bytes(&[&[1u8; 4], &[2u8; 4]], 2, 2);
        images.pop();
        let err = IdxBuffers::parse(images, build_idx1_bytes(&[0, 1])).unwrap_err();
        assert!(matches!(err, LoadError::Malformed { kind: "image", .. }));
    }

    #[test]
    fn test_short_header() {
        let err = IdxBuffers::parse(vec![0; 10], build_idx1_bytes(&[])).unwrap_err();
        assert!(matches!(err, LoadError::Malformed { kind: "image", .. }));
        let err = IdxBuffers::parse(build_idx3_bytes(&[], 28, 28), vec![0; 3]).unwrap_err();
        assert!(matches!(err, LoadError::Malformed { kind: "label", .. }));
    }

    #[test]
    fn test_count_mismatch() {
        let images = build_idx3_bytes(&[&[0u8; 4]], 2, 2);
        let labels = build_idx1_bytes(&[0, 1]);
        let err = IdxBuffers::parse(images, labels).unwrap_err();
        assert!(matches!(err, LoadError::Malformed { kind: "label", .. }));
    }

    #[test]
    fn test_read_u32_be() {
        assert_eq!(read_u32_be(&[0, 0, 0x08, 0x03], 0), 2051);
        assert_eq!(read_u32_be(&[9, 0, 0, 0xEA, 0x60], 1), 60_000);
    }
}
