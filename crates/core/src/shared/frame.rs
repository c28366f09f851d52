use ndarray::{ArrayView3, ShapeBuilder};
use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum FrameError {
    #[error("frame dimensions must be non-zero, got {width}x{height}")]
    ZeroDimension { width: u32, height: u32 },
    #[error("image buffer holds {actual} bytes, {expected} required")]
    BufferTooSmall { expected: usize, actual: usize },
    #[error("alignment must be a non-zero power of two, got {0}")]
    InvalidAlignment(usize),
}

/// A single RGB image in the graph's native layout.
///
/// Pixels are row-major with three interleaved channels. Each row occupies
/// `width_step` bytes, which is `width * 3` rounded up to the alignment the
/// frame was built with; the padding bytes are zero.
#[derive(Clone, Debug)]
pub struct Frame {
    data: Vec<u8>,
    width: u32,
    height: u32,
    width_step: usize,
    index: usize,
}

impl Frame {
    pub const CHANNELS: u8 = 3;

    /// Wraps tightly packed RGB bytes (`width_step == width * 3`).
    pub fn new(data: Vec<u8>, width: u32, height: u32, index: usize) -> Self {
        debug_assert_eq!(
            data.len(),
            (width as usize) * (height as usize) * Self::CHANNELS as usize,
            "data length must equal width * height * channels"
        );
        Self {
            data,
            width,
            height,
            width_step: width as usize * Self::CHANNELS as usize,
            index,
        }
    }

    /// Converts a packed BGR buffer into an RGB frame whose rows start on
    /// `alignment`-byte boundaries.
    ///
    /// Only the first `width * height * 3` bytes of `bgr` are read.
    pub fn from_bgr(
        bgr: &[u8],
        width: u32,
        height: u32,
        alignment: usize,
        index: usize,
    ) -> Result<Self, FrameError> {
        if width == 0 || height == 0 {
            return Err(FrameError::ZeroDimension { width, height });
        }
        if alignment == 0 || !alignment.is_power_of_two() {
            return Err(FrameError::InvalidAlignment(alignment));
        }
        let row_bytes = width as usize * Self::CHANNELS as usize;
        let expected = row_bytes * height as usize;
        if bgr.len() < expected {
            return Err(FrameError::BufferTooSmall {
                expected,
                actual: bgr.len(),
            });
        }

        let width_step = align_up(row_bytes, alignment);
        let mut data = vec![0u8; width_step * height as usize];
        for (src_row, dst_row) in bgr[..expected]
            .chunks_exact(row_bytes)
            .zip(data.chunks_exact_mut(width_step))
        {
            for (src, dst) in src_row
                .chunks_exact(3)
                .zip(dst_row[..row_bytes].chunks_exact_mut(3))
            {
                dst[0] = src[2];
                dst[1] = src[1];
                dst[2] = src[0];
            }
        }

        Ok(Self {
            data,
            width,
            height,
            width_step,
            index,
        })
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn channels(&self) -> u8 {
        Self::CHANNELS
    }

    /// Bytes per row, including alignment padding.
    pub fn width_step(&self) -> usize {
        self.width_step
    }

    pub fn index(&self) -> usize {
        self.index
    }

    /// RGB pixels of row `y`, without padding.
    pub fn row(&self, y: u32) -> &[u8] {
        let start = y as usize * self.width_step;
        &self.data[start..start + self.width as usize * Self::CHANNELS as usize]
    }

    /// `(height, width, channels)` view that skips row padding.
    pub fn as_ndarray(&self) -> ArrayView3<'_, u8> {
        let shape = (
            self.height as usize,
            self.width as usize,
            Self::CHANNELS as usize,
        )
            .strides((self.width_step, Self::CHANNELS as usize, 1));
        ArrayView3::from_shape(shape, &self.data)
            .expect("Frame data length must match dimensions")
    }
}

fn align_up(value: usize, alignment: usize) -> usize {
    (value + alignment - 1) & !(alignment - 1)
}
