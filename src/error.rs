use std::io;
use std::ops::RangeInclusive;

use thiserror::Error;

/// Errors when scanning notes
#[derive(Debug, Error)]
pub enum Error {
    /// Bits per channel was out of bounds
    #[error("bits per channel {0} is outside {1:?}")]
    BitsOutOfBounds(u8, RangeInclusive<u8>),
    /// Color count was out of bounds
    #[error("color count {0} is outside {1:?}")]
    ColorCountOutOfBounds(usize, RangeInclusive<usize>),
    /// Sample fraction was not in `(0, 1]`
    #[error("sample fraction {0} is outside (0, 1]")]
    FractionOutOfBounds(f32),
    /// A threshold was not in `[0, 1]`
    #[error("{0} threshold {1} is outside [0, 1]")]
    ThresholdOutOfBounds(&'static str, f32),
    /// A packed color had bits set above the blue byte
    #[error("packed color {0:#x} does not fit in 24 bits")]
    PackedOutOfRange(u32),
    /// Two per-pixel buffers did not describe the same image
    #[error("expected a {}x{} grid, got {}x{}", expected.0, expected.1, actual.0, actual.1)]
    ShapeMismatch {
        /// Width and height that were required
        expected: (u32, u32),
        /// Width and height that were given
        actual: (u32, u32),
    },
    /// A buffer did not hold one value per pixel
    #[error("expected {expected} values, got {actual}")]
    LengthMismatch {
        /// Number of values required
        expected: usize,
        /// Number of values given
        actual: usize,
    },
    /// A quantizer gave no colors for a non-empty set of pixels
    #[error("no colors learned for {0} pixels")]
    NoCenters(usize),
    /// A quantizer gave more colors than were asked for
    #[error("{0} colors learned, at most {1} requested")]
    TooManyCenters(usize, usize),
    /// Image had no pixels
    #[error("image has no pixels")]
    EmptyImage,
    /// Background stride was zero
    #[error("background stride must be at least 1")]
    ZeroStride,
    /// Reading or writing a file failed
    #[error(transparent)]
    Io(#[from] io::Error),
    /// Decoding an input image failed
    #[error(transparent)]
    Image(#[from] image::ImageError),
    /// Encoding the output PNG failed
    #[error(transparent)]
    Png(#[from] png::EncodingError),
}
