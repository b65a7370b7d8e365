//! Default values for [`Options`](crate::Options).

/// Bits kept per channel when looking for the background color.
pub const BITS_PER_CHANNEL: u8 = 6;

/// Maximum difference in value (brightness) from the background color.
pub const VALUE_THRESHOLD: f32 = 0.25;
/// Maximum difference in saturation from the background color.
pub const SAT_THRESHOLD: f32 = 0.20;

/// Number of output colors, background included.
pub const NUM_COLORS: usize = 8;
/// Share of the foreground pixels used to learn the palette.
pub const SAMPLE_FRACTION: f32 = 0.05;

/// Upper bound on Lloyd iterations.
pub const KMEANS_ITERATIONS: usize = 40;
/// Stop once the mean distortion improves by no more than this.
pub const KMEANS_THRESHOLD: f32 = 1e-5;

/// Only every n-th row and column is looked at to find the background.
pub const BACKGROUND_STRIDE: u32 = 4;

/// Pixel density written into output files.
pub const DPI: u32 = 300;
