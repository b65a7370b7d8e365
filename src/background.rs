//! Separating the page from the ink.

use image::{Rgb, RgbImage};
use itertools::Itertools;
use tracing::debug;

use crate::color::{pack_image, unpack, Buckets};
use crate::{settings, Error, Grid};

/// Finds the most common quantized color among every `stride`-th pixel of
/// every `stride`-th row.
///
/// Ties go to the color with the lowest packed value.
pub fn background_color(image: &RgbImage, bits: u8, stride: u32) -> Result<Rgb<u8>, Error> {
    if image.width() == 0 || image.height() == 0 {
        return Err(Error::EmptyImage);
    }
    if stride == 0 {
        return Err(Error::ZeroStride);
    }
    let buckets = Buckets::new(bits)?;

    let subsample = RgbImage::from_fn(
        image.width().div_ceil(stride),
        image.height().div_ceil(stride),
        |x, y| *image.get_pixel(x * stride, y * stride),
    );
    let packed = pack_image(&buckets.image(&subsample));

    let (mode, count) = packed
        .iter()
        .counts()
        .into_iter()
        .max_by(|(a, a_count), (b, b_count)| a_count.cmp(b_count).then(b.cmp(a)))
        .ok_or(Error::EmptyImage)?;

    let color = unpack(*mode);
    debug!(?color, count, "background color");
    Ok(color)
}

/// Saturation and value of a color, both in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SatVal {
    /// `(max - min) / max`, zero for black
    pub saturation: f32,
    /// `max / 255`
    pub value: f32,
}

impl From<Rgb<u8>> for SatVal {
    fn from(color: Rgb<u8>) -> Self {
        sat_val(color)
    }
}

/// Saturation and value of one color.
pub fn sat_val(color: Rgb<u8>) -> SatVal {
    let [r, g, b] = color.0;
    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let saturation = if max == 0 {
        0.0
    } else {
        f32::from(max - min) / f32::from(max)
    };
    SatVal {
        saturation,
        value: f32::from(max) / 255.0,
    }
}

/// Saturation and value of every pixel.
pub fn sat_val_image(image: &RgbImage) -> Grid<SatVal> {
    Grid::from_fn(image.width(), image.height(), |x, y| {
        sat_val(*image.get_pixel(x, y))
    })
}

/// How far a pixel may be from the background color and still count as page.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Thresholds {
    /// Maximum difference in value
    pub value: f32,
    /// Maximum difference in saturation
    pub saturation: f32,
}

impl Thresholds {
    /// Checked constructor, both thresholds must lie in `[0, 1]`.
    pub fn new(value: f32, saturation: f32) -> Result<Self, Error> {
        let thresholds = Self { value, saturation };
        thresholds.validate()?;
        Ok(thresholds)
    }

    pub(crate) fn validate(&self) -> Result<(), Error> {
        if !(0.0..=1.0).contains(&self.value) {
            return Err(Error::ThresholdOutOfBounds("value", self.value));
        }
        if !(0.0..=1.0).contains(&self.saturation) {
            return Err(Error::ThresholdOutOfBounds("saturation", self.saturation));
        }
        Ok(())
    }

    /// Whether `pixel` is close enough to `background` in both value and saturation.
    pub fn is_background(&self, pixel: SatVal, background: SatVal) -> bool {
        (pixel.value - background.value).abs() < self.value
            && (pixel.saturation - background.saturation).abs() < self.saturation
    }
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            value: settings::VALUE_THRESHOLD,
            saturation: settings::SAT_THRESHOLD,
        }
    }
}

/// Classifies every pixel, `true` meaning background.
///
/// Purely per pixel: no smoothing, so isolated specks keep whatever class
/// their color gives them.
pub fn background_mask(
    pixels: &Grid<SatVal>,
    background: SatVal,
    thresholds: Thresholds,
) -> Result<Grid<bool>, Error> {
    thresholds.validate()?;
    Ok(pixels.map(|&sv| thresholds.is_background(sv, background)))
}

/// The pixels of `image` the mask does not mark as background, in row-major
/// order.
pub fn foreground(image: &RgbImage, mask: &Grid<bool>) -> Result<Vec<Rgb<u8>>, Error> {
    mask.ensure_dimensions(image.dimensions())?;
    Ok(image
        .pixels()
        .zip(mask)
        .filter(|&(_, &is_background)| !is_background)
        .map(|(pixel, _)| *pixel)
        .collect())
}
