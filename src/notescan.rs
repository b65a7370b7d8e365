use std::ops::RangeInclusive;

use image::{Rgb, RgbImage};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, info};

use crate::background::{
    background_color, background_mask, foreground, sat_val, sat_val_image, Thresholds,
};
use crate::color::Buckets;
use crate::quantizer::{cluster, KMeans};
use crate::{settings, Error, Grid, Palette};

/// Allowed number of output colors, background included.
pub const COLOR_RANGE: RangeInclusive<usize> = 2..=256;

/// Settings for one run over an image
#[derive(Debug, Clone, PartialEq)]
pub struct Options {
    bits_per_channel: u8,
    thresholds: Thresholds,
    num_colors: usize,
    sample_fraction: f32,
    saturate: bool,
    white_background: bool,
    background_stride: u32,
    seed: Option<u64>,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            bits_per_channel: settings::BITS_PER_CHANNEL,
            thresholds: Thresholds::default(),
            num_colors: settings::NUM_COLORS,
            sample_fraction: settings::SAMPLE_FRACTION,
            saturate: false,
            white_background: false,
            background_stride: settings::BACKGROUND_STRIDE,
            seed: None,
        }
    }
}

impl Options {
    /// Options with the default values from [`settings`](crate::settings).
    pub fn new() -> Self {
        Self::default()
    }

    /// Bits per channel kept when looking for the background color.
    #[must_use]
    pub fn bits_per_channel(mut self, bits: u8) -> Self {
        self.bits_per_channel = bits;
        self
    }

    /// Maximum value difference from the background, in `[0, 1]`.
    #[must_use]
    pub fn value_threshold(mut self, threshold: f32) -> Self {
        self.thresholds.value = threshold;
        self
    }

    /// Maximum saturation difference from the background, in `[0, 1]`.
    #[must_use]
    pub fn sat_threshold(mut self, threshold: f32) -> Self {
        self.thresholds.saturation = threshold;
        self
    }

    /// Number of output colors, background included.
    #[must_use]
    pub fn num_colors(mut self, colors: usize) -> Self {
        self.num_colors = colors;
        self
    }

    /// Share of the foreground pixels used to learn the palette, in `(0, 1]`.
    #[must_use]
    pub fn sample_fraction(mut self, fraction: f32) -> Self {
        self.sample_fraction = fraction;
        self
    }

    /// Stretch the palette to the full `0..=255` range.
    #[must_use]
    pub fn saturate(mut self, saturate: bool) -> Self {
        self.saturate = saturate;
        self
    }

    /// Force the background entry to white.
    #[must_use]
    pub fn white_background(mut self, white: bool) -> Self {
        self.white_background = white;
        self
    }

    /// Look at every `stride`-th row and column to find the background.
    #[must_use]
    pub fn background_stride(mut self, stride: u32) -> Self {
        self.background_stride = stride;
        self
    }

    /// Seed for pixel sampling, fresh entropy when unset.
    #[must_use]
    pub fn seed(mut self, seed: Option<u64>) -> Self {
        self.seed = seed;
        self
    }

    /// Fails on the first option out of its bounds.
    pub fn validate(&self) -> Result<(), Error> {
        Buckets::new(self.bits_per_channel)?;
        self.thresholds.validate()?;
        if !COLOR_RANGE.contains(&self.num_colors) {
            return Err(Error::ColorCountOutOfBounds(self.num_colors, COLOR_RANGE));
        }
        KMeans::new(self.sample_fraction)?;
        if self.background_stride == 0 {
            return Err(Error::ZeroStride);
        }
        Ok(())
    }

    /// Random source for sampling, seeded from [`seed`](Self::seed) if set.
    pub fn rng(&self) -> StdRng {
        match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        }
    }

    /// [`encode`] with the random source from [`rng`](Self::rng).
    pub fn encode(&self, image: &RgbImage) -> Result<Encoded, Error> {
        encode(image, self, &mut self.rng())
    }
}

/// A label map plus the palette its labels index into
#[derive(Debug, Clone, PartialEq)]
pub struct Encoded {
    /// Palette index per pixel; 0 is background
    pub labels: Grid<u8>,
    /// Background first, then the learned ink colors
    pub palette: Palette,
}

impl Encoded {
    /// Width and height
    pub fn dimensions(&self) -> (u32, u32) {
        self.labels.dimensions()
    }

    /// Looks every label up in the palette.
    pub fn to_rgb_image(&self) -> RgbImage {
        let colors = self.palette.colors().collect::<Vec<_>>();
        RgbImage::from_fn(self.labels.width(), self.labels.height(), |x, y| {
            colors
                .get(usize::from(self.labels[(x, y)]))
                .copied()
                .unwrap_or(Rgb([0, 0, 0]))
        })
    }
}

/// Separates `image` into background and ink, learns a palette for the ink
/// and labels every pixel with its palette entry.
///
/// When there are fewer foreground pixels than ink colors requested, the
/// palette shrinks to match; an all-background image gives a one-entry palette.
pub fn encode<R>(image: &RgbImage, options: &Options, rng: &mut R) -> Result<Encoded, Error>
where
    R: Rng + ?Sized,
{
    options.validate()?;

    let background = background_color(image, options.bits_per_channel, options.background_stride)?;
    info!(?background, "got background color");

    let mask = background_mask(&sat_val_image(image), sat_val(background), options.thresholds)?;
    let ink = foreground(image, &mask)?;
    info!(foreground = ink.len(), "quantizing");

    let kmeans = KMeans::new(options.sample_fraction)?;
    let clusters = cluster(&kmeans, &ink, options.num_colors - 1, rng)?;

    let mut clustered = clusters.labels.iter();
    let labels = mask
        .iter()
        .map(|&is_background| {
            if is_background {
                return Ok(0);
            }
            let &label = clustered.next().ok_or(Error::LengthMismatch {
                expected: ink.len(),
                actual: clusters.labels.len(),
            })?;
            palette_index(label)
        })
        .collect::<Result<Vec<_>, Error>>()?;
    let labels = Grid::from_vec(mask.width(), mask.height(), labels)?;

    let mut palette = Palette::new(background, &clusters.centers, labels.as_slice());
    debug!(%palette, "learned");
    if options.saturate {
        palette = palette.saturate();
    }
    if options.white_background {
        palette = palette.white_background();
    }

    Ok(Encoded { labels, palette })
}

/// Palette entry of ink cluster `label`, entry 0 being the background.
fn palette_index(label: usize) -> Result<u8, Error> {
    u8::try_from(label + 1).map_err(|_| Error::TooManyCenters(label + 1, COLOR_RANGE.end() - 1))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn page(width: u32, height: u32) -> RgbImage {
        RgbImage::from_fn(width, height, |x, y| match (x / 4 + y / 4) % 9 {
            0 => Rgb([20, 20, 25]),
            1 => Rgb([200, 30, 30]),
            2 => Rgb([30, 60, 190]),
            3 => Rgb([40, 140, 50]),
            _ => Rgb([238, 236, 228]),
        })
    }

    #[test]
    fn validates_options() {
        assert!(Options::default().validate().is_ok());
        assert!(matches!(
            Options::new().num_colors(1).validate(),
            Err(Error::ColorCountOutOfBounds(1, _))
        ));
        assert!(Options::new().num_colors(257).validate().is_err());
        assert!(Options::new().bits_per_channel(0).validate().is_err());
        assert!(Options::new().value_threshold(-0.1).validate().is_err());
        assert!(Options::new().sample_fraction(0.0).validate().is_err());
        assert!(matches!(
            Options::new().background_stride(0).validate(),
            Err(Error::ZeroStride)
        ));
    }

    #[test]
    fn palette_has_requested_size() {
        let image = page(64, 64);
        for colors in [2, 4, 8, 16] {
            let options = Options::new().num_colors(colors).seed(Some(5));
            let encoded = options.encode(&image).unwrap();
            assert_eq!(encoded.palette.len(), colors);
            assert_eq!(encoded.palette.background(), Some(Rgb([238, 238, 230])));
            assert!(encoded
                .labels
                .iter()
                .all(|&label| usize::from(label) < colors));
        }
    }

    #[test]
    fn labels_follow_the_mask() {
        let image = page(48, 32);
        let encoded = Options::new().seed(Some(11)).encode(&image).unwrap();
        assert_eq!(encoded.dimensions(), (48, 32));
        for (pixel, &label) in image.pixels().zip(encoded.labels.iter()) {
            assert_eq!(*pixel == Rgb([238, 236, 228]), label == 0, "{:?}", pixel);
        }
    }

    #[test]
    fn all_background() {
        let image = RgbImage::from_pixel(10, 10, Rgb([250, 250, 250]));
        let encoded = Options::new().seed(Some(0)).encode(&image).unwrap();
        assert_eq!(encoded.palette.len(), 1);
        assert!(encoded.labels.iter().all(|&label| label == 0));
        assert_eq!(encoded.palette.palette[0].population, 100);
    }

    #[test]
    fn sparse_foreground_shrinks_palette() {
        let mut image = RgbImage::from_pixel(10, 10, Rgb([250, 250, 250]));
        image.put_pixel(3, 3, Rgb([0, 0, 0]));
        image.put_pixel(7, 1, Rgb([0, 0, 200]));
        let encoded = Options::new().seed(Some(0)).encode(&image).unwrap();
        assert_eq!(encoded.palette.len(), 3);
        let rendered = encoded.to_rgb_image();
        assert_eq!(*rendered.get_pixel(3, 3), Rgb([0, 0, 0]));
        assert_eq!(*rendered.get_pixel(7, 1), Rgb([0, 0, 200]));
        assert_eq!(*rendered.get_pixel(0, 0), Rgb([250, 250, 250]));
    }

    #[test]
    fn post_processing_leaves_labels_alone() {
        let image = page(32, 32);
        let plain = Options::new().seed(Some(3)).encode(&image).unwrap();
        let processed = Options::new()
            .seed(Some(3))
            .saturate(true)
            .white_background(true)
            .encode(&image)
            .unwrap();
        assert_eq!(plain.labels, processed.labels);
        assert_eq!(processed.palette.background(), Some(Rgb([255, 255, 255])));
        assert_eq!(
            processed.palette,
            plain.palette.saturate().white_background()
        );
    }

    #[test]
    fn ink_labels_fit_in_a_byte() {
        assert_eq!(palette_index(0).unwrap(), 1);
        assert_eq!(palette_index(254).unwrap(), 255);
        assert!(matches!(
            palette_index(255),
            Err(Error::TooManyCenters(256, 255))
        ));
    }

    #[test]
    fn largest_palette_is_indexable() {
        // 255 distinct ink colors plus the page
        let image = RgbImage::from_fn(32, 32, |x, y| match y * 32 + x {
            i if i < 255 => Rgb([(i % 16 * 8) as u8, (i / 16 * 8) as u8, 100]),
            _ => Rgb([250, 250, 250]),
        });
        let encoded = Options::new()
            .num_colors(256)
            .sample_fraction(1.0)
            .seed(Some(4))
            .encode(&image)
            .unwrap();
        assert_eq!(encoded.palette.len(), 256);
        assert_eq!(encoded.to_rgb_image(), image);
    }

    #[test]
    fn empty_image() {
        assert!(matches!(
            Options::new().encode(&RgbImage::new(0, 0)),
            Err(Error::EmptyImage)
        ));
    }
}
