use std::fmt;

use image::{Pixel, Rgb};
use itertools::{Itertools, MinMaxResult};

#[cfg(feature = "print-truecolor")]
use termion::color;

/// Palette of colors, entry 0 being the page background.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Palette {
    /// Palette of Colors
    pub palette: Vec<Color>,
}

/// Color with population
#[derive(Debug, Hash, PartialEq, Eq, Clone, Copy)]
pub struct Color {
    /// Color
    pub color: Rgb<u8>,
    /// Number of pixels labelled with this entry
    pub population: usize,
}

impl Palette {
    /// Background first, then the learned colors in the order given.
    ///
    /// `labels` are palette indices, used to count each entry's population.
    pub fn new(background: Rgb<u8>, centers: &[Rgb<u8>], labels: &[u8]) -> Palette {
        let pixel_counts = labels.iter().counts();
        let palette = std::iter::once(background)
            .chain(centers.iter().copied())
            .enumerate()
            .map(|(i, color)| Color {
                color,
                population: pixel_counts.get(&(i as u8)).copied().unwrap_or(0),
            })
            .collect();
        Palette { palette }
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.palette.len()
    }

    /// Whether the palette has no entries
    pub fn is_empty(&self) -> bool {
        self.palette.is_empty()
    }

    /// The colors, in index order
    pub fn colors(&self) -> impl Iterator<Item = Rgb<u8>> + '_ {
        self.palette.iter().map(|c| c.color)
    }

    /// The background entry, if any
    pub fn background(&self) -> Option<Rgb<u8>> {
        self.palette.first().map(|c| c.color)
    }

    /// Stretches all channels of all entries so the darkest channel value in
    /// the palette becomes 0 and the brightest 255.
    ///
    /// One min/max for the whole palette, so hues are kept. A flat palette is
    /// returned as is.
    pub fn saturate(self) -> Self {
        let range = self
            .palette
            .iter()
            .flat_map(|c| c.color.0)
            .minmax();
        let (min, max) = match range {
            MinMaxResult::MinMax(min, max) if min < max => (f32::from(min), f32::from(max)),
            _ => return self,
        };
        let palette = self
            .palette
            .into_iter()
            .map(|c| Color {
                color: c
                    .color
                    .map(|v| (255.0 * (f32::from(v) - min) / (max - min)).round() as u8),
                ..c
            })
            .collect();
        Palette { palette }
    }

    /// Replaces the background entry with pure white.
    pub fn white_background(mut self) -> Self {
        if let Some(first) = self.palette.first_mut() {
            first.color = Rgb([255, 255, 255]);
        }
        self
    }

    /// Flat `[r, g, b, r, g, b, ...]` table, as paletted image formats store it.
    pub fn to_rgb_bytes(&self) -> Vec<u8> {
        self.palette.iter().flat_map(|c| c.color.0).collect()
    }
}

impl fmt::Display for Palette {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let color_list = self.palette.iter().map(|c| format!("{:#}", c)).join(", ");

        write!(f, "Color Palette {{ {} }}", color_list)
    }
}

/// `{}` prints the hex color and its population, `{:#}` just the hex color.
impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let [r, g, b] = self.color.0;
        #[cfg(feature = "print-truecolor")]
        write!(f, "{}███{} ", color::Fg(color::Rgb(r, g, b)), color::Fg(color::Reset))?;
        write!(f, "#{:02X}{:02X}{:02X}", r, g, b)?;

        if f.alternate() {
            return Ok(());
        }
        write!(f, ", {} pixels", self.population)
    }
}
