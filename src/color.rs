//! Per-channel quantization and packing of RGB triples into integer keys.

use std::convert::TryFrom;
use std::ops::RangeInclusive;

use image::{Pixel, Rgb, RgbImage};

use crate::{Error, Grid};

/// Allowed number of bits kept per channel.
pub const BITS_RANGE: RangeInclusive<u8> = 1..=8;

/// Equal-width buckets spanning `0..=255` for one bit depth.
///
/// Every value is snapped to the center of the bucket containing it, so the
/// result is always congruent to `half` modulo the bucket size and quantizing
/// twice is the same as quantizing once.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Buckets {
    shift: u8,
}

impl Buckets {
    /// Buckets keeping `bits` bits of every channel.
    pub fn new(bits: u8) -> Result<Self, Error> {
        if !BITS_RANGE.contains(&bits) {
            return Err(Error::BitsOutOfBounds(bits, BITS_RANGE));
        }
        Ok(Self { shift: 8 - bits })
    }

    /// Width of one bucket
    pub fn size(self) -> u16 {
        1 << self.shift
    }

    /// Offset of the bucket center from its lower edge
    pub fn half(self) -> u8 {
        (self.size() >> 1) as u8
    }

    /// Center of the bucket containing `value`.
    pub fn channel(self, value: u8) -> u8 {
        (value >> self.shift << self.shift) + self.half()
    }

    /// Quantizes every channel of `color`.
    pub fn color(self, color: Rgb<u8>) -> Rgb<u8> {
        color.map(|c| self.channel(c))
    }

    /// Quantizes every pixel of `image` into a new image.
    pub fn image(self, image: &RgbImage) -> RgbImage {
        let mut quantized = image.clone();
        for pixel in quantized.pixels_mut() {
            *pixel = self.color(*pixel);
        }
        quantized
    }
}

/// Quantizes `image` to `bits` bits per channel.
pub fn quantize(image: &RgbImage, bits: u8) -> Result<RgbImage, Error> {
    Ok(Buckets::new(bits)?.image(image))
}

/// An RGB triple packed into one integer: red in the low byte, green in the
/// middle byte, blue in the high byte.
///
/// Only meant as a key for hashing and counting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PackedColor(u32);

impl PackedColor {
    /// Largest valid packed value
    pub const MAX: u32 = 0xFF_FFFF;

    /// The packed integer
    pub fn get(self) -> u32 {
        self.0
    }
}

/// Packs one color.
pub fn pack(color: Rgb<u8>) -> PackedColor {
    let [r, g, b] = color.0;
    PackedColor(u32::from(r) | u32::from(g) << 8 | u32::from(b) << 16)
}

/// Unpacks one color.
pub fn unpack(packed: PackedColor) -> Rgb<u8> {
    let v = packed.0;
    Rgb([(v & 0xFF) as u8, (v >> 8 & 0xFF) as u8, (v >> 16 & 0xFF) as u8])
}

/// Packs every pixel, keeping the image's shape.
pub fn pack_image(image: &RgbImage) -> Grid<PackedColor> {
    Grid::from_fn(image.width(), image.height(), |x, y| {
        pack(*image.get_pixel(x, y))
    })
}

impl From<Rgb<u8>> for PackedColor {
    fn from(color: Rgb<u8>) -> Self {
        pack(color)
    }
}

impl From<PackedColor> for Rgb<u8> {
    fn from(packed: PackedColor) -> Self {
        unpack(packed)
    }
}

impl TryFrom<u32> for PackedColor {
    type Error = Error;

    fn try_from(value: u32) -> Result<Self, Error> {
        if value > Self::MAX {
            return Err(Error::PackedOutOfRange(value));
        }
        Ok(Self(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn snaps_to_bucket_centers() {
        let buckets = Buckets::new(6).unwrap();
        assert_eq!(buckets.size(), 4);
        assert_eq!(buckets.half(), 2);
        assert_eq!(buckets.channel(0), 2);
        assert_eq!(buckets.channel(3), 2);
        assert_eq!(buckets.channel(4), 6);
        assert_eq!(buckets.channel(200), 202);
        assert_eq!(buckets.channel(255), 254);
    }

    #[test]
    fn every_value_lands_on_a_center() {
        for bits in BITS_RANGE {
            let buckets = Buckets::new(bits).unwrap();
            let size = buckets.size();
            for value in 0..=255u8 {
                let q = buckets.channel(value);
                assert_eq!(u16::from(q) % size, u16::from(buckets.half()));
                assert!(u16::from(value.abs_diff(q)) < size);
            }
        }
    }

    #[test]
    fn eight_bits_is_identity() {
        let buckets = Buckets::new(8).unwrap();
        assert!((0..=255u8).all(|v| buckets.channel(v) == v));
    }

    #[test]
    fn quantize_is_idempotent() {
        let image = RgbImage::from_fn(16, 16, |x, y| {
            Rgb([(x * 16) as u8, (y * 16 + 7) as u8, (x * y) as u8])
        });
        for bits in BITS_RANGE {
            let once = quantize(&image, bits).unwrap();
            let twice = quantize(&once, bits).unwrap();
            assert_eq!(once, twice);
        }
    }

    #[test]
    fn rejects_bad_bit_depth() {
        assert!(matches!(
            Buckets::new(0),
            Err(Error::BitsOutOfBounds(0, _))
        ));
        assert!(Buckets::new(9).is_err());
    }

    #[test]
    fn packs_red_low_blue_high() {
        assert_eq!(pack(Rgb([0x12, 0x34, 0x56])).get(), 0x56_3412);
        assert_eq!(unpack(PackedColor(0x56_3412)), Rgb([0x12, 0x34, 0x56]));
    }

    #[test]
    fn pack_round_trip() {
        for r in (0..=255u8).step_by(5) {
            for g in (0..=255u8).step_by(3) {
                for b in [0u8, 1, 127, 128, 254, 255] {
                    let color = Rgb([r, g, b]);
                    assert_eq!(unpack(pack(color)), color);
                }
            }
        }
        for v in [0, 1, 0xFF, 0x100, 0xAB_CDEF, PackedColor::MAX] {
            let packed = PackedColor::try_from(v).unwrap();
            assert_eq!(pack(unpack(packed)), packed);
        }
    }

    #[test]
    fn rejects_oversized_packed_value() {
        assert!(matches!(
            PackedColor::try_from(0x100_0000),
            Err(Error::PackedOutOfRange(0x100_0000))
        ));
    }

    #[test]
    fn packing_an_image_keeps_its_shape() {
        let image = RgbImage::from_fn(3, 2, |x, y| Rgb([x as u8, y as u8, 9]));
        let packed = pack_image(&image);
        assert_eq!(packed.dimensions(), (3, 2));
        assert_eq!(packed[(2, 1)], pack(Rgb([2, 1, 9])));
        for ((x, y, pixel), &key) in image.enumerate_pixels().zip(&packed) {
            assert_eq!(unpack(key), *pixel, "({}, {})", x, y);
        }
    }
}
