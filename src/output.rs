//! Writing encoded notes as paletted PNG files.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use png::{BitDepth, ColorType, Encoder, PixelDimensions, Unit};
use tracing::info;

use crate::{Encoded, Error};

const METERS_PER_INCH: f64 = 0.0254;

/// Encodes `encoded` as an 8-bit indexed PNG tagged with `dpi`.
pub fn write_png<W: Write>(encoded: &Encoded, writer: W, dpi: u32) -> Result<(), Error> {
    let (width, height) = encoded.dimensions();
    if width == 0 || height == 0 {
        return Err(Error::EmptyImage);
    }
    let pixels_per_meter = (f64::from(dpi) / METERS_PER_INCH).round() as u32;

    let mut encoder = Encoder::new(writer, width, height);
    encoder.set_color(ColorType::Indexed);
    encoder.set_depth(BitDepth::Eight);
    encoder.set_palette(encoded.palette.to_rgb_bytes());
    encoder.set_pixel_dims(Some(PixelDimensions {
        xppu: pixels_per_meter,
        yppu: pixels_per_meter,
        unit: Unit::Meter,
    }));

    let mut writer = encoder.write_header()?;
    writer.write_image_data(encoded.labels.as_slice())?;
    writer.finish()?;
    Ok(())
}

/// Writes `encoded` to a PNG file at `path`.
pub fn save_png(encoded: &Encoded, path: &Path, dpi: u32) -> Result<(), Error> {
    let file = BufWriter::new(File::create(path)?);
    write_png(encoded, file, dpi)?;
    info!(path = %path.display(), "wrote");
    Ok(())
}
