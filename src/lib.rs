//! Shrink scans of handwritten notes
//!
//! A scanned page is mostly paper. The most common color of the (downsampled,
//! quantized) scan is taken to be the page, every pixel close enough to it in
//! saturation and value is labelled background, and the remaining ink pixels
//! are clustered with k-means into a handful of colors. The result is a label
//! map plus a small palette, ready to be written as a paletted PNG.
//!
//! ```no_run
//! use notescan::{save_png, Options};
//!
//! let image = image::open("page1.jpg")?.into_rgb8();
//! let encoded = Options::new().num_colors(8).saturate(true).encode(&image)?;
//! println!("{}", encoded.palette);
//! save_png(&encoded, "page1.png".as_ref(), 300)?;
//! # Ok::<(), notescan::Error>(())
//! ```

#![deny(missing_docs)]

pub use background::{
    background_color, background_mask, foreground, sat_val, sat_val_image, SatVal, Thresholds,
};
pub use color::{pack, pack_image, quantize, unpack, Buckets, PackedColor};
pub use error::Error;
pub use grid::Grid;
pub use notescan::{encode, Encoded, Options, COLOR_RANGE};
pub use output::{save_png, write_png};
pub use pages::{page_number, sort_pages};
pub use palette::{Color, Palette};
pub use quantizer::*;

pub mod background;
pub mod color;
mod error;
mod grid;
mod notescan;
mod output;
mod pages;
mod palette;
mod quantizer;
pub mod settings;
