use image::Rgb;
use itertools::Itertools;
use rand::Rng;

mod kmeans;

pub use kmeans::KMeans;

use crate::Error;

/// Quantizer trait
pub trait Quantizer {
    /// Learns at most `colors` representative colors for `pixels`.
    ///
    /// Returns fewer colors only when there are fewer pixels than requested.
    fn quantize<R>(
        &self,
        pixels: &[Rgb<u8>],
        colors: usize,
        rng: &mut R,
    ) -> Result<Vec<Rgb<u8>>, Error>
    where
        R: Rng + ?Sized;
}

/// Learned colors plus, for every input pixel, the index of its nearest color
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Clusters {
    /// Representative colors
    pub centers: Vec<Rgb<u8>>,
    /// One index into `centers` per pixel, in input order
    pub labels: Vec<usize>,
}

/// Learns `colors` centers from `pixels` with `quantizer`, then assigns every
/// pixel (not only the ones the quantizer looked at) to its nearest center.
///
/// Fails if the quantizer returns more than `colors` centers, or none at all
/// for a non-empty `pixels`.
pub fn cluster<Q, R>(
    quantizer: &Q,
    pixels: &[Rgb<u8>],
    colors: usize,
    rng: &mut R,
) -> Result<Clusters, Error>
where
    Q: Quantizer,
    R: Rng + ?Sized,
{
    let centers = quantizer.quantize(pixels, colors, rng)?;
    if centers.len() > colors {
        return Err(Error::TooManyCenters(centers.len(), colors));
    }
    let labels = nearest(pixels, &centers).ok_or(Error::NoCenters(pixels.len()))?;
    Ok(Clusters { centers, labels })
}

/// Squared euclidean distance in RGB space.
pub fn distance_squared(a: Rgb<u8>, b: Rgb<u8>) -> u32 {
    a.0.iter()
        .zip(b.0.iter())
        .map(|(&a, &b)| {
            let d = u32::from(a.abs_diff(b));
            d * d
        })
        .sum()
}

/// Index of the center closest to `pixel`, the lowest index on ties.
///
/// `None` when there are no centers.
pub fn nearest_index(pixel: Rgb<u8>, centers: &[Rgb<u8>]) -> Option<usize> {
    centers
        .iter()
        .position_min_by_key(|&&center| distance_squared(pixel, center))
}

/// Brute force nearest center for every pixel.
///
/// `None` when there are pixels but no centers to assign them to.
pub fn nearest(pixels: &[Rgb<u8>], centers: &[Rgb<u8>]) -> Option<Vec<usize>> {
    pixels
        .iter()
        .map(|&pixel| nearest_index(pixel, centers))
        .collect()
}
