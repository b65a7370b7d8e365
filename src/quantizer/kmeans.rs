use image::Rgb;
use itertools::Itertools;
use rand::distributions::{Distribution, WeightedIndex};
use rand::seq::index;
use rand::Rng;
use tracing::debug;

use crate::{settings, Error, Quantizer};

type Point = [f32; 3];

/// Lloyd's k-means run on a random sample of the pixels
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KMeans {
    fraction: f32,
    iterations: usize,
    threshold: f32,
}

impl Default for KMeans {
    fn default() -> Self {
        Self {
            fraction: settings::SAMPLE_FRACTION,
            iterations: settings::KMEANS_ITERATIONS,
            threshold: settings::KMEANS_THRESHOLD,
        }
    }
}

impl KMeans {
    /// Samples `fraction` of the pixels, which must lie in `(0, 1]`.
    pub fn new(fraction: f32) -> Result<Self, Error> {
        if !(fraction > 0.0 && fraction <= 1.0) {
            return Err(Error::FractionOutOfBounds(fraction));
        }
        Ok(Self {
            fraction,
            ..Self::default()
        })
    }

    /// Caps the number of Lloyd iterations.
    #[must_use]
    pub fn iterations(mut self, iterations: usize) -> Self {
        self.iterations = iterations.max(1);
        self
    }

    /// Stop once the mean distortion improves by no more than `threshold`.
    #[must_use]
    pub fn threshold(mut self, threshold: f32) -> Self {
        self.threshold = threshold;
        self
    }

    /// Number of pixels drawn out of `available` to learn `clusters` colors.
    ///
    /// Never fewer than `clusters`, so a sparse foreground still gets all
    /// the colors it can, and never more than there are pixels.
    pub fn sample_size(&self, available: usize, clusters: usize) -> usize {
        let wanted = (f64::from(self.fraction) * available as f64).round() as usize;
        wanted.max(clusters).min(available)
    }

    fn lloyd<R>(&self, sample: &[Point], k: usize, rng: &mut R) -> Vec<Point>
    where
        R: Rng + ?Sized,
    {
        let mut centers = seed_centers(sample, k, rng);
        let mut labels = vec![0; sample.len()];
        let mut previous = f64::INFINITY;

        for iteration in 0..self.iterations {
            let mut total = 0.0;
            for (label, point) in labels.iter_mut().zip(sample) {
                let (index, distance) = closest(point, &centers);
                *label = index;
                total += f64::from(distance);
            }
            let distortion = total / sample.len() as f64;

            centers = relocate(sample, &labels, centers);

            if previous - distortion <= f64::from(self.threshold) {
                debug!(iterations = iteration + 1, distortion, "k-means converged");
                return centers;
            }
            previous = distortion;
        }
        debug!(iterations = self.iterations, distortion = previous, "k-means hit iteration cap");
        centers
    }
}

impl Quantizer for KMeans {
    fn quantize<R>(
        &self,
        pixels: &[Rgb<u8>],
        colors: usize,
        rng: &mut R,
    ) -> Result<Vec<Rgb<u8>>, Error>
    where
        R: Rng + ?Sized,
    {
        if pixels.is_empty() || colors == 0 {
            return Ok(Vec::new());
        }

        let size = self.sample_size(pixels.len(), colors);
        let sample = index::sample(rng, pixels.len(), size)
            .into_iter()
            .map(|i| to_point(pixels[i]))
            .collect::<Vec<_>>();
        let k = colors.min(sample.len());
        debug!(pixels = pixels.len(), samples = sample.len(), k, "learning palette");

        Ok(self
            .lloyd(&sample, k, rng)
            .into_iter()
            .map(to_color)
            .collect())
    }
}

fn to_point(color: Rgb<u8>) -> Point {
    color.0.map(f32::from)
}

fn to_color(point: Point) -> Rgb<u8> {
    Rgb(point.map(|c| c.round().clamp(0.0, 255.0) as u8))
}

fn distance_squared(a: &Point, b: &Point) -> f32 {
    a.iter().zip(b).map(|(a, b)| (a - b) * (a - b)).sum()
}

/// k-means++ seeding: each further center is drawn with probability
/// proportional to its squared distance from the centers picked so far.
fn seed_centers<R>(sample: &[Point], k: usize, rng: &mut R) -> Vec<Point>
where
    R: Rng + ?Sized,
{
    let mut centers = Vec::with_capacity(k);
    if k == 0 {
        return centers;
    }
    let first = sample[rng.gen_range(0..sample.len())];
    let mut nearest = sample
        .iter()
        .map(|point| distance_squared(point, &first))
        .collect::<Vec<_>>();
    centers.push(first);

    while centers.len() < k {
        // all weights are zero once every distinct color is taken
        let next = match WeightedIndex::new(&nearest) {
            Ok(weights) => weights.sample(rng),
            Err(_) => rng.gen_range(0..sample.len()),
        };
        let center = sample[next];
        for (distance, point) in nearest.iter_mut().zip(sample) {
            *distance = distance.min(distance_squared(point, &center));
        }
        centers.push(center);
    }
    centers
}

fn closest(point: &Point, centers: &[Point]) -> (usize, f32) {
    centers
        .iter()
        .map(|center| distance_squared(point, center))
        .enumerate()
        .min_by(|(_, a), (_, b)| a.total_cmp(b))
        .unwrap_or((0, 0.0))
}

/// Moves every center to the mean of its points, empty clusters stay put.
fn relocate(sample: &[Point], labels: &[usize], centers: Vec<Point>) -> Vec<Point> {
    let mut sums = vec![[0.0f64; 3]; centers.len()];
    let counts = labels.iter().counts();
    for (point, &label) in sample.iter().zip(labels) {
        for (sum, &c) in sums[label].iter_mut().zip(point) {
            *sum += f64::from(c);
        }
    }
    centers
        .into_iter()
        .zip(sums)
        .enumerate()
        .map(|(i, (center, sum))| match counts.get(&i) {
            Some(&n) => sum.map(|s| (s / n as f64) as f32),
            None => center,
        })
        .collect()
}
