use std::ops::Index;

use crate::Error;

/// Row-major buffer holding one value per pixel of an image.
#[derive(Debug, Clone, PartialEq)]
pub struct Grid<T> {
    width: u32,
    height: u32,
    data: Vec<T>,
}

impl<T> Grid<T> {
    /// Wraps `data`, which must hold exactly `width * height` values.
    pub fn from_vec(width: u32, height: u32, data: Vec<T>) -> Result<Self, Error> {
        if data.len() != width as usize * height as usize {
            return Err(Error::LengthMismatch {
                expected: width as usize * height as usize,
                actual: data.len(),
            });
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    /// Builds a grid by calling `f(x, y)` for every pixel.
    pub fn from_fn(width: u32, height: u32, mut f: impl FnMut(u32, u32) -> T) -> Self {
        let mut data = Vec::with_capacity(width as usize * height as usize);
        for y in 0..height {
            for x in 0..width {
                data.push(f(x, y));
            }
        }
        Self {
            width,
            height,
            data,
        }
    }

    /// Width in pixels
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Height in pixels
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Width and height
    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Values in row-major order
    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    /// Values in row-major order
    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.data.iter()
    }

    /// Applies `f` to every value, keeping the shape.
    pub fn map<O>(&self, f: impl FnMut(&T) -> O) -> Grid<O> {
        Grid {
            width: self.width,
            height: self.height,
            data: self.data.iter().map(f).collect(),
        }
    }

    /// Fails unless the grid is `dimensions` in size.
    pub fn ensure_dimensions(&self, dimensions: (u32, u32)) -> Result<(), Error> {
        if self.dimensions() != dimensions {
            return Err(Error::ShapeMismatch {
                expected: dimensions,
                actual: self.dimensions(),
            });
        }
        Ok(())
    }
}

impl<T> Index<(u32, u32)> for Grid<T> {
    type Output = T;

    fn index(&self, (x, y): (u32, u32)) -> &T {
        assert!(x < self.width && y < self.height, "({}, {}) out of bounds", x, y);
        &self.data[y as usize * self.width as usize + x as usize]
    }
}

impl<'a, T> IntoIterator for &'a Grid<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.data.iter()
    }
}
