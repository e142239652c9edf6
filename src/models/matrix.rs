/// Packed black/white matrix produced by a binarizer.
///
/// `true` marks a dark module, `false` a light one. Reads outside the matrix
/// return light, which is what the decoders expect from the quiet zone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BitMatrix {
    width: usize,
    height: usize,
    data: Vec<u8>,
}

impl BitMatrix {
    /// Create an all-light matrix with the given dimensions
    pub fn new(width: usize, height: usize) -> Self {
        let bytes_needed = (width * height).div_ceil(8);
        Self {
            width,
            height,
            data: vec![0; bytes_needed],
        }
    }

    /// Build a matrix by asking `dark(x, y)` for every cell
    pub fn from_fn<F>(width: usize, height: usize, mut dark: F) -> Self
    where
        F: FnMut(usize, usize) -> bool,
    {
        let mut matrix = Self::new(width, height);
        for y in 0..height {
            for x in 0..width {
                if dark(x, y) {
                    matrix.set(x, y, true);
                }
            }
        }
        matrix
    }

    /// Get matrix width
    pub fn width(&self) -> usize {
        self.width
    }

    /// Get matrix height
    pub fn height(&self) -> usize {
        self.height
    }

    /// Get bit at (x, y)
    pub fn get(&self, x: usize, y: usize) -> bool {
        if x >= self.width || y >= self.height {
            return false;
        }
        let index = y * self.width + x;
        (self.data[index / 8] >> (index % 8)) & 1 == 1
    }

    /// Set bit at (x, y)
    pub fn set(&mut self, x: usize, y: usize, value: bool) {
        if x >= self.width || y >= self.height {
            return;
        }
        let index = y * self.width + x;
        let byte_index = index / 8;
        let bit_index = index % 8;
        if value {
            self.data[byte_index] |= 1 << bit_index;
        } else {
            self.data[byte_index] &= !(1 << bit_index);
        }
    }

    /// Number of dark cells
    #[cfg(test)]
    pub fn count_dark(&self) -> usize {
        let full = self.width * self.height;
        (0..full)
            .filter(|&i| (self.data[i / 8] >> (i % 8)) & 1 == 1)
            .count()
    }

    /// Copy with every cell flipped, for light-on-dark symbols
    pub fn inverted(&self) -> Self {
        Self::from_fn(self.width, self.height, |x, y| !self.get(x, y))
    }

    /// Smallest rectangle `(left, top, right, bottom)` holding every dark
    /// cell, inclusive. `None` when the matrix is entirely light.
    pub fn dark_bounds(&self) -> Option<(usize, usize, usize, usize)> {
        let mut bounds: Option<(usize, usize, usize, usize)> = None;
        for y in 0..self.height {
            for x in 0..self.width {
                if !self.get(x, y) {
                    continue;
                }
                bounds = Some(match bounds {
                    None => (x, y, x, y),
                    Some((l, t, r, b)) => (l.min(x), t.min(y), r.max(x), b.max(y)),
                });
            }
        }
        bounds
    }
}

impl Default for BitMatrix {
    fn default() -> Self {
        Self::new(0, 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bit_matrix() {
        let mut matrix = BitMatrix::new(8, 8);
        assert_eq!(matrix.width(), 8);
        assert_eq!(matrix.height(), 8);

        matrix.set(3, 4, true);
        assert!(matrix.get(3, 4));
        assert!(!matrix.get(3, 3));
        assert_eq!(matrix.count_dark(), 1);

        matrix.set(3, 4, false);
        assert!(!matrix.get(3, 4));
    }

    #[test]
    fn test_out_of_bounds() {
        let mut matrix = BitMatrix::new(8, 8);
        matrix.set(10, 10, true); // Should not panic
        assert!(!matrix.get(10, 10));
    }

    #[test]
    fn test_inverted_and_bounds() {
        let matrix = BitMatrix::from_fn(5, 4, |x, y| (1..=3).contains(&x) && y == 2);
        assert_eq!(matrix.dark_bounds(), Some((1, 2, 3, 2)));

        let inverted = matrix.inverted();
        assert_eq!(inverted.count_dark(), 20 - 3);
        assert_eq!(BitMatrix::new(3, 3).dark_bounds(), None);
    }
}
