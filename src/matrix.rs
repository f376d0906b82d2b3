use std::ops::Range;

use rand::Rng;

use crate::error::{Error, Result};

/// Default tolerance when comparing a distributed result with the serial one.
pub const EPSILON: f32 = 1e-4;

/// Dense row-major matrix of `f32` backed by one contiguous buffer.
#[derive(Debug, Clone, PartialEq)]
pub struct Matrix {
    pub data: Vec<f32>,
    pub rows: usize,
    pub cols: usize,
}

impl Matrix {
    /// Create a zero-initialised matrix with the given dimensions
    pub fn new(rows: usize, cols: usize) -> Self {
        Matrix {
            data: vec![0.0; rows * cols],
            rows,
            cols,
        }
    }

    /// Create a matrix from a vector of data
    pub fn from_vec(data: Vec<f32>, rows: usize, cols: usize) -> Result<Self> {
        if data.len() != rows * cols {
            return Err(Error::InvalidDimensions(format!(
                "data length {} does not match dimensions {}x{}",
                data.len(),
                rows,
                cols
            )));
        }
        Ok(Matrix { data, rows, cols })
    }

    /// Element at `(row, col)`. Range is only checked in debug builds.
    #[inline]
    pub fn at(&self, row: usize, col: usize) -> f32 {
        debug_assert!(row < self.rows && col < self.cols);
        self.data[row * self.cols + col]
    }

    #[inline]
    pub fn at_mut(&mut self, row: usize, col: usize) -> &mut f32 {
        debug_assert!(row < self.rows && col < self.cols);
        &mut self.data[row * self.cols + col]
    }

    /// Get a value at a specific position
    pub fn get(&self, row: usize, col: usize) -> Result<f32> {
        self.check_index(row, col)?;
        Ok(self.data[row * self.cols + col])
    }

    /// Set a value at a specific position
    pub fn set(&mut self, row: usize, col: usize, value: f32) -> Result<()> {
        self.check_index(row, col)?;
        self.data[row * self.cols + col] = value;
        Ok(())
    }

    fn check_index(&self, row: usize, col: usize) -> Result<()> {
        if row >= self.rows || col >= self.cols {
            return Err(Error::IndexOutOfBounds {
                row,
                col,
                rows: self.rows,
                cols: self.cols,
            });
        }
        Ok(())
    }

    /// Borrow `count` rows starting at `offset` as one contiguous slice.
    pub fn row_slice(&self, offset: usize, count: usize) -> &[f32] {
        &self.data[offset * self.cols..(offset + count) * self.cols]
    }

    pub fn rows_mut(&mut self, offset: usize, count: usize) -> &mut [f32] {
        &mut self.data[offset * self.cols..(offset + count) * self.cols]
    }

    /// Copy out a row range as its own matrix
    pub fn row_chunk(&self, offset: usize, count: usize) -> Result<Matrix> {
        if offset + count > self.rows {
            return Err(Error::InvalidDimensions(format!(
                "row chunk out of bounds: offset={}, count={}, total_rows={}",
                offset, count, self.rows
            )));
        }
        Ok(Matrix {
            data: self.row_slice(offset, count).to_vec(),
            rows: count,
            cols: self.cols,
        })
    }

    pub fn fill(&mut self, value: f32) {
        self.data.fill(value);
    }

    /// Fill with integer-valued floats drawn uniformly from `range`.
    ///
    /// The sequence is reproducible only when `rng` is seeded.
    pub fn fill_random<R: Rng + ?Sized>(&mut self, rng: &mut R, range: Range<u32>) {
        for value in self.data.iter_mut() {
            *value = rng.random_range(range.clone()) as f32;
        }
    }

    /// Multiply two matrices (A * B) with the naive row/col/inner loop
    pub fn multiply(&self, other: &Matrix) -> Result<Matrix> {
        if self.cols != other.rows {
            return Err(Error::IncompatibleDimensions {
                lhs_rows: self.rows,
                lhs_cols: self.cols,
                rhs_rows: other.rows,
                rhs_cols: other.cols,
            });
        }

        let mut result = Matrix::new(self.rows, other.cols);
        for row in 0..self.rows {
            for col in 0..other.cols {
                for inner in 0..self.cols {
                    *result.at_mut(row, col) += self.at(row, inner) * other.at(inner, col);
                }
            }
        }

        Ok(result)
    }

    /// First element whose absolute difference exceeds `epsilon`, as
    /// `(row, col, self_value, other_value)`.
    ///
    /// A shape mismatch reports `(0, 0, NaN, NaN)`.
    pub fn first_mismatch(&self, other: &Matrix, epsilon: f32) -> Option<(usize, usize, f32, f32)> {
        if self.rows != other.rows || self.cols != other.cols {
            return Some((0, 0, f32::NAN, f32::NAN));
        }
        self.data
            .iter()
            .zip(other.data.iter())
            .position(|(lhs, rhs)| (lhs - rhs).abs() > epsilon)
            .map(|idx| (idx / self.cols, idx % self.cols, self.data[idx], other.data[idx]))
    }

    /// Element-wise equality within an absolute tolerance.
    pub fn equal(&self, other: &Matrix, epsilon: f32) -> bool {
        self.first_mismatch(other, epsilon).is_none()
    }
}
