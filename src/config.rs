use std::ops::Range;
use std::time::Duration;

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::error::{Error, Result};
use crate::matrix::EPSILON;
use crate::transport::TransportKind;

/// Row count used on every axis when no dimensions are given.
pub const DEFAULT_SIZE: usize = 1000;

/// Shapes of C = A x B: A is `rows_a x inner`, B is `inner x cols_b`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dimensions {
    pub rows_a: usize,
    pub inner: usize,
    pub cols_b: usize,
}

impl Dimensions {
    pub fn new(rows_a: usize, inner: usize, cols_b: usize) -> Result<Self> {
        if rows_a == 0 || inner == 0 || cols_b == 0 {
            return Err(Error::InvalidDimensions(format!(
                "all dimensions must be positive, got {}x{} * {}x{}",
                rows_a, inner, inner, cols_b
            )));
        }
        Ok(Dimensions {
            rows_a,
            inner,
            cols_b,
        })
    }

    pub fn square(size: usize) -> Result<Self> {
        Self::new(size, size, size)
    }
}

impl Default for Dimensions {
    fn default() -> Self {
        Dimensions {
            rows_a: DEFAULT_SIZE,
            inner: DEFAULT_SIZE,
            cols_b: DEFAULT_SIZE,
        }
    }
}

/// Everything a participant needs to play its role in one run.
///
/// Every rank must be given the same configuration.
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub dims: Dimensions,
    pub transport: TransportKind,
    pub seed: Option<u64>,
    pub epsilon: f32,
    /// Operand values are drawn from this integer range.
    pub value_range: Range<u32>,
    /// Receive timeout for in-process groups; `None` blocks forever.
    pub timeout: Option<Duration>,
}

impl Default for RunConfig {
    fn default() -> Self {
        RunConfig {
            dims: Dimensions::default(),
            transport: TransportKind::default(),
            seed: None,
            epsilon: EPSILON,
            value_range: 0..10,
            timeout: None,
        }
    }
}

impl RunConfig {
    /// RNG for operand generation, reproducible when a seed is configured.
    pub fn rng(&self) -> ChaCha8Rng {
        match self.seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_os_rng(),
        }
    }
}
