use std::time::{Duration, Instant};

use tracing::{info, warn};

use crate::config::{Dimensions, RunConfig};
use crate::error::{Error, Result};
use crate::matrix::Matrix;
use crate::partition;
use crate::transport::Transport;

/// Timings and output of one coordinator run.
#[derive(Debug, Clone)]
pub struct CoordinatorReport {
    pub dims: Dimensions,
    pub workers: usize,
    pub serial: Duration,
    pub distribute: Duration,
    pub collect: Duration,
    pub distributed_total: Duration,
    /// The verified, distributed C.
    pub result: Matrix,
}

/// Rank 0: owns A and B, computes the serial reference, drives the
/// distribution and checks the reassembled product against the reference.
pub struct Coordinator {
    transport: Box<dyn Transport>,
    a: Matrix,
    b: Matrix,
    epsilon: f32,
}

impl Coordinator {
    /// Allocate the operands and fill them from the configured RNG
    pub fn new(transport: Box<dyn Transport>, config: &RunConfig) -> Self {
        let dims = config.dims;
        let mut rng = config.rng();
        let mut a = Matrix::new(dims.rows_a, dims.inner);
        a.fill_random(&mut rng, config.value_range.clone());
        let mut b = Matrix::new(dims.inner, dims.cols_b);
        b.fill_random(&mut rng, config.value_range.clone());

        Coordinator {
            transport,
            a,
            b,
            epsilon: config.epsilon,
        }
    }

    /// Use caller-supplied operands instead of random ones
    pub fn with_operands(
        transport: Box<dyn Transport>,
        a: Matrix,
        b: Matrix,
        epsilon: f32,
    ) -> Result<Self> {
        if a.cols != b.rows {
            return Err(Error::IncompatibleDimensions {
                lhs_rows: a.rows,
                lhs_cols: a.cols,
                rhs_rows: b.rows,
                rhs_cols: b.cols,
            });
        }
        Ok(Coordinator {
            transport,
            a,
            b,
            epsilon,
        })
    }

    /// Get the number of workers
    pub fn worker_count(&self) -> usize {
        self.transport.group_size().saturating_sub(1)
    }

    pub fn dims(&self) -> Dimensions {
        Dimensions {
            rows_a: self.a.rows,
            inner: self.a.cols,
            cols_b: self.b.cols,
        }
    }

    /// Run serial reference, distribution, collection and verification.
    pub fn multiply(&mut self) -> Result<CoordinatorReport> {
        let workers = self.worker_count();
        if workers == 0 {
            return Err(Error::NoWorkers {
                group_size: self.transport.group_size(),
            });
        }
        let dims = self.dims();
        info!(
            rows_a = dims.rows_a,
            inner = dims.inner,
            cols_b = dims.cols_b,
            workers,
            transport = ?self.transport.kind(),
            "starting multiplication"
        );

        let start = Instant::now();
        let serial = self.a.multiply(&self.b)?;
        let serial_elapsed = start.elapsed();
        info!(elapsed_ms = serial_elapsed.as_millis() as u64, "serial reference done");

        let plan = partition::plan(dims.rows_a, workers)?;

        let start_distributed = Instant::now();
        self.transport.distribute(&plan, &self.a, &mut self.b)?;
        let distribute_elapsed = start_distributed.elapsed();
        info!(elapsed_ms = distribute_elapsed.as_millis() as u64, "done sending data");

        let mut distributed = Matrix::new(dims.rows_a, dims.cols_b);
        let start_collect = Instant::now();
        self.transport.collect(&plan, &mut distributed)?;
        let collect_elapsed = start_collect.elapsed();
        let distributed_total = start_distributed.elapsed();
        info!(
            elapsed_ms = collect_elapsed.as_millis() as u64,
            total_ms = distributed_total.as_millis() as u64,
            "done collecting data"
        );

        if let Some((row, col, expected, actual)) =
            serial.first_mismatch(&distributed, self.epsilon)
        {
            warn!(row, col, expected, actual, "distributed result mismatch");
            return Err(Error::ResultMismatch {
                row,
                col,
                expected,
                actual,
                epsilon: self.epsilon,
            });
        }

        Ok(CoordinatorReport {
            dims,
            workers,
            serial: serial_elapsed,
            distribute: distribute_elapsed,
            collect: collect_elapsed,
            distributed_total,
            result: distributed,
        })
    }
}
