use std::time::{Duration, Instant};

use tracing::info;

use crate::config::Dimensions;
use crate::error::Result;
use crate::group::Rank;
use crate::transport::Transport;

#[derive(Debug, Clone)]
pub struct WorkerReport {
    pub rank: Rank,
    pub rows: usize,
    pub receive: Duration,
    pub compute: Duration,
    pub send: Duration,
}

pub struct Worker {
    transport: Box<dyn Transport>,
    dims: Dimensions,
}

impl Worker {
    /// Create a new worker
    pub fn new(transport: Box<dyn Transport>, dims: Dimensions) -> Self {
        Worker { transport, dims }
    }

    /// Get the worker's rank
    pub fn rank(&self) -> Rank {
        self.transport.rank()
    }

    /// Receive an assignment, multiply it and send the rows back
    pub fn process_work(&self) -> Result<WorkerReport> {
        let rank = self.rank();

        let start = Instant::now();
        let assignment = self.transport.await_assignment(&self.dims)?;
        let receive = start.elapsed();
        info!(
            rank,
            rows = assignment.local_a.rows,
            elapsed_ms = receive.as_millis() as u64,
            "done receiving"
        );

        let start = Instant::now();
        let partial = assignment.local_a.multiply(&assignment.b)?;
        let compute = start.elapsed();
        info!(rank, elapsed_ms = compute.as_millis() as u64, "done calculating");

        let start = Instant::now();
        self.transport.return_result(&self.dims, &partial)?;
        let send = start.elapsed();
        info!(rank, elapsed_ms = send.as_millis() as u64, "done sending");

        Ok(WorkerReport {
            rank,
            rows: partial.rows,
            receive,
            compute,
            send,
        })
    }
}
