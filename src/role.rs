//! Role selection: rank 0 coordinates, every other rank works.

use crate::config::RunConfig;
use crate::coordinator::{Coordinator, CoordinatorReport};
use crate::error::Result;
use crate::group::COORDINATOR_RANK;
use crate::transport::Transport;
use crate::worker::{Worker, WorkerReport};

#[derive(Debug, Clone)]
pub enum Report {
    Coordinator(CoordinatorReport),
    Worker(WorkerReport),
}

pub trait Role {
    fn run(&mut self) -> Result<Report>;
}

impl Role for Coordinator {
    fn run(&mut self) -> Result<Report> {
        self.multiply().map(Report::Coordinator)
    }
}

impl Role for Worker {
    fn run(&mut self) -> Result<Report> {
        self.process_work().map(Report::Worker)
    }
}

/// Pick this participant's role from its rank.
pub fn assign(transport: Box<dyn Transport>, config: &RunConfig) -> Box<dyn Role> {
    if transport.rank() == COORDINATOR_RANK {
        Box::new(Coordinator::new(transport, config))
    } else {
        Box::new(Worker::new(transport, config.dims))
    }
}
