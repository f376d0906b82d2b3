use std::thread;
use std::time::Duration;

use distmatmul::config::Dimensions;
use distmatmul::coordinator::{Coordinator, CoordinatorReport};
use distmatmul::group::{LocalGroup, ProcessGroup, COORDINATOR_RANK};
use distmatmul::matrix::{Matrix, EPSILON};
use distmatmul::transport::{self, TransportKind};
use distmatmul::worker::Worker;
use distmatmul::Result;

/// Long enough for any test here, short enough that a protocol bug fails
/// instead of hanging the suite.
pub const TEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Run `f` once per rank of a fresh local group, each on its own thread.
pub fn run_group<R, F>(size: usize, f: F) -> Vec<Result<R>>
where
    F: Fn(LocalGroup) -> Result<R> + Sync,
    R: Send,
{
    let groups = LocalGroup::create(size);
    thread::scope(|scope| {
        let f = &f;
        let handles: Vec<_> = groups
            .into_iter()
            .map(|group| scope.spawn(move || f(group.with_timeout(Some(TEST_TIMEOUT)))))
            .collect();
        handles
            .into_iter()
            .map(|handle| handle.join().expect("rank panicked"))
            .collect()
    })
}

/// Multiply caller-supplied operands over `workers` workers and return the
/// coordinator's outcome.
pub fn distributed_multiply(
    kind: TransportKind,
    workers: usize,
    a: &Matrix,
    b: &Matrix,
) -> Result<CoordinatorReport> {
    let dims = Dimensions::new(a.rows, a.cols, b.cols)?;
    let mut outcomes = run_group(workers + 1, |group| {
        let rank = group.rank();
        let transport = transport::connect(kind, group);
        if rank == COORDINATOR_RANK {
            Coordinator::with_operands(transport, a.clone(), b.clone(), EPSILON)?
                .multiply()
                .map(Some)
        } else {
            Worker::new(transport, dims).process_work()?;
            Ok(None)
        }
    });

    for outcome in outcomes.drain(1..) {
        outcome?;
    }
    outcomes
        .remove(0)
        .map(|report| report.expect("coordinator returns a report"))
}
