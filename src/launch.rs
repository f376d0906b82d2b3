//! Runs a whole group inside one process, one thread per rank.

use std::thread;

use tracing::{error, info_span};

use crate::config::RunConfig;
use crate::coordinator::CoordinatorReport;
use crate::error::{Error, Result};
use crate::group::{LocalGroup, ProcessGroup, COORDINATOR_RANK};
use crate::role::{self, Report};
use crate::transport;

/// Run one coordinator and `workers` workers on threads and return the
/// coordinator's report.
///
/// When several ranks fail, the first error that is not a plain
/// disconnect (which is only a consequence of a peer failing) wins.
pub fn run_local(workers: usize, config: &RunConfig) -> Result<CoordinatorReport> {
    let groups = LocalGroup::create(workers + 1);

    let outcomes: Vec<Result<Report>> = thread::scope(|scope| {
        let handles: Vec<_> = groups
            .into_iter()
            .map(|group| {
                let group = group.with_timeout(config.timeout);
                scope.spawn(move || {
                    let rank = group.rank();
                    let _span = info_span!("rank", rank).entered();
                    let transport = transport::connect(config.transport, group);
                    let outcome = role::assign(transport, config).run();
                    if let Err(e) = &outcome {
                        error!(rank, error = %e, "role failed");
                    }
                    outcome
                })
            })
            .collect();

        handles
            .into_iter()
            .enumerate()
            .map(|(rank, handle)| {
                handle
                    .join()
                    .unwrap_or(Err(Error::WorkerPanicked { rank }))
            })
            .collect()
    });

    let mut first_error = None;
    let mut report = None;
    for outcome in outcomes {
        match outcome {
            Ok(Report::Coordinator(r)) => report = Some(r),
            Ok(Report::Worker(_)) => {}
            Err(e) => {
                let replace = match &first_error {
                    None => true,
                    Some(Error::Disconnected { .. }) => !matches!(e, Error::Disconnected { .. }),
                    Some(_) => false,
                };
                if replace {
                    first_error = Some(e);
                }
            }
        }
    }

    match (first_error, report) {
        (Some(e), _) => Err(e),
        (None, Some(report)) => Ok(report),
        (None, None) => Err(Error::WorkerPanicked {
            rank: COORDINATOR_RANK,
        }),
    }
}
