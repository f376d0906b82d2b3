use std::num::NonZeroUsize;
use std::process;
use std::time::Duration;

use anyhow::Result;
use clap::{Parser, ValueEnum};
use tracing::{error, info};

use distmatmul::config::{Dimensions, RunConfig};
use distmatmul::coordinator::CoordinatorReport;
use distmatmul::launch;
use distmatmul::matrix::EPSILON;
use distmatmul::transport::TransportKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Backend {
    /// Threads inside this process
    Local,
    /// An MPI job started with mpirun (needs the `mpi` feature)
    Mpi,
}

/// Distributed matrix multiplication C = A x B with serial verification
#[derive(Parser, Debug)]
#[command(name = "distmatmul")]
#[command(version)]
struct Args {
    /// Rows of A
    #[arg(long, default_value = "1000")]
    rows: NonZeroUsize,

    /// Columns of A, rows of B
    #[arg(long, default_value = "1000")]
    inner: NonZeroUsize,

    /// Columns of B
    #[arg(long, default_value = "1000")]
    cols: NonZeroUsize,

    #[arg(long, value_enum, default_value_t = TransportKind::Directed)]
    transport: TransportKind,

    #[arg(long, value_enum, default_value_t = Backend::Local)]
    backend: Backend,

    /// Worker count for the local backend; the MPI backend uses the job size
    #[arg(long, default_value = "3")]
    workers: NonZeroUsize,

    /// Seed for operand generation
    #[arg(long)]
    seed: Option<u64>,

    /// Absolute tolerance for the serial/distributed comparison
    #[arg(long, default_value_t = EPSILON)]
    epsilon: f32,

    /// Receive timeout in seconds for the local backend
    #[arg(long)]
    timeout_secs: Option<u64>,
}

fn main() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let args = Args::parse();
    let config = match build_config(&args) {
        Ok(config) => config,
        Err(e) => {
            error!("{e:#}");
            process::exit(2);
        }
    };

    let outcome = match args.backend {
        Backend::Local => run_local(args.workers.get(), &config),
        Backend::Mpi => run_mpi(&config),
    };

    match outcome {
        Ok(Some(report)) => print_summary(&report),
        Ok(None) => {}
        Err(e) => {
            error!("{e:#}");
            process::exit(1);
        }
    }
}

fn build_config(args: &Args) -> Result<RunConfig> {
    let dims = Dimensions::new(args.rows.get(), args.inner.get(), args.cols.get())?;
    Ok(RunConfig {
        dims,
        transport: args.transport,
        seed: args.seed,
        epsilon: args.epsilon,
        timeout: args.timeout_secs.map(Duration::from_secs),
        ..RunConfig::default()
    })
}

fn run_local(workers: usize, config: &RunConfig) -> Result<Option<CoordinatorReport>> {
    info!(workers, "starting local group");
    match launch::run_local(workers, config) {
        Ok(report) => Ok(Some(report)),
        Err(e) => {
            println!("FAILED: {e}");
            Err(e.into())
        }
    }
}

#[cfg(feature = "mpi")]
fn run_mpi(config: &RunConfig) -> Result<Option<CoordinatorReport>> {
    use anyhow::Context;
    use distmatmul::group::{MpiGroup, ProcessGroup, COORDINATOR_RANK};
    use distmatmul::role::{self, Report};
    use distmatmul::transport;

    let universe = mpi::initialize().context("failed to initialize MPI")?;
    let group = MpiGroup::new(universe.world());
    let rank = group.rank();
    info!(rank, size = group.size(), "joined MPI group");

    let transport = transport::connect(config.transport, group);
    match role::assign(transport, config).run() {
        Ok(Report::Coordinator(report)) => Ok(Some(report)),
        Ok(Report::Worker(_)) => Ok(None),
        Err(e) => {
            if rank == COORDINATOR_RANK {
                println!("FAILED: {e}");
            }
            Err(e.into())
        }
    }
}

#[cfg(not(feature = "mpi"))]
fn run_mpi(_config: &RunConfig) -> Result<Option<CoordinatorReport>> {
    anyhow::bail!("this binary was built without the `mpi` feature")
}

fn print_summary(report: &CoordinatorReport) {
    let dims = report.dims;
    println!(
        "C[{}][{}] = A[{}][{}] x B[{}][{}] on {} workers",
        dims.rows_a, dims.cols_b, dims.rows_a, dims.inner, dims.inner, dims.cols_b, report.workers
    );
    println!("[Serial]      {:.5} s", report.serial.as_secs_f64());
    println!("[Distributed] sending    {:.5} s", report.distribute.as_secs_f64());
    println!("[Distributed] collecting {:.5} s", report.collect.as_secs_f64());
    println!("[Distributed] total      {:.5} s", report.distributed_total.as_secs_f64());
    println!("PASSED");
}
