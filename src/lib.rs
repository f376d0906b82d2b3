pub mod config;
pub mod coordinator;
pub mod error;
pub mod group;
pub mod launch;
pub mod matrix;
pub mod partition;
pub mod role;
pub mod transport;
pub mod worker;

pub use config::{Dimensions, RunConfig};
pub use coordinator::{Coordinator, CoordinatorReport};
pub use error::{Error, Result};
pub use matrix::Matrix;
pub use partition::{plan, PartitionPlan};
pub use role::{Report, Role};
pub use transport::{Transport, TransportKind};
pub use worker::{Worker, WorkerReport};
