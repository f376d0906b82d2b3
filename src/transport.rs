//! The distribution protocol over a process group.
//!
//! Two strategies move the same data: [`Directed`] issues one blocking
//! transfer per worker per item, [`Collective`] issues one broadcast of B,
//! one scatter of A and one gather of C. Per worker the order is always B,
//! then the row slice of A, then (later) the partial result.

use tracing::debug;

use crate::config::Dimensions;
use crate::error::{Error, Result};
use crate::group::{ProcessGroup, Rank, Tag, COORDINATOR_RANK};
use crate::matrix::Matrix;
use crate::partition::{self, PartitionPlan};

// Point-to-point message tags
pub const TAG_OPERAND: Tag = 1;
pub const TAG_ROW_COUNT: Tag = 2;
pub const TAG_ROW_SLICE: Tag = 3;
pub const TAG_RESULT: Tag = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum TransportKind {
    /// One send/receive per worker per item
    #[default]
    Directed,
    /// Broadcast, scatter and gather
    Collective,
}

/// A worker's share of the inputs.
#[derive(Debug)]
pub struct Assignment {
    pub local_a: Matrix,
    pub b: Matrix,
}

pub trait Transport {
    fn kind(&self) -> TransportKind;

    fn rank(&self) -> Rank;

    fn group_size(&self) -> usize;

    /// Coordinator: hand every worker all of B and its row slice of A.
    ///
    /// `b` is only read; the broadcast primitive takes the root's buffer mutably.
    fn distribute(&self, plan: &PartitionPlan, a: &Matrix, b: &mut Matrix) -> Result<()>;

    /// Coordinator: place every worker's partial result at its row offset in `c`.
    fn collect(&self, plan: &PartitionPlan, c: &mut Matrix) -> Result<()>;

    /// Worker: receive B and this worker's rows of A.
    fn await_assignment(&self, dims: &Dimensions) -> Result<Assignment>;

    /// Worker: send the partial product back to the coordinator.
    fn return_result(&self, dims: &Dimensions, partial: &Matrix) -> Result<()>;
}

/// Build the requested strategy on top of `group`.
pub fn connect<G: ProcessGroup + 'static>(kind: TransportKind, group: G) -> Box<dyn Transport> {
    match kind {
        TransportKind::Directed => Box::new(Directed::new(group)),
        TransportKind::Collective => Box::new(Collective::new(group)),
    }
}

pub struct Directed<G> {
    group: G,
}

impl<G: ProcessGroup> Directed<G> {
    pub fn new(group: G) -> Self {
        Directed { group }
    }
}

impl<G: ProcessGroup> Transport for Directed<G> {
    fn kind(&self) -> TransportKind {
        TransportKind::Directed
    }

    fn rank(&self) -> Rank {
        self.group.rank()
    }

    fn group_size(&self) -> usize {
        self.group.size()
    }

    fn distribute(&self, plan: &PartitionPlan, a: &Matrix, b: &mut Matrix) -> Result<()> {
        for part in plan.parts() {
            let dst = part.rank();
            let row_count = i32::try_from(part.row_count).map_err(|_| {
                Error::InvalidDimensions(format!("row count {} does not fit i32", part.row_count))
            })?;
            self.group.send(dst, &b.data, TAG_OPERAND)?;
            self.group.send(dst, &[row_count], TAG_ROW_COUNT)?;
            self.group.send(
                dst,
                a.row_slice(part.row_offset, part.row_count),
                TAG_ROW_SLICE,
            )?;
            debug!(
                worker = dst,
                rows = part.row_count,
                offset = part.row_offset,
                "sent assignment"
            );
        }
        Ok(())
    }

    fn collect(&self, plan: &PartitionPlan, c: &mut Matrix) -> Result<()> {
        for part in plan.parts() {
            self.group.receive(
                part.rank(),
                c.rows_mut(part.row_offset, part.row_count),
                TAG_RESULT,
            )?;
            debug!(worker = part.rank(), rows = part.row_count, "received result");
        }
        Ok(())
    }

    fn await_assignment(&self, dims: &Dimensions) -> Result<Assignment> {
        let mut b = Matrix::new(dims.inner, dims.cols_b);
        self.group.receive(COORDINATOR_RANK, &mut b.data, TAG_OPERAND)?;

        let mut row_count = [0i32; 1];
        self.group
            .receive(COORDINATOR_RANK, &mut row_count, TAG_ROW_COUNT)?;
        let row_count = usize::try_from(row_count[0]).map_err(|_| {
            Error::InvalidDimensions(format!("negative row count {}", row_count[0]))
        })?;

        let mut local_a = Matrix::new(row_count, dims.inner);
        self.group
            .receive(COORDINATOR_RANK, &mut local_a.data, TAG_ROW_SLICE)?;

        Ok(Assignment { local_a, b })
    }

    fn return_result(&self, _dims: &Dimensions, partial: &Matrix) -> Result<()> {
        self.group.send(COORDINATOR_RANK, &partial.data, TAG_RESULT)
    }
}

pub struct Collective<G> {
    group: G,
}

impl<G: ProcessGroup> Collective<G> {
    pub fn new(group: G) -> Self {
        Collective { group }
    }

    /// Every participant derives the same plan from the shared dimensions.
    fn plan(&self, dims: &Dimensions) -> Result<PartitionPlan> {
        partition::plan(dims.rows_a, self.group.size().saturating_sub(1))
    }
}

impl<G: ProcessGroup> Transport for Collective<G> {
    fn kind(&self) -> TransportKind {
        TransportKind::Collective
    }

    fn rank(&self) -> Rank {
        self.group.rank()
    }

    fn group_size(&self) -> usize {
        self.group.size()
    }

    fn distribute(&self, plan: &PartitionPlan, a: &Matrix, b: &mut Matrix) -> Result<()> {
        self.group.broadcast(COORDINATOR_RANK, &mut b.data)?;
        let layout = plan.layout(a.cols)?;
        self.group
            .scatter(COORDINATOR_RANK, &a.data, &layout, &mut [] as &mut [f32])?;
        debug!(counts = ?layout.counts, "scattered rows");
        Ok(())
    }

    fn collect(&self, plan: &PartitionPlan, c: &mut Matrix) -> Result<()> {
        let layout = plan.layout(c.cols)?;
        self.group
            .gather(COORDINATOR_RANK, &[] as &[f32], &layout, &mut c.data)?;
        debug!(counts = ?layout.counts, "gathered rows");
        Ok(())
    }

    fn await_assignment(&self, dims: &Dimensions) -> Result<Assignment> {
        let mut b = Matrix::new(dims.inner, dims.cols_b);
        self.group.broadcast(COORDINATOR_RANK, &mut b.data)?;

        let plan = self.plan(dims)?;
        let worker_id = self.group.rank().saturating_sub(1);
        let part = plan.part(worker_id).ok_or_else(|| {
            Error::InvalidDimensions(format!("rank {} has no partition", self.group.rank()))
        })?;

        let mut local_a = Matrix::new(part.row_count, dims.inner);
        self.group.scatter(
            COORDINATOR_RANK,
            &[] as &[f32],
            &plan.layout(dims.inner)?,
            &mut local_a.data,
        )?;

        Ok(Assignment { local_a, b })
    }

    fn return_result(&self, dims: &Dimensions, partial: &Matrix) -> Result<()> {
        let layout = self.plan(dims)?.layout(dims.cols_b)?;
        self.group
            .gather(COORDINATOR_RANK, &partial.data, &layout, &mut [] as &mut [f32])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::group::LocalGroup;

    #[test]
    fn test_directed_assignment_order() {
        let mut group = LocalGroup::create(2).into_iter();
        let coordinator = Directed::new(group.next().unwrap());
        let worker = Directed::new(group.next().unwrap());

        let dims = Dimensions::new(3, 2, 2).unwrap();
        let a = Matrix::from_vec(vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0], 3, 2).unwrap();
        let mut b = Matrix::from_vec(vec![1.0, 0.0, 0.0, 1.0], 2, 2).unwrap();
        let plan = partition::plan(3, 1).unwrap();

        coordinator.distribute(&plan, &a, &mut b).unwrap();
        let assignment = worker.await_assignment(&dims).unwrap();
        assert_eq!(assignment.local_a, a);
        assert_eq!(assignment.b, b);
    }

    #[test]
    fn test_connect_selects_strategy() {
        let mut group = LocalGroup::create(2).into_iter();
        let directed = connect(TransportKind::Directed, group.next().unwrap());
        let collective = connect(TransportKind::Collective, group.next().unwrap());
        assert_eq!(directed.kind(), TransportKind::Directed);
        assert_eq!(collective.kind(), TransportKind::Collective);
        assert_eq!(collective.rank(), 1);
        assert_eq!(directed.group_size(), 2);
    }
}
