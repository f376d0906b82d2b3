//! Row partitioning of the left operand across workers.
//!
//! Every worker receives `total_rows / num_workers` rows except the last,
//! which also absorbs the remainder (e.g. 333, 333 and 334 for 1000 rows
//! over 3 workers). The same plan is used to slice A on the way out and to
//! place partial results of C on the way back.

use crate::error::{Error, Result};

/// Element count type used by collective layouts, matching MPI's `int` counts.
pub type Count = i32;

/// Contiguous row range assigned to one worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RowPartition {
    /// Zero-based worker index; the worker runs at rank `worker_id + 1`.
    pub worker_id: usize,
    pub row_offset: usize,
    pub row_count: usize,
}

impl RowPartition {
    pub fn rank(&self) -> usize {
        self.worker_id + 1
    }
}

/// Immutable row plan, one entry per worker in worker order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartitionPlan {
    total_rows: usize,
    parts: Vec<RowPartition>,
}

/// Per-rank element counts and displacements for scatter/gather.
///
/// Index 0 is the root (coordinator), which owns the full buffer and
/// contributes nothing to itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectiveLayout {
    pub counts: Vec<Count>,
    pub displacements: Vec<Count>,
}

impl CollectiveLayout {
    /// Total number of elements described, i.e. the root buffer size.
    pub fn total(&self) -> usize {
        self.counts.iter().map(|&c| c as usize).sum()
    }

    pub fn count(&self, rank: usize) -> usize {
        self.counts[rank] as usize
    }

    pub fn range(&self, rank: usize) -> std::ops::Range<usize> {
        let start = self.displacements[rank] as usize;
        start..start + self.counts[rank] as usize
    }
}

/// Split `total_rows` across `num_workers`.
///
/// With fewer rows than workers every worker but the last gets an empty
/// partition.
pub fn plan(total_rows: usize, num_workers: usize) -> Result<PartitionPlan> {
    if num_workers == 0 {
        return Err(Error::NoWorkers { group_size: 1 });
    }

    let base = total_rows / num_workers;
    let remainder = total_rows % num_workers;
    let parts = (0..num_workers)
        .map(|worker_id| RowPartition {
            worker_id,
            row_offset: worker_id * base,
            row_count: if worker_id == num_workers - 1 {
                base + remainder
            } else {
                base
            },
        })
        .collect();

    Ok(PartitionPlan { total_rows, parts })
}

impl PartitionPlan {
    pub fn total_rows(&self) -> usize {
        self.total_rows
    }

    pub fn num_workers(&self) -> usize {
        self.parts.len()
    }

    pub fn parts(&self) -> &[RowPartition] {
        &self.parts
    }

    pub fn part(&self, worker_id: usize) -> Option<&RowPartition> {
        self.parts.get(worker_id)
    }

    /// Scale the plan by a row stride into per-rank counts and displacements.
    ///
    /// Fails when a count or displacement does not fit a [`Count`].
    pub fn layout(&self, stride: usize) -> Result<CollectiveLayout> {
        let mut counts = Vec::with_capacity(self.parts.len() + 1);
        let mut displacements = Vec::with_capacity(self.parts.len() + 1);
        counts.push(0);
        displacements.push(0);
        for part in &self.parts {
            counts.push(scaled(part.row_count, stride)?);
            displacements.push(scaled(part.row_offset, stride)?);
        }
        Ok(CollectiveLayout {
            counts,
            displacements,
        })
    }
}

fn scaled(rows: usize, stride: usize) -> Result<Count> {
    rows.checked_mul(stride)
        .and_then(|elements| Count::try_from(elements).ok())
        .ok_or_else(|| {
            Error::InvalidDimensions(format!(
                "{} rows of {} elements exceed the collective count limit {}",
                rows,
                stride,
                Count::MAX
            ))
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uneven_split_goes_to_last_worker() {
        let plan = plan(1000, 3).unwrap();
        let counts: Vec<usize> = plan.parts().iter().map(|p| p.row_count).collect();
        let offsets: Vec<usize> = plan.parts().iter().map(|p| p.row_offset).collect();
        assert_eq!(counts, vec![333, 333, 334]);
        assert_eq!(offsets, vec![0, 333, 666]);
    }

    #[test]
    fn test_single_worker_gets_everything() {
        let plan = plan(17, 1).unwrap();
        assert_eq!(
            plan.parts(),
            &[RowPartition {
                worker_id: 0,
                row_offset: 0,
                row_count: 17
            }]
        );
    }

    #[test]
    fn test_zero_workers_rejected() {
        assert!(matches!(plan(10, 0), Err(Error::NoWorkers { .. })));
    }

    #[test]
    fn test_fewer_rows_than_workers() {
        let plan = plan(2, 4).unwrap();
        let counts: Vec<usize> = plan.parts().iter().map(|p| p.row_count).collect();
        assert_eq!(counts, vec![0, 0, 0, 2]);
    }

    #[test]
    fn test_layout_scales_by_stride_with_empty_root() {
        let layout = plan(10, 3).unwrap().layout(4).unwrap();
        assert_eq!(layout.counts, vec![0, 12, 12, 16]);
        assert_eq!(layout.displacements, vec![0, 0, 12, 24]);
        assert_eq!(layout.total(), 40);
        assert_eq!(layout.range(3), 24..40);
    }

    #[test]
    fn test_layout_overflow_rejected() {
        let plan = plan(3, 1).unwrap();
        assert!(matches!(
            plan.layout(Count::MAX as usize),
            Err(Error::InvalidDimensions(_))
        ));
        assert!(matches!(plan.layout(usize::MAX), Err(Error::InvalidDimensions(_))));
    }
}
