//! MPI-backed process group for runs launched with `mpirun`.

use ::mpi::datatype::{Partition, PartitionMut};
use ::mpi::topology::SimpleCommunicator;
use ::mpi::traits::*;

use super::{check_layout, check_root_buffer, Element, ProcessGroup, Rank, Tag};
use super::{TAG_GATHER, TAG_SCATTER};
use crate::error::{Error, Result, TransferDescriptor};
use crate::partition::CollectiveLayout;

pub struct MpiGroup {
    world: SimpleCommunicator,
}

impl MpiGroup {
    pub fn new(world: SimpleCommunicator) -> Self {
        MpiGroup { world }
    }
}

impl ProcessGroup for MpiGroup {
    fn rank(&self) -> Rank {
        self.world.rank() as Rank
    }

    fn size(&self) -> usize {
        self.world.size() as usize
    }

    fn send<T: Element>(&self, dst: Rank, buf: &[T], tag: Tag) -> Result<()> {
        self.world
            .process_at_rank(dst as i32)
            .send_with_tag(buf, tag);
        Ok(())
    }

    fn receive<T: Element>(&self, src: Rank, buf: &mut [T], tag: Tag) -> Result<()> {
        // Probe first so a short message is caught before it is consumed.
        let (message, status) = self
            .world
            .process_at_rank(src as i32)
            .matched_probe_with_tag(tag);
        let received = status.count(T::equivalent_datatype()) as usize;
        if received != buf.len() {
            return Err(Error::SizeMismatch {
                transfer: TransferDescriptor {
                    source: src,
                    destination: self.rank(),
                    payload_size: buf.len(),
                    tag,
                },
                received,
            });
        }
        message.matched_receive_into(buf);
        Ok(())
    }

    fn broadcast<T: Element>(&self, root: Rank, buf: &mut [T]) -> Result<()> {
        self.world
            .process_at_rank(root as i32)
            .broadcast_into(buf);
        Ok(())
    }

    fn scatter<T: Element>(
        &self,
        root: Rank,
        send: &[T],
        layout: &CollectiveLayout,
        recv: &mut [T],
    ) -> Result<()> {
        check_layout(self, root, TAG_SCATTER, layout, recv.len())?;
        let root_process = self.world.process_at_rank(root as i32);
        if self.rank() == root {
            check_root_buffer(self, TAG_SCATTER, layout, send.len())?;
            let partition = Partition::new(send, &layout.counts[..], &layout.displacements[..]);
            root_process.scatter_varcount_into_root(&partition, recv);
        } else {
            root_process.scatter_varcount_into(recv);
        }
        Ok(())
    }

    fn gather<T: Element>(
        &self,
        root: Rank,
        send: &[T],
        layout: &CollectiveLayout,
        recv: &mut [T],
    ) -> Result<()> {
        check_layout(self, root, TAG_GATHER, layout, send.len())?;
        let root_process = self.world.process_at_rank(root as i32);
        if self.rank() == root {
            check_root_buffer(self, TAG_GATHER, layout, recv.len())?;
            let mut partition =
                PartitionMut::new(recv, &layout.counts[..], &layout.displacements[..]);
            root_process.gather_varcount_into_root(send, &mut partition);
        } else {
            root_process.gather_varcount_into(send);
        }
        Ok(())
    }
}
