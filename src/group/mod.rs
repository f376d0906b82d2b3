//! Fixed-size process groups and their typed transfer primitives.
//!
//! A [`ProcessGroup`] is one participant's handle on the group: it knows its
//! own rank, the group size, and how to move typed buffers to and from
//! peers. Receives are size checked: a payload that does not exactly fill the
//! receiver's buffer is a [`Error::SizeMismatch`], never a silent truncation.

pub mod local;
#[cfg(feature = "mpi")]
pub mod mpi;

pub use local::LocalGroup;
#[cfg(feature = "mpi")]
pub use self::mpi::MpiGroup;

use crate::error::{Error, Result, TransferDescriptor};
use crate::partition::CollectiveLayout;

pub type Rank = usize;
pub type Tag = i32;

/// Rank of the coordinator, also the root of every collective.
pub const COORDINATOR_RANK: Rank = 0;

// Tags used by the point-to-point fallbacks of the collectives
pub const TAG_BROADCAST: Tag = 100;
pub const TAG_SCATTER: Tag = 101;
pub const TAG_GATHER: Tag = 102;

/// Plain-data element that can travel between participants.
#[cfg(feature = "mpi")]
pub trait Element: Copy + Default + Send + 'static + ::mpi::datatype::Equivalence {
    const NAME: &'static str;
}

/// Plain-data element that can travel between participants.
#[cfg(not(feature = "mpi"))]
pub trait Element: Copy + Default + Send + 'static {
    const NAME: &'static str;
}

impl Element for f32 {
    const NAME: &'static str = "f32";
}

impl Element for i32 {
    const NAME: &'static str = "i32";
}

pub trait ProcessGroup {
    fn rank(&self) -> Rank;

    fn size(&self) -> usize;

    /// Blocking send of `buf` to `dst`.
    fn send<T: Element>(&self, dst: Rank, buf: &[T], tag: Tag) -> Result<()>;

    /// Blocking receive from `src` into `buf`; the payload must fill `buf` exactly.
    fn receive<T: Element>(&self, src: Rank, buf: &mut [T], tag: Tag) -> Result<()>;

    /// Deliver the root's `buf` to every participant.
    fn broadcast<T: Element>(&self, root: Rank, buf: &mut [T]) -> Result<()> {
        if self.rank() != root {
            return self.receive(root, buf, TAG_BROADCAST);
        }
        for dst in (0..self.size()).filter(|&r| r != root) {
            self.send(dst, buf, TAG_BROADCAST)?;
        }
        Ok(())
    }

    /// Hand each rank its `layout` slice of the root's `send` buffer.
    ///
    /// Non-root participants pass an empty `send`.
    fn scatter<T: Element>(
        &self,
        root: Rank,
        send: &[T],
        layout: &CollectiveLayout,
        recv: &mut [T],
    ) -> Result<()> {
        check_layout(self, root, TAG_SCATTER, layout, recv.len())?;
        if self.rank() != root {
            return self.receive(root, recv, TAG_SCATTER);
        }
        check_root_buffer(self, TAG_SCATTER, layout, send.len())?;
        for dst in (0..self.size()).filter(|&r| r != root) {
            self.send(dst, &send[layout.range(dst)], TAG_SCATTER)?;
        }
        recv.copy_from_slice(&send[layout.range(root)]);
        Ok(())
    }

    /// Reassemble every rank's `send` into the root's `recv` at its displacement.
    ///
    /// Non-root participants pass an empty `recv`.
    fn gather<T: Element>(
        &self,
        root: Rank,
        send: &[T],
        layout: &CollectiveLayout,
        recv: &mut [T],
    ) -> Result<()> {
        check_layout(self, root, TAG_GATHER, layout, send.len())?;
        if self.rank() != root {
            return self.send(root, send, TAG_GATHER);
        }
        check_root_buffer(self, TAG_GATHER, layout, recv.len())?;
        for src in (0..self.size()).filter(|&r| r != root) {
            self.receive(src, &mut recv[layout.range(src)], TAG_GATHER)?;
        }
        recv[layout.range(root)].copy_from_slice(send);
        Ok(())
    }
}

/// This rank's own contribution must match its layout entry.
pub(crate) fn check_layout<G: ProcessGroup + ?Sized>(
    group: &G,
    root: Rank,
    tag: Tag,
    layout: &CollectiveLayout,
    local_len: usize,
) -> Result<()> {
    let rank = group.rank();
    if layout.counts.len() != group.size() || layout.displacements.len() != group.size() {
        return Err(Error::InvalidDimensions(format!(
            "collective layout covers {} ranks, group has {}",
            layout.counts.len(),
            group.size()
        )));
    }
    let expected = layout.count(rank);
    if local_len != expected {
        // Gathered data flows towards the root, scattered data away from it.
        let (source, destination) = if tag == TAG_GATHER {
            (rank, root)
        } else {
            (root, rank)
        };
        return Err(Error::SizeMismatch {
            transfer: TransferDescriptor {
                source,
                destination,
                payload_size: expected,
                tag,
            },
            received: local_len,
        });
    }
    Ok(())
}

/// The root's full buffer must cover every displacement in the layout.
pub(crate) fn check_root_buffer<G: ProcessGroup + ?Sized>(
    group: &G,
    tag: Tag,
    layout: &CollectiveLayout,
    root_len: usize,
) -> Result<()> {
    let needed = (0..group.size())
        .map(|rank| layout.range(rank).end)
        .max()
        .unwrap_or(0);
    if root_len < needed {
        return Err(Error::SizeMismatch {
            transfer: TransferDescriptor {
                source: group.rank(),
                destination: group.rank(),
                payload_size: needed,
                tag,
            },
            received: root_len,
        });
    }
    Ok(())
}
