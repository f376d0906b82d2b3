//! In-process process group: every participant is a thread and every
//! ordered pair of ranks has its own channel.

use std::any::Any;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::time::Duration;

use tracing::trace;

use super::{Element, ProcessGroup, Rank, Tag};
use crate::error::{Error, Result, TransferDescriptor};

struct Envelope {
    tag: Tag,
    len: usize,
    payload: Box<dyn Any + Send>,
}

/// One participant's endpoint in a group created by [`LocalGroup::create`].
pub struct LocalGroup {
    rank: Rank,
    outboxes: Vec<Sender<Envelope>>,
    inboxes: Vec<Receiver<Envelope>>,
    timeout: Option<Duration>,
}

impl LocalGroup {
    /// Create all `size` endpoints of a fully connected group, in rank order.
    pub fn create(size: usize) -> Vec<LocalGroup> {
        let mut outboxes: Vec<Vec<Sender<Envelope>>> =
            (0..size).map(|_| Vec::with_capacity(size)).collect();
        let mut inboxes: Vec<Vec<Receiver<Envelope>>> =
            (0..size).map(|_| Vec::with_capacity(size)).collect();

        for src in 0..size {
            for dst in 0..size {
                let (tx, rx) = mpsc::channel();
                outboxes[src].push(tx);
                inboxes[dst].push(rx);
            }
        }

        outboxes
            .into_iter()
            .zip(inboxes)
            .enumerate()
            .map(|(rank, (outboxes, inboxes))| LocalGroup {
                rank,
                outboxes,
                inboxes,
                timeout: None,
            })
            .collect()
    }

    /// Fail receives that wait longer than `timeout` instead of blocking forever.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    fn disconnected(&self, peer: Rank) -> Error {
        Error::Disconnected {
            rank: self.rank,
            peer,
        }
    }
}

impl ProcessGroup for LocalGroup {
    fn rank(&self) -> Rank {
        self.rank
    }

    fn size(&self) -> usize {
        self.outboxes.len()
    }

    fn send<T: Element>(&self, dst: Rank, buf: &[T], tag: Tag) -> Result<()> {
        let outbox = self.outboxes.get(dst).ok_or_else(|| self.disconnected(dst))?;
        trace!(rank = self.rank, dst, tag, len = buf.len(), "send");
        outbox
            .send(Envelope {
                tag,
                len: buf.len(),
                payload: Box::new(buf.to_vec()),
            })
            .map_err(|_| self.disconnected(dst))
    }

    fn receive<T: Element>(&self, src: Rank, buf: &mut [T], tag: Tag) -> Result<()> {
        let inbox = self.inboxes.get(src).ok_or_else(|| self.disconnected(src))?;
        let envelope = match self.timeout {
            Some(timeout) => inbox.recv_timeout(timeout).map_err(|e| match e {
                RecvTimeoutError::Timeout => Error::Timeout {
                    rank: self.rank,
                    peer: src,
                },
                RecvTimeoutError::Disconnected => self.disconnected(src),
            })?,
            None => inbox.recv().map_err(|_| self.disconnected(src))?,
        };

        if envelope.tag != tag {
            return Err(Error::UnexpectedTag {
                rank: self.rank,
                peer: src,
                expected: tag,
                actual: envelope.tag,
            });
        }

        let transfer = TransferDescriptor {
            source: src,
            destination: self.rank,
            payload_size: buf.len(),
            tag,
        };
        if envelope.len != buf.len() {
            return Err(Error::SizeMismatch {
                transfer,
                received: envelope.len,
            });
        }

        let data = envelope
            .payload
            .downcast::<Vec<T>>()
            .map_err(|_| Error::ElementType {
                transfer,
                expected: T::NAME,
            })?;
        buf.copy_from_slice(&data);
        trace!(rank = self.rank, src, tag, len = buf.len(), "receive");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_point_to_point_in_order() {
        let mut group = LocalGroup::create(2).into_iter();
        let (a, b) = (group.next().unwrap(), group.next().unwrap());

        a.send(1, &[1.0f32, 2.0], 7).unwrap();
        a.send(1, &[3i32], 8).unwrap();

        let mut floats = [0.0f32; 2];
        let mut ints = [0i32; 1];
        b.receive(0, &mut floats, 7).unwrap();
        b.receive(0, &mut ints, 8).unwrap();
        assert_eq!(floats, [1.0, 2.0]);
        assert_eq!(ints, [3]);
    }

    #[test]
    fn test_wrong_tag_is_reported() {
        let mut group = LocalGroup::create(2).into_iter();
        let (a, b) = (group.next().unwrap(), group.next().unwrap());

        a.send(1, &[1.0f32], 1).unwrap();
        let mut buf = [0.0f32; 1];
        assert!(matches!(
            b.receive(0, &mut buf, 2),
            Err(Error::UnexpectedTag {
                expected: 2,
                actual: 1,
                ..
            })
        ));
    }

    #[test]
    fn test_wrong_element_type_is_reported() {
        let mut group = LocalGroup::create(2).into_iter();
        let (a, b) = (group.next().unwrap(), group.next().unwrap());

        a.send(1, &[1i32], 1).unwrap();
        let mut buf = [0.0f32; 1];
        assert!(matches!(
            b.receive(0, &mut buf, 1),
            Err(Error::ElementType { expected: "f32", .. })
        ));
    }

    #[test]
    fn test_timeout_and_disconnect() {
        let mut group = LocalGroup::create(2).into_iter();
        let a = group.next().unwrap();
        let b = group
            .next()
            .unwrap()
            .with_timeout(Some(Duration::from_millis(10)));

        let mut buf = [0.0f32; 1];
        assert!(matches!(
            b.receive(0, &mut buf, 1),
            Err(Error::Timeout { rank: 1, peer: 0 })
        ));

        drop(a);
        assert!(matches!(
            b.receive(0, &mut buf, 1),
            Err(Error::Disconnected { rank: 1, peer: 0 })
        ));
    }
}
