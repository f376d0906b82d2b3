//! Error types shared by every role and transport.

use std::fmt;

use thiserror::Error;

use crate::group::{Rank, Tag};

/// One buffer transfer as both ends are expected to agree on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransferDescriptor {
    pub source: Rank,
    pub destination: Rank,
    pub payload_size: usize,
    pub tag: Tag,
}

impl fmt::Display for TransferDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} -> {} ({} elements, tag {})",
            self.source, self.destination, self.payload_size, self.tag
        )
    }
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid dimensions: {0}")]
    InvalidDimensions(String),

    #[error("matrix dimensions incompatible: {lhs_rows}x{lhs_cols} * {rhs_rows}x{rhs_cols}")]
    IncompatibleDimensions {
        lhs_rows: usize,
        lhs_cols: usize,
        rhs_rows: usize,
        rhs_cols: usize,
    },

    #[error("index out of bounds: ({row}, {col}) for matrix {rows}x{cols}")]
    IndexOutOfBounds {
        row: usize,
        col: usize,
        rows: usize,
        cols: usize,
    },

    #[error("no workers available: group size is {group_size}, need at least 2 (1 coordinator + 1 worker)")]
    NoWorkers { group_size: usize },

    /// The arriving payload does not fit the receiver's buffer exactly.
    #[error("transfer size mismatch on {transfer}: {received} elements arrived")]
    SizeMismatch {
        transfer: TransferDescriptor,
        received: usize,
    },

    #[error("rank {rank} expected tag {expected} from rank {peer}, got tag {actual}")]
    UnexpectedTag {
        rank: Rank,
        peer: Rank,
        expected: Tag,
        actual: Tag,
    },

    #[error("element type mismatch on {transfer}: expected {expected}")]
    ElementType {
        transfer: TransferDescriptor,
        expected: &'static str,
    },

    #[error("rank {peer} is not reachable from rank {rank}")]
    Disconnected { rank: Rank, peer: Rank },

    #[error("rank {rank} timed out waiting for rank {peer}")]
    Timeout { rank: Rank, peer: Rank },

    #[error(
        "distributed result differs from serial reference at ({row}, {col}): {expected} vs {actual} (epsilon {epsilon})"
    )]
    ResultMismatch {
        row: usize,
        col: usize,
        expected: f32,
        actual: f32,
        epsilon: f32,
    },

    #[error("rank {rank} panicked")]
    WorkerPanicked { rank: Rank },
}

pub type Result<T> = std::result::Result<T, Error>;
