#![doc = include_str!("../README.md")]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![warn(missing_docs)]

pub mod adapters;
pub mod concurrent;
pub mod error;
pub mod membership;
pub mod ops;
pub mod ordering;
pub mod pool;
pub mod sequence;
pub mod slice;
pub mod terminal;

pub use concurrent::{
    Fault, FaultLog, ForEachSummary, ParallelOptions, RetryError, SelectAsync, catch_fault,
    retry_fault,
};
pub use error::Error;
pub use ops::group::Group;
pub use ordering::{Comparator, OrderedSequence};
pub use pool::BufferPool;
pub use sequence::{Iter, Sequence};
pub use tokio_util::sync::CancellationToken;

/// Bound shared by every element type a [`Sequence`] can carry.
///
/// Sequences are re-runnable and may be handed to worker tasks, so elements are cloned out of their
/// backing storage and must be thread-safe.
pub trait Element: Clone + Send + Sync + 'static {}
impl<T> Element for T where T: Clone + Send + Sync + 'static {}
