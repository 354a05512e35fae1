//! Bounded concurrent for-each and map over a [`Sequence`](crate::Sequence), running on tokio.
//!
//! Both operators run the user callback on up to `N` worker tasks. A fast-path sequence is split
//! statically: worker `w` owns in-view offsets `w, w + N, w + 2N, ...`. Any other sequence is
//! distributed live by a dispatcher which holds one semaphore permit per running callback.
//!
//! A panicking callback only loses its own element. The panic is captured as a [`Fault`], logged,
//! and counted, and the remaining elements still run. This covers the upstream operators too: a
//! filter, projection, or sort that panics while an element is being pulled is recorded as a fault
//! for that pull, and pulling carries on from the next element.
//!
//! Every call owns a [`TaskSet`](task_set::TaskSet). It is joined before a for-each call returns,
//! and cancelled and aborted when a map's result stream is dropped, so no worker outlives its call.

mod for_each;
mod select_async;
mod task_set;

use std::any::Any;
use std::num::NonZero;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;

pub use self::select_async::SelectAsync;

/// Worker count, queue sizing, and cancellation for one concurrent call.
#[derive(Debug, Clone)]
pub struct ParallelOptions {
    workers: usize,
    queue_factor: usize,
    cancel: Option<CancellationToken>,
}

impl Default for ParallelOptions {
    /// One worker per available CPU.
    fn default() -> Self {
        let workers = std::thread::available_parallelism().map_or(1, NonZero::get);
        Self::new(workers)
    }
}

impl ParallelOptions {
    /// Result queue slots per worker, for [`Sequence::select_async`](crate::Sequence::select_async).
    pub const DEFAULT_QUEUE_FACTOR: usize = 2;

    /// `workers` is clamped to [`Semaphore::MAX_PERMITS`].
    pub fn new(workers: usize) -> Self {
        Self {
            workers: workers.min(Semaphore::MAX_PERMITS),
            queue_factor: Self::DEFAULT_QUEUE_FACTOR,
            cancel: None,
        }
    }

    /// Sets the result queue capacity to `queue_factor` times the worker count. Clamped to at least 1.
    pub fn with_queue_factor(mut self, queue_factor: usize) -> Self {
        self.queue_factor = queue_factor.max(1);
        self
    }

    /// Stops the call early once `cancel` is cancelled.
    pub fn with_cancel(mut self, cancel: CancellationToken) -> Self {
        self.cancel = Some(cancel);
        self
    }

    /// Requested worker count. Zero and one both mean "no concurrency".
    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Result queue slots: workers times the queue factor, at most [`Semaphore::MAX_PERMITS`].
    pub fn queue_capacity(&self) -> usize {
        self.workers
            .max(1)
            .saturating_mul(self.queue_factor.max(1))
            .min(Semaphore::MAX_PERMITS)
    }

    /// The caller's token, if any. Never cancelled by this crate.
    pub fn cancel_token(&self) -> Option<&CancellationToken> {
        self.cancel.as_ref()
    }
}

/// A callback panic, captured instead of unwinding into the caller.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("callback panicked: {message}")]
pub struct Fault {
    message: String,
}

impl Fault {
    fn from_panic(payload: Box<dyn Any + Send>) -> Self {
        let message = match payload.downcast::<String>() {
            Ok(message) => *message,
            Err(payload) => match payload.downcast::<&'static str>() {
                Ok(message) => (*message).to_owned(),
                Err(_) => "non-string panic payload".to_owned(),
            },
        };
        Self { message }
    }

    /// The panic message.
    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Runs `callback`, turning a panic into a [`Fault`].
pub fn catch_fault<R>(callback: impl FnOnce() -> R) -> Result<R, Fault> {
    catch_unwind(AssertUnwindSafe(callback)).map_err(Fault::from_panic)
}

/// Pulls the next element from `items`, turning a panic in an upstream operator into a fault for
/// that pull.
pub(crate) fn pull_next<I>(items: &mut I) -> Option<Result<I::Item, Fault>>
where
    I: Iterator,
{
    catch_fault(|| items.next()).transpose()
}

/// Why the last attempt of [`retry_fault`] failed.
#[derive(Debug, thiserror::Error)]
pub enum RetryError<E> {
    #[error(transparent)]
    /// The attempt panicked.
    Fault(#[from] Fault),
    #[error("callback failed: {0}")]
    /// The attempt returned an error.
    Failed(E),
}

/// Runs `callback` up to `attempts` times until one attempt returns `Ok` without panicking,
/// sleeping `delay` between failed attempts.
///
/// `attempts` is at least 1. On exhaustion, the failure of the last attempt is returned.
pub async fn retry_fault<R, E, F>(
    attempts: usize,
    delay: Duration,
    mut callback: F,
) -> Result<R, RetryError<E>>
where
    F: FnMut() -> Result<R, E>,
    E: std::fmt::Display,
{
    let attempts = attempts.max(1);
    let mut attempt = 1;
    loop {
        let failure = match catch_fault(&mut callback) {
            Ok(Ok(output)) => return Ok(output),
            Ok(Err(err)) => RetryError::Failed(err),
            Err(fault) => RetryError::Fault(fault),
        };
        if attempt >= attempts {
            tracing::warn!(attempts, %failure, "Giving up.");
            return Err(failure);
        }
        tracing::debug!(attempt, %failure, "Attempt failed, retrying.");
        attempt += 1;
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
    }
}

/// Faults recorded by one concurrent map, in the order they were observed.
#[derive(Debug, Default)]
pub struct FaultLog {
    faults: Mutex<Vec<Fault>>,
}

impl FaultLog {
    pub(crate) fn record(&self, fault: Fault) {
        tracing::warn!(%fault, "Dropping element after callback fault.");
        self.faults
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(fault);
    }

    /// Number of faults recorded so far.
    pub fn len(&self) -> usize {
        self.faults
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Whether no fault has been recorded.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Copies out every fault recorded so far.
    pub fn snapshot(&self) -> Vec<Fault> {
        self.faults
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

/// Outcome of a concurrent for-each.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ForEachSummary {
    /// Callbacks which returned normally.
    pub completed: usize,
    /// Callbacks which panicked.
    pub faulted: usize,
    /// Whether cancellation was observed before the input ran out.
    pub cancelled: bool,
}

impl ForEachSummary {
    /// Elements whose callback ran, successfully or not.
    pub fn processed(&self) -> usize {
        self.completed + self.faulted
    }

    pub(crate) fn record(&mut self, outcome: Result<(), Fault>) {
        match outcome {
            Ok(()) => self.completed += 1,
            Err(fault) => {
                tracing::warn!(%fault, "Skipping element after callback fault.");
                self.faulted += 1;
            }
        }
    }

    pub(crate) fn merge(self, other: Self) -> Self {
        Self {
            completed: self.completed + other.completed,
            faulted: self.faulted + other.faulted,
            cancelled: self.cancelled || other.cancelled,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_catch_fault_messages() {
        assert_eq!(Ok(3), catch_fault(|| 1 + 2));
        let fault = catch_fault::<()>(|| panic!("static {}", "message")).unwrap_err();
        assert_eq!("static message", fault.message());
        let fault = catch_fault::<()>(|| std::panic::panic_any(17u8)).unwrap_err();
        assert_eq!("non-string panic payload", fault.message());
    }

    #[test]
    fn test_options() {
        let options = ParallelOptions::new(4).with_queue_factor(0);
        assert_eq!(4, options.queue_capacity());
        assert_eq!(2, ParallelOptions::new(0).queue_capacity());
        assert!(options.cancel_token().is_none());
    }

    #[test]
    fn test_options_clamped_to_semaphore_limit() {
        let options = ParallelOptions::new(usize::MAX);
        assert_eq!(Semaphore::MAX_PERMITS, options.workers());
        assert_eq!(Semaphore::MAX_PERMITS, options.queue_capacity());
        let options = ParallelOptions::new(8).with_queue_factor(usize::MAX);
        assert_eq!(Semaphore::MAX_PERMITS, options.queue_capacity());
    }

    #[tokio::test]
    async fn test_retry_until_success() {
        let mut calls = 0;
        let result = retry_fault(5, Duration::from_millis(1), || {
            calls += 1;
            match calls {
                1 => panic!("first attempt"),
                2 => Err("second attempt"),
                _ => Ok(calls),
            }
        })
        .await;
        assert_eq!(3, result.unwrap());
        assert_eq!(3, calls);
    }

    #[tokio::test]
    async fn test_retry_gives_up_with_last_failure() {
        let mut calls = 0;
        let result = retry_fault::<(), _, _>(3, Duration::ZERO, || {
            calls += 1;
            if calls < 3 {
                panic!("attempt {calls}");
            }
            Err("out of luck")
        })
        .await;
        assert!(matches!(result, Err(RetryError::Failed("out of luck"))));
        assert_eq!(3, calls);

        let mut calls = 0;
        let result = retry_fault::<(), &str, _>(0, Duration::ZERO, || {
            calls += 1;
            panic!("always")
        })
        .await;
        match result {
            Err(RetryError::Fault(fault)) => assert_eq!("always", fault.message()),
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(1, calls);
    }
}
