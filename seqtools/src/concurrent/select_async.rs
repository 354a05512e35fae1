use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll, ready};

use futures::Stream;
use futures::stream::{FusedStream, StreamExt};
use tokio::sync::{Semaphore, mpsc};
use tokio_util::sync::CancellationToken;

use super::task_set::TaskSet;
use super::{FaultLog, ParallelOptions, catch_fault, pull_next};
use crate::Element;
use crate::sequence::Sequence;

type Start<V> = Box<dyn FnOnce(Arc<FaultLog>) -> Running<V> + Send>;

/// Unordered result stream of [`Sequence::select_async`].
///
/// Workers start on the first poll. Results arrive in completion order through a queue bounded at
/// [`ParallelOptions::queue_capacity`]; a full queue holds workers back until the consumer catches
/// up. Dropping the stream before it ends cancels and aborts every worker.
#[must_use = "streams do nothing unless polled"]
pub struct SelectAsync<V> {
    state: State<V>,
    faults: Arc<FaultLog>,
}

enum State<V> {
    Pending(Start<V>),
    Running(Running<V>),
    /// Every sender is gone; waiting for the last workers to be reaped.
    Draining(TaskSet<()>),
    Done,
}

impl<V> Unpin for SelectAsync<V> {}

struct Running<V> {
    results: mpsc::Receiver<V>,
    tasks: TaskSet<()>,
}

impl<V> SelectAsync<V>
where
    V: Send + 'static,
{
    fn new(start: Start<V>) -> Self {
        Self {
            state: State::Pending(start),
            faults: Arc::default(),
        }
    }

    /// Faults recorded so far. Each one is an element with no result in the stream.
    pub fn faults(&self) -> &Arc<FaultLog> {
        &self.faults
    }

    /// Drains the stream into a new fast-path [`Sequence`].
    pub async fn collect_sequence(self) -> Sequence<V>
    where
        V: Element,
    {
        Sequence::from_vec(self.collect::<Vec<_>>().await)
    }
}

impl<V> Stream for SelectAsync<V>
where
    V: Send + 'static,
{
    type Item = V;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        if matches!(this.state, State::Pending(_))
            && let State::Pending(start) = std::mem::replace(&mut this.state, State::Done)
        {
            this.state = State::Running(start(Arc::clone(&this.faults)));
        }

        loop {
            match &mut this.state {
                State::Running(running) => {
                    if let Some(value) = ready!(running.results.poll_recv(cx)) {
                        return Poll::Ready(Some(value));
                    }
                    let State::Running(running) = std::mem::replace(&mut this.state, State::Done)
                    else {
                        return Poll::Ready(None);
                    };
                    this.state = State::Draining(running.tasks);
                }
                State::Draining(tasks) => {
                    while ready!(tasks.poll_join_next(cx)).is_some() {}
                    tracing::debug!(faults = this.faults.len(), "Concurrent map finished.");
                    this.state = State::Done;
                }
                State::Pending(_) | State::Done => return Poll::Ready(None),
            }
        }
    }
}

impl<V> FusedStream for SelectAsync<V>
where
    V: Send + 'static,
{
    fn is_terminated(&self) -> bool {
        matches!(self.state, State::Done)
    }
}

impl<T> Sequence<T>
where
    T: Element,
{
    /// Maps every element through `selector` on up to `workers` concurrent tasks, yielding results
    /// as they complete.
    ///
    /// Result order is unspecified. An element whose `selector` panics yields nothing; the panic is
    /// recorded in [`SelectAsync::faults`]. The same holds for a panic in an upstream operator while
    /// the element is pulled.
    pub fn select_async<V, F>(&self, workers: usize, selector: F) -> SelectAsync<V>
    where
        V: Send + 'static,
        F: Fn(T) -> V + Send + Sync + 'static,
    {
        self.select_async_with(ParallelOptions::new(workers), selector)
    }

    /// Like [`Sequence::select_async`], ending the stream early once `cancel` is cancelled.
    pub fn select_async_cancelable<V, F>(
        &self,
        workers: usize,
        cancel: CancellationToken,
        selector: F,
    ) -> SelectAsync<V>
    where
        V: Send + 'static,
        F: Fn(T) -> V + Send + Sync + 'static,
    {
        self.select_async_with(ParallelOptions::new(workers).with_cancel(cancel), selector)
    }

    /// Like [`Sequence::select_async`], configured by `options`.
    pub fn select_async_with<V, F>(&self, options: ParallelOptions, selector: F) -> SelectAsync<V>
    where
        V: Send + 'static,
        F: Fn(T) -> V + Send + Sync + 'static,
    {
        let source = self.clone();
        SelectAsync::new(Box::new(move |faults| {
            start(source, options, Arc::new(selector), faults)
        }))
    }
}

fn start<T, V, F>(
    source: Sequence<T>,
    options: ParallelOptions,
    selector: Arc<F>,
    faults: Arc<FaultLog>,
) -> Running<V>
where
    T: Element,
    V: Send + 'static,
    F: Fn(T) -> V + Send + Sync + 'static,
{
    let workers = options.workers().max(1);
    let (send, results) = mpsc::channel(options.queue_capacity());
    let mut tasks = TaskSet::new(options.cancel_token());
    tracing::debug!(
        workers,
        capacity = options.queue_capacity(),
        "Starting concurrent map."
    );

    match source.into_fast_path() {
        Ok(fast) => {
            for worker in 0..workers.min(fast.span().max(1)) {
                let share = fast.stride(worker, workers);
                let fast = fast.clone();
                let selector = Arc::clone(&selector);
                let send = send.clone();
                let cancel = tasks.token().clone();
                let faults = Arc::clone(&faults);
                tasks.spawn(async move {
                    for item in share {
                        if cancel.is_cancelled() {
                            break;
                        }
                        match catch_fault(|| fast.admits(&item).then(|| (selector)(item))) {
                            Ok(Some(value)) => {
                                if !publish(&send, &cancel, value).await {
                                    break;
                                }
                            }
                            Ok(None) => {}
                            Err(fault) => faults.record(fault),
                        }
                        tokio::task::yield_now().await;
                    }
                });
            }
        }
        Err(source) => {
            let cancel = tasks.token().clone();
            tasks.spawn(dispatch(source, workers, selector, send, cancel, faults));
        }
    }

    Running { results, tasks }
}

/// Generic path: feeds elements to per-element tasks, at most `workers` at a time.
async fn dispatch<T, V, F>(
    source: Sequence<T>,
    workers: usize,
    selector: Arc<F>,
    send: mpsc::Sender<V>,
    cancel: CancellationToken,
    faults: Arc<FaultLog>,
) where
    T: Element,
    V: Send + 'static,
    F: Fn(T) -> V + Send + Sync + 'static,
{
    let permits = Arc::new(Semaphore::new(workers));
    let mut tasks = TaskSet::new(Some(&cancel));
    let mut items = source.iter();
    loop {
        let permit = tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            permit = Arc::clone(&permits).acquire_owned() => match permit {
                Ok(permit) => permit,
                Err(_closed) => break,
            },
        };
        while tasks.try_reap().is_some() {}
        let item = match pull_next(&mut items) {
            Some(Ok(item)) => item,
            Some(Err(fault)) => {
                faults.record(fault);
                continue;
            }
            None => break,
        };
        let selector = Arc::clone(&selector);
        let send = send.clone();
        let task_cancel = tasks.token().clone();
        let faults = Arc::clone(&faults);
        tasks.spawn(async move {
            let _permit = permit;
            match catch_fault(|| (selector)(item)) {
                Ok(value) => {
                    publish(&send, &task_cancel, value).await;
                }
                Err(fault) => faults.record(fault),
            }
        });
    }
    tasks.join_all().await;
}

/// Sends `value` unless cancelled first. Returns whether the consumer may still want more.
async fn publish<V>(send: &mpsc::Sender<V>, cancel: &CancellationToken, value: V) -> bool {
    tokio::select! {
        biased;
        () = cancel.cancelled() => false,
        sent = send.send(value) => sent.is_ok(),
    }
}

#[cfg(test)]
mod test {
    use static_assertions::assert_impl_all;

    use super::*;

    assert_impl_all!(SelectAsync<String>: Send, Unpin);

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_collects_every_result() {
        for seq in [
            Sequence::from_vec((0..100).collect::<Vec<u32>>()),
            Sequence::from_fn(|| 0..100u32),
        ] {
            let mut out = seq
                .select_async(4, |x| x * 2)
                .collect_sequence()
                .await
                .to_vec();
            out.sort_unstable();
            assert_eq!((0..100).map(|x| x * 2).collect::<Vec<_>>(), out);
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_panicking_filter_is_recorded() {
        for seq in [
            Sequence::from_vec((0..100).collect::<Vec<u32>>()),
            Sequence::from_fn(|| 0..100u32),
        ] {
            let stream = seq
                .filter(|x| {
                    assert_ne!(50, *x, "bad filter input");
                    true
                })
                .select_async(4, |x| x);
            let faults = Arc::clone(stream.faults());
            let mut out = stream.collect::<Vec<_>>().await;
            out.sort_unstable();
            assert_eq!((0..100).filter(|x| *x != 50).collect::<Vec<_>>(), out);
            assert_eq!(1, faults.len());
        }
    }

    #[tokio::test]
    async fn test_worker_count_is_clamped() {
        let mut out = Sequence::from_fn(|| 0..10u32)
            .select_async(usize::MAX, |x| x)
            .collect::<Vec<_>>()
            .await;
        out.sort_unstable();
        assert_eq!((0..10).collect::<Vec<_>>(), out);
    }

    #[tokio::test]
    async fn test_single_worker_current_thread() {
        let out = Sequence::from_vec(vec![1, 2, 3])
            .select_async(1, |x| x + 1)
            .collect::<Vec<_>>()
            .await;
        assert_eq!(vec![2, 3, 4], out);
    }
}
