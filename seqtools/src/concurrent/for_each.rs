use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;
use tracing::Instrument;

use super::task_set::TaskSet;
use super::{ForEachSummary, ParallelOptions, catch_fault, pull_next};
use crate::Element;
use crate::sequence::Sequence;

impl<T> Sequence<T>
where
    T: Element,
{
    /// Runs `action` on every element using up to `workers` concurrent tasks.
    ///
    /// Returns once every element has been handled and every worker joined. Elements are handed out
    /// in sequence order, but callbacks on different workers may run in any order. A panicking
    /// `action` is counted in [`ForEachSummary::faulted`] and does not stop the others. So is a
    /// panic in an upstream operator while pulling an element, such as a filter predicate.
    ///
    /// With `workers <= 1` the elements are handled one at a time on the calling task.
    pub async fn for_each_parallel<F>(&self, workers: usize, action: F) -> ForEachSummary
    where
        F: Fn(T) + Send + Sync + 'static,
    {
        self.for_each_parallel_with(ParallelOptions::new(workers), action)
            .await
    }

    /// Like [`Sequence::for_each_parallel`], stopping early once `cancel` is cancelled.
    ///
    /// Callbacks already running are allowed to finish; no new element is started.
    pub async fn for_each_parallel_cancelable<F>(
        &self,
        workers: usize,
        cancel: CancellationToken,
        action: F,
    ) -> ForEachSummary
    where
        F: Fn(T) + Send + Sync + 'static,
    {
        self.for_each_parallel_with(ParallelOptions::new(workers).with_cancel(cancel), action)
            .await
    }

    /// Like [`Sequence::for_each_parallel`], configured by `options`.
    pub async fn for_each_parallel_with<F>(
        &self,
        options: ParallelOptions,
        action: F,
    ) -> ForEachSummary
    where
        F: Fn(T) + Send + Sync + 'static,
    {
        let workers = options.workers();
        let span = tracing::debug_span!("for_each_parallel", workers);
        async move {
            let summary = if workers <= 1 {
                self.for_each_sequential(&options, action)
            } else if let Some(fast) = self.fast_path() {
                let mut tasks = TaskSet::new(options.cancel_token());
                let action = Arc::new(action);
                for worker in 0..workers.min(fast.span().max(1)) {
                    let share = fast.stride(worker, workers);
                    let fast = fast.clone();
                    let action = Arc::clone(&action);
                    let cancel = tasks.token().clone();
                    tasks.spawn(async move {
                        let mut tally = ForEachSummary::default();
                        for item in share {
                            if cancel.is_cancelled() {
                                tally.cancelled = true;
                                break;
                            }
                            let outcome =
                                catch_fault(|| fast.admits(&item).then(|| (action)(item)));
                            if let Some(outcome) = outcome.transpose() {
                                tally.record(outcome);
                            }
                            tokio::task::yield_now().await;
                        }
                        tally
                    });
                }
                tasks
                    .join_all()
                    .await
                    .into_iter()
                    .fold(ForEachSummary::default(), ForEachSummary::merge)
            } else {
                self.for_each_dispatched(&options, workers, action).await
            };
            tracing::debug!(?summary, "Finished.");
            summary
        }
        .instrument(span)
        .await
    }

    fn for_each_sequential<F>(&self, options: &ParallelOptions, action: F) -> ForEachSummary
    where
        F: Fn(T),
    {
        let mut summary = ForEachSummary::default();
        let mut items = self.iter();
        loop {
            if options.cancel_token().is_some_and(CancellationToken::is_cancelled) {
                summary.cancelled = true;
                break;
            }
            let Some(pulled) = pull_next(&mut items) else {
                break;
            };
            summary.record(pulled.and_then(|item| catch_fault(|| action(item))));
        }
        summary
    }

    /// Generic path: pulls elements one at a time, starting one task per element once a permit is
    /// free.
    async fn for_each_dispatched<F>(
        &self,
        options: &ParallelOptions,
        workers: usize,
        action: F,
    ) -> ForEachSummary
    where
        F: Fn(T) + Send + Sync + 'static,
    {
        let permits = Arc::new(Semaphore::new(workers));
        let mut tasks = TaskSet::new(options.cancel_token());
        let cancel = tasks.token().clone();
        let action = Arc::new(action);
        let mut summary = ForEachSummary::default();
        let mut items = self.iter();
        loop {
            let permit = tokio::select! {
                biased;
                () = cancel.cancelled() => {
                    summary.cancelled = true;
                    break;
                }
                permit = Arc::clone(&permits).acquire_owned() => match permit {
                    Ok(permit) => permit,
                    Err(_closed) => break,
                },
            };
            while let Some(done) = tasks.try_reap() {
                summary = summary.merge(done);
            }
            let item = match pull_next(&mut items) {
                Some(Ok(item)) => item,
                Some(Err(fault)) => {
                    summary.record(Err(fault));
                    continue;
                }
                None => break,
            };
            let action = Arc::clone(&action);
            tasks.spawn(async move {
                let _permit = permit;
                let mut tally = ForEachSummary::default();
                tally.record(catch_fault(|| (action)(item)));
                tally
            });
        }
        tasks
            .join_all()
            .await
            .into_iter()
            .fold(summary, ForEachSummary::merge)
    }
}

#[cfg(test)]
mod test {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    #[tokio::test]
    async fn test_sequential_when_one_worker() {
        let seen = Arc::new(std::sync::Mutex::new(Vec::new()));
        let summary = {
            let seen = Arc::clone(&seen);
            Sequence::from_fn(|| 0..5)
                .for_each_parallel(1, move |x| seen.lock().unwrap().push(x))
                .await
        };
        assert_eq!(5, summary.completed);
        assert_eq!(vec![0, 1, 2, 3, 4], *seen.lock().unwrap());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_panicking_filter_loses_one_element() {
        for workers in [1, 4] {
            for seq in [
                Sequence::from_vec((0..100).collect::<Vec<u32>>()),
                Sequence::from_fn(|| 0..100u32),
            ] {
                let seq = seq.filter(|x| {
                    assert_ne!(50, *x, "bad filter input");
                    true
                });
                let ran = Arc::new(AtomicUsize::new(0));
                let summary = {
                    let ran = Arc::clone(&ran);
                    seq.for_each_parallel(workers, move |_| {
                        ran.fetch_add(1, Ordering::Relaxed);
                    })
                    .await
                };
                assert_eq!(
                    ForEachSummary {
                        completed: 99,
                        faulted: 1,
                        cancelled: false,
                    },
                    summary
                );
                assert_eq!(99, ran.load(Ordering::Relaxed));
            }
        }
    }

    #[tokio::test]
    async fn test_worker_count_is_clamped() {
        let summary = Sequence::from_fn(|| 0..10)
            .for_each_parallel(usize::MAX, |_| {})
            .await;
        assert_eq!(10, summary.completed);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_fast_and_generic_paths_visit_everything() {
        for seq in [
            Sequence::from_vec((0..200).collect::<Vec<usize>>()),
            Sequence::from_fn(|| 0..200usize),
        ] {
            let total = Arc::new(AtomicUsize::new(0));
            let summary = {
                let total = Arc::clone(&total);
                seq.for_each_parallel(8, move |x| {
                    total.fetch_add(x, Ordering::Relaxed);
                })
                .await
            };
            assert_eq!(200, summary.completed);
            assert_eq!((0..200).sum::<usize>(), total.load(Ordering::Relaxed));
        }
    }
}
