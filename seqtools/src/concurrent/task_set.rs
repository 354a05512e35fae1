use std::future::Future;
use std::task::{Context, Poll};

use tokio::task::{JoinError, JoinSet};
use tokio_util::sync::CancellationToken;

/// The worker tasks of one concurrent call, plus the token they watch for cancellation.
///
/// The token is a child of the caller's token, if any, so cancelling the call never cancels the
/// caller. Dropping the set cancels the token and aborts whatever is still running.
pub(crate) struct TaskSet<R>
where
    R: 'static,
{
    tasks: JoinSet<R>,
    cancel: CancellationToken,
}

impl<R> TaskSet<R>
where
    R: Send + 'static,
{
    pub(crate) fn new(parent: Option<&CancellationToken>) -> Self {
        Self {
            tasks: JoinSet::new(),
            cancel: parent.map_or_else(CancellationToken::new, CancellationToken::child_token),
        }
    }

    pub(crate) fn token(&self) -> &CancellationToken {
        &self.cancel
    }

    pub(crate) fn spawn<F>(&mut self, task: F)
    where
        F: Future<Output = R> + Send + 'static,
    {
        self.tasks.spawn(task);
    }

    /// Output of some already-finished task, without waiting.
    pub(crate) fn try_reap(&mut self) -> Option<R> {
        while let Some(joined) = self.tasks.try_join_next() {
            if let Some(output) = settle(joined) {
                return Some(output);
            }
        }
        None
    }

    pub(crate) fn poll_join_next(&mut self, cx: &mut Context<'_>) -> Poll<Option<R>> {
        loop {
            match self.tasks.poll_join_next(cx) {
                Poll::Ready(Some(joined)) => {
                    if let Some(output) = settle(joined) {
                        return Poll::Ready(Some(output));
                    }
                }
                Poll::Ready(None) => return Poll::Ready(None),
                Poll::Pending => return Poll::Pending,
            }
        }
    }

    /// Waits for every task and returns their outputs in completion order.
    pub(crate) async fn join_all(mut self) -> Vec<R> {
        let mut outputs = Vec::with_capacity(self.tasks.len());
        while let Some(joined) = self.tasks.join_next().await {
            outputs.extend(settle(joined));
        }
        tracing::debug!(tasks = outputs.len(), "Joined all worker tasks.");
        outputs
    }
}

impl<R> Drop for TaskSet<R>
where
    R: 'static,
{
    fn drop(&mut self) {
        self.cancel.cancel();
        if !self.tasks.is_empty() {
            tracing::debug!(
                tasks = self.tasks.len(),
                "Aborting unfinished worker tasks."
            );
            self.tasks.abort_all();
        }
    }
}

fn settle<R>(joined: Result<R, JoinError>) -> Option<R> {
    match joined {
        Ok(output) => Some(output),
        Err(err) if err.is_cancelled() => None,
        Err(err) => {
            tracing::warn!(%err, "Worker task failed outside callback isolation.");
            None
        }
    }
}
