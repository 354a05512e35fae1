//! [`Deferred`] iterator, for operators which must materialize their input before emitting.

/// Runs `init` on the first pull, then drains the iterator it produced.
///
/// Sorting, grouping, and reversing a generic sequence all need the whole input up front. Wrapping
/// that work in `Deferred` keeps it out of sequence construction and out of `iter()`.
pub(crate) struct Deferred<F, I> {
    state: DeferredState<F, I>,
}

enum DeferredState<F, I> {
    Pending(F),
    Emitting(I),
    /// `init` panicked.
    Poisoned,
}

impl<F, I> Deferred<F, I>
where
    F: FnOnce() -> I,
    I: Iterator,
{
    pub(crate) fn new(init: F) -> Self {
        Self {
            state: DeferredState::Pending(init),
        }
    }
}

impl<F, I> Iterator for Deferred<F, I>
where
    F: FnOnce() -> I,
    I: Iterator,
{
    type Item = I::Item;

    fn next(&mut self) -> Option<Self::Item> {
        if matches!(self.state, DeferredState::Pending(_))
            && let DeferredState::Pending(init) =
                std::mem::replace(&mut self.state, DeferredState::Poisoned)
        {
            self.state = DeferredState::Emitting(init());
        }

        match &mut self.state {
            DeferredState::Emitting(iter) => iter.next(),
            DeferredState::Pending(_) | DeferredState::Poisoned => None,
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        match &self.state {
            DeferredState::Emitting(iter) => iter.size_hint(),
            DeferredState::Pending(_) => (0, None),
            DeferredState::Poisoned => (0, Some(0)),
        }
    }
}
