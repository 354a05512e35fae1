//! [`Sequence`], the lazy pull-based producer every operator is built on, and its cursor [`Iter`].
//!
//! A sequence is either backed by a fixed collection (carrying a fast-path descriptor, see
//! [`fast_path`]) or by a chain of iterator wrappers rebuilt from scratch on every pull. The two are
//! observably identical; the difference is only visible through how much indirection each element
//! passes through.

pub(crate) mod deferred;
pub(crate) mod fast_path;

use std::fmt;
use std::sync::Arc;

use self::fast_path::{FastIter, FastPath};
use crate::Element;

/// Boxed iterator produced by a generic (non-fast-path) sequence.
pub(crate) type BoxIter<T> = Box<dyn Iterator<Item = T> + Send>;

type Factory<T> = Arc<dyn Fn() -> BoxIter<T> + Send + Sync>;

/// A lazy, immutable, re-runnable sequence of `T`.
///
/// Operators consume a sequence and return a new one; nothing runs until a terminal operator
/// (such as [`Sequence::to_vec`]) or [`Sequence::iter`] pulls from it. Each pull starts again from
/// the original source, so the same sequence can be terminated any number of times. Cloning is
/// cheap: the source is reference counted.
pub struct Sequence<T> {
    source: Source<T>,
    size_hint: usize,
}

enum Source<T> {
    Fast(FastPath<T>),
    Chain(Factory<T>),
}

impl<T> Clone for Sequence<T> {
    fn clone(&self) -> Self {
        Self {
            source: match &self.source {
                Source::Fast(fast) => Source::Fast(fast.clone()),
                Source::Chain(factory) => Source::Chain(Arc::clone(factory)),
            },
            size_hint: self.size_hint,
        }
    }
}

impl<T> fmt::Debug for Sequence<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Sequence")
            .field("fast_path", &matches!(self.source, Source::Fast(_)))
            .field("size_hint", &self.size_hint)
            .finish_non_exhaustive()
    }
}

impl<T> Sequence<T>
where
    T: Element,
{
    /// Creates a fast-path sequence over `fast`.
    pub(crate) fn from_fast(fast: FastPath<T>) -> Self {
        let size_hint = fast.span();
        Self {
            source: Source::Fast(fast),
            size_hint,
        }
    }

    /// Creates a generic sequence which calls `factory` for a fresh iterator on every pull.
    pub(crate) fn from_factory<F, I>(size_hint: usize, factory: F) -> Self
    where
        F: Fn() -> I + Send + Sync + 'static,
        I: Iterator<Item = T> + Send + 'static,
    {
        Self {
            source: Source::Chain(Arc::new(move || Box::new((factory)()) as BoxIter<T>)),
            size_hint,
        }
    }

    /// Generic fallback: wraps this sequence's iterator in one more layer built by `wrap_fn`.
    pub(crate) fn wrap<U, I, F>(self, wrap_fn: F) -> Sequence<U>
    where
        U: Element,
        F: Fn(Iter<T>) -> I + Send + Sync + 'static,
        I: Iterator<Item = U> + Send + 'static,
    {
        let size_hint = self.size_hint;
        Sequence::from_factory(size_hint, move || (wrap_fn)(self.iter()))
    }

    pub(crate) fn fast_path(&self) -> Option<&FastPath<T>> {
        match &self.source {
            Source::Fast(fast) => Some(fast),
            Source::Chain(_) => None,
        }
    }

    /// Takes the fast-path descriptor out, or hands the sequence back unchanged.
    pub(crate) fn into_fast_path(self) -> Result<FastPath<T>, Self> {
        match self.source {
            Source::Fast(fast) => Ok(fast),
            source @ Source::Chain(_) => Err(Self {
                source,
                size_hint: self.size_hint,
            }),
        }
    }

    /// Capacity estimate used when materializing. Not an exact length.
    pub(crate) fn size_hint(&self) -> usize {
        self.size_hint
    }

    pub(crate) fn with_size_hint(self, size_hint: usize) -> Self {
        Self { size_hint, ..self }
    }

    /// Returns a fresh cursor over the sequence, starting from the original source.
    pub fn iter(&self) -> Iter<T> {
        let inner = match &self.source {
            Source::Fast(fast) => IterInner::Fast(fast.iter()),
            Source::Chain(factory) => IterInner::Chain((factory)()),
        };
        Iter { inner }
    }
}

/// Cursor over a [`Sequence`], produced by [`Sequence::iter`].
pub struct Iter<T> {
    inner: IterInner<T>,
}

enum IterInner<T> {
    Fast(FastIter<T>),
    Chain(BoxIter<T>),
}

impl<T> Iterator for Iter<T>
where
    T: Clone,
{
    type Item = T;

    fn next(&mut self) -> Option<Self::Item> {
        match &mut self.inner {
            IterInner::Fast(iter) => iter.next(),
            IterInner::Chain(iter) => iter.next(),
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        match &self.inner {
            IterInner::Fast(iter) => iter.size_hint(),
            IterInner::Chain(iter) => iter.size_hint(),
        }
    }
}

impl<T> fmt::Debug for Iter<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Iter").finish_non_exhaustive()
    }
}

impl<T> IntoIterator for Sequence<T>
where
    T: Element,
{
    type Item = T;
    type IntoIter = Iter<T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<T> IntoIterator for &Sequence<T>
where
    T: Element,
{
    type Item = T;
    type IntoIter = Iter<T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
