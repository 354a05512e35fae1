//! Lazy operators: filtering, projection, slicing, and concatenation.
//!
//! Each operator has a fast-path branch, used when the input still carries its backing collection,
//! and a generic branch which wraps the input's iterator. Both produce the same elements in the same
//! order.

pub mod group;
pub mod set;

use std::iter;
use std::sync::Arc;

use crate::Element;
use crate::sequence::Sequence;
use crate::sequence::deferred::Deferred;
use crate::sequence::fast_path::Predicate;

impl<T> Sequence<T>
where
    T: Element,
{
    /// Keeps the elements for which `predicate` returns `true`.
    ///
    /// On a fast-path sequence the predicate is fused into the accumulated conjunction instead of
    /// adding a wrapper, so any number of chained filters remains a single scan of the backing
    /// collection.
    pub fn filter<F>(self, predicate: F) -> Self
    where
        F: Fn(&T) -> bool + Send + Sync + 'static,
    {
        let predicate: Predicate<T> = Arc::new(predicate);
        match self.into_fast_path() {
            Ok(fast) => Self::from_fast(fast.with_clause(predicate)),
            Err(this) => this.wrap(move |iter| {
                let predicate = Arc::clone(&predicate);
                iter.filter(move |item| (predicate)(item))
            }),
        }
    }

    /// Projects each element through `selector`.
    pub fn select<V, F>(self, selector: F) -> Sequence<V>
    where
        V: Element,
        F: Fn(T) -> V + Send + Sync + 'static,
    {
        let selector = Arc::new(selector);
        self.wrap(move |iter| {
            let selector = Arc::clone(&selector);
            iter.map(move |item| (selector)(item))
        })
    }

    /// Projects each element and its zero-based position through `selector`.
    pub fn select_indexed<V, F>(self, selector: F) -> Sequence<V>
    where
        V: Element,
        F: Fn(T, usize) -> V + Send + Sync + 'static,
    {
        let selector = Arc::new(selector);
        self.wrap(move |iter| {
            let selector = Arc::clone(&selector);
            iter.enumerate().map(move |(idx, item)| (selector)(item, idx))
        })
    }

    /// Keeps the elements for which `predicate(item, idx)` returns `true`, where `idx` is the
    /// element's position in this sequence.
    ///
    /// Position-aware predicates are not fused; this always wraps.
    pub fn filter_indexed<F>(self, predicate: F) -> Self
    where
        F: Fn(&T, usize) -> bool + Send + Sync + 'static,
    {
        let predicate = Arc::new(predicate);
        self.wrap(move |iter| {
            let predicate = Arc::clone(&predicate);
            iter.enumerate()
                .filter(move |(idx, item)| (predicate)(item, *idx))
                .map(|(_, item)| item)
        })
    }

    /// Filters and projects in one step, keeping the `Some` outputs of `selector`.
    pub fn filter_map<V, F>(self, selector: F) -> Sequence<V>
    where
        V: Element,
        F: Fn(T) -> Option<V> + Send + Sync + 'static,
    {
        let selector = Arc::new(selector);
        self.wrap(move |iter| {
            let selector = Arc::clone(&selector);
            iter.filter_map(move |item| (selector)(item))
        })
    }

    /// The first `count` elements.
    pub fn take(self, count: usize) -> Self {
        let size_hint = self.size_hint().min(count);
        match self.into_fast_path() {
            Ok(fast) if fast.is_pure() => Self::from_fast(fast.take(count)),
            Ok(fast) => Self::from_fast(fast)
                .wrap(move |iter| iter.take(count))
                .with_size_hint(size_hint),
            Err(this) => this
                .wrap(move |iter| iter.take(count))
                .with_size_hint(size_hint),
        }
    }

    /// Everything after the first `count` elements.
    pub fn skip(self, count: usize) -> Self {
        let size_hint = self.size_hint().saturating_sub(count);
        match self.into_fast_path() {
            Ok(fast) if fast.is_pure() => Self::from_fast(fast.skip(count)),
            Ok(fast) => Self::from_fast(fast)
                .wrap(move |iter| iter.skip(count))
                .with_size_hint(size_hint),
            Err(this) => this
                .wrap(move |iter| iter.skip(count))
                .with_size_hint(size_hint),
        }
    }

    /// Elements up to, not including, the first one failing `predicate`.
    pub fn take_while<F>(self, predicate: F) -> Self
    where
        F: Fn(&T) -> bool + Send + Sync + 'static,
    {
        let predicate = Arc::new(predicate);
        self.wrap(move |iter| {
            let predicate = Arc::clone(&predicate);
            iter.take_while(move |item| (predicate)(item))
        })
    }

    /// Elements from the first one failing `predicate` onwards.
    pub fn skip_while<F>(self, predicate: F) -> Self
    where
        F: Fn(&T) -> bool + Send + Sync + 'static,
    {
        let predicate = Arc::new(predicate);
        self.wrap(move |iter| {
            let predicate = Arc::clone(&predicate);
            iter.skip_while(move |item| (predicate)(item))
        })
    }

    /// Page `page` (starting at 1) of `page_size` elements. Page 0 is treated as page 1.
    pub fn page(self, page: usize, page_size: usize) -> Self {
        self.skip(page.saturating_sub(1).saturating_mul(page_size))
            .take(page_size)
    }

    /// This sequence followed by `item`.
    pub fn append(self, item: T) -> Self {
        let size_hint = self.size_hint() + 1;
        self.wrap(move |iter| iter.chain(iter::once(item.clone())))
            .with_size_hint(size_hint)
    }

    /// `item` followed by this sequence.
    pub fn prepend(self, item: T) -> Self {
        let size_hint = self.size_hint() + 1;
        self.wrap(move |iter| iter::once(item.clone()).chain(iter))
            .with_size_hint(size_hint)
    }

    /// This sequence followed by `other`.
    pub fn concat(self, other: Sequence<T>) -> Self {
        let size_hint = self.size_hint() + other.size_hint();
        self.wrap(move |iter| iter.chain(other.iter()))
            .with_size_hint(size_hint)
    }

    /// This sequence, or just `default` if it turns out to be empty.
    pub fn default_if_empty(self, default: T) -> Self {
        if let Some(fast) = self.fast_path()
            && fast.is_pure()
        {
            return if fast.span() == 0 {
                Self::from_vec(vec![default])
            } else {
                self
            };
        }
        self.wrap(move |iter| DefaultIfEmpty {
            iter: iter.fuse(),
            default: Some(default.clone()),
        })
    }

    /// The elements in reverse order.
    ///
    /// A fast-path sequence is scanned backwards in place. A generic sequence is materialized on the
    /// first pull.
    pub fn reverse(self) -> Self {
        let size_hint = self.size_hint();
        match self.into_fast_path() {
            Ok(fast) => Self::from_factory(size_hint, move || fast.iter().rev()),
            Err(this) => this.wrap(|iter| {
                Deferred::new(move || {
                    let mut items = iter.collect::<Vec<_>>();
                    items.reverse();
                    items.into_iter()
                })
            }),
        }
    }
}

/// Iterator for [`Sequence::default_if_empty`].
struct DefaultIfEmpty<I, T> {
    iter: I,
    /// Cleared as soon as `iter` yields anything.
    default: Option<T>,
}

impl<I, T> Iterator for DefaultIfEmpty<I, T>
where
    I: Iterator<Item = T>,
{
    type Item = T;

    fn next(&mut self) -> Option<Self::Item> {
        match self.iter.next() {
            Some(item) => {
                self.default = None;
                Some(item)
            }
            None => self.default.take(),
        }
    }
}
