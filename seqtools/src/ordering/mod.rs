//! Multi-key stable ordering.
//!
//! [`Sequence::order_by`] starts an [`OrderedSequence`], and only an [`OrderedSequence`] offers
//! `then_by`, so a secondary key can never be attached without a primary one. Each `then_by` extends
//! the comparator of the same pending sort rather than sorting again.
//!
//! Sorting is stable: elements comparing equal under every key keep their input order.

mod comparator;

use std::hash::Hash;

pub use self::comparator::Comparator;
use crate::Element;
use crate::sequence::deferred::Deferred;
use crate::sequence::{Iter, Sequence};

/// A sequence with a pending sort. Produced by [`Sequence::order_by`] and its siblings.
///
/// Nothing is sorted until the sequence is pulled, at which point the whole input is read once,
/// sorted, and emitted.
#[derive(Debug)]
pub struct OrderedSequence<T> {
    source: Sequence<T>,
    comparator: Comparator<T>,
}

impl<T> Clone for OrderedSequence<T> {
    fn clone(&self) -> Self {
        Self {
            source: self.source.clone(),
            comparator: self.comparator.clone(),
        }
    }
}

impl<T> OrderedSequence<T>
where
    T: Element,
{
    /// Breaks ties by `key`, ascending.
    pub fn then_by<K, F>(self, key: F) -> Self
    where
        K: Ord,
        F: Fn(&T) -> K + Send + Sync + 'static,
    {
        self.then(Comparator::asc(key))
    }

    /// Breaks ties by `key`, descending.
    pub fn then_by_descending<K, F>(self, key: F) -> Self
    where
        K: Ord,
        F: Fn(&T) -> K + Send + Sync + 'static,
    {
        self.then(Comparator::desc(key))
    }

    /// Breaks ties with an arbitrary comparator chain.
    pub fn then(self, next: Comparator<T>) -> Self {
        Self {
            source: self.source,
            comparator: self.comparator.then(next),
        }
    }

    /// The pending key chain.
    pub fn comparator(&self) -> &Comparator<T> {
        &self.comparator
    }

    /// Collects and sorts immediately.
    pub fn to_vec(&self) -> Vec<T> {
        let mut items = self.source.to_vec();
        items.sort_by(|a, b| self.comparator.compare(a, b));
        items
    }

    /// Cursor over the sorted elements. Sorting happens on the first pull.
    pub fn iter(&self) -> Iter<T> {
        self.clone().into_sequence().iter()
    }

    /// Seals the ordering into a plain [`Sequence`], so further operators can be chained.
    pub fn into_sequence(self) -> Sequence<T> {
        let size_hint = self.source.size_hint();
        Sequence::from_factory(size_hint, move || {
            let ordered = self.clone();
            Deferred::new(move || ordered.to_vec().into_iter())
        })
    }
}

impl<T> From<OrderedSequence<T>> for Sequence<T>
where
    T: Element,
{
    fn from(ordered: OrderedSequence<T>) -> Self {
        ordered.into_sequence()
    }
}

impl<T> IntoIterator for OrderedSequence<T>
where
    T: Element,
{
    type Item = T;
    type IntoIter = Iter<T>;

    fn into_iter(self) -> Self::IntoIter {
        self.into_sequence().iter()
    }
}

impl<T> Sequence<T>
where
    T: Element,
{
    /// Sorts ascending by `key`.
    pub fn order_by<K, F>(self, key: F) -> OrderedSequence<T>
    where
        K: Ord,
        F: Fn(&T) -> K + Send + Sync + 'static,
    {
        self.order(Comparator::asc(key))
    }

    /// Sorts descending by `key`.
    pub fn order_by_descending<K, F>(self, key: F) -> OrderedSequence<T>
    where
        K: Ord,
        F: Fn(&T) -> K + Send + Sync + 'static,
    {
        self.order(Comparator::desc(key))
    }

    /// Sorts with an explicit comparator chain.
    pub fn order(self, comparator: Comparator<T>) -> OrderedSequence<T> {
        OrderedSequence {
            source: self,
            comparator,
        }
    }
}

impl<T> Sequence<T>
where
    T: Element + Ord + Hash,
{
    /// Distinct elements in ascending order.
    pub fn sorted_distinct(self) -> Sequence<T> {
        self.distinct().order_by(T::clone).into_sequence()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[derive(Debug, Clone, PartialEq, Eq)]
    struct Row {
        team: &'static str,
        score: u32,
        name: &'static str,
    }

    fn rows() -> Vec<Row> {
        vec![
            Row {
                team: "b",
                score: 3,
                name: "w",
            },
            Row {
                team: "a",
                score: 1,
                name: "x",
            },
            Row {
                team: "b",
                score: 5,
                name: "y",
            },
            Row {
                team: "a",
                score: 1,
                name: "z",
            },
        ]
    }

    #[test]
    fn test_then_by_descending() {
        let names = Sequence::from_vec(rows())
            .order_by(|r| r.team)
            .then_by_descending(|r| r.score)
            .into_sequence()
            .select(|r| r.name)
            .to_vec();
        assert_eq!(vec!["x", "z", "y", "w"], names);
    }

    #[test]
    fn test_stable_on_full_ties() {
        let names = Sequence::from_fn(rows)
            .order_by(|r| r.score)
            .iter()
            .map(|r| r.name)
            .collect::<Vec<_>>();
        assert_eq!(vec!["x", "z", "w", "y"], names);
    }

    #[test]
    fn test_sorted_distinct() {
        assert_eq!(
            vec![1, 2, 3, 5],
            Sequence::from_vec(vec![5, 1, 3, 1, 2, 5])
                .sorted_distinct()
                .to_vec()
        );
    }
}
