//! Set algebra: distinct, union, intersect, except.
//!
//! Membership is tracked in an [`FxHashSet`] keyed either by the element itself or by the output of
//! a key selector. Output keeps first-occurrence order and never repeats a key. Intersect and except
//! read the whole `other` sequence into a probe set on the first pull, then scan `self` once.

use std::hash::Hash;
use std::sync::Arc;

use rustc_hash::FxHashSet;

use crate::Element;
use crate::sequence::Sequence;
use crate::sequence::deferred::Deferred;

impl<T> Sequence<T>
where
    T: Element,
{
    /// Elements whose key has not been seen before.
    pub fn distinct_by<K, F>(self, key: F) -> Self
    where
        K: Eq + Hash + Send + 'static,
        F: Fn(&T) -> K + Send + Sync + 'static,
    {
        let key = Arc::new(key);
        self.wrap(move |iter| {
            let key = Arc::clone(&key);
            let mut seen = FxHashSet::default();
            iter.filter(move |item| seen.insert((key)(item)))
        })
    }

    /// Elements of `self`, then of `other`, skipping any key already emitted.
    pub fn union_by<K, F>(self, other: Sequence<T>, key: F) -> Self
    where
        K: Eq + Hash + Send + 'static,
        F: Fn(&T) -> K + Send + Sync + 'static,
    {
        let size_hint = self.size_hint() + other.size_hint();
        let key = Arc::new(key);
        self.wrap(move |iter| {
            let key = Arc::clone(&key);
            let mut seen = FxHashSet::default();
            iter.chain(other.iter())
                .filter(move |item| seen.insert((key)(item)))
        })
        .with_size_hint(size_hint)
    }

    /// Elements of `self` whose key also appears in `other`, each key at most once.
    pub fn intersect_by<K, F>(self, other: Sequence<T>, key: F) -> Self
    where
        K: Eq + Hash + Send + 'static,
        F: Fn(&T) -> K + Send + Sync + 'static,
    {
        self.probe_by(other, key, true)
    }

    /// Elements of `self` whose key does not appear in `other`, each key at most once.
    pub fn except_by<K, F>(self, other: Sequence<T>, key: F) -> Self
    where
        K: Eq + Hash + Send + 'static,
        F: Fn(&T) -> K + Send + Sync + 'static,
    {
        self.probe_by(other, key, false)
    }

    fn probe_by<K, F>(self, other: Sequence<T>, key: F, keep_present: bool) -> Self
    where
        K: Eq + Hash + Send + 'static,
        F: Fn(&T) -> K + Send + Sync + 'static,
    {
        let key = Arc::new(key);
        self.wrap(move |iter| {
            let key = Arc::clone(&key);
            let other = other.clone();
            Deferred::new(move || {
                let probe = other
                    .iter()
                    .map(|item| (key)(&item))
                    .collect::<FxHashSet<_>>();
                let mut emitted = FxHashSet::default();
                iter.filter(move |item| {
                    let item_key = (key)(item);
                    probe.contains(&item_key) == keep_present && emitted.insert(item_key)
                })
            })
        })
    }
}

impl<T> Sequence<T>
where
    T: Element + Eq + Hash,
{
    /// Drops repeated elements, keeping the first occurrence of each.
    ///
    /// Same result as `distinct_by` with the identity key, without going through a selector.
    pub fn distinct(self) -> Self {
        self.wrap(|iter| {
            let mut seen = FxHashSet::default();
            iter.filter(move |item| seen.insert(item.clone()))
        })
    }

    /// Distinct elements of `self` followed by `other`.
    pub fn union(self, other: Sequence<T>) -> Self {
        self.concat(other).distinct()
    }

    /// Distinct elements of `self` which also appear in `other`.
    pub fn intersect(self, other: Sequence<T>) -> Self {
        self.intersect_by(other, T::clone)
    }

    /// Distinct elements of `self` which do not appear in `other`.
    pub fn except(self, other: Sequence<T>) -> Self {
        self.except_by(other, T::clone)
    }

    /// Projects through `selector`, then drops repeated outputs.
    pub fn distinct_select<V, F>(self, selector: F) -> Sequence<V>
    where
        V: Element + Eq + Hash,
        F: Fn(T) -> V + Send + Sync + 'static,
    {
        self.select(selector).distinct()
    }

    /// Projects both sequences through `selector`, then takes their union.
    pub fn union_select<V, F>(self, other: Sequence<T>, selector: F) -> Sequence<V>
    where
        V: Element + Eq + Hash,
        F: Fn(T) -> V + Send + Sync + 'static,
    {
        let (left, right) = split_selector(selector);
        self.select(left).union(other.select(right))
    }

    /// Projects both sequences through `selector`, then takes their intersection.
    pub fn intersect_select<V, F>(self, other: Sequence<T>, selector: F) -> Sequence<V>
    where
        V: Element + Eq + Hash,
        F: Fn(T) -> V + Send + Sync + 'static,
    {
        let (left, right) = split_selector(selector);
        self.select(left).intersect(other.select(right))
    }

    /// Projects both sequences through `selector`, then takes their difference.
    pub fn except_select<V, F>(self, other: Sequence<T>, selector: F) -> Sequence<V>
    where
        V: Element + Eq + Hash,
        F: Fn(T) -> V + Send + Sync + 'static,
    {
        let (left, right) = split_selector(selector);
        self.select(left).except(other.select(right))
    }
}

/// Shares one selector between the two sides of a binary set operation.
fn split_selector<T, V, F>(
    selector: F,
) -> (
    impl Fn(T) -> V + Send + Sync + 'static,
    impl Fn(T) -> V + Send + Sync + 'static,
)
where
    T: 'static,
    V: 'static,
    F: Fn(T) -> V + Send + Sync + 'static,
{
    let left = Arc::new(selector);
    let right = Arc::clone(&left);
    (move |item| (left)(item), move |item| (right)(item))
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_intersect_probes_second_fully() {
        let first = Sequence::from_vec(vec![1, 2, 2, 3, 4, 5]);
        let second = Sequence::from_fn(|| vec![5, 4, 4, 9, 2]);
        assert_eq!(vec![2, 4, 5], first.intersect(second).to_vec());
    }

    #[test]
    fn test_except_dedupes() {
        let first = Sequence::from_vec(vec![1, 1, 2, 3, 3, 4]);
        let second = Sequence::from_vec(vec![2]);
        assert_eq!(vec![1, 3, 4], first.except(second).to_vec());
    }

    #[test]
    fn test_by_key_keeps_first_occurrence() {
        let words = Sequence::from_vec(vec!["apple", "avocado", "banana", "blueberry", "cherry"]);
        assert_eq!(
            vec!["apple", "banana", "cherry"],
            words.distinct_by(|w| w.as_bytes()[0]).to_vec()
        );
    }

    #[test]
    fn test_select_variants() {
        let left = Sequence::from_vec(vec![1, 2, 3, 4]);
        let right = Sequence::from_vec(vec![3, 4, 5, 6]);
        assert_eq!(
            vec![1, 0],
            left.clone().distinct_select(|x| x % 2).to_vec()
        );
        assert_eq!(
            vec![10, 20, 30, 40, 50, 60],
            left.clone().union_select(right.clone(), |x| x * 10).to_vec()
        );
        assert_eq!(
            vec![30, 40],
            left.clone().intersect_select(right.clone(), |x| x * 10).to_vec()
        );
        assert_eq!(
            vec![10, 20],
            left.except_select(right, |x| x * 10).to_vec()
        );
    }
}
