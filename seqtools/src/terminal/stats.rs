//! Numeric and extremum terminals.

use std::iter::Sum;

use crate::Element;
use crate::sequence::Sequence;

impl<T> Sequence<T>
where
    T: Element,
{
    /// Sum of every element. Zero when empty.
    pub fn sum<S>(&self) -> S
    where
        S: Sum<T>,
    {
        self.iter().sum()
    }

    /// Sum of `value(item)` over every element.
    pub fn sum_by<S, F>(&self, value: F) -> S
    where
        S: Sum<S>,
        F: Fn(&T) -> S,
    {
        self.iter().map(|item| value(&item)).sum()
    }

    /// Arithmetic mean, or `None` for an empty sequence.
    pub fn average(&self) -> Option<f64>
    where
        T: Into<f64>,
    {
        self.average_by(|item| item.clone().into())
    }

    /// Arithmetic mean of `value(item)`, or `None` for an empty sequence.
    pub fn average_by<F>(&self, value: F) -> Option<f64>
    where
        F: Fn(&T) -> f64,
    {
        let (total, count) = self
            .iter()
            .fold((0.0, 0usize), |(total, count), item| {
                (total + value(&item), count + 1)
            });
        (count > 0).then(|| total / count as f64)
    }

    /// Smallest element.
    pub fn min(&self) -> Option<T>
    where
        T: Ord,
    {
        self.iter().min()
    }

    /// Largest element. The last one on ties.
    pub fn max(&self) -> Option<T>
    where
        T: Ord,
    {
        self.iter().max()
    }

    /// The first element with the smallest `key`.
    pub fn min_by_key<K, F>(&self, key: F) -> Option<T>
    where
        K: Ord,
        F: Fn(&T) -> K,
    {
        self.extreme_by_key(key, |candidate, best| candidate < best)
    }

    /// The first element with the largest `key`.
    pub fn max_by_key<K, F>(&self, key: F) -> Option<T>
    where
        K: Ord,
        F: Fn(&T) -> K,
    {
        self.extreme_by_key(key, |candidate, best| candidate > best)
    }

    fn extreme_by_key<K, F>(&self, key: F, replaces: impl Fn(&K, &K) -> bool) -> Option<T>
    where
        F: Fn(&T) -> K,
    {
        let mut iter = self.iter();
        let first = iter.next()?;
        let first_key = key(&first);
        let (best, _) = iter.fold((first, first_key), |(best, best_key), item| {
            let item_key = key(&item);
            if replaces(&item_key, &best_key) {
                (item, item_key)
            } else {
                (best, best_key)
            }
        });
        Some(best)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_average_empty_is_none() {
        assert_eq!(None, Sequence::<u32>::empty().average());
        assert_eq!(Some(2.5), Sequence::from_vec(vec![1u32, 2, 3, 4]).average());
    }

    #[test]
    fn test_extremes_keep_first_on_ties() {
        let seq = Sequence::from_vec(vec![("a", 2), ("b", 5), ("c", 5), ("d", 2)]);
        assert_eq!(Some(("b", 5)), seq.max_by_key(|p| p.1));
        assert_eq!(Some(("a", 2)), seq.min_by_key(|p| p.1));
        assert_eq!(12, seq.sum_by(|p| p.1));
    }

    #[test]
    fn test_sum_min_max() {
        let seq = Sequence::from_fn(|| vec![4i64, -1, 9]);
        assert_eq!(12i64, seq.sum::<i64>());
        assert_eq!(Some(-1), seq.min());
        assert_eq!(Some(9), seq.max());
    }
}
