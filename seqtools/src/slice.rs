//! Eager helpers over plain slices, for callers which do not need a lazy [`Sequence`](crate::Sequence).
//!
//! Every helper keeps first-occurrence order unless it says otherwise.

use std::hash::Hash;

use rand::Rng;
use rand::seq::SliceRandom;
use rustc_hash::{FxHashMap, FxHashSet};

/// Distinct elements of `list`.
pub fn uniq<T: Clone + Eq + Hash>(list: &[T]) -> Vec<T> {
    let mut seen = FxHashSet::default();
    list.iter()
        .filter(|item| seen.insert(*item))
        .cloned()
        .collect()
}

/// The two one-sided differences: elements of `left` missing from `right`, and elements of `right`
/// missing from `left`. Duplicates are kept.
pub fn difference<T: Clone + Eq + Hash>(left: &[T], right: &[T]) -> (Vec<T>, Vec<T>) {
    let left_set = left.iter().collect::<FxHashSet<_>>();
    let right_set = right.iter().collect::<FxHashSet<_>>();
    let only_left = left
        .iter()
        .filter(|item| !right_set.contains(item))
        .cloned()
        .collect();
    let only_right = right
        .iter()
        .filter(|item| !left_set.contains(item))
        .cloned()
        .collect();
    (only_left, only_right)
}

/// `list` with every occurrence of the values in `exclude` removed.
pub fn without<T: Clone + Eq + Hash>(list: &[T], exclude: &[T]) -> Vec<T> {
    let exclude = exclude.iter().collect::<FxHashSet<_>>();
    list.iter()
        .filter(|item| !exclude.contains(item))
        .cloned()
        .collect()
}

/// `list` with the elements at `indices` removed. Out-of-range indices are ignored.
pub fn without_index<T: Clone>(list: &[T], indices: &[usize]) -> Vec<T> {
    let indices = indices.iter().copied().collect::<FxHashSet<_>>();
    list.iter()
        .enumerate()
        .filter(|(idx, _)| !indices.contains(idx))
        .map(|(_, item)| item.clone())
        .collect()
}

/// Distinct elements across all of `lists`.
pub fn union_all<T: Clone + Eq + Hash>(lists: &[&[T]]) -> Vec<T> {
    let mut seen = FxHashSet::default();
    lists
        .iter()
        .flat_map(|list| list.iter())
        .filter(|item| seen.insert(*item))
        .cloned()
        .collect()
}

/// Distinct elements of `left` which also occur in `right`.
pub fn intersect<T: Clone + Eq + Hash>(left: &[T], right: &[T]) -> Vec<T> {
    let right = right.iter().collect::<FxHashSet<_>>();
    let mut emitted = FxHashSet::default();
    left.iter()
        .filter(|item| right.contains(item) && emitted.insert(*item))
        .cloned()
        .collect()
}

/// Whether `left` and `right` hold the same elements with the same multiplicities, in any order,
/// comparing by `key`.
pub fn equal_by<T, K, F>(left: &[T], right: &[T], key: F) -> bool
where
    K: Eq + Hash,
    F: Fn(&T) -> K,
{
    if left.len() != right.len() {
        return false;
    }
    let mut counts = FxHashMap::<K, isize>::default();
    for item in left {
        *counts.entry(key(item)).or_default() += 1;
    }
    for item in right {
        match counts.get_mut(&key(item)) {
            Some(count) if *count > 0 => *count -= 1,
            _ => return false,
        }
    }
    true
}

/// Every list in `lists`, back to back.
pub fn concat_all<T: Clone>(lists: &[&[T]]) -> Vec<T> {
    let mut out = Vec::with_capacity(lists.iter().map(|list| list.len()).sum());
    for list in lists {
        out.extend_from_slice(list);
    }
    out
}

/// A shuffled copy of `list`.
pub fn shuffle<T: Clone>(list: &[T]) -> Vec<T> {
    shuffle_with(list, &mut rand::thread_rng())
}

/// Like [`shuffle`], drawing from `rng`.
pub fn shuffle_with<T: Clone, R: Rng + ?Sized>(list: &[T], rng: &mut R) -> Vec<T> {
    let mut out = list.to_vec();
    out.shuffle(rng);
    out
}

/// Up to `count` elements of `list`, chosen at random without replacement, in random order.
pub fn sample<T: Clone>(list: &[T], count: usize) -> Vec<T> {
    sample_with(list, count, &mut rand::thread_rng())
}

/// Like [`sample`], drawing from `rng`.
pub fn sample_with<T: Clone, R: Rng + ?Sized>(list: &[T], count: usize, rng: &mut R) -> Vec<T> {
    list.choose_multiple(rng, count).cloned().collect()
}

#[cfg(test)]
mod test {
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    use super::*;

    #[test]
    fn test_uniq_and_friends() {
        assert_eq!(vec![3, 1, 2], uniq(&[3, 1, 3, 2, 1]));
        assert_eq!(
            (vec![1, 1], vec![4]),
            difference(&[1, 2, 1, 3], &[2, 3, 4])
        );
        assert_eq!(vec![1, 3], without(&[1, 2, 3, 2], &[2]));
        assert_eq!(vec!['a', 'c'], without_index(&['a', 'b', 'c'], &[1, 9]));
        assert_eq!(vec![1, 2, 3], union_all(&[&[1, 2][..], &[2, 3], &[]]));
        assert_eq!(vec![2, 3], intersect(&[1, 2, 3, 2], &[3, 2, 5]));
        assert_eq!(vec![1, 2, 2, 3], concat_all(&[&[1, 2][..], &[2, 3]]));
    }

    #[test]
    fn test_equal_by_multiset() {
        assert!(equal_by(&[1, 2, 2], &[2, 1, 2], |x| *x));
        assert!(!equal_by(&[1, 2, 2], &[1, 1, 2], |x| *x));
        assert!(!equal_by(&[1], &[1, 1], |x| *x));
    }

    #[test]
    fn test_shuffle_and_sample_are_permutations() {
        let mut rng = SmallRng::seed_from_u64(7);
        let list = (0..50).collect::<Vec<u32>>();

        let mut shuffled = shuffle_with(&list, &mut rng);
        shuffled.sort_unstable();
        assert_eq!(list, shuffled);

        let picked = sample_with(&list, 10, &mut rng);
        assert_eq!(10, picked.len());
        assert_eq!(10, uniq(&picked).len());
        assert_eq!(50, sample_with(&list, 80, &mut rng).len());
    }
}
